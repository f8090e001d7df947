//! Longitudinal control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for longitudinal control
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LonCtrlParams {
    /// Longitudinal mode: 1 = track the desired speed, 2 = track the path
    /// speed, 3 = staged acceleration and car-following.
    pub mode: u32,

    /// Car-following law: 1 = linear, 2 = chattering-free sliding mode,
    /// 3 = transformed sliding mode.
    pub controller_id: u32,

    /// Speed setpoint
    ///
    /// Units: meters/second
    pub desired_speed_ms: f64,

    /// Gap to keep behind the leader
    ///
    /// Units: meters
    pub desired_distance_m: f64,

    /// Speed at which the initial acceleration stage ends
    ///
    /// Units: meters/second
    pub trigger_speed_ms: f64,

    /// Speed controller proportional gain
    pub speed_k_p: f64,

    /// Speed controller integral gain
    pub speed_k_i: f64,

    /// Speed controller derivative gain
    pub speed_k_d: f64,

    /// Linear law distance error gain
    pub k_dist: f64,

    /// Linear law speed error gain
    pub k_speed: f64,

    /// Sliding surface slope
    pub lambda: f64,

    /// Boundary layer width of the sliding mode laws
    pub eps: f64,

    /// Sliding mode proportional gain
    pub k_s: f64,

    /// Sliding mode boundary layer gain
    pub k_u: f64,

    /// Distance transform scale
    pub c_0: f64,

    /// Distance transform offset inside the tangent
    pub c_1: f64,

    /// Distance transform offset outside the tangent
    pub c_2: f64,

    /// Margin kept from +/- pi/2 by the distance transform.
    ///
    /// Units: radians
    pub tan_margin_rad: f64,

    /// Weight of the leader's pedal in the car-following command
    pub ff_weight: f64,

    /// Weight of the feedback law in the car-following command
    pub fb_weight: f64,

    /// Pedal commands smaller in magnitude than this are zeroed
    pub dead_zone: f64,

    /// Accelerator pedal limit
    pub max_accel_pedal: f64,

    /// Brake pedal limit, as a positive value
    pub max_brake_pedal: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LonCtrlParams {
    fn default() -> Self {
        Self {
            mode: 1,
            controller_id: 1,
            desired_speed_ms: 5.0,
            desired_distance_m: 5.0,
            trigger_speed_ms: 5.0,
            speed_k_p: 1.0,
            speed_k_i: 0.0,
            speed_k_d: 0.0,
            k_dist: 1.0,
            k_speed: 1.0,
            lambda: 1.0,
            eps: 0.1,
            k_s: 1.0,
            k_u: 0.1,
            c_0: 0.1,
            c_1: 0.0,
            c_2: 0.0,
            tan_margin_rad: 0.1,
            ff_weight: 1.0,
            fb_weight: 1.0,
            dead_zone: 2.0,
            max_accel_pedal: 65.0,
            max_brake_pedal: 40.0,
        }
    }
}
