//! Lateral control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for lateral control
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LatCtrlParams {
    /// Steering law to use: 1 = pure pursuit, 2 = LQR, 3 = feedforward plus
    /// feedback.
    pub controller_id: u32,

    /// How the look-ahead distance is chosen each cycle.
    pub lookahead_mode: LookaheadMode,

    /// Look-ahead distance, or its base value in variable mode.
    ///
    /// Units: meters
    pub lookahead_distance_m: f64,

    /// Look-ahead distance added per unit of speed in variable mode.
    ///
    /// Units: seconds
    pub lookahead_speed_gain_s: f64,

    /// Wheelbase used by the pure pursuit law.
    ///
    /// Units: meters
    pub wheelbase_m: f64,

    /// Name of the LQR gain table file, relative to the parameters directory.
    /// Only loaded when the LQR law is selected.
    pub gain_table: String,

    /// Front wheel angle limit, applied symmetrically.
    ///
    /// Units: radians
    pub max_front_wheel_angle_rad: f64,

    /// Steering linkage ratio between front wheel angle and actuator angle.
    pub steer_ratio: f64,

    /// Actuator angle at which the front wheels point straight ahead,
    /// negated.
    pub steer_offset: f64,

    /// Weight of the leader's steering in the feedforward plus feedback law.
    pub ff_weight: f64,

    /// Weight of the pure pursuit output in the feedforward plus feedback law.
    pub fb_weight: f64,
}

/// The steering linkage of the vehicle.
///
/// Maps front wheel angle onto the steering actuator angle with
/// `steer = -(ratio * angle + offset)`. The constants are calibration data of
/// the vehicle.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct SteerLinkage {
    pub ratio: f64,
    pub offset: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LookaheadMode {
    /// Use `lookahead_distance_m` as given.
    Fixed,

    /// Recompute `lookahead_distance_m + lookahead_speed_gain_s * speed`
    /// every cycle.
    Variable,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LatCtrlParams {
    fn default() -> Self {
        Self {
            controller_id: 1,
            lookahead_mode: LookaheadMode::Fixed,
            lookahead_distance_m: 8.0,
            lookahead_speed_gain_s: 1.5,
            wheelbase_m: 3.975,
            gain_table: String::from("lqr_gains.csv"),
            max_front_wheel_angle_rad: 0.5,
            steer_ratio: 24.1066,
            steer_offset: 4.8505,
            ff_weight: 0.5,
            fb_weight: 0.5,
        }
    }
}

impl LatCtrlParams {
    pub fn linkage(&self) -> SteerLinkage {
        SteerLinkage {
            ratio: self.steer_ratio,
            offset: self.steer_offset,
        }
    }
}

impl SteerLinkage {
    /// Actuator angle for the given front wheel angle.
    pub fn to_actuator(&self, front_wheel_angle_rad: f64) -> f64 {
        -(self.ratio * front_wheel_angle_rad + self.offset)
    }

    /// Front wheel angle for the given actuator angle.
    pub fn to_front_wheel(&self, steer_angle: f64) -> f64 {
        -(steer_angle + self.offset) / self.ratio
    }
}
