//! Control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::{lat_ctrl::LatCtrlParams, lon_ctrl::LonCtrlParams};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the control module, usually loaded from `ctrl.toml`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Params {
    /// If false the steering demand is held at 0.
    pub lateral_enabled: bool,

    /// If false the pedal demands are not updated.
    pub longitudinal_enabled: bool,

    /// True if this vehicle leads the platoon. The lead vehicle never follows
    /// the leader feed and may run without a reference path.
    pub is_first_vehicle: bool,

    /// True if a leader feed is expected.
    pub leader_feed_enabled: bool,

    /// Period of the control cycle
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    pub lat: LatCtrlParams,

    pub lon: LonCtrlParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            lateral_enabled: true,
            longitudinal_enabled: true,
            is_first_vehicle: false,
            leader_feed_enabled: false,
            cycle_period_s: 0.05,
            lat: LatCtrlParams::default(),
            lon: LonCtrlParams::default(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lat_ctrl::LookaheadMode;

    #[test]
    fn test_params_from_toml() {
        let params: Params = toml::from_str(r#"
            lateral_enabled = true
            longitudinal_enabled = false
            is_first_vehicle = true
            leader_feed_enabled = false
            cycle_period_s = 0.1

            [lat]
            controller_id = 2
            lookahead_mode = "variable"
            lookahead_distance_m = 6.0
            lookahead_speed_gain_s = 1.0
            wheelbase_m = 3.975
            gain_table = "lqr_gains.csv"
            max_front_wheel_angle_rad = 0.6
            steer_ratio = 24.1066
            steer_offset = 4.8505
            ff_weight = 0.5
            fb_weight = 0.5

            [lon]
            mode = 3
            controller_id = 3
            desired_speed_ms = 8.0
            desired_distance_m = 10.0
            trigger_speed_ms = 7.5
            speed_k_p = 4.0
            speed_k_i = 0.1
            speed_k_d = 0.0
            k_dist = 1.0
            k_speed = 2.0
            lambda = 0.5
            eps = 0.1
            k_s = 1.0
            k_u = 0.1
            c_0 = 0.1
            c_1 = 0.0
            c_2 = 0.0
            tan_margin_rad = 0.1
            ff_weight = 1.0
            fb_weight = 1.0
            dead_zone = 2.0
            max_accel_pedal = 65.0
            max_brake_pedal = 40.0
        "#).unwrap();

        assert!(!params.longitudinal_enabled);
        assert!(params.is_first_vehicle);
        assert_eq!(params.lat.controller_id, 2);
        assert_eq!(params.lat.lookahead_mode, LookaheadMode::Variable);
        assert_eq!(params.lon.mode, 3);
        assert_eq!(params.lon.trigger_speed_ms, 7.5);
    }
}
