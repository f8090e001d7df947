//! # Longitudinal controllers module
//!
//! This module provides the speed feedback controller and the car-following
//! laws used by LonCtrl.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::f64::consts::FRAC_PI_2;
use serde::Serialize;

// Internal
use comms_if::eqpt::ChassisState;
use util::maths::clamp;

use super::LonCtrlParams;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Output scale of the transformed distance error.
const TRANSFORM_SCALE: f64 = 10.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller with an explicit time step.
#[derive(Debug, Serialize, Clone, Default)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64
}

/// Errors of the follower against the leader.
#[derive(Debug, Copy, Clone, Default, Serialize, PartialEq)]
pub struct LonErrors {
    /// Gap to the leader minus the desired gap.
    ///
    /// Units: meters
    pub distance_m: f64,

    /// Leader speed minus own speed.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Leader acceleration minus own acceleration.
    ///
    /// Units: meters/second^2
    pub accel_ms2: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The car-following feedback laws.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FollowLaw {
    /// `k_dist * e_d + k_speed * e_v`
    Linear {
        k_dist: f64,
        k_speed: f64,
    },

    /// Sliding mode on `s = e_v + lambda * e_d` with a boundary layer of
    /// width `eps`, which removes chattering around `s = 0`.
    ChatterFree {
        lambda: f64,
        eps: f64,
        k_s: f64,
        k_u: f64,
    },

    /// The chattering-free law applied to a bounded tangent transform of the
    /// distance error, so that the command grows quickly as the gap closes
    /// without ever becoming singular.
    TransformedSlidingMode {
        c_0: f64,
        c_1: f64,
        c_2: f64,
        margin_rad: f64,
        lambda: f64,
        eps: f64,
        k_s: f64,
        k_u: f64,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {

    /// Create a new controller with the given gains.
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            k_p, k_i, k_d,
            integral: 0f64,
            prev_error: None
        }
    }

    /// Get the value of the controller for the given error over a step of
    /// `dt_s` seconds.
    pub fn get(&mut self, error: f64, dt_s: f64) -> f64 {
        // A non-positive step carries no time information, so neither the
        // integral nor the derivative are updated
        let dt = if dt_s > 0.0 { Some(dt_s) } else { None };

        // Accumulate the integral term
        self.integral += match dt {
            Some(t) => error * t,
            None => 0f64
        };

        // Calculate the derivative. There's no derivative on the first step
        // to avoid a kick.
        let deriv = match (self.prev_error, dt) {
            (Some(e), Some(t)) => (error - e) / t,
            _ => 0f64
        };

        let out =
            self.k_p * error
            + self.k_i * self.integral
            + self.k_d * deriv;

        self.prev_error = Some(error);

        out
    }

    /// Speed feedback signal, using the error `current - desired`.
    ///
    /// A speed deficit gives a negative signal, so callers negate it to get a
    /// pedal demand.
    pub fn output_signal(&mut self, desired: f64, current: f64, dt_s: f64) -> f64 {
        self.get(current - desired, dt_s)
    }

    /// Clear the integral and derivative history.
    pub fn reset(&mut self) {
        self.integral = 0f64;
        self.prev_error = None;
    }
}

impl FollowLaw {
    /// Build the law selected by `params.controller_id`, or `None` if the id
    /// is not known.
    pub fn from_params(params: &LonCtrlParams) -> Option<Self> {
        match params.controller_id {
            1 => Some(FollowLaw::Linear {
                k_dist: params.k_dist,
                k_speed: params.k_speed,
            }),
            2 => Some(FollowLaw::ChatterFree {
                lambda: params.lambda,
                eps: params.eps,
                k_s: params.k_s,
                k_u: params.k_u,
            }),
            3 => Some(FollowLaw::TransformedSlidingMode {
                c_0: params.c_0,
                c_1: params.c_1,
                c_2: params.c_2,
                margin_rad: params.tan_margin_rad,
                lambda: params.lambda,
                eps: params.eps,
                k_s: params.k_s,
                k_u: params.k_u,
            }),
            _ => None
        }
    }

    /// Feedback pedal demand for the given errors.
    pub fn feedback(&self, errors: &LonErrors) -> f64 {
        match *self {
            FollowLaw::Linear { k_dist, k_speed } => {
                k_dist * errors.distance_m + k_speed * errors.speed_ms
            },
            FollowLaw::ChatterFree { lambda, eps, k_s, k_u } => {
                let s = errors.speed_ms + lambda * errors.distance_m;
                (k_s + k_u * boundary_gain(s, eps)) * s
            },
            FollowLaw::TransformedSlidingMode {
                c_0, c_1, c_2, margin_rad, lambda, eps, k_s, k_u
            } => {
                let arg = clamp(
                    c_0 * errors.distance_m + c_1,
                    -FRAC_PI_2 + margin_rad,
                    FRAC_PI_2 - margin_rad
                );

                let z = TRANSFORM_SCALE * (arg.tan() + c_2);
                let dz = TRANSFORM_SCALE * c_0 * errors.speed_ms / arg.cos().powi(2);

                let s = dz + lambda * z;
                k_s * s + k_u * s * boundary_gain(s, eps)
            }
        }
    }
}

/// Boundary layer gain `1 / max(|s|, eps)`.
pub fn boundary_gain(s: f64, eps: f64) -> f64 {
    1.0 / s.abs().max(eps)
}

/// Signed pedal command of the leader: its accelerator if that exceeds its
/// brake, otherwise the negated brake.
pub fn leader_feedforward(chassis: &ChassisState) -> f64 {
    if chassis.accel_pedal > chassis.brake_pedal {
        chassis.accel_pedal
    }
    else {
        -chassis.brake_pedal
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pid_proportional() {
        let mut pid = PidController::new(1.0, 0.0, 0.0);

        // Too slow gives a negative signal
        assert_eq!(pid.output_signal(5.0, 3.0, 0.1), -2.0);
        assert_eq!(pid.output_signal(5.0, 6.0, 0.1), 1.0);
    }

    #[test]
    fn test_pid_integral_and_derivative() {
        let mut pid = PidController::new(0.0, 1.0, 0.0);
        pid.get(1.0, 0.5);
        assert!((pid.get(1.0, 0.5) - 1.0).abs() < 1e-12);

        // No time step, no accumulation
        assert!((pid.get(1.0, 0.0) - 1.0).abs() < 1e-12);

        pid.reset();
        assert_eq!(pid.get(1.0, 0.0), 0.0);

        let mut pid = PidController::new(0.0, 0.0, 1.0);
        assert_eq!(pid.get(1.0, 0.1), 0.0);
        assert!((pid.get(2.0, 0.1) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_law() {
        let law = FollowLaw::Linear { k_dist: 2.0, k_speed: 3.0 };
        let errors = LonErrors { distance_m: 1.0, speed_ms: -0.5, accel_ms2: 0.0 };
        assert_eq!(law.feedback(&errors), 0.5);
    }

    #[test]
    fn test_chatter_free_law() {
        let law = FollowLaw::ChatterFree { lambda: 1.0, eps: 0.1, k_s: 1.0, k_u: 0.1 };

        // s = 1.5, gamma = 1/1.5
        let errors = LonErrors { distance_m: 0.5, speed_ms: 1.0, accel_ms2: 0.0 };
        let out = law.feedback(&errors);
        assert!((out - 1.6).abs() < 1e-9);

        // Inside the boundary layer gamma = 1/eps
        let errors = LonErrors { distance_m: 0.0, speed_ms: 0.05, accel_ms2: 0.0 };
        let out = law.feedback(&errors);
        assert!((out - (1.0 + 0.1 / 0.1) * 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_boundary_gain() {
        assert_eq!(boundary_gain(2.0, 0.1), 0.5);
        assert_eq!(boundary_gain(-4.0, 0.1), 0.25);
        assert_eq!(boundary_gain(0.0, 0.5), 2.0);
    }

    #[test]
    fn test_transformed_law() {
        let law = FollowLaw::TransformedSlidingMode {
            c_0: 0.1,
            c_1: 0.0,
            c_2: 0.0,
            margin_rad: 0.1,
            lambda: 1.0,
            eps: 0.1,
            k_s: 1.0,
            k_u: 0.1,
        };

        // Zero errors give zero output
        assert_eq!(law.feedback(&LonErrors::default()), 0.0);

        let errors = LonErrors { distance_m: 2.0, speed_ms: 1.0, accel_ms2: 0.0 };
        let arg: f64 = 0.2;
        let z = 10.0 * arg.tan();
        let dz = 10.0 * 0.1 * 1.0 / arg.cos().powi(2);
        let s = dz + z;
        let expected = s + 0.1 * s / s.abs();
        assert!((law.feedback(&errors) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_transformed_law_stays_finite() {
        let law = FollowLaw::TransformedSlidingMode {
            c_0: 1.0,
            c_1: 0.0,
            c_2: 0.0,
            margin_rad: 0.1,
            lambda: 1.0,
            eps: 0.1,
            k_s: 1.0,
            k_u: 0.1,
        };

        // Errors far beyond the singularity are held at the margin
        for e_d in [-1e6, -10.0, -FRAC_PI_2, FRAC_PI_2, 10.0, 1e6].iter() {
            let errors = LonErrors { distance_m: *e_d, speed_ms: 1.0, accel_ms2: 0.0 };
            let out = law.feedback(&errors);
            assert!(out.is_finite());
        }

        let far = LonErrors { distance_m: 1e6, speed_ms: 0.0, accel_ms2: 0.0 };
        let edge = LonErrors { distance_m: FRAC_PI_2 - 0.1, speed_ms: 0.0, accel_ms2: 0.0 };
        assert!((law.feedback(&far) - law.feedback(&edge)).abs() < 1e-6);
    }

    #[test]
    fn test_leader_feedforward() {
        let mut chassis = ChassisState::default();
        chassis.accel_pedal = 20.0;
        chassis.brake_pedal = 5.0;
        assert_eq!(leader_feedforward(&chassis), 20.0);

        chassis.accel_pedal = 0.0;
        chassis.brake_pedal = 15.0;
        assert_eq!(leader_feedforward(&chassis), -15.0);

        // Equal pedals resolve to the brake
        chassis.accel_pedal = 15.0;
        assert_eq!(leader_feedforward(&chassis), -15.0);
    }

    #[test]
    fn test_from_params() {
        let mut params = LonCtrlParams::default();
        params.controller_id = 2;
        assert!(matches!(FollowLaw::from_params(&params), Some(FollowLaw::ChatterFree { .. })));

        params.controller_id = 3;
        assert!(matches!(
            FollowLaw::from_params(&params),
            Some(FollowLaw::TransformedSlidingMode { .. })
        ));

        params.controller_id = 0;
        assert_eq!(FollowLaw::from_params(&params), None);
    }
}
