//! # Control Interface
//!
//! Messages produced by the controller for monitoring, and the leader feed it consumes when
//! car-following.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::{eqpt::ChassisState, loc::Odometry};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Tracking errors against the reference path, recomputed every cycle.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq)]
pub struct ControlState {
    /// Lateral position of the nearest waypoint in the vehicle frame, positive to the left.
    pub lateral_error_m: f64,

    /// Nearest waypoint heading minus vehicle heading, in (-pi, pi].
    pub heading_error_rad: f64,
}

/// Signal raised once when the lead vehicle reaches its trigger speed, used to start logging and
/// replay.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ReplayTrigger {
    pub trigger: bool,
}

/// Telemetry of the remote "virtual" leader vehicle followed in car-following mode.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq)]
pub struct LeaderState {
    /// Distance the leader has travelled since its own trigger.
    ///
    /// Units: meters
    pub distance_m: f64,

    pub odom: Odometry,

    pub chassis: ChassisState,
}
