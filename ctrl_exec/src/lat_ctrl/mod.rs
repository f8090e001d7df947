//! # Lateral control module
//!
//! Lateral control keeps the vehicle on the reference path by commanding the steering actuator.
//!
//! Each cycle the nearest waypoint gives the tracking errors that are reported for monitoring:
//! the lateral error (position of the nearest waypoint in the vehicle frame, positive to the
//! left) and the heading error (waypoint heading minus vehicle heading). The look-ahead waypoint,
//! found some distance ahead along the path, is the aim point of the steering law.
//!
//! One of three steering laws is selected by id in the parameters:
//!
//!  1. Pure pursuit, steering along the arc that passes through the look-ahead point.
//!  2. Gain-scheduled state feedback (LQR) on the lateral and heading errors to the look-ahead
//!     point and their rates, with the gains interpolated by speed from a table loaded at start.
//!  3. A blend of the leader vehicle's own steering (feedforward) and pure pursuit (feedback).
//!
//! The law outputs a front wheel angle which is saturated to the steering limit and then mapped
//! onto the steering actuator through the vehicle's steering linkage.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod controllers;
pub mod params;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use controllers::*;
pub use params::*;
pub use state::*;

use crate::waypoints::LocatorError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during lateral control.
#[derive(Debug, thiserror::Error)]
pub enum LatCtrlError {
    #[error("Could not find the nearest waypoint: {0}")]
    NearestNotFound(LocatorError),

    #[error("Could not load the LQR gain table: {0}")]
    GainTableError(GainTableError),
}
