//! # Control library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the control executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Control module - runs lateral then longitudinal control once per cycle
pub mod control;

/// Planar geometry helpers shared by the controllers
pub mod geometry;

/// Lateral control module - steers the vehicle onto the reference path
pub mod lat_ctrl;

/// Longitudinal control module - speed keeping and car-following pedal control
pub mod lon_ctrl;

/// Kinematic vehicle simulation used to close the loop without hardware
pub mod sim;

/// Waypoint search on the reference path, and waypoint file loading and recording
pub mod waypoints;
