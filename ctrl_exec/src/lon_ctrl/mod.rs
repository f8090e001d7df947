//! # Longitudinal control module
//!
//! Longitudinal control drives the accelerator and brake pedals. Three modes
//! are available:
//!
//!  1. Track the configured desired speed.
//!  2. Track the reference speed of the nearest waypoint.
//!  3. Staged control. A lead or standalone vehicle accelerates to the
//!     trigger speed and then holds the desired speed, raising the replay
//!     trigger once when the trigger speed is first reached. A following
//!     vehicle with an active leader feed keeps the desired gap to the leader
//!     using one of the car-following laws, blended with the leader's own
//!     pedal command.
//!
//! The signed pedal demand then goes through a dead zone and saturation and is
//! split into the accelerator (positive) and brake (negative) channels, so
//! that only one of them is ever non-zero.

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
