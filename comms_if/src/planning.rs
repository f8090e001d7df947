//! # Planning Messages
//!
//! The reference path is an ordered sequence of waypoints, each carrying the pose and speed the
//! vehicle should have at that point.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::loc::Pose;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One sample of the reference path.
///
/// The field layout matches the waypoint file columns, so a `Waypoint` can be read from and
/// written to CSV directly.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Waypoint {
    pub x_m: f64,
    pub y_m: f64,

    /// Heading of the path at this point, angle to the world X axis.
    pub heading_rad: f64,

    /// Reference body-frame forward speed
    pub v_x_ms: f64,

    /// Reference body-frame lateral speed
    pub v_y_ms: f64,

    pub yaw_rate_rads: f64,
}

/// An ordered reference path. Replaced wholesale whenever a new path arrives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RefPath {
    pub waypoints: Vec<Waypoint>,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Waypoint {
    /// Create a waypoint at the given position and heading with the given reference speed.
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64, v_x_ms: f64) -> Self {
        Self {
            x_m,
            y_m,
            heading_rad,
            v_x_ms,
            ..Default::default()
        }
    }

    pub fn position2(&self) -> Vector2<f64> {
        Vector2::new(self.x_m, self.y_m)
    }

    pub fn position3(&self) -> Vector3<f64> {
        Vector3::new(self.x_m, self.y_m, 0.0)
    }

    /// The pose described by this waypoint.
    pub fn pose(&self) -> Pose {
        Pose::from_xy_heading(self.x_m, self.y_m, self.heading_rad)
    }
}

impl RefPath {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }
}
