//! # Localisation Messages
//!
//! Pose and twist estimates produced by the localisation system. The controller trusts these as
//! already computed.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{UnitQuaternion, Vector2, Vector3};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Position and attitude of the vehicle in the world frame.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pose {
    /// Position in the world frame
    ///
    /// Units: meters
    pub position_m: Vector3<f64>,

    /// Attitude of the vehicle body in the world frame.
    pub attitude_q: UnitQuaternion<f64>,
}

/// Linear and angular velocity of the vehicle, expressed in the vehicle body frame (forward = x,
/// left = y).
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct Twist {
    /// Units: meters/second
    pub linear_ms: Vector3<f64>,

    /// Units: radians/second
    pub angular_rads: Vector3<f64>,
}

/// A combined pose and twist estimate.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Odometry {
    pub pose: Pose,
    pub twist: Twist,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for Pose {
    fn default() -> Self {
        Self {
            position_m: Vector3::zeros(),
            attitude_q: UnitQuaternion::identity(),
        }
    }
}

impl Default for Twist {
    fn default() -> Self {
        Self {
            linear_ms: Vector3::zeros(),
            angular_rads: Vector3::zeros(),
        }
    }
}

impl Pose {
    /// Create a planar pose at the given position and heading.
    pub fn from_xy_heading(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            position_m: Vector3::new(x_m, y_m, 0.0),
            attitude_q: UnitQuaternion::from_euler_angles(0.0, 0.0, heading_rad),
        }
    }

    /// Return the heading (yaw about the world Z axis) of the vehicle in radians.
    ///
    /// Heading is given in the range (-pi, pi], with 0 being along the world X axis.
    pub fn get_heading(&self) -> f64 {
        self.attitude_q.euler_angles().2
    }

    /// The position of the vehicle projected onto the XY plane.
    pub fn position2(&self) -> Vector2<f64> {
        Vector2::new(self.position_m[0], self.position_m[1])
    }
}

impl Odometry {
    /// Longitudinal (body forward) speed.
    pub fn speed_ms(&self) -> f64 {
        self.twist.linear_ms[0]
    }
}
