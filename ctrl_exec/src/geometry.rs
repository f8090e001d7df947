//! # Geometry
//!
//! Planar helpers used throughout control. The vertical axis is ignored everywhere: the vehicle
//! and the reference path are assumed to lie on the XY plane of the world frame.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Rotation2, Vector2, Vector3};

use comms_if::loc::Pose;
use util::maths::wrap_to_pi;

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Euclidean distance between two points, ignoring the Z axis.
pub fn plane_dist(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    (a.xy() - b.xy()).norm()
}

/// Express `target_m` in the frame of the vehicle at `ego`, forward = x, left = y.
///
/// Only the heading of `ego` is used for the rotation. The Z component is the plain height
/// difference.
pub fn relative_coordinate(target_m: &Vector3<f64>, ego: &Pose) -> Vector3<f64> {
    let delta: Vector2<f64> = target_m.xy() - ego.position2();
    let local = Rotation2::new(-ego.get_heading()) * delta;

    Vector3::new(local[0], local[1], target_m[2] - ego.position_m[2])
}

/// Normalise an angle into (-pi, pi].
pub fn normalize_angle(theta_rad: f64) -> f64 {
    wrap_to_pi(theta_rad)
}
