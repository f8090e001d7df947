//! # Waypoints module
//!
//! Resolves the nearest and look-ahead waypoints of the reference path relative to the vehicle.
//!
//! The nearest waypoint is the path point closest (on the XY plane) to the vehicle, ties going to
//! the lowest index. The look-ahead waypoint is the first point at or after the nearest one which
//! is strictly further than the look-ahead distance from the vehicle. Both searches report an
//! explicit failure instead of an index when no such point exists.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod file;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::geometry::plane_dist;
use comms_if::{loc::Pose, planning::RefPath};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Failures of the waypoint searches.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum LocatorError {
    #[error("No waypoints in the reference path")]
    NoWaypoints,

    #[error("The nearest waypoint is the last one in the path, there is no point ahead")]
    NearestIsLast,

    #[error("No waypoint further than the look-ahead distance was found before the end of the path")]
    NoLookaheadPoint,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Find the index of the waypoint nearest to the vehicle.
pub fn find_nearest(path: &RefPath, ego: &Pose) -> Result<usize, LocatorError> {
    // `min_by_key` keeps the first of several equal minima, which gives the lowest index on ties
    path.waypoints
        .iter()
        .enumerate()
        .min_by_key(|(_, wp)| OrderedFloat(plane_dist(&wp.position3(), &ego.position_m)))
        .map(|(i, _)| i)
        .ok_or(LocatorError::NoWaypoints)
}

/// Find the index of the look-ahead waypoint.
///
/// Scans forward from the nearest waypoint and returns the first index whose distance from the
/// vehicle exceeds `target_distance_m`.
pub fn find_lookahead(
    path: &RefPath,
    ego: &Pose,
    target_distance_m: f64
) -> Result<usize, LocatorError> {
    let nearest_idx = find_nearest(path, ego)?;

    if nearest_idx == path.len() - 1 {
        return Err(LocatorError::NearestIsLast);
    }

    (nearest_idx..path.len())
        .find(|&i| {
            plane_dist(&path.waypoints[i].position3(), &ego.position_m) > target_distance_m
        })
        .ok_or(LocatorError::NoLookaheadPoint)
}
