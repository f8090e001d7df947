//! Lateral control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::path::Path;
use log::{debug, info, warn};
use nalgebra::Vector3;
use serde::Serialize;

// Internal
use super::*;
use crate::{
    geometry::{normalize_angle, relative_coordinate},
    waypoints::{find_lookahead, find_nearest, LocatorError},
};
use comms_if::{
    ctrl::{ControlState, LeaderState},
    loc::Odometry,
    planning::RefPath,
};
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Lateral control state.
#[derive(Debug, Clone, Default)]
pub struct LatCtrl {
    params: LatCtrlParams,

    /// The selected steering law, `None` if the configured id is unknown.
    controller: Option<LatController>,
}

/// Output of one lateral control cycle.
#[derive(Debug, Copy, Clone, Default)]
pub struct LatCtrlOutput {
    /// Tracking errors against the nearest waypoint
    pub control_state: ControlState,

    pub nearest_point_m: Vector3<f64>,

    /// The look-ahead point, if one was found this cycle.
    pub lookahead_point_m: Option<Vector3<f64>>,

    /// Saturated front wheel angle demand.
    pub front_wheel_angle_rad: Option<f64>,

    /// Steering actuator demand. `None` when no look-ahead point could be
    /// found, in which case the previous command should be held.
    pub steer_angle: Option<f64>,
}

/// Status report for lateral control processing.
#[derive(Debug, Copy, Clone, Default, Serialize)]
pub struct LatStatusReport {
    pub nearest_index: usize,

    pub lookahead_index: Option<usize>,

    /// Look-ahead distance used this cycle
    pub lookahead_distance_m: f64,

    /// Set if the look-ahead search failed.
    pub lookahead_error: Option<LocatorError>,

    /// Set if the configured controller id is not a known steering law.
    pub unknown_controller_id: bool,

    /// Set if the front wheel angle demand was saturated.
    pub angle_limited: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LatCtrl {
    /// Create a new lateral controller.
    ///
    /// Any file needed by the selected steering law (the LQR gain table) is
    /// loaded from `params_dir` here, so a bad table fails initialisation
    /// rather than a cycle.
    pub fn new(params: LatCtrlParams, params_dir: &Path) -> Result<Self, LatCtrlError> {
        let controller = LatController::from_params(&params, params_dir)
            .map_err(LatCtrlError::GainTableError)?;

        match controller {
            Some(_) => info!("Lateral controller {} selected", params.controller_id),
            None => warn!(
                "Unknown lateral controller id {}, steering will be held straight",
                params.controller_id
            )
        }

        Ok(Self {
            params,
            controller,
        })
    }

    pub fn params(&self) -> &LatCtrlParams {
        &self.params
    }

    /// Look-ahead distance for the given speed.
    pub fn lookahead_distance(&self, speed_ms: f64) -> f64 {
        match self.params.lookahead_mode {
            LookaheadMode::Fixed => self.params.lookahead_distance_m,
            LookaheadMode::Variable => {
                self.params.lookahead_distance_m + self.params.lookahead_speed_gain_s * speed_ms
            }
        }
    }

    /// Process one lateral control cycle.
    ///
    /// Fails only if the nearest waypoint can't be found, i.e. the path is
    /// empty. A missing look-ahead point is reported in the status report
    /// and leaves the steering demand empty.
    pub fn proc(
        &mut self,
        path: &RefPath,
        odom: &Odometry,
        leader: Option<&LeaderState>
    ) -> Result<(LatCtrlOutput, LatStatusReport), LatCtrlError> {
        let mut output = LatCtrlOutput::default();
        let mut report = LatStatusReport::default();

        // Errors against the nearest point
        let nearest_idx = find_nearest(path, &odom.pose)
            .map_err(LatCtrlError::NearestNotFound)?;
        let nearest = &path.waypoints[nearest_idx];

        report.nearest_index = nearest_idx;
        output.nearest_point_m = nearest.position3();
        output.control_state = ControlState {
            lateral_error_m: relative_coordinate(&nearest.position3(), &odom.pose)[1],
            heading_error_rad: normalize_angle(nearest.heading_rad - odom.pose.get_heading()),
        };

        debug!(
            "Nearest waypoint {}: lat error {:.3} m, head error {:.4} rad",
            nearest_idx,
            output.control_state.lateral_error_m,
            output.control_state.heading_error_rad
        );

        // With an unknown law the wheels are held straight
        let controller = match self.controller {
            Some(ref c) => c,
            None => {
                warn!(
                    "Illegal lateral controller id {}, front wheel angle set to 0",
                    self.params.controller_id
                );
                report.unknown_controller_id = true;
                output.front_wheel_angle_rad = Some(0.0);
                output.steer_angle = Some(self.params.linkage().to_actuator(0.0));
                return Ok((output, report))
            }
        };

        // Find the look-ahead point
        report.lookahead_distance_m = self.lookahead_distance(odom.speed_ms());
        let lookahead_idx = match find_lookahead(path, &odom.pose, report.lookahead_distance_m) {
            Ok(i) => i,
            Err(e) => {
                warn!("No look-ahead point, steering demand not updated: {}", e);
                report.lookahead_error = Some(e);
                return Ok((output, report))
            }
        };
        let lookahead = &path.waypoints[lookahead_idx];

        report.lookahead_index = Some(lookahead_idx);
        output.lookahead_point_m = Some(lookahead.position3());

        // Steering law
        let raw_angle_rad = controller
            .front_wheel_angle(&LatInput {
                odom,
                lookahead,
                leader,
            })
            .map_err(LatCtrlError::GainTableError)?;

        // Saturate to the steering limit
        let limit = self.params.max_front_wheel_angle_rad;
        let angle_rad = clamp(raw_angle_rad, -limit, limit);
        report.angle_limited = angle_rad != raw_angle_rad;

        output.front_wheel_angle_rad = Some(angle_rad);
        output.steer_angle = Some(self.params.linkage().to_actuator(angle_rad));

        debug!(
            "Look-ahead waypoint {}: front wheel angle {:.4} rad, steer {:.3}",
            lookahead_idx,
            angle_rad,
            output.steer_angle.unwrap_or_default()
        );

        Ok((output, report))
    }
}
