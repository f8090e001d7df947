//! # Lateral controllers module
//!
//! This module provides the steering laws used by LatCtrl. Each law turns the
//! current vehicle state and the resolved waypoints into a front wheel angle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};
use log::{debug, info};
use nalgebra::Vector4;
use serde::Deserialize;

// Internal
use crate::geometry::{normalize_angle, relative_coordinate};
use comms_if::{ctrl::LeaderState, loc::Odometry, planning::Waypoint};

use super::{LatCtrlParams, SteerLinkage};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Below this look-ahead distance pure pursuit commands straight ahead.
const MIN_PURSUIT_DIST_M: f64 = 1e-6;

/// Path curvature used for the heading error rate. The reference path does
/// not carry curvature so it's taken as straight.
const REF_CURVATURE_M: f64 = 0.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Pure pursuit steering law.
#[derive(Debug, Clone, Copy)]
pub struct PurePursuit {
    /// Wheelbase of the vehicle.
    wheelbase_m: f64,
}

/// A table of LQR gains scheduled by speed.
#[derive(Debug, Clone)]
pub struct GainTable {
    /// Rows in strictly increasing speed order
    rows: Vec<GainRow>,
}

/// One row of the gain table.
#[derive(Debug, Clone, Copy, Deserialize)]
struct GainRow {
    speed_ms: f64,
    k_lat: f64,
    k_lat_rate: f64,
    k_head: f64,
    k_head_rate: f64,
}

/// Gain-scheduled state feedback steering law.
///
/// The state vector is `[lateral error, lateral error rate, heading error,
/// heading error rate]` and the output is `K(speed) . x`, with the gains
/// linearly interpolated by speed and held constant beyond the ends of the
/// table.
#[derive(Debug, Clone)]
pub struct LqrController {
    gain_table_path: PathBuf,
    gains: Option<GainTable>,
}

/// Everything a steering law may need for one cycle.
#[derive(Debug, Clone, Copy)]
pub struct LatInput<'a> {
    pub odom: &'a Odometry,
    pub lookahead: &'a Waypoint,
    pub leader: Option<&'a LeaderState>,
}

/// The selectable steering laws.
#[derive(Debug, Clone)]
pub enum LatController {
    PurePursuit(PurePursuit),

    GainScheduled(LqrController),

    FeedforwardBlend {
        pursuit: PurePursuit,
        linkage: SteerLinkage,
        ff_weight: f64,
        fb_weight: f64,
    },
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum GainTableError {
    #[error("Cannot open the gain table {0:?}: {1}")]
    FileLoadError(PathBuf, std::io::Error),

    #[error("Cannot parse the gain table: {0}")]
    ParseError(csv::Error),

    #[error("The gain table is empty")]
    Empty,

    #[error("Gain table speeds must be strictly increasing, row {0} is not")]
    NonIncreasingSpeed(usize),

    #[error("The gains have not been loaded")]
    NotLoaded,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PurePursuit {
    pub fn new(wheelbase_m: f64) -> Self {
        Self { wheelbase_m }
    }

    /// Front wheel angle that puts the vehicle on the arc through `target`.
    pub fn output_front_wheel_angle(&self, target: &Waypoint, odom: &Odometry) -> f64 {
        let rel = relative_coordinate(&target.position3(), &odom.pose);
        let dist_m = rel.xy().norm();

        if dist_m < MIN_PURSUIT_DIST_M {
            return 0.0;
        }

        // Bearing of the target from the vehicle's forward axis
        let alpha_rad = rel[1].atan2(rel[0]);

        (2.0 * self.wheelbase_m * alpha_rad.sin() / dist_m).atan()
    }
}

impl GainTable {
    /// Load the table from a CSV file with columns
    /// `speed_ms,k_lat,k_lat_rate,k_head,k_head_rate`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GainTableError> {
        let file = File::open(path.as_ref())
            .map_err(|e| GainTableError::FileLoadError(path.as_ref().to_path_buf(), e))?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, GainTableError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows: Vec<GainRow> = Vec::new();
        for result in rdr.deserialize() {
            let row: GainRow = result.map_err(GainTableError::ParseError)?;

            if let Some(prev) = rows.last() {
                if row.speed_ms <= prev.speed_ms {
                    return Err(GainTableError::NonIncreasingSpeed(rows.len()));
                }
            }

            rows.push(row);
        }

        if rows.is_empty() {
            return Err(GainTableError::Empty);
        }

        Ok(Self { rows })
    }

    /// Number of speed breakpoints in the table.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Interpolated gain vector at the given speed.
    pub fn gains_at(&self, speed_ms: f64) -> Vector4<f64> {
        // The table is never empty once constructed
        let first = &self.rows[0];
        let last = &self.rows[self.rows.len() - 1];

        if speed_ms <= first.speed_ms {
            return first.gains();
        }
        if speed_ms >= last.speed_ms {
            return last.gains();
        }

        // Find the bracketing rows
        let upper = self.rows
            .iter()
            .position(|r| r.speed_ms >= speed_ms)
            .unwrap_or(self.rows.len() - 1);
        let lo = &self.rows[upper - 1];
        let hi = &self.rows[upper];

        let t = (speed_ms - lo.speed_ms) / (hi.speed_ms - lo.speed_ms);
        lo.gains() + (hi.gains() - lo.gains()) * t
    }
}

impl GainRow {
    fn gains(&self) -> Vector4<f64> {
        Vector4::new(self.k_lat, self.k_lat_rate, self.k_head, self.k_head_rate)
    }
}

impl LqrController {
    /// Create a new controller for the given gain table. The gains must be
    /// loaded with `load_gains` before the controller is used.
    pub fn new<P: AsRef<Path>>(gain_table_path: P) -> Self {
        Self {
            gain_table_path: gain_table_path.as_ref().to_path_buf(),
            gains: None,
        }
    }

    /// Create a controller from an already loaded table.
    pub fn from_table(gains: GainTable) -> Self {
        Self {
            gain_table_path: PathBuf::new(),
            gains: Some(gains),
        }
    }

    /// Load the gain table from disk.
    pub fn load_gains(&mut self) -> Result<(), GainTableError> {
        let table = GainTable::load(&self.gain_table_path)?;

        info!(
            "Loaded LQR gain table {:?} with {} speed breakpoints",
            self.gain_table_path,
            table.len()
        );

        self.gains = Some(table);
        Ok(())
    }

    /// Front wheel angle for the given speed and error state.
    pub fn output_front_wheel_angle(
        &self,
        speed_ms: f64,
        state: &Vector4<f64>
    ) -> Result<f64, GainTableError> {
        let table = self.gains.as_ref().ok_or(GainTableError::NotLoaded)?;

        Ok(table.gains_at(speed_ms).dot(state))
    }

    /// Build the error state against the reference waypoint.
    pub fn error_state(reference: &Waypoint, odom: &Odometry) -> Vector4<f64> {
        let v_x = odom.twist.linear_ms[0];
        let v_y = odom.twist.linear_ms[1];
        let yaw_rate = odom.twist.angular_rads[2];

        let lat_err_m = relative_coordinate(&reference.position3(), &odom.pose)[1];
        let head_err_rad = normalize_angle(reference.heading_rad - odom.pose.get_heading());

        let lat_err_rate = v_y + v_x * head_err_rad;
        let head_err_rate = -v_x * REF_CURVATURE_M + yaw_rate;

        Vector4::new(lat_err_m, lat_err_rate, head_err_rad, head_err_rate)
    }
}

impl LatController {
    /// Build the steering law selected in the parameters.
    ///
    /// Returns `Ok(None)` if the id doesn't name a law. The LQR gain table is
    /// loaded here, relative to `params_dir`, so that a missing or malformed
    /// table stops initialisation.
    pub fn from_params(
        params: &LatCtrlParams,
        params_dir: &Path
    ) -> Result<Option<Self>, GainTableError> {
        let ctrl = match params.controller_id {
            1 => LatController::PurePursuit(PurePursuit::new(params.wheelbase_m)),
            2 => {
                let mut lqr = LqrController::new(params_dir.join(&params.gain_table));
                lqr.load_gains()?;
                LatController::GainScheduled(lqr)
            },
            3 => LatController::FeedforwardBlend {
                pursuit: PurePursuit::new(params.wheelbase_m),
                linkage: params.linkage(),
                ff_weight: params.ff_weight,
                fb_weight: params.fb_weight,
            },
            _ => return Ok(None)
        };

        Ok(Some(ctrl))
    }

    /// Compute the front wheel angle demand.
    pub fn front_wheel_angle(&self, input: &LatInput) -> Result<f64, GainTableError> {
        match self {
            LatController::PurePursuit(pp) => {
                let angle = pp.output_front_wheel_angle(input.lookahead, input.odom);
                debug!("Pure pursuit output: {:.4} rad", angle);
                Ok(angle)
            },
            LatController::GainScheduled(lqr) => {
                let state = LqrController::error_state(input.lookahead, input.odom);
                debug!(
                    "LQR state: lat {:.3} m, lat rate {:.3} m/s, head {:.3} rad, head rate {:.3} rad/s",
                    state[0], state[1], state[2], state[3]
                );
                lqr.output_front_wheel_angle(input.odom.speed_ms(), &state)
            },
            LatController::FeedforwardBlend { pursuit, linkage, ff_weight, fb_weight } => {
                let fb = pursuit.output_front_wheel_angle(input.lookahead, input.odom);

                // Without a leader there's nothing to feed forward
                let angle = match input.leader {
                    Some(leader) => {
                        let ff = linkage.to_front_wheel(leader.chassis.steer_angle);
                        ff_weight * ff + fb_weight * fb
                    },
                    None => fb
                };

                debug!("Feedforward plus feedback output: {:.4} rad", angle);
                Ok(angle)
            }
        }
    }
}
