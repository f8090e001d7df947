//! Longitudinal control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use nalgebra::Vector3;
use serde::Serialize;

// Internal
use super::*;
use crate::{geometry::plane_dist, waypoints::find_nearest};
use comms_if::{
    ctrl::LeaderState,
    eqpt::ChassisState,
    loc::Odometry,
    planning::RefPath,
};
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Longitudinal control state.
///
/// Owns the accumulators of the staged mode: the stage itself, the distance
/// travelled since the stage transition and the position it was last updated
/// from.
#[derive(Debug, Clone, Default)]
pub struct LonCtrl {
    params: LonCtrlParams,

    /// Current stage of the staged mode
    stage: Stage,

    /// Distance travelled, only accumulated when following a leader.
    ///
    /// Units: meters
    distance_m: f64,

    /// Position at which `distance_m` was last updated
    last_position_m: Option<Vector3<f64>>,

    /// Speed feedback controller
    speed_ctrl: PidController,

    /// The car-following law, `None` if the configured id is unknown.
    follow_law: Option<FollowLaw>,
}

/// Input data for one longitudinal cycle.
#[derive(Debug, Copy, Clone)]
pub struct LonInput<'a> {
    pub path: &'a RefPath,
    pub odom: &'a Odometry,
    pub chassis: &'a ChassisState,

    /// The leader, only given when the leader feed is active and this is not
    /// the first vehicle.
    pub leader: Option<&'a LeaderState>,

    /// Time since the last cycle
    ///
    /// Units: seconds
    pub dt_s: f64,
}

/// Output of one longitudinal cycle.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct LonCtrlOutput {
    /// Signed pedal demand before shaping
    pub raw_pedal: f64,

    /// Accelerator pedal demand, never non-zero together with `brake_pedal`
    pub accel_pedal: f64,

    pub brake_pedal: f64,

    /// True on the single cycle the stage transition happens.
    pub replay_trigger: bool,
}

/// Status report for longitudinal processing.
#[derive(Debug, Copy, Clone, Default, Serialize)]
pub struct LonStatusReport {
    pub stage: Stage,

    /// Distance travelled while following
    pub distance_m: f64,

    /// Errors against the leader, if following this cycle
    pub errors: Option<LonErrors>,

    /// Feedback and feedforward parts of the car-following command
    pub pedal_fb: f64,
    pub pedal_ff: f64,

    pub unknown_mode: bool,
    pub unknown_controller_id: bool,

    /// Set if the reference speed couldn't be read from the path.
    pub no_reference_speed: bool,

    /// Set if the demand was zeroed by the dead zone.
    pub dead_zoned: bool,

    /// Set if the demand was saturated.
    pub saturated: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Stage of the staged longitudinal mode. The transition from
/// `InitialAccel` to `SteadyState` happens once and is never undone.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum Stage {
    InitialAccel,
    SteadyState,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Stage {
    fn default() -> Self {
        Stage::InitialAccel
    }
}

impl LonCtrl {
    pub fn new(params: LonCtrlParams) -> Self {
        let speed_ctrl = PidController::new(params.speed_k_p, params.speed_k_i, params.speed_k_d);
        let follow_law = FollowLaw::from_params(&params);

        match params.mode {
            1 | 2 => info!("Longitudinal mode {} selected", params.mode),
            3 => match follow_law {
                Some(_) => info!(
                    "Longitudinal mode 3 selected with car-following law {}",
                    params.controller_id
                ),
                None => warn!(
                    "Unknown car-following law {}, following will command no pedal",
                    params.controller_id
                )
            },
            m => warn!("Unknown longitudinal mode {}, no pedal will be commanded", m)
        }

        Self {
            params,
            speed_ctrl,
            follow_law,
            ..Default::default()
        }
    }

    pub fn params(&self) -> &LonCtrlParams {
        &self.params
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    /// Process one longitudinal control cycle.
    pub fn proc(&mut self, input: &LonInput) -> (LonCtrlOutput, LonStatusReport) {
        let mut output = LonCtrlOutput::default();
        let mut report = LonStatusReport::default();

        let speed_ms = input.odom.speed_ms();

        output.raw_pedal = match self.params.mode {
            1 => self.track_speed(self.params.desired_speed_ms, speed_ms, input.dt_s),
            2 => match find_nearest(input.path, &input.odom.pose) {
                Ok(i) => {
                    let ref_speed_ms = input.path.waypoints[i].v_x_ms;
                    self.track_speed(ref_speed_ms, speed_ms, input.dt_s)
                },
                Err(e) => {
                    warn!("No reference speed available: {}", e);
                    report.no_reference_speed = true;
                    0.0
                }
            },
            3 => match input.leader {
                Some(leader) => self.follow(leader, input, &mut report),
                None => self.staged_speed(input, &mut output)
            },
            m => {
                warn!("No such longitudinal mode {}", m);
                report.unknown_mode = true;
                0.0
            }
        };

        let (accel, brake) = shape_pedal(output.raw_pedal, &self.params, &mut report);
        output.accel_pedal = accel;
        output.brake_pedal = brake;

        report.stage = self.stage;
        report.distance_m = self.distance_m;

        debug!(
            "Pedal demand {:.3} -> accel {:.3}, brake {:.3}, speed {:.3} m/s, distance {:.3} m",
            output.raw_pedal, accel, brake, speed_ms, self.distance_m
        );

        (output, report)
    }

    /// Pedal demand from the speed feedback controller.
    fn track_speed(&mut self, desired_ms: f64, current_ms: f64, dt_s: f64) -> f64 {
        -self.speed_ctrl.output_signal(desired_ms, current_ms, dt_s)
    }

    /// Staged speed control for a lead or standalone vehicle.
    fn staged_speed(&mut self, input: &LonInput, output: &mut LonCtrlOutput) -> f64 {
        let speed_ms = input.odom.speed_ms();

        // Both stages use the same feedback, only the transition differs
        let pedal = self.track_speed(self.params.desired_speed_ms, speed_ms, input.dt_s);

        if self.stage == Stage::InitialAccel && speed_ms >= self.params.trigger_speed_ms {
            self.stage = Stage::SteadyState;
            self.last_position_m = Some(input.odom.pose.position_m);
            output.replay_trigger = true;

            info!(
                "Trigger speed {:.2} m/s reached, entering steady state and triggering replay",
                self.params.trigger_speed_ms
            );
        }

        pedal
    }

    /// Car-following control against the leader.
    fn follow(
        &mut self,
        leader: &LeaderState,
        input: &LonInput,
        report: &mut LonStatusReport
    ) -> f64 {
        let errors = LonErrors {
            distance_m: (leader.distance_m - self.distance_m) - self.params.desired_distance_m,
            speed_ms: leader.odom.speed_ms() - input.odom.speed_ms(),
            accel_ms2: leader.chassis.lon_accel_ms2 - input.chassis.lon_accel_ms2,
        };
        report.errors = Some(errors);

        debug!(
            "Gap error {:.3} m, speed error {:.3} m/s, accel error {:.3} m/s^2",
            errors.distance_m, errors.speed_ms, errors.accel_ms2
        );

        // Update the travelled distance for the next cycle. The first cycle
        // only latches the position.
        let position_m = input.odom.pose.position_m;
        if let Some(last_m) = self.last_position_m {
            self.distance_m += plane_dist(&position_m, &last_m);
        }
        self.last_position_m = Some(position_m);

        let law = match self.follow_law {
            Some(l) => l,
            None => {
                warn!("No such car-following law {}", self.params.controller_id);
                report.unknown_controller_id = true;
                return 0.0
            }
        };

        report.pedal_fb = law.feedback(&errors);
        report.pedal_ff = leader_feedforward(&leader.chassis);

        self.params.ff_weight * report.pedal_ff + self.params.fb_weight * report.pedal_fb
    }
}

/// Shape a signed pedal demand into accelerator and brake demands.
///
/// Demands inside the dead zone are zeroed, the rest are saturated to
/// `[-max_brake_pedal, max_accel_pedal]`. Positive demands go to the
/// accelerator and negative ones to the brake.
pub fn shape_pedal(
    raw_pedal: f64,
    params: &LonCtrlParams,
    report: &mut LonStatusReport
) -> (f64, f64) {
    if raw_pedal.abs() < params.dead_zone || raw_pedal.is_nan() {
        report.dead_zoned = raw_pedal != 0.0;
        return (0.0, 0.0)
    }

    let pedal = clamp(raw_pedal, -params.max_brake_pedal, params.max_accel_pedal);
    report.saturated = pedal != raw_pedal;

    if pedal > 0.0 {
        (pedal, 0.0)
    }
    else {
        (0.0, -pedal)
    }
}
