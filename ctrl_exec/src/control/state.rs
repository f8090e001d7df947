//! Control module state

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
    lat_ctrl::{LatCtrl, LatCtrlError, LatStatusReport},
    lon_ctrl::{LonCtrl, LonInput, LonStatusReport, Stage},
};
use comms_if::{
    ctrl::{ControlState, LeaderState, ReplayTrigger},
    eqpt::{ChassisCommand, ChassisState},
    loc::Odometry,
    planning::RefPath,
};
use util::{
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The control module.
///
/// Inputs are latched with the `set_*` functions (or through `proc`) as they
/// arrive, in any order. Each call to `run_cycle` uses the latest latched
/// inputs.
#[derive(Debug, Clone, Default)]
pub struct Control {
    params: Params,

    lat_ctrl: LatCtrl,
    lon_ctrl: LonCtrl,

    path: Option<RefPath>,
    odom: Option<Odometry>,
    chassis: Option<ChassisState>,
    leader: Option<LeaderState>,

    /// Outputs of the last successful cycle
    output: OutputData,
}

/// Input data to the module. Any input which is `Some` replaces the latched
/// value, the rest keep their previous value.
#[derive(Debug, Clone, Default)]
pub struct InputData {
    pub path: Option<RefPath>,
    pub odom: Option<Odometry>,
    pub chassis: Option<ChassisState>,
    pub leader: Option<LeaderState>,
}

/// Output data of the module.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct OutputData {
    pub chassis_cmd: ChassisCommand,

    pub lookahead_point_m: Vector3<f64>,

    pub nearest_point_m: Vector3<f64>,

    pub control_state: ControlState,

    /// Only set on the cycle the stage transition happens.
    pub replay_trigger: ReplayTrigger,
}

/// The status report of one cycle.
#[derive(Debug, Copy, Clone, Default, Serialize)]
pub struct StatusReport {
    /// Lateral report, if lateral control ran to completion.
    pub lat: Option<LatStatusReport>,

    /// Set if lateral control couldn't run this cycle.
    pub lat_failed: bool,

    /// Longitudinal report, if longitudinal control ran.
    pub lon: Option<LonStatusReport>,

    /// Whether the leader feed was used this cycle.
    pub leader_active: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("Cannot load the control parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Cannot initialise lateral control: {0}")]
    LatCtrlInitError(LatCtrlError),

    #[error(
        "Inputs not ready (path: {have_path}, pose: {have_odom}, first vehicle: \
         {is_first_vehicle}, lateral enabled: {lateral_enabled})"
    )]
    InputsNotReady {
        have_path: bool,
        have_odom: bool,
        is_first_vehicle: bool,
        lateral_enabled: bool,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for Control {
    type InitData = &'static str;
    type InitError = ControlError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = ControlError;

    /// Initialise the control module.
    ///
    /// Expected init data is a path to the parameter file, relative to the
    /// parameters directory. Files referenced by the parameters are looked
    /// for in the same directory.
    fn init(
        &mut self,
        init_data: Self::InitData,
        _session: &Session
    ) -> Result<(), Self::InitError> {
        let params: Params = params::load(init_data)
            .map_err(ControlError::ParamLoadError)?;

        let params_dir = util::host::get_params_dir()
            .map_err(|_| ControlError::ParamLoadError(params::LoadError::SwRootNotSet))?;

        *self = Self::new(params, &params_dir)?;

        Ok(())
    }

    /// Latch the given inputs and run one control cycle.
    fn proc(
        &mut self,
        input_data: &Self::InputData
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        if let Some(ref path) = input_data.path {
            self.set_path(path.clone());
        }
        if let Some(odom) = input_data.odom {
            self.set_odometry(odom);
        }
        if let Some(chassis) = input_data.chassis {
            self.set_chassis_state(chassis);
        }
        if let Some(leader) = input_data.leader {
            self.set_leader_state(leader);
        }

        self.run_cycle()
    }
}

impl Control {
    /// Create a new control module from the given parameters.
    ///
    /// Fails if the selected steering law can't be built, for instance if the
    /// LQR gain table can't be loaded from `params_dir`.
    pub fn new(params: Params, params_dir: &Path) -> Result<Self, ControlError> {
        let lat_ctrl = LatCtrl::new(params.lat.clone(), params_dir)
            .map_err(ControlError::LatCtrlInitError)?;
        let lon_ctrl = LonCtrl::new(params.lon.clone());

        info!(
            "Control initialised (lateral: {}, longitudinal: {}, first vehicle: {}, leader feed: {})",
            params.lateral_enabled,
            params.longitudinal_enabled,
            params.is_first_vehicle,
            params.leader_feed_enabled
        );

        Ok(Self {
            params,
            lat_ctrl,
            lon_ctrl,
            ..Default::default()
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Replace the reference path.
    pub fn set_path(&mut self, path: RefPath) {
        info!("New reference path with {} waypoints", path.len());
        self.path = Some(path);
    }

    pub fn set_odometry(&mut self, odom: Odometry) {
        self.odom = Some(odom);
    }

    pub fn set_chassis_state(&mut self, chassis: ChassisState) {
        self.chassis = Some(chassis);
    }

    pub fn set_leader_state(&mut self, leader: LeaderState) {
        self.leader = Some(leader);
    }

    pub fn chassis_command(&self) -> ChassisCommand {
        self.output.chassis_cmd
    }

    pub fn lookahead_point(&self) -> Vector3<f64> {
        self.output.lookahead_point_m
    }

    pub fn nearest_point(&self) -> Vector3<f64> {
        self.output.nearest_point_m
    }

    pub fn control_state(&self) -> ControlState {
        self.output.control_state
    }

    pub fn replay_trigger(&self) -> ReplayTrigger {
        self.output.replay_trigger
    }

    pub fn stage(&self) -> Stage {
        self.lon_ctrl.stage()
    }

    pub fn distance_m(&self) -> f64 {
        self.lon_ctrl.distance_m()
    }

    /// The leader state, if the leader feed should be followed this cycle.
    fn active_leader(&self) -> Option<&LeaderState> {
        if self.params.leader_feed_enabled && !self.params.is_first_vehicle {
            self.leader.as_ref()
        }
        else {
            None
        }
    }

    /// Check that enough inputs have arrived to run a cycle.
    ///
    /// A pose is always needed. A path is needed unless this is the first
    /// vehicle or lateral control is disabled.
    fn check_inputs(&self) -> Result<(), ControlError> {
        let have_path = self.path.is_some();
        let have_odom = self.odom.is_some();

        if have_odom
            && (have_path || self.params.is_first_vehicle || !self.params.lateral_enabled)
        {
            Ok(())
        }
        else {
            Err(ControlError::InputsNotReady {
                have_path,
                have_odom,
                is_first_vehicle: self.params.is_first_vehicle,
                lateral_enabled: self.params.lateral_enabled,
            })
        }
    }

    /// Run one control cycle on the latched inputs.
    ///
    /// If the inputs aren't ready the cycle is skipped and the previous
    /// outputs are kept.
    pub fn run_cycle(&mut self) -> Result<(OutputData, StatusReport), ControlError> {
        if let Err(e) = self.check_inputs() {
            warn!("Control cycle skipped: {}", e);
            return Err(e)
        }

        let mut report = StatusReport::default();

        // The replay trigger is a pulse
        self.output.replay_trigger = ReplayTrigger::default();

        let odom = self.odom.unwrap_or_default();
        let chassis = self.chassis.unwrap_or_default();
        let leader = self.active_leader().copied();
        report.leader_active = leader.is_some();

        let empty_path = RefPath::default();
        let path = self.path.as_ref().unwrap_or(&empty_path);

        // Lateral control
        if self.params.lateral_enabled {
            match self.lat_ctrl.proc(path, &odom, leader.as_ref()) {
                Ok((lat_out, lat_report)) => {
                    self.output.control_state = lat_out.control_state;
                    self.output.nearest_point_m = lat_out.nearest_point_m;
                    if let Some(p) = lat_out.lookahead_point_m {
                        self.output.lookahead_point_m = p;
                    }
                    if let Some(s) = lat_out.steer_angle {
                        self.output.chassis_cmd.steer_angle = s;
                    }
                    report.lat = Some(lat_report);
                },
                Err(e) => {
                    warn!("Lateral control failed, steering demand held: {}", e);
                    report.lat_failed = true;
                }
            }
        }
        else {
            self.output.chassis_cmd.steer_angle = 0.0;
        }

        // Longitudinal control
        if self.params.longitudinal_enabled {
            let (lon_out, lon_report) = self.lon_ctrl.proc(&LonInput {
                path,
                odom: &odom,
                chassis: &chassis,
                leader: leader.as_ref(),
                dt_s: self.params.cycle_period_s,
            });

            self.output.chassis_cmd.accel_pedal = lon_out.accel_pedal;
            self.output.chassis_cmd.brake_pedal = lon_out.brake_pedal;
            self.output.replay_trigger.trigger = lon_out.replay_trigger;
            report.lon = Some(lon_report);
        }

        debug!(
            "Chassis command: steer {:.3}, accel {:.3}, brake {:.3}",
            self.output.chassis_cmd.steer_angle,
            self.output.chassis_cmd.accel_pedal,
            self.output.chassis_cmd.brake_pedal
        );

        Ok((self.output, report))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::{loc::Pose, planning::Waypoint};

    fn straight_path() -> RefPath {
        RefPath::new(
            (0..50)
                .map(|i| Waypoint::new(i as f64, 0.0, 0.0, 5.0))
                .collect()
        )
    }

    fn odom_at(x: f64, y: f64, speed: f64) -> Odometry {
        let mut odom = Odometry::default();
        odom.pose = Pose::from_xy_heading(x, y, 0.0);
        odom.twist.linear_ms[0] = speed;
        odom
    }

    fn control(params: Params) -> Control {
        Control::new(params, Path::new(".")).unwrap()
    }

    #[test]
    fn test_gate_needs_pose() {
        let mut ctrl = control(Params::default());
        ctrl.set_path(straight_path());

        assert!(matches!(
            ctrl.run_cycle(),
            Err(ControlError::InputsNotReady { have_path: true, have_odom: false, .. })
        ));
        assert_eq!(ctrl.chassis_command(), ChassisCommand::default());
    }

    #[test]
    fn test_gate_needs_path_for_follower() {
        let mut ctrl = control(Params::default());
        ctrl.set_odometry(odom_at(0.0, 0.0, 0.0));
        assert!(matches!(
            ctrl.run_cycle(),
            Err(ControlError::InputsNotReady { have_path: false, have_odom: true, .. })
        ));

        // A first vehicle may run without a path
        let mut ctrl = control(Params {
            is_first_vehicle: true,
            ..Default::default()
        });
        ctrl.set_odometry(odom_at(0.0, 0.0, 0.0));
        assert!(ctrl.run_cycle().is_ok());

        // As may any vehicle without lateral control
        let mut ctrl = control(Params {
            lateral_enabled: false,
            ..Default::default()
        });
        ctrl.set_odometry(odom_at(0.0, 0.0, 0.0));
        assert!(ctrl.run_cycle().is_ok());
    }

    #[test]
    fn test_full_cycle() {
        let mut ctrl = control(Params::default());

        let input = InputData {
            path: Some(straight_path()),
            odom: Some(odom_at(2.0, -1.0, 3.0)),
            chassis: Some(ChassisState::default()),
            leader: None,
        };
        let (output, report) = ctrl.proc(&input).unwrap();

        // Steering towards the path on the left
        let lat = report.lat.unwrap();
        assert_eq!(lat.nearest_index, 2);
        assert!(output.control_state.lateral_error_m > 0.0);
        assert_eq!(output.nearest_point_m, Vector3::new(2.0, 0.0, 0.0));
        assert_eq!(output.lookahead_point_m, Vector3::new(10.0, 0.0, 0.0));

        let linkage = ctrl.params().lat.linkage();
        let angle = lat_angle(&output, &linkage);
        assert!(angle > 0.0 && angle <= ctrl.params().lat.max_front_wheel_angle_rad);

        // Accelerating towards 5 m/s
        assert_eq!(output.chassis_cmd.accel_pedal, 2.0);
        assert_eq!(output.chassis_cmd.brake_pedal, 0.0);
        assert_eq!(ctrl.chassis_command(), output.chassis_cmd);
    }

    fn lat_angle(output: &OutputData, linkage: &crate::lat_ctrl::SteerLinkage) -> f64 {
        linkage.to_front_wheel(output.chassis_cmd.steer_angle)
    }

    #[test]
    fn test_lateral_disabled_zeroes_steering() {
        let mut ctrl = control(Params {
            lateral_enabled: false,
            ..Default::default()
        });
        ctrl.set_path(straight_path());
        ctrl.set_odometry(odom_at(2.0, -1.0, 3.0));

        let (output, report) = ctrl.run_cycle().unwrap();
        assert_eq!(output.chassis_cmd.steer_angle, 0.0);
        assert!(report.lat.is_none());
    }

    #[test]
    fn test_longitudinal_disabled_holds_pedals() {
        let mut ctrl = control(Params {
            longitudinal_enabled: false,
            ..Default::default()
        });
        ctrl.set_path(straight_path());
        ctrl.set_odometry(odom_at(2.0, 0.0, 0.0));

        let (output, report) = ctrl.run_cycle().unwrap();
        assert_eq!(output.chassis_cmd.accel_pedal, 0.0);
        assert_eq!(output.chassis_cmd.brake_pedal, 0.0);
        assert!(report.lon.is_none());
    }

    #[test]
    fn test_lookahead_failure_holds_steering() {
        let mut ctrl = control(Params::default());
        ctrl.set_path(straight_path());

        ctrl.set_odometry(odom_at(2.0, -1.0, 5.0));
        let (first, _) = ctrl.run_cycle().unwrap();

        // At the end of the path the look-ahead search fails, the last
        // steering demand and look-ahead point are kept
        ctrl.set_odometry(odom_at(49.0, -1.0, 5.0));
        let (second, report) = ctrl.run_cycle().unwrap();
        assert!(report.lat.unwrap().lookahead_error.is_some());
        assert_eq!(second.chassis_cmd.steer_angle, first.chassis_cmd.steer_angle);
        assert_eq!(second.lookahead_point_m, first.lookahead_point_m);
        assert_eq!(second.nearest_point_m, Vector3::new(49.0, 0.0, 0.0));
    }

    #[test]
    fn test_unknown_lateral_id() {
        let mut ctrl = control(Params {
            lat: crate::lat_ctrl::LatCtrlParams {
                controller_id: 99,
                ..Default::default()
            },
            ..Default::default()
        });
        ctrl.set_path(straight_path());
        ctrl.set_odometry(odom_at(2.0, -1.0, 5.0));

        let (output, report) = ctrl.run_cycle().unwrap();
        assert!(report.lat.unwrap().unknown_controller_id);
        assert_eq!(
            output.chassis_cmd.steer_angle,
            ctrl.params().lat.linkage().to_actuator(0.0)
        );
    }

    #[test]
    fn test_replay_trigger_pulse() {
        let mut ctrl = control(Params {
            is_first_vehicle: true,
            lon: crate::lon_ctrl::LonCtrlParams {
                mode: 3,
                trigger_speed_ms: 4.0,
                ..Default::default()
            },
            ..Default::default()
        });
        ctrl.set_path(straight_path());

        ctrl.set_odometry(odom_at(0.0, 0.0, 3.0));
        let (output, _) = ctrl.run_cycle().unwrap();
        assert!(!output.replay_trigger.trigger);
        assert_eq!(ctrl.stage(), Stage::InitialAccel);

        ctrl.set_odometry(odom_at(1.0, 0.0, 4.0));
        let (output, _) = ctrl.run_cycle().unwrap();
        assert!(output.replay_trigger.trigger);
        assert!(ctrl.replay_trigger().trigger);

        ctrl.set_odometry(odom_at(2.0, 0.0, 4.5));
        let (output, _) = ctrl.run_cycle().unwrap();
        assert!(!output.replay_trigger.trigger);
        assert_eq!(ctrl.stage(), Stage::SteadyState);
    }

    #[test]
    fn test_leader_only_followed_when_active() {
        let lon = crate::lon_ctrl::LonCtrlParams {
            mode: 3,
            ..Default::default()
        };
        let mut leader = LeaderState::default();
        leader.distance_m = 30.0;

        // Feed disabled: the leader is ignored
        let mut ctrl = control(Params {
            lon: lon.clone(),
            ..Default::default()
        });
        ctrl.set_path(straight_path());
        ctrl.set_odometry(odom_at(0.0, 0.0, 0.0));
        ctrl.set_leader_state(leader);
        let (_, report) = ctrl.run_cycle().unwrap();
        assert!(!report.leader_active);
        assert!(report.lon.unwrap().errors.is_none());

        // First vehicle: the leader is ignored
        let mut ctrl = control(Params {
            lon: lon.clone(),
            leader_feed_enabled: true,
            is_first_vehicle: true,
            ..Default::default()
        });
        ctrl.set_odometry(odom_at(0.0, 0.0, 0.0));
        ctrl.set_leader_state(leader);
        let (_, report) = ctrl.run_cycle().unwrap();
        assert!(!report.leader_active);

        // Feed enabled on a follower, but nothing received yet
        let mut ctrl = control(Params {
            lon,
            leader_feed_enabled: true,
            ..Default::default()
        });
        ctrl.set_path(straight_path());
        ctrl.set_odometry(odom_at(0.0, 0.0, 0.0));
        let (_, report) = ctrl.run_cycle().unwrap();
        assert!(!report.leader_active);

        // Once received it's followed
        ctrl.set_leader_state(leader);
        let (output, report) = ctrl.run_cycle().unwrap();
        assert!(report.leader_active);
        assert_eq!(report.lon.unwrap().errors.map(|e| e.distance_m), Some(25.0));
        assert_eq!(output.chassis_cmd.accel_pedal, 25.0);
    }

    #[test]
    fn test_accel_and_brake_exclusive() {
        let mut ctrl = control(Params::default());
        ctrl.set_path(straight_path());

        for i in 0..40 {
            let speed = i as f64 * 0.5;
            ctrl.set_odometry(odom_at(i as f64, 0.2, speed));
            let (output, _) = ctrl.run_cycle().unwrap();
            let cmd = output.chassis_cmd;
            assert!(cmd.accel_pedal == 0.0 || cmd.brake_pedal == 0.0);
            assert!(cmd.accel_pedal <= 65.0 && cmd.brake_pedal <= 40.0);
        }
    }
}
