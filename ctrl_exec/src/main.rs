//! Main control executable entry point.
//!
//! # Architecture
//!
//! The executable closes the loop between the controller and a simulated
//! vehicle:
//!
//!     - Initialise the session, logging and the control module
//!     - Load the reference path
//!     - Main loop:
//!         - Acquire the simulated odometry, chassis and leader state
//!         - Control processing
//!         - Archive the cycle
//!         - Record the driven path once the replay trigger has fired
//!         - Step the simulation with the new command
//!
//! An optional single argument overrides the waypoint file given in the
//! executable parameters.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use ctrl_lib::{
    control::{Control, ControlError, InputData, OutputData, StatusReport},
    lon_ctrl::Stage,
    sim::{VehicleSim, VirtualLeader},
    waypoints::{find_nearest, file::{load_waypoints, WaypointRecorder}},
};

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::Serialize;
use std::env;
use std::thread;
use std::time::{Duration, Instant};
use color_eyre::{Report, eyre::{WrapErr, eyre}};

// Internal
use params::ExecParams;
use util::{
    archive::Archiver,
    host,
    module::State,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One row of the cycle archive.
#[derive(Serialize)]
struct CycleRecord {
    cycle: u64,
    time_s: f64,
    x_m: f64,
    y_m: f64,
    heading_rad: f64,
    speed_ms: f64,
    steer_angle: f64,
    accel_pedal: f64,
    brake_pedal: f64,
    lateral_error_m: f64,
    heading_error_rad: f64,
    nearest_x_m: f64,
    nearest_y_m: f64,
    lookahead_x_m: f64,
    lookahead_y_m: f64,
    stage: Stage,
    distance_m: f64,
    replay_trigger: bool,
    leader_active: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "ctrl_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Vehicle Control Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: ExecParams = util::params::load(
        "exec.toml"
    ).wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    let waypoint_file = match args.len() {
        1 => exec_params.waypoint_file.clone(),
        2 => args[1].clone(),
        _ => return Err(eyre!(
            "Expected either zero or one argument, found {}", args.len() - 1
        ))
    };

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut ctrl = Control::default();
    ctrl.init("ctrl.toml", &session)
        .wrap_err("Failed to initialise Control")?;
    info!("Control init complete");

    info!(
        "Control parameters: {}",
        serde_json::to_string(ctrl.params()).wrap_err("Failed to serialise the parameters")?
    );

    let dt_s = ctrl.params().cycle_period_s;
    if dt_s <= 0.0 {
        return Err(eyre!("The cycle period must be positive, found {}", dt_s));
    }

    // ---- LOAD REFERENCE PATH ----

    let mut waypoint_path = host::get_ctrl_sw_root()
        .wrap_err("Could not find the software root")?;
    waypoint_path.push(&waypoint_file);

    let ref_path = load_waypoints(&waypoint_path)
        .wrap_err_with(|| format!("Failed to load the waypoint file {:?}", waypoint_path))?;

    info!("Loaded {} waypoints from {:?}", ref_path.len(), waypoint_path);

    // ---- INITIALISE SIMULATION ----

    let mut vehicle = VehicleSim::new(
        exec_params.sim.clone(),
        ctrl.params().lat.linkage()
    );

    let mut leader = if exec_params.sim.leader_enabled {
        info!(
            "Simulating a leader at {:.2} m/s starting {:.2} m along the path",
            exec_params.sim.leader_speed_ms,
            exec_params.sim.leader_start_m
        );
        Some(VirtualLeader::new(
            &ref_path,
            exec_params.sim.leader_speed_ms,
            exec_params.sim.leader_start_m
        ))
    }
    else {
        None
    };

    let mut archiver = Archiver::from_path(&session, "ctrl/cycles.csv")
        .wrap_err("Failed to create the cycle archive")?;

    let mut recorder: Option<WaypointRecorder> = None;

    // The path is latched into control on the first cycle only
    let mut pending_path = Some(ref_path.clone());

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut num_cycles: u64 = 0;

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        let time_s = num_cycles as f64 * dt_s;

        // ---- DATA INPUT ----

        let odom = vehicle.odometry();

        let input = InputData {
            path: pending_path.take(),
            odom: Some(odom),
            chassis: Some(vehicle.chassis_state()),
            leader: leader.as_ref().map(|l| l.state()),
        };

        // ---- CONTROL PROCESSING ----

        match ctrl.proc(&input) {
            Ok((output, report)) => {
                let record = cycle_record(
                    num_cycles, time_s, &odom, &output, &report, &ctrl
                );
                if let Err(e) = archiver.serialise(record) {
                    warn!("Could not archive the cycle: {}", e);
                }

                if output.replay_trigger.trigger && exec_params.record_path && recorder.is_none() {
                    let mut rec_path = session.session_root.clone();
                    rec_path.push("recorded_path.csv");

                    recorder = Some(
                        WaypointRecorder::create(&rec_path, exec_params.min_record_distance_m)
                            .wrap_err("Failed to create the path recorder")?
                    );
                    info!("Replay triggered, recording the driven path to {:?}", rec_path);
                }
            },
            // Already reported by control, the previous command stands
            Err(ControlError::InputsNotReady { .. }) => (),
            Err(e) => warn!("Error during Control processing: {}", e)
        };

        // ---- PATH RECORDING ----

        if let Some(ref mut rec) = recorder {
            if let Err(e) = rec.record(&odom, time_s) {
                warn!("Could not record waypoint: {}", e);
            }
        }

        // ---- SIMULATION ----

        vehicle.step(&ctrl.chassis_command(), dt_s);
        if let Some(ref mut l) = leader {
            l.step(dt_s);
        }

        num_cycles += 1;

        // ---- END CONDITIONS ----

        if let Some(max) = exec_params.max_cycles {
            if num_cycles >= max {
                info!("Maximum number of cycles ({}) reached, stopping", max);
                break
            }
        }

        if find_nearest(&ref_path, &vehicle.odometry().pose) == Ok(ref_path.len() - 1) {
            info!("End of the reference path reached, stopping");
            break
        }

        // ---- CYCLE MANAGEMENT ----

        if exec_params.realtime {
            let cycle_dur = Instant::now() - cycle_start_instant;

            // Get sleep duration
            match Duration::from_secs_f64(dt_s).checked_sub(cycle_dur) {
                Some(d) => thread::sleep(d),
                None => warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - dt_s
                )
            }
        }
    }

    // ---- SHUTDOWN ----

    if let Some(rec) = recorder {
        info!("Recorded {} waypoints", rec.num_recorded());
    }

    info!(
        "End of execution after {} cycles, {:.2} m travelled while following",
        num_cycles,
        ctrl.distance_m()
    );

    Ok(())
}

/// Build the archive record for one cycle.
fn cycle_record(
    cycle: u64,
    time_s: f64,
    odom: &comms_if::loc::Odometry,
    output: &OutputData,
    report: &StatusReport,
    ctrl: &Control
) -> CycleRecord {
    CycleRecord {
        cycle,
        time_s,
        x_m: odom.pose.position_m[0],
        y_m: odom.pose.position_m[1],
        heading_rad: odom.pose.get_heading(),
        speed_ms: odom.speed_ms(),
        steer_angle: output.chassis_cmd.steer_angle,
        accel_pedal: output.chassis_cmd.accel_pedal,
        brake_pedal: output.chassis_cmd.brake_pedal,
        lateral_error_m: output.control_state.lateral_error_m,
        heading_error_rad: output.control_state.heading_error_rad,
        nearest_x_m: output.nearest_point_m[0],
        nearest_y_m: output.nearest_point_m[1],
        lookahead_x_m: output.lookahead_point_m[0],
        lookahead_y_m: output.lookahead_point_m[1],
        stage: ctrl.stage(),
        distance_m: ctrl.distance_m(),
        replay_trigger: output.replay_trigger.trigger,
        leader_active: report.leader_active,
    }
}
