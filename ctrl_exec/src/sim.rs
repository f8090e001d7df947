//! # Vehicle simulation
//!
//! A kinematic bicycle model of the controlled vehicle and a virtual leader
//! driving along the reference path at constant speed. Together they let the
//! controller run closed-loop without hardware.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// Internal
use crate::{geometry::normalize_angle, lat_ctrl::SteerLinkage};
use comms_if::{
    ctrl::LeaderState,
    eqpt::{ChassisCommand, ChassisState},
    loc::{Odometry, Pose},
    planning::RefPath,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Simulation parameters
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimParams {
    /// Wheelbase of the simulated vehicle
    ///
    /// Units: meters
    pub wheelbase_m: f64,

    /// Initial pose and speed. The heading is in radians.
    pub start_x_m: f64,
    pub start_y_m: f64,
    pub start_heading_rad: f64,
    pub start_speed_ms: f64,

    /// Acceleration per unit of accelerator pedal
    ///
    /// Units: meters/second^2
    pub accel_per_pedal: f64,

    /// Deceleration per unit of brake pedal
    ///
    /// Units: meters/second^2
    pub decel_per_pedal: f64,

    /// Constant deceleration from rolling resistance and drag
    ///
    /// Units: meters/second^2
    pub drag_ms2: f64,

    /// If true a virtual leader is simulated
    pub leader_enabled: bool,

    /// Speed of the virtual leader
    ///
    /// Units: meters/second
    pub leader_speed_ms: f64,

    /// Distance along the path at which the leader starts
    ///
    /// Units: meters
    pub leader_start_m: f64,
}

/// Kinematic bicycle model of the vehicle.
#[derive(Debug, Clone)]
pub struct VehicleSim {
    params: SimParams,
    linkage: SteerLinkage,

    x_m: f64,
    y_m: f64,
    yaw_rad: f64,
    speed_ms: f64,

    /// Longitudinal acceleration over the last step
    accel_ms2: f64,

    /// Yaw rate over the last step
    yaw_rate_rads: f64,

    /// Last applied command
    cmd: ChassisCommand,
}

/// A leader vehicle driving along the reference path at constant speed.
#[derive(Debug, Clone)]
pub struct VirtualLeader {
    /// Cumulative arc length at each waypoint of the path
    stations_m: Vec<f64>,

    path: RefPath,

    speed_ms: f64,

    /// Position along the path
    station_m: f64,

    /// Distance travelled since the start
    distance_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            wheelbase_m: 3.975,
            start_x_m: 0.0,
            start_y_m: 0.0,
            start_heading_rad: 0.0,
            start_speed_ms: 0.0,
            accel_per_pedal: 0.05,
            decel_per_pedal: 0.15,
            drag_ms2: 0.1,
            leader_enabled: false,
            leader_speed_ms: 5.0,
            leader_start_m: 20.0,
        }
    }
}

impl VehicleSim {
    pub fn new(params: SimParams, linkage: SteerLinkage) -> Self {
        Self {
            x_m: params.start_x_m,
            y_m: params.start_y_m,
            yaw_rad: params.start_heading_rad,
            speed_ms: params.start_speed_ms,
            accel_ms2: 0.0,
            yaw_rate_rads: 0.0,
            cmd: ChassisCommand::default(),
            params,
            linkage,
        }
    }

    /// Advance the simulation by `dt_s` seconds under the given command.
    pub fn step(&mut self, cmd: &ChassisCommand, dt_s: f64) {
        self.cmd = *cmd;

        let delta_rad = self.linkage.to_front_wheel(cmd.steer_angle);

        // Drag only slows the vehicle, it never reverses it
        let mut accel_ms2 = self.params.accel_per_pedal * cmd.accel_pedal
            - self.params.decel_per_pedal * cmd.brake_pedal;
        if self.speed_ms > 0.0 {
            accel_ms2 -= self.params.drag_ms2;
        }

        self.yaw_rate_rads = self.speed_ms / self.params.wheelbase_m * delta_rad.tan();

        self.x_m += self.speed_ms * self.yaw_rad.cos() * dt_s;
        self.y_m += self.speed_ms * self.yaw_rad.sin() * dt_s;
        self.yaw_rad = normalize_angle(self.yaw_rad + self.yaw_rate_rads * dt_s);

        let new_speed_ms = (self.speed_ms + accel_ms2 * dt_s).max(0.0);
        self.accel_ms2 = if dt_s > 0.0 {
            (new_speed_ms - self.speed_ms) / dt_s
        }
        else {
            0.0
        };
        self.speed_ms = new_speed_ms;

        trace!(
            "Sim: x {:.3}, y {:.3}, yaw {:.4}, v {:.3}, delta {:.4}",
            self.x_m, self.y_m, self.yaw_rad, self.speed_ms, delta_rad
        );
    }

    pub fn odometry(&self) -> Odometry {
        let mut odom = Odometry::default();
        odom.pose = Pose::from_xy_heading(self.x_m, self.y_m, self.yaw_rad);
        odom.twist.linear_ms = Vector3::new(self.speed_ms, 0.0, 0.0);
        odom.twist.angular_rads = Vector3::new(0.0, 0.0, self.yaw_rate_rads);
        odom
    }

    /// The chassis telemetry, echoing the last applied command.
    pub fn chassis_state(&self) -> ChassisState {
        ChassisState {
            lon_accel_ms2: self.accel_ms2,
            accel_pedal: self.cmd.accel_pedal,
            brake_pedal: self.cmd.brake_pedal,
            steer_angle: self.cmd.steer_angle,
        }
    }
}

impl VirtualLeader {
    pub fn new(path: &RefPath, speed_ms: f64, start_m: f64) -> Self {
        let mut stations_m = Vec::with_capacity(path.len());
        let mut total_m = 0.0;
        for (i, wp) in path.waypoints.iter().enumerate() {
            if i > 0 {
                total_m += (wp.position2() - path.waypoints[i - 1].position2()).norm();
            }
            stations_m.push(total_m);
        }

        Self {
            stations_m,
            path: path.clone(),
            speed_ms,
            station_m: start_m.max(0.0).min(total_m),
            distance_m: 0.0,
        }
    }

    /// Advance the leader by `dt_s` seconds. The leader stops at the end of
    /// the path.
    pub fn step(&mut self, dt_s: f64) {
        let end_m = self.stations_m.last().copied().unwrap_or(0.0);
        let new_station_m = (self.station_m + self.speed_ms * dt_s).min(end_m);

        self.distance_m += new_station_m - self.station_m;
        self.station_m = new_station_m;
    }

    /// Whether the leader has reached the end of the path.
    pub fn finished(&self) -> bool {
        match self.stations_m.last() {
            Some(end_m) => self.station_m >= *end_m,
            None => true
        }
    }

    /// The leader feed as it would be received from the leader vehicle.
    pub fn state(&self) -> LeaderState {
        let mut leader = LeaderState::default();
        leader.distance_m = self.distance_m;

        let (x_m, y_m, heading_rad) = self.pose_at_station();
        leader.odom.pose = Pose::from_xy_heading(x_m, y_m, heading_rad);

        if !self.finished() {
            leader.odom.twist.linear_ms[0] = self.speed_ms;
        }

        leader
    }

    /// Interpolated position and heading at the current station.
    fn pose_at_station(&self) -> (f64, f64, f64) {
        let wps = &self.path.waypoints;
        if wps.is_empty() {
            return (0.0, 0.0, 0.0)
        }

        // Index of the segment containing the station
        let i = self.stations_m
            .iter()
            .rposition(|s| *s <= self.station_m)
            .unwrap_or(0);

        if i + 1 >= wps.len() {
            let last = &wps[wps.len() - 1];
            return (last.x_m, last.y_m, last.heading_rad)
        }

        let seg_m = self.stations_m[i + 1] - self.stations_m[i];
        let t = if seg_m > 0.0 {
            (self.station_m - self.stations_m[i]) / seg_m
        }
        else {
            0.0
        };

        let a = &wps[i];
        let b = &wps[i + 1];
        let heading_rad = (b.y_m - a.y_m).atan2(b.x_m - a.x_m);

        (a.x_m + t * (b.x_m - a.x_m), a.y_m + t * (b.y_m - a.y_m), heading_rad)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::planning::Waypoint;
    use std::f64::consts::FRAC_PI_2;

    fn linkage() -> SteerLinkage {
        SteerLinkage { ratio: 24.1066, offset: 4.8505 }
    }

    #[test]
    fn test_straight_line_acceleration() {
        let params = SimParams {
            drag_ms2: 0.0,
            accel_per_pedal: 0.1,
            ..Default::default()
        };
        let mut sim = VehicleSim::new(params, linkage());

        let cmd = ChassisCommand {
            steer_angle: linkage().to_actuator(0.0),
            accel_pedal: 10.0,
            brake_pedal: 0.0,
        };
        for _ in 0..10 {
            sim.step(&cmd, 0.1);
        }

        let odom = sim.odometry();
        assert!((odom.speed_ms() - 1.0).abs() < 1e-9);
        assert!(odom.pose.position_m[1].abs() < 1e-9);
        assert!(odom.pose.get_heading().abs() < 1e-9);
        assert!((sim.chassis_state().lon_accel_ms2 - 1.0).abs() < 1e-9);
        assert_eq!(sim.chassis_state().accel_pedal, 10.0);
    }

    #[test]
    fn test_braking_never_reverses() {
        let params = SimParams {
            start_speed_ms: 1.0,
            ..Default::default()
        };
        let mut sim = VehicleSim::new(params, linkage());

        let cmd = ChassisCommand {
            steer_angle: 0.0,
            accel_pedal: 0.0,
            brake_pedal: 40.0,
        };
        for _ in 0..20 {
            sim.step(&cmd, 0.1);
            assert!(sim.odometry().speed_ms() >= 0.0);
        }
        assert_eq!(sim.odometry().speed_ms(), 0.0);
    }

    #[test]
    fn test_left_steer_turns_left() {
        let params = SimParams {
            start_speed_ms: 5.0,
            drag_ms2: 0.0,
            ..Default::default()
        };
        let mut sim = VehicleSim::new(params, linkage());

        let cmd = ChassisCommand {
            steer_angle: linkage().to_actuator(0.1),
            accel_pedal: 0.0,
            brake_pedal: 0.0,
        };
        sim.step(&cmd, 0.1);
        sim.step(&cmd, 0.1);

        let odom = sim.odometry();
        assert!(odom.pose.get_heading() > 0.0);
        assert!(odom.pose.position_m[1] > 0.0);
        assert!((odom.twist.angular_rads[2] - 5.0 / 3.975 * (0.1f64).tan()).abs() < 1e-9);
    }

    #[test]
    fn test_leader_follows_path() {
        let path = RefPath::new(vec![
            Waypoint::new(0.0, 0.0, 0.0, 5.0),
            Waypoint::new(10.0, 0.0, 0.0, 5.0),
            Waypoint::new(10.0, 10.0, FRAC_PI_2, 5.0),
        ]);
        let mut leader = VirtualLeader::new(&path, 2.0, 4.0);

        let state = leader.state();
        assert_eq!(state.distance_m, 0.0);
        assert!((state.odom.pose.position_m[0] - 4.0).abs() < 1e-12);

        // Onto the second segment
        for _ in 0..4 {
            leader.step(1.0);
        }
        let state = leader.state();
        assert!((state.distance_m - 8.0).abs() < 1e-12);
        assert!((state.odom.pose.position_m[0] - 10.0).abs() < 1e-12);
        assert!((state.odom.pose.position_m[1] - 2.0).abs() < 1e-12);
        assert!((state.odom.pose.get_heading() - FRAC_PI_2).abs() < 1e-9);
        assert_eq!(state.odom.speed_ms(), 2.0);

        // Stops at the end
        for _ in 0..10 {
            leader.step(1.0);
        }
        assert!(leader.finished());
        let state = leader.state();
        assert!((state.distance_m - 16.0).abs() < 1e-12);
        assert_eq!(state.odom.speed_ms(), 0.0);
    }
}
