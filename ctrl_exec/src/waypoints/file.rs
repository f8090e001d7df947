//! # Waypoint files
//!
//! Reference paths are stored as CSV files with one waypoint per row:
//!
//! ```text
//! index,time_s,x_m,y_m,heading_rad,v_x_ms,v_y_ms,yaw_rate_rads
//! 0,0.0,0.0,0.0,0.0,5.0,0.0,0.0
//! ```
//!
//! The first two columns are informational (recording order and time) and are ignored when
//! loading. The `WaypointRecorder` writes the same format from odometry so that a driven path can
//! be replayed later.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{fs::File, io::Read, path::Path};

use log::debug;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::geometry::plane_dist;
use comms_if::{
    loc::Odometry,
    planning::{RefPath, Waypoint},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One row of a waypoint file.
#[derive(Debug, Serialize, Deserialize)]
struct WaypointRecord {
    index: usize,
    time_s: f64,
    x_m: f64,
    y_m: f64,
    heading_rad: f64,
    v_x_ms: f64,
    v_y_ms: f64,
    yaw_rate_rads: f64,
}

/// Records a driven path into a waypoint file.
///
/// A new row is only written once the vehicle has moved at least the minimum recording distance
/// from the last recorded point, so a stationary vehicle doesn't fill the file.
pub struct WaypointRecorder {
    writer: csv::Writer<File>,
    min_distance_m: f64,
    last_position_m: Option<Vector3<f64>>,
    num_recorded: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum WaypointFileError {
    #[error("Cannot open the waypoint file: {0}")]
    FileError(std::io::Error),

    #[error("Cannot parse or write the waypoint file: {0}")]
    CsvError(csv::Error),

    #[error("The waypoint file contains no waypoints")]
    Empty,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Load a reference path from the waypoint file at `path`.
pub fn load_waypoints<P: AsRef<Path>>(path: P) -> Result<RefPath, WaypointFileError> {
    let file = File::open(path).map_err(WaypointFileError::FileError)?;
    read_waypoints(file)
}

/// Read a reference path from any reader providing the waypoint CSV format.
pub fn read_waypoints<R: Read>(reader: R) -> Result<RefPath, WaypointFileError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut waypoints = Vec::new();

    for result in rdr.deserialize() {
        let rec: WaypointRecord = result.map_err(WaypointFileError::CsvError)?;
        waypoints.push(Waypoint::from(rec));
    }

    if waypoints.is_empty() {
        return Err(WaypointFileError::Empty);
    }

    debug!("Read {} waypoints", waypoints.len());

    Ok(RefPath::new(waypoints))
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl From<WaypointRecord> for Waypoint {
    fn from(rec: WaypointRecord) -> Self {
        Waypoint {
            x_m: rec.x_m,
            y_m: rec.y_m,
            heading_rad: rec.heading_rad,
            v_x_ms: rec.v_x_ms,
            v_y_ms: rec.v_y_ms,
            yaw_rate_rads: rec.yaw_rate_rads,
        }
    }
}

impl WaypointRecorder {
    /// Create a new recorder writing to the file at `path`, truncating any existing file.
    pub fn create<P: AsRef<Path>>(path: P, min_distance_m: f64) -> Result<Self, WaypointFileError> {
        let file = File::create(path).map_err(WaypointFileError::FileError)?;

        Ok(Self {
            writer: csv::WriterBuilder::new().has_headers(true).from_writer(file),
            min_distance_m,
            last_position_m: None,
            num_recorded: 0,
        })
    }

    /// Record the given odometry if the vehicle has moved far enough since the last record.
    ///
    /// Returns `true` if a row was written.
    pub fn record(&mut self, odom: &Odometry, time_s: f64) -> Result<bool, WaypointFileError> {
        let position_m = odom.pose.position_m;

        if let Some(last) = self.last_position_m {
            if plane_dist(&last, &position_m) < self.min_distance_m {
                return Ok(false);
            }
        }

        self.writer
            .serialize(WaypointRecord {
                index: self.num_recorded,
                time_s,
                x_m: position_m[0],
                y_m: position_m[1],
                heading_rad: odom.pose.get_heading(),
                v_x_ms: odom.twist.linear_ms[0],
                v_y_ms: odom.twist.linear_ms[1],
                yaw_rate_rads: odom.twist.angular_rads[2],
            })
            .map_err(WaypointFileError::CsvError)?;
        self.writer.flush().map_err(WaypointFileError::FileError)?;

        self.last_position_m = Some(position_m);
        self.num_recorded += 1;

        Ok(true)
    }

    /// Number of rows written so far.
    pub fn num_recorded(&self) -> usize {
        self.num_recorded
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::loc::Pose;

    #[test]
    fn test_read_waypoints() {
        let csv_str = "\
index,time_s,x_m,y_m,heading_rad,v_x_ms,v_y_ms,yaw_rate_rads
0,0.0,0.0,0.0,0.0,5.0,0.0,0.0
1,0.1,0.5,0.0,0.0,5.0,0.0,0.0
2,0.2,1.0,0.1,0.2,5.5,0.1,0.05
";
        let path = read_waypoints(csv_str.as_bytes()).unwrap();

        // The first data row is kept
        assert_eq!(path.len(), 3);
        assert_eq!(path.waypoints[0], Waypoint::new(0.0, 0.0, 0.0, 5.0));
        assert_eq!(path.waypoints[2].heading_rad, 0.2);
        assert_eq!(path.waypoints[2].v_y_ms, 0.1);
        assert_eq!(path.waypoints[2].yaw_rate_rads, 0.05);
    }

    #[test]
    fn test_read_empty_and_malformed() {
        let header = "index,time_s,x_m,y_m,heading_rad,v_x_ms,v_y_ms,yaw_rate_rads\n";
        assert!(matches!(
            read_waypoints(header.as_bytes()),
            Err(WaypointFileError::Empty)
        ));

        let bad = format!("{}0,0.0,abc,0.0,0.0,5.0,0.0,0.0\n", header);
        assert!(matches!(
            read_waypoints(bad.as_bytes()),
            Err(WaypointFileError::CsvError(_))
        ));
    }

    #[test]
    fn test_recorder_min_distance_and_reload() {
        let mut file_path = std::env::temp_dir();
        file_path.push("ctrl_lib_recorder_test.csv");

        let mut rec = WaypointRecorder::create(&file_path, 0.05).unwrap();

        let mut odom = Odometry::default();
        odom.twist.linear_ms[0] = 2.0;

        // First point is always recorded
        assert!(rec.record(&odom, 0.0).unwrap());

        // Too close to the previous point
        odom.pose = Pose::from_xy_heading(0.01, 0.0, 0.0);
        assert!(!rec.record(&odom, 0.1).unwrap());

        // Far enough
        odom.pose = Pose::from_xy_heading(0.5, 0.2, 0.3);
        assert!(rec.record(&odom, 0.2).unwrap());
        assert_eq!(rec.num_recorded(), 2);

        let path = load_waypoints(&file_path).unwrap();
        assert_eq!(path.len(), 2);
        assert!((path.waypoints[1].x_m - 0.5).abs() < 1e-12);
        assert!((path.waypoints[1].heading_rad - 0.3).abs() < 1e-9);
        assert_eq!(path.waypoints[1].v_x_ms, 2.0);

        std::fs::remove_file(&file_path).ok();
    }
}
