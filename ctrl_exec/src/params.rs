//! # Control Executable Parameters
//!
//! This module provide parameters for the control executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use ctrl_lib::sim::SimParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExecParams {
    /// Reference path file, relative to the software root
    pub waypoint_file: String,

    /// If true the driven path is recorded once the replay trigger fires
    pub record_path: bool,

    /// Minimum distance between two recorded waypoints
    ///
    /// Units: meters
    pub min_record_distance_m: f64,

    /// Number of cycles to run before stopping. Runs until the end of the
    /// path is reached if not given.
    #[serde(default)]
    pub max_cycles: Option<u64>,

    /// If true each cycle is padded out to the control period, otherwise the
    /// simulation runs as fast as possible
    pub realtime: bool,

    /// Simulated vehicle and leader
    pub sim: SimParams,
}
