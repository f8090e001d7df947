//! # Equipment Interface
//!
//! This module defines the chassis telemetry received from the vehicle and the actuation command
//! sent back to it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Dynamic telemetry of a vehicle chassis.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq)]
pub struct ChassisState {
    /// Longitudinal acceleration
    ///
    /// Units: meters/second^2
    pub lon_accel_ms2: f64,

    /// Measured accelerator pedal opening, same scale as `ChassisCommand::accel_pedal`.
    pub accel_pedal: f64,

    /// Measured brake pedal opening, same scale as `ChassisCommand::brake_pedal`.
    pub brake_pedal: f64,

    /// Measured steering actuator angle, same scale as `ChassisCommand::steer_angle`.
    pub steer_angle: f64,
}

/// Actuation command for the chassis.
///
/// Accelerator and brake requests are never both non-zero.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq)]
pub struct ChassisCommand {
    /// Steering actuator angle
    pub steer_angle: f64,

    /// Accelerator pedal opening request
    pub accel_pedal: f64,

    /// Brake pedal opening request
    pub brake_pedal: f64,
}
