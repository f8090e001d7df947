//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the control software: the messages latched
//! into the controller each cycle and the messages it produces.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Control outputs and the leader ("virtual vehicle") feed
pub mod ctrl;

/// Chassis state and command definitions for the vehicle equipment
pub mod eqpt;

/// Localisation messages (pose and twist)
pub mod loc;

/// Planning messages (waypoints and reference paths)
pub mod planning;
