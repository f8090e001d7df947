//! # Control module
//!
//! The control module runs lateral then longitudinal control once per cycle
//! on the latest latched inputs, producing the chassis command and the
//! diagnostic outputs.
//!
//! A cycle only runs once a pose has been received and, unless this is the
//! first vehicle or lateral control is disabled, a reference path. Until then
//! the cycle is skipped and the previous command stands.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;
