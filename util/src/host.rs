//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Environment variable holding the root directory of the control software. Parameter files and
/// sessions are located relative to this directory.
pub const SW_ROOT_ENV_VAR: &str = "CTRL_SW_ROOT";

/// Retrieve the software root directory from the environment.
pub fn get_ctrl_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}

/// Retrieve the directory containing the parameter files.
pub fn get_params_dir() -> Result<PathBuf, env::VarError> {
    let mut path = get_ctrl_sw_root()?;
    path.push("params");
    Ok(path)
}
