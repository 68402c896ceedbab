//! Host platform (linux for example) utility functions

use std::{env, path::PathBuf};
use uname;

/// Environment variable holding the root directory of the arm software.
pub const SW_ROOT_ENV_VAR: &str = "ARM_SW_ROOT";

/// Get the software root directory from the `ARM_SW_ROOT` environment variable.
pub fn get_arm_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}

/// Retrieve uname information.
pub fn get_uname() -> std::io::Result<uname::Info> {
    uname::uname()
}
