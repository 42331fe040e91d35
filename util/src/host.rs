//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the root of the software
/// checkout, which contains the `params` and `sessions` directories.
pub const SW_ROOT_ENV_VAR: &str = "MIMIC_SW_ROOT";

/// Get the root directory of the software from the environment.
pub fn get_mimic_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}

/// Short description of the host this executable is running on.
pub fn get_host_desc() -> String {
    format!("{} ({}, {})", env::consts::OS, env::consts::ARCH, env::consts::FAMILY)
}
