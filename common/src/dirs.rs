//! Resolve the configuration and rule-cache directories for `underlay`.
//!
//! An environment override takes precedence; otherwise the platform location
//! provided by the `directories` crate is used.

use std::env;
use std::path::PathBuf;

use directories::ProjectDirs;

use crate::config::ConfigError;

const QUALIFIER: &str = "io";
const ORGANIZATION: &str = "underlay";
const APPLICATION: &str = "underlay";

pub const CONFIG_DIR_ENV: &str = "UNDERLAY_CONFIG_DIR";

const RULES_SUBDIR: &str = "rules";

fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION).ok_or(ConfigError::NoConfigDir)
}

/// Resolve an override directory from an environment variable.
///
/// An empty value counts as unset.
fn dir_from_env(name: &str) -> Option<PathBuf> {
    let value = env::var_os(name)?;
    if value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

/// Return the directory holding `fofa.json` and the rule cache.
pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = dir_from_env(CONFIG_DIR_ENV) {
        return Ok(dir);
    }

    Ok(project_dirs()?.config_dir().to_path_buf())
}

/// Return the directory where provider IP lists are cached.
pub fn get_rules_dir() -> Result<PathBuf, ConfigError> {
    Ok(get_config_dir()?.join(RULES_SUBDIR))
}
