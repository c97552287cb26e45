//! Path resolution utilities.

use crate::env::{get_var, vars};
use crate::error::ConfigError;
use std::path::PathBuf;

/// Get the RagMem base directory (`$RAGMEM_HOME` or ~/.ragmem).
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    if let Some(home) = get_var(vars::RAGMEM_HOME) {
        return Ok(PathBuf::from(home));
    }

    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".ragmem"))
}

/// Get the main config file path (`$RAGMEM_CONFIG` or ~/.ragmem/ragmem.json5).
pub fn config_file() -> Result<PathBuf, ConfigError> {
    if let Some(path) = get_var(vars::RAGMEM_CONFIG) {
        return Ok(PathBuf::from(path));
    }
    Ok(base_dir()?.join("ragmem.json5"))
}

/// Get the default SQLite database path (~/.ragmem/memories.db).
pub fn database_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("memories.db"))
}
