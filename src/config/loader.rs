//! Configuration loading from files (std only).

use std::fs;
use std::path::Path;

use crate::error::{ConfigError, Error, Result};

use super::MachineLimits;

/// Load machine limits from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the limits
/// fail validation.
///
/// # Example
///
/// ```rust,ignore
/// use motion_core::load_limits;
///
/// let limits = load_limits("machine.toml")?;
/// ```
pub fn load_limits<P: AsRef<Path>>(path: P) -> Result<MachineLimits> {
    let content = fs::read_to_string(path.as_ref()).map_err(|e| {
        let msg = heapless::String::try_from(e.to_string().as_str()).unwrap_or_default();
        Error::Config(ConfigError::IoError(msg))
    })?;

    parse_limits(&content)
}

/// Parse machine limits from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid or fails validation.
pub fn parse_limits(content: &str) -> Result<MachineLimits> {
    let limits: MachineLimits = toml::from_str(content).map_err(|e| {
        let msg = heapless::String::try_from(e.message()).unwrap_or_default();
        Error::Config(ConfigError::ParseError(msg))
    })?;

    super::validation::validate_limits(&limits)?;

    Ok(limits)
}
