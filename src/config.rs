//! Redaction settings
//!
//! Settings come from defaults, optionally overridden by a TOML file of the
//! form:
//!
//! ```toml
//! [redact]
//! mode = "zero-and-unlink"   # or "zero-only", "unlink-only"
//! include_macro = false
//! ```
//!
//! Command-line flags are applied on top by the binary.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::errors::{ScrubError, ScrubResult};

/// What happens to a located label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedactMode {
    /// Zero the pixel data and splice the directory out of the chain
    #[default]
    ZeroAndUnlink,
    /// Zero the pixel data, keep the directory linked
    ZeroOnly,
    /// Splice the directory out, leave the pixel data in place
    UnlinkOnly,
}

impl RedactMode {
    pub fn zeroes(&self) -> bool {
        matches!(self, RedactMode::ZeroAndUnlink | RedactMode::ZeroOnly)
    }

    pub fn unlinks(&self) -> bool {
        matches!(self, RedactMode::ZeroAndUnlink | RedactMode::UnlinkOnly)
    }

    pub fn name(&self) -> &'static str {
        match self {
            RedactMode::ZeroAndUnlink => "zero-and-unlink",
            RedactMode::ZeroOnly => "zero-only",
            RedactMode::UnlinkOnly => "unlink-only",
        }
    }

    pub fn from_name(name: &str) -> ScrubResult<Self> {
        match name {
            "zero-and-unlink" => Ok(RedactMode::ZeroAndUnlink),
            "zero-only" => Ok(RedactMode::ZeroOnly),
            "unlink-only" => Ok(RedactMode::UnlinkOnly),
            other => Err(ScrubError::InvalidConfig(format!(
                "unknown redaction mode '{}' (expected zero-and-unlink, zero-only or unlink-only)", other))),
        }
    }
}

impl fmt::Display for RedactMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Settings applied to every slide in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RedactConfig {
    pub mode: RedactMode,
    /// Also remove the macro (slide overview) image where the format has one
    pub include_macro: bool,
}

impl RedactConfig {
    /// Parse settings from a TOML string
    ///
    /// Missing keys keep their defaults; unknown keys are ignored.
    pub fn from_toml_str(content: &str) -> ScrubResult<Self> {
        let toml_value: toml::Value = match content.parse() {
            Ok(value) => value,
            Err(e) => return Err(ScrubError::InvalidConfig(format!("Failed to parse TOML: {}", e))),
        };

        let mut config = RedactConfig::default();

        let table = match toml_value.get("redact") {
            Some(table) => table,
            None => return Ok(config),
        };
        if !table.is_table() {
            return Err(ScrubError::InvalidConfig("[redact] must be a table".to_string()));
        }

        if let Some(mode) = table.get("mode") {
            let name = mode.as_str()
                .ok_or_else(|| ScrubError::InvalidConfig("redact.mode must be a string".to_string()))?;
            config.mode = RedactMode::from_name(name)?;
        }

        if let Some(include_macro) = table.get("include_macro") {
            config.include_macro = include_macro.as_bool()
                .ok_or_else(|| ScrubError::InvalidConfig("redact.include_macro must be a boolean".to_string()))?;
        }

        Ok(config)
    }

    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> ScrubResult<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => return Err(ScrubError::IoError(e)),
        };

        Self::from_toml_str(&contents)
    }
}
