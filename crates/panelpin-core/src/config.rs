#![forbid(unsafe_code)]

//! Engine configuration.
//!
//! ```toml
//! # panelpin.toml
//! mobile_breakpoint_px = 768
//! collapse_sidebars_on_mobile = true
//! coalesce_frames = true
//! ```
//!
//! ```rust,ignore
//! let config = EngineConfig::from_toml_file("panelpin.toml")?;
//! ```
//!
//! Loading from files requires the `config` feature. Every field has a
//! default, and `EngineConfig::default()` keeps sidebar activation purely
//! scroll-driven.

#[cfg(feature = "config")]
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::responsive::DEFAULT_MOBILE_BREAKPOINT;

/// Tunables for a [`PanelController`](crate::PanelController) and the
/// frame driver built on top of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Viewport widths strictly below this are mobile.
    pub mobile_breakpoint_px: f64,
    /// Force both sidebars off while the viewport is mobile.
    pub collapse_sidebars_on_mobile: bool,
    /// Collapse queued scroll/resize events into one evaluation per frame.
    pub coalesce_frames: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint_px: DEFAULT_MOBILE_BREAKPOINT,
            collapse_sidebars_on_mobile: false,
            coalesce_frames: true,
        }
    }
}

impl EngineConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Check every parameter. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.mobile_breakpoint_px.is_finite() || self.mobile_breakpoint_px <= 0.0 {
            errors.push(format!(
                "mobile_breakpoint_px must be finite and > 0, got {}",
                self.mobile_breakpoint_px
            ));
        }
        errors
    }

    /// `self` if valid, otherwise [`ConfigError::Validation`].
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Errors from loading or validating an [`EngineConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "config")]
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[cfg(feature = "config")]
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
