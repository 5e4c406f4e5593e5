//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the engine
//! configuration from a YAML file.

use std::fs;
use std::path::Path;

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};

use super::types::EngineConfig;

/// Loads and validates the engine configuration.
///
/// # Example
///
/// ```no_run
/// use attendance_payroll::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/engine.yaml").unwrap();
/// println!("Half day factor: {}", loader.config().payroll.half_day_factor);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified YAML file.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - The file is missing (`ConfigNotFound`)
    /// - The file contains invalid YAML or invalid values (`ConfigParseError`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        Self::parse(&content, &path_str)
    }

    /// Parses configuration from YAML text.
    ///
    /// `origin` names the source in error messages.
    pub fn parse(content: &str, origin: &str) -> EngineResult<Self> {
        let config: EngineConfig =
            serde_yaml::from_str(content).map_err(|e| EngineError::ConfigParseError {
                path: origin.to_string(),
                message: e.to_string(),
            })?;

        Self::validate(&config).map_err(|message| EngineError::ConfigParseError {
            path: origin.to_string(),
            message,
        })?;

        Ok(Self { config })
    }

    fn validate(config: &EngineConfig) -> Result<(), String> {
        let factor = config.payroll.half_day_factor;
        if factor <= Decimal::ZERO || factor > Decimal::ONE {
            return Err(format!(
                "payroll.half_day_factor must be in (0, 1], got {}",
                factor
            ));
        }
        if config.review.pending_edit_ttl_secs == 0 {
            return Err("review.pending_edit_ttl_secs must be greater than 0".to_string());
        }
        if config.review.max_pending_sets == 0 {
            return Err("review.max_pending_sets must be greater than 0".to_string());
        }
        if config.review.purge_interval_secs == 0 {
            return Err("review.purge_interval_secs must be greater than 0".to_string());
        }
        if config.server.request_timeout_ms == 0 {
            return Err("server.request_timeout_ms must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Consumes the loader, returning the configuration.
    pub fn into_config(self) -> EngineConfig {
        self.config
    }
}
