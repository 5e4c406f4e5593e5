//! Configuration types for the attendance payroll engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the engine's YAML configuration file.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What happens to staged deductions when a day is rejected or marked absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectedDeductionPolicy {
    /// PF, ESI and advance deductions stay as stored; net pay may go negative.
    #[default]
    Retain,
    /// All deductions are zeroed together with earnings.
    Clear,
}

/// Payroll derivation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayrollPolicy {
    /// Share of the daily wage paid for a half day.
    pub half_day_factor: Decimal,
    /// Treatment of deductions on rejected or absent days.
    pub rejected_deductions: RejectedDeductionPolicy,
}

impl Default for PayrollPolicy {
    fn default() -> Self {
        Self {
            half_day_factor: Decimal::new(5, 1),
            rejected_deductions: RejectedDeductionPolicy::Retain,
        }
    }
}

/// Limits on reviewer staging sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewSettings {
    /// Seconds of inactivity after which a pending edit set is dropped.
    pub pending_edit_ttl_secs: u64,
    /// Upper bound on concurrently staged edit sets.
    pub max_pending_sets: usize,
    /// Seconds between sweeps that drop expired edit sets.
    pub purge_interval_secs: u64,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            pending_edit_ttl_secs: 1800,
            max_pending_sets: 10_000,
            purge_interval_secs: 60,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address the API listens on.
    pub bind_address: String,
    /// Upper bound on a single request, in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            request_timeout_ms: 5000,
        }
    }
}

/// The complete engine configuration.
///
/// Every section is optional in the YAML file and falls back to defaults.
///
/// # Example
///
/// ```
/// use attendance_payroll::config::{EngineConfig, RejectedDeductionPolicy};
/// use rust_decimal::Decimal;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.payroll.half_day_factor, Decimal::new(5, 1));
/// assert_eq!(config.payroll.rejected_deductions, RejectedDeductionPolicy::Retain);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Payroll derivation settings.
    pub payroll: PayrollPolicy,
    /// Reviewer staging settings.
    pub review: ReviewSettings,
    /// HTTP server settings.
    pub server: ServerSettings,
}
