//! Configuration loading for the attendance payroll engine.
//!
//! This module loads the engine configuration from YAML: payroll policy
//! (half-day factor, treatment of deductions on rejected days), reviewer
//! staging limits and HTTP server settings.
//!
//! # Example
//!
//! ```no_run
//! use attendance_payroll::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/engine.yaml").unwrap();
//! println!("Listening on {}", config.config().server.bind_address);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{EngineConfig, PayrollPolicy, RejectedDeductionPolicy, ReviewSettings, ServerSettings};
