//! Configuration loading and management for the HR engine.
//!
//! Tax rates, overtime rules and the annual leave entitlement are loaded from
//! YAML files. Every value has a built-in default, so the engine also runs
//! without a configuration directory.
//!
//! # Example
//!
//! ```no_run
//! use hr_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Overtime multiplier: {}", config.payroll().overtime.multiplier);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{EngineConfig, LeaveConfig, OvertimeRules, PayrollConfig, TaxRates};
