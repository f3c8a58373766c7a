//! Configuration loading and management for the eligibility engine.
//!
//! This module loads engine settings, federal poverty guidelines and the list
//! of enabled programs from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use benefits_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config").unwrap();
//! println!("PolicyEngine period: {}", config.settings().policy_engine.period);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    CountyLimitSettings, EngineSettings, FederalPovertyLevel, FplConfig, HudSettings,
    PolicyEngineSettings, ProgramConfig, ProgramsConfig,
};
