//! Configuration types for the eligibility engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use std::collections::BTreeMap;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{EngineError, EngineResult};

/// Engine-wide settings from `engine.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Microsimulation service settings.
    pub policy_engine: PolicyEngineSettings,
    /// HUD income limits API settings.
    pub hud: HudSettings,
    /// County income limit spreadsheet settings.
    pub county_limits: CountyLimitSettings,
}

/// PolicyEngine endpoints and credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyEngineSettings {
    /// Public calculate endpoint.
    pub public_url: String,
    /// Private calculate endpoint, tried first when credentials exist.
    #[serde(default)]
    pub private_url: Option<String>,
    /// OAuth token endpoint for the private API.
    #[serde(default)]
    pub auth_url: Option<String>,
    /// OAuth audience for the private API.
    #[serde(default)]
    pub audience: Option<String>,
    /// Environment variable holding the client id.
    pub client_id_env: String,
    /// Environment variable holding the client secret.
    pub client_secret_env: String,
    /// Period key every variable is written under, e.g. `2025`.
    pub period: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Lifetime of a cached access token in days.
    pub token_ttl_days: u64,
}

impl PolicyEngineSettings {
    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Access token lifetime.
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_days * 24 * 60 * 60)
    }
}

/// HUD income limits API.
#[derive(Debug, Clone, Deserialize)]
pub struct HudSettings {
    /// Base URL, without a trailing slash.
    pub base_url: String,
    /// Environment variable holding the API token.
    pub token_env: String,
    /// How long fetched tables stay fresh, in seconds.
    pub cache_ttl_secs: u64,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// Published county income limit spreadsheet.
#[derive(Debug, Clone, Deserialize)]
pub struct CountyLimitSettings {
    /// URL of the CSV export.
    pub csv_url: String,
    /// Two-letter state the table covers.
    pub state: String,
    /// How long the table stays fresh, in seconds.
    pub cache_ttl_secs: u64,
}

/// Federal poverty guidelines for one year.
///
/// `limits[0]` is the guideline for a household of one.
///
/// # Example
///
/// ```
/// use benefits_engine::config::FederalPovertyLevel;
/// use rust_decimal::Decimal;
///
/// let fpl = FederalPovertyLevel {
///     limits: vec![Decimal::from(15_650), Decimal::from(21_150)],
///     additional_person: Decimal::from(5_500),
/// };
/// assert_eq!(fpl.get_limit(2), Decimal::from(21_150));
/// assert_eq!(fpl.get_limit(4), Decimal::from(32_150));
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FederalPovertyLevel {
    /// Guidelines for sizes 1, 2, 3, ...
    pub limits: Vec<Decimal>,
    /// Increment for each person beyond the table.
    pub additional_person: Decimal,
}

impl FederalPovertyLevel {
    /// Guideline for a household of `size`. Sizes below one read as one.
    pub fn get_limit(&self, size: usize) -> Decimal {
        let size = size.max(1);
        let published = self.limits.len();
        if size <= published {
            return self.limits[size - 1];
        }
        let last = self.limits.last().copied().unwrap_or(Decimal::ZERO);
        last + self.additional_person * Decimal::from(size - published)
    }

    /// Rejects empty, non-positive or decreasing tables.
    pub fn validate(&self, table: &str) -> EngineResult<()> {
        let invalid = |message: &str| EngineError::InvalidTable {
            table: table.to_string(),
            message: message.to_string(),
        };

        if self.limits.is_empty() {
            return Err(invalid("no household sizes"));
        }
        if self.limits.iter().any(|l| *l <= Decimal::ZERO) {
            return Err(invalid("limits must be positive"));
        }
        if self.limits.windows(2).any(|w| w[1] < w[0]) {
            return Err(invalid("limits must not decrease with household size"));
        }
        if self.additional_person <= Decimal::ZERO {
            return Err(invalid("additional_person must be positive"));
        }
        Ok(())
    }
}

/// `fpl.yaml`: poverty guidelines keyed by year.
#[derive(Debug, Clone, Deserialize)]
pub struct FplConfig {
    /// Year to guideline table.
    pub years: BTreeMap<String, FederalPovertyLevel>,
}

/// One enabled program from `programs.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgramConfig {
    /// Registration code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// State scope; `None` for federal programs.
    #[serde(default)]
    pub state: Option<String>,
    /// Which poverty guideline year the program uses.
    pub fpl_year: String,
}

/// `programs.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgramsConfig {
    /// Enabled programs.
    pub programs: Vec<ProgramConfig>,
}
