//! Program metadata handed to calculators.

use serde::Serialize;

use crate::config::FederalPovertyLevel;

/// What a calculator knows about the program it evaluates.
#[derive(Debug, Clone, Serialize)]
pub struct ProgramMetadata {
    /// Registration code, e.g. `il_all_kids`.
    pub code: String,
    /// Display name.
    pub name: String,
    /// State scope; `None` for federal programs.
    pub state: Option<String>,
    /// Poverty guideline year.
    pub fpl_year: String,
    /// Poverty guidelines for `fpl_year`.
    #[serde(skip)]
    pub fpl: FederalPovertyLevel,
}
