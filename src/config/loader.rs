//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! configuration from YAML files.

use std::fs;
use std::path::Path;

use crate::calculation::registered_codes;
use crate::error::{EngineError, EngineResult};
use crate::models::ProgramMetadata;

use super::types::{EngineSettings, FederalPovertyLevel, FplConfig, ProgramConfig, ProgramsConfig};

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/
/// ├── engine.yaml    # External service endpoints, timeouts, cache TTLs
/// ├── fpl.yaml       # Federal poverty guidelines by year
/// └── programs.yaml  # Enabled programs
/// ```
///
/// # Example
///
/// ```no_run
/// use benefits_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config")?;
/// let program = loader.program_metadata("il_all_kids")?;
/// println!("{} uses {} guidelines", program.name, program.fpl_year);
/// # Ok::<(), benefits_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    settings: EngineSettings,
    fpl: FplConfig,
    programs: Vec<ProgramConfig>,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if any file is missing or malformed, if a poverty
    /// guideline table is invalid, if a program has no registered calculator,
    /// if a program is configured twice, or if a program names a guideline
    /// year that is not published.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let settings = Self::load_yaml::<EngineSettings>(&path.join("engine.yaml"))?;
        let fpl = Self::load_yaml::<FplConfig>(&path.join("fpl.yaml"))?;
        let programs = Self::load_yaml::<ProgramsConfig>(&path.join("programs.yaml"))?;

        Self::from_parts(settings, fpl, programs.programs)
    }

    /// Builds a loader from already-parsed parts, applying the same checks as
    /// [`ConfigLoader::load`].
    pub fn from_parts(
        settings: EngineSettings,
        fpl: FplConfig,
        programs: Vec<ProgramConfig>,
    ) -> EngineResult<Self> {
        for (year, table) in &fpl.years {
            table.validate(&format!("fpl.{year}"))?;
        }

        let registered = registered_codes();
        for (i, program) in programs.iter().enumerate() {
            if !registered.contains(&program.code.as_str()) {
                return Err(EngineError::UnknownProgram {
                    code: program.code.clone(),
                });
            }
            if programs[..i].iter().any(|p| p.code == program.code) {
                return Err(EngineError::DuplicateProgram {
                    code: program.code.clone(),
                });
            }
            if !fpl.years.contains_key(&program.fpl_year) {
                return Err(EngineError::InvalidTable {
                    table: format!("fpl.{}", program.fpl_year),
                    message: format!("not published, required by '{}'", program.code),
                });
            }
        }

        Ok(Self {
            settings,
            fpl,
            programs,
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Engine-wide settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Enabled programs, in configuration order.
    pub fn programs(&self) -> &[ProgramConfig] {
        &self.programs
    }

    /// Poverty guidelines for `year`.
    pub fn fpl(&self, year: &str) -> EngineResult<&FederalPovertyLevel> {
        self.fpl
            .years
            .get(year)
            .ok_or_else(|| EngineError::InvalidTable {
                table: format!("fpl.{year}"),
                message: "not published".to_string(),
            })
    }

    /// Metadata for one enabled program.
    pub fn program_metadata(&self, code: &str) -> EngineResult<ProgramMetadata> {
        let program = self
            .programs
            .iter()
            .find(|p| p.code == code)
            .ok_or_else(|| EngineError::UnknownProgram {
                code: code.to_string(),
            })?;

        Ok(ProgramMetadata {
            code: program.code.clone(),
            name: program.name.clone(),
            state: program.state.clone(),
            fpl_year: program.fpl_year.clone(),
            fpl: self.fpl(&program.fpl_year)?.clone(),
        })
    }
}
