//! Error types for the Benefits Eligibility Engine.
//!
//! Three families of errors exist:
//!
//! - [`EngineError`]: configuration and deployment defects. These are fatal
//!   and surface at load time.
//! - [`PolicyEngineError`]: failures talking to the microsimulation service.
//! - [`IncomeLimitError`]: failures looking up published income limits.
//!
//! The last two never abort an evaluation pass. Calculators convert them into
//! failed conditions carrying a structured message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for the Benefits Eligibility Engine.
///
/// # Example
///
/// ```
/// use benefits_engine::error::EngineError;
///
/// let error = EngineError::UnknownProgram {
///     code: "tx_lifeline".to_string(),
/// };
/// assert_eq!(error.to_string(), "Unknown program code: tx_lifeline");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A configured program code has no registered calculator.
    #[error("Unknown program code: {code}")]
    UnknownProgram {
        /// The unregistered code.
        code: String,
    },

    /// The same program code was configured twice.
    #[error("Program '{code}' is configured more than once")]
    DuplicateProgram {
        /// The repeated code.
        code: String,
    },

    /// A static lookup table is malformed.
    #[error("Invalid table '{table}': {message}")]
    InvalidTable {
        /// The table name, e.g. `fpl.2025`.
        table: String,
        /// What is wrong with it.
        message: String,
    },

    /// Programs read each other's results in a cycle.
    #[error("Program dependency cycle: {}", cycle.join(" -> "))]
    DependencyCycle {
        /// The program codes forming the cycle, first code repeated at the end.
        cycle: Vec<String>,
    },

    /// Two PolicyEngine inputs wrote different values into the same slot.
    #[error("Conflicting values for PolicyEngine field '{field}' on {unit} '{entity}'")]
    DependencyConflict {
        /// The unit category, e.g. `people`.
        unit: String,
        /// The unit id.
        entity: String,
        /// The PolicyEngine variable name.
        field: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

/// Failures from the PolicyEngine microsimulation service.
#[derive(Debug, Error)]
pub enum PolicyEngineError {
    /// The request could not be sent or the connection failed.
    #[error("PolicyEngine request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("PolicyEngine returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("Failed to decode PolicyEngine response: {message}")]
    Decode {
        /// A description of the decode failure.
        message: String,
    },

    /// The private API has no usable credentials.
    #[error("PolicyEngine credentials are not configured")]
    MissingCredentials,

    /// Every configured engine failed.
    #[error("No PolicyEngine endpoint succeeded")]
    AllEnginesFailed,
}

/// Failures looking up published income limits.
///
/// The variants serialize so that they can be carried inside a
/// [`Message`](crate::models::Message) shown to the household.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IncomeLimitError {
    /// The county is not in the published table.
    #[error("County not found: {county}, {state}")]
    CountyNotFound {
        /// The county that was looked up.
        county: String,
        /// The state it was looked up in.
        state: String,
    },

    /// The published table covers fewer household sizes.
    #[error("Household size {size} is outside the published range {min}-{max}")]
    HouseholdSizeOutOfRange {
        /// The requested household size.
        size: usize,
        /// The smallest size in the table.
        min: usize,
        /// The largest size in the table.
        max: usize,
    },

    /// The table exists but the requested cell is blank or unknown.
    #[error("No income limit published for {detail}")]
    MissingValue {
        /// Which cell was missing.
        detail: String,
    },

    /// The source could not be reached or returned nothing usable.
    #[error("Income limit source unavailable: {message}")]
    Unavailable {
        /// A description of the failure.
        message: String,
    },
}

impl IncomeLimitError {
    pub(crate) fn unavailable(message: impl ToString) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/programs.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/programs.yaml"
        );
    }

    #[test]
    fn test_config_parse_error_displays_path_and_message() {
        let error = EngineError::ConfigParseError {
            path: "/config/bad.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse configuration file '/config/bad.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_dependency_cycle_names_every_program() {
        let error = EngineError::DependencyCycle {
            cycle: vec![
                "il_family_care".to_string(),
                "il_moms_and_babies".to_string(),
                "il_family_care".to_string(),
            ],
        };
        assert_eq!(
            error.to_string(),
            "Program dependency cycle: il_family_care -> il_moms_and_babies -> il_family_care"
        );
    }

    #[test]
    fn test_dependency_conflict_displays_slot() {
        let error = EngineError::DependencyConflict {
            unit: "people".to_string(),
            entity: "1".to_string(),
            field: "age".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Conflicting values for PolicyEngine field 'age' on people '1'"
        );
    }

    #[test]
    fn test_county_not_found_displays_county_and_state() {
        let error = IncomeLimitError::CountyNotFound {
            county: "Atlantis County".to_string(),
            state: "CO".to_string(),
        };
        assert_eq!(error.to_string(), "County not found: Atlantis County, CO");
    }

    #[test]
    fn test_income_limit_error_serializes_with_reason_tag() {
        let error = IncomeLimitError::HouseholdSizeOutOfRange {
            size: 9,
            min: 1,
            max: 8,
        };
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["reason"], "household_size_out_of_range");
        assert_eq!(json["size"], 9);
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
        assert_error::<PolicyEngineError>();
        assert_error::<IncomeLimitError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_unknown_program() -> EngineResult<()> {
            Err(EngineError::UnknownProgram {
                code: "nope".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_unknown_program()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
