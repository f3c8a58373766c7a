//! The PolicyEngine household document.
//!
//! The same shape is sent in the request and returned in the response:
//! every variable is a map from period to value, attached to a person or to a
//! grouping unit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EngineError, EngineResult};

/// Variable name to period to value.
pub type FieldMap = BTreeMap<String, BTreeMap<String, Value>>;

/// A grouping unit: its members plus its own variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupUnit {
    /// Ids of the members, as strings.
    #[serde(default)]
    pub members: Vec<String>,
    /// The unit's variables.
    #[serde(flatten)]
    pub fields: FieldMap,
}

impl GroupUnit {
    /// A unit with the given members and no variables.
    pub fn with_members(members: Vec<String>) -> Self {
        Self {
            members,
            fields: FieldMap::new(),
        }
    }
}

/// The household in PolicyEngine's format.
///
/// Every container is always present, even when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HouseholdDocument {
    /// Person id to variables.
    #[serde(default)]
    pub people: BTreeMap<String, FieldMap>,
    /// Tax units: `tax_unit` and, when populated, `secondary_tax_unit`.
    #[serde(default)]
    pub tax_units: BTreeMap<String, GroupUnit>,
    /// The single family.
    #[serde(default)]
    pub families: BTreeMap<String, GroupUnit>,
    /// The single household.
    #[serde(default)]
    pub households: BTreeMap<String, GroupUnit>,
    /// The single SPM unit.
    #[serde(default)]
    pub spm_units: BTreeMap<String, GroupUnit>,
    /// Married pairs and single members.
    #[serde(default)]
    pub marital_units: BTreeMap<String, GroupUnit>,
}

/// Request envelope.
#[derive(Debug, Serialize)]
pub struct CalculateRequest<'a> {
    /// The household.
    pub household: &'a HouseholdDocument,
}

/// Writes `value` for `field` at `period`.
///
/// Writing the same value twice is a no-op. Writing a different value is a
/// [`EngineError::DependencyConflict`].
pub(crate) fn write_field(
    fields: &mut FieldMap,
    unit: &str,
    entity: &str,
    field: &str,
    period: &str,
    value: Value,
) -> EngineResult<()> {
    let periods = fields.entry(field.to_string()).or_default();
    match periods.get(period) {
        Some(existing) if *existing != value => Err(EngineError::DependencyConflict {
            unit: unit.to_string(),
            entity: entity.to_string(),
            field: field.to_string(),
        }),
        Some(_) => Ok(()),
        None => {
            periods.insert(period.to_string(), value);
            Ok(())
        }
    }
}

/// Requests `field` at `period` without overwriting an input.
pub(crate) fn reserve_field(fields: &mut FieldMap, field: &str, period: &str) {
    fields
        .entry(field.to_string())
        .or_default()
        .entry(period.to_string())
        .or_insert(Value::Null);
}
