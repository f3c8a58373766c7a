//! Reading computed values back out of a PolicyEngine response.
//!
//! Lookups never fail: a missing unit, member, variable or period reads as
//! zero, false or `None`.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::document::{FieldMap, HouseholdDocument};
use super::variables::{PeOutput, PeUnit};
use crate::error::PolicyEngineError;
use crate::models::MemberId;

#[derive(Debug, Deserialize)]
struct CalculateResponse {
    #[serde(default)]
    result: Option<HouseholdDocument>,
}

/// A decoded simulation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationOutput {
    document: HouseholdDocument,
    period: String,
}

fn lookup<'a>(fields: &'a FieldMap, field: &str, period: &str) -> Option<&'a Value> {
    fields.get(field)?.get(period).filter(|v| !v.is_null())
}

/// Reads a JSON number, boolean or numeric string as a dollar amount.
pub fn as_decimal(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok()))
            .map(|d| d.round_dp(2))
            .unwrap_or(Decimal::ZERO),
        Value::Bool(b) => Decimal::from(u8::from(*b)),
        Value::String(s) => s.parse().unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

fn as_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(_) => !as_decimal(value).is_zero(),
        _ => false,
    }
}

impl SimulationOutput {
    /// Wraps an already-decoded document.
    pub fn new(document: HouseholdDocument, period: impl Into<String>) -> Self {
        Self {
            document,
            period: period.into(),
        }
    }

    /// Decodes a `{"result": ...}` response body.
    pub fn from_body(body: &[u8], period: &str) -> Result<Self, PolicyEngineError> {
        let response: CalculateResponse =
            serde_json::from_slice(body).map_err(|e| PolicyEngineError::Decode {
                message: e.to_string(),
            })?;
        let document = response.result.ok_or_else(|| PolicyEngineError::Decode {
            message: "response has no 'result'".to_string(),
        })?;
        Ok(Self::new(document, period))
    }

    /// The returned document.
    pub fn document(&self) -> &HouseholdDocument {
        &self.document
    }

    /// Raw value of a person-level output.
    pub fn member_value(&self, output: PeOutput, id: MemberId) -> Option<&Value> {
        let fields = self.document.people.get(&id.to_string())?;
        lookup(fields, output.field(), &self.period)
    }

    /// A person-level amount.
    pub fn member_number(&self, output: PeOutput, id: MemberId) -> Decimal {
        self.member_value(output, id).map(as_decimal).unwrap_or(Decimal::ZERO)
    }

    /// A person-level flag.
    pub fn member_bool(&self, output: PeOutput, id: MemberId) -> bool {
        self.member_value(output, id).is_some_and(as_bool)
    }

    /// A person-level code such as a category.
    pub fn member_text(&self, output: PeOutput, id: MemberId) -> Option<&str> {
        self.member_value(output, id).and_then(Value::as_str)
    }

    /// A unit-level amount, summed across every unit of the output's kind.
    pub fn unit_number(&self, output: PeOutput) -> Decimal {
        let groups = match output.unit() {
            PeUnit::TaxUnit => &self.document.tax_units,
            PeUnit::SpmUnit => &self.document.spm_units,
            PeUnit::Household => &self.document.households,
            PeUnit::Person => {
                return self
                    .document
                    .people
                    .values()
                    .filter_map(|fields| lookup(fields, output.field(), &self.period))
                    .map(as_decimal)
                    .sum();
            }
        };
        groups
            .values()
            .filter_map(|group| lookup(&group.fields, output.field(), &self.period))
            .map(as_decimal)
            .sum()
    }
}
