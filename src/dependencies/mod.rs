//! Dependency registry.
//!
//! Every calculator declares the household fields it reads. The declarations
//! are descriptive only: they never gate evaluation, and absent data flows
//! through as zero or false. A client uses the unioned [`DependencyReport`] to
//! learn which additional answers could change a result.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A household or member field a calculator reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataField {
    /// Member age.
    Age,
    /// Member relationship to the head.
    Relationship,
    /// Member pregnancy flag.
    Pregnant,
    /// Member student flag.
    Student,
    /// Any member disability flag.
    Disabled,
    /// Member blindness flag.
    VisuallyImpaired,
    /// Member insurance types.
    Insurance,
    /// Household size.
    HouseholdSize,
    /// Household liquid assets.
    HouseholdAssets,
    /// Income stream type.
    IncomeType,
    /// Income stream amount.
    IncomeAmount,
    /// Income stream frequency.
    IncomeFrequency,
    /// Expense type.
    ExpenseType,
    /// Expense amount.
    ExpenseAmount,
    /// Household county.
    County,
    /// Household ZIP code.
    Zipcode,
    /// Benefits already received.
    CurrentBenefits,
}

/// Tracks which fields each evaluated program read.
///
/// # Example
///
/// ```
/// use benefits_engine::dependencies::{DataField, DependencyTracker};
///
/// let mut tracker = DependencyTracker::new();
/// tracker.record("snap", &[DataField::IncomeAmount, DataField::HouseholdSize]);
/// tracker.record("wic", &[DataField::Age, DataField::IncomeAmount]);
///
/// let report = tracker.into_report();
/// assert_eq!(report.all.len(), 3);
/// assert_eq!(report.programs["wic"].len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DependencyTracker {
    programs: BTreeMap<String, BTreeSet<DataField>>,
}

impl DependencyTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds fields read by `code`. Repeated calls union.
    pub fn record(&mut self, code: &str, fields: &[DataField]) {
        self.programs
            .entry(code.to_string())
            .or_default()
            .extend(fields.iter().copied());
    }

    /// Fields recorded for `code`.
    pub fn fields_for(&self, code: &str) -> Option<&BTreeSet<DataField>> {
        self.programs.get(code)
    }

    /// Freezes the tracker into a report.
    pub fn into_report(self) -> DependencyReport {
        let all = self.programs.values().flatten().copied().collect();
        DependencyReport {
            programs: self.programs,
            all,
        }
    }
}

/// Fields read during one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReport {
    /// Program code to the fields it read.
    pub programs: BTreeMap<String, BTreeSet<DataField>>,
    /// Union across all programs.
    pub all: BTreeSet<DataField>,
}

impl DependencyReport {
    /// Programs whose result could change if `field` were answered differently.
    pub fn programs_reading(&self, field: DataField) -> Vec<&str> {
        self.programs
            .iter()
            .filter(|(_, fields)| fields.contains(&field))
            .map(|(code, _)| code.as_str())
            .collect()
    }
}
