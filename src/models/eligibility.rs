//! Eligibility outcome models.
//!
//! [`Eligibility`] accumulates conditions for one household or one member.
//! Calculators record every condition they check; nothing short-circuits, so
//! all failure reasons surface together. [`ProgramEligibility`] is the folded
//! result for one program in one evaluation pass.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::member::MemberId;
use super::message::Message;
use crate::dependencies::DependencyReport;

/// One recorded check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Whether the check passed.
    pub passed: bool,
    /// Why the check matters, shown when it failed.
    pub message: Option<Message>,
}

/// Accumulator of conditions.
///
/// # Example
///
/// ```
/// use benefits_engine::models::{Eligibility, Message};
///
/// let mut e = Eligibility::new();
/// e.condition(false, Message::Location);
/// e.condition(true, None);
/// e.condition(false, Message::IsPregnant);
///
/// assert!(!e.passed());
/// assert_eq!(e.len(), 3);
/// assert_eq!(e.failed_messages().count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Eligibility {
    conditions: Vec<Condition>,
}

impl Eligibility {
    /// Creates an empty accumulator. An empty accumulator passes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a condition.
    pub fn condition(&mut self, passed: bool, message: impl Into<Option<Message>>) {
        self.conditions.push(Condition {
            passed,
            message: message.into(),
        });
    }

    /// True if every recorded condition passed.
    pub fn passed(&self) -> bool {
        self.conditions.iter().all(|c| c.passed)
    }

    /// Number of recorded conditions.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// All recorded conditions, in order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Messages of failed conditions.
    pub fn failed_messages(&self) -> impl Iterator<Item = &Message> {
        self.conditions
            .iter()
            .filter(|c| !c.passed)
            .filter_map(|c| c.message.as_ref())
    }

    /// Messages of passed conditions.
    pub fn passed_messages(&self) -> impl Iterator<Item = &Message> {
        self.conditions
            .iter()
            .filter(|c| c.passed)
            .filter_map(|c| c.message.as_ref())
    }
}

/// Outcome for one member of a member-scoped program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberEligibility {
    /// The member.
    pub member_id: MemberId,
    /// Conditions checked for this member.
    pub conditions: Eligibility,
    /// Annual value for this member, zero unless the program is eligible.
    pub value: Decimal,
}

impl MemberEligibility {
    /// True if every member condition passed.
    pub fn eligible(&self) -> bool {
        self.conditions.passed()
    }
}

/// The folded result for one program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramEligibility {
    /// Program code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Final eligibility.
    pub eligible: bool,
    /// Estimated annual value. Zero when ineligible.
    pub value: Decimal,
    /// Household-level conditions.
    pub conditions: Eligibility,
    /// Per-member outcomes. Empty for household-only programs.
    pub members: Vec<MemberEligibility>,
}

impl ProgramEligibility {
    /// Failure messages from the household and every member.
    pub fn failed_messages(&self) -> Vec<&Message> {
        self.conditions
            .failed_messages()
            .chain(self.members.iter().flat_map(|m| m.conditions.failed_messages()))
            .collect()
    }

    /// Ids of members that passed.
    pub fn eligible_members(&self) -> Vec<MemberId> {
        self.members
            .iter()
            .filter(|m| m.eligible())
            .map(|m| m.member_id)
            .collect()
    }
}

/// The complete output of one evaluation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityReport {
    /// Unique identifier of this evaluation.
    pub evaluation_id: Uuid,
    /// Household the report is for.
    pub household_id: Uuid,
    /// When the evaluation ran.
    pub evaluated_at: DateTime<Utc>,
    /// Engine version string.
    pub engine_version: String,
    /// Results in run order.
    pub programs: Vec<ProgramEligibility>,
    /// Data fields the evaluated programs read.
    pub dependencies: DependencyReport,
    /// Wall time of the pass in microseconds.
    pub duration_us: u64,
}

impl EligibilityReport {
    /// Looks up one program's result.
    pub fn program(&self, code: &str) -> Option<&ProgramEligibility> {
        self.programs.iter().find(|p| p.code == code)
    }

    /// Total annual value of every eligible program.
    pub fn total_value(&self) -> Decimal {
        self.programs
            .iter()
            .filter(|p| p.eligible)
            .map(|p| p.value)
            .sum()
    }
}
