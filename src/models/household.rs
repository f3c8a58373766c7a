//! Household snapshot model.
//!
//! A [`Household`] is built once per evaluation and is read-only to every
//! calculator. Missing data reads as zero or false; nothing here fails.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::income::{Expense, ExpenseType, IncomeFilter, Timeframe};
use super::member::{HouseholdMember, MemberId, Relationship};

/// Everything the engine knows about one household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    /// Identifier used in logs and reports.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Two-letter state code, e.g. `IL`.
    pub state: String,
    /// Reported household size. Falls back to the member count when absent.
    #[serde(default)]
    pub household_size: Option<usize>,
    /// Liquid assets in dollars.
    #[serde(default)]
    pub household_assets: Decimal,
    /// County, or city for states that screen by city.
    #[serde(default)]
    pub county: Option<String>,
    /// Five-digit ZIP code.
    #[serde(default)]
    pub zipcode: Option<String>,
    /// Every person in the household.
    #[serde(default)]
    pub members: Vec<HouseholdMember>,
    /// Household-level recurring expenses.
    #[serde(default)]
    pub expenses: Vec<Expense>,
    /// Codes of programs the household already receives.
    #[serde(default)]
    pub current_benefits: BTreeSet<String>,
}

impl Household {
    /// Creates an empty household in `state`.
    ///
    /// # Example
    ///
    /// ```
    /// use benefits_engine::models::Household;
    ///
    /// let household = Household::new("IL");
    /// assert_eq!(household.size(), 0);
    /// assert!(household.head().is_none());
    /// ```
    pub fn new(state: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: state.to_string(),
            household_size: None,
            household_assets: Decimal::ZERO,
            county: None,
            zipcode: None,
            members: Vec::new(),
            expenses: Vec::new(),
            current_benefits: BTreeSet::new(),
        }
    }

    /// Reported size, or the number of members if none was reported.
    pub fn size(&self) -> usize {
        self.household_size.unwrap_or(self.members.len())
    }

    /// Looks up a member by id.
    pub fn member(&self, id: MemberId) -> Option<&HouseholdMember> {
        self.members.iter().find(|m| m.id == id)
    }

    /// The head of household.
    pub fn head(&self) -> Option<&HouseholdMember> {
        self.members.iter().find(|m| m.is_head())
    }

    /// The head's spouse or domestic partner.
    pub fn spouse(&self) -> Option<&HouseholdMember> {
        self.members.iter().find(|m| m.is_spouse())
    }

    /// Returns true if the head files jointly with a spouse.
    pub fn is_joint(&self) -> bool {
        self.head().is_some() && self.spouse().is_some()
    }

    /// Number of pregnant members.
    pub fn pregnant_count(&self) -> usize {
        self.members.iter().filter(|m| m.pregnant).count()
    }

    /// Gross income across all members.
    pub fn calc_gross_income(&self, timeframe: Timeframe, filters: &[IncomeFilter]) -> Decimal {
        self.members
            .iter()
            .map(|m| m.calc_gross_income(timeframe, filters, &[]))
            .sum()
    }

    /// Sum of expenses of the given types.
    pub fn calc_expenses(&self, timeframe: Timeframe, types: &[ExpenseType]) -> Decimal {
        let yearly: Decimal = self
            .expenses
            .iter()
            .filter(|e| types.contains(&e.expense_type))
            .map(Expense::yearly)
            .sum();
        timeframe.from_yearly(yearly)
    }

    /// Returns true if any expense of the given types was reported.
    pub fn has_expense(&self, types: &[ExpenseType]) -> bool {
        self.expenses.iter().any(|e| types.contains(&e.expense_type))
    }

    /// Returns true if the household already receives `code`.
    pub fn has_benefit(&self, code: &str) -> bool {
        self.current_benefits.contains(code)
    }

    /// Counts children with a known age in `min_age..=max_age` and one of
    /// `relationships`.
    pub fn num_children(&self, min_age: u32, max_age: u32, relationships: &[Relationship]) -> usize {
        self.members
            .iter()
            .filter(|m| relationships.contains(&m.relationship))
            .filter(|m| m.age.is_some_and(|a| a >= min_age && a <= max_age))
            .count()
    }

    /// Counts members with a known age of at least `min_age`.
    pub fn num_adults(&self, min_age: u32) -> usize {
        self.members.iter().filter(|m| m.is_at_least(min_age)).count()
    }
}
