//! Reusable rule strategies.
//!
//! Calculators hold these as fields and call them from their eligibility
//! methods.

use rust_decimal::Decimal;

use crate::config::FederalPovertyLevel;
use crate::models::{Eligibility, Household, HouseholdMember, IncomeFilter, Message, Timeframe};

/// Gross income against a percentage of the poverty guideline.
///
/// Household size counts each pregnant member twice. The limit and the income
/// are both truncated to whole dollars, and income equal to the limit passes.
///
/// # Example
///
/// ```
/// use benefits_engine::calculation::FplIncomeCheck;
/// use benefits_engine::config::FederalPovertyLevel;
/// use benefits_engine::models::Eligibility;
/// use rust_decimal::Decimal;
///
/// let fpl = FederalPovertyLevel {
///     limits: vec![Decimal::from(15_650), Decimal::from(21_150)],
///     additional_person: Decimal::from(5_500),
/// };
/// let check = FplIncomeCheck::new(Decimal::new(138, 2));
///
/// let mut e = Eligibility::new();
/// // floor(21150 * 1.38) = 29187
/// assert!(check.check_income(&fpl, 2, Decimal::from(29_187), &mut e));
/// assert!(!check.check_income(&fpl, 2, Decimal::from(29_188), &mut e));
/// assert_eq!(e.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FplIncomeCheck {
    /// Upper bound as a fraction of the guideline, e.g. `1.38`.
    pub max_percent: Decimal,
    /// Optional lower bound as a fraction of the guideline.
    pub min_percent: Option<Decimal>,
    /// Which income streams count.
    pub filters: Vec<IncomeFilter>,
}

impl FplIncomeCheck {
    /// A ceiling-only check over all income.
    pub fn new(max_percent: Decimal) -> Self {
        Self {
            max_percent,
            min_percent: None,
            filters: vec![IncomeFilter::All],
        }
    }

    /// Adds a floor.
    pub fn with_minimum(mut self, min_percent: Decimal) -> Self {
        self.min_percent = Some(min_percent);
        self
    }

    /// Household size with each pregnant member counted twice.
    pub fn adjusted_size(household: &Household) -> usize {
        household.size() + household.pregnant_count()
    }

    /// `percent` of the guideline for `size`, truncated to whole dollars.
    pub fn limit(fpl: &FederalPovertyLevel, size: usize, percent: Decimal) -> Decimal {
        (fpl.get_limit(size) * percent).trunc()
    }

    /// Checks the household's gross yearly income.
    pub fn check(&self, household: &Household, fpl: &FederalPovertyLevel, e: &mut Eligibility) -> bool {
        let income = household.calc_gross_income(Timeframe::Yearly, &self.filters);
        self.check_income(fpl, Self::adjusted_size(household), income, e)
    }

    /// Checks an already-computed yearly income for a household of `size`.
    pub fn check_income(
        &self,
        fpl: &FederalPovertyLevel,
        size: usize,
        income: Decimal,
        e: &mut Eligibility,
    ) -> bool {
        let income = income.trunc();
        let max_income = Self::limit(fpl, size, self.max_percent);

        let (passed, message) = match self.min_percent {
            Some(min_percent) => {
                let min_income = Self::limit(fpl, size, min_percent);
                (
                    income >= min_income && income <= max_income,
                    Message::IncomeRange {
                        income,
                        min_income,
                        max_income,
                    },
                )
            }
            None => (income <= max_income, Message::Income { income, max_income }),
        };

        e.condition(passed, message);
        passed
    }
}

/// Old enough, or disabled and at least a lower age.
///
/// Unknown age fails, except for a disabled member when the rule sets no
/// lower age for disability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeDisabilityRule {
    /// Age that qualifies on its own.
    pub senior_age: u32,
    /// Minimum age for a member with a disability.
    pub disability_min_age: u32,
}

impl AgeDisabilityRule {
    /// Creates the rule.
    pub const fn new(senior_age: u32, disability_min_age: u32) -> Self {
        Self {
            senior_age,
            disability_min_age,
        }
    }

    /// True if `member` qualifies.
    pub fn passes(&self, member: &HouseholdMember) -> bool {
        match member.age {
            Some(age) => {
                age >= self.senior_age || (age >= self.disability_min_age && member.has_disability())
            }
            None => self.disability_min_age == 0 && member.has_disability(),
        }
    }

    /// True if any member qualifies.
    pub fn any(&self, household: &Household) -> bool {
        household.members.iter().any(|m| self.passes(m))
    }
}
