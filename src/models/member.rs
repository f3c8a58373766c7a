//! Household member model.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::income::{IncomeFilter, IncomeStream, IncomeType, Timeframe};

/// Stable identifier of a household member.
///
/// Used as the key of the member's entry in every PolicyEngine unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub u32);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A member's relationship to the head of household.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Relationship {
    /// The person filling out the screener.
    HeadOfHousehold,
    /// Married spouse of the head.
    Spouse,
    /// Unmarried partner of the head.
    DomesticPartner,
    /// Biological or adopted child.
    Child,
    /// Foster child.
    FosterChild,
    /// Stepchild.
    StepChild,
    /// Grandchild.
    GrandChild,
    /// Sibling.
    SisterOrBrother,
    /// Step-sibling.
    StepSisterOrBrother,
    /// Parent.
    Parent,
    /// Foster parent.
    FosterParent,
    /// Grandparent.
    GrandParent,
    /// Any other relative.
    RelatedOther,
    /// Unrelated roommate.
    Roommate,
    /// Anything else.
    Other,
}

impl Relationship {
    /// Children of the head for tax and caretaker purposes.
    pub const CHILD_LIKE: [Relationship; 4] = [
        Relationship::Child,
        Relationship::FosterChild,
        Relationship::StepChild,
        Relationship::GrandChild,
    ];

    /// Returns true for a spouse or domestic partner of the head.
    pub fn is_partner(self) -> bool {
        matches!(self, Relationship::Spouse | Relationship::DomesticPartner)
    }

    /// Returns true for child, foster child, stepchild or grandchild.
    pub fn is_child_like(self) -> bool {
        Self::CHILD_LIKE.contains(&self)
    }

    /// Relatives who can be claimed under the qualifying-relative test.
    pub fn is_qualifying_relative(self) -> bool {
        matches!(
            self,
            Relationship::Parent
                | Relationship::FosterParent
                | Relationship::GrandParent
                | Relationship::SisterOrBrother
                | Relationship::StepSisterOrBrother
                | Relationship::RelatedOther
        )
    }
}

/// A kind of health coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceType {
    /// No coverage.
    None,
    /// Unsure.
    DontKnow,
    /// Employer-sponsored plan.
    Employer,
    /// Individually purchased plan.
    Private,
    /// Children's health plan.
    Chp,
    /// Medicaid.
    Medicaid,
    /// Medicare.
    Medicare,
    /// Emergency Medicaid.
    EmergencyMedicaid,
    /// Family planning limited benefit.
    FamilyPlanning,
    /// Veterans Affairs coverage.
    Va,
}

/// The set of coverage types a member reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Insurance(pub BTreeSet<InsuranceType>);

impl Insurance {
    /// Builds a coverage set from a list of types.
    pub fn of(types: &[InsuranceType]) -> Self {
        Self(types.iter().copied().collect())
    }

    /// Returns true if the member reports `insurance_type`.
    pub fn has(&self, insurance_type: InsuranceType) -> bool {
        self.0.contains(&insurance_type)
    }

    /// Returns true if any reported type is in `types`.
    pub fn has_any(&self, types: &[InsuranceType]) -> bool {
        types.iter().any(|t| self.0.contains(t))
    }
}

/// Year and month of birth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthYearMonth {
    /// Calendar year.
    pub year: i32,
    /// Month, 1-12.
    pub month: u32,
}

/// One person in the household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdMember {
    /// Stable identifier.
    pub id: MemberId,
    /// Relationship to the head of household.
    pub relationship: Relationship,
    /// Age in whole years, if known.
    #[serde(default)]
    pub age: Option<u32>,
    /// Birth year and month, if known. Gives month-level age for infants.
    #[serde(default)]
    pub birth_year_month: Option<BirthYearMonth>,
    /// Currently pregnant.
    #[serde(default)]
    pub pregnant: bool,
    /// Has a disability.
    #[serde(default)]
    pub disabled: bool,
    /// Blind or visually impaired.
    #[serde(default)]
    pub visually_impaired: bool,
    /// Has a long-term disability.
    #[serde(default)]
    pub long_term_disability: bool,
    /// Enrolled as a student.
    #[serde(default)]
    pub student: bool,
    /// Current health coverage.
    #[serde(default)]
    pub insurance: Insurance,
    /// The member's own income.
    #[serde(default)]
    pub income_streams: Vec<IncomeStream>,
}

impl HouseholdMember {
    /// Creates a member with only an id, relationship and age set.
    ///
    /// # Example
    ///
    /// ```
    /// use benefits_engine::models::{HouseholdMember, MemberId, Relationship};
    ///
    /// let head = HouseholdMember::new(MemberId(1), Relationship::HeadOfHousehold, Some(34));
    /// assert!(head.is_head());
    /// assert!(!head.has_disability());
    /// ```
    pub fn new(id: MemberId, relationship: Relationship, age: Option<u32>) -> Self {
        Self {
            id,
            relationship,
            age,
            birth_year_month: None,
            pregnant: false,
            disabled: false,
            visually_impaired: false,
            long_term_disability: false,
            student: false,
            insurance: Insurance::default(),
            income_streams: Vec::new(),
        }
    }

    /// Returns true for the head of household.
    pub fn is_head(&self) -> bool {
        self.relationship == Relationship::HeadOfHousehold
    }

    /// Returns true for the head's spouse or domestic partner.
    pub fn is_spouse(&self) -> bool {
        self.relationship.is_partner()
    }

    /// Any disability flag, including blindness.
    pub fn has_disability(&self) -> bool {
        self.disabled || self.visually_impaired || self.long_term_disability
    }

    /// Returns true if the member's age is known and at least `age`.
    pub fn is_at_least(&self, age: u32) -> bool {
        self.age.is_some_and(|a| a >= age)
    }

    /// Age in months on `as_of`.
    ///
    /// Prefers the birth year-month; falls back to whole years.
    pub fn age_in_months(&self, as_of: NaiveDate) -> Option<u32> {
        if let Some(birth) = self.birth_year_month {
            let months = (as_of.year() - birth.year) * 12 + as_of.month() as i32 - birth.month as i32;
            return u32::try_from(months).ok();
        }
        self.age.map(|a| a * 12)
    }

    /// Gross income from this member's own streams.
    ///
    /// `exclude` removes types that a filter would otherwise include.
    pub fn calc_gross_income(
        &self,
        timeframe: Timeframe,
        filters: &[IncomeFilter],
        exclude: &[IncomeType],
    ) -> Decimal {
        let yearly: Decimal = self
            .income_streams
            .iter()
            .filter(|s| !exclude.contains(&s.income_type))
            .filter(|s| filters.iter().any(|f| f.matches(s.income_type)))
            .map(IncomeStream::yearly)
            .sum();
        timeframe.from_yearly(yearly)
    }

    /// Yearly income of the given types.
    pub fn yearly_income_of(&self, types: &[IncomeType]) -> Decimal {
        self.income_streams
            .iter()
            .filter(|s| types.contains(&s.income_type))
            .map(IncomeStream::yearly)
            .sum()
    }
}
