//! Concrete program calculators, grouped by jurisdiction.

pub mod co;
pub mod federal;
pub mod il;
pub mod ma;
pub mod nc;

use rust_decimal::Decimal;

use crate::policyengine::PeInput;

/// Income variables PolicyEngine sums into IRS gross income.
pub(crate) const IRS_GROSS_INCOME: &[PeInput] = &[
    PeInput::EmploymentIncome,
    PeInput::SelfEmploymentIncome,
    PeInput::RentalIncome,
    PeInput::TaxablePensionIncome,
    PeInput::SocialSecurity,
    PeInput::CapitalGains,
    PeInput::MiscellaneousIncome,
    PeInput::UnemploymentCompensation,
    PeInput::AlimonyIncome,
    PeInput::TaxableIraDistributions,
];

pub(crate) const TAX_UNIT_ROLES: &[PeInput] = &[
    PeInput::IsTaxUnitHead,
    PeInput::IsTaxUnitSpouse,
    PeInput::IsTaxUnitDependent,
];

/// A monthly amount over a year.
pub(crate) fn monthly(amount: i64) -> Decimal {
    Decimal::from(amount * 12)
}

/// Monthly amount for a category name; unlisted categories are worth zero.
pub(crate) fn category_amount(categories: &[(&str, i64)], category: &str) -> i64 {
    categories
        .iter()
        .find(|(name, _)| *name == category)
        .map_or(0, |(_, amount)| *amount)
}
