//! The PolicyEngine variable catalog.
//!
//! [`PeInput`] values are computed locally from the household and written into
//! the request. [`PeOutput`] values are requested as empty slots and read back
//! from the response. Each variable knows its PolicyEngine name and which
//! grouping unit it lives on.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;

use super::tax_unit::{TaxRole, TaxUnitStructure};
use crate::dependencies::DataField;
use crate::models::{
    ExpenseType, Household, HouseholdMember, IncomeFilter, IncomeType, Timeframe,
};

/// The grouping a variable is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PeUnit {
    /// One entry per member under `people`.
    Person,
    /// Each populated tax unit.
    TaxUnit,
    /// The single SPM unit.
    SpmUnit,
    /// The single household unit.
    Household,
}

/// A value written into the request.
#[derive(Debug, Clone, PartialEq)]
pub enum PeValue {
    /// A flag.
    Bool(bool),
    /// A dollar amount or count.
    Number(Decimal),
    /// A code such as a state or county.
    Text(String),
    /// Let PolicyEngine compute it. Serialized as `null`, unlike an asserted
    /// zero.
    Defer,
}

impl From<PeValue> for Value {
    fn from(value: PeValue) -> Self {
        match value {
            PeValue::Bool(b) => Value::Bool(b),
            PeValue::Number(n) if n.fract().is_zero() => n
                .to_i64()
                .map(Value::from)
                .unwrap_or_else(|| n.to_f64().map(Value::from).unwrap_or(Value::Null)),
            PeValue::Number(n) => n.to_f64().map(Value::from).unwrap_or(Value::Null),
            PeValue::Text(s) => Value::String(s),
            PeValue::Defer => Value::Null,
        }
    }
}

/// What an input computation can see.
#[derive(Debug, Clone, Copy)]
pub struct InputContext<'a> {
    /// The household being evaluated.
    pub household: &'a Household,
    /// Tax unit roles for every member.
    pub tax_units: &'a TaxUnitStructure,
}

/// Input variables. Variant names mirror [`PeInput::field`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PeInput {
    // Person
    Age,
    IsPregnant,
    CurrentPregnancies,
    IsFullTimeCollegeStudent,
    IsTaxUnitHead,
    IsTaxUnitSpouse,
    IsTaxUnitDependent,
    IsDisabled,
    IsBlind,
    Ssi,
    SsiReported,
    SocialSecurityDisability,
    SocialSecurity,
    SsiCountableResources,
    SsiEarnedIncome,
    SsiUnearnedIncome,
    EmploymentIncome,
    SelfEmploymentIncome,
    RentalIncome,
    TaxablePensionIncome,
    CapitalGains,
    MiscellaneousIncome,
    UnemploymentCompensation,
    WorkersCompensation,
    AlimonyIncome,
    ChildSupportReceived,
    TanfReported,
    TaxableIraDistributions,
    MedicalOutOfPocketExpenses,
    Rent,
    RealEstateTaxes,
    // Household
    StateCode,
    CountyStr,
    ZipCode,
    // SPM unit
    SnapEarnedIncome,
    SnapUnearnedIncome,
    SnapAssets,
    SpmUnitCashAssets,
    HousingCost,
    HasHeatingCoolingExpense,
    HeatingCoolingExpense,
    HasPhoneExpense,
    PhoneExpense,
    ChildcareExpenses,
    MortgagePayments,
}

const INCOME_FIELDS: &[DataField] = &[
    DataField::IncomeType,
    DataField::IncomeAmount,
    DataField::IncomeFrequency,
];
const EXPENSE_FIELDS: &[DataField] = &[DataField::ExpenseType, DataField::ExpenseAmount];

fn income(member: Option<&HouseholdMember>, types: &[IncomeType]) -> PeValue {
    PeValue::Number(member.map_or(Decimal::ZERO, |m| m.yearly_income_of(types)))
}

fn head_only(member: Option<&HouseholdMember>, amount: Decimal) -> PeValue {
    PeValue::Number(if member.is_some_and(HouseholdMember::is_head) {
        amount
    } else {
        Decimal::ZERO
    })
}

/// Formats a county the way PolicyEngine spells it, e.g. `COOK_COUNTY_IL`.
pub fn county_code(county: &str, state: &str) -> String {
    let mut code = county.trim().to_uppercase().replace('.', "").replace([' ', '-'], "_");
    if !code.ends_with("_COUNTY") {
        code.push_str("_COUNTY");
    }
    format!("{code}_{}", state.to_uppercase())
}

impl PeInput {
    /// PolicyEngine variable name.
    pub fn field(self) -> &'static str {
        match self {
            PeInput::Age => "age",
            PeInput::IsPregnant => "is_pregnant",
            PeInput::CurrentPregnancies => "current_pregnancies",
            PeInput::IsFullTimeCollegeStudent => "is_full_time_college_student",
            PeInput::IsTaxUnitHead => "is_tax_unit_head",
            PeInput::IsTaxUnitSpouse => "is_tax_unit_spouse",
            PeInput::IsTaxUnitDependent => "is_tax_unit_dependent",
            PeInput::IsDisabled => "is_disabled",
            PeInput::IsBlind => "is_blind",
            PeInput::Ssi => "ssi",
            PeInput::SsiReported => "ssi_reported",
            PeInput::SocialSecurityDisability => "social_security_disability",
            PeInput::SocialSecurity => "social_security",
            PeInput::SsiCountableResources => "ssi_countable_resources",
            PeInput::SsiEarnedIncome => "ssi_earned_income",
            PeInput::SsiUnearnedIncome => "ssi_unearned_income",
            PeInput::EmploymentIncome => "employment_income",
            PeInput::SelfEmploymentIncome => "self_employment_income",
            PeInput::RentalIncome => "rental_income",
            PeInput::TaxablePensionIncome => "taxable_pension_income",
            PeInput::CapitalGains => "capital_gains",
            PeInput::MiscellaneousIncome => "miscellaneous_income",
            PeInput::UnemploymentCompensation => "unemployment_compensation",
            PeInput::WorkersCompensation => "workers_compensation",
            PeInput::AlimonyIncome => "alimony_income",
            PeInput::ChildSupportReceived => "child_support_received",
            PeInput::TanfReported => "tanf_reported",
            PeInput::TaxableIraDistributions => "taxable_ira_distributions",
            PeInput::MedicalOutOfPocketExpenses => "medical_out_of_pocket_expenses",
            PeInput::Rent => "rent",
            PeInput::RealEstateTaxes => "real_estate_taxes",
            PeInput::StateCode => "state_code",
            PeInput::CountyStr => "county_str",
            PeInput::ZipCode => "zip_code",
            PeInput::SnapEarnedIncome => "snap_earned_income",
            PeInput::SnapUnearnedIncome => "snap_unearned_income",
            PeInput::SnapAssets => "snap_assets",
            PeInput::SpmUnitCashAssets => "spm_unit_cash_assets",
            PeInput::HousingCost => "housing_cost",
            PeInput::HasHeatingCoolingExpense => "has_heating_cooling_expense",
            PeInput::HeatingCoolingExpense => "heating_cooling_expense",
            PeInput::HasPhoneExpense => "has_phone_expense",
            PeInput::PhoneExpense => "phone_expense",
            PeInput::ChildcareExpenses => "childcare_expenses",
            PeInput::MortgagePayments => "mortgage_payments",
        }
    }

    /// Where the variable lives.
    pub fn unit(self) -> PeUnit {
        match self {
            PeInput::StateCode | PeInput::CountyStr | PeInput::ZipCode => PeUnit::Household,
            PeInput::SnapEarnedIncome
            | PeInput::SnapUnearnedIncome
            | PeInput::SnapAssets
            | PeInput::SpmUnitCashAssets
            | PeInput::HousingCost
            | PeInput::HasHeatingCoolingExpense
            | PeInput::HeatingCoolingExpense
            | PeInput::HasPhoneExpense
            | PeInput::PhoneExpense
            | PeInput::ChildcareExpenses
            | PeInput::MortgagePayments => PeUnit::SpmUnit,
            _ => PeUnit::Person,
        }
    }

    /// Household fields the computation reads.
    pub fn reads(self) -> &'static [DataField] {
        match self {
            PeInput::Age => &[DataField::Age],
            PeInput::IsPregnant | PeInput::CurrentPregnancies => &[DataField::Pregnant],
            PeInput::IsFullTimeCollegeStudent => &[DataField::Student],
            PeInput::IsTaxUnitHead | PeInput::IsTaxUnitSpouse | PeInput::IsTaxUnitDependent => &[
                DataField::Relationship,
                DataField::Age,
                DataField::Student,
                DataField::Disabled,
                DataField::IncomeAmount,
            ],
            PeInput::IsDisabled => &[DataField::Disabled, DataField::VisuallyImpaired],
            PeInput::IsBlind => &[DataField::VisuallyImpaired],
            PeInput::SsiCountableResources => &[DataField::HouseholdAssets, DataField::Relationship],
            PeInput::SnapAssets | PeInput::SpmUnitCashAssets => &[DataField::HouseholdAssets],
            PeInput::MedicalOutOfPocketExpenses => &[
                DataField::ExpenseType,
                DataField::ExpenseAmount,
                DataField::Age,
                DataField::Disabled,
            ],
            PeInput::Rent | PeInput::RealEstateTaxes => &[
                DataField::ExpenseType,
                DataField::ExpenseAmount,
                DataField::Relationship,
            ],
            PeInput::StateCode => &[],
            PeInput::CountyStr => &[DataField::County],
            PeInput::ZipCode => &[DataField::Zipcode],
            PeInput::HousingCost
            | PeInput::HasHeatingCoolingExpense
            | PeInput::HeatingCoolingExpense
            | PeInput::HasPhoneExpense
            | PeInput::PhoneExpense
            | PeInput::ChildcareExpenses
            | PeInput::MortgagePayments => EXPENSE_FIELDS,
            _ => INCOME_FIELDS,
        }
    }

    /// Computes the value. `member` is set for [`PeUnit::Person`] inputs and
    /// `None` for unit-level inputs.
    pub fn value(self, ctx: &InputContext<'_>, member: Option<&HouseholdMember>) -> PeValue {
        let household = ctx.household;
        let flag = |f: fn(&HouseholdMember) -> bool| PeValue::Bool(member.is_some_and(f));
        let role = |r: TaxRole| PeValue::Bool(member.is_some_and(|m| ctx.tax_units.has_role(m.id, r)));
        let expenses = |types: &[ExpenseType]| {
            PeValue::Number(household.calc_expenses(Timeframe::Yearly, types))
        };

        match self {
            PeInput::Age => match member.and_then(|m| m.age) {
                Some(age) => PeValue::Number(Decimal::from(age)),
                None => PeValue::Defer,
            },
            PeInput::IsPregnant => flag(|m| m.pregnant),
            PeInput::CurrentPregnancies => {
                PeValue::Number(Decimal::from(u8::from(member.is_some_and(|m| m.pregnant))))
            }
            PeInput::IsFullTimeCollegeStudent => flag(|m| m.student),
            PeInput::IsTaxUnitHead => role(TaxRole::Head),
            PeInput::IsTaxUnitSpouse => role(TaxRole::Spouse),
            PeInput::IsTaxUnitDependent => role(TaxRole::Dependent),
            PeInput::IsDisabled => flag(HouseholdMember::has_disability),
            PeInput::IsBlind => flag(|m| m.visually_impaired),
            PeInput::Ssi => match income(member, &[IncomeType::Ssi]) {
                PeValue::Number(n) if n.is_zero() => PeValue::Defer,
                reported => reported,
            },
            PeInput::SsiReported => income(member, &[IncomeType::Ssi]),
            PeInput::SocialSecurityDisability => income(member, &[IncomeType::SsDisability]),
            PeInput::SocialSecurity => income(
                member,
                &[
                    IncomeType::SsRetirement,
                    IncomeType::SsSurvivor,
                    IncomeType::SsDependent,
                ],
            ),
            PeInput::SsiCountableResources => head_only(member, household.household_assets),
            PeInput::SsiEarnedIncome => PeValue::Number(member.map_or(Decimal::ZERO, |m| {
                m.calc_gross_income(Timeframe::Yearly, &[IncomeFilter::Earned], &[])
            })),
            PeInput::SsiUnearnedIncome => PeValue::Number(member.map_or(Decimal::ZERO, |m| {
                m.calc_gross_income(Timeframe::Yearly, &[IncomeFilter::Unearned], &[])
            })),
            PeInput::EmploymentIncome => income(member, &[IncomeType::Wages]),
            PeInput::SelfEmploymentIncome => income(member, &[IncomeType::SelfEmployment]),
            PeInput::RentalIncome => income(member, &[IncomeType::Rental]),
            PeInput::TaxablePensionIncome => {
                income(member, &[IncomeType::Pension, IncomeType::Veteran])
            }
            PeInput::CapitalGains => income(member, &[IncomeType::Investment]),
            PeInput::MiscellaneousIncome => income(member, &[IncomeType::Gifts]),
            PeInput::UnemploymentCompensation => income(member, &[IncomeType::Unemployment]),
            PeInput::WorkersCompensation => income(member, &[IncomeType::WorkersComp]),
            PeInput::AlimonyIncome => income(member, &[IncomeType::Alimony]),
            PeInput::ChildSupportReceived => income(member, &[IncomeType::ChildSupport]),
            PeInput::TanfReported => income(member, &[IncomeType::CashAssistance]),
            PeInput::TaxableIraDistributions => income(member, &[IncomeType::DeferredComp]),
            PeInput::MedicalOutOfPocketExpenses => {
                let counts = |m: &HouseholdMember| m.is_at_least(60) || m.has_disability();
                let sharers = household.members.iter().filter(|&m| counts(m)).count();
                match member {
                    Some(m) if sharers > 0 && counts(m) => PeValue::Number(
                        household.calc_expenses(Timeframe::Yearly, &[ExpenseType::Medical])
                            / Decimal::from(sharers),
                    ),
                    _ => PeValue::Number(Decimal::ZERO),
                }
            }
            PeInput::Rent => head_only(
                member,
                household.calc_expenses(Timeframe::Yearly, &[ExpenseType::Rent]),
            ),
            PeInput::RealEstateTaxes => head_only(
                member,
                household.calc_expenses(Timeframe::Yearly, &[ExpenseType::PropertyTax]),
            ),
            PeInput::StateCode => PeValue::Text(household.state.to_uppercase()),
            PeInput::CountyStr => match &household.county {
                Some(county) => PeValue::Text(county_code(county, &household.state)),
                None => PeValue::Defer,
            },
            PeInput::ZipCode => match &household.zipcode {
                Some(zip) => PeValue::Text(zip.clone()),
                None => PeValue::Defer,
            },
            PeInput::SnapEarnedIncome => PeValue::Number(
                household.calc_gross_income(Timeframe::Yearly, &[IncomeFilter::Earned]),
            ),
            PeInput::SnapUnearnedIncome => PeValue::Number(
                household.calc_gross_income(Timeframe::Yearly, &[IncomeFilter::Unearned]),
            ),
            PeInput::SnapAssets | PeInput::SpmUnitCashAssets => {
                PeValue::Number(household.household_assets)
            }
            PeInput::HousingCost => expenses(&[ExpenseType::Rent, ExpenseType::Mortgage]),
            PeInput::HasHeatingCoolingExpense => PeValue::Bool(
                household.has_expense(&[ExpenseType::Heating, ExpenseType::Cooling]),
            ),
            PeInput::HeatingCoolingExpense => {
                expenses(&[ExpenseType::Heating, ExpenseType::Cooling])
            }
            PeInput::HasPhoneExpense => {
                PeValue::Bool(household.has_expense(&[ExpenseType::Telephone]))
            }
            PeInput::PhoneExpense => expenses(&[ExpenseType::Telephone]),
            PeInput::ChildcareExpenses => expenses(&[ExpenseType::ChildCare]),
            PeInput::MortgagePayments => expenses(&[ExpenseType::Mortgage]),
        }
    }
}

/// Output variables. Variant names mirror [`PeOutput::field`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PeOutput {
    Medicaid,
    MedicaidCategory,
    OptionalSeniorOrDisabledMedicaid,
    Wic,
    WicCategory,
    Snap,
    AcaPtc,
    IlHbwdEligible,
}

impl PeOutput {
    /// PolicyEngine variable name.
    pub fn field(self) -> &'static str {
        match self {
            PeOutput::Medicaid => "medicaid",
            PeOutput::MedicaidCategory => "medicaid_category",
            PeOutput::OptionalSeniorOrDisabledMedicaid => {
                "is_optional_senior_or_disabled_for_medicaid"
            }
            PeOutput::Wic => "wic",
            PeOutput::WicCategory => "wic_category",
            PeOutput::Snap => "snap",
            PeOutput::AcaPtc => "aca_ptc",
            PeOutput::IlHbwdEligible => "il_hbwd_eligible",
        }
    }

    /// Where the variable lives.
    pub fn unit(self) -> PeUnit {
        match self {
            PeOutput::Snap => PeUnit::SpmUnit,
            PeOutput::AcaPtc => PeUnit::TaxUnit,
            _ => PeUnit::Person,
        }
    }
}

/// The PolicyEngine variables one calculator needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyEngineSpec {
    /// Variables to compute locally and send.
    pub inputs: Vec<PeInput>,
    /// Variables to request back.
    pub outputs: Vec<PeOutput>,
}

impl PolicyEngineSpec {
    /// Creates a spec.
    pub fn new(inputs: &[PeInput], outputs: &[PeOutput]) -> Self {
        Self {
            inputs: inputs.to_vec(),
            outputs: outputs.to_vec(),
        }
    }

    /// Household fields read by any input.
    pub fn reads(&self) -> Vec<DataField> {
        let mut fields: Vec<DataField> = self
            .inputs
            .iter()
            .flat_map(|i| i.reads().iter().copied())
            .collect();
        fields.sort();
        fields.dedup();
        fields
    }
}
