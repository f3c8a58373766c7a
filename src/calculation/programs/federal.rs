//! Federal programs.
//!
//! Medicaid, WIC, SNAP and the premium tax credit are computed by
//! PolicyEngine; these calculators only declare variables and post-process
//! the outputs. Medicare Savings Programs are evaluated locally.

use rust_decimal::Decimal;

use super::{IRS_GROSS_INCOME, TAX_UNIT_ROLES, category_amount, monthly};
use crate::calculation::calculator::{CalcContext, ProgramCalculator};
use crate::calculation::rules::AgeDisabilityRule;
use crate::dependencies::DataField;
use crate::models::{
    Eligibility, HouseholdMember, IncomeFilter, IncomeType, InsuranceType, Message, Timeframe,
};
use crate::policyengine::{PeInput, PeOutput, PolicyEngineSpec};

fn spec(groups: &[&[PeInput]], outputs: &[PeOutput]) -> PolicyEngineSpec {
    let inputs: Vec<PeInput> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    PolicyEngineSpec::new(&inputs, outputs)
}

/// Medicaid, by PolicyEngine category.
///
/// Seniors and members with a disability are only eligible through the
/// optional aged/disabled pathway and never fall through to another category.
pub struct Medicaid {
    spec: PolicyEngineSpec,
    categories: &'static [(&'static str, i64)],
    aged_or_disabled: AgeDisabilityRule,
}

const IL_MEDICAID_CATEGORIES: &[(&str, i64)] = &[
    ("NONE", 0),
    ("ADULT", 474),
    ("INFANT", 0),
    ("YOUNG_CHILD", 0),
    ("OLDER_CHILD", 0),
    ("PREGNANT", 474),
    ("YOUNG_ADULT", 0),
    ("PARENT", 474),
    ("SSI_RECIPIENT", 474),
    ("AGED", 474),
    ("DISABLED", 474),
];

impl Default for Medicaid {
    fn default() -> Self {
        Self {
            spec: spec(
                &[
                    &[
                        PeInput::Age,
                        PeInput::IsPregnant,
                        PeInput::CurrentPregnancies,
                        PeInput::IsDisabled,
                        PeInput::IsBlind,
                        PeInput::Ssi,
                        PeInput::SsiReported,
                        PeInput::SsiCountableResources,
                        PeInput::SsiEarnedIncome,
                        PeInput::SsiUnearnedIncome,
                        PeInput::SocialSecurityDisability,
                        PeInput::MedicalOutOfPocketExpenses,
                        PeInput::StateCode,
                    ],
                    IRS_GROSS_INCOME,
                    TAX_UNIT_ROLES,
                ],
                &[
                    PeOutput::Medicaid,
                    PeOutput::MedicaidCategory,
                    PeOutput::OptionalSeniorOrDisabledMedicaid,
                ],
            ),
            categories: IL_MEDICAID_CATEGORIES,
            aged_or_disabled: AgeDisabilityRule::new(65, 0),
        }
    }
}

impl Medicaid {
    fn annual_value(&self, ctx: &CalcContext<'_>, member: &HouseholdMember) -> Decimal {
        let Some(output) = ctx.output() else {
            return Decimal::ZERO;
        };

        if self.aged_or_disabled.passes(member) {
            if !output.member_bool(PeOutput::OptionalSeniorOrDisabledMedicaid, member.id) {
                return Decimal::ZERO;
            }
            let category = if member.has_disability() {
                "DISABLED"
            } else {
                "AGED"
            };
            return monthly(category_amount(self.categories, category));
        }

        if output.member_number(PeOutput::Medicaid, member.id) <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let category = output
            .member_text(PeOutput::MedicaidCategory, member.id)
            .unwrap_or("NONE");
        monthly(category_amount(self.categories, category))
    }
}

impl ProgramCalculator for Medicaid {
    fn dependencies(&self) -> Vec<DataField> {
        vec![DataField::Age, DataField::Disabled, DataField::Pregnant]
    }

    fn policy_engine(&self) -> Option<&PolicyEngineSpec> {
        Some(&self.spec)
    }

    fn household_eligible(&self, _ctx: &CalcContext<'_>, _e: &mut Eligibility) {}

    fn member_scoped(&self) -> bool {
        true
    }

    fn member_eligible(&self, ctx: &CalcContext<'_>, member: &HouseholdMember, e: &mut Eligibility) {
        e.condition(self.annual_value(ctx, member) > Decimal::ZERO, None);
    }

    fn member_value(&self, ctx: &CalcContext<'_>, member: &HouseholdMember) -> Decimal {
        self.annual_value(ctx, member)
    }
}

/// WIC, by PolicyEngine category.
pub struct Wic {
    spec: PolicyEngineSpec,
    categories: &'static [(&'static str, i64)],
}

const WIC_CATEGORIES: &[(&str, i64)] = &[
    ("NONE", 0),
    ("INFANT", 130),
    ("CHILD", 79),
    ("PREGNANT", 104),
    ("POSTPARTUM", 88),
    ("BREASTFEEDING", 121),
];

impl Default for Wic {
    fn default() -> Self {
        Self {
            spec: spec(
                &[
                    &[
                        PeInput::Age,
                        PeInput::IsPregnant,
                        PeInput::CurrentPregnancies,
                        PeInput::StateCode,
                    ],
                    IRS_GROSS_INCOME,
                    TAX_UNIT_ROLES,
                ],
                &[PeOutput::Wic, PeOutput::WicCategory],
            ),
            categories: WIC_CATEGORIES,
        }
    }
}

impl Wic {
    fn annual_value(&self, ctx: &CalcContext<'_>, member: &HouseholdMember) -> Decimal {
        let Some(output) = ctx.output() else {
            return Decimal::ZERO;
        };
        if output.member_number(PeOutput::Wic, member.id) <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let category = output.member_text(PeOutput::WicCategory, member.id).unwrap_or("NONE");
        monthly(category_amount(self.categories, category))
    }
}

impl ProgramCalculator for Wic {
    fn dependencies(&self) -> Vec<DataField> {
        vec![DataField::Age, DataField::Pregnant, DataField::HouseholdSize]
    }

    fn policy_engine(&self) -> Option<&PolicyEngineSpec> {
        Some(&self.spec)
    }

    fn household_eligible(&self, _ctx: &CalcContext<'_>, _e: &mut Eligibility) {}

    fn member_scoped(&self) -> bool {
        true
    }

    fn member_eligible(&self, ctx: &CalcContext<'_>, member: &HouseholdMember, e: &mut Eligibility) {
        e.condition(self.annual_value(ctx, member) > Decimal::ZERO, None);
    }

    fn member_value(&self, ctx: &CalcContext<'_>, member: &HouseholdMember) -> Decimal {
        self.annual_value(ctx, member)
    }
}

/// SNAP, read from the SPM unit.
pub struct Snap {
    spec: PolicyEngineSpec,
}

impl Default for Snap {
    fn default() -> Self {
        Self {
            spec: PolicyEngineSpec::new(
                &[
                    PeInput::Age,
                    PeInput::IsDisabled,
                    PeInput::MedicalOutOfPocketExpenses,
                    PeInput::RealEstateTaxes,
                    PeInput::ChildSupportReceived,
                    PeInput::SnapEarnedIncome,
                    PeInput::SnapUnearnedIncome,
                    PeInput::SnapAssets,
                    PeInput::HousingCost,
                    PeInput::HasHeatingCoolingExpense,
                    PeInput::HeatingCoolingExpense,
                    PeInput::HasPhoneExpense,
                    PeInput::PhoneExpense,
                    PeInput::ChildcareExpenses,
                    PeInput::MortgagePayments,
                    PeInput::StateCode,
                    PeInput::CountyStr,
                ],
                &[PeOutput::Snap],
            ),
        }
    }
}

impl ProgramCalculator for Snap {
    fn dependencies(&self) -> Vec<DataField> {
        vec![
            DataField::HouseholdSize,
            DataField::IncomeAmount,
            DataField::ExpenseAmount,
        ]
    }

    fn policy_engine(&self) -> Option<&PolicyEngineSpec> {
        Some(&self.spec)
    }

    fn household_eligible(&self, ctx: &CalcContext<'_>, e: &mut Eligibility) {
        e.condition(self.household_value(ctx) > Decimal::ZERO, None);
    }

    fn household_value(&self, ctx: &CalcContext<'_>) -> Decimal {
        ctx.output()
            .map(|o| o.unit_number(PeOutput::Snap))
            .unwrap_or(Decimal::ZERO)
    }
}

/// Premium tax credit, summed over every tax unit.
pub struct Aca {
    spec: PolicyEngineSpec,
}

impl Default for Aca {
    fn default() -> Self {
        Self {
            spec: spec(
                &[
                    &[
                        PeInput::Age,
                        PeInput::IsPregnant,
                        PeInput::StateCode,
                        PeInput::CountyStr,
                        PeInput::ZipCode,
                    ],
                    IRS_GROSS_INCOME,
                    TAX_UNIT_ROLES,
                ],
                &[PeOutput::AcaPtc],
            ),
        }
    }
}

impl ProgramCalculator for Aca {
    fn dependencies(&self) -> Vec<DataField> {
        vec![DataField::Age, DataField::Insurance, DataField::County]
    }

    fn policy_engine(&self) -> Option<&PolicyEngineSpec> {
        Some(&self.spec)
    }

    fn household_eligible(&self, ctx: &CalcContext<'_>, e: &mut Eligibility) {
        e.condition(self.household_value(ctx) > Decimal::ZERO, None);
    }

    fn household_value(&self, ctx: &CalcContext<'_>) -> Decimal {
        ctx.output()
            .map(|o| o.unit_number(PeOutput::AcaPtc))
            .unwrap_or(Decimal::ZERO)
    }
}

/// Medicare Savings Programs.
///
/// Income is the member's plus their spouse's, after the general and earned
/// disregards, against 135% of the guideline.
pub struct MedicareSavings {
    age_rule: AgeDisabilityRule,
    insurance: &'static [InsuranceType],
    single_asset_limit: Decimal,
    married_asset_limit: Decimal,
    general_disregard: Decimal,
    earned_disregard: Decimal,
    max_income_percent: Decimal,
    amount: Decimal,
}

impl Default for MedicareSavings {
    fn default() -> Self {
        Self {
            age_rule: AgeDisabilityRule::new(65, 18),
            insurance: &[
                InsuranceType::None,
                InsuranceType::Employer,
                InsuranceType::Private,
                InsuranceType::Medicare,
            ],
            single_asset_limit: Decimal::from(11_160),
            married_asset_limit: Decimal::from(17_470),
            general_disregard: monthly(20),
            earned_disregard: monthly(65),
            max_income_percent: Decimal::new(135, 2),
            amount: monthly(185),
        }
    }
}

impl MedicareSavings {
    /// The member's spouse, if the member is married.
    fn spouse_of<'a>(ctx: &CalcContext<'a>, member: &HouseholdMember) -> Option<&'a HouseholdMember> {
        let household = ctx.household;
        if member.is_head() {
            household.spouse()
        } else if member.is_spouse() {
            household.head()
        } else {
            None
        }
    }

    /// Earned income after disregards plus unearned income and SSI.
    pub fn countable_income(&self, earned: Decimal, unearned: Decimal, ssi: Decimal) -> Decimal {
        let (mut earned, mut unearned) = (earned, unearned);
        if unearned >= self.general_disregard {
            unearned -= self.general_disregard;
        } else {
            let remaining = self.general_disregard - unearned;
            unearned = Decimal::ZERO;
            earned = (earned - remaining).max(Decimal::ZERO);
        }
        earned = (earned - self.earned_disregard).max(Decimal::ZERO) / Decimal::TWO;
        earned + unearned + ssi
    }
}

impl ProgramCalculator for MedicareSavings {
    fn dependencies(&self) -> Vec<DataField> {
        vec![
            DataField::HouseholdAssets,
            DataField::Relationship,
            DataField::IncomeFrequency,
            DataField::IncomeAmount,
            DataField::Age,
            DataField::Disabled,
            DataField::Insurance,
        ]
    }

    fn household_eligible(&self, _ctx: &CalcContext<'_>, _e: &mut Eligibility) {}

    fn member_scoped(&self) -> bool {
        true
    }

    fn member_eligible(&self, ctx: &CalcContext<'_>, member: &HouseholdMember, e: &mut Eligibility) {
        e.condition(self.age_rule.passes(member), Message::OlderThan { min_age: 65 });
        e.condition(member.insurance.has_any(self.insurance), None);

        let spouse = Self::spouse_of(ctx, member);
        let asset_limit = if spouse.is_some() {
            self.married_asset_limit
        } else {
            self.single_asset_limit
        };
        e.condition(
            ctx.household.household_assets <= asset_limit,
            Message::Assets { asset_limit },
        );

        let people = std::iter::once(member).chain(spouse);
        let (mut earned, mut unearned, mut ssi) = (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
        for person in people {
            earned += person.calc_gross_income(Timeframe::Yearly, &[IncomeFilter::Earned], &[]);
            unearned += person.calc_gross_income(
                Timeframe::Yearly,
                &[IncomeFilter::Unearned],
                &[IncomeType::Ssi],
            );
            ssi += person.yearly_income_of(&[IncomeType::Ssi]);
        }
        let income = self.countable_income(earned, unearned, ssi);
        let max_income = ctx.program.fpl.get_limit(ctx.household.size()) * self.max_income_percent;
        e.condition(income <= max_income, Message::Income { income, max_income });
    }

    fn member_amount(&self) -> Decimal {
        self.amount
    }
}
