//! Illinois programs.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::monthly;
use crate::calculation::calculator::{CalcContext, ProgramCalculator};
use crate::calculation::rules::FplIncomeCheck;
use crate::dependencies::DataField;
use crate::income_limits::normalize_county;
use crate::models::{
    Eligibility, Household, HouseholdMember, IncomeFilter, InsuranceType, Message, Relationship,
    Timeframe,
};
use crate::policyengine::{PeInput, PeOutput, PolicyEngineSpec};

/// Relationships that make a member a parent or caretaker of the head's
/// children.
const CARETAKERS: [Relationship; 5] = [
    Relationship::HeadOfHousehold,
    Relationship::Spouse,
    Relationship::DomesticPartner,
    Relationship::Parent,
    Relationship::FosterParent,
];

/// All Kids.
pub struct AllKids {
    income: FplIncomeCheck,
    max_age: u32,
    excluded_insurance: &'static [InsuranceType],
    amount: Decimal,
}

impl Default for AllKids {
    fn default() -> Self {
        Self {
            income: FplIncomeCheck::new(Decimal::new(318, 2)),
            max_age: 18,
            excluded_insurance: &[InsuranceType::Medicaid, InsuranceType::Chp],
            amount: monthly(284),
        }
    }
}

impl ProgramCalculator for AllKids {
    fn dependencies(&self) -> Vec<DataField> {
        vec![
            DataField::Age,
            DataField::Insurance,
            DataField::Pregnant,
            DataField::HouseholdSize,
            DataField::IncomeAmount,
            DataField::IncomeFrequency,
        ]
    }

    fn household_eligible(&self, ctx: &CalcContext<'_>, e: &mut Eligibility) {
        self.income.check(ctx.household, &ctx.program.fpl, e);
    }

    fn member_scoped(&self) -> bool {
        true
    }

    fn member_eligible(&self, _ctx: &CalcContext<'_>, member: &HouseholdMember, e: &mut Eligibility) {
        e.condition(
            member.age.is_some_and(|a| a <= self.max_age),
            Message::Child {
                min_age: 0,
                max_age: self.max_age,
            },
        );
        e.condition(!member.insurance.has_any(self.excluded_insurance), None);
    }

    fn member_amount(&self) -> Decimal {
        self.amount
    }
}

/// FamilyCare: parents and caretakers of Medicaid-eligible households.
pub struct FamilyCare {
    income: FplIncomeCheck,
    amount: Decimal,
}

impl Default for FamilyCare {
    fn default() -> Self {
        Self {
            income: FplIncomeCheck::new(Decimal::new(138, 2)),
            amount: monthly(474),
        }
    }
}

impl ProgramCalculator for FamilyCare {
    fn dependencies(&self) -> Vec<DataField> {
        vec![
            DataField::Age,
            DataField::Relationship,
            DataField::Pregnant,
            DataField::HouseholdSize,
            DataField::IncomeAmount,
            DataField::IncomeFrequency,
        ]
    }

    fn references(&self) -> &'static [&'static str] {
        &["medicaid"]
    }

    fn household_eligible(&self, ctx: &CalcContext<'_>, e: &mut Eligibility) {
        e.condition(
            ctx.eligible_for("medicaid"),
            Message::MustHaveBenefit {
                benefit: "Medicaid".to_string(),
            },
        );
        let income = ctx.household.calc_gross_income(Timeframe::Yearly, &[IncomeFilter::All]);
        self.income.check_income(&ctx.program.fpl, ctx.household.size(), income, e);
    }

    fn member_scoped(&self) -> bool {
        true
    }

    fn member_eligible(&self, ctx: &CalcContext<'_>, member: &HouseholdMember, e: &mut Eligibility) {
        let has_child = ctx.household.num_children(0, 18, &Relationship::CHILD_LIKE) > 0;
        let caretaker = has_child && CARETAKERS.contains(&member.relationship);
        e.condition(member.pregnant || caretaker, None);
    }

    fn member_amount(&self) -> Decimal {
        self.amount
    }
}

/// Moms & Babies: pregnant parents and infants up to two months.
pub struct MomsAndBabies {
    income: FplIncomeCheck,
    min_parent_age: u32,
    newborn_max_months: u32,
    newborn_amount: Decimal,
    parent_amount: Decimal,
}

impl Default for MomsAndBabies {
    fn default() -> Self {
        Self {
            income: FplIncomeCheck::new(Decimal::new(213, 2)),
            min_parent_age: 19,
            newborn_max_months: 2,
            newborn_amount: monthly(284),
            parent_amount: monthly(474),
        }
    }
}

impl MomsAndBabies {
    fn is_newborn(&self, member: &HouseholdMember, as_of: NaiveDate) -> bool {
        member
            .age_in_months(as_of)
            .is_some_and(|m| m <= self.newborn_max_months)
    }

    fn has_newborn(&self, household: &Household, as_of: NaiveDate) -> bool {
        household.members.iter().any(|m| self.is_newborn(m, as_of))
    }

    fn is_eligible_parent(&self, member: &HouseholdMember, has_newborn: bool) -> bool {
        member.is_at_least(self.min_parent_age)
            && CARETAKERS.contains(&member.relationship)
            && (member.pregnant || has_newborn)
    }

    fn has_eligible_parent(&self, ctx: &CalcContext<'_>) -> bool {
        let has_newborn = self.has_newborn(ctx.household, ctx.as_of);
        ctx.household
            .members
            .iter()
            .any(|m| self.is_eligible_parent(m, has_newborn))
    }
}

impl ProgramCalculator for MomsAndBabies {
    fn dependencies(&self) -> Vec<DataField> {
        vec![
            DataField::Age,
            DataField::Relationship,
            DataField::Pregnant,
            DataField::Insurance,
            DataField::HouseholdSize,
            DataField::IncomeAmount,
            DataField::IncomeFrequency,
        ]
    }

    fn references(&self) -> &'static [&'static str] {
        &["il_family_care"]
    }

    fn household_eligible(&self, ctx: &CalcContext<'_>, e: &mut Eligibility) {
        e.condition(
            !ctx.eligible_for("il_family_care"),
            Message::MustNotHaveBenefit {
                benefit: "FamilyCare".to_string(),
            },
        );
        self.income.check(ctx.household, &ctx.program.fpl, e);
        e.condition(self.has_eligible_parent(ctx), Message::IsPregnant);
    }

    fn member_scoped(&self) -> bool {
        true
    }

    fn member_eligible(&self, ctx: &CalcContext<'_>, member: &HouseholdMember, e: &mut Eligibility) {
        let has_newborn = self.has_newborn(ctx.household, ctx.as_of);
        let covered = self.is_eligible_parent(member, has_newborn)
            || (self.is_newborn(member, ctx.as_of) && self.has_eligible_parent(ctx));
        e.condition(covered, None);
        e.condition(!member.insurance.has(InsuranceType::Medicaid), None);
    }

    fn member_value(&self, ctx: &CalcContext<'_>, member: &HouseholdMember) -> Decimal {
        if self.is_newborn(member, ctx.as_of) {
            self.newborn_amount
        } else {
            self.parent_amount
        }
    }
}

/// Monthly subsidy by age band for one group of counties.
///
/// Bands are under 24 months, under 36, under 72 and school age.
#[derive(Debug, Clone, Copy)]
struct RateGroup {
    counties: &'static [&'static str],
    rates: [i64; 4],
}

const CCAP_GROUP_1A: RateGroup = RateGroup {
    counties: &["Cook", "DeKalb", "DuPage", "Kane", "Kendall", "Lake", "McHenry"],
    rates: [1474, 1188, 1012, 506],
};

const CCAP_GROUP_1B: RateGroup = RateGroup {
    counties: &[
        "Boone",
        "Champaign",
        "Kankakee",
        "Madison",
        "McLean",
        "Monroe",
        "Ogle",
        "Peoria",
        "Rock Island",
        "Sangamon",
        "St. Clair",
        "Tazewell",
        "Whiteside",
        "Will",
        "Winnebago",
        "Woodford",
    ],
    rates: [1408, 1122, 946, 484],
};

const CCAP_GROUP_2_RATES: [i64; 4] = [1254, 1012, 880, 440];

/// Child Care Assistance Program.
///
/// Value is the per-child subsidy less the family's yearly co-payment. The
/// co-payment is a token amount at or below the poverty guideline and a share
/// of monthly income above it.
pub struct Ccap {
    income: FplIncomeCheck,
    max_age: u32,
    disabled_max_age: u32,
    child_relationships: &'static [Relationship],
    minimum_copay: Decimal,
    copay_rate: Decimal,
}

impl Default for Ccap {
    fn default() -> Self {
        Self {
            income: FplIncomeCheck::new(Decimal::new(225, 2)),
            max_age: 12,
            disabled_max_age: 18,
            child_relationships: &[
                Relationship::Child,
                Relationship::StepChild,
                Relationship::FosterChild,
                Relationship::GrandChild,
                Relationship::SisterOrBrother,
                Relationship::StepSisterOrBrother,
            ],
            minimum_copay: Decimal::ONE,
            copay_rate: Decimal::new(7, 2),
        }
    }
}

impl Ccap {
    /// Family co-payment per month.
    pub fn monthly_copay(&self, ctx: &CalcContext<'_>) -> Decimal {
        let household = ctx.household;
        let income = household.calc_gross_income(Timeframe::Monthly, &[IncomeFilter::All]);
        let guideline = ctx.program.fpl.get_limit(household.size()) / Decimal::from(12);
        if income <= guideline {
            self.minimum_copay
        } else {
            (income * self.copay_rate).round_dp(2)
        }
    }

    /// Monthly rate for a child of `months` in `county`.
    fn monthly_rate(county: Option<&str>, months: u32) -> i64 {
        let rates = county
            .map(normalize_county)
            .and_then(|county| {
                [CCAP_GROUP_1A, CCAP_GROUP_1B].into_iter().find(|group| {
                    group
                        .counties
                        .iter()
                        .any(|name| normalize_county(name).eq_ignore_ascii_case(&county))
                })
            })
            .map_or(CCAP_GROUP_2_RATES, |group| group.rates);

        let band = match months {
            0..=23 => 0,
            24..=35 => 1,
            36..=71 => 2,
            _ => 3,
        };
        rates[band]
    }
}

impl ProgramCalculator for Ccap {
    fn dependencies(&self) -> Vec<DataField> {
        vec![
            DataField::Age,
            DataField::Relationship,
            DataField::Disabled,
            DataField::Student,
            DataField::County,
            DataField::HouseholdSize,
            DataField::IncomeType,
            DataField::IncomeAmount,
            DataField::IncomeFrequency,
            DataField::CurrentBenefits,
        ]
    }

    fn household_eligible(&self, ctx: &CalcContext<'_>, e: &mut Eligibility) {
        let household = ctx.household;
        e.condition(
            !household.has_benefit("il_ccap"),
            Message::MustNotHaveBenefit {
                benefit: "CCAP".to_string(),
            },
        );

        let income = household.calc_gross_income(Timeframe::Yearly, &[IncomeFilter::All]);
        self.income.check_income(&ctx.program.fpl, household.size(), income, e);

        let working_or_studying = household.head().is_some_and(|head| {
            head.student
                || head.calc_gross_income(Timeframe::Yearly, &[IncomeFilter::Earned], &[])
                    > Decimal::ZERO
        });
        e.condition(working_or_studying, None);
    }

    fn member_scoped(&self) -> bool {
        true
    }

    fn member_eligible(&self, _ctx: &CalcContext<'_>, member: &HouseholdMember, e: &mut Eligibility) {
        e.condition(self.child_relationships.contains(&member.relationship), None);
        let max_age = if member.has_disability() {
            self.disabled_max_age
        } else {
            self.max_age
        };
        e.condition(
            member.age.is_some_and(|a| a <= max_age),
            Message::Child { min_age: 0, max_age },
        );
    }

    fn household_value(&self, ctx: &CalcContext<'_>) -> Decimal {
        -(self.monthly_copay(ctx) * Decimal::from(12))
    }

    fn member_value(&self, ctx: &CalcContext<'_>, member: &HouseholdMember) -> Decimal {
        let months = member.age_in_months(ctx.as_of).unwrap_or(0);
        monthly(Self::monthly_rate(ctx.household.county.as_deref(), months))
    }
}

/// Health Benefits for Workers with Disabilities.
pub struct Hbwd {
    spec: PolicyEngineSpec,
}

impl Default for Hbwd {
    fn default() -> Self {
        Self {
            spec: PolicyEngineSpec::new(
                &[
                    PeInput::Age,
                    PeInput::IsDisabled,
                    PeInput::IsBlind,
                    PeInput::SocialSecurityDisability,
                    PeInput::EmploymentIncome,
                    PeInput::SelfEmploymentIncome,
                    PeInput::SpmUnitCashAssets,
                    PeInput::StateCode,
                ],
                &[PeOutput::IlHbwdEligible],
            ),
        }
    }
}

impl ProgramCalculator for Hbwd {
    fn dependencies(&self) -> Vec<DataField> {
        vec![DataField::Disabled, DataField::Insurance]
    }

    fn policy_engine(&self) -> Option<&PolicyEngineSpec> {
        Some(&self.spec)
    }

    fn household_eligible(&self, _ctx: &CalcContext<'_>, _e: &mut Eligibility) {}

    fn member_scoped(&self) -> bool {
        true
    }

    fn member_eligible(&self, ctx: &CalcContext<'_>, member: &HouseholdMember, e: &mut Eligibility) {
        let eligible = ctx
            .output()
            .is_some_and(|o| o.member_bool(PeOutput::IlHbwdEligible, member.id));
        e.condition(eligible, Message::HasDisability);
    }

    fn member_amount(&self) -> Decimal {
        Decimal::ONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::calculator::Simulation;
    use crate::calculation::calculator::test_support::{Fixture, dec};
    use crate::models::{BirthYearMonth, Frequency, IncomeStream, IncomeType, Insurance, MemberId};
    use crate::policyengine::SimulationOutput;
    use serde_json::json;

    fn member(id: u32, relationship: Relationship, age: u32) -> HouseholdMember {
        HouseholdMember::new(MemberId(id), relationship, Some(age))
    }

    fn with_wages(mut member: HouseholdMember, monthly_wages: i64) -> HouseholdMember {
        member.income_streams.push(IncomeStream {
            income_type: IncomeType::Wages,
            amount: Decimal::from(monthly_wages),
            frequency: Frequency::Monthly,
            hours_worked: None,
        });
        member
    }

    fn household(members: Vec<HouseholdMember>) -> Household {
        let mut household = Household::new("IL");
        household.members = members;
        household
    }

    #[test]
    fn test_all_kids_counts_uninsured_children() {
        let mut covered = member(3, Relationship::Child, 10);
        covered.insurance = Insurance::of(&[InsuranceType::Chp]);
        let h = household(vec![
            with_wages(member(1, Relationship::HeadOfHousehold, 40), 4000),
            member(2, Relationship::Child, 7),
            covered,
        ]);
        let result = Fixture::new("il_all_kids", h).run(&AllKids::default());
        assert!(result.eligible);
        assert_eq!(result.eligible_members(), vec![MemberId(2)]);
        assert_eq!(result.value, Decimal::from(284 * 12));
    }

    #[test]
    fn test_all_kids_income_over_limit() {
        // 318% of 21150 = 67257
        let h = household(vec![
            with_wages(member(1, Relationship::HeadOfHousehold, 40), 5700),
            member(2, Relationship::Child, 7),
        ]);
        let result = Fixture::new("il_all_kids", h).run(&AllKids::default());
        assert!(!result.eligible);
        assert_eq!(
            result.conditions.failed_messages().collect::<Vec<_>>(),
            vec![&Message::Income {
                income: dec("68400"),
                max_income: dec("67257"),
            }]
        );
    }

    #[test]
    fn test_family_care_requires_medicaid_this_pass() {
        let h = household(vec![
            member(1, Relationship::HeadOfHousehold, 30),
            member(2, Relationship::Child, 4),
        ]);
        let without = Fixture::new("il_family_care", h.clone()).run(&FamilyCare::default());
        assert!(!without.eligible);
        assert_eq!(
            without.failed_messages(),
            vec![&Message::MustHaveBenefit {
                benefit: "Medicaid".to_string()
            }]
        );

        let with = Fixture::new("il_family_care", h)
            .with_result("medicaid", true)
            .run(&FamilyCare::default());
        assert!(with.eligible);
        assert_eq!(with.eligible_members(), vec![MemberId(1)]);
        assert_eq!(with.value, Decimal::from(474 * 12));
    }

    #[test]
    fn test_family_care_adult_without_children_is_not_caretaker() {
        let h = household(vec![member(1, Relationship::HeadOfHousehold, 30)]);
        let result = Fixture::new("il_family_care", h)
            .with_result("medicaid", true)
            .run(&FamilyCare::default());
        assert!(!result.eligible);
    }

    #[test]
    fn test_moms_and_babies_pregnant_head() {
        let mut head = member(1, Relationship::HeadOfHousehold, 25);
        head.pregnant = true;
        let result = Fixture::new("il_moms_and_babies", household(vec![head]))
            .run(&MomsAndBabies::default());
        assert!(result.eligible);
        assert_eq!(result.value, Decimal::from(474 * 12));
    }

    #[test]
    fn test_moms_and_babies_newborn_and_parent() {
        let mut baby = member(2, Relationship::Child, 0);
        baby.birth_year_month = Some(BirthYearMonth { year: 2025, month: 4 });
        let h = household(vec![member(1, Relationship::HeadOfHousehold, 28), baby]);
        let result = Fixture::new("il_moms_and_babies", h).run(&MomsAndBabies::default());
        assert!(result.eligible);
        assert_eq!(result.eligible_members(), vec![MemberId(1), MemberId(2)]);
        assert_eq!(result.value, Decimal::from((474 + 284) * 12));
    }

    #[test]
    fn test_moms_and_babies_excluded_when_family_care_eligible() {
        let mut head = member(1, Relationship::HeadOfHousehold, 25);
        head.pregnant = true;
        let result = Fixture::new("il_moms_and_babies", household(vec![head]))
            .with_result("il_family_care", true)
            .run(&MomsAndBabies::default());
        assert!(!result.eligible);
    }

    #[test]
    fn test_moms_and_babies_young_parent_is_not_eligible_adult() {
        let mut head = member(1, Relationship::HeadOfHousehold, 18);
        head.pregnant = true;
        let result = Fixture::new("il_moms_and_babies", household(vec![head]))
            .run(&MomsAndBabies::default());
        assert!(!result.eligible);
        assert!(result.failed_messages().contains(&&Message::IsPregnant));
    }

    #[test]
    fn test_ccap_rates_by_county_group_and_age() {
        assert_eq!(Ccap::monthly_rate(Some("Cook County"), 10), 1474);
        assert_eq!(Ccap::monthly_rate(Some("St. Clair"), 30), 1122);
        assert_eq!(Ccap::monthly_rate(Some("Adams"), 48), 880);
        assert_eq!(Ccap::monthly_rate(None, 100), 440);
        assert_eq!(Ccap::monthly_rate(Some("cook"), 72), 506);
    }

    #[test]
    fn test_ccap_working_parent_with_children() {
        let mut teen = member(3, Relationship::Child, 15);
        teen.disabled = true;
        let mut h = household(vec![
            with_wages(member(1, Relationship::HeadOfHousehold, 33), 2500),
            member(2, Relationship::Child, 2),
            teen,
            member(4, Relationship::Child, 14),
        ]);
        h.county = Some("DuPage".to_string());
        let result = Fixture::new("il_ccap", h).run(&Ccap::default());
        assert!(result.eligible);
        assert_eq!(result.eligible_members(), vec![MemberId(2), MemberId(3)]);
        // income is under the guideline for four, so the co-payment is $1
        assert_eq!(result.value, Decimal::from((1188 + 506) * 12 - 12));
    }

    #[test]
    fn test_ccap_copay_above_guideline() {
        let h = household(vec![
            with_wages(member(1, Relationship::HeadOfHousehold, 33), 2500),
            member(2, Relationship::Child, 4),
        ]);
        let fixture = Fixture::new("il_ccap", h);
        let ccap = Ccap::default();
        assert_eq!(ccap.monthly_copay(&fixture.ctx()), dec("175"));

        let result = fixture.run(&ccap);
        assert_eq!(result.value, Decimal::from((880 - 175) * 12));
    }

    #[test]
    fn test_ccap_needs_work_or_school() {
        let h = household(vec![
            member(1, Relationship::HeadOfHousehold, 33),
            member(2, Relationship::Child, 2),
        ]);
        assert!(!Fixture::new("il_ccap", h.clone()).run(&Ccap::default()).eligible);

        let mut student = h;
        student.members[0].student = true;
        assert!(Fixture::new("il_ccap", student).run(&Ccap::default()).eligible);
    }

    #[test]
    fn test_ccap_already_enrolled() {
        let mut h = household(vec![
            with_wages(member(1, Relationship::HeadOfHousehold, 33), 1000),
            member(2, Relationship::Child, 2),
        ]);
        h.current_benefits.insert("il_ccap".to_string());
        assert!(!Fixture::new("il_ccap", h).run(&Ccap::default()).eligible);
    }

    #[test]
    fn test_hbwd_reads_policyengine_flag() {
        let body = json!({"result": {"people": {
            "1": {"il_hbwd_eligible": {"2025": true}},
            "2": {"il_hbwd_eligible": {"2025": false}}
        }}});
        let h = household(vec![
            member(1, Relationship::HeadOfHousehold, 45),
            member(2, Relationship::Spouse, 44),
        ]);
        let mut fixture = Fixture::new("il_hbwd", h);
        fixture.simulation = Simulation::Ready(
            SimulationOutput::from_body(body.to_string().as_bytes(), "2025").unwrap(),
        );
        let result = fixture.run(&Hbwd::default());
        assert!(result.eligible);
        assert_eq!(result.eligible_members(), vec![MemberId(1)]);
        assert_eq!(result.value, Decimal::ONE);
    }
}
