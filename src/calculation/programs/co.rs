//! Colorado programs.

use rust_decimal::Decimal;

use crate::calculation::calculator::{CalcContext, ProgramCalculator};
use crate::calculation::rules::FplIncomeCheck;
use crate::dependencies::DataField;
use crate::income_limits::IncomeLimitQuery;
use crate::models::{
    Eligibility, ExpenseType, Household, HouseholdMember, IncomeFilter, InsuranceType, Message,
    Relationship, Timeframe,
};

/// Nurse-Family Partnership: first-time pregnant parents.
pub struct NurseFamilyPartnership {
    max_income_percent: Decimal,
    income_household_size: usize,
    categorical_insurance: &'static [InsuranceType],
    amount: Decimal,
}

impl Default for NurseFamilyPartnership {
    fn default() -> Self {
        Self {
            max_income_percent: Decimal::TWO,
            income_household_size: 2,
            categorical_insurance: &[InsuranceType::Medicaid, InsuranceType::EmergencyMedicaid],
            amount: Decimal::from(2_400),
        }
    }
}

impl ProgramCalculator for NurseFamilyPartnership {
    fn dependencies(&self) -> Vec<DataField> {
        vec![
            DataField::Relationship,
            DataField::Pregnant,
            DataField::Insurance,
            DataField::IncomeAmount,
            DataField::IncomeFrequency,
            DataField::CurrentBenefits,
        ]
    }

    fn household_eligible(&self, ctx: &CalcContext<'_>, e: &mut Eligibility) {
        let has_children = ctx
            .household
            .members
            .iter()
            .any(|m| m.relationship == Relationship::Child);
        e.condition(!has_children, None);
    }

    fn member_scoped(&self) -> bool {
        true
    }

    fn member_eligible(&self, ctx: &CalcContext<'_>, member: &HouseholdMember, e: &mut Eligibility) {
        e.condition(member.pregnant, Message::IsPregnant);

        let income = member
            .calc_gross_income(Timeframe::Yearly, &[IncomeFilter::All], &[])
            .trunc();
        let max_income = FplIncomeCheck::limit(
            &ctx.program.fpl,
            self.income_household_size,
            self.max_income_percent,
        );
        let qualifies = income <= max_income
            || member.insurance.has_any(self.categorical_insurance)
            || ctx.household.has_benefit("wic");
        e.condition(qualifies, Message::Income { income, max_income });
    }

    fn household_amount(&self) -> Decimal {
        self.amount
    }
}

/// Weatherization Assistance Program.
///
/// Income is checked against the county table unless the household is
/// categorically eligible through another benefit.
pub struct Weatherization {
    state: &'static str,
    categorical_benefits: &'static [&'static str],
    amount: Decimal,
}

impl Default for Weatherization {
    fn default() -> Self {
        Self {
            state: "CO",
            categorical_benefits: &["andcs", "ssi", "snap", "leap", "tanf"],
            amount: Decimal::from(350),
        }
    }
}

impl Weatherization {
    fn query(&self, household: &Household) -> Option<IncomeLimitQuery> {
        let county = household.county.as_ref()?;
        Some(IncomeLimitQuery::County {
            state: self.state.to_string(),
            county: county.clone(),
            household_size: household.size(),
        })
    }

    fn categorical(&self, ctx: &CalcContext<'_>) -> bool {
        self.categorical_benefits
            .iter()
            .any(|code| ctx.household.has_benefit(code))
            || ctx.eligible_for("snap")
    }
}

impl ProgramCalculator for Weatherization {
    fn dependencies(&self) -> Vec<DataField> {
        vec![
            DataField::County,
            DataField::HouseholdSize,
            DataField::IncomeAmount,
            DataField::IncomeFrequency,
            DataField::ExpenseType,
            DataField::CurrentBenefits,
        ]
    }

    fn references(&self) -> &'static [&'static str] {
        &["snap"]
    }

    fn income_limit_queries(&self, household: &Household) -> Vec<IncomeLimitQuery> {
        self.query(household).into_iter().collect()
    }

    fn household_eligible(&self, ctx: &CalcContext<'_>, e: &mut Eligibility) {
        let categorical = self.categorical(ctx);
        let income = ctx.household.calc_gross_income(Timeframe::Yearly, &[IncomeFilter::All]);

        match self.query(ctx.household).map(|q| ctx.limits.get(&q)) {
            Some(Ok(max_income)) => {
                e.condition(
                    income <= max_income || categorical,
                    Message::Income { income, max_income },
                );
            }
            Some(Err(failure)) => {
                e.condition(categorical, Message::income_limit_unknown(failure));
            }
            None => {
                e.condition(categorical, Message::IncomeLimitUnknown { failure: None });
            }
        }

        e.condition(
            ctx.household
                .has_expense(&[ExpenseType::Rent, ExpenseType::Mortgage]),
            Message::HousingCost,
        );
    }

    fn household_amount(&self) -> Decimal {
        self.amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::calculator::test_support::{Fixture, dec};
    use crate::error::IncomeLimitError;
    use crate::models::{Expense, Frequency, IncomeStream, IncomeType, MemberId};

    fn pregnant_head(monthly_wages: i64) -> HouseholdMember {
        let mut head = HouseholdMember::new(MemberId(1), Relationship::HeadOfHousehold, Some(24));
        head.pregnant = true;
        head.income_streams.push(IncomeStream {
            income_type: IncomeType::Wages,
            amount: Decimal::from(monthly_wages),
            frequency: Frequency::Monthly,
            hours_worked: None,
        });
        head
    }

    fn household(members: Vec<HouseholdMember>) -> Household {
        let mut household = Household::new("CO");
        household.members = members;
        household
    }

    #[test]
    fn test_nfp_low_income_first_pregnancy() {
        let result = Fixture::new("co_nurse_family_partnership", household(vec![pregnant_head(3000)]))
            .run(&NurseFamilyPartnership::default());
        assert!(result.eligible);
        assert_eq!(result.value, Decimal::from(2_400));
    }

    #[test]
    fn test_nfp_over_income_unless_enrolled_in_wic() {
        // 200% of 21150 = 42300
        let h = household(vec![pregnant_head(4000)]);
        let result = Fixture::new("co_nurse_family_partnership", h.clone())
            .run(&NurseFamilyPartnership::default());
        assert!(!result.eligible);

        let mut with_wic = h;
        with_wic.current_benefits.insert("wic".to_string());
        let result = Fixture::new("co_nurse_family_partnership", with_wic)
            .run(&NurseFamilyPartnership::default());
        assert!(result.eligible);
    }

    #[test]
    fn test_nfp_income_cents_over_limit_are_truncated() {
        let mut head = pregnant_head(0);
        head.income_streams[0] = IncomeStream {
            income_type: IncomeType::Wages,
            amount: dec("42300.50"),
            frequency: Frequency::Yearly,
            hours_worked: None,
        };
        let result = Fixture::new("co_nurse_family_partnership", household(vec![head]))
            .run(&NurseFamilyPartnership::default());
        assert!(result.eligible);
        assert!(result.failed_messages().is_empty());
    }

    #[test]
    fn test_nfp_household_with_child_is_ineligible() {
        let h = household(vec![
            pregnant_head(1000),
            HouseholdMember::new(MemberId(2), Relationship::Child, Some(3)),
        ]);
        let result = Fixture::new("co_nurse_family_partnership", h)
            .run(&NurseFamilyPartnership::default());
        assert!(!result.eligible);
    }

    fn renting(county: &str, monthly_wages: i64) -> Household {
        let mut h = household(vec![pregnant_head(monthly_wages)]);
        h.members[0].pregnant = false;
        h.county = Some(county.to_string());
        h.expenses.push(Expense {
            expense_type: ExpenseType::Rent,
            amount: dec("1200"),
            frequency: Frequency::Monthly,
        });
        h
    }

    fn county_query(county: &str, size: usize) -> IncomeLimitQuery {
        IncomeLimitQuery::County {
            state: "CO".to_string(),
            county: county.to_string(),
            household_size: size,
        }
    }

    #[test]
    fn test_weatherization_declares_county_query() {
        let calc = Weatherization::default();
        assert_eq!(
            calc.income_limit_queries(&renting("Denver", 1000)),
            vec![county_query("Denver", 1)]
        );
        assert!(calc.income_limit_queries(&household(vec![])).is_empty());
    }

    #[test]
    fn test_weatherization_under_county_limit() {
        let mut fixture = Fixture::new("co_weatherization_assistance", renting("Denver", 2000));
        fixture
            .limits
            .insert(county_query("Denver", 1), Ok(dec("48000")));
        let result = fixture.run(&Weatherization::default());
        assert!(result.eligible);
        assert_eq!(result.value, Decimal::from(350));
    }

    #[test]
    fn test_weatherization_over_limit_but_snap_eligible() {
        let mut fixture = Fixture::new("co_weatherization_assistance", renting("Denver", 6000))
            .with_result("snap", true);
        fixture
            .limits
            .insert(county_query("Denver", 1), Ok(dec("48000")));
        assert!(fixture.run(&Weatherization::default()).eligible);
    }

    #[test]
    fn test_weatherization_lookup_failure_is_reported() {
        let failure = IncomeLimitError::CountyNotFound {
            county: "Atlantis County".to_string(),
            state: "CO".to_string(),
        };
        let mut fixture = Fixture::new("co_weatherization_assistance", renting("Atlantis", 100));
        fixture
            .limits
            .insert(county_query("Atlantis", 1), Err(failure.clone()));
        let result = fixture.run(&Weatherization::default());
        assert!(!result.eligible);
        assert_eq!(
            result.failed_messages(),
            vec![&Message::income_limit_unknown(failure)]
        );
    }

    #[test]
    fn test_weatherization_needs_housing_cost() {
        let mut h = renting("Denver", 1000);
        h.expenses.clear();
        let mut fixture = Fixture::new("co_weatherization_assistance", h);
        fixture
            .limits
            .insert(county_query("Denver", 1), Ok(dec("48000")));
        let result = fixture.run(&Weatherization::default());
        assert_eq!(result.failed_messages(), vec![&Message::HousingCost]);
    }
}
