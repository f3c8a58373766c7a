//! North Carolina programs.

use rust_decimal::Decimal;

use crate::calculation::calculator::{CalcContext, ProgramCalculator};
use crate::calculation::rules::{AgeDisabilityRule, FplIncomeCheck};
use crate::dependencies::DataField;
use crate::models::{Eligibility, ExpenseType, Household, IncomeFilter, Message, Timeframe};

/// Low Income Energy Assistance Program.
///
/// Countable income is 80% of earned income plus unearned income, less child
/// care and child support paid and, for households with a senior or disabled
/// member, a flat medical deduction. Households with a senior or disabled
/// member get the higher limit.
pub struct Lieap {
    qualifying_expenses: &'static [ExpenseType],
    deducted_expenses: &'static [ExpenseType],
    earned_share: Decimal,
    medical_deduction: Decimal,
    senior_or_disabled: AgeDisabilityRule,
    fpl_percent: Decimal,
    senior_disabled_fpl_percent: Decimal,
    large_household_size: usize,
    /// Yearly amounts for small and large households, at or below half the
    /// guideline and at or below the guideline.
    small_household_values: (Decimal, Decimal),
    large_household_values: (Decimal, Decimal),
}

impl Default for Lieap {
    fn default() -> Self {
        Self {
            qualifying_expenses: &[ExpenseType::Rent, ExpenseType::Mortgage, ExpenseType::Heating],
            deducted_expenses: &[ExpenseType::ChildCare, ExpenseType::ChildSupport],
            earned_share: Decimal::new(8, 1),
            medical_deduction: Decimal::from(85 * 12),
            senior_or_disabled: AgeDisabilityRule::new(60, 0),
            fpl_percent: Decimal::new(13, 1),
            senior_disabled_fpl_percent: Decimal::new(15, 1),
            large_household_size: 4,
            small_household_values: (Decimal::from(400), Decimal::from(300)),
            large_household_values: (Decimal::from(500), Decimal::from(400)),
        }
    }
}

impl Lieap {
    fn has_senior_or_disabled(&self, household: &Household) -> bool {
        self.senior_or_disabled.any(household)
    }

    /// Countable yearly income, floored at zero.
    pub fn countable_income(&self, household: &Household) -> Decimal {
        let earned = household.calc_gross_income(Timeframe::Yearly, &[IncomeFilter::Earned]);
        let unearned = household.calc_gross_income(Timeframe::Yearly, &[IncomeFilter::Unearned]);
        let expenses = household.calc_expenses(Timeframe::Yearly, self.deducted_expenses);
        let medical = if self.has_senior_or_disabled(household) {
            self.medical_deduction
        } else {
            Decimal::ZERO
        };
        (earned * self.earned_share + unearned - expenses - medical).max(Decimal::ZERO)
    }

    fn fpl_percent(&self, household: &Household) -> Decimal {
        if self.has_senior_or_disabled(household) {
            self.senior_disabled_fpl_percent
        } else {
            self.fpl_percent
        }
    }
}

impl ProgramCalculator for Lieap {
    fn dependencies(&self) -> Vec<DataField> {
        vec![
            DataField::IncomeFrequency,
            DataField::IncomeAmount,
            DataField::HouseholdSize,
            DataField::Age,
            DataField::Disabled,
            DataField::ExpenseType,
            DataField::ExpenseAmount,
        ]
    }

    fn household_eligible(&self, ctx: &CalcContext<'_>, e: &mut Eligibility) {
        let household = ctx.household;
        e.condition(household.has_expense(self.qualifying_expenses), Message::HousingCost);

        let income = self.countable_income(household);
        let max_income =
            FplIncomeCheck::limit(&ctx.program.fpl, household.size(), self.fpl_percent(household));
        e.condition(income <= max_income, Message::Income { income, max_income });
    }

    fn household_value(&self, ctx: &CalcContext<'_>) -> Decimal {
        let household = ctx.household;
        let income = self.countable_income(household);
        let guideline = ctx.program.fpl.get_limit(household.size());

        let (lowest, low) = if household.size() < self.large_household_size {
            self.small_household_values
        } else {
            self.large_household_values
        };

        if income <= guideline / Decimal::TWO {
            lowest
        } else if income <= guideline {
            low
        } else {
            Decimal::ZERO
        }
    }
}
