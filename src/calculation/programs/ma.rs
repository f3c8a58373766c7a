//! Massachusetts programs.
//!
//! Both programs serve Cambridge residents. Massachusetts households carry the
//! city in the county field; HUD limits are read for the surrounding county.

use rust_decimal::Decimal;

use crate::calculation::calculator::{CalcContext, ProgramCalculator};
use crate::dependencies::DataField;
use crate::income_limits::{AmiQuery, HudDataset, IncomeLimitQuery};
use crate::models::{Eligibility, Household, IncomeFilter, Message, Timeframe};

const ELIGIBLE_CITY: &str = "Cambridge";
const HUD_COUNTY: &str = "Middlesex";
const HUD_YEAR: u16 = 2025;

fn ami_query(household: &Household, dataset: HudDataset, percent: u8) -> IncomeLimitQuery {
    IncomeLimitQuery::Ami(AmiQuery {
        dataset,
        state: "MA".to_string(),
        county: HUD_COUNTY.to_string(),
        year: HUD_YEAR,
        percent,
        household_size: household.size(),
    })
}

fn in_city(household: &Household) -> bool {
    household.county.as_deref() == Some(ELIGIBLE_CITY)
}

/// Cambridge Middle-Income Rental Program.
pub struct MiddleIncomeRental {
    min_ami_percent: u8,
    max_ami_multiplier: Decimal,
    asset_limit: Decimal,
}

impl Default for MiddleIncomeRental {
    fn default() -> Self {
        Self {
            min_ami_percent: 80,
            max_ami_multiplier: Decimal::new(12, 1),
            asset_limit: Decimal::from(100_000),
        }
    }
}

impl ProgramCalculator for MiddleIncomeRental {
    fn dependencies(&self) -> Vec<DataField> {
        vec![
            DataField::County,
            DataField::IncomeAmount,
            DataField::IncomeFrequency,
            DataField::HouseholdSize,
            DataField::HouseholdAssets,
            DataField::CurrentBenefits,
        ]
    }

    fn income_limit_queries(&self, household: &Household) -> Vec<IncomeLimitQuery> {
        vec![
            ami_query(household, HudDataset::Mtsp, self.min_ami_percent),
            ami_query(household, HudDataset::Mtsp, 100),
        ]
    }

    fn household_eligible(&self, ctx: &CalcContext<'_>, e: &mut Eligibility) {
        let household = ctx.household;
        e.condition(
            !household.has_benefit("ma_middle_income_rental"),
            Message::MustNotHaveBenefit {
                benefit: "Middle-Income Rental".to_string(),
            },
        );
        e.condition(in_city(household), Message::Location);
        e.condition(
            household.household_assets <= self.asset_limit,
            Message::Assets {
                asset_limit: self.asset_limit,
            },
        );

        let min = ctx
            .limits
            .get(&ami_query(household, HudDataset::Mtsp, self.min_ami_percent));
        let median = ctx.limits.get(&ami_query(household, HudDataset::Mtsp, 100));
        match min.and_then(|min| median.map(|median| (min, median))) {
            Ok((min_income, median)) => {
                let income = household.calc_gross_income(Timeframe::Yearly, &[IncomeFilter::All]);
                let max_income = median * self.max_ami_multiplier;
                e.condition(
                    income >= min_income && income <= max_income,
                    Message::IncomeRange {
                        income,
                        min_income,
                        max_income,
                    },
                );
            }
            Err(failure) => e.condition(false, Message::income_limit_unknown(failure)),
        }
    }

    fn household_amount(&self) -> Decimal {
        Decimal::ONE
    }
}

/// Cambridge Housing Authority rental assistance.
pub struct Cha {
    ami_percent: u8,
}

impl Default for Cha {
    fn default() -> Self {
        Self { ami_percent: 50 }
    }
}

impl ProgramCalculator for Cha {
    fn dependencies(&self) -> Vec<DataField> {
        vec![
            DataField::County,
            DataField::IncomeAmount,
            DataField::IncomeFrequency,
            DataField::HouseholdSize,
        ]
    }

    fn income_limit_queries(&self, household: &Household) -> Vec<IncomeLimitQuery> {
        vec![ami_query(household, HudDataset::Section8, self.ami_percent)]
    }

    fn household_eligible(&self, ctx: &CalcContext<'_>, e: &mut Eligibility) {
        let household = ctx.household;
        e.condition(in_city(household), Message::Location);

        let query = ami_query(household, HudDataset::Section8, self.ami_percent);
        match ctx.limits.get(&query) {
            Ok(max_income) => {
                let income = household.calc_gross_income(Timeframe::Yearly, &[IncomeFilter::All]);
                e.condition(income <= max_income, Message::Income { income, max_income });
            }
            Err(failure) => e.condition(false, Message::income_limit_unknown(failure)),
        }
    }

    fn household_amount(&self) -> Decimal {
        Decimal::ONE
    }
}
