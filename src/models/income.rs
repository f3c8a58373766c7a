//! Income streams and expenses.
//!
//! Amounts are reported at whatever frequency the household chose and are
//! normalised on read through [`Timeframe`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How often a reported amount recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Frequency {
    /// Every week.
    Weekly,
    /// Every two weeks.
    Biweekly,
    /// Twice a month.
    Semimonthly,
    /// Every month.
    Monthly,
    /// Once a year.
    Yearly,
    /// Paid per hour; requires `hours_worked` per week.
    Hourly,
}

impl Frequency {
    /// Number of occurrences in a year. Hourly streams are converted
    /// separately from their weekly hours.
    pub fn per_year(self) -> Decimal {
        match self {
            Frequency::Weekly => Decimal::from(52),
            Frequency::Biweekly => Decimal::from(26),
            Frequency::Semimonthly => Decimal::from(24),
            Frequency::Monthly => Decimal::from(12),
            Frequency::Yearly => Decimal::ONE,
            Frequency::Hourly => Decimal::from(52),
        }
    }
}

/// The window an aggregate is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    /// Per month.
    Monthly,
    /// Per year.
    Yearly,
}

impl Timeframe {
    /// Converts a yearly amount into this timeframe.
    pub fn from_yearly(self, yearly: Decimal) -> Decimal {
        match self {
            Timeframe::Monthly => yearly / Decimal::from(12),
            Timeframe::Yearly => yearly,
        }
    }
}

/// The source of an income stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IncomeType {
    /// Wages or salary.
    Wages,
    /// Self-employment earnings.
    SelfEmployment,
    /// Rental income.
    Rental,
    /// Pension payments.
    Pension,
    /// Veteran's pension or compensation.
    Veteran,
    /// Social Security disability (SSDI).
    #[serde(rename = "sSDisability")]
    SsDisability,
    /// Social Security survivor benefits.
    #[serde(rename = "sSSurvivor")]
    SsSurvivor,
    /// Social Security retirement benefits.
    #[serde(rename = "sSRetirement")]
    SsRetirement,
    /// Social Security dependent benefits.
    #[serde(rename = "sSDependent")]
    SsDependent,
    /// Supplemental Security Income.
    #[serde(rename = "sSI")]
    Ssi,
    /// Interest, dividends and capital gains.
    Investment,
    /// Gifts and contributions.
    Gifts,
    /// Unemployment insurance.
    Unemployment,
    /// Workers' compensation.
    WorkersComp,
    /// Alimony received.
    Alimony,
    /// Retirement account distributions.
    DeferredComp,
    /// Child support received.
    ChildSupport,
    /// Cash assistance such as TANF.
    CashAssistance,
    /// Anything else.
    Other,
}

impl IncomeType {
    /// Returns true for income earned through work.
    pub fn is_earned(self) -> bool {
        matches!(self, IncomeType::Wages | IncomeType::SelfEmployment)
    }

    /// Social Security benefits other than SSI.
    pub const SOCIAL_SECURITY: [IncomeType; 4] = [
        IncomeType::SsDisability,
        IncomeType::SsSurvivor,
        IncomeType::SsRetirement,
        IncomeType::SsDependent,
    ];
}

/// Selects which income streams an aggregate includes.
///
/// # Example
///
/// ```
/// use benefits_engine::models::{IncomeFilter, IncomeType};
///
/// assert!(IncomeFilter::Earned.matches(IncomeType::Wages));
/// assert!(!IncomeFilter::Earned.matches(IncomeType::Ssi));
/// assert!(IncomeFilter::All.matches(IncomeType::Ssi));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomeFilter {
    /// Every stream.
    All,
    /// Wages and self-employment.
    Earned,
    /// Everything not earned.
    Unearned,
    /// One specific type.
    Only(IncomeType),
}

impl IncomeFilter {
    /// Returns true if streams of `income_type` pass this filter.
    pub fn matches(self, income_type: IncomeType) -> bool {
        match self {
            IncomeFilter::All => true,
            IncomeFilter::Earned => income_type.is_earned(),
            IncomeFilter::Unearned => !income_type.is_earned(),
            IncomeFilter::Only(t) => t == income_type,
        }
    }
}

/// A single reported income stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStream {
    /// Where the money comes from.
    #[serde(rename = "type")]
    pub income_type: IncomeType,
    /// Amount per `frequency`.
    pub amount: Decimal,
    /// How often `amount` is received.
    pub frequency: Frequency,
    /// Hours worked per week, for hourly streams.
    #[serde(default)]
    pub hours_worked: Option<Decimal>,
}

impl IncomeStream {
    /// Annualised amount. Hourly streams without hours count as zero.
    pub fn yearly(&self) -> Decimal {
        match self.frequency {
            Frequency::Hourly => {
                self.amount * self.hours_worked.unwrap_or(Decimal::ZERO) * Decimal::from(52)
            }
            frequency => self.amount * frequency.per_year(),
        }
    }
}

/// The kind of recurring household expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpenseType {
    /// Rent.
    Rent,
    /// Mortgage payments.
    Mortgage,
    /// Heating.
    Heating,
    /// Cooling.
    Cooling,
    /// Out-of-pocket medical costs.
    Medical,
    /// Child care.
    ChildCare,
    /// Child support paid.
    ChildSupport,
    /// Property taxes.
    PropertyTax,
    /// Rent in subsidized housing.
    SubsidizedRent,
    /// Telephone.
    Telephone,
    /// Homeowners association fees.
    HoaFees,
    /// Homeowners insurance.
    HomeownersInsurance,
    /// Anything else.
    Other,
}

/// A recurring expense reported by the household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// What the expense is for.
    #[serde(rename = "type")]
    pub expense_type: ExpenseType,
    /// Amount per `frequency`.
    pub amount: Decimal,
    /// How often it is paid.
    pub frequency: Frequency,
}

impl Expense {
    /// Annualised amount.
    pub fn yearly(&self) -> Decimal {
        self.amount * self.frequency.per_year()
    }
}
