//! Structured eligibility messages.
//!
//! A [`Message`] is a kind plus its parameters. Rendering into text happens
//! through [`Message::parts`], which yields translatable fragments keyed by
//! label with an English default, interleaved with formatted values.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::IncomeLimitError;

/// Why a condition failed, in a form that can be localized.
///
/// # Example
///
/// ```
/// use benefits_engine::models::Message;
/// use rust_decimal::Decimal;
///
/// let message = Message::Income {
///     income: Decimal::from(32_000),
///     max_income: Decimal::from(29_187),
/// };
/// assert_eq!(
///     message.to_string(),
///     "Household makes $32000 per year which must be less than $29187"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    /// Income is above a ceiling.
    Income {
        /// Household income per year.
        income: Decimal,
        /// The ceiling.
        max_income: Decimal,
    },
    /// Income must fall inside a band.
    IncomeRange {
        /// Household income per year.
        income: Decimal,
        /// The floor.
        min_income: Decimal,
        /// The ceiling.
        max_income: Decimal,
    },
    /// A published income limit could not be looked up.
    IncomeLimitUnknown {
        /// The lookup failure, when there is one.
        failure: Option<IncomeLimitError>,
    },
    /// The microsimulation service could not compute this program.
    UnableToDetermine {
        /// A description of the failure.
        detail: String,
    },
    /// Eligible through enrollment in another program.
    PresumedEligibility,
    /// Assets above a ceiling.
    Assets {
        /// The ceiling.
        asset_limit: Decimal,
    },
    /// Needs a child in an age band.
    Child {
        /// Youngest qualifying age.
        min_age: u32,
        /// Oldest qualifying age.
        max_age: u32,
    },
    /// Needs a member in an age band.
    Adult {
        /// Youngest qualifying age.
        min_age: u32,
        /// Oldest qualifying age.
        max_age: u32,
    },
    /// Needs a member at least this old.
    OlderThan {
        /// The minimum age.
        min_age: u32,
    },
    /// Must already receive another benefit.
    MustHaveBenefit {
        /// Display name of the benefit.
        benefit: String,
    },
    /// Must not already receive another benefit.
    MustNotHaveBenefit {
        /// Display name of the benefit.
        benefit: String,
    },
    /// Outside the service area.
    Location,
    /// Needs a member with a disability.
    HasDisability,
    /// Needs an uninsured member.
    HasNoInsurance,
    /// Needs a pregnant member.
    IsPregnant,
    /// Needs rent or mortgage costs.
    HousingCost,
}

/// One fragment of a rendered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessagePart {
    /// Translatable text.
    Translation {
        /// Translation key, e.g. `eligibility_message.income-0`.
        label: String,
        /// English text.
        default_message: String,
    },
    /// A formatted value inserted between translations.
    Text(String),
}

fn t(name: &str, i: u32, default_message: &str) -> MessagePart {
    MessagePart::Translation {
        label: format!("eligibility_message.{name}-{i}"),
        default_message: default_message.to_string(),
    }
}

fn dollars(amount: Decimal) -> String {
    format!(" ${}", amount.round())
}

impl Message {
    /// The message kind as its translation namespace.
    pub fn label(&self) -> &'static str {
        match self {
            Message::Income { .. } => "income",
            Message::IncomeRange { .. } => "income_range",
            Message::IncomeLimitUnknown { .. } => "income_limit_lookup_failed",
            Message::UnableToDetermine { .. } => "unable_to_determine",
            Message::PresumedEligibility => "presumptive_eligibility",
            Message::Assets { .. } => "assets",
            Message::Child { .. } => "child",
            Message::Adult { .. } => "adult",
            Message::OlderThan { .. } => "older_than",
            Message::MustHaveBenefit { .. } => "has_benefit",
            Message::MustNotHaveBenefit { .. } => "not_have_benefit",
            Message::Location => "location",
            Message::HasDisability => "disability",
            Message::HasNoInsurance => "no_insurance",
            Message::IsPregnant => "pregnant",
            Message::HousingCost => "housing_cost",
        }
    }

    /// Translatable fragments with interpolated values.
    pub fn parts(&self) -> Vec<MessagePart> {
        match self {
            Message::Income { income, max_income } => vec![
                t("income", 0, "Household makes"),
                MessagePart::Text(format!("{} ", dollars(*income))),
                t("income", 1, "per year which must be less than"),
                MessagePart::Text(dollars(*max_income)),
            ],
            Message::IncomeRange {
                income,
                min_income,
                max_income,
            } => vec![
                t("income", 0, "Household makes"),
                MessagePart::Text(format!("{} ", dollars(*income))),
                t("income_range", 0, "per year which must be between"),
                MessagePart::Text(format!("{} ", dollars(*min_income))),
                t("income_range", 1, "and"),
                MessagePart::Text(dollars(*max_income)),
            ],
            Message::IncomeLimitUnknown { .. } => vec![t(
                "income_limit_lookup_failed",
                0,
                "Unable to determine income limits for your household",
            )],
            Message::UnableToDetermine { .. } => vec![t(
                "unable_to_determine",
                0,
                "Unable to determine eligibility for this program right now",
            )],
            Message::PresumedEligibility => vec![t(
                "presumptive_eligibility",
                0,
                "Presumed eligibility based on other benefits",
            )],
            Message::Assets { asset_limit } => vec![
                t("assets", 0, "Household resources must not exceed"),
                MessagePart::Text(dollars(*asset_limit)),
            ],
            Message::Child { min_age, max_age } => vec![
                t("child", 0, "Must have a child between the ages of"),
                MessagePart::Text(format!(" {min_age} ")),
                t("child", 1, "and"),
                MessagePart::Text(format!(" {max_age}")),
            ],
            Message::Adult { min_age, max_age } => vec![
                t("adult", 0, "Someone in the household must be between the ages of"),
                MessagePart::Text(format!(" {min_age} ")),
                t("adult", 1, "and"),
                MessagePart::Text(format!(" {max_age}")),
            ],
            Message::OlderThan { min_age } => vec![
                t("older_than", 0, "Someone in the household must be at least"),
                MessagePart::Text(format!(" {min_age} ")),
                t("older_than", 1, "years old"),
            ],
            Message::MustHaveBenefit { benefit } => vec![
                t("has_benefit", 0, "Household must have"),
                MessagePart::Text(format!(" {benefit}")),
            ],
            Message::MustNotHaveBenefit { benefit } => vec![
                t("not_have_benefit", 0, "Household must not have"),
                MessagePart::Text(format!(" {benefit}")),
            ],
            Message::Location => vec![t("location", 0, "Must live in an eligible location")],
            Message::HasDisability => vec![t(
                "disability",
                0,
                "Someone in the household must have a disability",
            )],
            Message::HasNoInsurance => vec![t(
                "no_insurance",
                0,
                "Someone in the household must not have health insurance",
            )],
            Message::IsPregnant => vec![t(
                "pregnant",
                0,
                "Someone in the household must be pregnant",
            )],
            Message::HousingCost => vec![t(
                "housing_cost",
                0,
                "Household must pay rent or a mortgage",
            )],
        }
    }

    /// Failure raised by an income limit lookup.
    pub fn income_limit_unknown(failure: IncomeLimitError) -> Self {
        Message::IncomeLimitUnknown {
            failure: Some(failure),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in self.parts() {
            match part {
                MessagePart::Translation {
                    default_message, ..
                } => f.write_str(&default_message)?,
                MessagePart::Text(text) => f.write_str(&text)?,
            }
        }
        Ok(())
    }
}
