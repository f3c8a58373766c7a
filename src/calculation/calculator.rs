//! The program calculator contract.
//!
//! A calculator is a synchronous, pure function of the household, the
//! program's metadata, pre-resolved external data and the results of programs
//! that ran earlier in the same pass. [`calculate`] drives one calculator and
//! folds its household and member conditions into a [`ProgramEligibility`].

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::dependencies::DataField;
use crate::income_limits::{IncomeLimitQuery, ResolvedLimits};
use crate::models::{
    Eligibility, Household, HouseholdMember, MemberEligibility, Message, ProgramEligibility,
    ProgramMetadata,
};
use crate::policyengine::{PolicyEngineSpec, SimulationOutput};

/// Outcome of the pass's PolicyEngine round trip.
#[derive(Debug, Clone, Default)]
pub enum Simulation {
    /// No active calculator needed PolicyEngine.
    #[default]
    Skipped,
    /// Outputs are available.
    Ready(SimulationOutput),
    /// The call failed; the message is shown to the household.
    Failed(String),
}

impl Simulation {
    /// The outputs, if the call succeeded.
    pub fn output(&self) -> Option<&SimulationOutput> {
        match self {
            Simulation::Ready(output) => Some(output),
            _ => None,
        }
    }
}

/// Everything a calculator can read.
#[derive(Debug, Clone, Copy)]
pub struct CalcContext<'a> {
    /// The household being evaluated.
    pub household: &'a Household,
    /// The program being evaluated.
    pub program: &'a ProgramMetadata,
    /// Results of programs that already ran in this pass.
    pub results: &'a BTreeMap<String, ProgramEligibility>,
    /// PolicyEngine outputs for this pass.
    pub simulation: &'a Simulation,
    /// Income limits resolved for this pass.
    pub limits: &'a ResolvedLimits,
    /// Date ages in months are measured against.
    pub as_of: NaiveDate,
}

impl CalcContext<'_> {
    /// True if `code` already ran in this pass and was eligible. Programs
    /// that have not run read as ineligible.
    pub fn eligible_for(&self, code: &str) -> bool {
        self.results.get(code).is_some_and(|r| r.eligible)
    }

    /// True if `member` was eligible for `code` earlier in this pass.
    pub fn member_eligible_for(&self, code: &str, member: &HouseholdMember) -> bool {
        self.results.get(code).is_some_and(|r| {
            r.eligible && r.members.iter().any(|m| m.member_id == member.id && m.eligible())
        })
    }

    /// PolicyEngine outputs, if the pass has them.
    pub fn output(&self) -> Option<&SimulationOutput> {
        self.simulation.output()
    }
}

/// One program's eligibility rules.
///
/// Only [`ProgramCalculator::household_eligible`] and
/// [`ProgramCalculator::dependencies`] are required. A calculator that is not
/// member-scoped treats every member as eligible.
pub trait ProgramCalculator: Send + Sync {
    /// Household fields the rules read.
    fn dependencies(&self) -> Vec<DataField>;

    /// Codes of programs whose same-pass result the rules read.
    fn references(&self) -> &'static [&'static str] {
        &[]
    }

    /// PolicyEngine variables, for PolicyEngine-backed programs.
    fn policy_engine(&self) -> Option<&PolicyEngineSpec> {
        None
    }

    /// Published income limits the rules need for `household`.
    fn income_limit_queries(&self, _household: &Household) -> Vec<IncomeLimitQuery> {
        Vec::new()
    }

    /// Records household-level conditions.
    fn household_eligible(&self, ctx: &CalcContext<'_>, e: &mut Eligibility);

    /// True if the program needs at least one eligible member.
    fn member_scoped(&self) -> bool {
        false
    }

    /// Records conditions for one member.
    fn member_eligible(&self, _ctx: &CalcContext<'_>, _member: &HouseholdMember, _e: &mut Eligibility) {}

    /// Fixed household amount.
    fn household_amount(&self) -> Decimal {
        Decimal::ZERO
    }

    /// Fixed amount per eligible member.
    fn member_amount(&self) -> Decimal {
        Decimal::ZERO
    }

    /// Annual household value. Only called once the program is eligible.
    fn household_value(&self, _ctx: &CalcContext<'_>) -> Decimal {
        self.household_amount()
    }

    /// Annual value for one eligible member. Only called once the program is
    /// eligible.
    fn member_value(&self, _ctx: &CalcContext<'_>, _member: &HouseholdMember) -> Decimal {
        self.member_amount()
    }
}

/// Runs one calculator.
///
/// Every condition the calculator declares is recorded. The program is
/// eligible when the household conditions pass and, for member-scoped
/// programs, at least one member passes. Value is computed only when eligible.
pub fn calculate(calculator: &dyn ProgramCalculator, ctx: &CalcContext<'_>) -> ProgramEligibility {
    let mut conditions = Eligibility::new();

    if calculator.policy_engine().is_some() {
        if let Simulation::Failed(detail) = ctx.simulation {
            conditions.condition(
                false,
                Message::UnableToDetermine {
                    detail: detail.clone(),
                },
            );
        }
    }

    calculator.household_eligible(ctx, &mut conditions);

    let member_scoped = calculator.member_scoped();
    let mut members: Vec<MemberEligibility> = Vec::new();
    if member_scoped {
        for member in &ctx.household.members {
            let mut e = Eligibility::new();
            calculator.member_eligible(ctx, member, &mut e);
            members.push(MemberEligibility {
                member_id: member.id,
                conditions: e,
                value: Decimal::ZERO,
            });
        }
    }

    let eligible =
        conditions.passed() && (!member_scoped || members.iter().any(MemberEligibility::eligible));

    let mut value = Decimal::ZERO;
    if eligible {
        value = calculator.household_value(ctx);
        for (outcome, member) in members.iter_mut().zip(&ctx.household.members) {
            if outcome.eligible() {
                outcome.value = calculator.member_value(ctx, member);
                value += outcome.value;
            }
        }
    }

    ProgramEligibility {
        code: ctx.program.code.clone(),
        name: ctx.program.name.clone(),
        eligible,
        value,
        conditions,
        members,
    }
}
