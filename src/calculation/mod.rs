//! Eligibility calculation for the Benefits Eligibility Engine.
//!
//! This module contains the calculator contract, the reusable rule
//! strategies, every concrete program calculator, the closed registration
//! table, the run-order schedule for programs that read each other's results,
//! and the [`Evaluator`] that drives one pass over a household.

mod calculator;
mod evaluator;
pub mod programs;
mod registry;
mod rules;
mod schedule;

pub use calculator::{CalcContext, ProgramCalculator, Simulation, calculate};
pub use evaluator::Evaluator;
pub use registry::{calculator_for, registered_codes};
pub use rules::{AgeDisabilityRule, FplIncomeCheck};
pub use schedule::run_order;
