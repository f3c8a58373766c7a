//! Benefits Eligibility Engine
//!
//! This crate decides which public assistance programs a household likely
//! qualifies for and estimates the yearly value of each. Programs are
//! expressed as [`calculation::ProgramCalculator`] implementations over a
//! read-only [`models::Household`]; PolicyEngine-backed programs share one
//! microsimulation round trip per household.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod dependencies;
pub mod error;
pub mod income_limits;
pub mod models;
pub mod policyengine;
