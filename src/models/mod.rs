//! Core data models for the Benefits Eligibility Engine.
//!
//! This module contains the household snapshot the engine reads and the
//! eligibility outcomes it produces.

mod eligibility;
mod household;
mod income;
mod member;
mod message;
mod program;

pub use eligibility::{
    Condition, Eligibility, EligibilityReport, MemberEligibility, ProgramEligibility,
};
pub use household::Household;
pub use income::{
    Expense, ExpenseType, Frequency, IncomeFilter, IncomeStream, IncomeType, Timeframe,
};
pub use member::{
    BirthYearMonth, HouseholdMember, Insurance, InsuranceType, MemberId, Relationship,
};
pub use message::{Message, MessagePart};
pub use program::ProgramMetadata;
