//! Adapter for the PolicyEngine microsimulation service.
//!
//! Calculators declare the variables they need as a [`PolicyEngineSpec`]. The
//! evaluator unions the specs of every active calculator, builds one
//! [`HouseholdDocument`] with [`build_document`], submits it through a
//! [`Simulator`] and hands the decoded [`SimulationOutput`] back to each
//! calculator.
//!
//! # Example
//!
//! ```no_run
//! use benefits_engine::config::ConfigLoader;
//! use benefits_engine::models::Household;
//! use benefits_engine::policyengine::{
//!     FallbackSimulator, PeInput, PeOutput, PolicyEngineSpec, Simulator, build_document,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::load("./config")?;
//! let settings = &config.settings().policy_engine;
//! let simulator = FallbackSimulator::from_settings(reqwest::Client::new(), settings);
//!
//! let spec = PolicyEngineSpec::new(&[PeInput::Age], &[PeOutput::Medicaid]);
//! let doc = build_document(&Household::new("IL"), &[&spec], &settings.period)?;
//! let output = simulator.calculate(&doc, &settings.period).await?;
//! println!("{:?}", output.document().people);
//! # Ok(())
//! # }
//! ```

mod builder;
mod client;
mod document;
mod response;
mod tax_unit;
mod variables;

pub use builder::{FAMILY_KEY, HOUSEHOLD_KEY, SPM_UNIT_KEY, build_document};
pub use client::{ApiSimulator, BearerTokenSource, FallbackSimulator, Simulator};
pub use document::{CalculateRequest, FieldMap, GroupUnit, HouseholdDocument};
pub use response::{SimulationOutput, as_decimal};
pub use tax_unit::{
    QUALIFYING_RELATIVE_INCOME_LIMIT, TaxAssignment, TaxRole, TaxUnitId, TaxUnitStructure,
};
pub use variables::{
    InputContext, PeInput, PeOutput, PeUnit, PeValue, PolicyEngineSpec, county_code,
};
