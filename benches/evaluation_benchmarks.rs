//! Performance benchmarks for the benefits eligibility engine.
//!
//! This benchmark suite tracks the cost of the local work in an evaluation
//! pass, with PolicyEngine answered from memory:
//! - Building the PolicyEngine document for every PolicyEngine-backed program
//! - A full pass for households of increasing size
//! - A batch of 100 passes
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;

use benefits_engine::calculation::{Evaluator, calculator_for, registered_codes};
use benefits_engine::config::ConfigLoader;
use benefits_engine::error::{IncomeLimitError, PolicyEngineError};
use benefits_engine::income_limits::{IncomeLimitProvider, IncomeLimitQuery};
use benefits_engine::models::{
    Frequency, Household, HouseholdMember, IncomeStream, IncomeType, MemberId, Relationship,
};
use benefits_engine::policyengine::{
    HouseholdDocument, PolicyEngineSpec, SimulationOutput, Simulator, build_document,
};

/// Echoes the request document back as the simulation result.
struct EchoSimulator;

#[async_trait]
impl Simulator for EchoSimulator {
    fn name(&self) -> &str {
        "echo"
    }

    async fn calculate(
        &self,
        household: &HouseholdDocument,
        period: &str,
    ) -> Result<SimulationOutput, PolicyEngineError> {
        Ok(SimulationOutput::new(household.clone(), period))
    }
}

/// Answers every income limit query with the same amount.
struct FlatLimits;

#[async_trait]
impl IncomeLimitProvider for FlatLimits {
    async fn income_limit(&self, _query: &IncomeLimitQuery) -> Result<Decimal, IncomeLimitError> {
        Ok(Decimal::from(60_000))
    }
}

/// Creates an evaluator over the shipped configuration.
fn create_evaluator() -> Evaluator {
    let config = ConfigLoader::load("./config").expect("Failed to load config");
    Evaluator::new(&config, Arc::new(EchoSimulator), Arc::new(FlatLimits))
        .expect("Failed to build evaluator")
}

/// Creates a working parent with `children` children.
fn create_household(state: &str, children: u32) -> Household {
    let mut household = Household::new(state);
    household.county = Some("Cook".to_string());

    let mut head = HouseholdMember::new(MemberId(1), Relationship::HeadOfHousehold, Some(34));
    head.income_streams.push(IncomeStream {
        income_type: IncomeType::Wages,
        amount: Decimal::from(2100),
        frequency: Frequency::Monthly,
        hours_worked: None,
    });
    household.members.push(head);

    for i in 0..children {
        household.members.push(HouseholdMember::new(
            MemberId(i + 2),
            Relationship::Child,
            Some(1 + i * 3),
        ));
    }
    household
}

fn all_specs() -> Vec<PolicyEngineSpec> {
    registered_codes()
        .into_iter()
        .filter_map(|code| calculator_for(code).ok())
        .filter_map(|calc| calc.policy_engine().cloned())
        .collect()
}

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

fn bench_build_document(c: &mut Criterion) {
    let specs = all_specs();
    let refs: Vec<&PolicyEngineSpec> = specs.iter().collect();
    let mut group = c.benchmark_group("build_document");

    for children in [0u32, 2, 6] {
        let household = create_household("IL", children);
        group.bench_with_input(
            BenchmarkId::from_parameter(household.members.len()),
            &household,
            |b, household| {
                b.iter(|| build_document(black_box(household), &refs, "2025"));
            },
        );
    }

    group.finish();
}

fn bench_evaluation(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to build runtime");
    let evaluator = create_evaluator();
    let mut group = c.benchmark_group("evaluation");

    for children in [0u32, 2, 6] {
        let household = create_household("IL", children);
        group.bench_with_input(
            BenchmarkId::new("illinois_household", household.members.len()),
            &household,
            |b, household| {
                b.to_async(&runtime)
                    .iter(|| evaluator.evaluate_as_of(black_box(household), as_of()));
            },
        );
    }

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to build runtime");
    let evaluator = create_evaluator();
    let households: Vec<Household> = ["IL", "CO", "NC", "MA"]
        .iter()
        .cycle()
        .take(100)
        .enumerate()
        .map(|(i, state)| create_household(state, (i % 4) as u32))
        .collect();

    let mut group = c.benchmark_group("batch");
    group.throughput(Throughput::Elements(households.len() as u64));
    group.bench_function("100_households", |b| {
        b.to_async(&runtime).iter(|| async {
            for household in &households {
                let _ = evaluator.evaluate_as_of(black_box(household), as_of()).await;
            }
        });
    });
    group.finish();
}

criterion_group!(benches, bench_build_document, bench_evaluation, bench_batch);
criterion_main!(benches);
