//! One evaluation pass over a household.
//!
//! The pass selects the programs that apply to the household's state, makes
//! at most one PolicyEngine round trip for every PolicyEngine-backed program,
//! resolves the income limits the programs declared, then runs each
//! calculator in dependency order.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::calculator::{CalcContext, ProgramCalculator, Simulation, calculate};
use super::registry::calculator_for;
use super::schedule::run_order;
use crate::config::ConfigLoader;
use crate::dependencies::DependencyTracker;
use crate::error::EngineResult;
use crate::income_limits::{IncomeLimitProvider, IncomeLimitQuery, IncomeLimitService, ResolvedLimits};
use crate::models::{EligibilityReport, Household, ProgramEligibility, ProgramMetadata};
use crate::policyengine::{FallbackSimulator, PolicyEngineSpec, Simulator, build_document};

struct Program {
    metadata: ProgramMetadata,
    calculator: Box<dyn ProgramCalculator>,
}

impl Program {
    fn applies_to(&self, household: &Household) -> bool {
        self.metadata
            .state
            .as_ref()
            .is_none_or(|state| state.eq_ignore_ascii_case(&household.state))
    }
}

/// Evaluates households against every configured program.
///
/// # Example
///
/// ```no_run
/// use benefits_engine::calculation::Evaluator;
/// use benefits_engine::config::ConfigLoader;
/// use benefits_engine::models::{Household, HouseholdMember, MemberId, Relationship};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConfigLoader::load("./config")?;
/// let evaluator = Evaluator::from_config(&config)?;
///
/// let mut household = Household::new("IL");
/// household
///     .members
///     .push(HouseholdMember::new(MemberId(1), Relationship::HeadOfHousehold, Some(29)));
///
/// let report = evaluator.evaluate(&household).await?;
/// for program in report.programs.iter().filter(|p| p.eligible) {
///     println!("{}: ${}", program.name, program.value);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Evaluator {
    programs: Vec<Program>,
    simulator: Arc<dyn Simulator>,
    limits: Arc<dyn IncomeLimitProvider>,
    period: String,
}

impl Evaluator {
    /// Builds an evaluator for every program in `config`.
    ///
    /// Fails if a configured code has no calculator or if programs reference
    /// each other in a cycle.
    pub fn new(
        config: &ConfigLoader,
        simulator: Arc<dyn Simulator>,
        limits: Arc<dyn IncomeLimitProvider>,
    ) -> EngineResult<Self> {
        let mut programs = Vec::with_capacity(config.programs().len());
        for program in config.programs() {
            programs.push(Program {
                metadata: config.program_metadata(&program.code)?,
                calculator: calculator_for(&program.code)?,
            });
        }

        let order: Vec<usize> = {
            let graph: Vec<(&str, &[&str])> = programs
                .iter()
                .map(|p| (p.metadata.code.as_str(), p.calculator.references()))
                .collect();
            run_order(&graph)?
                .into_iter()
                .filter_map(|code| programs.iter().position(|p| p.metadata.code == code))
                .collect()
        };
        let mut slots: Vec<Option<Program>> = programs.into_iter().map(Some).collect();
        let programs = order.into_iter().filter_map(|i| slots[i].take()).collect();

        Ok(Self {
            programs,
            simulator,
            limits,
            period: config.settings().policy_engine.period.clone(),
        })
    }

    /// Builds an evaluator with the production PolicyEngine and income limit
    /// clients.
    pub fn from_config(config: &ConfigLoader) -> EngineResult<Self> {
        let http = reqwest::Client::new();
        let settings = config.settings();
        let simulator = FallbackSimulator::from_settings(http.clone(), &settings.policy_engine);
        let limits = IncomeLimitService::from_settings(http, settings);
        Self::new(config, Arc::new(simulator), Arc::new(limits))
    }

    /// Program codes in run order.
    pub fn program_codes(&self) -> Vec<&str> {
        self.programs.iter().map(|p| p.metadata.code.as_str()).collect()
    }

    /// Evaluates `household` with ages measured against today.
    pub async fn evaluate(&self, household: &Household) -> EngineResult<EligibilityReport> {
        self.evaluate_as_of(household, Utc::now().date_naive()).await
    }

    /// Evaluates `household` with ages measured against `as_of`.
    ///
    /// External service failures become failed conditions on the affected
    /// programs. Only configuration defects, such as two programs writing
    /// different values into one PolicyEngine field, return an error.
    pub async fn evaluate_as_of(
        &self,
        household: &Household,
        as_of: NaiveDate,
    ) -> EngineResult<EligibilityReport> {
        let evaluation_id = Uuid::new_v4();
        let start_time = Instant::now();
        info!(
            evaluation_id = %evaluation_id,
            household_id = %household.id,
            state = %household.state,
            members = household.members.len(),
            "Evaluating household"
        );

        let active: Vec<&Program> = self
            .programs
            .iter()
            .filter(|p| p.applies_to(household))
            .collect();
        debug!(
            evaluation_id = %evaluation_id,
            active = active.len(),
            skipped = self.programs.len() - active.len(),
            "Selected programs for state"
        );

        let specs: Vec<&PolicyEngineSpec> = active
            .iter()
            .filter_map(|p| p.calculator.policy_engine())
            .collect();
        let queries: Vec<IncomeLimitQuery> = active
            .iter()
            .flat_map(|p| p.calculator.income_limit_queries(household))
            .collect();

        let (simulation, limits) = tokio::join!(
            self.simulate(evaluation_id, household, &specs),
            ResolvedLimits::resolve(self.limits.as_ref(), &queries),
        );
        let simulation = simulation?;

        let mut results: BTreeMap<String, ProgramEligibility> = BTreeMap::new();
        let mut tracker = DependencyTracker::new();
        for program in &active {
            let code = &program.metadata.code;
            let ctx = CalcContext {
                household,
                program: &program.metadata,
                results: &results,
                simulation: &simulation,
                limits: &limits,
                as_of,
            };
            let result = calculate(program.calculator.as_ref(), &ctx);

            tracker.record(code, &program.calculator.dependencies());
            if let Some(spec) = program.calculator.policy_engine() {
                tracker.record(code, &spec.reads());
            }

            debug!(
                evaluation_id = %evaluation_id,
                program = %code,
                eligible = result.eligible,
                value = %result.value,
                "Program evaluated"
            );
            results.insert(code.clone(), result);
        }

        let programs: Vec<ProgramEligibility> = active
            .iter()
            .filter_map(|p| results.remove(&p.metadata.code))
            .collect();

        let duration = start_time.elapsed();
        let report = EligibilityReport {
            evaluation_id,
            household_id: household.id,
            evaluated_at: Utc::now(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            programs,
            dependencies: tracker.into_report(),
            duration_us: u64::try_from(duration.as_micros()).unwrap_or(u64::MAX),
        };

        info!(
            evaluation_id = %evaluation_id,
            eligible = report.programs.iter().filter(|p| p.eligible).count(),
            total_value = %report.total_value(),
            duration_us = report.duration_us,
            "Evaluation completed"
        );
        Ok(report)
    }

    async fn simulate(
        &self,
        evaluation_id: Uuid,
        household: &Household,
        specs: &[&PolicyEngineSpec],
    ) -> EngineResult<Simulation> {
        if specs.is_empty() {
            return Ok(Simulation::Skipped);
        }

        let document = build_document(household, specs, &self.period)?;
        match self.simulator.calculate(&document, &self.period).await {
            Ok(output) => Ok(Simulation::Ready(output)),
            Err(error) => {
                warn!(
                    evaluation_id = %evaluation_id,
                    error = %error,
                    "PolicyEngine simulation failed"
                );
                Ok(Simulation::Failed(error.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::calculator::test_support::{as_of, dec, fpl_2025};
    use crate::config::{FplConfig, ProgramConfig};
    use crate::error::{EngineError, IncomeLimitError, PolicyEngineError};
    use crate::models::{HouseholdMember, MemberId, Message, Relationship};
    use crate::policyengine::{HouseholdDocument, SimulationOutput};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    /// Echoes the request back with SNAP and Medicaid filled in.
    #[derive(Default)]
    struct FakeSimulator {
        fail: bool,
        calls: Mutex<Vec<HouseholdDocument>>,
    }

    #[async_trait]
    impl Simulator for FakeSimulator {
        fn name(&self) -> &str {
            "fake"
        }

        async fn calculate(
            &self,
            household: &HouseholdDocument,
            period: &str,
        ) -> Result<SimulationOutput, PolicyEngineError> {
            self.calls.lock().unwrap().push(household.clone());
            if self.fail {
                return Err(PolicyEngineError::AllEnginesFailed);
            }
            let mut doc = household.clone();
            for unit in doc.spm_units.values_mut() {
                unit.fields
                    .entry("snap".to_string())
                    .or_default()
                    .insert(period.to_string(), serde_json::json!(1200));
            }
            for person in doc.people.values_mut() {
                person
                    .entry("medicaid".to_string())
                    .or_default()
                    .insert(period.to_string(), serde_json::json!(5000));
                person
                    .entry("medicaid_category".to_string())
                    .or_default()
                    .insert(period.to_string(), serde_json::json!("PARENT"));
            }
            Ok(SimulationOutput::new(doc, period))
        }
    }

    struct NoLimits;

    #[async_trait]
    impl IncomeLimitProvider for NoLimits {
        async fn income_limit(&self, _query: &IncomeLimitQuery) -> Result<Decimal, IncomeLimitError> {
            Err(IncomeLimitError::unavailable("offline"))
        }
    }

    fn try_config(codes: &[(&str, Option<&str>)]) -> EngineResult<ConfigLoader> {
        let loaded = ConfigLoader::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config")).unwrap();
        let programs = codes
            .iter()
            .map(|(code, state)| ProgramConfig {
                code: code.to_string(),
                name: code.to_string(),
                state: state.map(str::to_string),
                fpl_year: "2025".to_string(),
            })
            .collect();
        let fpl = FplConfig {
            years: BTreeMap::from([("2025".to_string(), fpl_2025())]),
        };
        ConfigLoader::from_parts(loaded.settings().clone(), fpl, programs)
    }

    fn config(codes: &[(&str, Option<&str>)]) -> ConfigLoader {
        try_config(codes).unwrap()
    }

    fn evaluator(codes: &[(&str, Option<&str>)], simulator: Arc<FakeSimulator>) -> Evaluator {
        Evaluator::new(&config(codes), simulator, Arc::new(NoLimits)).unwrap()
    }

    fn family(state: &str) -> Household {
        let mut household = Household::new(state);
        household.members = vec![
            HouseholdMember::new(MemberId(1), Relationship::HeadOfHousehold, Some(31)),
            HouseholdMember::new(MemberId(2), Relationship::Child, Some(5)),
        ];
        household
    }

    #[test]
    fn test_programs_run_after_their_references() {
        let e = evaluator(
            &[
                ("il_moms_and_babies", Some("IL")),
                ("il_family_care", Some("IL")),
                ("medicaid", None),
            ],
            Arc::default(),
        );
        assert_eq!(
            e.program_codes(),
            vec!["medicaid", "il_family_care", "il_moms_and_babies"]
        );
    }

    #[test]
    fn test_unknown_program_fails_at_load() {
        let result = try_config(&[("medicaid", None), ("tx_lifeline", None)]);
        match result {
            Err(EngineError::UnknownProgram { code }) => assert_eq!(code, "tx_lifeline"),
            other => panic!("Expected UnknownProgram, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_one_round_trip_for_all_policyengine_programs() {
        let simulator = Arc::new(FakeSimulator::default());
        let e = evaluator(
            &[("medicaid", None), ("snap", None), ("nc_lieap", Some("NC"))],
            simulator.clone(),
        );
        let report = e.evaluate_as_of(&family("IL"), as_of()).await.unwrap();

        assert_eq!(simulator.calls.lock().unwrap().len(), 1);
        assert_eq!(report.programs.len(), 2);
        assert_eq!(report.program("snap").unwrap().value, dec("1200"));
        assert_eq!(
            report.program("medicaid").unwrap().value,
            Decimal::from(474 * 12 * 2)
        );
        assert!(report.program("nc_lieap").is_none());
    }

    #[tokio::test]
    async fn test_same_pass_results_feed_later_programs() {
        let e = evaluator(
            &[("il_family_care", Some("IL")), ("medicaid", None)],
            Arc::default(),
        );
        let report = e.evaluate_as_of(&family("IL"), as_of()).await.unwrap();
        assert_eq!(report.programs[0].code, "medicaid");
        assert!(report.program("il_family_care").unwrap().eligible);
    }

    #[tokio::test]
    async fn test_simulation_failure_degrades_to_condition() {
        let simulator = Arc::new(FakeSimulator {
            fail: true,
            ..Default::default()
        });
        let e = evaluator(&[("snap", None), ("il_all_kids", Some("IL"))], simulator);
        let report = e.evaluate_as_of(&family("IL"), as_of()).await.unwrap();

        let snap = report.program("snap").unwrap();
        assert!(!snap.eligible);
        assert!(matches!(
            snap.failed_messages()[0],
            Message::UnableToDetermine { .. }
        ));
        assert!(report.program("il_all_kids").unwrap().eligible);
    }

    #[tokio::test]
    async fn test_no_round_trip_without_policyengine_programs() {
        let simulator = Arc::new(FakeSimulator::default());
        let e = evaluator(&[("il_all_kids", Some("IL"))], simulator.clone());
        e.evaluate_as_of(&family("IL"), as_of()).await.unwrap();
        assert!(simulator.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_records_dependencies() {
        use crate::dependencies::DataField;

        let e = evaluator(
            &[("snap", None), ("co_weatherization_assistance", Some("CO"))],
            Arc::default(),
        );
        let mut household = family("CO");
        household.county = Some("Denver".to_string());
        let report = e.evaluate_as_of(&household, as_of()).await.unwrap();

        let weatherization = report.program("co_weatherization_assistance").unwrap();
        assert!(matches!(
            weatherization.conditions.conditions()[0].message,
            Some(Message::IncomeLimitUnknown { .. })
        ));
        assert!(weatherization.conditions.conditions()[0].passed);
        assert_eq!(
            report.dependencies.programs_reading(DataField::County),
            vec!["co_weatherization_assistance", "snap"]
        );
        assert_eq!(report.engine_version, env!("CARGO_PKG_VERSION"));
    }
}
