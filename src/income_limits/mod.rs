//! Published income limits.
//!
//! Calculators that need an externally published limit declare
//! [`IncomeLimitQuery`] values up front. The evaluator resolves them through an
//! [`IncomeLimitProvider`] before any calculator runs, so calculators stay
//! synchronous and read the answers from [`ResolvedLimits`].

mod cache;
mod county;
mod hud;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

pub use cache::{CacheSource, TtlCache};
pub use county::{CountyIncomeLimitSource, CountyLimitTable, normalize_county};
pub use hud::{AmiQuery, HudCounty, HudDataset, HudIncomeClient, MAX_HOUSEHOLD_SIZE};

use crate::config::EngineSettings;
use crate::error::IncomeLimitError;

/// One income limit a calculator needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IncomeLimitQuery {
    /// HUD area median income tier.
    Ami(AmiQuery),
    /// County table published by a state agency.
    County {
        /// Two-letter state code.
        state: String,
        /// County name.
        county: String,
        /// Household size.
        household_size: usize,
    },
}

/// Answers income limit queries.
#[async_trait]
pub trait IncomeLimitProvider: Send + Sync {
    /// Looks up one limit.
    async fn income_limit(&self, query: &IncomeLimitQuery) -> Result<Decimal, IncomeLimitError>;
}

/// Answers for every query declared in one pass.
#[derive(Debug, Clone, Default)]
pub struct ResolvedLimits {
    answers: HashMap<IncomeLimitQuery, Result<Decimal, IncomeLimitError>>,
}

impl ResolvedLimits {
    /// Resolves each distinct query once, in order.
    pub async fn resolve(provider: &dyn IncomeLimitProvider, queries: &[IncomeLimitQuery]) -> Self {
        let mut answers = HashMap::new();
        for query in queries {
            if answers.contains_key(query) {
                continue;
            }
            let answer = provider.income_limit(query).await;
            if let Err(error) = &answer {
                debug!(query = ?query, error = %error, "Income limit lookup failed");
            }
            answers.insert(query.clone(), answer);
        }
        Self { answers }
    }

    /// Records an answer directly.
    pub fn insert(&mut self, query: IncomeLimitQuery, answer: Result<Decimal, IncomeLimitError>) {
        self.answers.insert(query, answer);
    }

    /// The answer for `query`. Queries that were never resolved are unavailable.
    pub fn get(&self, query: &IncomeLimitQuery) -> Result<Decimal, IncomeLimitError> {
        self.answers.get(query).cloned().unwrap_or_else(|| {
            Err(IncomeLimitError::unavailable(format!(
                "income limit was not requested: {query:?}"
            )))
        })
    }
}

/// Production provider backed by HUD and the county spreadsheet.
pub struct IncomeLimitService {
    hud: HudIncomeClient,
    county_state: String,
    county: TtlCache<CountyIncomeLimitSource>,
}

impl IncomeLimitService {
    /// Builds the service from settings. The HUD token is read from the
    /// environment variable named in the settings.
    pub fn from_settings(http: reqwest::Client, settings: &EngineSettings) -> Self {
        let hud_token = std::env::var(&settings.hud.token_env).ok();
        let hud = HudIncomeClient::new(
            http.clone(),
            settings.hud.base_url.clone(),
            hud_token,
            Duration::from_secs(settings.hud.cache_ttl_secs),
        );
        let county = TtlCache::new(
            CountyIncomeLimitSource::new(http, settings.county_limits.csv_url.clone()),
            Duration::from_secs(settings.county_limits.cache_ttl_secs),
        );
        Self {
            hud,
            county_state: settings.county_limits.state.to_uppercase(),
            county,
        }
    }
}

#[async_trait]
impl IncomeLimitProvider for IncomeLimitService {
    async fn income_limit(&self, query: &IncomeLimitQuery) -> Result<Decimal, IncomeLimitError> {
        match query {
            IncomeLimitQuery::Ami(ami) => self.hud.income_limit(ami).await,
            IncomeLimitQuery::County {
                state,
                county,
                household_size,
            } => {
                if !state.eq_ignore_ascii_case(&self.county_state) {
                    return Err(IncomeLimitError::CountyNotFound {
                        county: normalize_county(county),
                        state: state.clone(),
                    });
                }
                self.county
                    .fetch(&())
                    .await
                    .lookup(county, state, *household_size)
            }
        }
    }
}
