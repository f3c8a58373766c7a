//! HUD income limits API client.
//!
//! Lookups go county name → FIPS entity id (via the county list for the
//! state) → the entity's income limit data. Both steps are cached.
//!
//! Two datasets are supported:
//! - Multifamily Tax Subsidy Projects (MTSP): 20% to 80% tiers, plus the area
//!   median for 100%.
//! - Section 8: the 30%, 50% and 80% tiers used for housing vouchers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::cache::{CacheSource, TtlCache};
use super::county::normalize_county;
use crate::error::IncomeLimitError;

/// Largest household size HUD publishes.
pub const MAX_HOUSEHOLD_SIZE: usize = 8;

/// Which HUD table a lookup reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HudDataset {
    /// Multifamily Tax Subsidy Projects limits.
    Mtsp,
    /// Section 8 limits.
    Section8,
}

impl HudDataset {
    fn endpoint(self, entity_id: &str) -> String {
        match self {
            HudDataset::Mtsp => format!("mtspil/data/{entity_id}"),
            HudDataset::Section8 => format!("il/data/{entity_id}"),
        }
    }
}

/// One AMI lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AmiQuery {
    /// Table to read.
    pub dataset: HudDataset,
    /// Two-letter state code.
    pub state: String,
    /// County name, with or without the "County" suffix.
    pub county: String,
    /// Data year.
    pub year: u16,
    /// Percentage tier, e.g. 50 or 80. 100 reads the area median (MTSP only).
    pub percent: u8,
    /// Household size, 1..=8.
    pub household_size: usize,
}

/// A county in HUD's county list.
#[derive(Debug, Clone, Deserialize)]
pub struct HudCounty {
    /// e.g. "Middlesex County".
    pub county_name: String,
    /// FIPS entity id used by the data endpoints.
    pub fips_code: String,
}

struct HudApi {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HudApi {
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        year: u16,
        year_param: &str,
    ) -> Result<T, IncomeLimitError> {
        let token = self.token.as_deref().ok_or_else(|| {
            IncomeLimitError::unavailable("HUD API token is not configured")
        })?;

        let response = self
            .http
            .get(format!("{}/{endpoint}", self.base_url))
            .bearer_auth(token)
            .query(&[(year_param, year.to_string())])
            .send()
            .await
            .map_err(|e| IncomeLimitError::unavailable(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = match status.as_u16() {
                401 => "Authentication failed. Check the HUD API token is set and valid.".to_string(),
                403 => "Access denied. The HUD API token lacks access to this dataset.".to_string(),
                404 => format!("Not found: {endpoint}"),
                code => {
                    let body = response.text().await.unwrap_or_default();
                    format!("API request failed ({code}): {body}")
                }
            };
            return Err(IncomeLimitError::unavailable(message));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| IncomeLimitError::unavailable(format!("Invalid response: {e}")))
    }
}

struct CountyListSource(Arc<HudApi>);

#[async_trait]
impl CacheSource for CountyListSource {
    type Key = (String, u16);
    type Value = Vec<HudCounty>;
    type Error = IncomeLimitError;

    fn name(&self) -> &'static str {
        "hud_counties"
    }

    async fn update(&self, key: &(String, u16)) -> Result<Vec<HudCounty>, IncomeLimitError> {
        let (state, year) = key;
        let endpoint = format!("fmr/listCounties/{}", state.to_uppercase());
        self.0.get(&endpoint, *year, "updated").await
    }
}

struct LimitDataSource(Arc<HudApi>);

#[async_trait]
impl CacheSource for LimitDataSource {
    type Key = (HudDataset, String, u16);
    type Value = Value;
    type Error = IncomeLimitError;

    fn name(&self) -> &'static str {
        "hud_income_limits"
    }

    async fn update(&self, key: &(HudDataset, String, u16)) -> Result<Value, IncomeLimitError> {
        let (dataset, entity_id, year) = key;
        self.0.get(&dataset.endpoint(entity_id), *year, "year").await
    }
}

/// Cached HUD income limits client.
pub struct HudIncomeClient {
    counties: TtlCache<CountyListSource>,
    limits: TtlCache<LimitDataSource>,
}

impl HudIncomeClient {
    /// Creates a client. Without a token every lookup fails as unavailable.
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token: Option<String>,
        ttl: Duration,
    ) -> Self {
        let api = Arc::new(HudApi {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        });
        Self {
            counties: TtlCache::new(CountyListSource(Arc::clone(&api)), ttl),
            limits: TtlCache::new(LimitDataSource(api), ttl),
        }
    }

    /// Looks up one AMI income limit.
    pub async fn income_limit(&self, query: &AmiQuery) -> Result<Decimal, IncomeLimitError> {
        if query.household_size < 1 || query.household_size > MAX_HOUSEHOLD_SIZE {
            return Err(IncomeLimitError::HouseholdSizeOutOfRange {
                size: query.household_size,
                min: 1,
                max: MAX_HOUSEHOLD_SIZE,
            });
        }

        let entity_id = self.entity_id(&query.state, &query.county, query.year).await?;
        let data = self
            .limits
            .fetch(&(query.dataset, entity_id, query.year))
            .await;

        let area = data.get("data").ok_or_else(|| {
            IncomeLimitError::unavailable(format!(
                "No income limit data found for {}, {}",
                query.county, query.state
            ))
        })?;

        let value = match (query.dataset, query.percent) {
            (HudDataset::Mtsp, 100) => area.get("median_income"),
            (HudDataset::Mtsp, percent) => area
                .get(format!("{percent}percent"))
                .and_then(|tier| tier.get(format!("il{percent}_p{}", query.household_size))),
            (HudDataset::Section8, percent) => {
                area.get(format!("l{percent}_{}", query.household_size))
            }
        };

        value.and_then(decimal_from_json).ok_or_else(|| IncomeLimitError::MissingValue {
            detail: format!(
                "{}% AMI, household of {}",
                query.percent, query.household_size
            ),
        })
    }

    async fn entity_id(&self, state: &str, county: &str, year: u16) -> Result<String, IncomeLimitError> {
        let county = normalize_county(county);
        let counties = self.counties.fetch(&(state.to_uppercase(), year)).await;

        if counties.is_empty() {
            return Err(IncomeLimitError::unavailable(format!(
                "Could not retrieve counties for {state}"
            )));
        }

        counties
            .iter()
            .find(|c| c.county_name.eq_ignore_ascii_case(&county))
            .map(|c| c.fips_code.clone())
            .ok_or_else(|| IncomeLimitError::CountyNotFound {
                county,
                state: state.to_string(),
            })
    }
}

fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn query(dataset: HudDataset, percent: u8, household_size: usize) -> AmiQuery {
        AmiQuery {
            dataset,
            state: "MA".to_string(),
            county: "Middlesex".to_string(),
            year: 2025,
            percent,
            household_size,
        }
    }

    fn client(server: &MockServer) -> HudIncomeClient {
        HudIncomeClient::new(
            reqwest::Client::new(),
            server.uri(),
            Some("test_token".to_string()),
            Duration::from_secs(60),
        )
    }

    async fn mount_counties(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/fmr/listCounties/MA"))
            .and(query_param("updated", "2025"))
            .and(header("authorization", "Bearer test_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"county_name": "Middlesex County", "fips_code": "2501799999"},
                {"county_name": "Suffolk County", "fips_code": "2502599999"}
            ])))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_mtsp_lookup_reads_tier_field() {
        let server = MockServer::start().await;
        mount_counties(&server).await;
        Mock::given(method("GET"))
            .and(path("/mtspil/data/2501799999"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "80percent": {"il80_p3": 116_640},
                    "median_income": 160_900
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let limit = client.income_limit(&query(HudDataset::Mtsp, 80, 3)).await;
        assert_eq!(limit.unwrap(), dec("116640"));

        let median = client.income_limit(&query(HudDataset::Mtsp, 100, 3)).await;
        assert_eq!(median.unwrap(), dec("160900"));
    }

    #[tokio::test]
    async fn test_section8_lookup_reads_flat_field() {
        let server = MockServer::start().await;
        mount_counties(&server).await;
        Mock::given(method("GET"))
            .and(path("/il/data/2501799999"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"l50_2": "66550"}
            })))
            .mount(&server)
            .await;

        let limit = client(&server)
            .income_limit(&query(HudDataset::Section8, 50, 2))
            .await;
        assert_eq!(limit.unwrap(), dec("66550"));
    }

    #[tokio::test]
    async fn test_unknown_county_is_not_found() {
        let server = MockServer::start().await;
        mount_counties(&server).await;

        let mut q = query(HudDataset::Mtsp, 80, 2);
        q.county = "Atlantis".to_string();
        let error = client(&server).income_limit(&q).await.unwrap_err();
        assert_eq!(
            error,
            IncomeLimitError::CountyNotFound {
                county: "Atlantis County".to_string(),
                state: "MA".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_household_size_above_eight_is_rejected_without_request() {
        let server = MockServer::start().await;
        let error = client(&server)
            .income_limit(&query(HudDataset::Mtsp, 80, 9))
            .await
            .unwrap_err();
        assert!(matches!(error, IncomeLimitError::HouseholdSizeOutOfRange { size: 9, .. }));
    }

    #[tokio::test]
    async fn test_auth_failure_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let error = client(&server)
            .income_limit(&query(HudDataset::Mtsp, 80, 2))
            .await
            .unwrap_err();
        assert!(matches!(error, IncomeLimitError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_missing_tier_is_missing_value() {
        let server = MockServer::start().await;
        mount_counties(&server).await;
        Mock::given(method("GET"))
            .and(path("/mtspil/data/2501799999"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
            .mount(&server)
            .await;

        let error = client(&server)
            .income_limit(&query(HudDataset::Mtsp, 60, 2))
            .await
            .unwrap_err();
        assert!(matches!(error, IncomeLimitError::MissingValue { .. }));
    }
}
