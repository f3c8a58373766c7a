//! HTTP clients for the PolicyEngine calculate API.
//!
//! The private API needs an OAuth client-credentials token, cached for most of
//! its lifetime. The public API needs nothing. [`FallbackSimulator`] tries
//! each configured endpoint in order and fails only when every one fails.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::document::{CalculateRequest, HouseholdDocument};
use super::response::SimulationOutput;
use crate::config::PolicyEngineSettings;
use crate::error::PolicyEngineError;
use crate::income_limits::{CacheSource, TtlCache};

const MAX_ERROR_BODY: usize = 500;

/// Something that can run a PolicyEngine simulation.
#[async_trait]
pub trait Simulator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Runs the simulation for `household`, reading outputs at `period`.
    async fn calculate(
        &self,
        household: &HouseholdDocument,
        period: &str,
    ) -> Result<SimulationOutput, PolicyEngineError>;
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    audience: &'a str,
    grant_type: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Fetches access tokens for the private API.
pub struct BearerTokenSource {
    http: reqwest::Client,
    auth_url: String,
    client_id: String,
    client_secret: String,
    audience: String,
}

impl BearerTokenSource {
    /// Creates a token source.
    pub fn new(
        http: reqwest::Client,
        auth_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            http,
            auth_url: auth_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            audience: audience.into(),
        }
    }
}

#[async_trait]
impl CacheSource for BearerTokenSource {
    type Key = ();
    type Value = String;
    type Error = PolicyEngineError;

    fn name(&self) -> &'static str {
        "policyengine_token"
    }

    async fn update(&self, _key: &()) -> Result<String, PolicyEngineError> {
        let response = self
            .http
            .post(&self.auth_url)
            .json(&TokenRequest {
                client_id: &self.client_id,
                client_secret: &self.client_secret,
                audience: &self.audience,
                grant_type: "client_credentials",
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status.as_u16(), response).await);
        }

        let token: TokenResponse = response.json().await.map_err(|e| PolicyEngineError::Decode {
            message: e.to_string(),
        })?;
        debug!("Fetched PolicyEngine access token");
        Ok(token.access_token)
    }
}

async fn status_error(status: u16, response: reqwest::Response) -> PolicyEngineError {
    let body = response.text().await.unwrap_or_default();
    PolicyEngineError::Status {
        status,
        body: body.chars().take(MAX_ERROR_BODY).collect(),
    }
}

/// One calculate endpoint.
pub struct ApiSimulator {
    name: &'static str,
    http: reqwest::Client,
    url: String,
    timeout: Duration,
    tokens: Option<TtlCache<BearerTokenSource>>,
}

impl ApiSimulator {
    /// The unauthenticated public endpoint.
    pub fn public(http: reqwest::Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name: "public",
            http,
            url: url.into(),
            timeout,
            tokens: None,
        }
    }

    /// The private endpoint, authenticated with tokens from `tokens`.
    pub fn private(
        http: reqwest::Client,
        url: impl Into<String>,
        timeout: Duration,
        tokens: TtlCache<BearerTokenSource>,
    ) -> Self {
        Self {
            name: "private",
            http,
            url: url.into(),
            timeout,
            tokens: Some(tokens),
        }
    }

    async fn post(
        &self,
        household: &HouseholdDocument,
        token: Option<&str>,
        period: &str,
    ) -> Result<SimulationOutput, PolicyEngineError> {
        let mut request = self
            .http
            .post(&self.url)
            .timeout(self.timeout)
            .json(&CalculateRequest { household });
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status.as_u16(), response).await);
        }

        let body = response.bytes().await?;
        SimulationOutput::from_body(&body, period)
    }
}

#[async_trait]
impl Simulator for ApiSimulator {
    fn name(&self) -> &str {
        self.name
    }

    async fn calculate(
        &self,
        household: &HouseholdDocument,
        period: &str,
    ) -> Result<SimulationOutput, PolicyEngineError> {
        let Some(tokens) = &self.tokens else {
            return self.post(household, None, period).await;
        };

        let token = current_token(tokens).await?;
        match self.post(household, Some(&token), period).await {
            Err(PolicyEngineError::Status { status: 401, .. }) => {
                warn!(engine = self.name, "Access token rejected; refreshing and retrying");
                tokens.invalidate(&());
                let token = current_token(tokens).await?;
                self.post(household, Some(&token), period).await
            }
            result => result,
        }
    }
}

async fn current_token(tokens: &TtlCache<BearerTokenSource>) -> Result<String, PolicyEngineError> {
    let token = tokens.fetch(&()).await;
    if token.is_empty() {
        return Err(PolicyEngineError::MissingCredentials);
    }
    Ok(token.as_str().to_string())
}

/// Tries each engine in order.
pub struct FallbackSimulator {
    engines: Vec<Box<dyn Simulator>>,
}

impl FallbackSimulator {
    /// Creates a fallback chain.
    pub fn new(engines: Vec<Box<dyn Simulator>>) -> Self {
        Self { engines }
    }

    /// Private endpoint first when credentials are configured, then public.
    pub fn from_settings(http: reqwest::Client, settings: &PolicyEngineSettings) -> Self {
        let mut engines: Vec<Box<dyn Simulator>> = Vec::new();

        let client_id = std::env::var(&settings.client_id_env).ok();
        let client_secret = std::env::var(&settings.client_secret_env).ok();
        if let (Some(url), Some(auth_url), Some(id), Some(secret)) = (
            &settings.private_url,
            &settings.auth_url,
            client_id,
            client_secret,
        ) {
            let source = BearerTokenSource::new(
                http.clone(),
                auth_url.clone(),
                id,
                secret,
                settings.audience.clone().unwrap_or_default(),
            );
            engines.push(Box::new(ApiSimulator::private(
                http.clone(),
                url.clone(),
                settings.timeout(),
                TtlCache::new(source, settings.token_ttl()),
            )));
        }

        engines.push(Box::new(ApiSimulator::public(
            http,
            settings.public_url.clone(),
            settings.timeout(),
        )));

        Self::new(engines)
    }

    /// Names of the engines, in the order they are tried.
    pub fn engine_names(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }
}

#[async_trait]
impl Simulator for FallbackSimulator {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn calculate(
        &self,
        household: &HouseholdDocument,
        period: &str,
    ) -> Result<SimulationOutput, PolicyEngineError> {
        for engine in &self.engines {
            match engine.calculate(household, period).await {
                Ok(output) => {
                    debug!(engine = engine.name(), "PolicyEngine calculation succeeded");
                    return Ok(output);
                }
                Err(error) => {
                    warn!(engine = engine.name(), error = %error, "PolicyEngine calculation failed");
                }
            }
        }
        Err(PolicyEngineError::AllEnginesFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn ok_body() -> serde_json::Value {
        json!({"result": {"people": {"1": {"medicaid": {"2025": 1000}}}}})
    }

    fn token_cache(server: &MockServer, ttl: Duration) -> TtlCache<BearerTokenSource> {
        TtlCache::new(
            BearerTokenSource::new(
                reqwest::Client::new(),
                format!("{}/oauth/token", server.uri()),
                "id",
                "secret",
                "https://household.api.policyengine.org",
            ),
            ttl,
        )
    }

    #[tokio::test]
    async fn test_public_simulator_decodes_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/us/calculate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(1)
            .mount(&server)
            .await;

        let sim = ApiSimulator::public(
            reqwest::Client::new(),
            format!("{}/us/calculate", server.uri()),
            TIMEOUT,
        );
        let output = sim.calculate(&HouseholdDocument::default(), "2025").await.unwrap();
        assert_eq!(output.document().people.len(), 1);
    }

    #[tokio::test]
    async fn test_private_simulator_reuses_cached_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "abc"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/us/calculate"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(2)
            .mount(&server)
            .await;

        let sim = ApiSimulator::private(
            reqwest::Client::new(),
            format!("{}/us/calculate", server.uri()),
            TIMEOUT,
            token_cache(&server, Duration::from_secs(3600)),
        );
        let doc = HouseholdDocument::default();
        sim.calculate(&doc, "2025").await.unwrap();
        sim.calculate(&doc, "2025").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_token_is_refreshed_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "revoked"})))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "fresh"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/us/calculate"))
            .and(header("authorization", "Bearer revoked"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/us/calculate"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(1)
            .mount(&server)
            .await;

        let sim = ApiSimulator::private(
            reqwest::Client::new(),
            format!("{}/us/calculate", server.uri()),
            TIMEOUT,
            token_cache(&server, Duration::from_secs(3600)),
        );
        let output = sim.calculate(&HouseholdDocument::default(), "2025").await.unwrap();
        assert_eq!(output.document().people.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_token_is_missing_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let sim = ApiSimulator::private(
            reqwest::Client::new(),
            format!("{}/us/calculate", server.uri()),
            TIMEOUT,
            token_cache(&server, Duration::from_secs(3600)),
        );
        let result = sim.calculate(&HouseholdDocument::default(), "2025").await;
        assert!(matches!(result, Err(PolicyEngineError::MissingCredentials)));
    }

    #[tokio::test]
    async fn test_fallback_uses_public_when_private_fails() {
        let private = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&private)
            .await;
        let public = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(1)
            .mount(&public)
            .await;

        let sim = FallbackSimulator::new(vec![
            Box::new(ApiSimulator::public(reqwest::Client::new(), private.uri(), TIMEOUT)),
            Box::new(ApiSimulator::public(reqwest::Client::new(), public.uri(), TIMEOUT)),
        ]);
        assert!(sim.calculate(&HouseholdDocument::default(), "2025").await.is_ok());
    }

    #[tokio::test]
    async fn test_fallback_fails_when_every_engine_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "error"})))
            .mount(&server)
            .await;

        let sim = FallbackSimulator::new(vec![Box::new(ApiSimulator::public(
            reqwest::Client::new(),
            server.uri(),
            TIMEOUT,
        ))]);
        let result = sim.calculate(&HouseholdDocument::default(), "2025").await;
        assert!(matches!(result, Err(PolicyEngineError::AllEnginesFailed)));
    }

    #[test]
    fn test_from_settings_without_credentials_is_public_only() {
        let settings = PolicyEngineSettings {
            public_url: "https://api.policyengine.org/us/calculate".to_string(),
            private_url: Some("https://household.api.policyengine.org/us/calculate".to_string()),
            auth_url: Some("https://policyengine.uk.auth0.com/oauth/token".to_string()),
            audience: None,
            client_id_env: "BENEFITS_ENGINE_TEST_UNSET_CLIENT_ID".to_string(),
            client_secret_env: "BENEFITS_ENGINE_TEST_UNSET_CLIENT_SECRET".to_string(),
            period: "2025".to_string(),
            timeout_secs: 30,
            token_ttl_days: 29,
        };
        let sim = FallbackSimulator::from_settings(reqwest::Client::new(), &settings);
        assert_eq!(sim.engine_names(), vec!["public"]);
    }
}
