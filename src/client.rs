//! The OpScan API client.
//!
//! A [`Client`] owns one authenticated session: credentials, the API base,
//! and the cached token pair. Every authenticated operation runs under the
//! same try-once/refresh-once/retry-once policy, applied independently to
//! each network call. A 401 during polling refreshes and retries that poll
//! step only, never the whole submit-and-poll sequence.

use std::time::Duration;

use reqwest::Url;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::core::auth::{self, Credentials};
use crate::core::http;
use crate::core::models::{AnalysisRequest, AnalysisStatus, ListFilter, SubmitReceipt};
use crate::core::poller::{self, PollOptions};
use crate::error::{Error, Result};

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "https://api.opscan.io";

// =============================================================================
// Configuration
// =============================================================================

/// Client construction parameters.
///
/// Environment lookup happens at the CLI boundary; nothing in here reads
/// env vars.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base API URL.
    pub api_url: Url,
    /// How this session authenticates.
    pub credentials: Credentials,
    /// Per-request HTTP timeout (not the poll budget).
    pub http_timeout: Duration,
}

impl ClientConfig {
    /// Build a config, validating the API URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `api_url` is not a valid absolute URL.
    pub fn new(api_url: &str, credentials: Credentials) -> Result<Self> {
        let api_url = Url::parse(api_url)
            .map_err(|e| Error::Validation(format!("{api_url} is not a valid URL: {e}")))?;
        if api_url.host_str().is_none() {
            return Err(Error::Validation(format!("{api_url} has no host")));
        }
        Ok(Self {
            api_url,
            credentials,
            http_timeout: http::DEFAULT_TIMEOUT,
        })
    }

    /// Config pointing at the production API.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::Validation`] (unreachable for the built-in URL).
    pub fn with_defaults(credentials: Credentials) -> Result<Self> {
        Self::new(DEFAULT_API_URL, credentials)
    }
}

// =============================================================================
// Session State
// =============================================================================

/// Cached session tokens. `refresh` is `None` for API-key sessions, which
/// cannot rotate their credential.
#[derive(Debug, Clone)]
struct SessionTokens {
    access: String,
    refresh: Option<String>,
}

// =============================================================================
// Client
// =============================================================================

/// An authenticated session against the OpScan analysis API.
pub struct Client {
    http: reqwest::Client,
    api_url: Url,
    credentials: Credentials,
    // Sole shared mutable state; the lock is held across a refresh so the
    // pair is replaced atomically relative to any read.
    tokens: Mutex<Option<SessionTokens>>,
}

impl Client {
    /// Create a client from a config.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the HTTP client cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            http: http::build_client(config.http_timeout)?,
            api_url: config.api_url,
            credentials: config.credentials,
            tokens: Mutex::new(None),
        })
    }

    /// The configured API base URL.
    #[must_use]
    pub const fn api_url(&self) -> &Url {
        &self.api_url
    }

    // ==========================================================================
    // Session / token lifecycle
    // ==========================================================================

    /// Log in now, replacing any cached tokens.
    ///
    /// Operations log in lazily on first use; calling this is only needed to
    /// validate credentials up front.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthenticationFailed`] if the credentials are rejected.
    pub async fn login(&self) -> Result<()> {
        {
            let mut guard = self.tokens.lock().await;
            *guard = None;
        }
        self.ensure_access_token().await.map(drop)
    }

    /// Return the cached access token, logging in first if the cache is
    /// empty. API-key sessions install the key directly.
    async fn ensure_access_token(&self) -> Result<String> {
        let mut guard = self.tokens.lock().await;
        if let Some(tokens) = guard.as_ref() {
            return Ok(tokens.access.clone());
        }
        let tokens = match &self.credentials {
            Credentials::ApiKey(key) => SessionTokens {
                access: key.clone(),
                refresh: None,
            },
            credentials => {
                tracing::debug!(kind = credentials.kind(), "logging in");
                let pair = auth::login(&self.http, &self.api_url, credentials).await?;
                SessionTokens {
                    access: pair.access,
                    refresh: Some(pair.refresh),
                }
            }
        };
        let access = tokens.access.clone();
        *guard = Some(tokens);
        Ok(access)
    }

    /// Rotate the cached token pair. `Ok(None)` means this session cannot
    /// refresh (API key); a failed refresh is [`Error::AuthenticationFailed`].
    async fn try_refresh(&self) -> Result<Option<String>> {
        let mut guard = self.tokens.lock().await;
        let Some(current) = guard.as_ref() else {
            return Ok(None);
        };
        let Some(refresh_token) = current.refresh.clone() else {
            return Ok(None);
        };
        tracing::debug!("access token rejected; refreshing");
        let pair = auth::refresh(&self.http, &self.api_url, &current.access, &refresh_token).await?;
        let access = pair.access.clone();
        *guard = Some(SessionTokens {
            access: pair.access,
            refresh: Some(pair.refresh),
        });
        Ok(Some(access))
    }

    /// Run `op` with a valid access token: try once, refresh once on a 401,
    /// retry once. The retry's outcome is final; a second 401 propagates
    /// rather than triggering another refresh.
    async fn with_auth_retry<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let access = self.ensure_access_token().await?;
        match op(access).await {
            Err(Error::Unauthorized { context }) => match self.try_refresh().await? {
                Some(access) => op(access).await,
                None => Err(Error::Unauthorized { context }),
            },
            other => other,
        }
    }

    // ==========================================================================
    // Operations
    // ==========================================================================

    /// Submit an analysis and poll until it finishes, with default timing.
    ///
    /// # Errors
    ///
    /// See [`Client::analyze_with_options`].
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<Value> {
        self.analyze_with_options(request, PollOptions::default()).await
    }

    /// Submit an analysis and poll until it finishes, returning the issues
    /// payload. If submission reports the job already `Finished` (server
    /// cache hit), the issues are fetched immediately and the initial delay
    /// is skipped.
    ///
    /// # Errors
    ///
    /// [`Error::AuthenticationFailed`] before any submission if login fails;
    /// [`Error::Timeout`] / [`Error::MaxPollsExceeded`] when the job does not
    /// finish in budget (both carry the uuid, so polling can be resumed with
    /// [`Client::status`]); [`Error::AnalysisFailed`] if the server reports
    /// the job errored.
    pub async fn analyze_with_options(
        &self,
        request: &AnalysisRequest,
        options: PollOptions,
    ) -> Result<Value> {
        if options.timeout.is_zero() {
            return Err(Error::Validation("timeout must be positive".to_string()));
        }

        let receipt = self.submit(request).await?;
        tracing::info!(uuid = %receipt.uuid, status = ?receipt.status, "analysis submitted");

        if receipt.status == Some(AnalysisStatus::Finished) {
            return self.issues(&receipt.uuid).await;
        }

        let uuid = receipt.uuid.as_str();
        poller::poll(uuid, options, || self.status(uuid), || self.issues(uuid)).await
    }

    /// Submit an analysis request without waiting for it.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedResponse`] if the server does not return a uuid.
    pub async fn submit(&self, request: &AnalysisRequest) -> Result<SubmitReceipt> {
        self.with_auth_retry(|token| self.post_analysis(request, token)).await
    }

    /// Fetch the current status of a submitted analysis.
    ///
    /// Read-only with respect to the job; safe to call any number of times.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an empty uuid, otherwise the shared
    /// taxonomy.
    pub async fn status(&self, uuid: &str) -> Result<AnalysisStatus> {
        validate_uuid(uuid)?;
        self.with_auth_retry(|token| self.fetch_status(uuid, token)).await
    }

    /// Fetch the issues reported for a finished analysis.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an empty uuid, otherwise the shared
    /// taxonomy.
    pub async fn issues(&self, uuid: &str) -> Result<Value> {
        validate_uuid(uuid)?;
        self.with_auth_retry(|token| self.fetch_issues(uuid, token)).await
    }

    /// List past analyses for this account.
    ///
    /// # Errors
    ///
    /// Shared taxonomy.
    pub async fn list_analyses(&self, filter: &ListFilter) -> Result<Value> {
        self.with_auth_retry(|token| self.fetch_list(filter, token)).await
    }

    /// Fetch service version info. Unauthenticated.
    ///
    /// # Errors
    ///
    /// Shared taxonomy.
    pub async fn api_version(&self) -> Result<Value> {
        let url = http::join(&self.api_url, "/v1/version")?;
        let response = http::get(&self.http, url, None).await?;
        http::error_for_status(&response, "version query")?;
        response.json()
    }

    // ==========================================================================
    // Single-shot HTTP operations (each wrapped by with_auth_retry above)
    // ==========================================================================

    async fn post_analysis(&self, request: &AnalysisRequest, token: String) -> Result<SubmitReceipt> {
        let url = http::join(&self.api_url, "/v1/analyses")?;
        let response = http::post_json(&self.http, url, Some(&token), request.payload()).await?;
        http::error_for_status(&response, "analysis submission")?;
        let body = response.json()?;
        let uuid = body
            .get("uuid")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::MalformedResponse("uuid missing from submission response".to_string())
            })?
            .to_string();
        let status = body
            .get("status")
            .and_then(Value::as_str)
            .map(AnalysisStatus::parse);
        Ok(SubmitReceipt { uuid, status })
    }

    async fn fetch_status(&self, uuid: &str, token: String) -> Result<AnalysisStatus> {
        let url = http::join(&self.api_url, &format!("/v1/analyses/{uuid}"))?;
        let response = http::get(&self.http, url, Some(&token)).await?;
        http::error_for_status(&response, &format!("status query for analysis {uuid}"))?;
        let body = response.json()?;
        let status = body.get("status").and_then(Value::as_str).ok_or_else(|| {
            Error::MalformedResponse(format!("status missing from response for analysis {uuid}"))
        })?;
        Ok(AnalysisStatus::parse(status))
    }

    async fn fetch_issues(&self, uuid: &str, token: String) -> Result<Value> {
        let url = http::join(&self.api_url, &format!("/v1/analyses/{uuid}/issues"))?;
        let response = http::get(&self.http, url, Some(&token)).await?;
        http::error_for_status(&response, &format!("issues query for analysis {uuid}"))?;
        response.json()
    }

    async fn fetch_list(&self, filter: &ListFilter, token: String) -> Result<Value> {
        let mut url = http::join(&self.api_url, "/v1/analyses")?;
        for (key, value) in filter.to_query() {
            url.query_pairs_mut().append_pair(key, &value);
        }
        let response = http::get(&self.http, url, Some(&token)).await?;
        http::error_for_status(&response, "analysis list query")?;
        response.json()
    }
}

fn validate_uuid(uuid: &str) -> Result<()> {
    if uuid.trim().is_empty() {
        return Err(Error::Validation("analysis uuid must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_rejects_invalid_urls() {
        let creds = Credentials::Trial;
        assert!(matches!(
            ClientConfig::new("not-a-real-url", creds.clone()),
            Err(Error::Validation(_))
        ));
        assert!(ClientConfig::new("http://localhost:3100", creds).is_ok());
    }

    #[test]
    fn default_config_points_at_production() {
        let config = ClientConfig::with_defaults(Credentials::Trial).unwrap();
        assert_eq!(config.api_url.as_str(), "https://api.opscan.io/");
    }

    #[tokio::test]
    async fn empty_uuid_is_rejected_before_any_request() {
        let client =
            Client::new(ClientConfig::with_defaults(Credentials::Trial).unwrap()).unwrap();
        assert!(matches!(
            client.status("").await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            client.issues("  ").await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn zero_timeout_is_rejected_before_any_request() {
        let client =
            Client::new(ClientConfig::with_defaults(Credentials::Trial).unwrap()).unwrap();
        let request = AnalysisRequest::from_bytecode("0x00").unwrap();
        let options = PollOptions {
            timeout: Duration::ZERO,
            initial_delay: Duration::ZERO,
        };
        assert!(matches!(
            client.analyze_with_options(&request, options).await,
            Err(Error::Validation(_))
        ));
    }
}
