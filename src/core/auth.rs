//! Credentials and the login/refresh primitives.
//!
//! Login and refresh are the only endpoints that return a token pair. Both
//! require `access` and `refresh` in the response; a missing field is a
//! protocol error, not an auth failure. Refresh is never retried; a failed
//! refresh ends the enclosing retry policy.

use reqwest::{Client, StatusCode, Url};
use serde_json::{Value, json};

use crate::core::http;
use crate::error::{Error, Result};

/// Ethereum address of the server-side trial account.
pub const TRIAL_ETH_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Password of the server-side trial account.
pub const TRIAL_PASSWORD: &str = "trial";

const LOGIN_PATH: &str = "/v1/auth/login";
const REFRESH_PATH: &str = "/v1/auth/refresh";

// =============================================================================
// Credentials
// =============================================================================

/// How this session authenticates.
///
/// One variant per supported identity; constructing a `Client` with one of
/// these replaces the presence checks a caller would otherwise scatter
/// around ad hoc email/address/key fields.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Email plus password.
    EmailPassword { email: String, password: String },
    /// Ethereum address plus password.
    EthAddress { address: String, password: String },
    /// Pre-issued API key, used directly as the access token. No refresh
    /// capability: a 401 on an API-key session is final.
    ApiKey(String),
    /// The shared trial account (demo quota).
    Trial,
}

impl Credentials {
    /// The login request body, or `None` for API-key sessions which never
    /// hit the login endpoint.
    #[must_use]
    pub fn login_body(&self) -> Option<Value> {
        match self {
            Self::EmailPassword { email, password } => {
                Some(json!({ "email": email, "password": password }))
            }
            Self::EthAddress { address, password } => {
                Some(json!({ "ethAddress": address, "password": password }))
            }
            Self::Trial => Some(json!({
                "ethAddress": TRIAL_ETH_ADDRESS,
                "password": TRIAL_PASSWORD,
            })),
            Self::ApiKey(_) => None,
        }
    }

    /// Short label for logging. Never includes secrets.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::EmailPassword { .. } => "email",
            Self::EthAddress { .. } => "ethAddress",
            Self::ApiKey(_) => "api-key",
            Self::Trial => "trial",
        }
    }
}

// =============================================================================
// Token Pair
// =============================================================================

/// Access/refresh pair returned by the login and refresh endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Short-lived bearer credential for authenticated calls.
    pub access: String,
    /// Longer-lived credential used to rotate the access token.
    pub refresh: String,
}

/// Extract a token pair from a login/refresh response body.
///
/// # Errors
///
/// Returns [`Error::MalformedResponse`] if either field is absent.
pub fn parse_token_pair(body: &Value) -> Result<TokenPair> {
    let access = body
        .get("access")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::MalformedResponse("access token missing from response".to_string()))?;
    let refresh = body
        .get("refresh")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::MalformedResponse("refresh token missing from response".to_string()))?;
    Ok(TokenPair {
        access: access.to_string(),
        refresh: refresh.to_string(),
    })
}

// =============================================================================
// Login / Refresh
// =============================================================================

/// Log in with the given credentials and return a fresh token pair.
///
/// A 308 redirect (the server forcing `https:` on an `http:` base) is
/// followed exactly once, with the scheme upgraded.
///
/// # Errors
///
/// [`Error::AuthenticationFailed`] for any rejection, [`Error::MalformedResponse`]
/// for a token-less body, [`Error::Network`] for transport failures.
pub async fn login(client: &Client, api_url: &Url, credentials: &Credentials) -> Result<TokenPair> {
    let body = credentials.login_body().ok_or_else(|| {
        Error::AuthenticationFailed("API-key sessions do not use the login endpoint".to_string())
    })?;
    let url = http::join(api_url, LOGIN_PATH)?;

    let mut response = http::post_json(client, url.clone(), None, &body).await?;
    if response.status == StatusCode::PERMANENT_REDIRECT {
        let next = upgrade_to_https(&url, response.location.as_deref()).ok_or_else(|| {
            Error::AuthenticationFailed(
                "login was redirected but no https endpoint was offered".to_string(),
            )
        })?;
        tracing::debug!(from = %url, to = %next, "login redirected; upgrading to https");
        response = http::post_json(client, next, None, &body).await?;
    }

    if response.status != StatusCode::OK {
        return Err(Error::AuthenticationFailed(format!(
            "login rejected with HTTP {}: {}",
            response.status.as_u16(),
            response.body_snippet(),
        )));
    }
    parse_token_pair(&response.json()?)
}

/// Exchange the current token pair for a new one.
///
/// # Errors
///
/// Any non-200 outcome is [`Error::AuthenticationFailed`]; the caller must
/// not retry it.
pub async fn refresh(
    client: &Client,
    api_url: &Url,
    access_token: &str,
    refresh_token: &str,
) -> Result<TokenPair> {
    let url = http::join(api_url, REFRESH_PATH)?;
    let body = json!({ "accessToken": access_token, "refreshToken": refresh_token });

    let response = http::post_json(client, url, None, &body).await?;
    if response.status != StatusCode::OK {
        return Err(Error::AuthenticationFailed(format!(
            "token refresh rejected with HTTP {}",
            response.status.as_u16(),
        )));
    }
    parse_token_pair(&response.json()?)
}

/// Compute the https replacement for a redirected login URL. Prefers the
/// server-provided `Location` when it is already https; otherwise rewrites
/// the scheme of an `http:` URL. Returns `None` when no upgrade applies.
fn upgrade_to_https(url: &Url, location: Option<&str>) -> Option<Url> {
    if let Some(location) = location
        && let Ok(next) = Url::parse(location)
        && next.scheme() == "https"
    {
        return Some(next);
    }
    if url.scheme() == "http" {
        let mut next = url.clone();
        next.set_scheme("https").ok()?;
        return Some(next);
    }
    None
}
