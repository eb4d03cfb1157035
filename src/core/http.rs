//! HTTP transport helpers.
//!
//! The rest of the client sees HTTP as "perform request, get status + body
//! or a network error". Status-code policy (401 refresh, 5xx surfacing, 308
//! login upgrade) lives with the callers, so redirects are never followed
//! automatically here.

use std::time::Duration;

use reqwest::{Client, ClientBuilder, StatusCode, Url};
use serde_json::Value;

use crate::error::{Error, Result};

/// Default timeout for a single HTTP request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How much response body to quote in error messages.
const BODY_SNIPPET_LEN: usize = 200;

/// Build a configured HTTP client.
///
/// # Errors
///
/// Returns [`Error::Network`] if client construction fails.
pub fn build_client(timeout: Duration) -> Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(format!("opscan/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::Network(e.to_string()))
}

/// Join a path onto the API base URL.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the combination is not a valid URL.
pub fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|e| Error::Validation(format!("invalid API URL {base}{path}: {e}")))
}

/// A completed HTTP exchange: status plus raw body, with the `Location`
/// header kept for the login 308 upgrade.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
    pub location: Option<String>,
}

impl ApiResponse {
    /// Parse the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] if the body is not valid JSON.
    pub fn json(&self) -> Result<Value> {
        serde_json::from_str(&self.body)
            .map_err(|e| Error::MalformedResponse(format!("response body is not JSON: {e}")))
    }

    /// A truncated body excerpt for error messages.
    #[must_use]
    pub fn body_snippet(&self) -> &str {
        if self.body.len() <= BODY_SNIPPET_LEN {
            return &self.body;
        }
        let mut end = BODY_SNIPPET_LEN;
        while !self.body.is_char_boundary(end) {
            end -= 1;
        }
        &self.body[..end]
    }
}

/// Map a response status onto the error taxonomy: 2xx passes, 401 becomes
/// [`Error::Unauthorized`] (the refresh-and-retry trigger), 5xx becomes
/// [`Error::ServerError`], everything else surfaces as [`Error::Api`].
///
/// # Errors
///
/// See above; `context` names the operation for the caller.
pub fn error_for_status(response: &ApiResponse, context: &str) -> Result<()> {
    let status = response.status;
    if status.is_success() {
        return Ok(());
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::Unauthorized {
            context: context.to_string(),
        });
    }
    if status.is_server_error() {
        return Err(Error::ServerError {
            status: status.as_u16(),
            context: context.to_string(),
        });
    }
    Err(Error::Api {
        status: status.as_u16(),
        message: format!("{context}: {}", response.body_snippet()),
    })
}

/// Perform a GET request, optionally with a bearer token.
///
/// # Errors
///
/// Returns [`Error::Network`] on connection failure or transport timeout.
pub async fn get(client: &Client, url: Url, token: Option<&str>) -> Result<ApiResponse> {
    let mut request = client.get(url);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    read_response(request.send().await).await
}

/// Perform a POST request with a JSON body, optionally with a bearer token.
///
/// # Errors
///
/// Returns [`Error::Network`] on connection failure or transport timeout.
pub async fn post_json(
    client: &Client,
    url: Url,
    token: Option<&str>,
    body: &Value,
) -> Result<ApiResponse> {
    let mut request = client.post(url).json(body);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    read_response(request.send().await).await
}

async fn read_response(
    result: std::result::Result<reqwest::Response, reqwest::Error>,
) -> Result<ApiResponse> {
    let response = result.map_err(map_transport_error)?;
    let status = response.status();
    let location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    let body = response.text().await.map_err(map_transport_error)?;
    Ok(ApiResponse {
        status,
        body,
        location,
    })
}

fn map_transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Network(format!("request timed out: {e}"))
    } else if e.is_connect() {
        Error::Network(format!("could not connect to API server: {e}"))
    } else {
        Error::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> ApiResponse {
        ApiResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
            location: None,
        }
    }

    #[test]
    fn success_statuses_pass() {
        assert!(error_for_status(&response(200, "{}"), "op").is_ok());
        assert!(error_for_status(&response(201, "{}"), "op").is_ok());
    }

    #[test]
    fn unauthorized_maps_to_refresh_trigger() {
        let err = error_for_status(&response(401, ""), "status query").unwrap_err();
        assert!(err.is_refreshable());
    }

    #[test]
    fn server_errors_surface_with_status() {
        let err = error_for_status(&response(503, ""), "op").unwrap_err();
        match err {
            Error::ServerError { status, .. } => assert_eq!(status, 503),
            other => panic!("expected ServerError, got {other:?}"),
        }
    }

    #[test]
    fn client_errors_surface_as_api_errors() {
        for status in [400, 413, 429] {
            let err = error_for_status(&response(status, "nope"), "submit").unwrap_err();
            match err {
                Error::Api { status: got, .. } => assert_eq!(got, status),
                other => panic!("expected Api error, got {other:?}"),
            }
        }
    }

    #[test]
    fn body_snippet_truncates_long_bodies() {
        let long = "x".repeat(1000);
        let resp = response(400, &long);
        assert_eq!(resp.body_snippet().len(), 200);
    }

    #[test]
    fn json_parse_failure_is_malformed_response() {
        let err = response(200, "not json").json().unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn join_builds_versioned_paths() {
        let base = Url::parse("https://api.opscan.io").unwrap();
        let url = join(&base, "/v1/analyses/abc-123").unwrap();
        assert_eq!(url.as_str(), "https://api.opscan.io/v1/analyses/abc-123");
    }
}
