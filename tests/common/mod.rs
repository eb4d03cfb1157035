//! Shared fixtures for the wiremock integration tests.

use opscan::{Client, ClientConfig, Credentials};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Access token issued by the default login mock.
#[allow(dead_code)]
pub const ACCESS: &str = "acc-1";

/// Refresh token issued by the default login mock.
#[allow(dead_code)]
pub const REFRESH: &str = "ref-1";

/// Mount a login endpoint that accepts anything and issues the default
/// token pair.
#[allow(dead_code)]
pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": ACCESS,
            "refresh": REFRESH,
        })))
        .mount(server)
        .await;
}

/// A client pointed at the mock server, using trial credentials.
#[allow(dead_code)]
pub fn trial_client(server: &MockServer) -> Client {
    let config = ClientConfig::new(&server.uri(), Credentials::Trial).expect("valid mock URL");
    Client::new(config).expect("client build")
}

/// A client pointed at the mock server, using an API key.
#[allow(dead_code)]
pub fn api_key_client(server: &MockServer, key: &str) -> Client {
    let config = ClientConfig::new(&server.uri(), Credentials::ApiKey(key.to_string()))
        .expect("valid mock URL");
    Client::new(config).expect("client build")
}
