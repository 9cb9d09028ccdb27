//! QuickBooks mock server for integration tests
//!
//! Wraps a wiremock `MockServer` that answers the accounting API under
//! `/v3/company/<REALM>/...` and the OAuth token endpoint under
//! `/oauth2/v1/tokens/bearer`.

use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use fieldops_sync::shared::Settings;

use super::database::REALM;

pub const TOKEN_PATH: &str = "/oauth2/v1/tokens/bearer";
pub const VERIFIER_TOKEN: &str = "verifier-token";
pub const EXPENSE_ACCOUNT: &str = "80";

/// Matches a `/query` request whose `query` parameter contains a fragment
pub struct QueryContains(pub String);

impl Match for QueryContains {
    fn matches(&self, request: &Request) -> bool {
        request
            .url
            .query_pairs()
            .any(|(key, value)| key == "query" && value.contains(&self.0))
    }
}

pub fn query_contains(fragment: &str) -> QueryContains {
    QueryContains(fragment.to_string())
}

pub struct QuickBooksMock {
    pub server: MockServer,
}

impl QuickBooksMock {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Settings pointing every QuickBooks URL at the mock
    pub fn settings(&self) -> Settings {
        Settings::builder()
            .database_url("sqlite::memory:")
            .api_base(self.uri())
            .oauth_token_url(format!("{}{}", self.uri(), TOKEN_PATH))
            .client_id("client-id")
            .client_secret("client-secret")
            .redirect_uri("https://app.example/quickbooks/callback")
            .webhook_verifier_token(VERIFIER_TOKEN)
            .expense_account_id(EXPENSE_ACCOUNT)
            .build()
            .expect("Failed to build test settings")
    }

    pub fn company_path(&self, rest: &str) -> String {
        format!("/v3/company/{}/{}", REALM, rest)
    }

    /// Answer queries containing `fragment` with `rows` under `key`
    pub async fn mount_query(&self, fragment: &str, key: &str, rows: Value) {
        Mock::given(method("GET"))
            .and(path(self.company_path("query")))
            .and(query_contains(fragment))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "QueryResponse": { key: rows }
            })))
            .mount(&self.server)
            .await;
    }

    /// Answer `GET .../<entity>/<id>` with `{ key: record }`
    pub async fn mount_entity(&self, entity: &str, id: &str, key: &str, record: Value) {
        Mock::given(method("GET"))
            .and(path(self.company_path(&format!("{}/{}", entity, id))))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ key: record })))
            .mount(&self.server)
            .await;
    }

    /// Answer `POST .../<entity>` with `{ key: record }`, expecting `times` calls
    pub async fn mount_create(&self, entity: &str, key: &str, record: Value, times: u64) {
        Mock::given(method("POST"))
            .and(path(self.company_path(entity)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ key: record })))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Token endpoint granting `access`/`refresh` for requests with `grant_type`
    pub async fn mount_token(&self, grant_type: &str, access: &str, refresh: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains(format!("grant_type={}", grant_type)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access,
                "refresh_token": refresh,
                "token_type": "bearer",
                "expires_in": 3600,
                "x_refresh_token_expires_in": 8_726_400
            })))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Requests the mock has seen whose path ends with `suffix`
    pub async fn requests_to(&self, suffix: &str) -> Vec<Request> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path().ends_with(suffix))
            .collect()
    }
}
