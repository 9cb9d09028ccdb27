//! Token manager tests

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, ResponseTemplate};

use fieldops_sync::backend::db::sync_config::load_sync_config;
use fieldops_sync::backend::error::BackendError;

use crate::common::{seed_connection, TestEnv, REALM, TOKEN_PATH};

#[tokio::test]
async fn test_missing_connection_is_not_connected() {
    let env = TestEnv::new().await;

    let result = env.ctx.tokens.get_valid_token().await;

    assert_matches!(result, Err(BackendError::NotConnected));
}

#[tokio::test]
async fn test_fresh_token_is_used_as_is() {
    let env = TestEnv::connected().await;
    env.mock.mount_token("refresh_token", "unused", "unused", 0).await;

    let conn = env.ctx.tokens.get_valid_token().await.unwrap();

    assert_eq!(conn.access_token, "access-1");
    assert_eq!(conn.realm_id, REALM);
}

#[tokio::test]
async fn test_expiring_token_is_refreshed_and_persisted() {
    let env = TestEnv::new().await;
    seed_connection(env.pool(), Duration::seconds(60)).await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(header_exists("authorization"))
        .and(wiremock::matchers::body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "access-2",
            "refresh_token": "refresh-2",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&env.mock.server)
        .await;

    let conn = env.ctx.tokens.get_valid_token().await.unwrap();
    assert_eq!(conn.access_token, "access-2");

    let stored = load_sync_config(env.pool()).await.unwrap().unwrap();
    assert_eq!(stored.access_token, "access-2");
    assert_eq!(stored.refresh_token, "refresh-2");
    assert!(stored.token_expires_at > Utc::now() + Duration::minutes(50));

    // The refreshed token is now fresh; no second refresh
    let again = env.ctx.tokens.get_valid_token().await.unwrap();
    assert_eq!(again.access_token, "access-2");
}

#[tokio::test]
async fn test_rejected_refresh_keeps_stored_tokens() {
    let env = TestEnv::new().await;
    seed_connection(env.pool(), Duration::seconds(-30)).await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Token expired"
        })))
        .mount(&env.mock.server)
        .await;

    let err = env.ctx.tokens.get_valid_token().await.unwrap_err();

    assert_matches!(err, BackendError::TokenRefreshFailed { status: 400, ref message } if message.contains("invalid_grant"));
    assert!(err.is_retryable());
    let stored = load_sync_config(env.pool()).await.unwrap().unwrap();
    assert_eq!(stored.refresh_token, "refresh-1");
}

#[tokio::test]
async fn test_connect_status_disconnect_lifecycle() {
    let env = TestEnv::new().await;
    env.mock.mount_token("authorization_code", "access-c", "refresh-c", 1).await;

    let before = env.ctx.tokens.status().await.unwrap();
    assert!(!before.connected);

    let connected = env.ctx.tokens.connect("auth-code", "4620816365").await.unwrap();
    assert!(connected.connected);
    assert_eq!(connected.realm_id.as_deref(), Some("4620816365"));

    let conn = env.ctx.tokens.get_valid_token().await.unwrap();
    assert_eq!(conn.access_token, "access-c");

    assert!(env.ctx.tokens.disconnect().await.unwrap());
    let after = env.ctx.tokens.status().await.unwrap();
    assert!(!after.connected);
    assert_eq!(after.realm_id, None);
    assert_matches!(env.ctx.tokens.get_valid_token().await, Err(BackendError::NotConnected));
}

#[tokio::test]
async fn test_connect_requires_code_and_realm() {
    let env = TestEnv::new().await;

    let result = env.ctx.tokens.connect("", "4620816365").await;

    assert_matches!(result, Err(BackendError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_disconnect_without_connection_reports_false() {
    let env = TestEnv::new().await;

    assert!(!env.ctx.tokens.disconnect().await.unwrap());
}
