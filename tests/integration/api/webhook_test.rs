//! Webhook endpoint tests

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use fieldops_sync::backend::db::documents::get_estimate;
use fieldops_sync::backend::db::mappings::find_by_remote;
use fieldops_sync::backend::db::sync_log::recent_sync_log;
use fieldops_sync::backend::sync::webhook::{compute_signature, SIGNATURE_HEADER, UP_TO_DATE_REASON, VOIDED_REASON};
use fieldops_sync::shared::accounting::{EntityType, Estimate, MappingStatus, SyncRunStatus};

use crate::common::{seed_customer, seed_estimate, seed_mapping, send, TestEnv, REALM, VERIFIER_TOKEN};
use crate::assert_amount;

const WEBHOOK: &str = "/api/quickbooks/webhook";

fn change_payload(entity: &str, id: &str, operation: &str) -> String {
    json!({
        "eventNotifications": [{
            "realmId": REALM,
            "dataChangeEvent": {
                "entities": [{
                    "name": entity,
                    "id": id,
                    "operation": operation,
                    "lastUpdated": "2024-03-02T18:30:00.000Z"
                }]
            }
        }]
    })
    .to_string()
}

fn signed_post(body: &str) -> Request<Body> {
    Request::post(WEBHOOK)
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, compute_signature(VERIFIER_TOKEN, body.as_bytes()))
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn post_signed(env: &TestEnv, body: &str) -> Value {
    let (status, bytes) = send(env.app(), signed_post(body)).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&bytes).unwrap()
}

/// An estimate mapped to remote id 130, last synced at `synced_at`
async fn mapped_estimate(env: &TestEnv, synced_at: chrono::DateTime<Utc>) -> Estimate {
    let customer = seed_customer(env.pool(), "Acme Staffing").await;
    let estimate = seed_estimate(env.pool(), customer.id, "EST-0012", 300.0).await;
    seed_mapping(env.pool(), EntityType::Estimate, estimate.id, "130", synced_at).await;
    estimate
}

async fn mount_remote_estimate(env: &TestEnv, last_updated: chrono::DateTime<Utc>) {
    env.mock
        .mount_entity(
            "estimate",
            "130",
            "Estimate",
            json!({
                "Id": "130", "DocNumber": "EST-0012", "TxnStatus": "Accepted",
                "Line": [{
                    "LineNum": 1, "Amount": 980.0, "DetailType": "SalesItemLineDetail",
                    "SalesItemLineDetail": { "Qty": 4, "UnitPrice": 245 }
                }],
                "TotalAmt": 980.0,
                "MetaData": { "LastUpdatedTime": last_updated.to_rfc3339() }
            }),
        )
        .await;
}

#[tokio::test]
async fn test_challenge_is_echoed() {
    let env = TestEnv::new().await;
    let request = Request::get(format!("{}?challenge=abc123", WEBHOOK))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(env.app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"abc123");
}

#[tokio::test]
async fn test_other_methods_are_rejected() {
    let env = TestEnv::new().await;

    let (status, _) = send(env.app(), Request::get(WEBHOOK).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = send(env.app(), Request::put(WEBHOOK).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_bad_signatures_are_unauthorized() {
    let env = TestEnv::connected().await;
    let body = change_payload("Estimate", "130", "Update");

    let unsigned = Request::post(WEBHOOK).body(Body::from(body.clone())).unwrap();
    let (status, _) = send(env.app(), unsigned).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let tampered = Request::post(WEBHOOK)
        .header(SIGNATURE_HEADER, compute_signature(VERIFIER_TOKEN, body.as_bytes()))
        .body(Body::from(body.replace("130", "131")))
        .unwrap();
    let (status, bytes) = send(env.app(), tampered).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(bytes, b"Invalid signature");

    assert!(env.mock.requests_to("/estimate/130").await.is_empty());
}

#[tokio::test]
async fn test_stale_notification_is_skipped() {
    let env = TestEnv::connected().await;
    let estimate = mapped_estimate(&env, Utc::now()).await;
    mount_remote_estimate(&env, Utc::now() - Duration::hours(2)).await;

    let response = post_signed(&env, &change_payload("Estimate", "130", "Update")).await;

    assert_eq!(response["success"], true);
    assert_eq!(response["results"][0]["outcome"], "skipped");
    assert_eq!(response["results"][0]["skipped"], true);
    assert_eq!(response["results"][0]["reason"], UP_TO_DATE_REASON);

    let stored = get_estimate(env.pool(), estimate.id).await.unwrap().unwrap();
    assert_amount!(stored.total, 300.0);
}

#[tokio::test]
async fn test_notification_at_last_sync_time_is_skipped() {
    let env = TestEnv::connected().await;
    let synced_at = DateTime::parse_from_rfc3339("2024-03-02T18:30:00.250Z").unwrap().with_timezone(&Utc);
    let estimate = mapped_estimate(&env, synced_at).await;
    mount_remote_estimate(&env, synced_at).await;

    let response = post_signed(&env, &change_payload("Estimate", "130", "Update")).await;

    assert_eq!(response["results"][0]["outcome"], "skipped");
    assert_eq!(response["results"][0]["skipped"], true);
    assert_eq!(response["results"][0]["reason"], UP_TO_DATE_REASON);

    let stored = get_estimate(env.pool(), estimate.id).await.unwrap().unwrap();
    assert_amount!(stored.total, 300.0);
    let mapping = find_by_remote(env.pool(), EntityType::Estimate, "130").await.unwrap().unwrap();
    assert_eq!(mapping.last_synced_at, synced_at);
}

#[tokio::test]
async fn test_newer_remote_estimate_is_applied() {
    let env = TestEnv::connected().await;
    let synced_at = Utc::now() - Duration::days(1);
    let estimate = mapped_estimate(&env, synced_at).await;
    mount_remote_estimate(&env, Utc::now() - Duration::minutes(5)).await;

    let response = post_signed(&env, &change_payload("Estimate", "130", "Update")).await;

    assert_eq!(response["results"][0]["outcome"], "updated");
    assert_eq!(response["results"][0]["skipped"], false);

    let stored = get_estimate(env.pool(), estimate.id).await.unwrap().unwrap();
    assert_amount!(stored.total, 980.0);
    assert_eq!(stored.status, "approved");

    let mapping = find_by_remote(env.pool(), EntityType::Estimate, "130").await.unwrap().unwrap();
    assert!(mapping.last_synced_at > synced_at);

    let log = recent_sync_log(env.pool(), 1).await.unwrap();
    assert_eq!(log[0].action, "webhook_update");
    assert_eq!(log[0].status, SyncRunStatus::Success);
}

#[tokio::test]
async fn test_delete_marks_mapping_voided() {
    let env = TestEnv::connected().await;
    mapped_estimate(&env, Utc::now()).await;

    let response = post_signed(&env, &change_payload("Estimate", "130", "Delete")).await;

    assert_eq!(response["results"][0]["outcome"], "voided");
    let mapping = find_by_remote(env.pool(), EntityType::Estimate, "130").await.unwrap().unwrap();
    assert_eq!(mapping.sync_status, MappingStatus::Voided);
    assert!(env.mock.requests_to("/estimate/130").await.is_empty());
}

#[tokio::test]
async fn test_update_after_delete_keeps_mapping_voided() {
    let env = TestEnv::connected().await;
    let estimate = mapped_estimate(&env, Utc::now() - Duration::days(1)).await;
    mount_remote_estimate(&env, Utc::now()).await;
    post_signed(&env, &change_payload("Estimate", "130", "Delete")).await;

    let response = post_signed(&env, &change_payload("Estimate", "130", "Update")).await;

    assert_eq!(response["results"][0]["outcome"], "skipped");
    assert_eq!(response["results"][0]["reason"], VOIDED_REASON);
    let mapping = find_by_remote(env.pool(), EntityType::Estimate, "130").await.unwrap().unwrap();
    assert_eq!(mapping.sync_status, MappingStatus::Voided);
    let stored = get_estimate(env.pool(), estimate.id).await.unwrap().unwrap();
    assert_amount!(stored.total, 300.0);
    assert!(env.mock.requests_to("/estimate/130").await.is_empty());
}

#[tokio::test]
async fn test_unmapped_and_unhandled_changes() {
    let env = TestEnv::connected().await;
    let body = json!({
        "eventNotifications": [{
            "realmId": REALM,
            "dataChangeEvent": {
                "entities": [
                    { "name": "Estimate", "id": "999", "operation": "Update" },
                    { "name": "Payment", "id": "41", "operation": "Create" }
                ]
            }
        }]
    })
    .to_string();

    let response = post_signed(&env, &body).await;

    let results = response["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["outcome"], "skipped");
    assert_eq!(results[0]["reason"], "No local mapping");
    assert_eq!(results[1]["outcome"], "ignored");
    assert_eq!(results[1]["entity"], "Payment");
}

#[tokio::test]
async fn test_unreadable_payload_is_still_acknowledged() {
    let env = TestEnv::connected().await;

    let response = post_signed(&env, "{not json").await;

    assert_eq!(response["success"], false);
    assert!(response["error"].as_str().unwrap().starts_with("Invalid payload"));
}
