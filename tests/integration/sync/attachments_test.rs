//! Attachment puller tests

use assert_matches::assert_matches;
use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use fieldops_sync::backend::db::attachments::list_attachments;
use fieldops_sync::backend::db::sync_log::recent_sync_log;
use fieldops_sync::backend::error::BackendError;
use fieldops_sync::backend::storage::FileStore;
use fieldops_sync::backend::sync::attachments::pull_bill_attachments;
use fieldops_sync::shared::accounting::{EntityType, SyncRunStatus, VendorBill};

use crate::common::{count_rows, seed_bill, seed_mapping, seed_vendor, TestEnv};

/// A bill pushed to QuickBooks as remote id 950
async fn mapped_bill(env: &TestEnv) -> VendorBill {
    let vendor = seed_vendor(env.pool(), "Bolt Electric").await;
    let bill = seed_bill(env.pool(), vendor.id, "B-5521", vec![]).await;
    seed_mapping(env.pool(), EntityType::Bill, bill.id, "950", Utc::now()).await;
    bill
}

async fn mount_file(env: &TestEnv, file_path: &str, status: u16, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(file_path))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(body.to_vec()))
        .mount(&env.mock.server)
        .await;
}

#[tokio::test]
async fn test_pull_downloads_and_is_idempotent() {
    let env = TestEnv::connected().await;
    let bill = mapped_bill(&env).await;

    env.mock
        .mount_query(
            "AttachableRef.EntityRef.Value = '950'",
            "Attachable",
            json!([
                {
                    "Id": "5000", "FileName": "receipt.pdf", "ContentType": "application/pdf",
                    "TempDownloadUri": format!("{}/files/receipt.pdf", env.mock.uri())
                },
                { "Id": "5001", "FileName": "site photo.jpg", "ContentType": "image/jpeg" }
            ]),
        )
        .await;
    mount_file(&env, "/files/receipt.pdf", 200, b"%PDF-1.4 receipt").await;
    Mock::given(method("GET"))
        .and(path(env.mock.company_path("download/5001")))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("{}/files/photo", env.mock.uri())))
        .mount(&env.mock.server)
        .await;
    mount_file(&env, "/files/photo", 200, b"jpeg bytes").await;

    let summary = pull_bill_attachments(&env.ctx, bill.id).await.unwrap();
    assert_eq!((summary.imported, summary.skipped, summary.failed), (2, 0, 0));

    let stored = list_attachments(env.pool(), bill.id).await.unwrap();
    assert_eq!(stored.len(), 2);
    let receipt = stored.iter().find(|a| a.file_name == "receipt.pdf").unwrap();
    assert_eq!(receipt.file_size, 16);
    assert_eq!(receipt.remote_attachable_id.as_deref(), Some("5000"));
    assert!(receipt.file_path.starts_with(&format!("vendor-bills/{}/", bill.id)));
    assert!(env.store.exists(&receipt.file_path).await.unwrap());
    let on_disk = std::fs::read(env.files.path().join(&receipt.file_path)).unwrap();
    assert_eq!(on_disk, b"%PDF-1.4 receipt");

    let photo = stored.iter().find(|a| a.file_name == "site photo.jpg").unwrap();
    assert!(photo.file_path.ends_with("-site_photo.jpg"));

    let again = pull_bill_attachments(&env.ctx, bill.id).await.unwrap();
    assert_eq!((again.imported, again.skipped), (0, 2));
    assert_eq!(count_rows(env.pool(), "vendor_bill_attachments").await, 2);
}

#[tokio::test]
async fn test_failed_download_does_not_stop_the_others() {
    let env = TestEnv::connected().await;
    let bill = mapped_bill(&env).await;
    env.mock
        .mount_query(
            "FROM Attachable",
            "Attachable",
            json!([
                { "Id": "5000", "FileName": "gone.pdf", "TempDownloadUri": format!("{}/files/gone", env.mock.uri()) },
                { "Id": "5001", "TempDownloadUri": format!("{}/files/ok", env.mock.uri()) }
            ]),
        )
        .await;
    mount_file(&env, "/files/gone", 404, b"").await;
    mount_file(&env, "/files/ok", 200, b"ok").await;

    let summary = pull_bill_attachments(&env.ctx, bill.id).await.unwrap();

    assert_eq!((summary.imported, summary.failed), (1, 1));
    assert!(summary.errors[0].starts_with("gone.pdf: "));
    let stored = list_attachments(env.pool(), bill.id).await.unwrap();
    assert_eq!(stored[0].file_name, "attachment-5001");

    let log = recent_sync_log(env.pool(), 1).await.unwrap();
    assert_eq!(log[0].action, "pull_attachments");
    assert_eq!(log[0].status, SyncRunStatus::Partial);
}

#[tokio::test]
async fn test_unpushed_bill_is_rejected() {
    let env = TestEnv::connected().await;
    let vendor = seed_vendor(env.pool(), "Bolt Electric").await;
    let bill = seed_bill(env.pool(), vendor.id, "B-5522", vec![]).await;

    let result = pull_bill_attachments(&env.ctx, bill.id).await;

    assert_matches!(result, Err(BackendError::UnmappedReference { entity: "bill", ref name }) if name == "B-5522");
    assert!(env.mock.requests_to("/query").await.is_empty());
}

#[tokio::test]
async fn test_unknown_bill_is_not_found() {
    let env = TestEnv::connected().await;

    let result = pull_bill_attachments(&env.ctx, Uuid::new_v4()).await;

    assert_matches!(result, Err(BackendError::NotFound { entity: "vendor bill", .. }));
}
