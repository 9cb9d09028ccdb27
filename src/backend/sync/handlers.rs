/**
 * Sync Endpoint Handlers
 *
 * HTTP entry points under `/api/quickbooks`. Each handler parses its body,
 * runs one sync operation and wraps the outcome in [`SyncResponse`].
 *
 * # Response Envelope
 *
 * Sync endpoints always answer 200. The body carries `success`, the
 * operation's own fields flattened in, and on failure `error` plus
 * `errorKind` (see `BackendError::kind`). A malformed body is reported the
 * same way with `errorKind: "invalid_request"`.
 *
 * ```json
 * { "success": true, "nextNumber": "INV-0042", "usedRemote": true }
 * { "success": false, "error": "QuickBooks is not connected", "errorKind": "not_connected" }
 * ```
 */

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::attachments::pull_bill_attachments;
use super::exporter::{push_purchase_order, push_vendor, push_vendor_bill};
use super::importer::run_import;
use super::numbering::{next_document_number, NextNumber};
use super::SyncContext;
use crate::backend::db::sync_log::recent_sync_log;
use crate::backend::error::BackendError;
use crate::shared::accounting::{
    AttachmentPullSummary, ConnectionStatus, DocumentKind, ImportKind, ImportSummary, PushOutcome,
    SyncLogEntry,
};

/// Default number of sync-log rows returned
pub const DEFAULT_LOG_LIMIT: i64 = 50;
/// Upper bound on requested sync-log rows
pub const MAX_LOG_LIMIT: i64 = 500;

// ─────────────────────────────────────────────────────────────────────────────
// Envelope
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

impl<T: Serialize> SyncResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
        }
    }

    pub fn failed(err: &BackendError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.message()),
            error_kind: Some(err.kind()),
        }
    }

    fn from_result(operation: &str, result: Result<T, BackendError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => {
                if err.status_code().is_server_error() {
                    tracing::error!("{} failed: {}", operation, err);
                } else {
                    tracing::warn!("{} rejected: {}", operation, err);
                }
                Self::failed(&err)
            }
        }
    }
}

impl<T: Serialize> IntoResponse for SyncResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, BackendError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| BackendError::invalid(rejection.body_text()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct NextNumberRequest {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorPushRequest {
    pub vendor_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderPushRequest {
    pub purchase_order_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillRequest {
    pub bill_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    pub code: String,
    pub realm_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SyncLogQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct Disconnected {
    pub disconnected: bool,
}

#[derive(Debug, Serialize)]
pub struct SyncLogPage {
    pub entries: Vec<SyncLogEntry>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/quickbooks/import` with `{type: "invoices" | "estimates" | "customers"}`
pub async fn import(
    State(ctx): State<SyncContext>,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> SyncResponse<ImportSummary> {
    let result = async {
        let request = body(payload)?;
        let kind = ImportKind::from_str(&request.kind)?;
        tracing::info!("Starting {} import", kind.as_str());
        run_import(&ctx, kind).await
    }
    .await;
    SyncResponse::from_result("import", result)
}

/// `POST /api/quickbooks/next-number`
pub async fn next_number(
    State(ctx): State<SyncContext>,
    payload: Result<Json<NextNumberRequest>, JsonRejection>,
) -> SyncResponse<NextNumber> {
    let result = async {
        let request = body(payload)?;
        let kind = DocumentKind::from_str(&request.kind)?;
        next_document_number(&ctx, kind).await
    }
    .await;
    SyncResponse::from_result("next-number", result)
}

pub async fn push_vendor_handler(
    State(ctx): State<SyncContext>,
    payload: Result<Json<VendorPushRequest>, JsonRejection>,
) -> SyncResponse<PushOutcome> {
    let result = async { push_vendor(&ctx, body(payload)?.vendor_id).await }.await;
    SyncResponse::from_result("vendor push", result)
}

pub async fn push_purchase_order_handler(
    State(ctx): State<SyncContext>,
    payload: Result<Json<PurchaseOrderPushRequest>, JsonRejection>,
) -> SyncResponse<PushOutcome> {
    let result = async { push_purchase_order(&ctx, body(payload)?.purchase_order_id).await }.await;
    SyncResponse::from_result("purchase order push", result)
}

pub async fn push_bill_handler(
    State(ctx): State<SyncContext>,
    payload: Result<Json<BillRequest>, JsonRejection>,
) -> SyncResponse<PushOutcome> {
    let result = async { push_vendor_bill(&ctx, body(payload)?.bill_id).await }.await;
    SyncResponse::from_result("bill push", result)
}

pub async fn pull_attachments_handler(
    State(ctx): State<SyncContext>,
    payload: Result<Json<BillRequest>, JsonRejection>,
) -> SyncResponse<AttachmentPullSummary> {
    let result = async { pull_bill_attachments(&ctx, body(payload)?.bill_id).await }.await;
    SyncResponse::from_result("attachment pull", result)
}

/// `GET /api/quickbooks/status`
pub async fn status(State(ctx): State<SyncContext>) -> SyncResponse<ConnectionStatus> {
    SyncResponse::from_result("status", ctx.tokens.status().await)
}

/// `POST /api/quickbooks/connect` with `{code, realmId}` from the OAuth redirect
pub async fn connect(
    State(ctx): State<SyncContext>,
    payload: Result<Json<ConnectRequest>, JsonRejection>,
) -> SyncResponse<ConnectionStatus> {
    let result = async {
        let request = body(payload)?;
        ctx.tokens.connect(&request.code, &request.realm_id).await
    }
    .await;
    SyncResponse::from_result("connect", result)
}

pub async fn disconnect(State(ctx): State<SyncContext>) -> SyncResponse<Disconnected> {
    let result = ctx
        .tokens
        .disconnect()
        .await
        .map(|disconnected| Disconnected { disconnected });
    SyncResponse::from_result("disconnect", result)
}

/// `GET /api/quickbooks/sync-log?limit=N`, newest first
pub async fn sync_log(
    State(ctx): State<SyncContext>,
    query: Result<Query<SyncLogQuery>, QueryRejection>,
) -> SyncResponse<SyncLogPage> {
    let result = async {
        let Query(params) = query.map_err(|r| BackendError::invalid(r.body_text()))?;
        let limit = params.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT);
        let entries = recent_sync_log(&ctx.pool, limit).await?;
        Ok(SyncLogPage { entries })
    }
    .await;
    SyncResponse::from_result("sync-log", result)
}

/// `GET /health`; fails with 503 when the database does not answer
pub async fn health(State(ctx): State<SyncContext>) -> Result<Json<serde_json::Value>, BackendError> {
    sqlx::query("SELECT 1").execute(&ctx.pool).await.map_err(|e| {
        tracing::error!("Health check failed: {}", e);
        BackendError::handler(StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
    })?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}
