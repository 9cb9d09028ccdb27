/**
 * Webhook Handler
 *
 * Receives QuickBooks change notifications.
 *
 * # Request Rules
 *
 * - `GET ?challenge=<token>` echoes the token as `text/plain`
 * - any other non-POST request is answered with 405
 * - a POST must carry `intuit-signature`, the base64 HMAC-SHA256 of the raw
 *   body keyed with the verifier token; missing or wrong signatures get 401
 * - once verified, the response is always 200 and per-change outcomes are
 *   reported in the body
 *
 * # Dispatch
 *
 * Changes are routed through [`WebhookDispatcher`], a table keyed by the
 * QuickBooks entity name. Only `Estimate` is registered; every other entity
 * is logged and reported as `ignored`.
 */

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, FixedOffset, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::importer::apply_remote_estimate;
use super::SyncContext;
use crate::backend::db::mappings::{find_by_remote, set_status_by_remote};
use crate::backend::db::sync_log::append_sync_log;
use crate::backend::error::BackendError;
use crate::backend::quickbooks::types::QbEstimate;
use crate::backend::server::state::AppState;
use crate::shared::accounting::{EntityType, MappingStatus, SyncRunStatus};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the payload signature
pub const SIGNATURE_HEADER: &str = "intuit-signature";

/// Reason reported when the local copy is at least as new as the remote one
pub const UP_TO_DATE_REASON: &str = "Local is up to date";

/// Skip reason for changes to a record whose remote copy was deleted
pub const VOIDED_REASON: &str = "Mapping is voided";

// ─────────────────────────────────────────────────────────────────────────────
// Payload
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    #[serde(default)]
    pub event_notifications: Vec<EventNotification>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventNotification {
    pub realm_id: String,
    #[serde(default)]
    pub data_change_event: Option<DataChangeEvent>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DataChangeEvent {
    #[serde(default)]
    pub entities: Vec<EntityChange>,
}

/// One changed record
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityChange {
    pub name: String,
    pub id: String,
    pub operation: String,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl EntityChange {
    pub fn is_removal(&self) -> bool {
        matches!(self.operation.as_str(), "Delete" | "Void")
    }

    /// `lastUpdated` as sent; QuickBooks writes offsets both as `-07:00` and `-0700`
    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.last_updated.as_deref()?.trim();
        DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::<FixedOffset>::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Results
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOutcome {
    Updated,
    Voided,
    Skipped,
    Ignored,
    Failed,
}

/// Outcome of one change, as reported in the webhook response
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeResult {
    pub entity: String,
    pub id: String,
    pub operation: String,
    pub outcome: ChangeOutcome,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChangeResult {
    fn new(change: &EntityChange, outcome: ChangeOutcome) -> Self {
        Self {
            entity: change.name.clone(),
            id: change.id.clone(),
            operation: change.operation.clone(),
            outcome,
            skipped: matches!(outcome, ChangeOutcome::Skipped),
            reason: None,
            error: None,
        }
    }

    fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub success: bool,
    pub results: Vec<ChangeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Signature
// ─────────────────────────────────────────────────────────────────────────────

/// base64(HMAC-SHA256(verifier_token, body))
pub fn compute_signature(verifier_token: &str, body: &[u8]) -> String {
    // HMAC takes keys of any length, so construction cannot fail
    let Ok(mut mac) = HmacSha256::new_from_slice(verifier_token.as_bytes()) else {
        return String::new();
    };
    mac.update(body);
    general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

/// Check a signature header value against the body, in constant time
pub fn verify_signature(verifier_token: &str, body: &[u8], signature: &str) -> bool {
    let Ok(provided) = general_purpose::STANDARD.decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(verifier_token.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&provided).is_ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────────────────

/// Applies one kind of entity change to the local database
#[async_trait]
pub trait EntityChangeHandler: Send + Sync {
    async fn handle(&self, ctx: &SyncContext, change: &EntityChange) -> Result<ChangeResult, BackendError>;
}

/// Change handlers keyed by QuickBooks entity name
#[derive(Clone)]
pub struct WebhookDispatcher {
    handlers: HashMap<String, Arc<dyn EntityChangeHandler>>,
}

impl WebhookDispatcher {
    /// A dispatcher with no handlers; every change is ignored
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, entity_name: &str, handler: Arc<dyn EntityChangeHandler>) {
        self.handlers.insert(entity_name.to_string(), handler);
    }

    pub fn handles(&self, entity_name: &str) -> bool {
        self.handlers.contains_key(entity_name)
    }

    /// Route one change; errors become a `failed` result
    pub async fn dispatch(&self, ctx: &SyncContext, change: &EntityChange) -> ChangeResult {
        let Some(handler) = self.handlers.get(&change.name) else {
            tracing::info!("Ignoring webhook change for unhandled entity {} {}", change.name, change.id);
            return ChangeResult::new(change, ChangeOutcome::Ignored).with_reason("Entity type not handled");
        };

        match handler.handle(ctx, change).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!("Webhook change {} {} failed: {}", change.name, change.id, err);
                let mut result = ChangeResult::new(change, ChangeOutcome::Failed);
                result.error = Some(err.message());
                result
            }
        }
    }
}

impl Default for WebhookDispatcher {
    fn default() -> Self {
        let mut dispatcher = Self::empty();
        dispatcher.register(EntityType::Estimate.remote_name(), Arc::new(EstimateChangeHandler));
        dispatcher
    }
}

/// Re-syncs a mapped estimate from QuickBooks
pub struct EstimateChangeHandler;

impl EstimateChangeHandler {
    async fn apply(&self, ctx: &SyncContext, change: &EntityChange) -> Result<ChangeResult, BackendError> {
        if change.is_removal() {
            let changed =
                set_status_by_remote(&ctx.pool, EntityType::Estimate, &change.id, MappingStatus::Voided).await?;
            if changed == 0 {
                return Ok(ChangeResult::new(change, ChangeOutcome::Skipped).with_reason("No local mapping"));
            }
            tracing::info!("Estimate {} voided remotely, mapping marked voided", change.id);
            return Ok(ChangeResult::new(change, ChangeOutcome::Voided));
        }

        let Some(mapping) = find_by_remote(&ctx.pool, EntityType::Estimate, &change.id).await? else {
            tracing::debug!("Estimate {} has no local mapping, skipping", change.id);
            return Ok(ChangeResult::new(change, ChangeOutcome::Skipped).with_reason("No local mapping"));
        };
        if mapping.sync_status == MappingStatus::Voided {
            tracing::debug!("Estimate {} is voided locally, ignoring {}", change.id, change.operation);
            return Ok(ChangeResult::new(change, ChangeOutcome::Skipped).with_reason(VOIDED_REASON));
        }

        let conn = ctx.tokens.get_valid_token().await?;
        let remote: QbEstimate = ctx.client.get_entity(&conn, EntityType::Estimate, &change.id).await?;
        let fetched_at = Utc::now();

        let remote_updated = remote.meta_data.last_updated_time.or_else(|| change.last_updated_at());
        if let Some(updated) = remote_updated {
            if updated <= mapping.last_synced_at {
                return Ok(ChangeResult::new(change, ChangeOutcome::Skipped).with_reason(UP_TO_DATE_REASON));
            }
        }

        apply_remote_estimate(ctx, &mapping, &remote, fetched_at).await?;
        tracing::info!("Estimate {} updated from webhook", change.id);
        Ok(ChangeResult::new(change, ChangeOutcome::Updated))
    }
}

#[async_trait]
impl EntityChangeHandler for EstimateChangeHandler {
    async fn handle(&self, ctx: &SyncContext, change: &EntityChange) -> Result<ChangeResult, BackendError> {
        let result = self.apply(ctx, change).await;

        let (status, error) = match &result {
            Ok(r) if r.outcome == ChangeOutcome::Skipped => (SyncRunStatus::Skipped, None),
            Ok(_) => (SyncRunStatus::Success, None),
            Err(e) => (SyncRunStatus::Failed, Some(e.message())),
        };
        let details = serde_json::json!({ "remoteId": change.id, "operation": change.operation });
        let action = format!("webhook_{}", change.operation.to_lowercase());
        if let Err(log_err) = append_sync_log(
            &ctx.pool,
            EntityType::Estimate.as_str(),
            None,
            &action,
            status,
            error.as_deref(),
            Some(&details),
        )
        .await
        {
            tracing::error!("Failed to write sync log: {}", log_err);
        }

        result
    }
}

/// Process every change of a verified payload
pub async fn process_payload(
    ctx: &SyncContext,
    dispatcher: &WebhookDispatcher,
    payload: &WebhookPayload,
) -> Vec<ChangeResult> {
    let mut results = Vec::new();
    for notification in &payload.event_notifications {
        let Some(event) = notification.data_change_event.as_ref() else {
            continue;
        };
        tracing::debug!(realm_id = %notification.realm_id, "Webhook carries {} change(s)", event.entities.len());
        for change in &event.entities {
            results.push(dispatcher.dispatch(ctx, change).await);
        }
    }
    results
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP
// ─────────────────────────────────────────────────────────────────────────────

fn plain(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

/// `GET|POST /api/quickbooks/webhook`
pub async fn handle_webhook(
    State(state): State<AppState>,
    method: Method,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if method == Method::GET {
        if let Some(challenge) = params.get("challenge") {
            return plain(StatusCode::OK, challenge.clone());
        }
    }
    if method != Method::POST {
        return plain(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string());
    }

    let Some(verifier_token) = state.sync.settings.webhook_verifier_token.as_deref() else {
        tracing::warn!("Webhook received but no verifier token is configured");
        return plain(StatusCode::UNAUTHORIZED, "Invalid signature".to_string());
    };
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if signature.is_empty() || !verify_signature(verifier_token, &body, signature) {
        tracing::warn!("Rejected webhook with missing or invalid signature");
        return plain(StatusCode::UNAUTHORIZED, "Invalid signature".to_string());
    }

    let response = match serde_json::from_slice::<WebhookPayload>(&body) {
        Ok(payload) => WebhookResponse {
            success: true,
            results: process_payload(&state.sync, &state.webhooks, &payload).await,
            error: None,
        },
        Err(e) => {
            tracing::error!("Unreadable webhook payload: {}", e);
            WebhookResponse {
                success: false,
                results: Vec::new(),
                error: Some(format!("Invalid payload: {}", e)),
            }
        }
    };

    (StatusCode::OK, Json(response)).into_response()
}
