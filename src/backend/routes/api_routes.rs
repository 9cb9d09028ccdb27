/**
 * API Route Handlers
 *
 * This module wires the sync endpoints to their handlers.
 *
 * # Routes
 *
 * ## Sync operations
 * - `POST /api/quickbooks/import` - import invoices, estimates or customers
 * - `POST /api/quickbooks/next-number` - next document number
 * - `POST /api/quickbooks/vendors/push` - create or update a vendor
 * - `POST /api/quickbooks/purchase-orders/push` - create a purchase order
 * - `POST /api/quickbooks/bills/push` - create a vendor bill
 * - `POST /api/quickbooks/bills/attachments` - pull bill attachments
 *
 * ## Webhook
 * - `GET|POST /api/quickbooks/webhook` - challenge echo and signed change events
 *
 * ## Connection
 * - `GET /api/quickbooks/status`
 * - `POST /api/quickbooks/connect`
 * - `POST /api/quickbooks/disconnect`
 * - `GET /api/quickbooks/sync-log?limit=`
 */

use axum::routing::{any, get, post};
use axum::Router;

use crate::backend::server::state::AppState;
use crate::backend::sync::handlers::{
    connect, disconnect, health, import, next_number, pull_attachments_handler, push_bill_handler,
    push_purchase_order_handler, push_vendor_handler, status, sync_log,
};
use crate::backend::sync::webhook::handle_webhook;

/// Configure API routes
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/health", get(health))
        // Sync operations
        .route("/api/quickbooks/import", post(import))
        .route("/api/quickbooks/next-number", post(next_number))
        .route("/api/quickbooks/vendors/push", post(push_vendor_handler))
        .route("/api/quickbooks/purchase-orders/push", post(push_purchase_order_handler))
        .route("/api/quickbooks/bills/push", post(push_bill_handler))
        .route("/api/quickbooks/bills/attachments", post(pull_attachments_handler))
        // Webhook answers every method itself (challenge, 405)
        .route("/api/quickbooks/webhook", any(handle_webhook))
        // Connection lifecycle
        .route("/api/quickbooks/status", get(status))
        .route("/api/quickbooks/connect", post(connect))
        .route("/api/quickbooks/disconnect", post(disconnect))
        .route("/api/quickbooks/sync-log", get(sync_log))
}
