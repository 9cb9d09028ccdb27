//! Entity importer tests

use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use fieldops_sync::backend::db::directory::{find_customer_by_name, get_customer, insert_product};
use fieldops_sync::backend::db::documents::{get_estimate, get_invoice};
use fieldops_sync::backend::db::line_items::list_line_items;
use fieldops_sync::backend::db::mappings::{find_by_local, find_by_remote, set_status_by_remote};
use fieldops_sync::backend::db::sync_log::recent_sync_log;
use fieldops_sync::backend::sync::importer::{import_customers, import_estimates, import_invoices, run_import};
use fieldops_sync::backend::db::LineItemOwner;
use fieldops_sync::shared::accounting::{EntityType, ImportKind, MappingStatus, SyncRunStatus};

use crate::common::{count_rows, seed_customer, seed_estimate, seed_invoice, seed_mapping, TestEnv};
use crate::{assert_amount, assert_contains};

fn remote_invoice(id: &str, number: &str, customer: (&str, &str), balance: f64) -> Value {
    json!({
        "Id": id,
        "DocNumber": number,
        "TxnDate": "2024-03-01",
        "DueDate": "2024-03-31",
        "CustomerRef": { "value": customer.0, "name": customer.1 },
        "Line": [
            {
                "Id": "1", "LineNum": 1, "Description": "Crew day", "Amount": 400.0,
                "DetailType": "SalesItemLineDetail",
                "SalesItemLineDetail": { "ItemRef": { "value": "9", "name": "Labor" }, "Qty": 2, "UnitPrice": 200 }
            },
            {
                "Id": "2", "LineNum": 2, "Description": "Permit", "Amount": 50.0,
                "DetailType": "SalesItemLineDetail",
                "SalesItemLineDetail": { "ItemRef": { "value": "12", "name": "Fees" } }
            },
            { "Amount": 450.0, "DetailType": "SubTotalLineDetail", "SubTotalLineDetail": {} }
        ],
        "TxnTaxDetail": { "TotalTax": 36.0 },
        "TotalAmt": 486.0,
        "Balance": balance
    })
}

#[tokio::test]
async fn test_invoice_import_is_idempotent() {
    let env = TestEnv::connected().await;
    let customer = seed_customer(env.pool(), "Acme Staffing").await;
    seed_mapping(env.pool(), EntityType::Customer, customer.id, "58", Utc::now()).await;
    let labor = insert_product(env.pool(), "Labor").await.unwrap();
    seed_mapping(env.pool(), EntityType::Product, labor, "9", Utc::now()).await;
    env.mock
        .mount_query(
            "FROM Invoice",
            "Invoice",
            json!([remote_invoice("501", "1001", ("58", "Acme Staffing"), 186.0)]),
        )
        .await;

    let first = import_invoices(&env.ctx).await.unwrap();
    assert_eq!((first.imported, first.updated, first.skipped), (1, 0, 0));
    assert_eq!(first.status, SyncRunStatus::Success);

    let mapping = find_by_remote(env.pool(), EntityType::Invoice, "501").await.unwrap().unwrap();
    let invoice = get_invoice(env.pool(), mapping.local_id).await.unwrap().unwrap();
    assert_eq!(invoice.invoice_number, "1001");
    assert_eq!(invoice.customer_id, customer.id);
    assert_amount!(invoice.subtotal, 450.0);
    assert_amount!(invoice.tax_amount, 36.0);
    assert_amount!(invoice.amount_paid, 300.0);
    assert_eq!(invoice.status, "partially_paid");

    let lines = list_line_items(env.pool(), LineItemOwner::Invoice, invoice.id).await.unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].item_name.as_deref(), Some("Labor"));
    assert_eq!(lines[0].product_id, Some(labor));
    assert_eq!(lines[1].product_id, None);
    assert_amount!(lines[1].quantity, 1.0);
    assert_amount!(lines[1].unit_price, 50.0);

    let second = import_invoices(&env.ctx).await.unwrap();
    assert_eq!((second.imported, second.updated, second.skipped), (0, 1, 0));
    assert_eq!(count_rows(env.pool(), "invoices").await, 1);
    assert_eq!(count_rows(env.pool(), "invoice_line_items").await, 2);
    assert_eq!(count_rows(env.pool(), "invoice_mappings").await, 1);
}

#[tokio::test]
async fn test_unmapped_customer_is_skipped_and_reported() {
    let env = TestEnv::connected().await;
    let customer = seed_customer(env.pool(), "Acme Staffing").await;
    let existing = seed_invoice(env.pool(), customer.id, "1001").await;
    seed_mapping(env.pool(), EntityType::Invoice, existing.id, "501", Utc::now()).await;
    env.mock
        .mount_query(
            "FROM Invoice",
            "Invoice",
            json!([
                remote_invoice("501", "1001", ("77", "Northwind Builders"), 0.0),
                remote_invoice("502", "1002", ("77", "Northwind Builders"), 0.0)
            ]),
        )
        .await;

    let summary = import_invoices(&env.ctx).await.unwrap();

    assert_eq!((summary.imported, summary.updated, summary.skipped), (0, 0, 2));
    assert_eq!(summary.unmapped_customers, vec!["Northwind Builders".to_string()]);
    assert!(summary.errors.is_empty());
    assert_eq!(count_rows(env.pool(), "invoices").await, 1);
    assert_eq!(count_rows(env.pool(), "customers").await, 1);

    let stored = get_invoice(env.pool(), existing.id).await.unwrap().unwrap();
    assert_amount!(stored.total, 100.0);
    assert_eq!(stored.status, "sent");
}

#[tokio::test]
async fn test_bad_record_is_reported_and_run_continues() {
    let env = TestEnv::connected().await;
    let customer = seed_customer(env.pool(), "Acme Staffing").await;
    seed_mapping(env.pool(), EntityType::Customer, customer.id, "58", Utc::now()).await;
    let mut broken = remote_invoice("503", "1003", ("58", "Acme Staffing"), 0.0);
    broken["TotalAmt"] = json!("not a number");
    env.mock
        .mount_query(
            "FROM Invoice",
            "Invoice",
            json!([broken, remote_invoice("504", "1004", ("58", "Acme Staffing"), 0.0)]),
        )
        .await;

    let summary = import_invoices(&env.ctx).await.unwrap();

    assert_eq!(summary.imported, 1);
    assert_eq!(summary.errors.len(), 1);
    assert_contains!(summary.errors[0], "Invoice 1003");
    assert_eq!(summary.status, SyncRunStatus::Partial);

    let log = recent_sync_log(env.pool(), 1).await.unwrap();
    assert_eq!(log[0].entity_type, "invoice");
    assert_eq!(log[0].action, "import");
    assert_eq!(log[0].status, SyncRunStatus::Partial);
    assert_eq!(log[0].details.as_ref().unwrap()["imported"], 1);
}

#[tokio::test]
async fn test_estimate_reimport_replaces_lines() {
    let env = TestEnv::connected().await;
    let customer = seed_customer(env.pool(), "Acme Staffing").await;
    seed_mapping(env.pool(), EntityType::Customer, customer.id, "58", Utc::now()).await;

    let estimate = |total: f64, lines: Value| {
        json!({
            "Id": "130", "DocNumber": "EST-0012", "TxnStatus": "Pending",
            "CustomerRef": { "value": "58", "name": "Acme Staffing" },
            "Line": lines, "TotalAmt": total
        })
    };
    let item = |n: i64, amount: f64| {
        json!({
            "LineNum": n, "Amount": amount, "DetailType": "SalesItemLineDetail",
            "SalesItemLineDetail": { "ItemRef": { "value": "9", "name": "Labor" }, "Qty": 1, "UnitPrice": amount }
        })
    };

    env.mock
        .mount_query("FROM Estimate", "Estimate", json!([estimate(300.0, json!([item(1, 100.0), item(2, 200.0)]))]))
        .await;
    let first = import_estimates(&env.ctx).await.unwrap();
    assert_eq!(first.imported, 1);

    env.mock.server.reset().await;
    env.mock
        .mount_query(
            "FROM Estimate",
            "Estimate",
            json!([{
                "Id": "130", "DocNumber": "EST-0012", "TxnStatus": "Accepted",
                "CustomerRef": { "value": "58", "name": "Acme Staffing" },
                "Line": [item(1, 750.0)], "TotalAmt": 750.0
            }]),
        )
        .await;
    let second = run_import(&env.ctx, ImportKind::Estimates).await.unwrap();
    assert_eq!(second.updated, 1);

    let mapping = find_by_remote(env.pool(), EntityType::Estimate, "130").await.unwrap().unwrap();
    let stored = get_estimate(env.pool(), mapping.local_id).await.unwrap().unwrap();
    assert_amount!(stored.total, 750.0);
    assert_eq!(stored.status, "approved");
    assert_eq!(count_rows(env.pool(), "estimate_line_items").await, 1);
}

#[tokio::test]
async fn test_mapped_estimate_with_unmapped_customer_is_left_alone() {
    let env = TestEnv::connected().await;
    let customer = seed_customer(env.pool(), "Acme Staffing").await;
    let existing = seed_estimate(env.pool(), customer.id, "EST-0012", 300.0).await;
    seed_mapping(env.pool(), EntityType::Estimate, existing.id, "130", Utc::now()).await;
    env.mock
        .mount_query(
            "FROM Estimate",
            "Estimate",
            json!([{
                "Id": "130", "DocNumber": "EST-0012", "TxnStatus": "Accepted",
                "CustomerRef": { "value": "77", "name": "Northwind Builders" },
                "Line": [], "TotalAmt": 980.0
            }]),
        )
        .await;

    let summary = import_estimates(&env.ctx).await.unwrap();

    assert_eq!((summary.updated, summary.skipped), (0, 1));
    assert_eq!(summary.unmapped_customers, vec!["Northwind Builders".to_string()]);
    let stored = get_estimate(env.pool(), existing.id).await.unwrap().unwrap();
    assert_amount!(stored.total, 300.0);
}

#[tokio::test]
async fn test_voided_mapping_is_not_overwritten() {
    let env = TestEnv::connected().await;
    let customer = seed_customer(env.pool(), "Acme Staffing").await;
    seed_mapping(env.pool(), EntityType::Customer, customer.id, "58", Utc::now()).await;
    env.mock
        .mount_query(
            "FROM Invoice",
            "Invoice",
            json!([remote_invoice("501", "1001", ("58", "Acme Staffing"), 486.0)]),
        )
        .await;
    import_invoices(&env.ctx).await.unwrap();
    set_status_by_remote(env.pool(), EntityType::Invoice, "501", MappingStatus::Voided)
        .await
        .unwrap();

    let summary = import_invoices(&env.ctx).await.unwrap();

    assert_eq!((summary.updated, summary.skipped), (0, 1));
    let mapping = find_by_remote(env.pool(), EntityType::Invoice, "501").await.unwrap().unwrap();
    assert_eq!(mapping.sync_status, MappingStatus::Voided);
}

#[tokio::test]
async fn test_customer_import_links_by_name_and_creates_missing() {
    let env = TestEnv::connected().await;
    let existing = seed_customer(env.pool(), "Acme Staffing").await;
    env.mock
        .mount_query(
            "FROM Customer WHERE Active = true",
            "Customer",
            json!([
                { "Id": "58", "DisplayName": "ACME STAFFING" },
                { "Id": "59", "DisplayName": "Northwind Builders", "PrimaryEmailAddr": { "Address": "ap@northwind.example" } },
                { "Id": "60", "DisplayName": "   " }
            ]),
        )
        .await;

    let summary = import_customers(&env.ctx).await.unwrap();

    assert_eq!((summary.imported, summary.skipped), (2, 1));
    let linked = find_by_local(env.pool(), EntityType::Customer, existing.id).await.unwrap().unwrap();
    assert_eq!(linked.remote_id, "58");

    let created = find_customer_by_name(env.pool(), "northwind builders").await.unwrap().unwrap();
    assert_eq!(created.email.as_deref(), Some("ap@northwind.example"));
    assert_eq!(count_rows(env.pool(), "customers").await, 2);

    let again = import_customers(&env.ctx).await.unwrap();
    assert_eq!((again.imported, again.updated), (0, 2));
    assert_eq!(count_rows(env.pool(), "customer_mappings").await, 2);
    let renamed = get_customer(env.pool(), existing.id).await.unwrap().unwrap();
    assert_eq!(renamed.name, "ACME STAFFING");
}
