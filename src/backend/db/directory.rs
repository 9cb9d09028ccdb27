//! Database operations for customers, vendors and products

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::shared::accounting::{Customer, Vendor};

/// Find a customer by display name, ignoring case
pub async fn find_customer_by_name<'e, E>(
    executor: E,
    name: &str,
) -> Result<Option<Customer>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        SELECT id, name, email
        FROM customers
        WHERE lower(name) = lower(?)
        ORDER BY created_at ASC
        LIMIT 1
        "#,
    )
    .bind(name.trim())
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|r| Customer {
        id: r.get("id"),
        name: r.get("name"),
        email: r.get("email"),
    }))
}

pub async fn get_customer(pool: &SqlitePool, id: Uuid) -> Result<Option<Customer>, sqlx::Error> {
    let row = sqlx::query("SELECT id, name, email FROM customers WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| Customer {
        id: r.get("id"),
        name: r.get("name"),
        email: r.get("email"),
    }))
}

pub async fn insert_customer<'e, E>(
    executor: E,
    name: &str,
    email: Option<&str>,
) -> Result<Customer, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = Uuid::new_v4();

    sqlx::query("INSERT INTO customers (id, name, email, created_at) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(Utc::now())
        .execute(executor)
        .await?;

    Ok(Customer {
        id,
        name: name.to_string(),
        email: email.map(|s| s.to_string()),
    })
}

/// Refresh a customer's name and, when known, email
pub async fn update_customer<'e, E>(
    executor: E,
    id: Uuid,
    name: &str,
    email: Option<&str>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE customers SET name = ?, email = COALESCE(?, email) WHERE id = ?")
        .bind(name)
        .bind(email)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

fn vendor_from_row(r: SqliteRow) -> Vendor {
    Vendor {
        id: r.get("id"),
        name: r.get("name"),
        company_name: r.get("company_name"),
        email: r.get("email"),
        phone: r.get("phone"),
        address_line1: r.get("address_line1"),
        city: r.get("city"),
        state: r.get("state"),
        postal_code: r.get("postal_code"),
        tax_id: r.get("tax_id"),
        is_1099: r.get("is_1099"),
    }
}

pub async fn get_vendor(pool: &SqlitePool, id: Uuid) -> Result<Option<Vendor>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, name, company_name, email, phone, address_line1, city, state,
               postal_code, tax_id, is_1099
        FROM vendors
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(vendor_from_row))
}

pub async fn insert_vendor(pool: &SqlitePool, vendor: &Vendor) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO vendors (id, name, company_name, email, phone, address_line1, city, state,
                             postal_code, tax_id, is_1099, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(vendor.id)
    .bind(&vendor.name)
    .bind(&vendor.company_name)
    .bind(&vendor.email)
    .bind(&vendor.phone)
    .bind(&vendor.address_line1)
    .bind(&vendor.city)
    .bind(&vendor.state)
    .bind(&vendor.postal_code)
    .bind(&vendor.tax_id)
    .bind(vendor.is_1099)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

/// Create a product and return its id
pub async fn insert_product(pool: &SqlitePool, name: &str) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO products (id, name, created_at) VALUES (?, ?, ?)")
        .bind(id)
        .bind(name)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    Ok(id)
}
