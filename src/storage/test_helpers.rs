//! Shared test helpers for modules that read SQLite.

use chrono::NaiveDate;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::storage::run_migrations;

/// Creates an in-memory database with the PlanningSOL schema.
///
/// Single connection: every connection to `sqlite::memory:` is its own database.
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

pub async fn insert_customer(pool: &SqlitePool, id: i64, name: &str, is_active: bool) {
    sqlx::query("INSERT INTO customers (id, name, is_active) VALUES (?, ?, ?)")
        .bind(id)
        .bind(name)
        .bind(is_active)
        .execute(pool)
        .await
        .expect("Failed to insert customer");
}

pub async fn insert_gas_cylinder_order(
    pool: &SqlitePool,
    id: i64,
    scheduled_date: NaiveDate,
    location: &str,
) {
    sqlx::query(
        "INSERT INTO gas_cylinder_orders (
            id, order_number, customer_name, gas_type, gas_grade, cylinder_size,
            cylinder_count, scheduled_date, status, location
        ) VALUES (?, ?, ?, 'co2', 'medical', '50L', 4, ?, 'completed', ?)",
    )
    .bind(id)
    .bind(format!("GC-{id:04}"))
    .bind("Air Liquide")
    .bind(scheduled_date.format("%Y-%m-%d").to_string())
    .bind(location)
    .execute(pool)
    .await
    .expect("Failed to insert gas cylinder order");
}
