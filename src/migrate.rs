use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create all tables and indexes. Idempotent.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    // Catalogue entities (id encodes the season: id / 1_000_000)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entities (
            id INTEGER PRIMARY KEY,
            name TEXT,
            rating INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One price record per entity
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS price_records (
            record_id TEXT PRIMARY KEY,
            entity_id TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Last observed price per (record, grade)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS grade_prices (
            record_id TEXT NOT NULL,
            grade INTEGER NOT NULL,
            price TEXT NOT NULL,
            updated_at INTEGER NOT NULL,
            UNIQUE(record_id, grade),
            FOREIGN KEY (record_id) REFERENCES price_records(record_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Aggregate reports; packs stored as one JSON document per report
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reports (
            id TEXT PRIMARY KEY,
            update_time TEXT NOT NULL,
            packs_json TEXT NOT NULL DEFAULT '[]'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_entities_rating ON entities(rating DESC)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_grade_prices_record ON grade_prices(record_id)")
        .execute(pool)
        .await?;

    Ok(())
}
