//! SQLite-backed [`Store`] implementation.
//!
//! Price records live in `price_records` (one row per entity) and
//! `grade_prices` (one row per entity and grade). The aggregate report is
//! a single `reports` row whose packs are serialized as JSON, so a report
//! save is one statement and therefore atomic.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use pack_pricer_core::models::{AggregateDocument, GradePrice, Pack, PriceRecord, PriceUpsert};
use pack_pricer_core::store::Store;

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn upsert_prices(&self, batch: &[PriceUpsert]) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        for item in batch {
            sqlx::query(
                r#"
                INSERT INTO price_records (record_id, entity_id, created_at)
                VALUES (?, ?, ?)
                ON CONFLICT(entity_id) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&item.entity_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO grade_prices (record_id, grade, price, updated_at)
                SELECT record_id, ?, ?, ? FROM price_records WHERE entity_id = ?
                ON CONFLICT(record_id, grade) DO UPDATE SET
                    price = excluded.price,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(item.grade as i64)
            .bind(&item.price)
            .bind(now)
            .bind(&item.entity_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_price_record(&self, entity_id: &str) -> Result<Option<PriceRecord>> {
        let row = sqlx::query(
            "SELECT record_id, entity_id FROM price_records WHERE entity_id = ? ORDER BY created_at ASC LIMIT 1",
        )
        .bind(entity_id)
        .fetch_optional(&self.pool)
        .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };
        let record_id: String = row.get("record_id");

        let price_rows = sqlx::query(
            "SELECT grade, price, updated_at FROM grade_prices WHERE record_id = ? ORDER BY grade ASC",
        )
        .bind(&record_id)
        .fetch_all(&self.pool)
        .await?;

        let prices = price_rows
            .iter()
            .map(|r| {
                let grade: i64 = r.get("grade");
                Ok(GradePrice {
                    grade: u8::try_from(grade)
                        .with_context(|| format!("grade out of range: {}", grade))?,
                    price: r.get("price"),
                    updated_at: r.get("updated_at"),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(PriceRecord {
            record_id,
            entity_id: row.get("entity_id"),
            prices,
        }))
    }

    async fn load_report(&self, report_id: &str) -> Result<Option<AggregateDocument>> {
        let row = sqlx::query("SELECT id, update_time, packs_json FROM reports WHERE id = ?")
            .bind(report_id)
            .fetch_optional(&self.pool)
            .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let update_time: String = row.get("update_time");
        let packs_json: String = row.get("packs_json");
        let packs: Vec<Pack> = serde_json::from_str(&packs_json)
            .with_context(|| format!("corrupt packs in report '{}'", report_id))?;

        Ok(Some(AggregateDocument {
            id: row.get("id"),
            update_time: DateTime::parse_from_rfc3339(&update_time)
                .with_context(|| format!("bad update_time in report '{}'", report_id))?,
            packs,
        }))
    }

    async fn save_report(&self, doc: &AggregateDocument) -> Result<()> {
        let packs_json = serde_json::to_string(&doc.packs)?;

        sqlx::query(
            r#"
            INSERT INTO reports (id, update_time, packs_json) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                update_time = excluded.update_time,
                packs_json = excluded.packs_json
            "#,
        )
        .bind(&doc.id)
        .bind(doc.update_time.to_rfc3339())
        .bind(&packs_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
