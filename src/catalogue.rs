//! SQLite-backed catalogue of scrape candidates.
//!
//! Entity ids encode their season in the digits above the last six:
//! season `253` owns ids `253_000_000 ..= 253_999_999`. A query lists
//! season codes; only the last three digits of each code are significant,
//! so `"253"`, `253`, and `1253` select the same range.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use sqlx::{Row, SqlitePool};
use std::path::Path;
use tracing::info;

use pack_pricer_core::catalogue::{Catalogue, CatalogueQuery};
use pack_pricer_core::models::Entity;

/// Rows returned per season.
pub const SEASON_ROW_CAP: i64 = 10_000;
/// Ratings at or below this disable the rating filter.
pub const RATING_FILTER_FLOOR: u32 = 10;
const SEASON_SPAN: i64 = 1_000_000;

pub struct SqliteCatalogue {
    pool: SqlitePool,
}

impl SqliteCatalogue {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn select(&self, range: Option<(i64, i64)>, min_rating: Option<i64>) -> Result<Vec<Entity>> {
        let (lo, hi) = range.unwrap_or((i64::MIN, i64::MAX));
        let rows = sqlx::query(
            r#"
            SELECT id, name, rating FROM entities
            WHERE id BETWEEN ? AND ?
              AND (? IS NULL OR rating >= ?)
            ORDER BY rating DESC, id ASC
            LIMIT ?
            "#,
        )
        .bind(lo)
        .bind(hi)
        .bind(min_rating)
        .bind(min_rating)
        .bind(SEASON_ROW_CAP)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let id: i64 = row.get("id");
                let rating: i64 = row.get("rating");
                Entity {
                    id: id.to_string(),
                    name: row.get("name"),
                    rating: u32::try_from(rating).unwrap_or(0),
                }
            })
            .collect())
    }
}

/// Id range owned by a season code.
pub fn season_range(season: u32) -> (i64, i64) {
    let code = i64::from(season % 1_000);
    let lo = code * SEASON_SPAN;
    (lo, lo + SEASON_SPAN - 1)
}

#[async_trait]
impl Catalogue for SqliteCatalogue {
    async fn candidates(&self, query: &CatalogueQuery) -> Result<Vec<Entity>> {
        let min_rating =
            (query.min_rating > RATING_FILTER_FLOOR).then_some(i64::from(query.min_rating));

        if query.seasons.is_empty() {
            return self.select(None, min_rating).await;
        }

        let mut entities = Vec::new();
        for &season in &query.seasons {
            let mut batch = self.select(Some(season_range(season)), min_rating).await?;
            entities.append(&mut batch);
        }
        Ok(entities)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogueRow {
    id: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    rating: u32,
}

/// Load a JSON array of `{ "id", "name", "rating" }` objects into the
/// `entities` table. Existing ids are updated.
pub async fn import_catalogue(pool: &SqlitePool, path: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalogue file: {}", path.display()))?;
    let rows: Vec<CatalogueRow> =
        serde_json::from_str(&content).with_context(|| "Failed to parse catalogue JSON")?;

    let mut tx = pool.begin().await?;
    for row in &rows {
        sqlx::query(
            r#"
            INSERT INTO entities (id, name, rating) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name, rating = excluded.rating
            "#,
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(i64::from(row.rating))
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!(entities = rows.len(), path = %path.display(), "catalogue imported");
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::apply_schema;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;
    use tempfile::TempDir;

    async fn seeded() -> (TempDir, SqliteCatalogue) {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("catalogue.sqlite");
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
            .unwrap()
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        apply_schema(&pool).await.unwrap();

        let json_path = tmp.path().join("entities.json");
        std::fs::write(
            &json_path,
            r#"[
                {"id": 253000001, "name": "low",  "rating": 85},
                {"id": 253000002, "name": "high", "rating": 104},
                {"id": 253000003, "name": "mid",  "rating": 95},
                {"id": 237000001, "name": "mc",   "rating": 99},
                {"id": 100000001, "name": "icon", "rating": 8}
            ]"#,
        )
        .unwrap();
        let imported = import_catalogue(&pool, &json_path).await.unwrap();
        assert_eq!(imported, 5);

        (tmp, SqliteCatalogue::new(pool))
    }

    fn ids(entities: &[Entity]) -> Vec<&str> {
        entities.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_season_range_uses_last_three_digits() {
        assert_eq!(season_range(253), (253_000_000, 253_999_999));
        assert_eq!(season_range(1253), season_range(253));
    }

    #[tokio::test]
    async fn test_season_and_rating_filter() {
        let (_tmp, catalogue) = seeded().await;
        let found = catalogue
            .candidates(&CatalogueQuery {
                seasons: vec![253],
                min_rating: 90,
            })
            .await
            .unwrap();
        assert_eq!(ids(&found), vec!["253000002", "253000003"]);
        assert_eq!(found[0].name.as_deref(), Some("high"));
    }

    #[tokio::test]
    async fn test_low_min_rating_disables_filter() {
        let (_tmp, catalogue) = seeded().await;
        let found = catalogue
            .candidates(&CatalogueQuery {
                seasons: vec![100],
                min_rating: 5,
            })
            .await
            .unwrap();
        assert_eq!(ids(&found), vec!["100000001"]);
    }

    #[tokio::test]
    async fn test_seasons_concatenate_in_order() {
        let (_tmp, catalogue) = seeded().await;
        let found = catalogue
            .candidates(&CatalogueQuery {
                seasons: vec![237, 253],
                min_rating: 95,
            })
            .await
            .unwrap();
        assert_eq!(ids(&found), vec!["237000001", "253000002", "253000003"]);
    }

    #[tokio::test]
    async fn test_no_seasons_queries_everything() {
        let (_tmp, catalogue) = seeded().await;
        let found = catalogue
            .candidates(&CatalogueQuery {
                seasons: vec![],
                min_rating: 0,
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 5);
        assert_eq!(found[0].id, "253000002");
    }
}
