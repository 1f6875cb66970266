//! Stored report display for `pack-pricer show`.
//!
//! Resolves every pack entry back to its entity and stored price so the
//! report reads as a ranked price list rather than a list of record ids.

use anyhow::Result;
use pack_pricer_core::store::Store;
use serde::Serialize;
use sqlx::Row;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    pub id: String,
    pub update_time: String,
    pub packs: Vec<PackView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackView {
    pub name: String,
    pub entries: Vec<EntryView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
    pub rank: usize,
    pub record_id: String,
    pub grade: u8,
    pub entity_id: Option<String>,
    pub price: Option<String>,
}

/// Build the display form of a stored report.
pub async fn load_report_view(store: &SqliteStore, report_id: &str) -> Result<Option<ReportView>> {
    let doc = match store.load_report(report_id).await? {
        Some(doc) => doc,
        None => return Ok(None),
    };

    let mut packs = Vec::with_capacity(doc.packs.len());
    for pack in &doc.packs {
        let mut entries = Vec::with_capacity(pack.entries.len());
        for (i, entry) in pack.entries.iter().enumerate() {
            let row = sqlx::query(
                r#"
                SELECT p.entity_id, g.price
                FROM price_records p
                LEFT JOIN grade_prices g ON g.record_id = p.record_id AND g.grade = ?
                WHERE p.record_id = ?
                "#,
            )
            .bind(entry.grade as i64)
            .bind(&entry.price_record)
            .fetch_optional(store.pool())
            .await?;

            entries.push(EntryView {
                rank: i + 1,
                record_id: entry.price_record.clone(),
                grade: entry.grade,
                entity_id: row.as_ref().map(|r| r.get("entity_id")),
                price: row.as_ref().and_then(|r| r.get("price")),
            });
        }
        packs.push(PackView {
            name: pack.name.clone(),
            entries,
        });
    }

    Ok(Some(ReportView {
        id: doc.id,
        update_time: doc.update_time.to_rfc3339(),
        packs,
    }))
}

pub async fn run_show(config: &Config, json: bool) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let view = load_report_view(&store, &config.report.id).await?;
    pool.close().await;

    let view = match view {
        Some(view) => view,
        None => {
            println!("No report stored for '{}'.", config.report.id);
            return Ok(());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("report {}", view.id);
    println!("  updated: {}", view.update_time);
    for pack in &view.packs {
        println!();
        println!("{} ({} entries)", pack.name, pack.entries.len());
        for entry in &pack.entries {
            println!(
                "  {:>3}. {:<12} +{:<2} {}",
                entry.rank,
                entry.entity_id.as_deref().unwrap_or("?"),
                entry.grade,
                entry.price.as_deref().unwrap_or("-"),
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::apply_schema;
    use chrono::FixedOffset;
    use pack_pricer_core::models::PriceResult;
    use pack_pricer_core::pack::{build_pack, merge_and_persist};
    use pack_pricer_core::persist::persist_results;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_view_resolves_entities_and_prices() {
        let tmp = TempDir::new().unwrap();
        let options =
            SqliteConnectOptions::from_str(&format!("sqlite:{}", tmp.path().join("r.sqlite").display()))
                .unwrap()
                .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        apply_schema(&pool).await.unwrap();
        let store = SqliteStore::new(pool);

        let results = vec![
            PriceResult::observed("A", 9, "12,000"),
            PriceResult::failed("B", 9),
        ];
        persist_results(&store, &results).await.unwrap();
        let pack = build_pack(&store, "X", &results).await.unwrap().pack;
        merge_and_persist(&store, "report", vec![pack], FixedOffset::east_opt(9 * 3600).unwrap())
            .await
            .unwrap();

        let view = load_report_view(&store, "report").await.unwrap().unwrap();
        assert_eq!(view.packs.len(), 1);
        let entries = &view.packs[0].entries;
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[0].entity_id.as_deref(), Some("A"));
        assert_eq!(entries[0].price.as_deref(), Some("12,000"));
        assert_eq!(entries[1].price.as_deref(), Some("Error"));

        assert!(load_report_view(&store, "missing").await.unwrap().is_none());
    }
}
