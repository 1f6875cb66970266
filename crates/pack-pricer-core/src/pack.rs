//! Pack assembly and aggregate-report merging.
//!
//! A pack is a named top-N list of ranked prices, each entry pointing at
//! the persisted [`PriceRecord`](crate::models::PriceRecord) of its entity.
//! Packs from one run are merged into the stored [`AggregateDocument`] by
//! name:
//!
//! - a pack whose name already exists replaces that pack wholesale
//!   (entries are never merged individually);
//! - a pack with a new name is appended;
//! - stored packs not produced by this run stay untouched, in place.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, warn};

use crate::models::{AggregateDocument, Pack, PriceResult, RankedEntry};
use crate::store::Store;

/// Result of [`build_pack`]: the pack plus how many ranked entries had no
/// persisted record and were left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackBuild {
    pub pack: Pack,
    pub dropped: usize,
}

/// Resolve ranked results to record references and assemble a pack.
///
/// Order follows `ranked`. Results whose entity has no price record are
/// dropped and counted.
pub async fn build_pack<S: Store + ?Sized>(
    store: &S,
    name: &str,
    ranked: &[PriceResult],
) -> Result<PackBuild> {
    let mut entries = Vec::with_capacity(ranked.len());
    let mut dropped = 0usize;

    for result in ranked {
        let record = store
            .find_price_record(&result.id)
            .await
            .with_context(|| format!("price record lookup failed for {}", result.id))?;

        match record {
            Some(record) => entries.push(RankedEntry {
                grade: result.grade,
                price_record: record.record_id,
            }),
            None => {
                debug!(pack = name, id = %result.id, "no price record; entry dropped");
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        warn!(pack = name, dropped, "ranked entries without a price record were dropped");
    }

    Ok(PackBuild {
        pack: Pack {
            name: name.to_string(),
            entries,
        },
        dropped,
    })
}

/// Merge `incoming` packs into `existing` (or an empty report).
pub fn merge_packs(
    existing: Option<AggregateDocument>,
    report_id: &str,
    incoming: Vec<Pack>,
    now: DateTime<FixedOffset>,
) -> AggregateDocument {
    let mut packs = existing.map(|doc| doc.packs).unwrap_or_default();

    for pack in incoming {
        match packs.iter_mut().find(|p| p.name == pack.name) {
            Some(slot) => *slot = pack,
            None => packs.push(pack),
        }
    }

    AggregateDocument {
        id: report_id.to_string(),
        update_time: now,
        packs,
    }
}

/// Current time expressed in `offset`.
pub fn report_time(offset: FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset)
}

/// Load the stored report, merge `incoming`, stamp it, and save it back.
///
/// This is the single write that finalizes a run. Errors are returned
/// unchanged in kind; the previous document stays intact on failure.
pub async fn merge_and_persist<S: Store + ?Sized>(
    store: &S,
    report_id: &str,
    incoming: Vec<Pack>,
    offset: FixedOffset,
) -> Result<AggregateDocument> {
    let existing = store
        .load_report(report_id)
        .await
        .with_context(|| format!("failed to load report '{}'", report_id))?;

    let merged = merge_packs(existing, report_id, incoming, report_time(offset));

    store
        .save_report(&merged)
        .await
        .with_context(|| format!("failed to save report '{}'", report_id))?;

    Ok(merged)
}
