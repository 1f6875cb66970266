//! Storage abstraction for pack-pricer.
//!
//! The [`Store`] trait covers the two persisted collections the pipeline
//! touches: per-entity price records and the aggregate pack report.
//! The application crate provides a SQLite implementation; [`memory`]
//! provides an in-memory one for tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{AggregateDocument, PriceRecord, PriceUpsert};

/// Abstract storage backend.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert_prices`](Store::upsert_prices) | Apply a batch of `(entity, grade)` price upserts |
/// | [`find_price_record`](Store::find_price_record) | Look up an entity's price record |
/// | [`load_report`](Store::load_report) | Fetch the aggregate document by report id |
/// | [`save_report`](Store::save_report) | Upsert the whole aggregate document |
#[async_trait]
pub trait Store: Send + Sync {
    /// Apply all upserts as one batch.
    ///
    /// For each item, the record for `entity_id` is created if missing and
    /// its price for `grade` is created or overwritten.
    async fn upsert_prices(&self, batch: &[PriceUpsert]) -> Result<()>;

    /// Return the price record for an entity, if one exists.
    async fn find_price_record(&self, entity_id: &str) -> Result<Option<PriceRecord>>;

    /// Return the aggregate document with the given id, if one exists.
    async fn load_report(&self, report_id: &str) -> Result<Option<AggregateDocument>>;

    /// Write the whole document, replacing any stored version with the same id.
    ///
    /// Must be atomic: either the new document is stored or the old one is
    /// left intact.
    async fn save_report(&self, doc: &AggregateDocument) -> Result<()>;
}
