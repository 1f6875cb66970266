//! Bulk persistence of scrape results.
//!
//! Every [`PriceResult`] becomes one upsert keyed by `(entity id, grade)`,
//! and the whole set is handed to the store as a single batch. The caller
//! decides what a failed batch means; the pipeline logs it and keeps
//! ranking with the in-memory results.

use anyhow::{Context, Result};

use crate::models::{PriceResult, PriceUpsert};
use crate::store::Store;

/// Stage and submit one upsert per result. Returns the number staged.
///
/// An empty slice returns `Ok(0)` without touching the store.
pub async fn persist_results<S: Store + ?Sized>(store: &S, results: &[PriceResult]) -> Result<usize> {
    if results.is_empty() {
        return Ok(0);
    }

    let batch: Vec<PriceUpsert> = results.iter().map(PriceUpsert::from).collect();
    store
        .upsert_prices(&batch)
        .await
        .with_context(|| format!("bulk upsert of {} price(s) failed", batch.len()))?;

    Ok(batch.len())
}
