//! In-memory [`Store`] implementation for testing.
//!
//! Uses `Vec`/`HashMap` behind `std::sync::RwLock`. Every mutating call
//! bumps a write counter so tests can assert that nothing was written.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{AggregateDocument, GradePrice, PriceRecord, PriceUpsert};

use super::Store;

/// In-memory store for tests.
pub struct InMemoryStore {
    records: RwLock<Vec<PriceRecord>>,
    reports: RwLock<HashMap<String, AggregateDocument>>,
    writes: AtomicUsize,
    fail_price_writes: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            reports: RwLock::new(HashMap::new()),
            writes: AtomicUsize::new(0),
            fail_price_writes: false,
        }
    }

    /// A store whose `upsert_prices` always fails.
    pub fn failing_price_writes() -> Self {
        Self {
            fail_price_writes: true,
            ..Self::new()
        }
    }

    /// Number of mutating calls that reached the store.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn records(&self) -> Vec<PriceRecord> {
        self.records.read().unwrap().clone()
    }

    /// Seed a report without counting it as a pipeline write.
    pub fn insert_report(&self, doc: AggregateDocument) {
        self.reports.write().unwrap().insert(doc.id.clone(), doc);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

#[async_trait]
impl Store for InMemoryStore {
    async fn upsert_prices(&self, batch: &[PriceUpsert]) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_price_writes {
            bail!("price store unavailable");
        }

        let mut records = self.records.write().unwrap();
        let ts = now_ts();
        for item in batch {
            let idx = match records.iter().position(|r| r.entity_id == item.entity_id) {
                Some(idx) => idx,
                None => {
                    records.push(PriceRecord {
                        record_id: Uuid::new_v4().to_string(),
                        entity_id: item.entity_id.clone(),
                        prices: Vec::new(),
                    });
                    records.len() - 1
                }
            };
            let record = &mut records[idx];
            match record.prices.iter_mut().find(|p| p.grade == item.grade) {
                Some(existing) => {
                    existing.price = item.price.clone();
                    existing.updated_at = ts;
                }
                None => record.prices.push(GradePrice {
                    grade: item.grade,
                    price: item.price.clone(),
                    updated_at: ts,
                }),
            }
        }
        Ok(())
    }

    async fn find_price_record(&self, entity_id: &str) -> Result<Option<PriceRecord>> {
        let records = self.records.read().unwrap();
        Ok(records.iter().find(|r| r.entity_id == entity_id).cloned())
    }

    async fn load_report(&self, report_id: &str) -> Result<Option<AggregateDocument>> {
        Ok(self.reports.read().unwrap().get(report_id).cloned())
    }

    async fn save_report(&self, doc: &AggregateDocument) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.reports
            .write()
            .unwrap()
            .insert(doc.id.clone(), doc.clone());
        Ok(())
    }
}
