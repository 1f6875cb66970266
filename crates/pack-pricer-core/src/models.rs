//! Core data models used throughout pack-pricer.
//!
//! These types represent the catalogue entities, scraped prices, persisted
//! price records, and the aggregate pack report that flow through the
//! scrape → persist → rank → merge pipeline.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::numeral;

/// Upgrade tier of an entity. The observed price depends on it.
pub type Grade = u8;

/// Stored text for a failed extraction.
pub const FAILURE_SENTINEL: &str = "Error";

/// A catalogue entry selected as a scrape candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rating: u32,
}

impl Entity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            rating: 0,
        }
    }
}

/// Outcome of extracting one price from the target page.
#[derive(Debug, Clone, PartialEq)]
pub enum Price {
    /// Text read from the price element.
    Observed(String),
    /// Navigation, polling, or extraction failed.
    Failed,
}

impl Price {
    /// Text written to the price-record store.
    pub fn as_stored(&self) -> &str {
        match self {
            Price::Observed(text) => text,
            Price::Failed => FAILURE_SENTINEL,
        }
    }

    /// Ordering key; failures and unparsable text map to [`numeral::UNPARSABLE`].
    pub fn sort_value(&self) -> f64 {
        match self {
            Price::Observed(text) => numeral::sort_value(text),
            Price::Failed => numeral::UNPARSABLE,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Price::Failed)
    }
}

/// A single scraped (entity, grade) price.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceResult {
    pub id: String,
    pub grade: Grade,
    pub price: Price,
}

impl PriceResult {
    pub fn observed(id: impl Into<String>, grade: Grade, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            grade,
            price: Price::Observed(text.into()),
        }
    }

    pub fn failed(id: impl Into<String>, grade: Grade) -> Self {
        Self {
            id: id.into(),
            grade,
            price: Price::Failed,
        }
    }
}

/// One upsert staged by the bulk persister, keyed by `(entity_id, grade)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceUpsert {
    pub entity_id: String,
    pub grade: Grade,
    pub price: String,
}

impl From<&PriceResult> for PriceUpsert {
    fn from(result: &PriceResult) -> Self {
        Self {
            entity_id: result.id.clone(),
            grade: result.grade,
            price: result.price.as_stored().to_string(),
        }
    }
}

/// Last observed price for one grade inside a [`PriceRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradePrice {
    pub grade: Grade,
    pub price: String,
    /// Unix seconds of the last write.
    pub updated_at: i64,
}

/// Persisted price history for one entity. Grades are unique within a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Storage identifier referenced by [`RankedEntry::price_record`].
    pub record_id: String,
    pub entity_id: String,
    pub prices: Vec<GradePrice>,
}

impl PriceRecord {
    pub fn price_for(&self, grade: Grade) -> Option<&GradePrice> {
        self.prices.iter().find(|p| p.grade == grade)
    }
}

/// A ranked result resolved to its persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub grade: Grade,
    pub price_record: String,
}

/// A named, ranked top-N list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pack {
    pub name: String,
    pub entries: Vec<RankedEntry>,
}

/// The persisted report combining all packs across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateDocument {
    pub id: String,
    pub update_time: DateTime<FixedOffset>,
    pub packs: Vec<Pack>,
}

impl AggregateDocument {
    pub fn pack(&self, name: &str) -> Option<&Pack> {
        self.packs.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_price_stores_sentinel() {
        let result = PriceResult::failed("B", 9);
        let upsert = PriceUpsert::from(&result);
        assert_eq!(upsert.price, FAILURE_SENTINEL);
        assert_eq!(upsert.entity_id, "B");
        assert_eq!(upsert.grade, 9);
    }

    #[test]
    fn test_observed_price_sort_value() {
        let price = Price::Observed("12,000".to_string());
        assert_eq!(price.sort_value(), 12_000.0);
        assert_eq!(Price::Failed.sort_value(), numeral::UNPARSABLE);
    }
}
