//! Candidate selection interface.
//!
//! The catalogue decides which entities a pack considers. The pipeline
//! only sees this trait; the application crate backs it with SQLite.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Entity;

/// Filter for one pack's candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogueQuery {
    /// Season codes. Empty means every season.
    pub seasons: Vec<u32>,
    /// Minimum rating. Values of 10 or below disable the filter.
    pub min_rating: u32,
}

/// Source of scrape candidates.
#[async_trait]
pub trait Catalogue: Send + Sync {
    async fn candidates(&self, query: &CatalogueQuery) -> Result<Vec<Entity>>;
}
