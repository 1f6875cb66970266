//! Price extraction over a browser session.
//!
//! For every grade (outer loop) and every entity (inner loop) the scraper
//! opens a fresh page in the batch's browser context, installs the
//! [`ResourceFilter`], navigates to the entity's data page, and polls the
//! DOM until the price element is ready or the wait timeout expires.
//!
//! Failures are isolated per (entity, grade) pair: the pair is recorded
//! as [`Price::Failed`](pack_pricer_core::models::Price::Failed) and the
//! batch moves on. The page is closed after every pair; the context and
//! the session are released once the batch ends, whatever the outcome.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use pack_pricer_core::models::{Entity, Grade, PriceResult};
use thiserror::Error;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::browser::{BrowserLauncher, BrowserSession, PricePage, PriceProbe, SessionManager};
use crate::config::TargetConfig;
use crate::filter::ResourceFilter;

/// Why a single (entity, grade) lookup produced no price.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("could not open page: {0:#}")]
    OpenPage(anyhow::Error),
    #[error("could not install request filter: {0:#}")]
    Filter(anyhow::Error),
    #[error("navigation failed: {0:#}")]
    Navigation(anyhow::Error),
    #[error("navigation timed out after {0:?}")]
    NavigationTimeout(Duration),
    #[error("price element not ready after {0:?}")]
    PriceTimeout(Duration),
    #[error("DOM probe still failing at the deadline: {0:#}")]
    Probe(anyhow::Error),
}

/// Scrapes prices for (entity, grade) pairs.
pub struct PriceScraper {
    target: TargetConfig,
    probe: PriceProbe,
    filter: Arc<ResourceFilter>,
}

impl PriceScraper {
    pub fn new(target: TargetConfig, filter: ResourceFilter) -> Self {
        let probe = PriceProbe {
            selector: target.price_selector.clone(),
            ready_attribute: target.ready_attribute.clone(),
        };
        Self {
            target,
            probe,
            filter: Arc::new(filter),
        }
    }

    /// Scrape every pair, grade-major. Returns one result per pair.
    ///
    /// Only a browser launch or context failure is returned as an error;
    /// the session is released in every case.
    pub async fn scrape<L: BrowserLauncher>(
        &self,
        sessions: &mut SessionManager<L>,
        entities: &[Entity],
        grades: &[Grade],
    ) -> Result<Vec<PriceResult>> {
        if entities.is_empty() || grades.is_empty() {
            info!(
                entities = entities.len(),
                grades = grades.len(),
                "nothing to scrape"
            );
            return Ok(Vec::new());
        }

        let outcome = match sessions.acquire().await {
            Ok(session) => self.scrape_batch(session, entities, grades).await,
            Err(e) => Err(e),
        };
        sessions.release().await;
        outcome
    }

    async fn scrape_batch<S: BrowserSession>(
        &self,
        session: &mut S,
        entities: &[Entity],
        grades: &[Grade],
    ) -> Result<Vec<PriceResult>> {
        session.open_context().await?;

        let mut results = Vec::with_capacity(entities.len() * grades.len());
        for &grade in grades {
            for entity in entities {
                results.push(self.scrape_one(session, &entity.id, grade).await);
            }
        }

        if let Err(e) = session.close_context().await {
            warn!(error = %e, "failed to close browser context");
        }

        let failed = results.iter().filter(|r| r.price.is_failed()).count();
        info!(total = results.len(), failed, "scrape batch finished");
        Ok(results)
    }

    async fn scrape_one<S: BrowserSession>(
        &self,
        session: &mut S,
        id: &str,
        grade: Grade,
    ) -> PriceResult {
        let url = self.target.url_for(id, grade);
        info!(%url, "navigating");

        let outcome = match session.new_page().await {
            Ok(mut page) => {
                let outcome = self.extract(&mut page, &url).await;
                if let Err(e) = page.close().await {
                    debug!(error = %e, id, grade, "page close failed");
                }
                outcome
            }
            Err(e) => Err(ScrapeError::OpenPage(e)),
        };

        match outcome {
            Ok(text) => {
                info!(id, grade, price = %text, "price extracted");
                PriceResult::observed(id, grade, text)
            }
            Err(e) => {
                warn!(id, grade, error = %e, "price extraction failed");
                PriceResult::failed(id, grade)
            }
        }
    }

    async fn extract<P: PricePage>(&self, page: &mut P, url: &str) -> Result<String, ScrapeError> {
        page.block_resources(Arc::clone(&self.filter))
            .await
            .map_err(ScrapeError::Filter)?;

        let nav_timeout = self.target.navigation_timeout();
        timeout(nav_timeout, page.goto(url))
            .await
            .map_err(|_| ScrapeError::NavigationTimeout(nav_timeout))?
            .map_err(ScrapeError::Navigation)?;

        // A probe error (e.g. the execution context was replaced by a
        // redirect) only means "not ready yet" until the deadline passes.
        let wait = self.target.wait_timeout();
        let deadline = Instant::now() + wait;
        let mut last_error = None;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match timeout(remaining, page.probe_price(&self.probe)).await {
                Ok(Ok(Some(text))) => return Ok(text),
                Ok(Ok(None)) => last_error = None,
                Ok(Err(e)) => {
                    debug!(error = %e, url, "price probe failed; polling again");
                    last_error = Some(e);
                }
                Err(_) => break,
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            sleep(self.target.poll_interval().min(remaining)).await;
        }

        Err(match last_error {
            Some(e) => ScrapeError::Probe(e),
            None => ScrapeError::PriceTimeout(wait),
        })
    }
}
