//! Run orchestration: catalogue → scrape → persist → rank → pack → merge.
//!
//! Every configured pack is processed in order. Per-item scrape failures
//! and a failed price batch are logged and absorbed; anything that stops
//! the report from being written (catalogue query, record lookup, merge,
//! save) aborts the run.

use anyhow::{Context, Result};
use pack_pricer_core::catalogue::Catalogue;
use pack_pricer_core::models::AggregateDocument;
use pack_pricer_core::pack::{build_pack, merge_and_persist};
use pack_pricer_core::persist::persist_results;
use pack_pricer_core::ranking::rank;
use pack_pricer_core::store::Store;
use tracing::{error, info};

use crate::browser::{BrowserLauncher, LaunchOptions, SessionManager};
use crate::catalogue::SqliteCatalogue;
use crate::chromium::ChromiumLauncher;
use crate::config::Config;
use crate::db;
use crate::filter::ResourceFilter;
use crate::migrate;
use crate::scraper::PriceScraper;
use crate::sqlite_store::SqliteStore;

/// Per-pack counters, returned for reporting and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackSummary {
    pub name: String,
    pub candidates: usize,
    pub scraped: usize,
    pub failed: usize,
    pub persisted: bool,
    pub ranked: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub packs: Vec<PackSummary>,
    pub report: AggregateDocument,
}

/// Process all packs in `config` and write the merged report.
pub async fn run_pipeline<C, S, L>(
    config: &Config,
    catalogue: &C,
    store: &S,
    sessions: &mut SessionManager<L>,
) -> Result<RunSummary>
where
    C: Catalogue + ?Sized,
    S: Store + ?Sized,
    L: BrowserLauncher,
{
    let scraper = PriceScraper::new(
        config.target.clone(),
        ResourceFilter::from_config(&config.filter),
    );

    let mut packs = Vec::with_capacity(config.packs.len());
    let mut summaries = Vec::with_capacity(config.packs.len());

    for def in &config.packs {
        info!(pack = %def.name, grades = ?def.grades, limit = ?def.limit, "processing pack");

        let entities = catalogue
            .candidates(&def.query())
            .await
            .with_context(|| format!("catalogue query failed for pack '{}'", def.name))?;
        info!(pack = %def.name, candidates = entities.len(), "candidates selected");

        let results = scraper.scrape(sessions, &entities, &def.grades).await?;
        let failed = results.iter().filter(|r| r.price.is_failed()).count();

        let persisted = match persist_results(store, &results).await {
            Ok(0) => {
                info!(pack = %def.name, "no prices to save");
                true
            }
            Ok(n) => {
                info!(pack = %def.name, saved = n, "prices saved");
                true
            }
            Err(e) => {
                error!(pack = %def.name, error = %format!("{:#}", e), "price batch not saved");
                false
            }
        };

        let ranked = rank(&results, def.limit);
        let built = build_pack(store, &def.name, &ranked).await?;

        summaries.push(PackSummary {
            name: def.name.clone(),
            candidates: entities.len(),
            scraped: results.len(),
            failed,
            persisted,
            ranked: ranked.len(),
            dropped: built.dropped,
        });
        packs.push(built.pack);
    }

    let report = merge_and_persist(store, &config.report.id, packs, config.report.offset()).await?;
    info!(
        report = %report.id,
        packs = report.packs.len(),
        update_time = %report.update_time.to_rfc3339(),
        "report updated"
    );

    Ok(RunSummary {
        packs: summaries,
        report,
    })
}

/// Production entry point: SQLite store and catalogue, Chromium browser.
pub async fn run(config: &Config) -> Result<RunSummary> {
    let pool = db::connect(config).await?;
    migrate::apply_schema(&pool).await?;

    let catalogue = SqliteCatalogue::new(pool.clone());
    let store = SqliteStore::new(pool.clone());
    let mut sessions = SessionManager::new(
        ChromiumLauncher,
        LaunchOptions::from_config(&config.browser),
    );

    let outcome = run_pipeline(config, &catalogue, &store, &mut sessions).await;
    sessions.release().await;
    pool.close().await;
    outcome
}
