//! # pack-pricer
//!
//! Scrapes market prices for catalogue entities with a headless browser,
//! ranks them per upgrade grade, and merges named top-N "packs" into a
//! persisted aggregate report.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌──────────┐   ┌─────────┐   ┌──────────┐
//! │ Catalogue │──▶│ PriceScraper │──▶│ Persist  │──▶│  Rank   │──▶│  Packs   │
//! │ (SQLite)  │   │ (Chromium)   │   │ (upsert) │   │ (top-N) │   │ (merge)  │
//! └───────────┘   └──────────────┘   └──────────┘   └─────────┘   └────┬─────┘
//!                                                                      ▼
//!                                                              aggregate report
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and environment resolution |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite [`Store`](pack_pricer_core::store::Store) |
//! | [`catalogue`] | SQLite candidate selection and import |
//! | [`filter`] | Per-request resource blocking |
//! | [`browser`] | Browser traits and session lifecycle |
//! | [`chromium`] | Chromium backend |
//! | [`scraper`] | Per-pair price extraction |
//! | [`pipeline`] | Run orchestration |
//! | [`report`] | Stored report display |
//!
//! Pure logic (numeral parsing, ranking, pack merging) lives in the
//! `pack-pricer-core` crate.

pub mod browser;
pub mod catalogue;
pub mod chromium;
pub mod config;
pub mod db;
pub mod filter;
pub mod logging;
pub mod migrate;
pub mod pipeline;
pub mod report;
pub mod scraper;
pub mod sqlite_store;
