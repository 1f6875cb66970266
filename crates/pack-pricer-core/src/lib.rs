//! # pack-pricer core
//!
//! Runtime-agnostic logic for pack-pricer: price models, numeral parsing,
//! ranking, the storage abstraction, bulk persistence, and pack
//! aggregation.
//!
//! This crate contains no tokio, sqlx, browser, or filesystem
//! dependencies. The application crate supplies a [`store::Store`] and a
//! [`catalogue::Catalogue`] backed by SQLite, plus the browser-driven
//! scraper that produces [`models::PriceResult`]s.

pub mod catalogue;
pub mod models;
pub mod numeral;
pub mod pack;
pub mod persist;
pub mod ranking;
pub mod store;
