//! Logging setup.
//!
//! `tracing` events go to stderr through a `tracing-subscriber` fmt layer;
//! stdout stays reserved for command output. Timestamps are written in
//! the report's fixed UTC offset so log lines line up with the stored
//! `update_time`. `RUST_LOG` overrides the default filter.

use std::io::IsTerminal;

use anyhow::{anyhow, Result};
use chrono::{FixedOffset, Utc};
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,sqlx=warn,chromiumoxide=warn";

/// Formats event timestamps in a fixed offset.
struct OffsetTime(FixedOffset);

impl FormatTime for OffsetTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Utc::now().with_timezone(&self.0);
        write!(w, "{}", now.format("%Y-%m-%d %H:%M:%S%.3f %:z"))
    }
}

/// Install the global subscriber. Call once, before any work.
pub fn init(offset: FixedOffset) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(OffsetTime(offset))
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {}", e))
}
