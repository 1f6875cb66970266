//! Browser abstraction and session lifecycle.
//!
//! The scraper talks to the browser through three small async traits so
//! that the Chromium backend ([`crate::chromium`]) and the scripted fakes
//! used in tests are interchangeable:
//!
//! ```text
//! BrowserLauncher ──launch──▶ BrowserSession ──new_page──▶ PricePage
//!                             (one context per batch)      (one per pair)
//! ```
//!
//! [`SessionManager`] owns at most one live session. `acquire` closes a
//! stale session before launching a new one; `release` closes whatever is
//! open. The scraper pairs the two around every batch.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::BrowserConfig;
use crate::filter::ResourceFilter;

/// Arguments passed to every launched browser process.
pub const DEFAULT_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-gpu",
    "--no-zygote",
    "--ignore-certificate-errors",
];

/// How to start a browser.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    /// `None` lets the launcher pick its default executable.
    pub executable: Option<PathBuf>,
    pub args: Vec<String>,
    /// Upper bound on a single DevTools round-trip.
    pub request_timeout: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            args: DEFAULT_ARGS.iter().map(|a| a.to_string()).collect(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl LaunchOptions {
    pub fn from_config(config: &BrowserConfig) -> Self {
        Self {
            headless: config.headless,
            executable: config.resolve_executable(),
            ..Self::default()
        }
    }
}

/// Selector/attribute pair identifying the price element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceProbe {
    pub selector: String,
    /// The element counts as ready once this attribute is non-blank.
    pub ready_attribute: String,
}

/// Starts browser processes.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    type Session: BrowserSession;

    async fn launch(&self, options: &LaunchOptions) -> Result<Self::Session>;
}

/// A running browser.
#[async_trait]
pub trait BrowserSession: Send {
    type Page: PricePage;

    /// Create the isolated context that subsequent pages open in.
    async fn open_context(&mut self) -> Result<()>;

    /// Open a blank page in the current context.
    async fn new_page(&mut self) -> Result<Self::Page>;

    /// Dispose the current context, if any.
    async fn close_context(&mut self) -> Result<()>;

    /// Shut the browser down.
    async fn close(&mut self) -> Result<()>;
}

/// One tab used for a single (entity, grade) lookup.
#[async_trait]
pub trait PricePage: Send {
    /// Route every request of this page through `filter`.
    async fn block_resources(&mut self, filter: Arc<ResourceFilter>) -> Result<()>;

    /// Navigate and wait for the document to be parsed.
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// One DOM check: `Some(text)` once the price element is ready.
    async fn probe_price(&mut self, probe: &PriceProbe) -> Result<Option<String>>;

    async fn close(self) -> Result<()>;
}

/// Owns the single live browser session.
pub struct SessionManager<L: BrowserLauncher> {
    launcher: L,
    options: LaunchOptions,
    active: Option<L::Session>,
}

impl<L: BrowserLauncher> SessionManager<L> {
    pub fn new(launcher: L, options: LaunchOptions) -> Self {
        Self {
            launcher,
            options,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Return a fresh session, closing any previous one first.
    pub async fn acquire(&mut self) -> Result<&mut L::Session> {
        if let Some(mut stale) = self.active.take() {
            match stale.close().await {
                Ok(()) => info!("previous browser closed"),
                Err(e) => warn!(error = %e, "failed to close previous browser"),
            }
        }

        let session = self.launcher.launch(&self.options).await?;
        info!(headless = self.options.headless, "browser launched");
        Ok(self.active.insert(session))
    }

    /// Close the active session. Close errors are logged, not returned.
    pub async fn release(&mut self) {
        if let Some(mut session) = self.active.take() {
            match session.close().await {
                Ok(()) => info!("browser closed"),
                Err(e) => warn!(error = %e, "failed to close browser"),
            }
        }
    }
}
