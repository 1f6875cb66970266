//! Chromium backend for the browser traits, driven over the DevTools
//! protocol with `chromiumoxide`.
//!
//! - The protocol handler runs on its own tokio task for the lifetime of
//!   the session.
//! - Each batch gets a fresh browser context so cookies and cache do not
//!   leak between runs.
//! - Request interception is enabled at launch; every page spawns a task
//!   that answers `Fetch.requestPaused` with continue or fail according
//!   to the [`ResourceFilter`].

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::cdp::browser_protocol::page::{EventDomContentEventFired, NavigateParams};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::browser::{BrowserLauncher, BrowserSession, LaunchOptions, PricePage, PriceProbe};
use crate::filter::{ResourceFilter, ResourceKind};

impl From<&ResourceType> for ResourceKind {
    fn from(value: &ResourceType) -> Self {
        match value {
            ResourceType::Document => ResourceKind::Document,
            ResourceType::Stylesheet => ResourceKind::Stylesheet,
            ResourceType::Image => ResourceKind::Image,
            ResourceType::Media => ResourceKind::Media,
            ResourceType::Font => ResourceKind::Font,
            ResourceType::Script => ResourceKind::Script,
            ResourceType::Xhr => ResourceKind::Xhr,
            ResourceType::Fetch => ResourceKind::Fetch,
            _ => ResourceKind::Other,
        }
    }
}

/// Launches local Chromium processes.
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher;

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    type Session = ChromiumSession;

    async fn launch(&self, options: &LaunchOptions) -> Result<ChromiumSession> {
        let mut builder = CdpBrowserConfig::builder()
            .args(options.args.iter().cloned())
            .request_timeout(options.request_timeout)
            .enable_request_intercept();
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("invalid browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch browser")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser handler stopped");
                    break;
                }
            }
        });

        Ok(ChromiumSession {
            browser,
            handler: handler_task,
            context: None,
        })
    }
}

pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    context: Option<BrowserContextId>,
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    type Page = ChromiumPage;

    async fn open_context(&mut self) -> Result<()> {
        let id = self
            .browser
            .create_browser_context(CreateBrowserContextParams::default())
            .await
            .context("failed to create browser context")?;
        self.context = Some(id);
        Ok(())
    }

    async fn new_page(&mut self) -> Result<ChromiumPage> {
        let mut params = CreateTargetParams::new("about:blank");
        params.browser_context_id = self.context.clone();
        let page = self.browser.new_page(params).await?;
        Ok(ChromiumPage {
            page,
            interceptor: None,
        })
    }

    async fn close_context(&mut self) -> Result<()> {
        if let Some(id) = self.context.take() {
            self.browser.dispose_browser_context(id).await?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let closed = self.browser.close().await.map(|_| ());
        if closed.is_ok() {
            if let Err(e) = self.browser.wait().await {
                debug!(error = %e, "browser process wait failed");
            }
        }
        self.handler.abort();
        closed.context("failed to close browser")
    }
}

pub struct ChromiumPage {
    page: Page,
    interceptor: Option<JoinHandle<()>>,
}

/// `Page.navigate` reports network-level failures in `errorText` rather
/// than as a protocol error.
fn check_navigation(url: &str, error_text: Option<&str>) -> Result<()> {
    match error_text {
        Some(error) if !error.is_empty() => bail!("failed to load {}: {}", url, error),
        _ => Ok(()),
    }
}

/// JS expression returning the element text once `attribute` is non-blank,
/// `""` otherwise.
fn probe_script(probe: &PriceProbe) -> Result<String> {
    let selector = serde_json::to_string(&probe.selector)?;
    let attribute = serde_json::to_string(&probe.ready_attribute)?;
    Ok(format!(
        r#"(() => {{
            const el = document.querySelector({selector});
            if (!el) return "";
            const ready = el.getAttribute({attribute});
            if (!ready || ready.trim() === "") return "";
            return (el.textContent || "").trim();
        }})()"#
    ))
}

#[async_trait]
impl PricePage for ChromiumPage {
    async fn block_resources(&mut self, filter: Arc<ResourceFilter>) -> Result<()> {
        let mut paused = self.page.event_listener::<EventRequestPaused>().await?;
        let page = self.page.clone();

        self.interceptor = Some(tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let kind = ResourceKind::from(&event.resource_type);
                let answered = if filter.should_block(kind, &event.request.url) {
                    trace!(url = %event.request.url, ?kind, "request blocked");
                    page.execute(FailRequestParams::new(
                        event.request_id.clone(),
                        ErrorReason::BlockedByClient,
                    ))
                    .await
                    .map(|_| ())
                } else {
                    page.execute(ContinueRequestParams::new(event.request_id.clone()))
                        .await
                        .map(|_| ())
                };
                if let Err(e) = answered {
                    debug!(error = %e, "intercepted request could not be answered");
                }
            }
        }));
        Ok(())
    }

    /// Navigate and return at DOMContentLoaded. `Page::goto` would wait
    /// for the full `load` event, which slow third-party resources can
    /// hold back long after the price is rendered.
    async fn goto(&mut self, url: &str) -> Result<()> {
        let mut parsed = self
            .page
            .event_listener::<EventDomContentEventFired>()
            .await?;

        let navigated = self
            .page
            .execute(NavigateParams::new(url))
            .await
            .with_context(|| format!("failed to navigate to {}", url))?;
        check_navigation(url, navigated.error_text.as_deref())?;

        parsed
            .next()
            .await
            .with_context(|| format!("page went away while loading {}", url))?;
        Ok(())
    }

    async fn probe_price(&mut self, probe: &PriceProbe) -> Result<Option<String>> {
        let text: String = self
            .page
            .evaluate(probe_script(probe)?)
            .await?
            .into_value()?;
        Ok((!text.is_empty()).then_some(text))
    }

    async fn close(self) -> Result<()> {
        if let Some(task) = self.interceptor {
            task.abort();
        }
        self.page.close().await?;
        Ok(())
    }
}
