//! Scripted browser used by the scraper and pipeline tests.
//!
//! `FakeWeb` maps URLs to page behaviour and records every lifecycle call
//! so tests can assert that pages, contexts, and sessions were closed.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use pack_pricer::browser::{BrowserLauncher, BrowserSession, LaunchOptions, PricePage, PriceProbe};
use pack_pricer::config::TargetConfig;
use pack_pricer::filter::ResourceFilter;

pub const URL_TEMPLATE: &str = "https://prices.test/player?spid={id}&grade={grade}";

/// What a page does once navigated to a URL.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Price element ready on the first probe.
    Price(String),
    /// Price element ready after `n` empty probes.
    PriceAfter(usize, String),
    /// Never becomes ready.
    Never,
    /// `goto` fails.
    NavError,
    /// `goto` never completes.
    NavHang,
    /// Every probe fails.
    ProbeError,
    /// The first `n` probes fail, then the price is ready.
    ProbeErrorThen(usize, String),
}

#[derive(Debug, Default)]
pub struct Counters {
    pub launches: usize,
    pub sessions_closed: usize,
    pub contexts_opened: usize,
    pub contexts_closed: usize,
    pub pages_opened: usize,
    pub pages_closed: usize,
    pub filters_installed: usize,
    pub visited: Vec<String>,
}

#[derive(Default)]
struct State {
    pages: HashMap<String, Behavior>,
    counters: Counters,
    fail_launch: bool,
    fail_new_page: bool,
    filter_failures: usize,
    fail_session_close: bool,
}

#[derive(Clone, Default)]
pub struct FakeWeb {
    state: Arc<Mutex<State>>,
}

impl FakeWeb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the page for `(id, grade)` under [`URL_TEMPLATE`].
    pub fn page(self, id: &str, grade: u8, behavior: Behavior) -> Self {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(url_for(id, grade), behavior);
        self
    }

    pub fn fail_launch(self) -> Self {
        self.state.lock().unwrap().fail_launch = true;
        self
    }

    pub fn fail_new_page(self) -> Self {
        self.state.lock().unwrap().fail_new_page = true;
        self
    }

    /// Fail `block_resources` on the next `n` pages.
    pub fn fail_filter(self, n: usize) -> Self {
        self.state.lock().unwrap().filter_failures = n;
        self
    }

    pub fn fail_session_close(self) -> Self {
        self.state.lock().unwrap().fail_session_close = true;
        self
    }

    pub fn with<T>(&self, f: impl FnOnce(&Counters) -> T) -> T {
        f(&self.state.lock().unwrap().counters)
    }

    pub fn launcher(&self) -> FakeLauncher {
        FakeLauncher { web: self.clone() }
    }

    fn behavior(&self, url: &str) -> Behavior {
        self.state
            .lock()
            .unwrap()
            .pages
            .get(url)
            .cloned()
            .unwrap_or(Behavior::Never)
    }
}

pub fn url_for(id: &str, grade: u8) -> String {
    URL_TEMPLATE
        .replace("{id}", id)
        .replace("{grade}", &grade.to_string())
}

/// Target settings pointing at the fake site, with default timeouts.
pub fn target() -> TargetConfig {
    TargetConfig {
        url_template: URL_TEMPLATE.to_string(),
        ..TargetConfig::default()
    }
}

pub struct FakeLauncher {
    pub web: FakeWeb,
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    type Session = FakeSession;

    async fn launch(&self, _options: &LaunchOptions) -> Result<FakeSession> {
        let mut state = self.web.state.lock().unwrap();
        if state.fail_launch {
            bail!("browser binary not found");
        }
        state.counters.launches += 1;
        Ok(FakeSession {
            web: self.web.clone(),
        })
    }
}

pub struct FakeSession {
    web: FakeWeb,
}

#[async_trait]
impl BrowserSession for FakeSession {
    type Page = FakePage;

    async fn open_context(&mut self) -> Result<()> {
        self.web.state.lock().unwrap().counters.contexts_opened += 1;
        Ok(())
    }

    async fn new_page(&mut self) -> Result<FakePage> {
        let mut state = self.web.state.lock().unwrap();
        if state.fail_new_page {
            bail!("target crashed");
        }
        state.counters.pages_opened += 1;
        Ok(FakePage {
            web: self.web.clone(),
            behavior: None,
            probes: 0,
        })
    }

    async fn close_context(&mut self) -> Result<()> {
        self.web.state.lock().unwrap().counters.contexts_closed += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.web.state.lock().unwrap();
        state.counters.sessions_closed += 1;
        if state.fail_session_close {
            bail!("browser already gone");
        }
        Ok(())
    }
}

pub struct FakePage {
    web: FakeWeb,
    behavior: Option<Behavior>,
    probes: usize,
}

#[async_trait]
impl PricePage for FakePage {
    async fn block_resources(&mut self, _filter: Arc<ResourceFilter>) -> Result<()> {
        let mut state = self.web.state.lock().unwrap();
        if state.filter_failures > 0 {
            state.filter_failures -= 1;
            bail!("Fetch.enable rejected");
        }
        state.counters.filters_installed += 1;
        Ok(())
    }

    async fn goto(&mut self, url: &str) -> Result<()> {
        self.web
            .state
            .lock()
            .unwrap()
            .counters
            .visited
            .push(url.to_string());
        let behavior = self.web.behavior(url);
        match behavior {
            Behavior::NavError => bail!("net::ERR_CONNECTION_RESET"),
            Behavior::NavHang => std::future::pending::<()>().await,
            _ => {}
        }
        self.behavior = Some(behavior);
        Ok(())
    }

    async fn probe_price(&mut self, _probe: &PriceProbe) -> Result<Option<String>> {
        self.probes += 1;
        Ok(match &self.behavior {
            Some(Behavior::Price(text)) => Some(text.clone()),
            Some(Behavior::PriceAfter(n, text)) if self.probes > *n => Some(text.clone()),
            Some(Behavior::ProbeError) => bail!("Execution context was destroyed"),
            Some(Behavior::ProbeErrorThen(n, _)) if self.probes <= *n => {
                bail!("Execution context was destroyed")
            }
            Some(Behavior::ProbeErrorThen(_, text)) => Some(text.clone()),
            _ => None,
        })
    }

    async fn close(self) -> Result<()> {
        self.web.state.lock().unwrap().counters.pages_closed += 1;
        Ok(())
    }
}
