use anyhow::{Context, Result};
use chrono::{FixedOffset, Offset, Utc};
use pack_pricer_core::catalogue::CatalogueQuery;
use pack_pricer_core::models::Grade;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::filter::ResourceKind;

/// Environment variable selecting production mode (`production`).
pub const APP_ENV_VAR: &str = "APP_ENV";
/// Environment variable overriding the browser executable in production.
pub const CHROME_PATH_VAR: &str = "CHROME_EXECUTABLE_PATH";
const DEFAULT_PRODUCTION_CHROME: &str = "/usr/bin/google-chrome-stable";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    pub report: ReportConfig,
    pub packs: Vec<PackDefinition>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrowserConfig {
    #[serde(default)]
    pub executable_path: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable_path: None,
            headless: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl BrowserConfig {
    /// Browser executable to launch, or `None` for the launcher's default.
    pub fn resolve_executable(&self) -> Option<PathBuf> {
        resolve_executable_from(
            self.executable_path.as_deref(),
            std::env::var(APP_ENV_VAR).ok().as_deref(),
            std::env::var(CHROME_PATH_VAR).ok().as_deref(),
        )
    }
}

/// Explicit path wins; production falls back to `CHROME_EXECUTABLE_PATH`
/// and then the stock Chrome location; otherwise the default browser.
pub fn resolve_executable_from(
    explicit: Option<&Path>,
    app_env: Option<&str>,
    chrome_path: Option<&str>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if app_env != Some("production") {
        return None;
    }
    Some(PathBuf::from(
        chrome_path
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(DEFAULT_PRODUCTION_CHROME),
    ))
}

#[derive(Debug, Deserialize, Clone)]
pub struct TargetConfig {
    #[serde(default = "default_url_template")]
    pub url_template: String,
    #[serde(default = "default_price_selector")]
    pub price_selector: String,
    #[serde(default = "default_ready_attribute")]
    pub ready_attribute: String,
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url_template: default_url_template(),
            price_selector: default_price_selector(),
            ready_attribute: default_ready_attribute(),
            wait_timeout_secs: default_wait_timeout_secs(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_url_template() -> String {
    "https://fconline.nexon.com/DataCenter/PlayerInfo?spid={id}&n1Strong={grade}".to_string()
}
fn default_price_selector() -> String {
    ".txt strong".to_string()
}
fn default_ready_attribute() -> String {
    "title".to_string()
}
fn default_wait_timeout_secs() -> u64 {
    80
}
fn default_navigation_timeout_secs() -> u64 {
    30
}
fn default_poll_interval_ms() -> u64 {
    250
}

impl TargetConfig {
    pub fn url_for(&self, id: &str, grade: Grade) -> String {
        self.url_template
            .replace("{id}", id)
            .replace("{grade}", &grade.to_string())
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilterConfig {
    #[serde(default = "default_blocked_types")]
    pub blocked_types: Vec<ResourceKind>,
    #[serde(default = "default_blocked_domains")]
    pub blocked_domains: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            blocked_types: default_blocked_types(),
            blocked_domains: default_blocked_domains(),
        }
    }
}

fn default_blocked_types() -> Vec<ResourceKind> {
    vec![
        ResourceKind::Image,
        ResourceKind::Stylesheet,
        ResourceKind::Font,
        ResourceKind::Media,
    ]
}

fn default_blocked_domains() -> Vec<String> {
    vec![
        "google-analytics.com".to_string(),
        "doubleclick.net".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    pub id: String,
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

fn default_utc_offset_hours() -> i32 {
    9
}

impl ReportConfig {
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600)
            .unwrap_or_else(|| Utc.fix())
    }
}

/// One named pack: which entities to consider, at which grades, and how
/// many ranked entries to keep.
#[derive(Debug, Deserialize, Clone)]
pub struct PackDefinition {
    pub name: String,
    #[serde(default)]
    pub seasons: Vec<u32>,
    #[serde(default)]
    pub min_rating: u32,
    pub grades: Vec<Grade>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl PackDefinition {
    pub fn query(&self) -> CatalogueQuery {
        CatalogueQuery {
            seasons: self.seasons.clone(),
            min_rating: self.min_rating,
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let target = &config.target;
    if !target.url_template.contains("{id}") || !target.url_template.contains("{grade}") {
        anyhow::bail!("target.url_template must contain {{id}} and {{grade}}");
    }
    if target.price_selector.trim().is_empty() {
        anyhow::bail!("target.price_selector must not be empty");
    }
    if target.wait_timeout_secs == 0 || target.navigation_timeout_secs == 0 {
        anyhow::bail!("target timeouts must be > 0");
    }
    if target.poll_interval_ms == 0 {
        anyhow::bail!("target.poll_interval_ms must be > 0");
    }

    if config.report.id.trim().is_empty() {
        anyhow::bail!("report.id must not be empty");
    }
    if !(-23..=23).contains(&config.report.utc_offset_hours) {
        anyhow::bail!("report.utc_offset_hours must be in [-23, 23]");
    }

    if config.packs.is_empty() {
        anyhow::bail!("at least one [[packs]] entry is required");
    }
    let mut names = HashSet::new();
    for pack in &config.packs {
        if pack.name.trim().is_empty() {
            anyhow::bail!("pack name must not be empty");
        }
        if !names.insert(pack.name.as_str()) {
            anyhow::bail!("duplicate pack name: '{}'", pack.name);
        }
        if pack.grades.is_empty() {
            anyhow::bail!("pack '{}' must list at least one grade", pack.name);
        }
        if pack.limit == Some(0) {
            anyhow::bail!("pack '{}': limit must be >= 1", pack.name);
        }
    }

    Ok(())
}
