use crate::models::MetricSet;
use crate::session_repo::AuthCookie;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub target: TargetConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub lighthouse: LighthouseConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub component: String,
    #[serde(default = "default_auth_cookie_name")]
    pub auth_cookie_name: String,
    /// Env var holding the cookie value; the value itself never lives in the file.
    #[serde(default = "default_auth_cookie_env")]
    pub auth_cookie_env: String,
}

fn default_auth_cookie_name() -> String {
    "VtexIdclientAutCookie".into()
}

fn default_auth_cookie_env() -> String {
    "VTEX_ID_CLIENT_AUT_COOKIE".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SamplingConfig {
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_metric_set")]
    pub metric_set: String,
}

fn default_iterations() -> u32 {
    5
}

fn default_interval_ms() -> u64 {
    3 * 60 * 1000
}

fn default_metric_set() -> String {
    "general".into()
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            interval_ms: default_interval_ms(),
            metric_set: default_metric_set(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
}

fn default_storage_dir() -> PathBuf {
    "data".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_debugging_port")]
    pub debugging_port: u16,
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,
}

fn default_debugging_port() -> u16 {
    9222
}

fn default_true() -> bool {
    true
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debugging_port: default_debugging_port(),
            headless: true,
            chrome_executable: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LighthouseConfig {
    #[serde(default = "default_lighthouse_binary")]
    pub binary: PathBuf,
}

fn default_lighthouse_binary() -> PathBuf {
    "lighthouse".into()
}

impl Default for LighthouseConfig {
    fn default() -> Self {
        Self {
            binary: default_lighthouse_binary(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_chart_js_url")]
    pub chart_js_url: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_output_dir() -> PathBuf {
    "reports".into()
}

fn default_chart_js_url() -> String {
    "https://cdn.jsdelivr.net/npm/chart.js".into()
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            chart_js_url: default_chart_js_url(),
            width: default_width(),
            height: default_height(),
        }
    }
}

/// Everything one workflow run needs, resolved from file, environment and CLI.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub url: Url,
    pub component: String,
    pub auth_cookie: Option<AuthCookie>,
    pub iterations: u32,
    pub interval: Duration,
    pub metric_set: MetricSet,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("reading {}: {}", path, e))?;
        let mut config: AppConfig = toml::from_str(&s)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests). No environment overrides.
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// `URL` and `COMPONENT` override the target section.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("URL").filter(|v| !v.is_empty()) {
            self.target.url = url;
        }
        if let Some(component) = lookup("COMPONENT").filter(|v| !v.is_empty()) {
            self.target.component = component;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = Url::parse(&self.target.url).map_err(|e| {
            anyhow::anyhow!(
                "target.url must be a valid URL ({}): {:?}",
                e,
                self.target.url
            )
        })?;
        anyhow::ensure!(
            matches!(url.scheme(), "http" | "https"),
            "target.url must be http or https, got {}",
            url.scheme()
        );
        anyhow::ensure!(
            !self.target.component.trim().is_empty(),
            "target.component must be non-empty"
        );
        anyhow::ensure!(
            !self.target.auth_cookie_name.is_empty(),
            "target.auth_cookie_name must be non-empty"
        );
        anyhow::ensure!(
            self.sampling.iterations > 0,
            "sampling.iterations must be > 0, got {}",
            self.sampling.iterations
        );
        self.metric_set()?;
        anyhow::ensure!(
            !self.storage.dir.as_os_str().is_empty(),
            "storage.dir must be non-empty"
        );
        anyhow::ensure!(
            self.browser.debugging_port > 0,
            "browser.debugging_port must be between 1 and 65535, got {}",
            self.browser.debugging_port
        );
        anyhow::ensure!(
            !self.lighthouse.binary.as_os_str().is_empty(),
            "lighthouse.binary must be non-empty"
        );
        anyhow::ensure!(
            !self.report.output_dir.as_os_str().is_empty(),
            "report.output_dir must be non-empty"
        );
        anyhow::ensure!(
            self.report.width > 0 && self.report.height > 0,
            "report.width and report.height must be > 0, got {}x{}",
            self.report.width,
            self.report.height
        );
        Ok(())
    }

    pub fn metric_set(&self) -> anyhow::Result<MetricSet> {
        self.sampling
            .metric_set
            .parse::<MetricSet>()
            .map_err(|e| anyhow::anyhow!("sampling.metric_set: {}", e))
    }

    /// Resolve the run configuration; the cookie value comes from `lookup(auth_cookie_env)`.
    pub fn workflow_config(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<WorkflowConfig> {
        let auth_cookie = lookup(&self.target.auth_cookie_env)
            .filter(|v| !v.is_empty())
            .map(|value| AuthCookie {
                name: self.target.auth_cookie_name.clone(),
                value,
            });
        Ok(WorkflowConfig {
            url: Url::parse(&self.target.url)?,
            component: self.target.component.clone(),
            auth_cookie,
            iterations: self.sampling.iterations,
            interval: Duration::from_millis(self.sampling.interval_ms),
            metric_set: self.metric_set()?,
        })
    }
}
