// Audit provider seam and the Lighthouse CLI implementation.
// The CLI attaches to the Chrome instance the session provider launched (same debugging port),
// so the auth cookie set on that session applies to the audited page load.

mod raw;

pub use raw::{AuditEntry, CategoryResult, RawAuditResult};

use crate::models::MetricSet;
use anyhow::Context;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tracing::instrument;
use url::Url;

/// Lighthouse categories every audit requests.
pub const CATEGORIES: [&str; 4] = ["performance", "accessibility", "best-practices", "seo"];

#[async_trait]
pub trait AuditProvider: Send + Sync {
    async fn audit(&self, url: &Url, metric_set: MetricSet) -> anyhow::Result<RawAuditResult>;
}

/// Runs the `lighthouse` binary and parses its JSON report from stdout.
pub struct LighthouseCli {
    binary: PathBuf,
    debugging_port: u16,
}

impl LighthouseCli {
    pub fn new(binary: impl Into<PathBuf>, debugging_port: u16) -> Self {
        Self {
            binary: binary.into(),
            debugging_port,
        }
    }

    fn args(&self, url: &Url) -> Vec<String> {
        vec![
            url.to_string(),
            format!("--port={}", self.debugging_port),
            "--output=json".into(),
            "--output-path=stdout".into(),
            format!("--only-categories={}", CATEGORIES.join(",")),
            "--quiet".into(),
        ]
    }
}

#[async_trait]
impl AuditProvider for LighthouseCli {
    #[instrument(
        skip(self),
        fields(
            repo = "audit",
            operation = "lighthouse",
            url = %url,
            metric_set = %metric_set
        )
    )]
    async fn audit(&self, url: &Url, metric_set: MetricSet) -> anyhow::Result<RawAuditResult> {
        let output = tokio::process::Command::new(&self.binary)
            .args(self.args(url))
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("failed to spawn {}", self.binary.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "lighthouse exited with {}: {}",
                output.status,
                stderr.trim()
            );
        }

        let result: RawAuditResult =
            serde_json::from_slice(&output.stdout).context("lighthouse JSON report")?;
        tracing::debug!(
            categories = result.categories.len(),
            audits = result.audits.len(),
            "Lighthouse report parsed"
        );
        Ok(result)
    }
}
