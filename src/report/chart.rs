// Chart image backends. The Chromium renderer draws a Chart.js line chart on a canvas in a
// headless page and screenshots it as PNG.

use super::TrendChart;
use crate::error::with_cleanup;
use crate::session_repo::shutdown_browser;
use anyhow::Context;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use futures_util::StreamExt;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::instrument;

#[async_trait]
pub trait ChartRenderer: Send + Sync {
    /// Write `chart` as an image at `path`, replacing any previous file.
    async fn render(&self, chart: &TrendChart, path: &Path) -> anyhow::Result<()>;
}

/// Chart.js configuration for `chart`. Animation is off so the first frame is final.
pub fn chart_js_config(chart: &TrendChart) -> serde_json::Value {
    let datasets: Vec<serde_json::Value> = chart
        .series
        .iter()
        .map(|s| {
            json!({
                "label": s.label,
                "data": s.points,
                "borderColor": s.color,
                "backgroundColor": s.color,
                "fill": false,
                "spanGaps": false,
            })
        })
        .collect();
    json!({
        "type": "line",
        "data": { "labels": chart.labels, "datasets": datasets },
        "options": {
            "responsive": false,
            "animation": false,
            "plugins": {
                "title": { "display": true, "text": chart.title },
                "subtitle": { "display": true, "text": chart.subtitle },
                "legend": { "position": "bottom" }
            }
        }
    })
}

#[derive(Debug, Clone)]
pub struct ChromiumChartConfig {
    pub chart_js_url: String,
    pub width: u32,
    pub height: u32,
    pub chrome_executable: Option<PathBuf>,
}

pub struct ChromiumChartRenderer {
    config: ChromiumChartConfig,
}

impl ChromiumChartRenderer {
    pub fn new(config: ChromiumChartConfig) -> Self {
        Self { config }
    }

    fn draw_script(&self, chart: &TrendChart) -> anyhow::Result<String> {
        let config = serde_json::to_string(&chart_js_config(chart))?;
        let src = serde_json::to_string(&self.config.chart_js_url)?;
        Ok(format!(
            r#"new Promise((resolve, reject) => {{
                const script = document.createElement("script");
                script.src = {src};
                script.onerror = () => reject(new Error("failed to load Chart.js"));
                script.onload = () => {{
                    document.body.style.margin = "0";
                    document.body.style.background = "white";
                    const canvas = document.createElement("canvas");
                    canvas.width = {width};
                    canvas.height = {height};
                    document.body.appendChild(canvas);
                    new Chart(canvas.getContext("2d"), {config});
                    resolve(true);
                }};
                document.head.appendChild(script);
            }})"#,
            width = self.config.width,
            height = self.config.height,
        ))
    }
}

#[async_trait]
impl ChartRenderer for ChromiumChartRenderer {
    #[instrument(
        skip(self, chart),
        fields(repo = "chart", operation = "render", path = %path.display())
    )]
    async fn render(&self, chart: &TrendChart, path: &Path) -> anyhow::Result<()> {
        let mut builder =
            BrowserConfig::builder().window_size(self.config.width, self.config.height);
        if let Some(exe) = &self.config.chrome_executable {
            builder = builder.chrome_executable(exe);
        }
        let browser_config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("browser config: {}", e))?;
        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("Failed to launch browser for chart")?;
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let drawn = async {
            let page = browser.new_page("about:blank").await?;
            page.evaluate(self.draw_script(chart)?)
                .await
                .context("Failed to draw chart")?;
            page.save_screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
                path,
            )
            .await
            .context("Failed to save chart screenshot")?;
            anyhow::Ok(())
        }
        .await;

        let closed = shutdown_browser(&mut browser, handler_task).await;
        with_cleanup(drawn, closed, "chart browser close")
    }
}
