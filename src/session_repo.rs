// Page session seam and the Chrome implementation (chromiumoxide).
// The browser listens on a fixed remote-debugging port so the audit CLI can attach to it.

use crate::error::with_cleanup;
use anyhow::Context;
use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use futures_util::StreamExt;
use std::path::PathBuf;
use tracing::instrument;
use url::Url;

/// Authentication cookie placed on the target host before auditing.
#[derive(Debug, Clone)]
pub struct AuthCookie {
    pub name: String,
    pub value: String,
}

/// A live page session; closed explicitly once the workflow is done with it.
#[async_trait]
pub trait PageSession: Send {
    async fn close(self: Box<Self>) -> anyhow::Result<()>;
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn open(
        &self,
        url: &Url,
        cookie: Option<&AuthCookie>,
    ) -> anyhow::Result<Box<dyn PageSession>>;
}

#[derive(Debug, Clone)]
pub struct ChromiumSessionConfig {
    pub debugging_port: u16,
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
}

pub struct ChromiumSessionProvider {
    config: ChromiumSessionConfig,
}

impl ChromiumSessionProvider {
    pub fn new(config: ChromiumSessionConfig) -> Self {
        Self { config }
    }

    fn browser_config(&self) -> anyhow::Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder().port(self.config.debugging_port);
        if !self.config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.config.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(|e| anyhow::anyhow!("browser config: {}", e))
    }
}

#[async_trait]
impl SessionProvider for ChromiumSessionProvider {
    #[instrument(skip(self, cookie), fields(repo = "session", operation = "open", url = %url))]
    async fn open(
        &self,
        url: &Url,
        cookie: Option<&AuthCookie>,
    ) -> anyhow::Result<Box<dyn PageSession>> {
        let (mut browser, mut handler) = Browser::launch(self.browser_config()?)
            .await
            .context("Failed to launch browser")?;
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = match open_page(&browser, url, cookie).await {
            Ok(page) => page,
            Err(e) => {
                let closed = shutdown_browser(&mut browser, handler_task).await;
                return with_cleanup(Err(e), closed, "browser close");
            }
        };

        tracing::info!(port = self.config.debugging_port, "browser session ready");
        Ok(Box::new(ChromiumSession {
            browser,
            _page: page,
            handler_task,
        }))
    }
}

async fn open_page(
    browser: &Browser,
    url: &Url,
    cookie: Option<&AuthCookie>,
) -> anyhow::Result<Page> {
    let page = browser
        .new_page(url.as_str())
        .await
        .with_context(|| format!("Failed to open {url}"))?;

    if let Some(cookie) = cookie {
        let host = url
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("url {url} has no host for the auth cookie"))?;
        let param = CookieParam::builder()
            .name(cookie.name.clone())
            .value(cookie.value.clone())
            .domain(host)
            .build()
            .map_err(|e| anyhow::anyhow!("auth cookie: {}", e))?;
        page.set_cookie(param)
            .await
            .context("Failed to set auth cookie")?;
        tracing::debug!(cookie = %cookie.name, host, "auth cookie set");
    } else {
        tracing::debug!("no auth cookie configured");
    }
    Ok(page)
}

/// Close the browser, reap the process and stop its handler task.
pub(crate) async fn shutdown_browser(
    browser: &mut Browser,
    handler_task: tokio::task::JoinHandle<()>,
) -> anyhow::Result<()> {
    let closed = browser.close().await.context("Failed to close browser");
    let exited = browser.wait().await.context("Failed to wait for browser exit");
    handler_task.abort();
    closed?;
    exited?;
    Ok(())
}

struct ChromiumSession {
    browser: Browser,
    _page: Page,
    handler_task: tokio::task::JoinHandle<()>,
}

#[async_trait]
impl PageSession for ChromiumSession {
    async fn close(self: Box<Self>) -> anyhow::Result<()> {
        let ChromiumSession {
            mut browser,
            handler_task,
            ..
        } = *self;
        shutdown_browser(&mut browser, handler_task).await?;
        tracing::debug!("browser session closed");
        Ok(())
    }
}
