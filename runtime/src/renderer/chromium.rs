//! Chromium renderer over the DevTools protocol.

use super::{NavigationResult, RenderContext, Renderer};
use crate::config::{BrowserProfile, WaitUntil};
use crate::stealth::{behavior, fingerprint};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat,
};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Quiet window after which the network counts as idle.
const NETWORK_QUIET: Duration = Duration::from_millis(500);

/// Resource loads that may still finish inside a quiet window, matching
/// puppeteer's `networkidle2`.
const NETWORK_IDLE_TOLERANCE: u64 = 2;

/// Counts finished resource loads in `window.__resourceLoads`.
///
/// The observer is not bounded by the resource-timing buffer, which stops
/// at 250 entries.
const RESOURCE_OBSERVER_JS: &str = r#"
(() => {
    window.__resourceLoads = 0;
    new PerformanceObserver((list) => {
        window.__resourceLoads += list.getEntries().length;
    }).observe({ type: 'resource', buffered: true });
})();
"#;

/// Finished resource loads, falling back to the timing buffer.
const RESOURCE_COUNT_JS: &str = "window.__resourceLoads ?? performance.getEntriesByType('resource').length";

/// Launches one headless Chromium per context.
pub struct ChromiumRenderer {
    profile: BrowserProfile,
    executable: Option<PathBuf>,
}

impl ChromiumRenderer {
    pub fn new(profile: BrowserProfile, executable: Option<PathBuf>) -> Self {
        Self {
            profile,
            executable,
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let (width, height) = self.profile.window_size;
        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .request_timeout(self.profile.navigation_timeout);

        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        if std::env::var("WATERLEVEL_NO_SANDBOX").is_ok() {
            builder = builder.no_sandbox();
        }
        for arg in &self.profile.launch_args {
            builder = builder.arg(arg.as_str());
        }
        if let Some(locale) = &self.profile.locale {
            builder = builder.arg(format!("--lang={locale}"));
        }

        builder.build().map_err(|e| anyhow!("invalid browser config: {e}"))
    }

    async fn prepare_page(&self, page: &Page) -> Result<()> {
        if self.profile.wait_until == WaitUntil::NetworkIdle {
            page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(
                RESOURCE_OBSERVER_JS.to_string(),
            ))
            .await
            .context("installing resource observer")?;
        }
        if let Some(ua) = &self.profile.user_agent {
            let mut params = SetUserAgentOverrideParams::new(ua.clone());
            params.accept_language = self.profile.locale.clone();
            page.set_user_agent(params)
                .await
                .context("setting user agent")?;
        }
        if self.profile.patch_fingerprint {
            page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(
                fingerprint::stealth_script().to_string(),
            ))
            .await
            .context("injecting fingerprint patch")?;
        }
        Ok(())
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let config = self.browser_config()?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .context("launching chromium")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser event error: {e}");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler_task.abort();
                return Err(anyhow!("opening page: {e}"));
            }
        };

        let ctx = ChromiumContext {
            browser,
            page,
            handler_task,
            settle_delay: self.profile.settle_delay,
        };
        let prepared = self.prepare_page(&ctx.page).await;
        if let Err(e) = prepared {
            let _ = Box::new(ctx).close().await;
            return Err(e);
        }

        info!(profile = ?self.profile.kind, "browser session started");
        Ok(Box::new(ctx))
    }
}

/// A single page in a dedicated Chromium process.
pub struct ChromiumContext {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    settle_delay: bool,
}

/// Sliding quiet window over the finished-resource count.
struct IdleWindow {
    baseline: u64,
    since: Instant,
}

impl IdleWindow {
    fn new(count: u64, now: Instant) -> Self {
        Self {
            baseline: count,
            since: now,
        }
    }

    /// Record a sample. True once a full [`NETWORK_QUIET`] window passed
    /// with no more than [`NETWORK_IDLE_TOLERANCE`] new loads.
    fn observe(&mut self, count: u64, now: Instant) -> bool {
        if count < self.baseline || count - self.baseline > NETWORK_IDLE_TOLERANCE {
            self.baseline = count;
            self.since = now;
            return false;
        }
        now.duration_since(self.since) >= NETWORK_QUIET
    }
}

impl ChromiumContext {
    /// Approximate network idle from finished resource loads.
    ///
    /// Requests still in flight are invisible to the page, so a load that
    /// stalls longer than [`NETWORK_QUIET`] without finishing counts as idle.
    async fn wait_for_network_idle(&self) -> Result<()> {
        let mut window = IdleWindow::new(self.resource_count().await?, Instant::now());
        loop {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if window.observe(self.resource_count().await?, Instant::now()) {
                return Ok(());
            }
        }
    }

    async fn resource_count(&self) -> Result<u64> {
        let value = self.execute_js(RESOURCE_COUNT_JS).await?;
        Ok(value.as_u64().unwrap_or(0))
    }
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, wait_until: WaitUntil) -> Result<NavigationResult> {
        let start = Instant::now();
        // goto resolves on the load event, past DOMContentLoaded.
        self.page
            .goto(url)
            .await
            .with_context(|| format!("navigating to {url}"))?;

        if wait_until == WaitUntil::NetworkIdle {
            self.wait_for_network_idle().await?;
        }
        if self.settle_delay {
            behavior::sleep_page_load_delay().await;
        }

        let final_url = self.get_url().await.unwrap_or_else(|_| url.to_string());
        let title = self.page.get_title().await.ok().flatten();

        Ok(NavigationResult {
            final_url,
            title,
            load_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("evaluating script")?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn get_url(&self) -> Result<String> {
        self.page
            .url()
            .await
            .context("reading page url")?
            .ok_or_else(|| anyhow!("page has no url"))
    }

    async fn content(&self) -> Result<String> {
        self.page.content().await.context("reading page content")
    }

    async fn screenshot_full_page(&self, path: &Path) -> Result<()> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.page
            .save_screenshot(params, path)
            .await
            .with_context(|| format!("saving screenshot to {}", path.display()))?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let ChromiumContext {
            mut browser,
            handler_task,
            ..
        } = *self;

        let closed = browser.close().await;
        if let Err(e) = browser.wait().await {
            warn!("waiting for chromium exit: {e}");
        }
        handler_task.abort();
        closed.context("closing browser")?;
        debug!("browser session closed");
        Ok(())
    }
}
