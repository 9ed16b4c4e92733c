//! Scripted in-memory renderer for pipeline tests.

use super::{NavigationResult, RenderContext, Renderer};
use crate::config::WaitUntil;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared record of calls made against fake contexts.
pub type EventLog = Arc<Mutex<Vec<&'static str>>>;

/// Page with a canned document and a fixed number of matching rows.
#[derive(Clone)]
pub struct FakeContext {
    pub html: String,
    pub rows: u64,
    pub nav_error: Option<String>,
    pub nav_delay: Duration,
    pub consent_button: bool,
    pub script_error: bool,
    pub content_error: bool,
    /// Result of the in-page cell read; `None` makes it return null.
    pub cells: Option<serde_json::Value>,
    pub events: EventLog,
}

impl FakeContext {
    /// A page whose row count reports `rows` rows.
    pub fn with_rows(rows: u64) -> Self {
        Self {
            html: "<html><body><p>loading</p></body></html>".to_string(),
            rows,
            nav_error: None,
            nav_delay: Duration::ZERO,
            consent_button: false,
            script_error: false,
            content_error: false,
            cells: None,
            events: Arc::default(),
        }
    }

    /// A page rendering `html`, with the row count reporting `rows`.
    pub fn with_html(html: &str, rows: u64) -> Self {
        Self {
            html: html.to_string(),
            ..Self::with_rows(rows)
        }
    }

    fn record(&self, event: &'static str) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl RenderContext for FakeContext {
    async fn navigate(&mut self, url: &str, _wait_until: WaitUntil) -> Result<NavigationResult> {
        self.record("navigate");
        tokio::time::sleep(self.nav_delay).await;
        if let Some(e) = &self.nav_error {
            return Err(anyhow!("{e}"));
        }
        Ok(NavigationResult {
            final_url: url.to_string(),
            title: Some("Water level".to_string()),
            load_time_ms: self.nav_delay.as_millis() as u64,
        })
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        if self.script_error {
            return Err(anyhow!("Execution context was destroyed"));
        }
        if script.starts_with("document.querySelectorAll(") {
            return Ok(serde_json::json!(self.rows));
        }
        if script.contains("querySelectorAll('td')") {
            return Ok(self.cells.clone().unwrap_or(serde_json::Value::Null));
        }
        if script.contains("btn.click()") {
            if self.consent_button {
                self.record("consent");
            }
            return Ok(serde_json::Value::Bool(self.consent_button));
        }
        Ok(serde_json::Value::Null)
    }

    async fn get_url(&self) -> Result<String> {
        Ok("https://example.com/waterlevel".to_string())
    }

    async fn content(&self) -> Result<String> {
        if self.content_error {
            return Err(anyhow!("Target closed"));
        }
        Ok(self.html.clone())
    }

    async fn screenshot_full_page(&self, path: &Path) -> Result<()> {
        self.record("screenshot");
        std::fs::write(path, b"\x89PNG\r\n\x1a\nfake")?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.record("close");
        Ok(())
    }
}

/// Hands out clones of a template context, or fails to launch.
pub struct FakeRenderer {
    pub template: FakeContext,
    pub launch_error: Option<String>,
}

impl FakeRenderer {
    pub fn new(template: FakeContext) -> Self {
        Self {
            template,
            launch_error: None,
        }
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.template.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        if let Some(e) = &self.launch_error {
            return Err(anyhow!("{e}"));
        }
        self.template.record("launch");
        Ok(Box::new(self.template.clone()))
    }
}
