//! Rendering seam between the capture pipeline and a real browser.
//!
//! The pipeline only talks to [`Renderer`] and [`RenderContext`]; the
//! Chromium implementation lives in [`chromium`].

pub mod chromium;
#[cfg(test)]
pub(crate) mod fake;

use crate::config::WaitUntil;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

pub use chromium::ChromiumRenderer;

/// What a completed navigation looked like.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NavigationResult {
    /// URL after redirects.
    pub final_url: String,
    pub title: Option<String>,
    pub load_time_ms: u64,
}

/// A live page inside one browser session.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Load `url` and return once `wait_until` is satisfied.
    async fn navigate(&mut self, url: &str, wait_until: WaitUntil) -> Result<NavigationResult>;

    /// Evaluate a JavaScript expression and return its JSON value.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;

    /// Current document URL.
    async fn get_url(&self) -> Result<String>;

    /// Full rendered markup of the current document.
    async fn content(&self) -> Result<String>;

    /// Write a full-page PNG screenshot to `path`.
    async fn screenshot_full_page(&self, path: &Path) -> Result<()>;

    /// Release the page and its browser session.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Opens browser sessions.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Start a session and return its page.
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
}
