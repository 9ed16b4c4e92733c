//! Bounded wait for the station table, with diagnostics on timeout.

use crate::error::ScrapeError;
use crate::renderer::RenderContext;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Diagnostic artifacts written after a table-wait timeout.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub html: Option<PathBuf>,
    pub screenshot: Option<PathBuf>,
}

/// Poll until at least one element matches `selector`.
///
/// One attempt only: if nothing matches within `budget` the wait fails with
/// [`ScrapeError::TableTimeout`]. Script errors while polling count as
/// "not yet present".
pub async fn wait_for_rows(
    context: &dyn RenderContext,
    selector: &str,
    budget: Duration,
    poll_interval: Duration,
) -> Result<u64, ScrapeError> {
    info!(selector, budget_secs = budget.as_secs(), "waiting for table");
    let script = count_script(selector);

    let poll = async {
        loop {
            match context.execute_js(&script).await {
                Ok(value) => {
                    let count = value.as_u64().unwrap_or(0);
                    if count > 0 {
                        return count;
                    }
                }
                Err(e) => debug!("row count failed: {e:#}"),
            }
            tokio::time::sleep(poll_interval).await;
        }
    };

    match tokio::time::timeout(budget, poll).await {
        Ok(count) => {
            info!(rows = count, "table present");
            Ok(count)
        }
        Err(_) => Err(ScrapeError::TableTimeout { timeout: budget }),
    }
}

/// Save the rendered markup and a full-page screenshot.
///
/// Each artifact is attempted independently; failures are logged.
pub async fn capture_diagnostics(
    context: &dyn RenderContext,
    html_path: &Path,
    screenshot_path: &Path,
) -> Diagnostics {
    let mut diagnostics = Diagnostics::default();

    match context.content().await {
        Ok(html) => match tokio::fs::write(html_path, html).await {
            Ok(()) => diagnostics.html = Some(html_path.to_path_buf()),
            Err(e) => warn!("writing {}: {e}", html_path.display()),
        },
        Err(e) => warn!("reading page markup: {e:#}"),
    }

    match context.screenshot_full_page(screenshot_path).await {
        Ok(()) => diagnostics.screenshot = Some(screenshot_path.to_path_buf()),
        Err(e) => warn!("capturing screenshot: {e:#}"),
    }

    info!(
        html = %html_path.display(),
        screenshot = %screenshot_path.display(),
        "diagnostics captured"
    );
    diagnostics
}

/// Expression counting elements that match `selector`.
pub fn count_script(selector: &str) -> String {
    let selector = serde_json::Value::String(selector.to_string());
    format!("document.querySelectorAll({selector}).length")
}
