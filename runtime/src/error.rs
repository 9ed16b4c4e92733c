//! Failure kinds recognized by the capture pipeline.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while capturing the water-level table.
///
/// Only [`ScrapeError::TableTimeout`] is handled locally by the pipeline;
/// every other variant is treated as a navigation failure when deciding
/// what to write to the report file.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The browser could not be started.
    #[error("failed to launch browser: {0}")]
    Launch(String),

    /// The page could not be loaded or rendered.
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// The page did not reach its load condition within the budget.
    #[error("navigation to {url} timed out after {}s", .timeout.as_secs())]
    NavigationTimeout { url: String, timeout: Duration },

    /// No table row appeared within the wait budget.
    #[error("table did not appear within {}s", .timeout.as_secs())]
    TableTimeout { timeout: Duration },

    /// The rendered markup could not be read or parsed.
    #[error("row extraction failed: {0}")]
    Extraction(String),

    /// The report file could not be written.
    #[error("failed to write report: {0}")]
    Report(#[from] std::io::Error),
}

impl ScrapeError {
    /// Whether this failure takes the generic navigation-failure output path.
    pub fn is_navigation_failure(&self) -> bool {
        !matches!(self, ScrapeError::TableTimeout { .. })
    }
}
