//! Headless-browser capture of the national water-level station table.
//!
//! One run loads the dashboard, waits for the station table, extracts its
//! rows with a capture date, and writes `waterlevel_report.csv`. When the
//! table never appears, diagnostics are saved instead; when the run fails,
//! a placeholder report is written unless an earlier report exists.

pub mod cli;
pub mod config;
pub mod error;
pub mod extraction;
pub mod live;
pub mod pipeline;
pub mod renderer;
pub mod report;
pub mod stealth;

pub use config::{BrowserProfile, ProfileKind, ScrapeConfig};
pub use error::ScrapeError;
pub use pipeline::{run, RunOutcome, RunReport};
