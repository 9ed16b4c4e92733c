//! `waterlevel scrape` — capture the station table into the CSV report.

use crate::cli::output::{self, Styled};
use crate::config::{self, BrowserProfile, ProfileKind, ScrapeConfig};
use crate::extraction;
use crate::pipeline::{self, RunOutcome, RunReport};
use crate::renderer::ChromiumRenderer;
use crate::report::OutputAction;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Command-line overrides for a capture run.
#[derive(Debug, Clone)]
pub struct ScrapeArgs {
    pub profile: ProfileKind,
    pub url: String,
    pub output: PathBuf,
    pub diagnostics_dir: Option<PathBuf>,
    pub table_timeout_secs: u64,
    pub navigation_timeout_secs: Option<u64>,
    pub chromium: Option<PathBuf>,
}

impl ScrapeArgs {
    /// Resolve the arguments into a run configuration.
    pub fn into_config(self) -> Result<ScrapeConfig> {
        url::Url::parse(&self.url).with_context(|| format!("invalid --url {:?}", self.url))?;

        let mut profile = BrowserProfile::for_kind(self.profile);
        if let Some(secs) = self.navigation_timeout_secs {
            profile.navigation_timeout = Duration::from_secs(secs);
        }

        let mut cfg = ScrapeConfig {
            url: self.url,
            output: self.output,
            table_wait: Duration::from_secs(self.table_timeout_secs),
            profile,
            ..ScrapeConfig::default()
        };
        if let Some(dir) = &self.diagnostics_dir {
            cfg = cfg.with_diagnostics_dir(dir);
        }
        Ok(cfg)
    }
}

/// Run the scrape command.
///
/// Pipeline failures are reported, never returned: the process exits 0.
pub async fn run(args: ScrapeArgs) -> Result<()> {
    let chromium = args.chromium.clone().or_else(config::chromium_path_from_env);
    let cfg = args.into_config()?;
    let renderer = ChromiumRenderer::new(cfg.profile.clone(), chromium);

    if !output::is_quiet() && !output::is_json() {
        eprintln!("  Capturing {} ({:?} profile)...", cfg.url, cfg.profile.kind);
    }

    let report = pipeline::run(&renderer, &cfg, extraction::rows::today()).await;

    if output::is_json() {
        output::print_json(&serde_json::to_value(&report)?);
    } else if !output::is_quiet() {
        print_summary(&Styled::new(), &report);
    }
    Ok(())
}

/// Print a run summary in styled form.
fn print_summary(s: &Styled, report: &RunReport) {
    let path = report.output_path.display();
    match &report.outcome {
        RunOutcome::Captured => {}
        RunOutcome::TableTimeout { diagnostics } => {
            eprintln!("  {} Table did not appear.", s.fail_sym());
            for artifact in [&diagnostics.html, &diagnostics.screenshot].into_iter().flatten() {
                eprintln!("    wrote {}", artifact.display());
            }
        }
        RunOutcome::Failed { error } => {
            eprintln!("  {} {}", s.fail_sym(), s.red(error));
        }
    }

    match report.output {
        Some(OutputAction::Report { rows }) => {
            eprintln!("  {} Saved {rows} rows to {path}", s.ok_sym());
        }
        Some(OutputAction::Sentinel) => {
            eprintln!("  {} No data; wrote placeholder to {path}", s.warn_sym());
        }
        Some(OutputAction::Preserved) => {
            eprintln!("  {} Kept previous {path}", s.warn_sym());
        }
        None => {
            eprintln!("  {}", s.yellow(&format!("{path} not written")));
        }
    }

    eprintln!(
        "  {}",
        s.dim(&format!(
            "capture date {}, {}",
            report.capture_date,
            output::format_elapsed(report.elapsed_ms)
        ))
    );
}
