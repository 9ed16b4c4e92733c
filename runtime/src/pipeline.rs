//! One capture run: load, wait, extract, write.

use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::extraction::{self, Dataset};
use crate::live::load::{self, ConsentOutcome};
use crate::live::wait::{self, Diagnostics};
use crate::renderer::{RenderContext, Renderer};
use crate::report::{finalize_output, OutputAction};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

/// How a run ended.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RunOutcome {
    /// The table was read (possibly with no usable rows).
    Captured,
    /// The table never appeared; only diagnostics were written.
    TableTimeout { diagnostics: Diagnostics },
    /// The run failed before producing a dataset.
    Failed { error: String },
}

/// Summary of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub rows: usize,
    pub consent: Option<ConsentOutcome>,
    /// `None` when the output step was skipped (table timeout) or itself failed.
    pub output: Option<OutputAction>,
    pub output_path: PathBuf,
    pub capture_date: String,
    pub elapsed_ms: u64,
}

enum Stage {
    Captured(Dataset),
    TimedOut(Diagnostics),
}

/// Run the whole pipeline once.
///
/// Never returns an error: every failure is logged and reflected in the
/// report file and the returned [`RunReport`]. The browser session is
/// closed on every path that opened one.
pub async fn run(renderer: &dyn Renderer, config: &ScrapeConfig, today: NaiveDate) -> RunReport {
    let start = Instant::now();
    let existed_before_run = config.output.exists();
    let date = extraction::capture_date(today);
    let mut consent = None;

    let stage = match renderer.new_context().await {
        Err(e) => Err(ScrapeError::Launch(format!("{e:#}"))),
        Ok(mut context) => {
            let stage = capture(context.as_mut(), config, &date, &mut consent).await;
            if let Err(e) = context.close().await {
                warn!("closing browser session: {e:#}");
            }
            stage
        }
    };

    let (outcome, rows, output) = match stage {
        Ok(Stage::TimedOut(diagnostics)) => {
            warn!("table did not appear; report left untouched");
            (RunOutcome::TableTimeout { diagnostics }, 0, None)
        }
        Ok(Stage::Captured(dataset)) => {
            match finalize_output(&config.output, Some(&dataset), existed_before_run) {
                Ok(action) => (RunOutcome::Captured, dataset.len(), Some(action)),
                Err(e) => fail(config, ScrapeError::Report(e), existed_before_run),
            }
        }
        Err(e) => fail(config, e, existed_before_run),
    };

    let elapsed = start.elapsed();
    info!("run finished in {:.2}s", elapsed.as_secs_f64());

    RunReport {
        outcome,
        rows,
        consent,
        output,
        output_path: config.output.clone(),
        capture_date: date,
        elapsed_ms: elapsed.as_millis() as u64,
    }
}

async fn capture(
    context: &mut dyn RenderContext,
    config: &ScrapeConfig,
    date: &str,
    consent: &mut Option<ConsentOutcome>,
) -> Result<Stage, ScrapeError> {
    load::load_page(context, &config.url, &config.profile).await?;
    *consent = Some(load::dismiss_cookie_banner(context, &config.consent_text, &config.profile).await);

    match wait::wait_for_rows(
        context,
        &config.table_selector,
        config.table_wait,
        config.poll_interval,
    )
    .await
    {
        Ok(_) => {}
        Err(ScrapeError::TableTimeout { timeout }) => {
            warn!(
                "no table within {}s, writing {} and {}",
                timeout.as_secs(),
                config.debug_html.display(),
                config.debug_screenshot.display()
            );
            let diagnostics =
                wait::capture_diagnostics(context, &config.debug_html, &config.debug_screenshot)
                    .await;
            return Ok(Stage::TimedOut(diagnostics));
        }
        Err(e) => return Err(e),
    }

    let dataset = extraction::extract_rows(context, &config.table_selector, date).await?;
    Ok(Stage::Captured(dataset))
}

fn fail(
    config: &ScrapeConfig,
    err: ScrapeError,
    existed_before_run: bool,
) -> (RunOutcome, usize, Option<OutputAction>) {
    error!("capture failed: {err}");
    let output = match finalize_output(&config.output, None, existed_before_run) {
        Ok(action) => Some(action),
        Err(e) => {
            error!("writing fallback report: {e}");
            None
        }
    };
    (
        RunOutcome::Failed {
            error: err.to_string(),
        },
        0,
        output,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::fake::{FakeContext, FakeRenderer};
    use crate::report::SENTINEL;
    use std::time::Duration;
    use tempfile::TempDir;

    const FULL: &[&str] = &["สถานีA", "เชียงใหม่", "10:00", "1.2", "5.0", "300", "24%", "ปกติ", "-"];

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn config(dir: &TempDir) -> ScrapeConfig {
        let mut cfg = ScrapeConfig::default().with_diagnostics_dir(dir.path());
        cfg.output = dir.path().join("waterlevel_report.csv");
        cfg.url = "https://example.com/waterlevel".to_string();
        cfg.table_wait = Duration::from_millis(30);
        cfg.poll_interval = Duration::from_millis(5);
        cfg
    }

    fn page(rows: &[&[&str]]) -> FakeContext {
        let body: String = rows
            .iter()
            .map(|r| {
                let tds: String = r.iter().map(|c| format!("<td> {c} </td>")).collect();
                format!("<tr>{tds}</tr>")
            })
            .collect();
        let html = format!(
            r#"<html><body><table class="MuiTable-root"><tbody>{body}</tbody></table></body></html>"#
        );
        FakeContext::with_html(&html, rows.len() as u64)
    }

    #[tokio::test]
    async fn test_three_full_rows() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir);
        let renderer = FakeRenderer::new(page(&[FULL, FULL, FULL]));

        let report = run(&renderer, &cfg, today()).await;
        assert!(matches!(report.outcome, RunOutcome::Captured));
        assert_eq!(report.rows, 3);
        assert_eq!(report.output, Some(OutputAction::Report { rows: 3 }));

        let text = std::fs::read_to_string(&cfg.output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        for line in &lines[1..] {
            assert!(line.starts_with(r#""สถานีA","เชียงใหม่""#));
            assert!(line.ends_with(r#","16/10/2026""#));
        }
        assert_eq!(renderer.events(), vec!["launch", "navigate", "close"]);
    }

    #[tokio::test]
    async fn test_short_rows_only_writes_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir);
        std::fs::write(&cfg.output, "previous").unwrap();
        let renderer = FakeRenderer::new(page(&[&["a", "b"], &["c", "d", "e", "f"]]));

        let report = run(&renderer, &cfg, today()).await;
        assert!(matches!(report.outcome, RunOutcome::Captured));
        assert_eq!(report.output, Some(OutputAction::Sentinel));
        assert_eq!(std::fs::read_to_string(&cfg.output).unwrap(), SENTINEL);
    }

    #[tokio::test]
    async fn test_single_five_cell_row() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir);
        let renderer = FakeRenderer::new(page(&[&["a", "b", "c", "d", "e"]]));

        let report = run(&renderer, &cfg, today()).await;
        assert_eq!(report.rows, 1);
        let text = std::fs::read_to_string(&cfg.output).unwrap();
        let mut rdr = csv::Reader::from_reader(text.as_bytes());
        let rec = rdr.records().next().unwrap().unwrap();
        assert_eq!(&rec[5], "16/10/2026");
        assert!(!text.contains("extra_"));
    }

    #[tokio::test]
    async fn test_table_timeout_writes_only_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir);
        let renderer = FakeRenderer::new(FakeContext::with_rows(0));

        let report = run(&renderer, &cfg, today()).await;
        assert!(matches!(report.outcome, RunOutcome::TableTimeout { .. }));
        assert_eq!(report.output, None);
        assert!(!cfg.output.exists());
        assert!(cfg.debug_html.exists());
        assert!(cfg.debug_screenshot.exists());

        let mut files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        files.sort();
        assert_eq!(files, vec!["debug_page.html", "debug_screenshot.png"]);
        assert_eq!(
            renderer.events(),
            vec!["launch", "navigate", "screenshot", "close"]
        );
    }

    #[tokio::test]
    async fn test_table_timeout_keeps_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir);
        std::fs::write(&cfg.output, "previous").unwrap();
        let renderer = FakeRenderer::new(FakeContext::with_rows(0));

        run(&renderer, &cfg, today()).await;
        assert_eq!(std::fs::read_to_string(&cfg.output).unwrap(), "previous");
    }

    #[tokio::test]
    async fn test_navigation_failure_without_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir);
        let mut ctx = FakeContext::with_rows(3);
        ctx.nav_error = Some("net::ERR_CONNECTION_RESET".into());
        let renderer = FakeRenderer::new(ctx);

        let report = run(&renderer, &cfg, today()).await;
        match &report.outcome {
            RunOutcome::Failed { error } => assert!(error.contains("ERR_CONNECTION_RESET")),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(report.output, Some(OutputAction::Sentinel));
        assert_eq!(std::fs::read_to_string(&cfg.output).unwrap(), SENTINEL);
        assert_eq!(renderer.events(), vec!["launch", "navigate", "close"]);
    }

    #[tokio::test]
    async fn test_navigation_failure_preserves_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir);
        let previous = "\"ชื่อสถานี\"\n\"old\"\n";
        std::fs::write(&cfg.output, previous).unwrap();
        let mut ctx = FakeContext::with_rows(3);
        ctx.nav_error = Some("boom".into());
        let renderer = FakeRenderer::new(ctx);

        let report = run(&renderer, &cfg, today()).await;
        assert_eq!(report.output, Some(OutputAction::Preserved));
        assert_eq!(std::fs::read_to_string(&cfg.output).unwrap(), previous);
    }

    #[tokio::test]
    async fn test_launch_failure_writes_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir);
        let mut renderer = FakeRenderer::new(FakeContext::with_rows(1));
        renderer.launch_error = Some("chromium not found".into());

        let report = run(&renderer, &cfg, today()).await;
        assert!(matches!(report.outcome, RunOutcome::Failed { .. }));
        assert_eq!(std::fs::read_to_string(&cfg.output).unwrap(), SENTINEL);
        assert!(renderer.events().is_empty());
    }

    #[tokio::test]
    async fn test_extraction_failure_is_generic_failure() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir);
        let mut ctx = page(&[FULL]);
        ctx.content_error = true;
        let renderer = FakeRenderer::new(ctx);

        let report = run(&renderer, &cfg, today()).await;
        assert!(matches!(report.outcome, RunOutcome::Failed { .. }));
        assert_eq!(report.output, Some(OutputAction::Sentinel));
        assert!(renderer.events().contains(&"close"));
    }

    #[tokio::test]
    async fn test_consent_button_clicked() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir);
        let mut ctx = page(&[FULL]);
        ctx.consent_button = true;
        let renderer = FakeRenderer::new(ctx);

        let report = run(&renderer, &cfg, today()).await;
        assert_eq!(report.consent, Some(ConsentOutcome::Accepted));
        assert_eq!(
            renderer.events(),
            vec!["launch", "navigate", "consent", "close"]
        );
    }
}
