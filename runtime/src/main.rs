//! waterlevel — capture the national water-level table into a CSV report.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use waterlevel_runtime::cli::{doctor, scrape_cmd};
use waterlevel_runtime::config::{self, ProfileKind};

#[derive(Parser)]
#[command(name = "waterlevel", version, about)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    scrape: ScrapeOpts,

    /// Print a machine-readable summary on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Only print warnings and errors.
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    /// Emit log lines as JSON.
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture the station table (default).
    Scrape(ScrapeOpts),
    /// Check that Chromium is available and the report path is writable.
    Doctor {
        /// Report path to check.
        #[arg(long, default_value = config::OUTPUT_FILE)]
        output: PathBuf,
    },
}

#[derive(Args, Clone)]
struct ScrapeOpts {
    /// Browser configuration preset.
    #[arg(long, value_enum, default_value_t = ProfileKind::Plain)]
    profile: ProfileKind,

    /// Dashboard URL.
    #[arg(long, default_value = config::TARGET_URL)]
    url: String,

    /// Report file, overwritten on each run.
    #[arg(long, short, default_value = config::OUTPUT_FILE)]
    output: PathBuf,

    /// Directory for debug_page.html and debug_screenshot.png.
    #[arg(long)]
    diagnostics_dir: Option<PathBuf>,

    /// Seconds to wait for the table before giving up.
    #[arg(long, default_value_t = config::TABLE_WAIT.as_secs())]
    table_timeout_secs: u64,

    /// Override the profile's navigation budget.
    #[arg(long)]
    navigation_timeout_secs: Option<u64>,

    /// Chromium executable (defaults to WATERLEVEL_CHROMIUM_PATH, then auto-detect).
    #[arg(long)]
    chromium: Option<PathBuf>,
}

impl From<ScrapeOpts> for scrape_cmd::ScrapeArgs {
    fn from(o: ScrapeOpts) -> Self {
        Self {
            profile: o.profile,
            url: o.url,
            output: o.output,
            diagnostics_dir: o.diagnostics_dir,
            table_timeout_secs: o.table_timeout_secs,
            navigation_timeout_secs: o.navigation_timeout_secs,
            chromium: o.chromium,
        }
    }
}

/// Filter used when `RUST_LOG` is unset; covers the binary and library targets.
fn default_filter(quiet: bool) -> &'static str {
    if quiet {
        "waterlevel=warn,waterlevel_runtime=warn,chromiumoxide=error"
    } else {
        "waterlevel=info,waterlevel_runtime=info,chromiumoxide=warn"
    }
}

fn init_tracing(quiet: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(quiet)));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.json {
        std::env::set_var("WATERLEVEL_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("WATERLEVEL_QUIET", "1");
    }
    if cli.no_color {
        std::env::set_var("WATERLEVEL_NO_COLOR", "1");
    }
    init_tracing(cli.quiet, cli.log_json);

    match cli.command {
        Some(Commands::Doctor { output }) => doctor::run(&output).await,
        Some(Commands::Scrape(opts)) => scrape_cmd::run(opts.into()).await,
        None => scrape_cmd::run(cli.scrape.into()).await,
    }
}
