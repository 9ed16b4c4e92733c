//! Run configuration: target, output paths, timeouts, and browser profiles.

use crate::stealth::fingerprint;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Public water-level dashboard.
pub const TARGET_URL: &str = "https://nationalthaiwater.onwr.go.th/waterlevel";

/// Report written on every run that reaches the output step.
pub const OUTPUT_FILE: &str = "waterlevel_report.csv";

/// Rendered markup captured when the table never appears.
pub const DEBUG_HTML_FILE: &str = "debug_page.html";

/// Full-page screenshot captured when the table never appears.
pub const DEBUG_SCREENSHOT_FILE: &str = "debug_screenshot.png";

/// Rows of the station table.
pub const TABLE_ROW_SELECTOR: &str = ".MuiTable-root tbody tr";

/// Visible text of the cookie consent button ("accept").
pub const CONSENT_BUTTON_TEXT: &str = "ยอมรับ";

/// Default budget for the table to appear.
pub const TABLE_WAIT: Duration = Duration::from_secs(60);

/// Interval between table presence checks.
pub const TABLE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Condition that ends navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitUntil {
    /// Return as soon as navigation completes.
    ///
    /// Navigation completes on the load event, which follows
    /// DOMContentLoaded, so this waits at least until the page has loaded.
    /// No extra network settling is done.
    DomContentLoaded,
    /// The load event fired and at most two resource loads finished per
    /// quiet window (see the Chromium renderer).
    NetworkIdle,
}

/// Named browser configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    /// Stock headless Chromium.
    Plain,
    /// Desktop user agent, automation flags hidden, fingerprint patched.
    Stealth,
}

/// Browser configuration record the pipeline is parameterized by.
#[derive(Debug, Clone)]
pub struct BrowserProfile {
    pub kind: ProfileKind,
    /// User agent override; `None` keeps Chromium's own.
    pub user_agent: Option<String>,
    /// Accept-Language / navigator.language override.
    pub locale: Option<String>,
    pub wait_until: WaitUntil,
    pub navigation_timeout: Duration,
    /// Extra Chromium command-line flags.
    pub launch_args: Vec<String>,
    pub window_size: (u32, u32),
    /// Inject the fingerprint patch script before any page script runs.
    pub patch_fingerprint: bool,
    /// Sleep a randomized human-like interval after navigation.
    pub settle_delay: bool,
}

impl BrowserProfile {
    /// Stock headless browser waiting for network idle.
    pub fn plain() -> Self {
        Self {
            kind: ProfileKind::Plain,
            user_agent: None,
            locale: None,
            wait_until: WaitUntil::NetworkIdle,
            navigation_timeout: Duration::from_secs(60),
            launch_args: vec![
                "--no-sandbox".to_string(),
                "--disable-setuid-sandbox".to_string(),
            ],
            window_size: (1366, 768),
            patch_fingerprint: false,
            settle_delay: false,
        }
    }

    /// Browser dressed up as a desktop Chrome, returning on DOMContentLoaded.
    pub fn stealth() -> Self {
        Self {
            kind: ProfileKind::Stealth,
            user_agent: Some(fingerprint::DESKTOP_USER_AGENT.to_string()),
            locale: Some("th-TH".to_string()),
            wait_until: WaitUntil::DomContentLoaded,
            navigation_timeout: Duration::from_secs(120),
            launch_args: vec![
                "--no-sandbox".to_string(),
                "--disable-setuid-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
                "--disable-gpu".to_string(),
                "--disable-infobars".to_string(),
                "--disable-blink-features=AutomationControlled".to_string(),
            ],
            window_size: (1366, 768),
            patch_fingerprint: true,
            settle_delay: true,
        }
    }

    pub fn for_kind(kind: ProfileKind) -> Self {
        match kind {
            ProfileKind::Plain => Self::plain(),
            ProfileKind::Stealth => Self::stealth(),
        }
    }
}

/// Fully resolved settings for one capture run.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub url: String,
    pub output: PathBuf,
    pub debug_html: PathBuf,
    pub debug_screenshot: PathBuf,
    pub table_selector: String,
    pub table_wait: Duration,
    pub poll_interval: Duration,
    pub consent_text: String,
    pub profile: BrowserProfile,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            url: TARGET_URL.to_string(),
            output: PathBuf::from(OUTPUT_FILE),
            debug_html: PathBuf::from(DEBUG_HTML_FILE),
            debug_screenshot: PathBuf::from(DEBUG_SCREENSHOT_FILE),
            table_selector: TABLE_ROW_SELECTOR.to_string(),
            table_wait: TABLE_WAIT,
            poll_interval: TABLE_POLL_INTERVAL,
            consent_text: CONSENT_BUTTON_TEXT.to_string(),
            profile: BrowserProfile::plain(),
        }
    }
}

impl ScrapeConfig {
    /// Place both diagnostic artifacts under `dir`, keeping their file names.
    pub fn with_diagnostics_dir(mut self, dir: &Path) -> Self {
        self.debug_html = dir.join(DEBUG_HTML_FILE);
        self.debug_screenshot = dir.join(DEBUG_SCREENSHOT_FILE);
        self
    }
}

/// Chromium binary override from the environment.
pub fn chromium_path_from_env() -> Option<PathBuf> {
    std::env::var("WATERLEVEL_CHROMIUM_PATH")
        .ok()
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}
