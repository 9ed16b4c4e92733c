//! Shared CLI output formatting with colors, symbols, and structured display.

use std::io::IsTerminal;

/// Check if color output is enabled.
pub fn color_enabled() -> bool {
    // https://no-color.org/
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    if std::env::var("WATERLEVEL_NO_COLOR").is_ok() {
        return false;
    }
    std::io::stderr().is_terminal()
}

/// Colored glyph and its plain-text stand-in.
type Mark = (&'static str, &'static str);

const MARK_OK: Mark = ("\x1b[32m\u{2713}\x1b[0m", "OK");
const MARK_FAIL: Mark = ("\x1b[31m\u{2717}\x1b[0m", "!!");
const MARK_WARN: Mark = ("\x1b[33m\u{26a0}\x1b[0m", "??");

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Colored string builder.
pub struct Styled {
    use_color: bool,
}

impl Default for Styled {
    fn default() -> Self {
        Self::new()
    }
}

impl Styled {
    pub fn new() -> Self {
        Self {
            use_color: color_enabled(),
        }
    }

    /// Builder with color forced off.
    pub fn plain() -> Self {
        Self { use_color: false }
    }

    /// Run or check succeeded.
    pub fn ok_sym(&self) -> &'static str {
        self.mark(MARK_OK)
    }

    /// Run failed; the report may still have been written.
    pub fn fail_sym(&self) -> &'static str {
        self.mark(MARK_FAIL)
    }

    /// Placeholder written or previous report kept.
    pub fn warn_sym(&self) -> &'static str {
        self.mark(MARK_WARN)
    }

    fn mark(&self, (glyph, plain): Mark) -> &'static str {
        if self.use_color {
            glyph
        } else {
            plain
        }
    }

    fn paint(&self, code: &str, s: &str) -> String {
        if self.use_color {
            format!("{code}{s}{RESET}")
        } else {
            s.to_string()
        }
    }

    pub fn green(&self, s: &str) -> String {
        self.paint(GREEN, s)
    }

    pub fn red(&self, s: &str) -> String {
        self.paint(RED, s)
    }

    pub fn yellow(&self, s: &str) -> String {
        self.paint(YELLOW, s)
    }

    pub fn dim(&self, s: &str) -> String {
        self.paint(DIM, s)
    }

    pub fn bold(&self, s: &str) -> String {
        self.paint(BOLD, s)
    }
}

/// Print the tool name and version.
pub fn print_header(s: &Styled) {
    eprintln!(
        "  {} {}",
        s.bold("waterlevel"),
        s.dim(&format!("v{}", env!("CARGO_PKG_VERSION")))
    );
    eprintln!();
}

/// Print a section header.
pub fn print_section(s: &Styled, title: &str) {
    eprintln!("  {}", s.bold(title));
}

/// Print a check result line with symbol and label/value.
pub fn print_check(symbol: &str, label: &str, value: &str) {
    eprintln!("    {symbol} {label:<16} {value}");
}

/// Print an indented detail/fix line under a check.
pub fn print_detail(msg: &str) {
    eprintln!("                        {msg}");
}

/// Print a status summary line at the bottom.
pub fn print_status(s: &Styled, status: &str, msg: &str) {
    eprintln!();
    eprintln!("  {}: {status} ({msg})", s.bold("Status"));
}

/// Format milliseconds as seconds with two decimals (e.g., "12.34s").
pub fn format_elapsed(ms: u64) -> String {
    format!("{:.2}s", ms as f64 / 1000.0)
}

/// Check if --quiet mode is active.
pub fn is_quiet() -> bool {
    std::env::var("WATERLEVEL_QUIET").is_ok()
}

/// Check if --json mode is active.
pub fn is_json() -> bool {
    std::env::var("WATERLEVEL_JSON").is_ok()
}

/// Print JSON output to stdout.
pub fn print_json(value: &serde_json::Value) {
    if let Ok(s) = serde_json::to_string_pretty(value) {
        println!("{s}");
    }
}
