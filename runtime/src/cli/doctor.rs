//! Environment readiness check.
//!
//! Verifies that a Chromium binary can be found and started headless, and
//! that the report directory is writable. Every failure includes a fix.

use crate::cli::output::{self, Styled};
use crate::config;
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

/// Binary names tried on `PATH`, in order.
const CHROMIUM_NAMES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

/// Run the doctor diagnostic.
pub async fn run(output_path: &Path) -> Result<()> {
    let chromium = find_chromium();
    let version = chromium.as_deref().and_then(get_chromium_version);
    let launch = chromium.as_deref().map(test_headless_launch);
    let report_dir = report_dir(output_path);
    let writable = dir_writable(&report_dir);

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "chromium": chromium.as_ref().map(|p| p.display().to_string()),
            "chromium_version": version,
            "headless_launch_ms": launch.as_ref().and_then(|r| r.as_ref().ok()),
            "headless_error": launch.as_ref().and_then(|r| r.as_ref().err().map(|e| e.to_string())),
            "report_dir": report_dir.display().to_string(),
            "report_dir_writable": writable,
            "ready": matches!(launch, Some(Ok(_))) && writable,
        }));
        return Ok(());
    }

    let s = Styled::new();
    let mut ready = true;
    output::print_header(&s);

    output::print_section(&s, "Browser");
    match (&chromium, &launch) {
        (Some(path), Some(result)) => {
            let ver = version.as_deref().unwrap_or("unknown version");
            output::print_check(
                s.ok_sym(),
                "Chromium:",
                &format!("{ver} at {}", path.display()),
            );
            match result {
                Ok(ms) => output::print_check(
                    s.ok_sym(),
                    "Headless test:",
                    &format!("launched and closed in {ms}ms"),
                ),
                Err(e) => {
                    output::print_check(s.fail_sym(), "Headless test:", &format!("FAILED: {e}"));
                    if is_docker() {
                        output::print_detail("Running in Docker? Try WATERLEVEL_NO_SANDBOX=1");
                    }
                    ready = false;
                }
            }
        }
        _ => {
            output::print_check(s.fail_sym(), "Chromium:", "NOT FOUND");
            output::print_detail("Install google-chrome or chromium,");
            output::print_detail("or set WATERLEVEL_CHROMIUM_PATH=/path/to/chrome");
            ready = false;
        }
    }
    eprintln!();

    output::print_section(&s, "Output");
    if writable {
        output::print_check(
            s.ok_sym(),
            "Report dir:",
            &format!("{} (writable)", report_dir.display()),
        );
    } else {
        output::print_check(
            s.fail_sym(),
            "Report dir:",
            &format!("{} is not writable", report_dir.display()),
        );
        output::print_detail("Fix: pass --output with a writable location");
        ready = false;
    }

    if ready {
        output::print_status(&s, &s.green("READY"), "all checks passed");
    } else {
        output::print_status(&s, &s.red("NOT READY"), "see fixes above");
    }
    Ok(())
}

/// Find a Chromium binary: explicit env override first, then `PATH`.
pub fn find_chromium() -> Option<PathBuf> {
    if let Some(path) = config::chromium_path_from_env() {
        if path.exists() {
            return Some(path);
        }
    }
    CHROMIUM_NAMES.iter().find_map(|name| which::which(name).ok())
}

/// Get Chromium version string.
fn get_chromium_version(path: &Path) -> Option<String> {
    let output = Command::new(path).arg("--version").output().ok()?;
    if output.status.success() {
        let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Some(raw.replace("Google Chrome ", "").replace("Chromium ", ""))
    } else {
        None
    }
}

/// Test that Chromium can launch headless and close.
fn test_headless_launch(chromium_path: &Path) -> Result<u64> {
    let start = Instant::now();
    let mut cmd = Command::new(chromium_path);
    cmd.args(["--headless", "--disable-gpu", "--dump-dom", "about:blank"]);

    if is_docker() || std::env::var("WATERLEVEL_NO_SANDBOX").is_ok() {
        cmd.arg("--no-sandbox");
    }

    let output = cmd
        .output()
        .map_err(|e| anyhow!("failed to launch: {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "{}",
            stderr.lines().next().unwrap_or("unknown error")
        ));
    }

    Ok(start.elapsed().as_millis() as u64)
}

/// Directory the report will be written into.
fn report_dir(output_path: &Path) -> PathBuf {
    match output_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn dir_writable(dir: &Path) -> bool {
    let marker = dir.join(format!(".waterlevel-doctor-{}", std::process::id()));
    let ok = std::fs::write(&marker, b"").is_ok();
    let _ = std::fs::remove_file(&marker);
    ok
}

fn is_docker() -> bool {
    PathBuf::from("/.dockerenv").exists()
        || std::fs::read_to_string("/proc/1/cgroup")
            .map(|s| s.contains("docker") || s.contains("containerd"))
            .unwrap_or(false)
}
