//! Page loading and cookie-banner dismissal.

use crate::config::BrowserProfile;
use crate::error::ScrapeError;
use crate::renderer::{NavigationResult, RenderContext};
use crate::stealth::behavior;
use serde::Serialize;
use tracing::{info, warn};

/// What happened when looking for the consent button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum ConsentOutcome {
    Accepted,
    NotFound,
    Failed(String),
}

/// Navigate to `url` under the profile's wait condition and time budget.
pub async fn load_page(
    context: &mut dyn RenderContext,
    url: &str,
    profile: &BrowserProfile,
) -> Result<NavigationResult, ScrapeError> {
    info!(url, wait = ?profile.wait_until, "opening page");

    let nav = tokio::time::timeout(
        profile.navigation_timeout,
        context.navigate(url, profile.wait_until),
    )
    .await
    .map_err(|_| ScrapeError::NavigationTimeout {
        url: url.to_string(),
        timeout: profile.navigation_timeout,
    })?
    .map_err(|e| ScrapeError::Navigation {
        url: url.to_string(),
        reason: format!("{e:#}"),
    })?;

    info!(
        title = nav.title.as_deref().unwrap_or(""),
        final_url = %nav.final_url,
        load_time_ms = nav.load_time_ms,
        "page loaded"
    );
    Ok(nav)
}

/// Click the first visible button whose text contains `text`.
///
/// Never fails: a missing or unclickable button is only logged.
pub async fn dismiss_cookie_banner(
    context: &dyn RenderContext,
    text: &str,
    profile: &BrowserProfile,
) -> ConsentOutcome {
    if profile.settle_delay {
        behavior::sleep_action_delay().await;
    }

    let outcome = match context.execute_js(&consent_script(text)).await {
        Ok(serde_json::Value::Bool(true)) => ConsentOutcome::Accepted,
        Ok(_) => ConsentOutcome::NotFound,
        Err(e) => ConsentOutcome::Failed(format!("{e:#}")),
    };

    match &outcome {
        ConsentOutcome::Accepted => info!("cookie banner accepted"),
        ConsentOutcome::NotFound => info!("no cookie button found"),
        ConsentOutcome::Failed(e) => warn!("cookie button could not be clicked: {e}"),
    }
    outcome
}

/// Script that clicks the consent button and reports whether it found one.
pub fn consent_script(text: &str) -> String {
    let needle = serde_json::Value::String(text.to_string());
    format!(
        r#"(() => {{
    const wanted = {needle};
    const btn = [...document.querySelectorAll('button')].find(b =>
        b.offsetParent !== null && (b.innerText || b.textContent || '').includes(wanted));
    if (!btn) return false;
    btn.click();
    return true;
}})()"#
    )
}
