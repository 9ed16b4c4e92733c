//! Browser fingerprint patching — hide automation signals.

/// Desktop Chrome on Windows, sent instead of the HeadlessChrome token.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Patch applied to every document before the dashboard's own scripts.
///
/// Masks the signals that mark a CDP-driven Chromium and reports the Thai
/// locale the stealth profile browses with.
pub const STEALTH_SCRIPT: &str = r#"
(() => {
    const define = (target, key, value) =>
        Object.defineProperty(target, key, { get: () => value, configurable: true });

    // true under DevTools control
    define(navigator, 'webdriver', false);

    // missing in headless builds
    window.chrome = window.chrome || {};
    window.chrome.runtime = window.chrome.runtime || {
        connect() {},
        sendMessage() {},
    };

    // headless answers 'denied' while Notification.permission says 'default'
    const query = navigator.permissions.query.bind(navigator.permissions);
    navigator.permissions.query = (params) =>
        params.name === 'notifications'
            ? Promise.resolve({ state: Notification.permission })
            : query(params);

    define(navigator, 'plugins', [1, 2, 3, 4, 5]);
    define(navigator, 'languages', ['th-TH', 'th', 'en-US', 'en']);
})();
"#;

/// Script registered with `Page.addScriptToEvaluateOnNewDocument`.
pub fn stealth_script() -> &'static str {
    STEALTH_SCRIPT
}
