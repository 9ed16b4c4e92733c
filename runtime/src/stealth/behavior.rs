//! Human-like pacing.

use rand::Rng;
use std::time::Duration;

/// Generate a random delay between min_ms and max_ms.
pub fn random_delay(min_ms: u64, max_ms: u64) -> Duration {
    let mut rng = rand::thread_rng();
    let ms = rng.gen_range(min_ms..=max_ms);
    Duration::from_millis(ms)
}

/// Settle time after navigation (500-2000ms).
pub fn page_load_delay() -> Duration {
    random_delay(500, 2000)
}

/// Pause before clicking a control (50-200ms).
pub fn action_delay() -> Duration {
    random_delay(50, 200)
}

/// Sleep for a random settle delay.
pub async fn sleep_page_load_delay() {
    tokio::time::sleep(page_load_delay()).await;
}

/// Sleep for a random action delay.
pub async fn sleep_action_delay() {
    tokio::time::sleep(action_delay()).await;
}
