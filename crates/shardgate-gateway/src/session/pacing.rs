//! Session start pacing
//!
//! The server allows `max_concurrency` session starts per concurrency window. Shards
//! are started one at a time with a fixed gap between them so that bursts never
//! exceed that quota.

use std::time::Duration;

/// Default concurrency window
pub const CONCURRENCY_WINDOW: Duration = Duration::from_secs(2);

/// Gap between consecutive session starts
///
/// `round(window / max_concurrency)` in whole seconds, never below one second. A
/// `max_concurrency` of zero is treated as one.
pub fn calc_interval(window: Duration, max_concurrency: u32) -> Duration {
    let concurrency = u64::from(max_concurrency.max(1));
    let window_secs = window.as_secs();
    // Round half up
    let secs = (2 * window_secs + concurrency) / (2 * concurrency);
    Duration::from_secs(secs.max(1))
}
