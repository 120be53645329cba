//! Politeness rate limiting
//!
//! Every two page fetches and every two downloads are separated by a pause
//! sampled uniformly from a configured window, approximating human browsing
//! cadence. The limiter is deliberately not adaptive: it does not observe
//! response codes to tighten or loosen timing.

use crate::config::DelayRange;
use crate::shutdown::ShutdownHandle;
use rand::Rng;
use std::time::Duration;

/// Samples a delay uniformly from the window.
pub fn sample_delay(range: &DelayRange) -> Duration {
    let secs = if range.max > range.min {
        rand::thread_rng().gen_range(range.min..=range.max)
    } else {
        range.min
    };
    Duration::from_secs_f64(secs)
}

/// Suspends the calling unit of work for a sampled delay.
///
/// The pause ends early when shutdown is requested, so an operator never
/// waits out a long window just to stop the run.
pub async fn polite_pause(range: &DelayRange, shutdown: &ShutdownHandle) {
    let delay = sample_delay(range);
    tracing::debug!("Pausing for {:.2}s", delay.as_secs_f64());

    tokio::select! {
        _ = tokio::time::sleep(delay) => {}
        _ = shutdown.wait() => {}
    }
}
