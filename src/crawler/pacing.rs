//! Request pacing
//!
//! Every outbound fetch is followed by a randomized pause so the request
//! cadence has no fixed interval. The pacer also owns the request gate: a
//! single async lock held for the duration of one fetch plus its pause, so
//! concurrent queries still emit requests strictly one after another.

use crate::config::CrawlerConfig;
use rand::Rng;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

/// Lower bound of the jitter factor applied to the base delay
pub const JITTER_MIN: f64 = 0.5;

/// Upper bound of the jitter factor applied to the base delay
pub const JITTER_MAX: f64 = 1.5;

/// Longest single pause; larger products of delay and multiplier are clamped
pub const MAX_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Randomized delay between requests, shared by every query worker
#[derive(Debug)]
pub struct Pacer {
    base_delay: Duration,
    gate: Mutex<()>,
}

impl Pacer {
    /// Creates a pacer with the given base delay
    pub fn new(base_delay: Duration) -> Self {
        Self {
            base_delay,
            gate: Mutex::new(()),
        }
    }

    /// Creates a pacer from the crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(Duration::from_millis(config.base_delay_ms))
    }

    /// The configured base delay
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Draws a delay of `base_delay * multiplier * uniform(0.5, 1.5)`
    ///
    /// Negative or NaN multipliers are treated as zero. Results above
    /// [`MAX_DELAY`], infinite ones included, are clamped to it.
    pub fn delay_for(&self, multiplier: f64) -> Duration {
        let multiplier = multiplier.max(0.0);
        let jitter = rand::thread_rng().gen_range(JITTER_MIN..=JITTER_MAX);
        let secs = self.base_delay.as_secs_f64() * multiplier * jitter;
        // zero base times an infinite multiplier
        if secs.is_nan() {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs).map_or(MAX_DELAY, |delay| delay.min(MAX_DELAY))
    }

    /// Sleeps for a freshly drawn delay
    pub async fn wait(&self, multiplier: f64) {
        let delay = self.delay_for(multiplier);
        if delay.is_zero() {
            return;
        }
        tracing::trace!("Pacing for {:?}", delay);
        tokio::time::sleep(delay).await;
    }

    /// Waits for the right to emit the next request
    ///
    /// Hold the returned guard across the fetch and the following
    /// [`wait`](Self::wait); no other request is sent until it is dropped.
    pub async fn turn(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().await
    }
}
