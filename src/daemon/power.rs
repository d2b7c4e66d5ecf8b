//! System sleep detection.
//!
//! The monotonic clock stops while the machine is suspended but the wall
//! clock keeps going. Polling both and comparing how far each moved reveals
//! a suspend after the fact, which is then reported to the scheduler as a
//! sleep immediately followed by a wake.

use std::time::{Duration, Instant, SystemTime};

use tokio::time::{interval, MissedTickBehavior};

use super::runtime::{RuntimeError, SchedulerHandle};

/// Default polling interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default amount the wall clock may run ahead before it counts as a suspend
pub const DEFAULT_GAP_TOLERANCE: Duration = Duration::from_secs(10);

/// Detects system suspend by watching for wall-clock gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuspendDetector {
    poll_interval: Duration,
    tolerance: Duration,
}

impl Default for SuspendDetector {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_GAP_TOLERANCE)
    }
}

impl SuspendDetector {
    /// Creates a detector with custom timings.
    pub fn new(poll_interval: Duration, tolerance: Duration) -> Self {
        Self {
            poll_interval,
            tolerance,
        }
    }

    /// Returns the polling interval.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns true if the wall clock moved further than the monotonic clock
    /// by more than the tolerance.
    pub fn is_suspend_gap(&self, wall_elapsed: Duration, monotonic_elapsed: Duration) -> bool {
        wall_elapsed.saturating_sub(monotonic_elapsed) > self.tolerance
    }

    /// Polls until the scheduler goes away.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Closed`] once the scheduler runtime has stopped.
    pub async fn run(self, handle: SchedulerHandle) -> Result<(), RuntimeError> {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut last_wall = SystemTime::now();
        let mut last_mono = Instant::now();

        loop {
            ticker.tick().await;

            let wall = SystemTime::now();
            let mono = Instant::now();
            // A wall clock stepped backwards reads as zero elapsed.
            let wall_elapsed = wall.duration_since(last_wall).unwrap_or_default();
            let mono_elapsed = mono.duration_since(last_mono);

            if self.is_suspend_gap(wall_elapsed, mono_elapsed) {
                let slept = wall_elapsed.saturating_sub(mono_elapsed);
                tracing::info!(slept_seconds = slept.as_secs(), "system suspend detected");
                handle.system_sleep().await?;
                handle.system_wake().await?;
            }

            last_wall = wall;
            last_mono = mono;
        }
    }
}
