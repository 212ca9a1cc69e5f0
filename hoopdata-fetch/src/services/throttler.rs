//! Outbound call pacing
//!
//! One throttler is shared by every call to the rate-limited upstream. It
//! enforces a minimum spacing between calls and, every N completed work
//! units, an extended rest.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Default)]
struct ThrottleState {
    last_call: Option<Instant>,
    units_completed: u64,
    rests_taken: u64,
}

/// Pacing for a shared rate-limited upstream
#[derive(Debug)]
pub struct Throttler {
    min_interval: Duration,
    batch_rest_interval: u32,
    batch_rest_duration: Duration,
    state: Mutex<ThrottleState>,
}

impl Throttler {
    /// `batch_rest_interval == 0` disables extended rests
    pub fn new(min_interval: Duration, batch_rest_interval: u32, batch_rest_duration: Duration) -> Self {
        Self {
            min_interval,
            batch_rest_interval,
            batch_rest_duration,
            state: Mutex::new(ThrottleState::default()),
        }
    }

    /// Wait until at least `min_interval` has passed since the previous call
    pub async fn wait_before_call(&self) {
        let mut state = self.state.lock().await;

        if let Some(last_time) = state.last_call {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        state.last_call = Some(Instant::now());
    }

    /// Record a completed work unit; rests if it closes a batch
    ///
    /// Returns true if an extended rest was taken.
    pub async fn unit_completed(&self) -> bool {
        let mut state = self.state.lock().await;
        state.units_completed += 1;

        if self.batch_rest_interval == 0
            || state.units_completed % u64::from(self.batch_rest_interval) != 0
        {
            return false;
        }

        tracing::info!(
            units_completed = state.units_completed,
            rest_secs = self.batch_rest_duration.as_secs_f64(),
            "Batch rest"
        );
        tokio::time::sleep(self.batch_rest_duration).await;
        state.rests_taken += 1;
        true
    }

    pub async fn units_completed(&self) -> u64 {
        self.state.lock().await.units_completed
    }

    pub async fn rests_taken(&self) -> u64 {
        self.state.lock().await.rests_taken
    }
}
