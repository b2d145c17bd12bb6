//! Async request pacing between consecutive API calls.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::time::sleep;

/// Enforces a minimum cooldown interval between consecutive requests so a
/// long autolog run does not hammer the server.
#[derive(Clone, Debug)]
pub struct Throttle {
    cooldown: Duration,
    last_call: Arc<Mutex<Option<Instant>>>,
}

impl Throttle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_call: Arc::new(Mutex::new(None)),
        }
    }

    /// Waits out the remainder of the cooldown, then records the call time.
    pub async fn wait(&self) {
        let mut guard = self.last_call.lock().await;
        if let Some(last) = *guard {
            let elapsed = last.elapsed();
            if elapsed < self.cooldown {
                sleep(self.cooldown - elapsed).await;
            }
        }
        *guard = Some(Instant::now());
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}
