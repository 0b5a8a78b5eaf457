use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::GopiumError;

/// A cheap, cloneable cancellation token. Every strategy, walker task and
/// orchestrator loop polls it instead of blocking; cancellation therefore
/// never requires tearing down in-flight work, only letting it observe
/// `is_cancelled()` at its next check.
#[derive(Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn err(&self) -> Result<(), GopiumError> {
        if self.is_cancelled() {
            Err(GopiumError::Cancellation)
        } else {
            Ok(())
        }
    }

    /// Decorates this token with a background timeout: after `timeout_secs`
    /// seconds the token cancels itself. A value of 0 means no timeout, per
    /// the CLI's `--timeout` contract.
    pub fn with_timeout(self, timeout_secs: u64) -> Self {
        if timeout_secs > 0 {
            let tok = self.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_secs(timeout_secs));
                tok.cancel();
            });
        }
        self
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
