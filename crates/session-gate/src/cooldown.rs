//! Resend cooldown for the OTP login form.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const DEFAULT_COOLDOWN_SECS: u32 = 30;

/// Countdown state of the resend action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResendCooldown {
    remaining: u32,
}

impl ResendCooldown {
    /// Disable resend for `units` ticks.
    pub fn start(&mut self, units: u32) {
        self.remaining = units;
    }

    /// Advance one tick; returns true once resend is enabled again.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.is_enabled()
    }

    /// Cancel the countdown and re-enable resend.
    pub fn stop(&mut self) {
        self.remaining = 0;
    }

    pub fn is_enabled(&self) -> bool {
        self.remaining == 0
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Text for the resend button.
    pub fn label(&self) -> String {
        if self.is_enabled() {
            "Resend OTP".to_string()
        } else {
            format!("Resend in {}s", self.remaining)
        }
    }
}

/// Drives a [`ResendCooldown`] from a background task, one tick per period.
///
/// At most one ticking task exists; restarting aborts the previous one.
pub struct CooldownTimer {
    period: Duration,
    state: Arc<Mutex<ResendCooldown>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Default for CooldownTimer {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl CooldownTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            state: Arc::new(Mutex::new(ResendCooldown::default())),
            task: Mutex::new(None),
        }
    }

    /// Start (or restart) a countdown of `units` ticks. Needs a tokio runtime.
    pub fn start(&self, units: u32) {
        let mut task = self.task.lock();
        if let Some(previous) = task.take() {
            previous.abort();
        }

        self.state.lock().start(units);
        if units == 0 {
            return;
        }

        let state = Arc::clone(&self.state);
        let period = self.period;
        *task = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                if state.lock().tick() {
                    break;
                }
            }
        }));
    }

    /// Cancel any countdown and re-enable resend.
    pub fn stop(&self) {
        if let Some(previous) = self.task.lock().take() {
            previous.abort();
        }
        self.state.lock().stop();
    }

    pub fn snapshot(&self) -> ResendCooldown {
        *self.state.lock()
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().is_enabled()
    }

    pub fn label(&self) -> String {
        self.state.lock().label()
    }
}

impl Drop for CooldownTimer {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}
