//! Resend cooldown.
//!
//! [`Countdown`] is the pure counter. [`ResendTicker`] owns the tokio task that
//! ticks it once per second and publishes every value on a watch channel so a
//! form can render "Resend in 42s". The task is aborted on `cancel()`, on
//! restart and on drop, so no interval outlives the challenge that armed it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::trace;

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
}

impl Countdown {
    pub fn started(secs: u32) -> Self {
        Self { remaining: secs }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn can_resend(&self) -> bool {
        self.remaining == 0
    }

    /// Advance one second. Returns true once the countdown has finished.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.can_resend()
    }
}

pub struct ResendTicker {
    cooldown_secs: u32,
    state: Arc<watch::Sender<Countdown>>,
    task: Option<JoinHandle<()>>,
    available_at: Option<Instant>,
}

impl ResendTicker {
    pub fn new(cooldown_secs: u32) -> Self {
        let (tx, _rx) = watch::channel(Countdown::default());
        Self {
            cooldown_secs,
            state: Arc::new(tx),
            task: None,
            available_at: None,
        }
    }

    /// Arm the cooldown. Any running countdown is replaced.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self) {
        self.abort_task();

        let secs = self.cooldown_secs;
        let now = Instant::now();
        self.state.send_replace(Countdown::started(secs));
        self.available_at = Some(now + Duration::from_secs(u64::from(secs)));

        let state = Arc::clone(&self.state);
        self.task = Some(tokio::spawn(async move {
            let mut interval = interval_at(now + TICK, TICK);
            loop {
                interval.tick().await;
                let mut finished = false;
                state.send_modify(|countdown| finished = countdown.tick());
                if finished {
                    trace!("resend cooldown elapsed");
                    break;
                }
            }
        }));
    }

    /// Stop ticking and forget the deadline.
    pub fn cancel(&mut self) {
        self.abort_task();
        self.available_at = None;
        self.state.send_replace(Countdown::default());
    }

    pub fn countdown(&self) -> Countdown {
        *self.state.borrow()
    }

    pub fn remaining(&self) -> u32 {
        self.countdown().remaining()
    }

    pub fn can_resend(&self) -> bool {
        self.countdown().can_resend()
    }

    /// Earliest instant a resend is allowed, if the ticker is armed
    pub fn available_at(&self) -> Option<Instant> {
        self.available_at
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn subscribe(&self) -> watch::Receiver<Countdown> {
        self.state.subscribe()
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ResendTicker {
    fn drop(&mut self) {
        self.abort_task();
    }
}
