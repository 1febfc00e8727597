use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Periodic task that can be cancelled any number of times.
///
/// Dropping the timer cancels it, so a session never leaves a ticking task
/// behind.
#[derive(Debug, Default)]
pub struct TickTimer {
    handle: Option<JoinHandle<()>>,
}

impl TickTimer {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Run `on_tick` every `period`, replacing any timer already running.
    ///
    /// The first call happens one full period after start.
    pub fn start<F, Fut>(&mut self, period: Duration, mut on_tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                interval.tick().await;
                on_tick().await;
            }
        }));
    }

    /// Stop the timer if it is running. Returns whether anything was stopped.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for TickTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
