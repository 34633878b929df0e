//! Cancellable periodic ticker

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Handle of a running ticker; stopping or dropping it ends the task
#[derive(Debug)]
pub struct TickerHandle {
    stop: watch::Sender<bool>,
}

impl TickerHandle {
    /// Spawns a task calling `on_tick` every `period`
    ///
    /// The first tick fires one full period after the start. A tick that
    /// overruns delays the following ones instead of bursting.
    pub fn spawn<F, Fut>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (stop, mut stopped) = watch::channel(false);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = stopped.changed() => break,
                    _ = interval.tick() => on_tick().await,
                }
            }
        });

        Self { stop }
    }

    /// Stops the ticker; a tick already in progress completes first
    pub fn stop(self) {
        let _ = self.stop.send(true);
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
    }
}
