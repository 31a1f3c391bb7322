use std::time::Duration;

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval, timeout},
};
use tracing::{error, info, warn};

use crate::state::SharedStore;

/// Period between two autosaves.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(1_000);
/// Window granted to the final save when shutting down.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(1);

/// Handle on the background autosave task.
pub struct AutosaveHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Start saving `store` every `period`, beginning immediately.
pub fn spawn(store: SharedStore, period: Duration) -> AutosaveHandle {
    let (stop, stop_rx) = watch::channel(false);
    let task = tokio::spawn(run(store, period, stop_rx));
    AutosaveHandle { stop, task }
}

impl AutosaveHandle {
    /// Stop ticking and wait up to `grace` for the in-flight and final saves to land.
    ///
    /// Returns `true` when the task finished inside the window.
    pub async fn shutdown(self, grace: Duration) -> bool {
        let _ = self.stop.send(true);

        match timeout(grace, self.task).await {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                error!(error = %err, "autosave task failed");
                false
            }
            Err(_) => {
                warn!(
                    grace_ms = grace.as_millis() as u64,
                    "final save did not complete within the grace window"
                );
                false
            }
        }
    }

    /// Whether the task already exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn run(store: SharedStore, period: Duration, mut stop: watch::Receiver<bool>) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut failing = false;

    info!(
        location = %store.location(),
        period_ms = period.as_millis() as u64,
        "autosave started"
    );

    loop {
        tokio::select! {
            biased;
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                store.refresh_clock();
                save_once(&store, &mut failing).await;
            }
        }
    }

    store.refresh_clock();
    save_once(&store, &mut failing).await;
    info!(location = %store.location(), "autosave stopped");
}

/// One save attempt; failures are retried by the next tick.
async fn save_once(store: &SharedStore, failing: &mut bool) {
    match store.save().await {
        Ok(()) => {
            if *failing {
                info!("autosave succeeded again; storage recovered");
                *failing = false;
            }
        }
        Err(err) => {
            if *failing {
                warn!(error = %err, "autosave still failing");
            } else {
                warn!(error = %err, "autosave failed; keeping in-memory document authoritative");
                *failing = true;
            }
        }
    }
}
