//! Cancellable periodic background tasks.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Handle to a spawned periodic sweep task.
///
/// Dropping the handle aborts the task, so an owning component torn down
/// without an explicit shutdown cannot leak periodic work.
pub struct SweepHandle {
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SweepHandle {
    /// Signal the task to stop and wait for it to exit.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Whether the task has already exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(|t| t.is_finished()).unwrap_or(true)
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Spawn a task that runs `tick` every `every` until shut down.
///
/// The interval's immediate first tick is consumed on spawn, so the first
/// real run happens one full period later.
pub(crate) fn spawn_sweeper<F>(name: &'static str, every: Duration, tick: F) -> SweepHandle
where
    F: Fn() + Send + 'static,
{
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    tick();
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        debug!(task = name, "sweep task stopped");
                        break;
                    }
                }
            }
        }
    });
    SweepHandle {
        shutdown_tx,
        task: Some(task),
    }
}
