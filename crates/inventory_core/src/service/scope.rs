//! Cancellable set of background tasks owned by one controller.
//!
//! # Invariants
//! - `cancel()` aborts tasks that have not finished; finished work stays done.
//! - After `cancel()` every new launch is dropped without running.
//! - Dropping the scope aborts whatever is still pending.
//! - A blocking SQL call that already started still runs to completion; only
//!   the task awaiting it is aborted.

use log::{debug, error, warn};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinSet;

/// Fire-and-forget task scope tied to its owner's lifetime.
#[derive(Debug)]
pub struct TaskScope {
    name: &'static str,
    state: Mutex<ScopeState>,
}

#[derive(Debug, Default)]
struct ScopeState {
    tasks: JoinSet<()>,
    cancelled: bool,
}

impl TaskScope {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(ScopeState::default()),
        }
    }

    /// Spawns `future` on the current Tokio runtime within this scope.
    ///
    /// Dropped with a log line when the scope is cancelled or no runtime is
    /// available.
    pub fn launch<F>(&self, task: &'static str, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut state = self.state();
        if state.cancelled {
            debug!(
                "event=task_launch module=scope status=dropped scope={} task={} reason=cancelled",
                self.name, task
            );
            return;
        }

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(err) => {
                error!(
                    "event=task_launch module=scope status=error scope={} task={} error_code=no_runtime error={}",
                    self.name, task, err
                );
                return;
            }
        };

        reap_finished(self.name, &mut state.tasks);
        state.tasks.spawn_on(future, &handle);
        debug!(
            "event=task_launch module=scope status=ok scope={} task={} pending={}",
            self.name,
            task,
            state.tasks.len()
        );
    }

    /// Aborts pending tasks and refuses further launches.
    pub fn cancel(&self) {
        let mut state = self.state();
        if state.cancelled {
            return;
        }
        state.cancelled = true;
        let pending = state.tasks.len();
        state.tasks.abort_all();
        debug!(
            "event=scope_cancel module=scope status=ok scope={} aborted={}",
            self.name, pending
        );
    }

    pub fn is_cancelled(&self) -> bool {
        self.state().cancelled
    }

    /// Number of launched tasks not yet observed as finished.
    pub fn pending(&self) -> usize {
        let mut state = self.state();
        reap_finished(self.name, &mut state.tasks);
        state.tasks.len()
    }

    fn state(&self) -> MutexGuard<'_, ScopeState> {
        // Nothing in ScopeState can be left half-updated by a panic.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn reap_finished(scope: &str, tasks: &mut JoinSet<()>) {
    while let Some(result) = tasks.try_join_next() {
        if let Err(err) = result {
            if err.is_panic() {
                warn!(
                    "event=task_join module=scope status=error scope={} error_code=task_panicked",
                    scope
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TaskScope;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn launched_task_runs_to_completion() {
        let scope = TaskScope::new("test");
        let (tx, rx) = oneshot::channel();
        scope.launch("send", async move {
            let _ = tx.send(42);
        });
        assert_eq!(rx.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn cancel_aborts_pending_and_rejects_new_work() {
        let scope = TaskScope::new("test");
        let counter = Arc::new(AtomicUsize::new(0));

        let slow = Arc::clone(&counter);
        scope.launch("slow", async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            slow.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(scope.pending(), 1);

        scope.cancel();
        assert!(scope.is_cancelled());

        let late = Arc::clone(&counter);
        scope.launch("late", async move {
            late.fetch_add(1, Ordering::SeqCst);
        });

        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(scope.pending(), 0);
    }

    #[tokio::test]
    async fn completed_work_survives_cancel() {
        let scope = TaskScope::new("test");
        let (tx, rx) = oneshot::channel();
        scope.launch("done", async move {
            let _ = tx.send("done");
        });
        assert_eq!(rx.await.unwrap(), "done");

        scope.cancel();
        assert_eq!(scope.pending(), 0);
    }

    #[test]
    fn launch_without_runtime_is_dropped() {
        let scope = TaskScope::new("test");
        scope.launch("orphan", async {});
        assert_eq!(scope.pending(), 0);
    }
}
