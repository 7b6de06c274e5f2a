use futures::future::BoxFuture;
use tokio_util::task::TaskTracker;

/// Work that must finish after the response has been sent.
///
/// Whoever provides this keeps the process alive until every deferred task
/// has completed.
pub trait BackgroundTasks: Send + Sync {
    fn defer(&self, name: &'static str, task: BoxFuture<'static, ()>);
}

/// Runs deferred tasks on the tokio runtime and lets shutdown wait for them.
#[derive(Clone)]
pub struct TrackedTasks {
    tracker: TaskTracker,
}

impl TrackedTasks {
    pub fn new() -> Self {
        TrackedTasks {
            tracker: TaskTracker::new(),
        }
    }

    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting tasks and wait for the ones already running.
    pub async fn drain(&self) {
        self.tracker.close();
        if self.pending() > 0 {
            tracing::info!(pending = self.pending(), "waiting for background tasks");
        }
        self.tracker.wait().await;
    }
}

impl BackgroundTasks for TrackedTasks {
    fn defer(&self, name: &'static str, task: BoxFuture<'static, ()>) {
        tracing::debug!(task = name, "deferring background task");
        self.tracker.spawn(task);
    }
}
