use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Handle to a spawned delayed task. Cancelling or dropping the handle aborts
/// the task, including any await it is suspended on.
#[derive(Debug)]
pub struct TimerHandle {
    handle: Option<JoinHandle<()>>,
}

impl TimerHandle {
    /// Run `task` after `delay` on the current runtime
    pub fn schedule<F>(delay: Duration, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            task.await;
        });
        Self {
            handle: Some(handle),
        }
    }

    /// Run `task` immediately
    pub fn spawn<F>(task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self::schedule(Duration::ZERO, task)
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
