// src/scheduler.rs
//! Cancelable deferred tasks

use log::debug;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::task::JoinHandle;

/// A task that runs once after a delay unless canceled first.
///
/// Dropping the handle cancels the task, so a pending action never outlives
/// the owner that scheduled it.
#[derive(Debug)]
pub struct ScheduledTask {
    canceled: Arc<AtomicBool>,
    fired: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    /// Run `action` after `delay` on the current tokio runtime
    pub fn schedule<F>(delay: Duration, action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let canceled = Arc::new(AtomicBool::new(false));
        let fired = Arc::new(AtomicBool::new(false));

        let task_canceled = Arc::clone(&canceled);
        let task_fired = Arc::clone(&fired);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !task_canceled.load(Ordering::Acquire) {
                task_fired.store(true, Ordering::Release);
                action();
            }
        });

        Self {
            canceled,
            fired,
            handle: Some(handle),
        }
    }

    /// Prevent the action from running. Calling this more than once is harmless.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.canceled.store(true, Ordering::Release);
            handle.abort();
            debug!("Scheduled task canceled");
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle.is_some() && !self.fired.load(Ordering::Acquire)
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = ScheduledTask::schedule(Duration::from_secs(3), move || {
            let _ = tx.send("fired");
        });

        tokio::time::sleep(Duration::from_millis(2_900)).await;
        assert!(rx.try_recv().is_err());
        assert!(task.is_pending());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(rx.recv().await, Some("fired"));
        assert!(task.has_fired());
        assert!(!task.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        let mut task = ScheduledTask::schedule(Duration::from_secs(3), move || {
            let _ = tx.send(());
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        task.cancel();
        task.cancel();
        assert!(!task.is_pending());

        tokio::time::sleep(Duration::from_secs(10)).await;
        // The aborted task dropped its sender without sending
        assert_eq!(rx.recv().await, None);
        assert!(!task.has_fired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        let task = ScheduledTask::schedule(Duration::from_secs(1), move || {
            let _ = tx.send(());
        });
        drop(task);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(rx.recv().await, None);
    }
}
