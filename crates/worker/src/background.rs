//! Fire-and-forget tasks.
//!
//! Background revalidation is spawned detached; its failures are logged at
//! the task boundary and go nowhere else. Join handles are kept only so a host
//! or test can wait for in-flight work with [`Background::settle`].

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use tokio::task::JoinHandle;
use uno_core::Error;

#[derive(Debug, Default)]
pub struct Background {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Background {
    /// Spawn `task` detached. An `Err` result is logged and dropped.
    pub fn spawn<F>(&self, label: &'static str, task: F)
    where
        F: Future<Output = Result<(), Error>> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            if let Err(err) = task.await {
                tracing::warn!(task = label, error = %err, "background task failed");
            }
        });

        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Number of tasks not yet known to be finished.
    pub fn pending(&self) -> usize {
        let handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait for every spawned task, including ones spawned while waiting.
    pub async fn settle(&self) {
        loop {
            let drained = std::mem::take(&mut *self.handles.lock().unwrap_or_else(PoisonError::into_inner));
            if drained.is_empty() {
                return;
            }
            for handle in drained {
                if let Err(err) = handle.await {
                    tracing::warn!(error = %err, "background task panicked");
                }
            }
        }
    }
}
