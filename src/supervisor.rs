//! Fan-out execution of independent monitors.
//!
//! Every monitor runs as its own task under a shared cancellation token.
//! The first task to fail cancels the rest; [`Supervisor::wait`] returns once
//! every task has exited.

use crate::error::MonitorError;
use std::collections::HashMap;
use std::future::Future;
use tokio::task::{Id, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Runs named monitor tasks and propagates the first failure.
#[derive(Debug)]
pub struct Supervisor {
    cancel: CancellationToken,
    tasks: JoinSet<Result<(), MonitorError>>,
    names: HashMap<Id, String>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}

impl Supervisor {
    /// Creates a supervisor driven by `cancel`.
    ///
    /// Cancelling the token from outside asks every task to stop.
    #[must_use]
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            tasks: JoinSet::new(),
            names: HashMap::new(),
        }
    }

    /// Returns a handle to the shared cancellation token.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Number of tasks still running.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if no tasks are running.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Spawns a monitor task under `name`.
    ///
    /// The task should return `Ok(())` once it observes cancellation.
    pub fn spawn<F, E>(&mut self, name: impl Into<String>, task: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<MonitorError> + 'static,
    {
        let handle = self
            .tasks
            .spawn(async move { task.await.map_err(Into::into) });
        self.names.insert(handle.id(), name.into());
    }

    /// Waits for every task to exit.
    ///
    /// The first error (or panic) cancels all other tasks. Returns `Ok(())`
    /// if every task exited cleanly.
    ///
    /// # Errors
    ///
    /// Returns the first task error observed.
    pub async fn wait(mut self) -> Result<(), MonitorError> {
        let mut first_error = None;

        while let Some(joined) = self.tasks.join_next_with_id().await {
            let (name, result) = match joined {
                Ok((id, result)) => (self.names.remove(&id), result),
                Err(error) => {
                    let name = self.names.remove(&error.id());
                    let reason = join_failure(&error);
                    let task = name.clone().unwrap_or_default();
                    (name, Err(MonitorError::TaskFailed { task, reason }))
                }
            };
            let name = name.unwrap_or_default();

            match result {
                Ok(()) => tracing::debug!(task = %name, "Task exited"),
                Err(error) => {
                    if first_error.is_none() {
                        tracing::error!(task = %name, %error, "Task failed, stopping all monitors");
                        self.cancel.cancel();
                        first_error = Some(error);
                    } else {
                        tracing::debug!(task = %name, %error, "Task failed after shutdown began");
                    }
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

fn join_failure(error: &JoinError) -> String {
    if error.is_cancelled() {
        return "cancelled".to_string();
    }
    error.to_string()
}
