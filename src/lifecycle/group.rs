//! Task group with a shared cancellation token.
//!
//! Every task sees the same token. The first task to fail (returning an
//! error or panicking) cancels it so siblings start their shutdown, and
//! `wait` reports that first failure once all tasks have exited. A task
//! that returns `Ok` after cancellation is tagged `Cancelled`, never an
//! error.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

const COMPONENT: &str = "app";

/// How a task finished.
#[derive(Debug)]
pub enum TaskExit {
    Completed,
    Cancelled,
    Failed(anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("task {0:?} panicked")]
    Panicked(String),
}

pub struct TaskGroup {
    token: CancellationToken,
    tasks: JoinSet<(String, TaskExit)>,
}

impl TaskGroup {
    /// New group whose token is a child of `parent`: cancelling the parent
    /// stops the group, a failure inside the group does not cancel the
    /// parent.
    pub fn new(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
            tasks: JoinSet::new(),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run `task` on the current runtime as a member of the group.
    pub fn spawn<F>(&mut self, name: impl Into<String>, task: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = name.into();
        let token = self.token.clone();
        self.tasks.spawn(async move {
            let exit = match AssertUnwindSafe(task).catch_unwind().await {
                Ok(Ok(())) if token.is_cancelled() => TaskExit::Cancelled,
                Ok(Ok(())) => TaskExit::Completed,
                Ok(Err(e)) => TaskExit::Failed(e),
                Err(_) => TaskExit::Failed(TaskError::Panicked(name.clone()).into()),
            };
            (name, exit)
        });
    }

    /// Wait for every task to exit.
    ///
    /// Returns the first failure, annotated with the task name.
    pub async fn wait(mut self) -> anyhow::Result<()> {
        let mut first: Option<anyhow::Error> = None;

        while let Some(joined) = self.tasks.join_next().await {
            // Panics are caught inside the task, so a join error means the
            // runtime aborted it.
            let (name, exit) = match joined {
                Ok(done) => done,
                Err(e) => (e.to_string(), TaskExit::Cancelled),
            };

            match exit {
                TaskExit::Completed => tracing::debug!(target: COMPONENT, task = %name, "task completed"),
                TaskExit::Cancelled => tracing::debug!(target: COMPONENT, task = %name, "task cancelled"),
                TaskExit::Failed(err) => {
                    tracing::error!(target: COMPONENT, task = %name, error = %format!("{err:#}"), "task failed");
                    self.token.cancel();
                    if first.is_none() {
                        first = Some(err.context(format!("task {name:?}")));
                    }
                }
            }
        }

        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
