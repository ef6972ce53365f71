//! Structured concurrency for views.
//!
//! Requests started on behalf of a view are spawned on its [`ViewScope`].
//! Closing or dropping the scope aborts whatever is still in flight, so a
//! result can never land in a view that is gone.

use std::future::Future;

use tokio::task::{AbortHandle, JoinSet};

#[derive(Debug)]
pub struct ViewScope<T> {
    name: &'static str,
    tasks: JoinSet<T>,
}

impl<T: Send + 'static> ViewScope<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            tasks: JoinSet::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn spawn<F>(&mut self, fut: F) -> AbortHandle
    where
        F: Future<Output = T> + Send + 'static,
    {
        self.tasks.spawn(fut)
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Next finished result; `None` once nothing is in flight. Aborted and
    /// panicked tasks are skipped.
    pub async fn next(&mut self) -> Option<T> {
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(value) => return Some(value),
                Err(e) if e.is_cancelled() => continue,
                Err(e) => tracing::error!(scope = self.name, error = %e, "view task panicked"),
            }
        }
        None
    }

    /// Abort everything still running.
    pub fn close(&mut self) {
        if !self.tasks.is_empty() {
            tracing::debug!(scope = self.name, aborted = self.tasks.len(), "closing view scope");
        }
        self.tasks.abort_all();
    }
}
