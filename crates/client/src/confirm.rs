//! Confirmation step for destructive actions.

use std::future::Future;
use std::pin::Pin;

use crate::error::AppResult;

type DeleteFuture = Pin<Box<dyn Future<Output = AppResult<()>> + Send>>;

/// A pending deletion. Nothing is sent to the store until [`confirm`] is
/// called; dropping the prompt cancels it.
///
/// [`confirm`]: DeletePrompt::confirm
#[must_use = "a delete prompt does nothing unless confirmed"]
pub struct DeletePrompt {
    message: String,
    action: DeleteFuture,
}

impl DeletePrompt {
    pub(crate) fn new<F>(message: impl Into<String>, action: F) -> Self
    where
        F: Future<Output = AppResult<()>> + Send + 'static,
    {
        Self {
            message: message.into(),
            action: Box::pin(action),
        }
    }

    /// Question to put to the user.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub async fn confirm(self) -> AppResult<()> {
        self.action.await
    }
}

impl core::fmt::Debug for DeletePrompt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeletePrompt").field("message", &self.message).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(calls: &Arc<AtomicUsize>) -> DeletePrompt {
        let calls = calls.clone();
        DeletePrompt::new("Delete this client?", async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[tokio::test]
    async fn only_confirm_runs_the_delete() {
        let calls = Arc::new(AtomicUsize::new(0));
        drop(counting(&calls));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let prompt = counting(&calls);
        assert_eq!(prompt.message(), "Delete this client?");
        prompt.confirm().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
