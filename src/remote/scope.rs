//! Cancellation scope for the requests a view issues.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{CasebookError, Result};

/// Ties outstanding requests to the lifetime of their owner.
///
/// Work run through [`FetchScope::run`] resolves to
/// [`CasebookError::Cancelled`] as soon as the scope is cancelled, and its
/// result is dropped unseen. Child scopes are cancelled with their parent.
#[derive(Debug, Clone, Default)]
pub struct FetchScope {
    token: CancellationToken,
}

impl FetchScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope cancelled together with this one, but cancellable on its own
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            debug!("cancelling fetch scope");
        }
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Run `fut` unless the scope is cancelled first
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.token.is_cancelled() {
            return Err(CasebookError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(CasebookError::Cancelled),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_passes_result_through() {
        let scope = FetchScope::new();
        let value = scope.run(async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_pending_work() {
        let scope = FetchScope::new();
        let task = {
            let scope = scope.clone();
            tokio::spawn(async move {
                scope
                    .run(async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        Ok("late")
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        scope.cancel();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(CasebookError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancelled_scope_never_starts_work() {
        let scope = FetchScope::new();
        scope.cancel();
        let mut started = false;
        let result = scope
            .run(async {
                started = true;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(CasebookError::Cancelled)));
        assert!(!started);
    }

    #[test]
    fn test_child_follows_parent() {
        let parent = FetchScope::new();
        let child = parent.child();
        child.cancel();
        assert!(!parent.is_cancelled());

        let child = parent.child();
        parent.cancel();
        assert!(child.is_cancelled());
    }
}
