// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deadline-bound execution of collaborator calls.
//!
//! Every session store, repository and gateway call made while handling an
//! update goes through a [`CallBudget`], so a slow dependency fails the
//! update with [`AtelierError::Timeout`] instead of pinning the user's lock,
//! and shutdown interrupts it with [`AtelierError::Cancelled`].

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::AtelierError;

/// Per-call timeout plus the process shutdown token.
#[derive(Debug, Clone)]
pub struct CallBudget {
    timeout: Duration,
    cancel: CancellationToken,
}

impl CallBudget {
    pub fn new(timeout: Duration, cancel: CancellationToken) -> Self {
        Self { timeout, cancel }
    }

    /// Budget with a timeout and a token that is never cancelled.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(timeout, CancellationToken::new())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Runs `fut` until it completes, the timeout elapses, or shutdown is requested.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, AtelierError>
    where
        F: Future<Output = Result<T, AtelierError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(AtelierError::Cancelled),
            res = tokio::time::timeout(self.timeout, fut) => match res {
                Ok(inner) => inner,
                Err(_) => Err(AtelierError::Timeout { duration: self.timeout }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_fast_results() {
        let budget = CallBudget::with_timeout(Duration::from_secs(1));
        let value = budget.run(async { Ok::<_, AtelierError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn passes_through_inner_errors() {
        let budget = CallBudget::with_timeout(Duration::from_secs(1));
        let err = budget
            .run(async { Err::<(), _>(AtelierError::Internal("boom".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, AtelierError::Internal(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let budget = CallBudget::with_timeout(Duration::from_millis(50));
        let err = budget
            .run(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<_, AtelierError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AtelierError::Timeout { .. }));
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        let budget = CallBudget::new(Duration::from_secs(5), token);
        let err = budget
            .run(std::future::pending::<Result<(), AtelierError>>())
            .await
            .unwrap_err();
        assert!(matches!(err, AtelierError::Cancelled));
    }
}
