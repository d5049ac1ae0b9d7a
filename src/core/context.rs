//! # Operation Context
//!
//! Carries cancellation and an optional overall deadline for one service
//! call. Store and cache wrappers run every backend call through
//! [`OperationContext::bounded`], which races the call against a per-call
//! timeout (clipped to whatever is left of the deadline) and against
//! cancellation. An expired deadline is reported the same way as a
//! cancellation; only the per-call timeout is reported as a timeout.
//!
//! There is no cleanup on interruption: every step of a flow either
//! committed before the interruption or did not happen.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a bounded call did not complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    /// The per-call timeout elapsed
    TimedOut(Duration),
    /// The caller cancelled or the overall deadline passed
    Cancelled,
}

/// Cancellation and deadline for one request
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl OperationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Attach an externally owned cancellation token
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels every call made under this context
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= Instant::now())
    }

    /// Per-call timeout clipped to the remaining deadline
    pub fn effective_timeout(&self, per_call: Duration) -> Duration {
        match self.deadline {
            Some(deadline) => per_call.min(deadline.saturating_duration_since(Instant::now())),
            None => per_call,
        }
    }

    /// Run `fut` under this context's cancellation and deadline
    pub async fn bounded<F, T>(&self, per_call: Duration, fut: F) -> Result<T, Interrupted>
    where
        F: Future<Output = T>,
    {
        if self.cancel.is_cancelled() || self.deadline_passed() {
            return Err(Interrupted::Cancelled);
        }

        let timeout = self.effective_timeout(per_call);
        let deadline_bound = timeout < per_call;

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Interrupted::Cancelled),
            result = tokio::time::timeout(timeout, fut) => result.map_err(|_| {
                if deadline_bound {
                    Interrupted::Cancelled
                } else {
                    Interrupted::TimedOut(timeout)
                }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_within_timeout() {
        let ctx = OperationContext::new();
        let value = ctx.bounded(Duration::from_secs(1), async { 7 }).await;
        assert_eq!(value, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out() {
        let ctx = OperationContext::new();
        let result = ctx
            .bounded(Duration::from_millis(50), tokio::time::sleep(Duration::from_secs(5)))
            .await;
        assert_eq!(result, Err(Interrupted::TimedOut(Duration::from_millis(50))));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let ctx = OperationContext::new();
        ctx.cancel();
        let result = ctx.bounded(Duration::from_secs(1), async { 1 }).await;
        assert_eq!(result, Err(Interrupted::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_in_flight() {
        let ctx = OperationContext::new();
        let token = ctx.token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let result = ctx
            .bounded(Duration::from_secs(60), tokio::time::sleep(Duration::from_secs(30)))
            .await;
        assert_eq!(result, Err(Interrupted::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_clips_per_call_timeout() {
        let ctx = OperationContext::with_timeout(Duration::from_millis(100));
        assert!(ctx.effective_timeout(Duration::from_secs(10)) <= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_deadline_never_starts_call() {
        let ctx = OperationContext::with_timeout(Duration::ZERO);
        let started = std::sync::atomic::AtomicBool::new(false);

        let result = ctx
            .bounded(Duration::from_secs(1), async {
                started.store(true, std::sync::atomic::Ordering::SeqCst);
            })
            .await;

        assert_eq!(result, Err(Interrupted::Cancelled));
        assert!(!started.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_in_flight_is_cancellation() {
        let ctx = OperationContext::with_timeout(Duration::from_millis(100));
        let result = ctx
            .bounded(Duration::from_secs(10), tokio::time::sleep(Duration::from_secs(5)))
            .await;
        assert_eq!(result, Err(Interrupted::Cancelled));
    }
}
