//! Awaitable wrappers for completion-callback style work.
//!
//! [`channel`] hands out a [`Settle`] handle and the [`Pending`] future it
//! completes. The handle is consumed by `resolve` or `reject`, so a pending
//! operation settles at most once. Dropping the handle unsettled completes
//! the future with [`PluginError::Abandoned`].

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::error::{PluginError, Result};

/// Completion handle for a [`Pending`] operation.
#[derive(Debug)]
pub struct Settle<T> {
    tx: oneshot::Sender<anyhow::Result<T>>,
}

impl<T> Settle<T> {
    /// Fulfill the pending operation with `value`.
    pub fn resolve(self, value: T) {
        // Receiver gone means nobody awaits the outcome any more.
        let _ = self.tx.send(Ok(value));
    }

    /// Fail the pending operation with `error`.
    pub fn reject(self, error: impl Into<anyhow::Error>) {
        let _ = self.tx.send(Err(error.into()));
    }

    /// Whether the matching [`Pending`] has been dropped.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Future side of a settle handle.
#[derive(Debug)]
#[must_use = "a pending operation does nothing unless awaited"]
pub struct Pending<T> {
    rx: oneshot::Receiver<anyhow::Result<T>>,
}

impl<T> Future for Pending<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|outcome| match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(PluginError::Rejected(e)),
            Err(_) => Err(PluginError::Abandoned),
        })
    }
}

/// Create a connected settle handle / pending future pair.
pub fn channel<T>() -> (Settle<T>, Pending<T>) {
    let (tx, rx) = oneshot::channel();
    (Settle { tx }, Pending { rx })
}

/// Run `handler` with a fresh settle handle and return the pending future.
pub fn create_promise<T, F>(handler: F) -> Pending<T>
where
    F: FnOnce(Settle<T>),
{
    let (settle, pending) = channel();
    handler(settle);
    pending
}

/// Timer callback: resolve `settle` once `delay` has elapsed.
///
/// Must be called from within a tokio runtime.
pub fn resolve_after(delay: Duration, settle: Settle<()>) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        settle.resolve(());
    });
}

/// Suspend for at least `delay`, built on [`create_promise`] and a timer.
pub async fn sleep(delay: Duration) {
    let started = Instant::now();
    let timer = create_promise(|settle| resolve_after(delay, settle));
    await_timer(timer, started, delay).await;
}

/// Wait for a timer started at `started`.
///
/// If the timer task went away without firing (runtime shutting down), the
/// rest of `delay` is waited out directly so callers never resume early.
pub async fn await_timer(timer: Pending<()>, started: Instant, delay: Duration) {
    if let Err(e) = timer.await {
        tracing::debug!(error = %e, "Sleep timer did not fire, waiting out the delay");
        tokio::time::sleep_until(started + delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_with_value() {
        let pending = create_promise(|settle| settle.resolve(42));
        assert_eq!(pending.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn rejects_with_error() {
        let pending: Pending<u32> = create_promise(|settle| settle.reject(anyhow::anyhow!("lost")));
        let err = pending.await.unwrap_err();
        assert!(matches!(err, PluginError::Rejected(_)));
        assert!(err.to_string().contains("lost"));
    }

    #[tokio::test]
    async fn settles_from_another_task() {
        let pending = create_promise(|settle| {
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                settle.resolve("done");
            });
        });
        assert_eq!(pending.await.unwrap(), "done");
    }

    #[tokio::test]
    async fn dropped_handle_is_abandoned() {
        let pending: Pending<()> = create_promise(drop);
        assert!(matches!(pending.await, Err(PluginError::Abandoned)));
    }

    #[test]
    fn handle_sees_dropped_future() {
        let (settle, pending) = channel::<()>();
        assert!(!settle.is_abandoned());
        drop(pending);
        assert!(settle.is_abandoned());
        settle.resolve(());
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_waits_at_least_delay() {
        let start = Instant::now();
        sleep(Duration::from_millis(50)).await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_timer_still_waits_full_delay() {
        let start = Instant::now();
        let timer: Pending<()> = create_promise(drop);
        await_timer(timer, start, Duration::from_millis(50)).await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn sleep_zero_resumes() {
        sleep(Duration::ZERO).await;
    }
}
