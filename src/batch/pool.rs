//! Bounded pool for CPU-bound work
//!
//! Work is handed to `spawn_blocking` only after a permit is acquired from a
//! fixed-size semaphore, so at most `capacity` closures run at once and the
//! rest queue. The permit moves into the blocking closure and is released
//! when that closure returns, even if the awaiting side was aborted.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskError {
    #[error("task was cancelled before it ran")]
    Cancelled,

    #[error("task did not finish before the deadline")]
    TimedOut,

    #[error("task aborted: {0}")]
    Aborted(String),
}

/// Cooperative cancellation flag shared by every task of one batch.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl WorkerPool {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits not currently held by running work.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Queue `work` and return a handle to await its result. Must be called
    /// from within a tokio runtime.
    pub fn submit<F, T>(&self, cancel: &CancelToken, work: F) -> TaskHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permits = self.permits.clone();
        let token = cancel.clone();

        let inner = tokio::spawn(async move {
            let permit = permits
                .acquire_owned()
                .await
                .map_err(|_| TaskError::Cancelled)?;
            if token.is_cancelled() {
                return Err(TaskError::Cancelled);
            }

            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                if token.is_cancelled() {
                    return Err(TaskError::Cancelled);
                }
                Ok(work())
            })
            .await
            .map_err(|e| TaskError::Aborted(e.to_string()))?
        });

        TaskHandle { inner }
    }

    /// Submit and await in one step.
    pub async fn run<F, T>(&self, work: F) -> Result<T, TaskError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.submit(&CancelToken::new(), work).await
    }
}

/// Awaitable result of submitted work. Dropping the handle stops waiting for
/// a permit; work that already started runs to completion and is discarded.
pub struct TaskHandle<T> {
    inner: JoinHandle<Result<T, TaskError>>,
}

impl<T> TaskHandle<T> {
    pub fn abort(&self) {
        self.inner.abort();
    }

    /// Await the result, giving up at `deadline`.
    pub async fn join_until(mut self, deadline: Instant) -> Result<T, TaskError> {
        match tokio::time::timeout_at(deadline, &mut self).await {
            Ok(result) => result,
            Err(_) => {
                self.abort();
                Err(TaskError::TimedOut)
            }
        }
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, TaskError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.inner).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(e)) if e.is_cancelled() => Poll::Ready(Err(TaskError::Cancelled)),
            Poll::Ready(Err(e)) => Poll::Ready(Err(TaskError::Aborted(e.to_string()))),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Drop for TaskHandle<T> {
    fn drop(&mut self) {
        self.inner.abort();
    }
}
