//! The async task-composition primitive.
//!
//! A [`Task`] represents a value that becomes available after zero or more
//! asynchronous steps, or fails with a [`GatewayError`]. It is the uniform
//! contract every filter and the dispatch handler compose over:
//!
//! - [`Task::and_then`] sequences steps; a failed step short-circuits the
//!   rest of the chain.
//! - [`Task::par`] runs tasks concurrently and fails fast on the first
//!   failure, discarding sibling results.
//! - [`Task::create`] returns a promise-style pair whose outcome is set at
//!   most once; a second completion fails with `IllegalState` instead of
//!   silently overwriting.
//!
//! Composition is lazy: nothing is spawned onto a runtime and no thread-pool
//! model is assumed. A task only guarantees ordering of its steps, not which
//! thread or turn runs a continuation. The terminal operation is awaiting
//! the task, which observes exactly one outcome exactly once.
//!
//! # Example
//!
//! ```
//! use propylaea_core::Task;
//!
//! # tokio_test::block_on(async {
//! let task = Task::succeeded(2)
//!     .and_then("double", |n| async move { Ok(n * 2) })
//!     .and_then("stringify", |n| async move { Ok(n.to_string()) });
//!
//! assert_eq!(task.await.unwrap(), "4");
//! # });
//! ```

use crate::error::{GatewayError, GatewayResult};
use futures::future::{self, BoxFuture};
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// An asynchronous value-or-error with sequential and parallel composition.
///
/// See the [module documentation](self) for semantics.
pub struct Task<T> {
    fut: BoxFuture<'static, GatewayResult<T>>,
}

impl<T: Send + 'static> Task<T> {
    /// Creates an unresolved task together with its completer.
    ///
    /// The completer side enforces single assignment: the first call to
    /// [`TaskCompleter::complete`] or [`TaskCompleter::fail`] resolves the
    /// task, any later call fails with `IllegalState`.
    #[must_use]
    pub fn create() -> (Self, TaskCompleter<T>) {
        let (tx, rx) = oneshot::channel();
        let task = Self {
            fut: Box::pin(async move {
                rx.await.map_err(|_| {
                    GatewayError::illegal_state("task completer dropped before resolution")
                })?
            }),
        };
        let completer = TaskCompleter {
            tx: Arc::new(Mutex::new(Some(tx))),
        };
        (task, completer)
    }

    /// Creates an already-succeeded task.
    #[must_use]
    pub fn succeeded(value: T) -> Self {
        Self {
            fut: Box::pin(future::ready(Ok(value))),
        }
    }

    /// Creates an already-failed task.
    #[must_use]
    pub fn failed(error: GatewayError) -> Self {
        Self {
            fut: Box::pin(future::ready(Err(error))),
        }
    }

    /// Creates a task from a result.
    #[must_use]
    pub fn from_result(result: GatewayResult<T>) -> Self {
        Self {
            fut: Box::pin(future::ready(result)),
        }
    }

    /// Wraps an arbitrary future as a task.
    #[must_use]
    pub fn from_future<F>(fut: F) -> Self
    where
        F: Future<Output = GatewayResult<T>> + Send + 'static,
    {
        Self { fut: Box::pin(fut) }
    }

    /// Sequential composition.
    ///
    /// `step` runs only if this task succeeded; its failure (or this task's)
    /// becomes the failure of the returned task and no further step runs.
    /// `name` is diagnostic only and appears in trace logs.
    #[must_use]
    pub fn and_then<U, F, Fut>(self, name: &'static str, step: F) -> Task<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = GatewayResult<U>> + Send + 'static,
    {
        Task {
            fut: Box::pin(async move {
                let value = self.fut.await?;
                tracing::trace!(step = name, "task step");
                match step(value).await {
                    Ok(next) => Ok(next),
                    Err(error) => {
                        tracing::debug!(step = name, %error, "task step failed");
                        Err(error)
                    }
                }
            }),
        }
    }

    /// Transforms the success value without introducing a failure path.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Task<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        Task {
            fut: Box::pin(async move { self.fut.await.map(f) }),
        }
    }

    /// Parallel composition with fail-fast semantics.
    ///
    /// All tasks execute concurrently. The combined task succeeds with the
    /// results in input order only if all succeed; the first encountered
    /// failure fails the whole combination and sibling results already
    /// completed are discarded. No partial list is ever observable.
    #[must_use]
    pub fn par(tasks: Vec<Self>) -> Task<Vec<T>> {
        Task {
            fut: Box::pin(future::try_join_all(tasks.into_iter().map(|t| t.fut))),
        }
    }

    /// Attaches an inspection hook to the failure channel.
    ///
    /// The hook observes the error before it propagates; it cannot recover
    /// the task.
    #[must_use]
    pub fn on_failure<F>(self, hook: F) -> Self
    where
        F: FnOnce(&GatewayError) + Send + 'static,
    {
        Self {
            fut: Box::pin(async move {
                match self.fut.await {
                    Ok(value) => Ok(value),
                    Err(error) => {
                        hook(&error);
                        Err(error)
                    }
                }
            }),
        }
    }
}

impl<T> Future for Task<T> {
    type Output = GatewayResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.fut.as_mut().poll(cx)
    }
}

impl<T> std::fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}

/// The write half of [`Task::create`].
///
/// A completer may be cloned and handed to callbacks; all clones share the
/// same single-assignment slot.
pub struct TaskCompleter<T> {
    tx: Arc<Mutex<Option<oneshot::Sender<GatewayResult<T>>>>>,
}

impl<T> Clone for TaskCompleter<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T: Send + 'static> TaskCompleter<T> {
    /// Resolves the task successfully.
    ///
    /// Fails with `IllegalState` if the task outcome was already set.
    pub fn complete(&self, value: T) -> GatewayResult<()> {
        self.resolve(Ok(value))
    }

    /// Resolves the task with a failure.
    ///
    /// Fails with `IllegalState` if the task outcome was already set.
    pub fn fail(&self, error: GatewayError) -> GatewayResult<()> {
        self.resolve(Err(error))
    }

    /// Returns true if the task outcome has already been set.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.tx.lock().is_none()
    }

    fn resolve(&self, outcome: GatewayResult<T>) -> GatewayResult<()> {
        let tx = self
            .tx
            .lock()
            .take()
            .ok_or_else(|| GatewayError::illegal_state("task outcome already set"))?;
        // The reader may have been dropped; that is not an error for the writer.
        let _ = tx.send(outcome);
        Ok(())
    }
}

impl<T> std::fmt::Debug for TaskCompleter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskCompleter")
            .field("resolved", &self.tx.lock().is_none())
            .finish()
    }
}
