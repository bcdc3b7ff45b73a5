//! Operation shapes accepted by the runners, and constructors for them.
//!
//! Operations are owned by the caller; runners only invoke them. Two shapes
//! exist: [`Operation`] takes nothing but a [`Completion`], while [`Then`] and
//! [`Apply`] also receive an input value.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;

use crate::{Completion, Error, Result};

/// An operation that takes only a completion handle.
pub type Operation<T> = Box<dyn FnOnce(Completion<T>) + Send>;

/// A serial step that receives the previous step's value.
pub type Then<T> = Box<dyn FnOnce(T, Completion<T>) + Send>;

/// One operation applied to many values by [`parallel_map`](crate::parallel_map).
pub type Apply<V, T> = Arc<dyn Fn(V, Completion<T>) + Send + Sync>;

/// Box a closure as an [`Operation`].
///
/// # Example
///
/// ```rust
/// use async_flow::operation;
///
/// let op = operation::operation(|done| done.succeed(1));
/// ```
pub fn operation<T, F>(f: F) -> Operation<T>
where
    F: FnOnce(Completion<T>) + Send + 'static,
{
    Box::new(f)
}

/// Box a closure as a [`Then`] step.
///
/// # Example
///
/// ```rust
/// use async_flow::{operation, serial, Steps};
///
/// let mut chain = Steps::start(|done| done.succeed("a".to_string()));
/// chain.extend(vec![operation::then(|s: String, done| done.succeed(s + "b"))]);
/// serial(chain, |result| assert_eq!(result.unwrap().as_deref(), Some("ab")));
/// ```
pub fn then<T, F>(f: F) -> Then<T>
where
    F: FnOnce(T, Completion<T>) + Send + 'static,
{
    Box::new(f)
}

/// Share a closure as an [`Apply`] function.
pub fn apply<V, T, F>(f: F) -> Apply<V, T>
where
    F: Fn(V, Completion<T>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Build an [`Operation`] that runs `fut` on the current tokio runtime.
///
/// The future is spawned when the runner invokes the operation, not before.
///
/// # Example
///
/// ```rust
/// use async_flow::{future, operation};
///
/// # tokio_test::block_on(async {
/// let ops = vec![
///     operation::spawn(async { Ok(1) }),
///     operation::spawn(async { Ok(2) }),
/// ];
/// assert_eq!(future::parallel(ops).await.unwrap(), vec![1, 2]);
/// # });
/// ```
pub fn spawn<T, Fut>(fut: Fut) -> Operation<T>
where
    T: Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    Box::new(move |done: Completion<T>| spawn_reporting(fut.boxed(), done))
}

/// Build a [`Then`] step from an async function of the previous value.
pub fn spawn_then<T, F, Fut>(f: F) -> Then<T>
where
    T: Send + 'static,
    F: FnOnce(T) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    Box::new(move |value: T, done: Completion<T>| spawn_reporting(f(value).boxed(), done))
}

/// Build an [`Apply`] function from an async per-value function.
pub fn spawn_apply<V, T, F, Fut>(f: F) -> Apply<V, T>
where
    T: Send + 'static,
    F: Fn(V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    Arc::new(move |value: V, done: Completion<T>| spawn_reporting(f(value).boxed(), done))
}

pub(crate) fn spawn_reporting<T>(fut: BoxFuture<'static, Result<T>>, done: Completion<T>)
where
    T: Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move { done.complete(fut.await) });
        }
        Err(e) => done.fail(Error::Execution(format!("no tokio runtime: {e}"))),
    }
}
