//! Awaitable versions of the runners.
//!
//! Each function starts the corresponding callback runner and resolves when
//! its final callback fires. If the callback is dropped unfired, because some
//! operation dropped its completion handle, the future resolves to
//! [`Error::Abandoned`] instead of hanging.

use tokio::sync::oneshot;

use crate::operation::{Apply, Operation};
use crate::serial::IntoSteps;
use crate::{Error, Result};

/// Await [`serial`](crate::serial).
///
/// # Example
///
/// ```rust
/// use async_flow::{future, operation, Steps};
///
/// # tokio_test::block_on(async {
/// let steps = Steps::start(operation::spawn(async { Ok(3) }))
///     .then(operation::spawn_then(|x: i32| async move { Ok(x * 2) }));
/// assert_eq!(future::serial(steps).await.unwrap(), Some(6));
/// # });
/// ```
pub async fn serial<S, T>(steps: S) -> Result<Option<T>>
where
    S: IntoSteps<Item = T>,
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    crate::serial(steps, move |result| {
        let _ = tx.send(result);
    });
    settle(rx).await
}

/// Await [`parallel`](crate::parallel).
pub async fn parallel<T>(operations: Vec<Operation<T>>) -> Result<Vec<T>>
where
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    crate::parallel(operations, move |result| {
        let _ = tx.send(result);
    });
    settle(rx).await
}

/// Await [`parallel_map`](crate::parallel_map).
pub async fn parallel_map<V, T>(values: Vec<V>, apply: Apply<V, T>) -> Result<Vec<T>>
where
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    crate::parallel_map(values, apply, move |result| {
        let _ = tx.send(result);
    });
    settle(rx).await
}

/// Await [`map`](crate::map).
pub async fn map<V, T>(values: Vec<V>, apply: Apply<V, T>) -> Result<Vec<T>>
where
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    crate::map(values, apply, move |result| {
        let _ = tx.send(result);
    });
    settle(rx).await
}

pub(crate) async fn settle<R>(rx: oneshot::Receiver<Result<R>>) -> Result<R> {
    rx.await.map_err(|_| Error::Abandoned)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{apply, operation, spawn, spawn_apply};
    use crate::Steps;
    use std::time::Duration;

    #[tokio::test]
    async fn test_parallel_future_orders_results() {
        let ops = vec![
            spawn(async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok('x')
            }),
            spawn(async { Ok('y') }),
        ];
        assert_eq!(parallel(ops).await.unwrap(), vec!['x', 'y']);
    }

    #[tokio::test]
    async fn test_dropped_handle_abandons_future() {
        let ops: Vec<Operation<i32>> = vec![
            operation(|done| done.succeed(1)),
            operation(|done| drop(done)),
        ];
        assert!(matches!(parallel(ops).await, Err(Error::Abandoned)));
    }

    #[tokio::test]
    async fn test_map_future_forwards_failure() {
        let f = spawn_apply(|x: i32| async move {
            if x == 2 {
                Err(Error::Validation(format!("bad value {x}")))
            } else {
                Ok(x)
            }
        });
        let err = map(vec![1, 2, 3], f).await.unwrap_err();
        assert_eq!(err.to_string(), "Validation error: bad value 2");
    }

    #[tokio::test]
    async fn test_empty_inputs() {
        assert_eq!(serial(Steps::<u8>::empty()).await.unwrap(), None);
        assert!(parallel(Vec::<Operation<u8>>::new()).await.unwrap().is_empty());
        let f = apply(|x: u8, done| done.succeed(x));
        assert!(parallel_map(Vec::new(), f).await.unwrap().is_empty());
    }
}
