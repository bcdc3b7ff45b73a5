//! Concurrent per-element mapping.

use crate::context::RunProbe;
use crate::events::Runner;
use crate::operation::Apply;
use crate::parallel::run_apply;
use crate::Result;

/// Apply one operation to every value concurrently, collecting results in input order.
///
/// Behaves exactly like [`parallel_map`](crate::parallel_map); runs are
/// labelled `map` in traces.
///
/// # Example
///
/// ```rust
/// use async_flow::{future, operation};
///
/// # tokio_test::block_on(async {
/// let lengths = operation::spawn_apply(|s: &'static str| async move { Ok(s.len()) });
/// let result = future::map(vec!["a", "bb", "ccc"], lengths).await.unwrap();
/// assert_eq!(result, vec![1, 2, 3]);
/// # });
/// ```
pub fn map<V, T, F>(values: Vec<V>, apply: Apply<V, T>, callback: F)
where
    T: Send + 'static,
    F: FnOnce(Result<Vec<T>>) + Send + 'static,
{
    run_apply(values, apply, Box::new(callback), RunProbe::detached(Runner::Map));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::apply;
    use crate::{Completion, Error};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn echo_failing_on(failed: i32) -> Apply<i32, i32> {
        apply(move |x: i32, done: Completion<i32>| {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(5 * (4 - x as u64))).await;
                if x == failed {
                    done.fail(Error::Execution("err".into()));
                } else {
                    done.succeed(x);
                }
            });
        })
    }

    #[test]
    fn test_empty_values_skip_function() {
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let f = apply(move |x: i32, done: Completion<i32>| {
            *counter.lock().unwrap() += 1;
            done.succeed(x);
        });
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        map(Vec::new(), f, move |r| {
            *sink.lock().unwrap() = Some(r.unwrap());
        });
        assert_eq!(*seen.lock().unwrap(), Some(vec![]));
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_calls_function_with_each_value() {
        let args = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&args);
        let inner = echo_failing_on(0);
        let f = apply(move |x: i32, done: Completion<i32>| {
            record.lock().unwrap().push(x);
            inner(x, done);
        });
        let (tx, mut rx) = mpsc::unbounded_channel();
        map(vec![1, 2, 3], f, move |r| {
            let _ = tx.send(r);
        });
        assert_eq!(rx.recv().await.unwrap().unwrap(), vec![1, 2, 3]);
        assert_eq!(*args.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_failure_on_one_value() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        map(vec![1, 2, 3], echo_failing_on(2), move |r| {
            let _ = tx.send(r);
        });
        let err = rx.recv().await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Execution(_)));
        assert!(rx.recv().await.is_none());
    }
}
