//! Concurrent fan-out with ordered fan-in.
//!
//! Every unit is launched immediately, in input order, with no concurrency
//! cap. Results are collected by position through a shared aggregator, so
//! the final callback sees them in input order regardless of which unit
//! finished first.

use crate::aggregator::{Aggregator, Finish};
use crate::context::RunProbe;
use crate::events::Runner;
use crate::operation::{Apply, Operation};
use crate::{Completion, Result};

/// Launch every operation at once and report all results in input order.
///
/// - Empty `operations`: `callback(Ok(vec![]))` runs before `parallel` returns.
/// - The first reported failure is forwarded to `callback` at once; later
///   reports, successes or failures, are discarded.
/// - Otherwise `callback(Ok(results))` runs once every operation has
///   succeeded, with `results[i]` coming from `operations[i]`.
///
/// Operations that are still running after a failure are not stopped.
///
/// # Example
///
/// ```rust
/// use async_flow::{operation, parallel};
///
/// let ops = vec![
///     operation::operation(|done| done.succeed("a")),
///     operation::operation(|done| done.succeed("b")),
/// ];
/// parallel(ops, |result| assert_eq!(result.unwrap(), vec!["a", "b"]));
/// ```
pub fn parallel<T, F>(operations: Vec<Operation<T>>, callback: F)
where
    T: Send + 'static,
    F: FnOnce(Result<Vec<T>>) + Send + 'static,
{
    run_parallel(
        operations,
        Box::new(callback),
        RunProbe::detached(Runner::Parallel),
    );
}

/// Apply `apply` to every value at once and report all results in input order.
///
/// `apply` is invoked once per value, in input order, before this function
/// returns. Empty input, failure and ordering behave as in [`parallel`].
///
/// # Example
///
/// ```rust
/// use async_flow::{operation, parallel_map};
///
/// let square = operation::apply(|x: i32, done| done.succeed(x * x));
/// parallel_map(vec![1, 2, 3], square, |result| {
///     assert_eq!(result.unwrap(), vec![1, 4, 9]);
/// });
/// ```
pub fn parallel_map<V, T, F>(values: Vec<V>, apply: Apply<V, T>, callback: F)
where
    T: Send + 'static,
    F: FnOnce(Result<Vec<T>>) + Send + 'static,
{
    run_apply(
        values,
        apply,
        Box::new(callback),
        RunProbe::detached(Runner::Parallel),
    );
}

pub(crate) fn run_parallel<T>(operations: Vec<Operation<T>>, finish: Finish<T>, probe: RunProbe)
where
    T: Send + 'static,
{
    launch(operations, finish, probe, |op, done| op(done));
}

pub(crate) fn run_apply<V, T>(
    values: Vec<V>,
    apply: Apply<V, T>,
    finish: Finish<T>,
    probe: RunProbe,
) where
    T: Send + 'static,
{
    launch(values, finish, probe, |value, done| apply(value, done));
}

/// Start one unit per item, each wired to its own slot in a fresh aggregator.
fn launch<I, T, L>(items: Vec<I>, finish: Finish<T>, probe: RunProbe, start: L)
where
    T: Send + 'static,
    L: Fn(I, Completion<T>),
{
    probe.run_started(items.len());
    if items.is_empty() {
        probe.run_finished(true);
        finish(Ok(Vec::new()));
        return;
    }

    let aggregator = Aggregator::new(items.len(), finish, probe.clone());
    for (index, item) in items.into_iter().enumerate() {
        probe.launched();
        start(item, aggregator.completion(index));
    }
}
