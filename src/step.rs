//! Async steps and their conversion into callback-style operations.
//!
//! A [`Step`] is an async unit of work with typed input and output. The
//! runners drive callback-style operations, so this module bridges the two:
//! each conversion spawns the step on the current tokio runtime and reports
//! its result through the runner's [`Completion`](crate::Completion).

use async_trait::async_trait;
use futures::FutureExt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::operation::{spawn_reporting, Apply, Operation, Then};
use crate::{Completion, Result};

/// An async unit of work with typed input and output.
///
/// # Example
///
/// ```rust
/// use async_flow::step::{LambdaStep, Step};
///
/// # tokio_test::block_on(async {
/// let double = LambdaStep::new(|x: i32| async move { Ok::<i32, async_flow::Error>(x * 2) });
/// assert_eq!(double.run(4).await.unwrap(), 8);
/// # });
/// ```
#[async_trait]
pub trait Step: Send + Sync {
    /// The input type for this step.
    type Input: Send;
    /// The output type produced by this step.
    type Output: Send;

    /// Execute this step with the provided input.
    async fn run(&self, input: Self::Input) -> Result<Self::Output>;

    /// Returns a human-readable name for this step. Defaults to the type name.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A step constructed from a closure returning a future.
pub struct LambdaStep<I, O, F> {
    /// The underlying closure.
    pub f: F,
    _phantom: PhantomData<fn(I) -> O>,
}

impl<I, O, F, Fut> LambdaStep<I, O, F>
where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    I: Send + 'static,
    O: Send + 'static,
    Fut: Future<Output = Result<O>> + Send + 'static,
{
    /// Create a new `LambdaStep` from the given closure.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<F, I, O, Fut> Step for LambdaStep<I, O, F>
where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    I: Send + 'static,
    O: Send + 'static,
    Fut: Future<Output = Result<O>> + Send + 'static,
{
    type Input = I;
    type Output = O;

    async fn run(&self, input: I) -> Result<O> {
        (self.f)(input).await
    }
}

/// Use `step` as the shared function of [`parallel_map`](crate::parallel_map)
/// or [`map`](crate::map).
///
/// # Example
///
/// ```rust
/// use async_flow::{future, step::{self, LambdaStep}};
///
/// # tokio_test::block_on(async {
/// let inc = LambdaStep::new(|x: i32| async move { Ok::<i32, async_flow::Error>(x + 1) });
/// let out = future::map(vec![1, 2], step::into_apply(inc)).await.unwrap();
/// assert_eq!(out, vec![2, 3]);
/// # });
/// ```
pub fn into_apply<S>(step: S) -> Apply<S::Input, S::Output>
where
    S: Step + 'static,
    S::Input: 'static,
    S::Output: 'static,
{
    let step = Arc::new(step);
    Arc::new(move |input: S::Input, done: Completion<S::Output>| {
        let step = Arc::clone(&step);
        spawn_reporting(async move { step.run(input).await }.boxed(), done);
    })
}

/// Run `step` once on a fixed `input`, as an operation for [`parallel`](crate::parallel)
/// or the start of a [`Steps`](crate::Steps) chain.
pub fn into_operation<S>(step: S, input: S::Input) -> Operation<S::Output>
where
    S: Step + 'static,
    S::Input: 'static,
    S::Output: 'static,
{
    Box::new(move |done: Completion<S::Output>| {
        spawn_reporting(async move { step.run(input).await }.boxed(), done);
    })
}

/// Use `step` as a link in a [`Steps`](crate::Steps) chain.
pub fn into_then<S, T>(step: S) -> Then<T>
where
    S: Step<Input = T, Output = T> + 'static,
    T: Send + 'static,
{
    Box::new(move |input: T, done: Completion<T>| {
        spawn_reporting(async move { step.run(input).await }.boxed(), done);
    })
}
