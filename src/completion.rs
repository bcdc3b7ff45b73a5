//! Single-use completion handles.
//!
//! Every operation launched by a runner receives a [`Completion`]. Reporting
//! through it consumes the handle, so an operation can report at most once.

use std::fmt;

use crate::{Error, Result};

type Report<T> = Box<dyn FnOnce(Result<T>) + Send>;

/// A handle an operation uses to report its outcome exactly once.
///
/// Dropping a handle without reporting leaves the owning runner waiting
/// forever; a warning is logged when that happens.
///
/// # Example
///
/// ```rust
/// use async_flow::Completion;
///
/// let done = Completion::new(|result: async_flow::Result<i32>| {
///     assert_eq!(result.unwrap(), 7);
/// });
/// done.succeed(7);
/// ```
pub struct Completion<T> {
    report: Option<Report<T>>,
}

impl<T> Completion<T> {
    /// Create a handle that forwards the reported outcome to `report`.
    pub fn new<F>(report: F) -> Self
    where
        F: FnOnce(Result<T>) + Send + 'static,
    {
        Self {
            report: Some(Box::new(report)),
        }
    }

    /// Report the outcome of the operation.
    pub fn complete(mut self, result: Result<T>) {
        if let Some(report) = self.report.take() {
            report(result);
        }
    }

    /// Report success with `value`.
    pub fn succeed(self, value: T) {
        self.complete(Ok(value));
    }

    /// Report failure with `error`.
    pub fn fail(self, error: impl Into<Error>) {
        self.complete(Err(error.into()));
    }
}

impl<T> Drop for Completion<T> {
    fn drop(&mut self) {
        if self.report.is_some() {
            tracing::warn!(
                value_type = std::any::type_name::<T>(),
                "completion handle dropped without reporting; its runner will never finish"
            );
        }
    }
}

impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("reported", &self.report.is_none())
            .finish()
    }
}
