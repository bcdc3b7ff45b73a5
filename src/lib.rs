//! # async-flow
//!
//! Callback-style control flow for asynchronous operations in Rust.
//!
//! Three runners compose operations that report through a single-use
//! [`Completion`] handle:
//!
//! - [`serial`]: run a [`Steps`] sequence one at a time, feeding each value
//!   into the next operation and stopping at the first failure
//! - [`parallel`]: launch every operation at once and collect the results
//!   in input order, or report the first failure
//! - [`parallel_map`] / [`map`]: apply one operation to every value at once,
//!   collecting results in input order
//!
//! Every runner invokes its final callback exactly once. Empty inputs call
//! back before the runner returns.
//!
//! ## Core Concepts
//!
//! - **Completion**: single-use handle an operation reports success or failure through
//! - **Operation / Then / Apply**: the operation shapes the runners accept
//! - **Flow**: named runner handle recording metrics and trace events
//! - **FlowContext**: shared metrics and structured trace storage
//! - **future**: awaitable versions of the runners
//! - **step**: async steps converted into operations
//!
//! ## Example: Fan-out With Ordered Results
//!
//! ```rust
//! use async_flow::{future, operation, Steps};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let slow = operation::spawn(async {
//!     tokio::time::sleep(Duration::from_millis(20)).await;
//!     Ok(1)
//! });
//! let fast = operation::spawn(async { Ok(2) });
//!
//! // Results follow input order, not completion order.
//! assert_eq!(future::parallel(vec![slow, fast]).await.unwrap(), vec![1, 2]);
//!
//! let steps = Steps::start(|done| done.succeed(5))
//!     .then(operation::spawn_then(|x: i32| async move { Ok(x * 2) }));
//! assert_eq!(future::serial(steps).await.unwrap(), Some(10));
//! # });
//! ```

mod aggregator;
pub mod completion;
pub mod context;
pub mod error;
pub mod events;
pub mod future;
mod map;
pub mod metrics;
pub mod operation;
mod parallel;
mod serial;
pub mod step;
pub mod workflow;

pub use completion::Completion;
pub use context::FlowContext;
pub use error::{Error, Result};
pub use events::{FlowEvent, Runner, TraceEntry};
pub use metrics::FlowMetrics;
pub use workflow::Flow;

// Re-export runners
pub use map::map;
pub use operation::{Apply, Operation, Then};
pub use parallel::{parallel, parallel_map};
pub use serial::{serial, Chain, IntoSteps, Steps};
