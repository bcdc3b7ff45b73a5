//! Sequential chaining of operations.
//!
//! [`serial`] runs a [`Steps`] sequence one operation at a time. The first
//! operation receives only a completion handle; each later one also receives
//! the value its predecessor reported. The first failure stops the sequence.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::context::RunProbe;
use crate::events::Runner;
use crate::operation::{Operation, Then};
use crate::{Completion, Result};

pub(crate) type SerialFinish<T> = Box<dyn FnOnce(Result<Option<T>>) + Send>;

/// An ordered sequence of operations for [`serial`].
///
/// Either empty, or a starting operation followed by any number of chained
/// operations. Build a non-empty one with [`Steps::start`].
pub struct Steps<T> {
    chain: Option<Chain<T>>,
}

/// A non-empty sequence: a starting operation and its followers.
///
/// Returned by [`Steps::start`]; converts into [`Steps`].
pub struct Chain<T> {
    start: Operation<T>,
    rest: Vec<Then<T>>,
}

impl<T> Steps<T> {
    /// A sequence with no operations.
    pub fn empty() -> Self {
        Self { chain: None }
    }

    /// Begin a sequence with an operation that takes no input.
    pub fn start<F>(op: F) -> Chain<T>
    where
        F: FnOnce(Completion<T>) + Send + 'static,
    {
        Chain {
            start: Box::new(op),
            rest: Vec::new(),
        }
    }

    /// Number of operations in the sequence.
    pub fn len(&self) -> usize {
        self.chain.as_ref().map_or(0, Chain::len)
    }

    /// Whether the sequence has no operations.
    pub fn is_empty(&self) -> bool {
        self.chain.is_none()
    }
}

impl<T> Default for Steps<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Chain<T> {
    /// Append an operation that receives the previous operation's value.
    pub fn then<F>(mut self, op: F) -> Self
    where
        F: FnOnce(T, Completion<T>) + Send + 'static,
    {
        self.rest.push(Box::new(op));
        self
    }

    /// Number of operations in the chain, including the starting one.
    pub fn len(&self) -> usize {
        1 + self.rest.len()
    }
}

/// Appends chained operations in iteration order.
///
/// # Example
///
/// ```rust
/// use async_flow::{operation, serial, Steps};
///
/// let mut chain = Steps::start(|done| done.succeed(1));
/// chain.extend((0..3).map(|_| operation::then(|x: i32, done| done.succeed(x * 2))));
/// assert_eq!(chain.len(), 4);
///
/// serial(chain, |result| assert_eq!(result.unwrap(), Some(8)));
/// ```
impl<T> Extend<Then<T>> for Chain<T> {
    fn extend<I: IntoIterator<Item = Then<T>>>(&mut self, iter: I) {
        self.rest.extend(iter);
    }
}

impl<T> From<Chain<T>> for Steps<T> {
    fn from(chain: Chain<T>) -> Self {
        Self { chain: Some(chain) }
    }
}

/// Anything [`serial`] accepts: a [`Steps`] or a [`Chain`].
pub trait IntoSteps {
    /// The value type threaded through the sequence.
    type Item;

    /// Convert into a [`Steps`] sequence.
    fn into_steps(self) -> Steps<Self::Item>;
}

impl<T> IntoSteps for Steps<T> {
    type Item = T;

    fn into_steps(self) -> Steps<T> {
        self
    }
}

impl<T> IntoSteps for Chain<T> {
    type Item = T;

    fn into_steps(self) -> Steps<T> {
        self.into()
    }
}

/// Run `steps` one after another and report the last value to `callback`.
///
/// - Empty `steps`: `callback(Ok(None))` runs before `serial` returns.
/// - Each operation starts only after its predecessor reported success.
/// - The first failure is forwarded unchanged and no later operation runs.
/// - Otherwise `callback(Ok(Some(last)))` receives the final value.
///
/// Operations may complete synchronously, inside their own invocation; the
/// next one is then started from a loop, so chain length does not grow the
/// stack.
///
/// # Example
///
/// ```rust
/// use async_flow::{serial, Steps};
///
/// let steps = Steps::start(|done| done.succeed(2))
///     .then(|x, done| done.succeed(x * 10))
///     .then(|x, done| done.succeed(x + 1));
///
/// serial(steps, |result| assert_eq!(result.unwrap(), Some(21)));
/// ```
pub fn serial<S, T, F>(steps: S, callback: F)
where
    S: IntoSteps<Item = T>,
    T: Send + 'static,
    F: FnOnce(Result<Option<T>>) + Send + 'static,
{
    run_serial(
        steps.into_steps(),
        Box::new(callback),
        RunProbe::detached(Runner::Serial),
    );
}

pub(crate) fn run_serial<T>(steps: Steps<T>, finish: SerialFinish<T>, probe: RunProbe)
where
    T: Send + 'static,
{
    probe.run_started(steps.len());
    let Some(Chain { start, rest }) = steps.chain else {
        probe.run_finished(true);
        finish(Ok(None));
        return;
    };

    let run = Arc::new(SerialRun {
        state: Mutex::new(SerialState {
            rest: rest.into_iter(),
            index: 0,
            finish: Some(finish),
            parked: None,
            driving: true,
        }),
        probe,
    });
    run.probe.launched();
    start(run.completion());
    run.drive();
}

struct SerialState<T> {
    rest: std::vec::IntoIter<Then<T>>,
    /// Position of the operation currently running.
    index: usize,
    finish: Option<SerialFinish<T>>,
    /// Outcome reported while a driver was still on the stack.
    parked: Option<Result<T>>,
    /// Whether some call frame is looping in `drive`.
    driving: bool,
}

struct SerialRun<T> {
    state: Mutex<SerialState<T>>,
    probe: RunProbe,
}

impl<T: Send + 'static> SerialRun<T> {
    fn lock(&self) -> MutexGuard<'_, SerialState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn completion(self: &Arc<Self>) -> Completion<T> {
        let this = Arc::clone(self);
        Completion::new(move |result| this.report(result))
    }

    /// Park `result`, and drive the run unless a frame below is already doing so.
    fn report(self: &Arc<Self>, result: Result<T>) {
        {
            let mut state = self.lock();
            state.parked = Some(result);
            if state.driving {
                return;
            }
            state.driving = true;
        }
        self.drive();
    }

    /// Advance through parked outcomes in a loop, so synchronous steps never nest.
    fn drive(self: &Arc<Self>) {
        loop {
            let mut state = self.lock();
            let Some(result) = state.parked.take() else {
                state.driving = false;
                return;
            };
            self.probe.completed();

            let value = match result {
                Ok(value) => value,
                Err(error) => {
                    let index = state.index;
                    let finish = state.finish.take();
                    drop(state);
                    self.probe.failed(index, &error);
                    self.probe.run_finished(false);
                    if let Some(finish) = finish {
                        finish(Err(error));
                    }
                    return;
                }
            };

            match state.rest.next() {
                Some(next) => {
                    state.index += 1;
                    drop(state);
                    self.probe.launched();
                    next(value, self.completion());
                }
                None => {
                    let finish = state.finish.take();
                    drop(state);
                    self.probe.run_finished(true);
                    if let Some(finish) = finish {
                        finish(Ok(Some(value)));
                    }
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::then;
    use crate::Error;
    use std::time::Duration;
    use tokio::sync::oneshot;

    type Log = Arc<Mutex<Vec<String>>>;

    fn delayed<T: Send + 'static>(ms: u64, result: Result<T>, done: Completion<T>) {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            done.complete(result);
        });
    }

    #[test]
    fn test_empty_steps_call_back_synchronously() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        serial(Steps::<i32>::empty(), move |r| {
            *sink.lock().unwrap() = Some(r.unwrap());
        });
        assert_eq!(*seen.lock().unwrap(), Some(None));
    }

    #[test]
    fn test_synchronous_steps_thread_values() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let steps = Steps::start(|done| done.succeed("a".to_string()))
            .then(|s, done| done.succeed(s + "b"))
            .then(|s, done| done.succeed(s + "c"));
        serial(steps, move |r| {
            *sink.lock().unwrap() = Some(r.unwrap());
        });
        assert_eq!(*seen.lock().unwrap(), Some(Some("abc".to_string())));
    }

    #[tokio::test]
    async fn test_second_step_runs_after_first_completes() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let (l1, l1_done, l2) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
        let (tx, rx) = oneshot::channel();

        let steps = Steps::start(move |done: Completion<i32>| {
            l1.lock().unwrap().push("s1 start".into());
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                l1_done.lock().unwrap().push("s1 done".into());
                done.succeed(1);
            });
        })
        .then(move |x, done| {
            l2.lock().unwrap().push(format!("s2 got {x}"));
            delayed(5, Ok(x), done);
        });

        serial(steps, move |r| {
            let _ = tx.send(r);
        });

        assert_eq!(rx.await.unwrap().unwrap(), Some(1));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["s1 start", "s1 done", "s2 got 1"]
        );
    }

    #[tokio::test]
    async fn test_failure_stops_later_steps() {
        let called = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&called);
        let (tx, rx) = oneshot::channel();

        let steps = Steps::start(|done| delayed(10, Err(Error::Execution("err".into())), done))
            .then(move |x: i32, done| {
                *flag.lock().unwrap() = true;
                done.succeed(x);
            });

        serial(steps, move |r| {
            let _ = tx.send(r);
        });

        let err = rx.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Execution(ref m) if m == "err"));
        assert!(!*called.lock().unwrap());
    }

    #[tokio::test]
    async fn test_failure_in_middle_step_is_forwarded() {
        let (tx, rx) = oneshot::channel();
        let steps = Steps::start(|done| delayed(5, Ok(1), done))
            .then(|_, done| delayed(5, Err(Error::Validation("step 2".into())), done))
            .then(|_: i32, _done| panic!("third step must not run"));

        serial(steps, move |r| {
            let _ = tx.send(r);
        });

        let err = rx.await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "Validation error: step 2");
    }

    #[test]
    fn test_long_synchronous_chain_does_not_nest() {
        const STEPS: usize = 100_000;
        let mut chain = Steps::start(|done: Completion<usize>| done.succeed(0));
        chain.extend((0..STEPS).map(|_| then(|x: usize, done| done.succeed(x + 1))));

        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        serial(chain, move |r| {
            *sink.lock().unwrap() = Some(r.unwrap());
        });
        assert_eq!(*seen.lock().unwrap(), Some(Some(STEPS)));
    }

    #[test]
    fn test_synchronous_failure_mid_chain_stops() {
        let ran = Arc::new(Mutex::new(Vec::new()));
        let (r1, r3) = (Arc::clone(&ran), Arc::clone(&ran));
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);

        let steps = Steps::start(|done: Completion<i32>| done.succeed(1))
            .then(move |x, done| {
                r1.lock().unwrap().push(x);
                done.fail("sync failure");
            })
            .then(move |x, done| {
                r3.lock().unwrap().push(x);
                done.succeed(x);
            });
        serial(steps, move |r| {
            *sink.lock().unwrap() = Some(r.unwrap_err().to_string());
        });

        assert_eq!(seen.lock().unwrap().as_deref(), Some("sync failure"));
        assert_eq!(*ran.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_mixed_sync_and_async_steps() {
        let (tx, rx) = oneshot::channel();
        let steps = Steps::start(|done| done.succeed(1))
            .then(|x, done| delayed(5, Ok(x + 1), done))
            .then(|x, done| done.succeed(x * 10))
            .then(|x, done| delayed(1, Ok(x + 3), done));
        serial(steps, move |r| {
            let _ = tx.send(r);
        });
        assert_eq!(rx.await.unwrap().unwrap(), Some(23));
    }

    #[test]
    fn test_len_counts_start() {
        let chain = Steps::start(|done: Completion<u8>| done.succeed(0)).then(|x, d| d.succeed(x));
        assert_eq!(chain.len(), 2);
        let steps: Steps<u8> = chain.into();
        assert_eq!(steps.len(), 2);
        assert!(Steps::<u8>::empty().is_empty());
    }
}
