//! Completion aggregator shared by the concurrent runners.
//!
//! One [`Aggregator`] exists per `parallel`/`map` invocation. It places each
//! result at its original position whatever the arrival order, and latches
//! the final callback so it fires exactly once: either with the first failure
//! or with the full ordered results.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::context::RunProbe;
use crate::{Completion, Result};

pub(crate) type Finish<T> = Box<dyn FnOnce(Result<Vec<T>>) + Send>;

struct Slots<T> {
    values: Vec<Option<T>>,
    filled: usize,
    /// `None` once the run has finished.
    finish: Option<Finish<T>>,
}

enum Outcome<T> {
    Pending,
    Discarded,
    Done(Finish<T>, Result<Vec<T>>),
}

pub(crate) struct Aggregator<T> {
    slots: Mutex<Slots<T>>,
    probe: RunProbe,
}

impl<T: Send + 'static> Aggregator<T> {
    /// Create the shared state for a run over `len` units. `len` must be non-zero.
    pub(crate) fn new(len: usize, finish: Finish<T>, probe: RunProbe) -> Arc<Self> {
        let mut values = Vec::with_capacity(len);
        values.resize_with(len, || None);
        Arc::new(Self {
            slots: Mutex::new(Slots {
                values,
                filled: 0,
                finish: Some(finish),
            }),
            probe,
        })
    }

    /// A completion handle that reports into slot `index`.
    pub(crate) fn completion(self: &Arc<Self>, index: usize) -> Completion<T> {
        let this = Arc::clone(self);
        Completion::new(move |result| this.record(index, result))
    }

    fn lock(&self) -> MutexGuard<'_, Slots<T>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the outcome of unit `index`.
    ///
    /// The final callback runs after the lock is released, so it may start
    /// new runs or report into other aggregators freely.
    pub(crate) fn record(&self, index: usize, result: Result<T>) {
        let outcome = {
            let mut slots = self.lock();
            if slots.finish.is_none() {
                Outcome::Discarded
            } else {
                match result {
                    Err(error) => {
                        self.probe.completed();
                        self.probe.failed(index, &error);
                        match slots.finish.take() {
                            Some(finish) => Outcome::Done(finish, Err(error)),
                            None => Outcome::Discarded,
                        }
                    }
                    Ok(value) => self.fill(&mut slots, index, value),
                }
            }
        };

        match outcome {
            Outcome::Pending => {}
            Outcome::Discarded => self.probe.discarded(index),
            Outcome::Done(finish, result) => {
                self.probe.run_finished(result.is_ok());
                finish(result);
            }
        }
    }

    fn fill(&self, slots: &mut Slots<T>, index: usize, value: T) -> Outcome<T> {
        match slots.values.get_mut(index) {
            Some(slot) if slot.is_none() => {
                *slot = Some(value);
                slots.filled += 1;
                self.probe.completed();
            }
            _ => return Outcome::Discarded,
        }

        if slots.filled < slots.values.len() {
            return Outcome::Pending;
        }

        let values: Vec<T> = slots.values.drain(..).flatten().collect();
        match slots.finish.take() {
            Some(finish) => Outcome::Done(finish, Ok(values)),
            None => Outcome::Discarded,
        }
    }
}
