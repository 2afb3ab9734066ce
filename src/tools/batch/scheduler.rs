//! Batch bookkeeping.
//!
//! The scheduler owns the queue, the in-flight count and the results buffer.
//! Every state change goes through [`Scheduler::admit_next`] or
//! [`Scheduler::record_outcome`], and the driver loop is its only owner, so
//! mutations are serialised no matter where the transforms themselves run.

use std::collections::VecDeque;

use tokio::time::Instant;

use super::types::{Outcome, Task, TaskState};
use crate::error::{BatchError, Result};
use crate::types::{BatchRun, BatchStats};

pub struct Scheduler<T, U, E> {
    limit: usize,
    queue: VecDeque<Task<T>>,
    states: Vec<TaskState>,
    results: Vec<Option<Outcome<U, E>>>,
    in_flight: usize,
    peak_in_flight: usize,
    remaining: usize,
    succeeded: usize,
    failed: usize,
    started: Instant,
}

impl<T, U, E> Scheduler<T, U, E> {
    /// Queue every input in index order. Fails fast on a zero limit, which
    /// would otherwise never admit anything.
    pub fn new(inputs: Vec<T>, limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(BatchError::InvalidLimit { limit });
        }

        let len = inputs.len();
        let queue: VecDeque<Task<T>> = inputs
            .into_iter()
            .enumerate()
            .map(|(index, input)| Task { index, input })
            .collect();

        Ok(Self {
            limit,
            queue,
            states: vec![TaskState::Queued; len],
            results: std::iter::repeat_with(|| None).take(len).collect(),
            in_flight: 0,
            peak_in_flight: 0,
            remaining: len,
            succeeded: 0,
            failed: 0,
            started: Instant::now(),
        })
    }

    /// Hand out the lowest queued task if a slot is free.
    pub fn admit_next(&mut self) -> Option<Task<T>> {
        if self.in_flight >= self.limit {
            return None;
        }
        let task = self.queue.pop_front()?;
        self.states[task.index] = TaskState::InFlight;
        self.in_flight += 1;
        self.peak_in_flight = self.peak_in_flight.max(self.in_flight);
        tracing::debug!(index = task.index, in_flight = self.in_flight, "admitted");
        Some(task)
    }

    /// Write the outcome of an in-flight task into its slot and free the slot.
    ///
    /// Returns `false` (and leaves everything untouched) if `index` is not in
    /// flight, so a recorded outcome is never overwritten.
    pub fn record_outcome(&mut self, index: usize, outcome: Outcome<U, E>) -> bool {
        match self.states.get(index) {
            Some(TaskState::InFlight) => {}
            state => {
                tracing::error!(index, ?state, "outcome for a task that is not in flight");
                return false;
            }
        }

        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
            tracing::debug!(index, "task failed, outcome captured");
        }

        self.results[index] = Some(outcome);
        self.states[index] = TaskState::Done;
        self.in_flight -= 1;
        self.remaining -= 1;
        tracing::debug!(index, remaining = self.remaining, "recorded");
        true
    }

    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn state_of(&self, index: usize) -> Option<TaskState> {
        self.states.get(index).copied()
    }

    pub fn stats(&self) -> BatchStats {
        BatchStats {
            total: self.results.len(),
            succeeded: self.succeeded,
            failed: self.failed,
            limit: self.limit,
            peak_in_flight: self.peak_in_flight,
            elapsed_ms: self.started.elapsed().as_millis() as u64,
        }
    }

    /// Deliver the results buffer. Consumes the scheduler, so delivery
    /// happens once.
    pub fn finish(self) -> Result<BatchRun<U, E>> {
        let stats = self.stats();
        let missing = self.results.iter().filter(|r| r.is_none()).count();
        if missing > 0 {
            return Err(BatchError::Incomplete { missing });
        }

        let outcomes = self.results.into_iter().flatten().collect();
        Ok(BatchRun { outcomes, stats })
    }
}
