//! Batch Tools
//!
//! Run an async, fallible transform over a list with at most `limit`
//! transforms outstanding. Results come back in input order, one
//! [`Outcome`] per input; a failing item never fails the batch.
//!
//! There is no cancellation or per-task timeout: once admitted, a task runs
//! to completion. Callers that need a deadline can wrap their transform in
//! `tokio::time::timeout` and map the elapsed error into their failure type.

mod scheduler;

pub mod types;

pub use scheduler::Scheduler;
pub use types::*;

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::stream::{FuturesUnordered, StreamExt};
use futures_util::FutureExt;
use tokio::task::{self, JoinSet};

use crate::error::{LegacyError, Result, TaskError};
use crate::types::BatchRun;

/// Map `transform` over `inputs` with bounded concurrency.
///
/// The first `min(limit, inputs.len())` items start at once; each completion
/// records its outcome in its own slot and admits the next queued item.
/// Transforms run concurrently on the calling task.
///
/// Fails only when `limit` is zero.
///
/// # Examples
/// ```
/// use boundmap::tools::batch::{bounded_map, Outcome};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let out = bounded_map(vec![1, 2, 3], |x| async move {
///     if x == 2 { Err("two") } else { Ok(x * 10) }
/// }, 2).await.unwrap();
///
/// assert_eq!(out, vec![Outcome::Success(10), Outcome::Failure("two"), Outcome::Success(30)]);
/// # }
/// ```
pub async fn bounded_map<T, U, E, F, Fut>(
    inputs: Vec<T>,
    transform: F,
    limit: usize,
) -> Result<Vec<Outcome<U, E>>>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = std::result::Result<U, E>>,
{
    bounded_map_with_stats(inputs, transform, limit)
        .await
        .map(|run| run.outcomes)
}

/// [`bounded_map`], also returning the [`crate::BatchStats`] of the run.
pub async fn bounded_map_with_stats<T, U, E, F, Fut>(
    inputs: Vec<T>,
    transform: F,
    limit: usize,
) -> Result<BatchRun<U, E>>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = std::result::Result<U, E>>,
{
    let mut sched = Scheduler::new(inputs, limit)?;
    tracing::info!(total = sched.queued(), limit, "batch started");

    let run_task = |task: Task<T>| {
        let fut = transform(task.input);
        let index = task.index;
        async move { (index, Outcome::from(fut.await)) }
    };

    let mut running = FuturesUnordered::new();
    while let Some(task) = sched.admit_next() {
        running.push(run_task(task));
    }

    // Woken by completions only.
    while let Some((index, outcome)) = running.next().await {
        sched.record_outcome(index, outcome);
        if let Some(task) = sched.admit_next() {
            running.push(run_task(task));
        }
    }

    finish(sched)
}

/// Like [`bounded_map`], but every transform runs as its own tokio task, so
/// CPU-heavy work can use all runtime workers.
///
/// A panicking transform is captured as [`TaskError::Panicked`] in its slot,
/// whether it panics while building its future, while running, or while the
/// future is dropped. A task that dies any other way is [`TaskError::Aborted`].
/// Must be called from within a tokio runtime.
pub async fn bounded_map_spawned<T, U, E, F, Fut>(
    inputs: Vec<T>,
    transform: F,
    limit: usize,
) -> Result<Vec<Outcome<U, TaskError<E>>>>
where
    T: Send + 'static,
    U: Send + 'static,
    E: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = std::result::Result<U, E>> + Send + 'static,
{
    let mut sched: Scheduler<T, U, TaskError<E>> = Scheduler::new(inputs, limit)?;
    tracing::info!(total = sched.queued(), limit, "spawned batch started");

    let mut set = JoinSet::new();
    // Join ids map back to indices when a task dies without returning one.
    let mut ids: HashMap<task::Id, usize> = HashMap::new();

    // Admit while slots are free. A transform that panics before yielding a
    // future is recorded on the spot, which frees its slot again.
    let fill = |sched: &mut Scheduler<T, U, TaskError<E>>,
                set: &mut JoinSet<(usize, Outcome<U, TaskError<E>>)>,
                ids: &mut HashMap<task::Id, usize>| {
        while let Some(task) = sched.admit_next() {
            let index = task.index;
            let input = task.input;
            let fut = match std::panic::catch_unwind(AssertUnwindSafe(|| transform(input))) {
                Ok(fut) => AssertUnwindSafe(fut).catch_unwind(),
                Err(payload) => {
                    sched.record_outcome(index, Outcome::Failure(TaskError::panicked(payload)));
                    continue;
                }
            };
            let handle = set.spawn(async move {
                let outcome = match fut.await {
                    Ok(res) => Outcome::from(res.map_err(TaskError::Failed)),
                    Err(payload) => Outcome::Failure(TaskError::panicked(payload)),
                };
                (index, outcome)
            });
            ids.insert(handle.id(), index);
        }
    };

    fill(&mut sched, &mut set, &mut ids);

    while let Some(joined) = set.join_next_with_id().await {
        let (index, outcome) = match joined {
            Ok((id, done)) => {
                ids.remove(&id);
                done
            }
            Err(e) => match ids.remove(&e.id()) {
                Some(index) => {
                    tracing::debug!(index, error = %e, "spawned task did not return");
                    (index, Outcome::Failure(TaskError::from(e)))
                }
                None => {
                    tracing::error!(error = %e, "join error for an untracked task");
                    continue;
                }
            },
        };
        sched.record_outcome(index, outcome);
        fill(&mut sched, &mut set, &mut ids);
    }

    finish(sched).map(|run| run.outcomes)
}

/// The all-or-nothing contract: every success in order, or the error of the
/// lowest failing index. The whole batch still runs to completion first.
pub async fn try_bounded_map<T, U, E, F, Fut>(
    inputs: Vec<T>,
    transform: F,
    limit: usize,
) -> std::result::Result<Vec<U>, LegacyError<E>>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = std::result::Result<U, E>>,
{
    let outcomes = bounded_map(inputs, transform, limit).await?;
    outcomes
        .into_iter()
        .enumerate()
        .map(|(index, outcome)| {
            outcome
                .into_result()
                .map_err(|error| LegacyError::Task { index, error })
        })
        .collect()
}

/// Batch execute async operations that cannot fail, keeping input order.
///
/// A `concurrency` of zero is treated as one.
pub async fn batch<T, F, Fut, R>(items: Vec<T>, concurrency: usize, operation: F) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    let operation = &operation;
    let outcomes = bounded_map(
        items,
        |item| async move { Ok::<R, std::convert::Infallible>(operation(item).await) },
        concurrency.max(1),
    )
    .await
    .unwrap_or_default();

    outcomes
        .into_iter()
        .filter_map(|outcome| outcome.into_result().ok())
        .collect()
}

/// Split outcomes into indexed successes and indexed failures.
pub fn partition_outcomes<U, E>(outcomes: Vec<Outcome<U, E>>) -> (Vec<(usize, U)>, Vec<(usize, E)>) {
    let mut ok = Vec::new();
    let mut failed = Vec::new();
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Outcome::Success(u) => ok.push((index, u)),
            Outcome::Failure(e) => failed.push((index, e)),
        }
    }
    (ok, failed)
}

fn finish<T, U, E>(sched: Scheduler<T, U, E>) -> Result<BatchRun<U, E>> {
    if !sched.is_complete() {
        tracing::error!(in_flight = sched.in_flight(), queued = sched.queued(), "driver stopped early");
    }
    let run = sched.finish()?;
    if run.stats.failed > 0 {
        tracing::warn!(failed = run.stats.failed, total = run.stats.total, "batch finished with failures");
    }
    tracing::info!(
        total = run.stats.total,
        peak_in_flight = run.stats.peak_in_flight,
        elapsed_ms = run.stats.elapsed_ms,
        "batch finished"
    );
    Ok(run)
}
