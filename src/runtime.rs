//! Shared Runtime

use std::future::Future;

use once_cell::sync::Lazy;
use tokio::runtime::{Builder, Runtime};

use crate::error::Result;
use crate::tools::batch::{bounded_map, Outcome};

/// Global multi-thread runtime reused across the crate.
static RUNTIME: Lazy<Runtime> = Lazy::new(|| {
    Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build global runtime")
});

/// Run a future to completion on the shared runtime.
///
/// Panics if called from inside an async context.
pub fn block_on<F>(future: F) -> F::Output
where
    F: Future,
{
    RUNTIME.block_on(future)
}

/// Blocking form of [`bounded_map`] for synchronous callers.
pub fn bounded_map_blocking<T, U, E, F, Fut>(
    inputs: Vec<T>,
    transform: F,
    limit: usize,
) -> Result<Vec<Outcome<U, E>>>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = std::result::Result<U, E>>,
{
    block_on(bounded_map(inputs, transform, limit))
}
