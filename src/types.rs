use serde::{Deserialize, Serialize};

use crate::tools::batch::Outcome;

/// Environment variable that overrides [`BatchOptions::limit`].
pub const LIMIT_ENV: &str = "BOUNDMAP_LIMIT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Maximum number of transforms outstanding at once.
    pub limit: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { limit: 4 }
    }
}

impl BatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Defaults, with `BOUNDMAP_LIMIT` applied when it parses as a number.
    /// A value that doesn't parse is ignored with a warning.
    pub fn from_env() -> Self {
        let opts = Self::default();
        match std::env::var(LIMIT_ENV) {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(limit) => opts.with_limit(limit),
                Err(_) => {
                    tracing::warn!(value = %raw, "ignoring non-numeric {LIMIT_ENV}");
                    opts
                }
            },
            Err(_) => opts,
        }
    }
}

/// Counters collected by the scheduler over one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub limit: usize,
    pub peak_in_flight: usize,
    pub elapsed_ms: u64,
}

/// Outcomes of a batch in input order, plus its stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRun<U, E> {
    pub outcomes: Vec<Outcome<U, E>>,
    pub stats: BatchStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}
impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
