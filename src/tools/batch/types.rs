use serde::{Deserialize, Serialize};

/// What one task produced: the transform's value or its captured failure.
///
/// Serialises as `{"data": ...}` or `{"error": ...}`.
///
/// # Examples
/// ```
/// use boundmap::tools::batch::Outcome;
///
/// let ok: Outcome<i32, String> = Outcome::from(Ok(2));
/// assert_eq!(ok.success(), Some(&2));
///
/// let failed: Outcome<i32, String> = Outcome::from(Err("boom".to_string()));
/// assert!(failed.is_failure());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome<U, E> {
    #[serde(rename = "data")]
    Success(U),
    #[serde(rename = "error")]
    Failure(E),
}

impl<U, E> Outcome<U, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    pub fn success(&self) -> Option<&U> {
        match self {
            Outcome::Success(u) => Some(u),
            Outcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&E> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<U, E> {
        match self {
            Outcome::Success(u) => Ok(u),
            Outcome::Failure(e) => Err(e),
        }
    }

    pub fn map_failure<F, E2>(self, f: F) -> Outcome<U, E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            Outcome::Success(u) => Outcome::Success(u),
            Outcome::Failure(e) => Outcome::Failure(f(e)),
        }
    }
}

impl<U, E> From<Result<U, E>> for Outcome<U, E> {
    fn from(r: Result<U, E>) -> Self {
        match r {
            Ok(u) => Outcome::Success(u),
            Err(e) => Outcome::Failure(e),
        }
    }
}

/// One unit of work. The index rides along with the future and comes back
/// with the outcome, so completion never has to look the task up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task<T> {
    pub index: usize,
    pub input: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Queued,
    InFlight,
    Done,
}
