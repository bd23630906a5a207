//! Error types for races and their launch

use std::time::Duration;
use thiserror::Error;

/// Terminal failure of a race, as delivered on the error channel.
#[derive(Debug, Error)]
pub enum RaceError<E>
where
    E: std::error::Error + 'static,
{
    /// A worker's task returned an error. The first one ends the race.
    #[error("worker {worker} failed: {source}")]
    Task {
        worker: usize,
        #[source]
        source: E,
    },
    /// A worker's task panicked.
    #[error("worker {worker} panicked: {message}")]
    WorkerPanicked { worker: usize, message: String },
    /// Every worker returned without producing a verified candidate.
    #[error("all {workers} workers finished without a verified candidate")]
    Exhausted { workers: usize },
    /// No outcome was delivered within the caller's deadline.
    #[error("no outcome within {0:?}")]
    Timeout(Duration),
    /// Both delivery channels were disconnected before an outcome arrived.
    #[error("race delivery channels disconnected")]
    Disconnected,
}

impl<E> RaceError<E>
where
    E: std::error::Error + 'static,
{
    /// The error value returned by the task, if this failure came from one.
    pub fn task_error(&self) -> Option<&E> {
        match self {
            RaceError::Task { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Consume the failure and return the task's own error, if any.
    pub fn into_task_error(self) -> Option<E> {
        match self {
            RaceError::Task { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Index of the worker responsible for this failure.
    pub fn worker(&self) -> Option<usize> {
        match self {
            RaceError::Task { worker, .. } | RaceError::WorkerPanicked { worker, .. } => {
                Some(*worker)
            }
            _ => None,
        }
    }
}

/// Failure to start a race.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("a race needs at least one worker")]
    NoWorkers,
    #[error("failed to spawn worker {worker}: {source}")]
    Spawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error, PartialEq)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn test_task_error_accessors() {
        let err: RaceError<Boom> = RaceError::Task {
            worker: 2,
            source: Boom,
        };
        assert_eq!(err.task_error(), Some(&Boom));
        assert_eq!(err.worker(), Some(2));
        assert_eq!(err.to_string(), "worker 2 failed: boom");
        assert_eq!(err.into_task_error(), Some(Boom));
    }

    #[test]
    fn test_non_task_errors_have_no_source() {
        let err: RaceError<Boom> = RaceError::Exhausted { workers: 3 };
        assert!(err.task_error().is_none());
        assert!(err.worker().is_none());

        let err: RaceError<Boom> = RaceError::WorkerPanicked {
            worker: 1,
            message: "oops".to_string(),
        };
        assert_eq!(err.worker(), Some(1));
        assert!(err.to_string().contains("oops"));
    }
}
