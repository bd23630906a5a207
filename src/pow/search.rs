//! Nonce search task run by each race worker.

use crate::pow::target::{hash_attempt, Target};
use crate::race::ExecutionContext;
use log::debug;
use std::sync::Arc;
use std::time::{Instant, SystemTime, SystemTimeError, UNIX_EPOCH};
use thiserror::Error;

/// A hashed attempt. The winning one is delivered as the race result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub nonce: u64,
    pub timestamp: u64,
    pub hash: [u8; 32],
}

impl Solution {
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "nonce {} at {}: {}",
            self.nonce,
            self.timestamp,
            self.hash_hex()
        )
    }
}

/// Failure of a single nonce search worker.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("system clock is before the unix epoch")]
    Clock(#[from] SystemTimeError),
    #[error("worker {worker} hit the search deadline after {attempts} attempts")]
    DeadlineExceeded { worker: usize, attempts: u64 },
}

/// Partitioned scan over `base + k` for `k` in `0..limit`.
///
/// Worker `i` of `n` takes every `k` with `k % n == i`, so no two workers try
/// the same nonce.
#[derive(Debug, Clone)]
pub struct NonceSearch {
    data: Arc<[u8]>,
    workers: usize,
    base: u64,
    limit: u64,
    deadline: Option<Instant>,
}

impl NonceSearch {
    pub fn new(data: &[u8], workers: usize, base: u64, limit: u64) -> Self {
        Self {
            data: Arc::from(data),
            workers: workers.max(1),
            base,
            limit,
            deadline: None,
        }
    }

    /// Make every worker fail once `deadline` passes.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Nonces worker `worker` will try, in order.
    pub fn nonces(&self, worker: usize) -> impl Iterator<Item = u64> {
        let base = self.base;
        (worker as u64..self.limit)
            .step_by(self.workers)
            .map(move |k| base.wrapping_add(k))
    }

    /// Hash nonces until the race ends, the slice is exhausted, or the
    /// deadline passes.
    pub fn search(
        &self,
        worker: usize,
        ctx: &dyn ExecutionContext<Solution>,
    ) -> Result<(), SearchError> {
        let mut attempts = 0u64;
        for nonce in self.nonces(worker) {
            if ctx.ended() {
                break;
            }
            if self.deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(SearchError::DeadlineExceeded { worker, attempts });
            }

            let timestamp = unix_timestamp()?;
            let hash = hash_attempt(&self.data, nonce, timestamp);
            ctx.end(Solution {
                nonce,
                timestamp,
                hash,
            });
            attempts += 1;
        }
        debug!("worker {} stopped after {} attempts", worker, attempts);
        Ok(())
    }
}

/// Verification predicate for a race over `data`: the hash must be the real
/// hash of the attempt and must meet `target`.
pub fn verifier(
    target: Target,
    data: &[u8],
) -> impl Fn(&Solution) -> bool + Send + Sync + 'static {
    let data: Arc<[u8]> = Arc::from(data);
    move |solution: &Solution| {
        target.is_met_by(&solution.hash)
            && hash_attempt(&data, solution.nonce, solution.timestamp) == solution.hash
    }
}

fn unix_timestamp() -> Result<u64, SystemTimeError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}
