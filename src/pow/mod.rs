//! Proof-of-work nonce search on top of the race executor.
//!
//! Each worker hashes `data || nonce || timestamp` with SHA-256 over its own
//! slice of the nonce space. The first hash with at least `bits` leading zero
//! bits wins.

pub mod search;
pub mod target;

pub use search::{verifier, NonceSearch, SearchError, Solution};
pub use target::{hash_attempt, leading_zero_bits, Target};

use crate::error::{LaunchError, RaceError};
use crate::race::{run_with_config, ExecutionContext, RaceConfig, RaceStats};
use log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PowError {
    #[error("difficulty must be between 1 and 255 bits, got {0}")]
    InvalidDifficulty(u32),
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error(transparent)]
    Race(#[from] RaceError<SearchError>),
}

/// Configuration for a proof-of-work search.
#[derive(Debug, Clone)]
pub struct PowConfig {
    /// Required leading zero bits
    pub bits: u32,
    /// Nonces scanned across all workers before giving up
    pub nonce_limit: u64,
    /// Seed for the starting nonce (None = random start)
    pub seed: Option<u64>,
    /// Wall-clock budget for the whole search
    pub timeout: Option<Duration>,
    /// Worker thread settings
    pub race: RaceConfig,
}

impl Default for PowConfig {
    fn default() -> Self {
        Self {
            bits: 20,
            nonce_limit: 1_000_000_000_000,
            seed: None,
            timeout: None,
            race: RaceConfig::default().with_thread_name("pow-worker"),
        }
    }
}

impl PowConfig {
    pub fn with_bits(mut self, bits: u32) -> Self {
        self.bits = bits;
        self
    }

    pub fn with_nonce_limit(mut self, limit: u64) -> Self {
        self.nonce_limit = limit;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.race = self.race.with_workers(workers);
        self
    }

    pub fn with_seed_option(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_timeout_option(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// First nonce of the scan.
    pub fn base_nonce(&self) -> u64 {
        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        rng.random()
    }
}

/// A found solution plus the race counters at the time every worker stopped.
#[derive(Debug, Clone)]
pub struct PowReport {
    pub solution: Solution,
    pub stats: RaceStats,
}

/// Search for a nonce whose attempt hash meets `config.bits`.
///
/// Blocks until a worker finds one, a worker fails (including the deadline
/// derived from `config.timeout`), or every worker exhausts its slice.
pub fn solve(data: &[u8], config: &PowConfig) -> Result<PowReport, PowError> {
    let target = Target::from_bits(config.bits)?;
    let base = config.base_nonce();
    let deadline = config.timeout.map(|t| Instant::now() + t);
    info!(
        "searching for {} leading zero bits with {} workers from nonce {}",
        target.bits(),
        config.race.workers,
        base
    );

    let search = Arc::new(
        NonceSearch::new(data, config.race.workers, base, config.nonce_limit)
            .with_deadline(deadline),
    );
    let race = run_with_config(
        &config.race,
        move |worker, ctx: &dyn ExecutionContext<Solution>| search.search(worker, ctx),
        verifier(target, data),
    )?;

    let outcome = race.wait();
    let stats = race.join();
    let solution = outcome?;
    info!("found {}", solution);

    Ok(PowReport { solution, stats })
}
