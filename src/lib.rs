//! Parallel "race" executor for brute-force search.
//!
//! Run one task on many threads and keep the first candidate that passes a
//! verification predicate. The [`pow`] module uses it for proof-of-work nonce
//! search.

pub mod error;
pub mod pow;
pub mod race;

pub use error::{LaunchError, RaceError};
pub use race::{run, run_with_config, ExecutionContext, Race, RaceConfig, RaceStats, RaceStatus};
