//! First-valid-answer-wins execution across parallel workers.
//!
//! A race runs the same task on N worker threads. Each worker loops, producing
//! candidates and handing them to the shared [`ExecutionContext`]. The first
//! candidate accepted by the caller's verification predicate, or the first
//! task error, ends the race and is delivered on one of two single-slot
//! channels.
//!
//! # Architecture
//!
//! - A **coordinator** ([`run`]) that spawns the workers and returns at once
//! - **Shared state** (the race context) that latches
//!   `Running -> Won | Failed` under a mutex and owns the delivery channels
//! - **Workers** that cooperatively poll `ended()`; nothing preempts them
//!
//! # Example
//!
//! ```no_run
//! use race_executor::race::{run, ExecutionContext};
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("gave up")]
//! struct GaveUp;
//!
//! let race = run(
//!     |worker, ctx: &dyn ExecutionContext<u64>| {
//!         let mut n = worker as u64;
//!         while !ctx.ended() {
//!             ctx.end(n);
//!             n += 4;
//!         }
//!         Ok::<(), GaveUp>(())
//!     },
//!     |n: &u64| n % 1_000 == 999,
//!     4,
//! )
//! .unwrap();
//!
//! let winner = race.wait().unwrap();
//! assert_eq!(winner % 1_000, 999);
//! ```

pub mod config;
pub mod context;
pub mod coordinator;
pub mod outcome;

pub use config::RaceConfig;
pub use context::ExecutionContext;
pub use coordinator::{run, run_with_config, Race};
pub use outcome::{RaceStats, RaceStatus};
