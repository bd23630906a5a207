//! Race orchestrator: spawns the workers and hands back the delivery channels.

use crate::error::{LaunchError, RaceError};
use crate::race::config::RaceConfig;
use crate::race::context::{ExecutionContext, RaceContext, WorkerContext};
use crate::race::outcome::{RaceStats, RaceStatus};
use crossbeam_channel::{select, Receiver};
use log::{debug, warn};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A running race.
///
/// Holds the result and error receivers plus the worker thread handles.
/// Dropping it detaches the workers: any that never poll
/// [`ExecutionContext::ended`] keep running after the race has concluded.
pub struct Race<T, E>
where
    E: std::error::Error + 'static,
{
    results: Receiver<T>,
    errors: Receiver<RaceError<E>>,
    context: Arc<RaceContext<T, E>>,
    handles: Vec<JoinHandle<()>>,
}

/// Run `task` on `workers` threads until one of them reports a candidate
/// accepted by `verify`, or a task fails.
///
/// Returns as soon as the workers are spawned. Each worker is called with its
/// index in `0..workers` and a handle to the shared race state. `verify` is
/// invoked concurrently and may see the same or later candidates after a
/// winner was found, so it must be pure.
pub fn run<T, E, F, V>(task: F, verify: V, workers: usize) -> Result<Race<T, E>, LaunchError>
where
    T: Send + 'static,
    E: std::error::Error + Send + 'static,
    F: Fn(usize, &dyn ExecutionContext<T>) -> Result<(), E> + Send + Sync + 'static,
    V: Fn(&T) -> bool + Send + Sync + 'static,
{
    run_with_config(&RaceConfig::new(workers), task, verify)
}

/// Like [`run`], with thread naming and sizing taken from `config`.
pub fn run_with_config<T, E, F, V>(
    config: &RaceConfig,
    task: F,
    verify: V,
) -> Result<Race<T, E>, LaunchError>
where
    T: Send + 'static,
    E: std::error::Error + Send + 'static,
    F: Fn(usize, &dyn ExecutionContext<T>) -> Result<(), E> + Send + Sync + 'static,
    V: Fn(&T) -> bool + Send + Sync + 'static,
{
    let workers = config.workers;
    if workers == 0 {
        return Err(LaunchError::NoWorkers);
    }

    let (context, results, errors) = RaceContext::new(verify, workers);
    let task = Arc::new(task);
    debug!("launching race with {} workers", workers);

    let mut handles = Vec::with_capacity(workers);
    for worker in 0..workers {
        let mut builder = thread::Builder::new().name(config.thread_name_for(worker));
        if let Some(size) = config.stack_size {
            builder = builder.stack_size(size);
        }

        let task = Arc::clone(&task);
        let ctx = Arc::clone(&context);
        match builder.spawn(move || run_worker(worker, task.as_ref(), &ctx)) {
            Ok(handle) => handles.push(handle),
            Err(source) => {
                warn!("failed to spawn worker {}: {}", worker, source);
                // Stop the workers that did start.
                context.halt();
                return Err(LaunchError::Spawn { worker, source });
            }
        }
    }

    Ok(Race {
        results,
        errors,
        context,
        handles,
    })
}

/// Body of one worker thread.
fn run_worker<T, E, F>(worker: usize, task: &F, race: &RaceContext<T, E>)
where
    T: Send + 'static,
    E: std::error::Error + Send + 'static,
    F: Fn(usize, &dyn ExecutionContext<T>) -> Result<(), E>,
{
    debug!("worker {} started", worker);
    let ctx = WorkerContext { worker, race };

    // Panics are confined to the worker; they end the race like an error would.
    match panic::catch_unwind(AssertUnwindSafe(|| task(worker, &ctx))) {
        Ok(outcome) => race.check_error(worker, outcome),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!("worker {} panicked: {}", worker, message);
            race.fail(RaceError::WorkerPanicked { worker, message });
        }
    }

    race.worker_exited(worker);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl<T, E> Race<T, E>
where
    T: Send + 'static,
    E: std::error::Error + Send + 'static,
{
    /// Channel that receives the winning candidate.
    pub fn results(&self) -> &Receiver<T> {
        &self.results
    }

    /// Channel that receives the race-ending failure.
    pub fn errors(&self) -> &Receiver<RaceError<E>> {
        &self.errors
    }

    /// Detach the workers and keep only the two delivery channels.
    pub fn into_channels(self) -> (Receiver<T>, Receiver<RaceError<E>>) {
        (self.results, self.errors)
    }

    /// Number of workers launched.
    pub fn workers(&self) -> usize {
        self.handles.len()
    }

    pub fn ended(&self) -> bool {
        self.context.is_ended()
    }

    pub fn status(&self) -> RaceStatus {
        self.context.status()
    }

    /// Index of the worker that produced the winning candidate.
    pub fn winner(&self) -> Option<usize> {
        self.context.winner()
    }

    pub fn stats(&self) -> RaceStats {
        self.context.stats()
    }

    /// Block until the race delivers its outcome.
    ///
    /// Each race delivers exactly one outcome, so a second call after a value
    /// was received blocks forever.
    pub fn wait(&self) -> Result<T, RaceError<E>> {
        select! {
            recv(self.results) -> msg => msg.map_err(|_| RaceError::Disconnected),
            recv(self.errors) -> msg => match msg {
                Ok(err) => Err(err),
                Err(_) => Err(RaceError::Disconnected),
            },
        }
    }

    /// Like [`wait`](Race::wait), giving up with [`RaceError::Timeout`] after
    /// `timeout`. The workers are not stopped on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<T, RaceError<E>> {
        select! {
            recv(self.results) -> msg => msg.map_err(|_| RaceError::Disconnected),
            recv(self.errors) -> msg => match msg {
                Ok(err) => Err(err),
                Err(_) => Err(RaceError::Disconnected),
            },
            default(timeout) => Err(RaceError::Timeout(timeout)),
        }
    }

    /// Wait for every worker thread to return and report the final counters.
    ///
    /// Only returns once all tasks do, so tasks must poll `ended()`.
    pub fn join(self) -> RaceStats {
        for handle in self.handles {
            // Panics were already caught inside the worker.
            let _ = handle.join();
        }
        self.context.stats()
    }
}
