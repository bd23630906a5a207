//! Shared coordination state for the workers of one race.

use crate::error::RaceError;
use crate::race::outcome::{RaceStats, RaceStatus};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, info, trace, warn};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// The view of a race that task code gets.
///
/// Workers poll [`ended`](ExecutionContext::ended) to stop cooperatively and
/// hand every candidate they produce to [`end`](ExecutionContext::end). Nothing
/// preempts a worker, so it may finish one more unit of work after the race is
/// over.
pub trait ExecutionContext<T> {
    /// Report a candidate. It ends the race only if it passes verification
    /// and no other outcome has been recorded yet.
    fn end(&self, candidate: T);

    /// Whether the race has a winner or a failure.
    fn ended(&self) -> bool;
}

/// Verification predicate shared by every worker of a race.
pub(crate) type VerifyFn<T> = dyn Fn(&T) -> bool + Send + Sync;

#[derive(Debug, Default)]
struct Latch {
    status: RaceStatus,
    winner: Option<usize>,
}

/// Lock-guarded race state plus the two single-slot delivery channels.
pub(crate) struct RaceContext<T, E>
where
    E: std::error::Error + 'static,
{
    latch: Mutex<Latch>,
    verify: Box<VerifyFn<T>>,
    results: Sender<T>,
    errors: Sender<RaceError<E>>,
    reported: AtomicU64,
    rejected: AtomicU64,
    active: AtomicUsize,
    workers: usize,
    started: Instant,
}

impl<T, E> RaceContext<T, E>
where
    T: Send + 'static,
    E: std::error::Error + Send + 'static,
{
    /// Create the state for a race run by `workers` workers, along with the
    /// receiving ends of the result and error channels.
    pub(crate) fn new<V>(
        verify: V,
        workers: usize,
    ) -> (Arc<Self>, Receiver<T>, Receiver<RaceError<E>>)
    where
        V: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let (results, results_rx) = bounded(1);
        let (errors, errors_rx) = bounded(1);
        let ctx = Arc::new(Self {
            latch: Mutex::new(Latch::default()),
            verify: Box::new(verify),
            results,
            errors,
            reported: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            active: AtomicUsize::new(workers),
            workers,
            started: Instant::now(),
        });
        (ctx, results_rx, errors_rx)
    }

    // A panicking verifier poisons the mutex; the latch itself stays consistent.
    fn lock(&self) -> MutexGuard<'_, Latch> {
        self.latch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Verify `candidate` and, if it wins, latch `Won` and publish it.
    pub(crate) fn report(&self, worker: Option<usize>, candidate: T) {
        self.reported.fetch_add(1, Ordering::Relaxed);

        let mut latch = self.lock();
        if latch.status.is_terminal() {
            trace!("race already {}, ignoring candidate", latch.status);
            return;
        }
        if !(self.verify)(&candidate) {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            return;
        }

        latch.status = RaceStatus::Won;
        latch.winner = worker;
        match worker {
            Some(w) => info!("worker {} produced a verified candidate", w),
            None => info!("verified candidate reported"),
        }
        deliver(&self.results, candidate, "result");
    }

    pub(crate) fn is_ended(&self) -> bool {
        self.lock().status.is_terminal()
    }

    /// Forward a task's return value. `Ok(())` is a no-op.
    pub(crate) fn check_error(&self, worker: usize, outcome: Result<(), E>) {
        if let Err(source) = outcome {
            warn!("worker {} returned an error: {}", worker, source);
            self.fail(RaceError::Task { worker, source });
        }
    }

    /// Latch `Failed` and publish `err`, unless the race already ended.
    pub(crate) fn fail(&self, err: RaceError<E>) {
        let mut latch = self.lock();
        if latch.status.is_terminal() {
            debug!("race already {}, dropping error: {}", latch.status, err);
            return;
        }
        latch.status = RaceStatus::Failed;
        deliver(&self.errors, err, "error");
    }

    /// Latch `Failed` without publishing anything.
    pub(crate) fn halt(&self) {
        let mut latch = self.lock();
        if !latch.status.is_terminal() {
            latch.status = RaceStatus::Failed;
        }
    }

    /// Record that a worker's task has returned. The last worker out of a
    /// race that is still running ends it as exhausted.
    pub(crate) fn worker_exited(&self, worker: usize) {
        let remaining = self.active.fetch_sub(1, Ordering::AcqRel) - 1;
        debug!("worker {} exited, {} still running", worker, remaining);
        if remaining == 0 {
            self.fail(RaceError::Exhausted {
                workers: self.workers,
            });
        }
    }

    pub(crate) fn status(&self) -> RaceStatus {
        self.lock().status
    }

    pub(crate) fn winner(&self) -> Option<usize> {
        self.lock().winner
    }

    pub(crate) fn stats(&self) -> RaceStats {
        let latch = self.lock();
        RaceStats {
            status: latch.status,
            winner: latch.winner,
            candidates_reported: self.reported.load(Ordering::Relaxed),
            candidates_rejected: self.rejected.load(Ordering::Relaxed),
            active_workers: self.active.load(Ordering::Acquire),
            elapsed: self.started.elapsed(),
        }
    }
}

impl<T, E> ExecutionContext<T> for RaceContext<T, E>
where
    T: Send + 'static,
    E: std::error::Error + Send + 'static,
{
    fn end(&self, candidate: T) {
        self.report(None, candidate);
    }

    fn ended(&self) -> bool {
        self.is_ended()
    }
}

/// Per-worker handle that attributes reported candidates to a worker index.
pub(crate) struct WorkerContext<'a, T, E>
where
    E: std::error::Error + 'static,
{
    pub(crate) worker: usize,
    pub(crate) race: &'a RaceContext<T, E>,
}

impl<T, E> ExecutionContext<T> for WorkerContext<'_, T, E>
where
    T: Send + 'static,
    E: std::error::Error + Send + 'static,
{
    fn end(&self, candidate: T) {
        self.race.report(Some(self.worker), candidate);
    }

    fn ended(&self) -> bool {
        self.race.is_ended()
    }
}

// Never blocks: a full slot or a receiver the caller already dropped turns the
// delivery into a no-op.
fn deliver<M>(tx: &Sender<M>, msg: M, channel: &str) {
    match tx.try_send(msg) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => trace!("{} slot already filled, dropping", channel),
        Err(TrySendError::Disconnected(_)) => {
            trace!("{} receiver dropped, discarding delivery", channel)
        }
    }
}
