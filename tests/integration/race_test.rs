use race_executor::{run, ExecutionContext, RaceError, RaceStatus};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("{0}")]
struct TaskError(&'static str);

#[test]
fn test_single_worker_immediate_winner() {
    for workers in 1..=4 {
        let race = run(
            |i, ctx: &dyn ExecutionContext<usize>| {
                if i == 0 {
                    ctx.end(1234);
                }
                while !ctx.ended() {
                    thread::yield_now();
                }
                Ok::<(), TaskError>(())
            },
            |c: &usize| *c == 1234,
            workers,
        )
        .unwrap();

        assert_eq!(race.results().recv().unwrap(), 1234);
        assert!(race.errors().try_recv().is_err());
        assert_eq!(race.winner(), Some(0));
        race.join();
    }
}

#[test]
fn test_task_error_is_delivered_verbatim() {
    for workers in 1..=4 {
        let race = run(
            |_, _: &dyn ExecutionContext<u64>| Err(TaskError("boom")),
            |_: &u64| true,
            workers,
        )
        .unwrap();

        let err = race.errors().recv().unwrap();
        assert_eq!(err.task_error(), Some(&TaskError("boom")));
        assert!(race.results().try_recv().is_err());
        assert_eq!(race.status(), RaceStatus::Failed);
        race.join();
    }
}

#[test]
fn test_always_true_predicate_three_workers() {
    let produced = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&produced);

    let race = run(
        move |i, ctx: &dyn ExecutionContext<usize>| {
            while !ctx.ended() {
                counter.fetch_add(1, Ordering::SeqCst);
                ctx.end(i);
            }
            Ok::<(), TaskError>(())
        },
        |_: &usize| true,
        3,
    )
    .unwrap();

    let winner = race.wait().unwrap();
    assert!(winner < 3);
    assert!(race.ended());
    let stats = race.join();

    // Every worker saw the latch and stopped; at most one extra candidate each.
    assert_eq!(stats.active_workers, 0);
    assert_eq!(stats.winner, Some(winner));
    assert!(produced.load(Ordering::SeqCst) <= 3);
    assert_eq!(stats.candidates_rejected, 0);
}

#[test]
fn test_tenth_candidate_wins() {
    let race = run(
        |_, ctx: &dyn ExecutionContext<u32>| {
            let mut attempt = 1;
            while !ctx.ended() {
                ctx.end(attempt);
                attempt += 1;
            }
            Ok::<(), TaskError>(())
        },
        |c: &u32| *c == 10,
        1,
    )
    .unwrap();

    assert_eq!(race.wait().unwrap(), 10);
    let stats = race.join();
    assert_eq!(stats.candidates_reported, 10);
    assert_eq!(stats.candidates_rejected, 9);
}

#[test]
fn test_ended_is_false_until_an_outcome() {
    let race = run(
        |_, ctx: &dyn ExecutionContext<u64>| {
            for _ in 0..200 {
                if ctx.ended() {
                    break;
                }
                ctx.end(1);
                thread::sleep(Duration::from_millis(1));
            }
            Ok::<(), TaskError>(())
        },
        |_: &u64| false,
        2,
    )
    .unwrap();

    thread::sleep(Duration::from_millis(20));
    assert!(!race.ended());
    assert!(race.results().try_recv().is_err());
    assert!(race.errors().try_recv().is_err());

    // Rejected candidates never end the race; running out of work does.
    match race.wait() {
        Err(RaceError::Exhausted { workers }) => assert_eq!(workers, 2),
        other => panic!("expected exhaustion, got {:?}", other),
    }
    assert!(race.ended());
    assert!(race.ended());
}

#[test]
fn test_late_deliveries_after_outcome_are_discarded() {
    let race = run(
        |_, ctx: &dyn ExecutionContext<u64>| {
            thread::sleep(Duration::from_millis(10));
            ctx.end(5);
            Err(TaskError("late"))
        },
        |_: &u64| true,
        3,
    )
    .unwrap();

    assert_eq!(race.wait().unwrap(), 5);
    let stats = race.join();

    // Errors returned after the win find the race over and are dropped.
    assert_eq!(stats.status, RaceStatus::Won);
    assert_eq!(stats.active_workers, 0);
    assert_eq!(stats.candidates_reported, 3);
}

#[test]
fn test_panicking_verifier_fails_race() {
    let race = run(
        |i, ctx: &dyn ExecutionContext<usize>| {
            while !ctx.ended() {
                ctx.end(i);
                thread::yield_now();
            }
            Ok::<(), TaskError>(())
        },
        |c: &usize| {
            if *c == 0 {
                panic!("bad verify");
            }
            false
        },
        3,
    )
    .unwrap();

    match race.wait() {
        Err(RaceError::WorkerPanicked { worker, message }) => {
            assert_eq!(worker, 0);
            assert!(message.contains("bad verify"));
        }
        other => panic!("expected worker panic, got {:?}", other),
    }
    assert_eq!(race.status(), RaceStatus::Failed);

    // The other workers still see the latch through the poisoned lock.
    let stats = race.join();
    assert_eq!(stats.status, RaceStatus::Failed);
    assert_eq!(stats.active_workers, 0);
}

#[test]
fn test_simultaneous_winners_publish_once() {
    for _ in 0..200 {
        let race = run(
            |i, ctx: &dyn ExecutionContext<usize>| {
                ctx.end(i);
                ctx.end(i);
                Ok::<(), TaskError>(())
            },
            |_: &usize| true,
            16,
        )
        .unwrap();

        let results = race.results().clone();
        let errors = race.errors().clone();
        let winner = race.wait().unwrap();
        let stats = race.join();

        // Every worker has returned; nothing else may have been published.
        assert!(winner < 16);
        assert!(results.try_recv().is_err());
        assert!(errors.try_recv().is_err());
        assert_eq!(stats.winner, Some(winner));
        assert_eq!(stats.status, RaceStatus::Won);
        assert_eq!(stats.candidates_reported, 32);
    }
}

#[test]
fn test_first_outcome_wins_between_error_and_result() {
    let race = run(
        |i, ctx: &dyn ExecutionContext<usize>| {
            if i == 0 {
                return Err(TaskError("early"));
            }
            while !ctx.ended() {
                thread::yield_now();
            }
            ctx.end(i);
            Ok(())
        },
        |_: &usize| true,
        2,
    )
    .unwrap();

    match race.wait() {
        Err(RaceError::Task { worker, source }) => {
            assert_eq!(worker, 0);
            assert_eq!(source, TaskError("early"));
        }
        other => panic!("expected task error, got {:?}", other),
    }
    let stats = race.join();
    assert_eq!(stats.status, RaceStatus::Failed);
    assert!(stats.winner.is_none());
}
