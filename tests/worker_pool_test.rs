//! Lifecycle, failure and concurrency tests for the worker pool

use parking_lot::Mutex;
use rust_worker_pool::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("job {0} failed")]
struct JobFailed(usize);

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn counting_pool(workers: usize) -> (WorkerPool<usize>, Arc<AtomicUsize>) {
    init_logging();
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let pool = WorkerPool::new(workers, move |_job: usize| -> std::result::Result<(), BoxError> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .expect("Failed to create pool");
    (pool, count)
}

#[test]
fn test_simple_processing() {
    let (pool, count) = counting_pool(5);
    pool.start();

    for i in 0..100 {
        pool.feed(i);
    }

    pool.stop_and_wait().expect("Unexpected error");
    assert_eq!(count.load(Ordering::SeqCst), 100);
}

#[test]
fn test_error_handling() {
    init_logging();
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let pool = WorkerPool::new(5, move |job: usize| {
        if job == 50 {
            return Err(JobFailed(job));
        }
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .expect("Failed to create pool");

    pool.start();
    for i in 0..100 {
        pool.feed(i);
    }

    let err = pool.stop_and_wait().expect_err("Expected job 50 to fail");
    assert!(err.is_processing());
    assert_eq!(err.downcast_ref::<JobFailed>(), Some(&JobFailed(50)));
    assert_eq!(err.to_string(), "job 50 failed");

    // Every job enqueued ahead of job 50 was processed; jobs after it may not be
    let c = count.load(Ordering::SeqCst);
    assert!((50..=99).contains(&c), "Unexpected count {}", c);

    let stats = pool.stats();
    assert_eq!(stats.jobs_failed, 1);
    assert_eq!(stats.jobs_submitted + stats.jobs_dropped, 100);
}

#[test]
fn test_concurrent_feed() {
    let (pool, count) = counting_pool(5);
    let pool = Arc::new(pool);
    pool.start();

    let total_jobs = 100;
    let num_feeders = 10;
    let feeders: Vec<_> = (0..num_feeders)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for i in 0..total_jobs / num_feeders {
                    pool.feed(i);
                }
            })
        })
        .collect();

    for feeder in feeders {
        feeder.join().expect("Feeder panicked");
    }

    pool.stop_and_wait().expect("Unexpected error");
    assert_eq!(count.load(Ordering::SeqCst), total_jobs);
    assert_eq!(pool.stats().jobs_submitted, total_jobs as u64);
}

#[test]
fn test_feed_after_stop() {
    let (pool, count) = counting_pool(5);
    pool.start();
    pool.feed(1);
    pool.stop_and_wait().expect("Unexpected error");

    // Feeding after stop_and_wait has no effect
    pool.feed(2);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(pool.queued_jobs(), 0);
    assert_eq!(pool.stats().jobs_dropped, 1);
}

#[test]
fn test_start_multiple_times() {
    let (pool, count) = counting_pool(5);
    pool.start();
    pool.start();

    pool.feed(1);
    pool.stop_and_wait().expect("Unexpected error");

    assert_eq!(count.load(Ordering::SeqCst), 1);
    let processed: u64 = pool.worker_stats().iter().map(|s| s.jobs_processed).sum();
    assert_eq!(processed, 1);
}

#[test]
fn test_concurrent_start_spawns_once() {
    init_logging();
    let threads = Arc::new(Mutex::new(HashSet::new()));
    let seen = Arc::clone(&threads);
    let pool = Arc::new(
        WorkerPool::with_config(
            WorkerPoolConfig::new(3).with_thread_name_prefix("starter"),
            move |_: usize| -> std::result::Result<(), BoxError> {
                let current = thread::current();
                let name = current.name().unwrap_or_default().to_string();
                seen.lock().insert((current.id(), name));
                thread::sleep(Duration::from_millis(2));
                Ok(())
            },
        )
        .expect("Failed to create pool"),
    );
    let barrier = Arc::new(Barrier::new(8));

    let starters: Vec<_> = (0..8)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                pool.start();
            })
        })
        .collect();
    for starter in starters {
        starter.join().expect("Starter panicked");
    }

    assert_eq!(pool.state(), PoolState::Started);
    for i in 0..60 {
        pool.feed(i);
    }
    pool.stop_and_wait().expect("Unexpected error");

    // A second spawn round would show up as extra thread ids reusing the names
    let threads = threads.lock();
    assert!(!threads.is_empty());
    assert!(threads.len() <= 3, "too many worker threads: {:?}", *threads);
    for (_, name) in threads.iter() {
        assert!(
            ["starter-0", "starter-1", "starter-2"].contains(&name.as_str()),
            "unexpected worker thread {}",
            name
        );
    }
}

#[test]
fn test_worker_panic_handling() {
    let pool = WorkerPool::new(5, |_job: usize| -> std::result::Result<(), BoxError> {
        panic!("test panic");
    })
    .expect("Failed to create pool");

    pool.start();
    pool.feed(1);

    let err = pool.stop_and_wait().expect_err("Expected panic to surface");
    assert!(err.is_worker_panic());
    assert_eq!(err.to_string(), "worker panic: test panic");
    assert_eq!(pool.stats().jobs_panicked, 1);
}

#[test]
fn test_worker_panic_with_formatted_payload() {
    let pool = WorkerPool::new(2, |job: usize| -> std::result::Result<(), BoxError> {
        panic!("job {} hit a bad record", job);
    })
    .expect("Failed to create pool");

    pool.start();
    pool.feed(7);

    let err = pool.stop_and_wait().expect_err("Expected panic to surface");
    assert_eq!(err.to_string(), "worker panic: job 7 hit a bad record");
}

#[test]
fn test_worker_panic_with_non_string_payload() {
    let pool = WorkerPool::new(1, |job: usize| -> std::result::Result<(), BoxError> {
        std::panic::panic_any(job as i32 * 6);
    })
    .expect("Failed to create pool");

    pool.start();
    pool.feed(7);

    let err = pool.stop_and_wait().expect_err("Expected panic to surface");
    assert_eq!(err.to_string(), "worker panic: 42");
}

#[test]
fn test_stop_without_start() {
    let (pool, _) = counting_pool(5);
    let err = pool.stop_and_wait().expect_err("Expected NotActive");
    assert!(matches!(err, PoolError::NotActive { .. }));
    assert_eq!(pool.state(), PoolState::Created);
}

#[test]
fn test_stop_multiple_times() {
    let (pool, _) = counting_pool(5);
    pool.start();
    pool.feed(1);
    pool.stop_and_wait().expect("Unexpected error");

    // Subsequent calls return the cached outcome
    pool.stop_and_wait().expect("Unexpected error");
    pool.stop_and_wait().expect("Unexpected error");
    assert_eq!(pool.state(), PoolState::Stopped);
}

#[test]
fn test_stop_multiple_times_returns_cached_error() {
    let pool = WorkerPool::new(2, |job: usize| {
        if job == 0 {
            Err(JobFailed(job))
        } else {
            Ok(())
        }
    })
    .expect("Failed to create pool");

    pool.start();
    pool.feed(0);

    let first = pool.stop_and_wait().expect_err("Expected failure");
    let second = pool.stop_and_wait().expect_err("Expected cached failure");
    assert_eq!(first.downcast_ref::<JobFailed>(), Some(&JobFailed(0)));
    assert_eq!(second.downcast_ref::<JobFailed>(), Some(&JobFailed(0)));
}

#[test]
fn test_concurrent_stop_and_wait() {
    let (pool, count) = counting_pool(3);
    let pool = Arc::new(pool);
    pool.start();
    for i in 0..30 {
        pool.feed(i);
    }

    let stoppers: Vec<_> = (0..4)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let result = pool.stop_and_wait();
                // Every caller returns only after all workers were joined
                (result.is_ok(), pool.state())
            })
        })
        .collect();

    for stopper in stoppers {
        let (ok, state) = stopper.join().expect("Stopper panicked");
        assert!(ok);
        assert_eq!(state, PoolState::Stopped);
    }
    assert_eq!(count.load(Ordering::SeqCst), 30);
}

#[test]
fn test_feed_while_processing() {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let pool = WorkerPool::new(2, move |_job: usize| -> std::result::Result<(), BoxError> {
        thread::sleep(Duration::from_millis(10));
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .expect("Failed to create pool");

    pool.start();
    for i in 0..10 {
        pool.feed(i);
    }

    pool.stop_and_wait().expect("Unexpected error");
    assert_eq!(count.load(Ordering::SeqCst), 10);
}

#[test]
fn test_stop_processing_with_active_feed() {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let pool = Arc::new(
        WorkerPool::new(5, move |_job: usize| -> std::result::Result<(), BoxError> {
            thread::sleep(Duration::from_millis(10));
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .expect("Failed to create pool"),
    );

    pool.start();
    let total_jobs = 20;

    let feeder = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || {
            for i in 0..total_jobs {
                pool.feed(i);
            }
        })
    };

    thread::sleep(Duration::from_millis(1));
    pool.stop_and_wait().expect("Unexpected error");

    // The feeder must not stay blocked on a full queue once stop begins
    feeder.join().expect("Feeder panicked");

    let stats = pool.stats();
    let processed = count.load(Ordering::SeqCst);
    assert!(processed <= total_jobs);
    assert_eq!(processed as u64, stats.jobs_submitted);
    assert_eq!(stats.jobs_submitted + stats.jobs_dropped, total_jobs as u64);
}

#[test]
fn test_failure_releases_blocked_producers() {
    let pool = Arc::new(
        WorkerPool::new(1, |job: usize| {
            thread::sleep(Duration::from_millis(5));
            if job == 0 {
                Err(JobFailed(job))
            } else {
                Ok(())
            }
        })
        .expect("Failed to create pool"),
    );
    pool.start();

    // Three producers pushing far more than the single-slot queue holds
    let producers: Vec<_> = (0..3)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for i in 0..50 {
                    pool.feed(i);
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().expect("Producer panicked");
    }

    let err = pool.stop_and_wait().expect_err("Expected failure");
    assert_eq!(err.downcast_ref::<JobFailed>(), Some(&JobFailed(0)));
    assert_eq!(pool.stats().jobs_failed, 1);
}

#[test]
fn test_only_first_error_reported() {
    let barrier = Arc::new(Barrier::new(4));
    let gate = Arc::clone(&barrier);
    let pool = WorkerPool::new(4, move |job: usize| {
        // All four workers fail at roughly the same moment
        gate.wait();
        Err(JobFailed(job))
    })
    .expect("Failed to create pool");

    pool.start();
    for i in 0..4 {
        pool.feed(i);
    }

    let err = pool.stop_and_wait().expect_err("Expected failure");
    let failed = err.downcast_ref::<JobFailed>().expect("Expected JobFailed");
    assert!(failed.0 < 4);

    // The cached error never changes even though other workers failed too
    let again = pool.stop_and_wait().expect_err("Expected cached failure");
    assert_eq!(again.downcast_ref::<JobFailed>(), Some(failed));
}

#[test]
fn test_state_after_failure_without_explicit_stop() {
    let pool = WorkerPool::new(1, |_: usize| Err(JobFailed(0))).expect("Failed to create pool");
    pool.start();
    pool.feed(0);

    // Wait for the worker to fail and shut the pool down on its own;
    // ShuttingDown is only published once the gate is closed
    for _ in 0..100 {
        if pool.state() == PoolState::ShuttingDown {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(pool.state(), PoolState::ShuttingDown);
    assert!(!pool.is_running());

    pool.feed(1);
    assert_eq!(pool.stats().jobs_dropped, 1);

    assert!(pool.stop_and_wait().is_err());
    assert_eq!(pool.state(), PoolState::Stopped);
}

#[test]
fn test_stats_serialize_to_json() {
    let (pool, _) = counting_pool(2);
    pool.start();
    for i in 0..4 {
        pool.feed(i);
    }
    pool.stop_and_wait().expect("Unexpected error");

    let json = serde_json::to_value(pool.stats()).expect("Failed to serialize stats");
    assert_eq!(json["state"], "Stopped");
    assert_eq!(json["jobs_processed"], 4);
    assert_eq!(json["num_workers"], 2);
}
