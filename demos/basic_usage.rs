//! Basic worker pool usage example
//!
//! Demonstrates pool creation, feeding with backpressure, fail-fast error
//! reporting, and statistics tracking.
//!
//! Run with: RUST_LOG=debug cargo run --example basic_usage

use rust_worker_pool::prelude::*;
use std::thread;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
#[error("record {0} is malformed")]
struct Malformed(u32);

fn main() -> Result<()> {
    env_logger::init();

    println!("=== Rust Worker Pool - Basic Usage Example ===\n");

    // Pool with 4 workers and room for 8 queued jobs
    let config = WorkerPoolConfig::new(4)
        .with_queue_capacity(8)
        .with_thread_name_prefix("example");
    let pool = WorkerPool::with_config(config, |record: u32| -> std::result::Result<(), BoxError> {
        println!(
            "  Record {} processed on {}",
            record,
            thread::current().name().unwrap_or("?")
        );
        thread::sleep(Duration::from_millis(20));
        Ok(())
    })?;

    println!(
        "1. Starting worker pool with {} workers (queue capacity {})",
        pool.num_workers(),
        pool.queue_capacity()
    );
    pool.start();

    println!("\n2. Feeding 20 records:");
    for record in 0..20 {
        pool.feed(record);
    }

    println!("\n3. Stopping and waiting for the queue to drain...");
    pool.stop_and_wait()?;

    let stats = pool.stats();
    println!("\n4. Pool statistics:");
    println!("   State: {}", stats.state);
    println!("   Jobs submitted: {}", stats.jobs_submitted);
    println!("   Jobs processed: {}", stats.jobs_processed);
    println!("   Jobs dropped: {}", stats.jobs_dropped);

    println!("\n5. Per-worker statistics:");
    for (i, stat) in pool.worker_stats().iter().enumerate() {
        println!(
            "   Worker {}: {} processed, {} failed, avg time: {:.2}μs",
            i,
            stat.jobs_processed,
            stat.jobs_failed,
            stat.average_processing_time_us()
        );
    }

    println!("\n6. Fail-fast pool:");
    let failing = WorkerPool::new(2, |record: u32| {
        if record == 5 {
            Err(Malformed(record))
        } else {
            Ok(())
        }
    })?;
    failing.start();
    for record in 0..100 {
        failing.feed(record);
    }
    match failing.stop_and_wait() {
        Ok(()) => println!("   Unexpected success"),
        Err(e) => println!("   Stopped with first error: {}", e),
    }
    println!("   Jobs dropped after failure: {}", failing.stats().jobs_dropped);

    println!("\n7. Panicking job:");
    let panicking = WorkerPool::new(1, |_: u32| -> std::result::Result<(), BoxError> {
        panic!("corrupt input");
    })?;
    panicking.start();
    panicking.feed(0);
    if let Err(e) = panicking.stop_and_wait() {
        println!("   {}", e);
    }

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
