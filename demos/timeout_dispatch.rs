//! Deadline-bounded dispatch example
//!
//! Hands requests to a slow worker and shows what happens when the worker
//! cannot keep up: the request comes back to the caller instead of being lost.
//!
//! Run with: cargo run --example timeout_dispatch

use crossbeam_channel::bounded;
use monitor_runtime::prelude::*;
use std::thread;
use std::time::Duration;

#[derive(Debug)]
struct StoreRequest {
    key: String,
    value: u64,
}

fn main() -> Result<()> {
    println!("=== Monitor Runtime - Timeout Dispatch Example ===\n");

    let (logger, _level) = configure_logger(&LoggingConfig::default())?;
    let dispatcher = Dispatcher::new(logger.with_field("component", "storage"));

    let (tx, rx) = bounded::<StoreRequest>(1);

    // A worker that takes longer per request than callers are willing to wait
    let worker = thread::spawn(move || {
        for request in rx.iter() {
            thread::sleep(Duration::from_millis(1500));
            println!("   worker stored {} = {}", request.key, request.value);
        }
    });

    println!("1. Sending five requests with a one second budget:");
    let mut returned = Vec::new();
    for i in 0..5 {
        let request = StoreRequest {
            key: format!("probe-{}", i),
            value: i,
        };
        match dispatcher.send(&tx, request, 1) {
            Ok(()) => println!("   probe-{} delivered", i),
            Err(undelivered) => {
                let request = undelivered.into_inner();
                println!("   {} timed out, kept by caller", request.key);
                returned.push(request);
            }
        }
    }

    println!("\n2. Retrying returned requests without waiting:");
    for request in returned {
        let key = request.key.clone();
        match dispatcher.send(&tx, request, 0) {
            Ok(()) => println!("   {} delivered on retry", key),
            Err(_) => println!("   {} dropped", key),
        }
    }

    drop(tx);
    worker.join().ok();

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
