//! Request/reply over an in-process "transport".
//!
//! A client registers correlation ids, pushes requests into a queue served
//! by a worker task, and waits on its tickets. The worker answers most
//! requests and ignores every fifth one, which then expires.
//!
//! Run with: `cargo run -p core-signal --example request_reply`

use core_async::sync::Mutex;
use core_async::time::Duration;
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use core_signal::registry::CorrelationRegistry;
use core_signal::single::SingleSlot;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::info;

#[core_async::main(worker_threads = 2)]
async fn main() {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )
    .expect("Failed to initialize logging");

    let registry = CorrelationRegistry::<String>::new();
    let queue: Arc<Mutex<VecDeque<(String, u32)>>> = Arc::new(Mutex::new(VecDeque::new()));

    let mut tickets = Vec::new();
    for n in 0..10u32 {
        let (id, ticket) = registry
            .register_generated(Duration::from_millis(200))
            .expect("runtime is running");
        queue.lock().await.push_back((id.clone(), n));
        tickets.push((n, ticket));
    }

    let worker = {
        let registry = registry.clone();
        let queue = queue.clone();
        core_async::spawn(async move {
            while let Some((id, n)) = queue.lock().await.pop_front() {
                if n % 5 == 4 {
                    continue;
                }
                registry.complete(&id, format!("{n} squared is {}", n * n));
            }
        })
    };

    for (n, ticket) in tickets {
        match registry.wait_value(ticket).await {
            Some(reply) => info!(request = n, %reply, "reply received"),
            None => info!(request = n, "request timed out"),
        }
    }
    worker.await.expect("worker panicked");

    // The same exchange with a single slot instead of an id
    let slot = SingleSlot::<u32, String>::new(12, Duration::from_millis(200))
        .expect("runtime is running");
    let feedback = slot.feedback().expect("first take");
    let responder = slot.clone();
    core_async::spawn(async move {
        let n = *responder.payload();
        responder.complete(format!("{n} doubled is {}", n * 2));
    });

    match feedback.await {
        Ok(reply) => info!(%reply, "slot reply received"),
        Err(err) => info!(%err, "slot timed out"),
    }
}
