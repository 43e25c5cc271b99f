//! Concurrency tests for `SingleSlot`.
//!
//! These run on multi-threaded runtimes and plain OS threads so that the
//! completion path and the deadline timer genuinely race.

use core_async::runtime::Builder;
use core_async::time::{sleep, Duration};
use core_runtime::error::TimeoutError;
use core_signal::single::{Outcome, SingleSlot};
use std::sync::{mpsc, Arc, Barrier};
use std::thread;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

#[core_async::test(worker_threads = 4)]
async fn test_completion_racing_deadline_settles_once() {
    init_tracing();

    for round in 0..200u32 {
        let slot = SingleSlot::<u32>::new(round, Duration::from_millis(1)).unwrap();
        let feedback = slot.feedback().unwrap();

        let responder = slot.clone();
        let completer = core_async::spawn(async move {
            if round % 2 == 0 {
                sleep(Duration::from_millis(1)).await;
            }
            responder.complete(round)
        });

        let delivered = feedback.await;
        let won = completer.await.unwrap();

        match delivered {
            Ok(value) => {
                assert!(won, "value observed but completion reported a loss");
                assert_eq!(value, round);
                assert_eq!(slot.outcome(), Some(Outcome::Delivered));
            }
            Err(timeout) => {
                assert!(!won, "timeout observed but completion reported a win");
                assert_eq!(timeout, TimeoutError::new(Duration::from_millis(1)));
                assert_eq!(slot.outcome(), Some(Outcome::TimedOut));
            }
        }
    }
}

#[test]
fn test_concurrent_completers_only_one_wins() {
    let rt = Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();

    for _ in 0..50 {
        let slot = SingleSlot::<(), usize>::with_handle(rt.handle(), (), Duration::from_secs(5))
            .unwrap();
        let feedback = slot.feedback().unwrap();
        let barrier = Arc::new(Barrier::new(8));

        let completers: Vec<_> = (0..8)
            .map(|i| {
                let slot = slot.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    (i, slot.complete(i))
                })
            })
            .collect();

        let winners: Vec<usize> = completers
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|(_, won)| *won)
            .map(|(i, _)| i)
            .collect();

        assert_eq!(winners.len(), 1);
        assert_eq!(feedback.blocking_recv(), Ok(winners[0]));
    }
}

#[test]
fn test_plain_thread_producer_and_consumer() {
    let rt = Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();

    let slot = SingleSlot::<String, usize>::with_handle(
        rt.handle(),
        "measure me".to_string(),
        Duration::from_secs(5),
    )
    .unwrap();
    let feedback = slot.feedback().unwrap();

    let producer = {
        let slot = slot.clone();
        thread::spawn(move || {
            thread::sleep(std::time::Duration::from_millis(10));
            slot.complete(slot.payload().len())
        })
    };

    let consumer = thread::spawn(move || feedback.blocking_recv());

    assert!(producer.join().unwrap());
    assert_eq!(consumer.join().unwrap(), Ok(10));
}

#[test]
fn test_plain_thread_consumer_times_out() {
    let rt = Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();

    let slot =
        SingleSlot::<u8>::with_handle(rt.handle(), 0, Duration::from_millis(40)).unwrap();
    let feedback = slot.feedback().unwrap();
    let start = std::time::Instant::now();

    let outcome = feedback.blocking_recv();
    let elapsed = start.elapsed();

    assert!(outcome.is_err());
    assert!(elapsed >= Duration::from_millis(40));
    assert!(elapsed < Duration::from_secs(2));
    assert!(!slot.complete(1));
}

#[test]
fn test_runtime_shutdown_times_out_live_slot() {
    let rt = Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let slot = SingleSlot::<u8>::with_handle(rt.handle(), 0, Duration::from_secs(60)).unwrap();
    let feedback = slot.feedback().unwrap();

    // The responder still holds the slot, but its deadline runtime is gone
    drop(rt);

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || tx.send(feedback.blocking_recv()));
    let delivered = rx.recv_timeout(Duration::from_secs(1)).unwrap();

    assert_eq!(delivered, Err(TimeoutError::new(Duration::from_secs(60))));
    assert_eq!(slot.outcome(), Some(Outcome::TimedOut));
    assert!(!slot.complete(1));
}

#[test]
fn test_runtime_shutdown_with_every_handle_dropped() {
    let rt = Builder::new_current_thread().enable_all().build().unwrap();
    let slot = SingleSlot::<u8>::with_handle(rt.handle(), 0, Duration::from_secs(60)).unwrap();
    let feedback = slot.feedback().unwrap();

    drop(slot);
    drop(rt);

    assert_eq!(
        feedback.blocking_recv(),
        Err(TimeoutError::new(Duration::from_secs(60)))
    );
}

#[test]
fn test_slot_on_shut_down_runtime_times_out_at_once() {
    let rt = Builder::new_current_thread().enable_all().build().unwrap();
    let handle = rt.handle().clone();
    drop(rt);

    let slot = SingleSlot::<u8>::with_handle(&handle, 0, Duration::from_secs(60)).unwrap();
    let mut feedback = slot.feedback().unwrap();

    assert_eq!(
        feedback.try_recv(),
        Some(Err(TimeoutError::new(Duration::from_secs(60))))
    );
    assert_eq!(slot.outcome(), Some(Outcome::TimedOut));
}
