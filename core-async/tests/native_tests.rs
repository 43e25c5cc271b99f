//! Integration tests for core-async.
//!
//! These tests verify the Tokio-backed abstraction and the deadline timer.

use core_async::{sync, task, time, timer::DeadlineTimer};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[core_async::test]
async fn test_task_spawn() {
    let handle = task::spawn(async { 42 });
    let result = handle.await.unwrap();
    assert_eq!(result, 42);
}

#[test]
fn test_try_spawn_without_runtime() {
    assert!(task::try_spawn(async {}).is_err());
}

#[core_async::test]
async fn test_try_spawn_inside_runtime() {
    let handle = task::try_spawn(async { "spawned" }).unwrap();
    assert_eq!(handle.await.unwrap(), "spawned");
}

#[core_async::test]
async fn test_sleep() {
    let start = time::Instant::now();
    time::sleep(time::Duration::from_millis(50)).await;
    let elapsed = start.elapsed();
    assert!(elapsed >= time::Duration::from_millis(50));
    assert!(elapsed < time::Duration::from_millis(250)); // Allow some slack
}

#[core_async::test]
async fn test_timeout_failure() {
    let result = time::timeout(time::Duration::from_millis(10), async {
        time::sleep(time::Duration::from_millis(100)).await;
        42
    })
    .await;

    assert!(result.is_err());
}

#[core_async::test]
async fn test_oneshot_channel() {
    let (tx, rx) = sync::oneshot::channel();

    task::spawn(async move {
        time::sleep(time::Duration::from_millis(10)).await;
        tx.send(42).unwrap();
    });

    let result = rx.await.unwrap();
    assert_eq!(result, 42);
}

#[test]
fn test_oneshot_blocking_recv_from_plain_thread() {
    let (tx, rx) = sync::oneshot::channel();
    let producer = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(10));
        tx.send("reply").unwrap();
    });

    assert_eq!(rx.blocking_recv().unwrap(), "reply");
    producer.join().unwrap();
}

#[core_async::test(worker_threads = 2)]
async fn test_multi_thread_flavor_runs_tasks_in_parallel() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut handles = vec![];

    for _ in 0..8 {
        let hits = hits.clone();
        handles.push(task::spawn(async move {
            hits.fetch_add(1, Ordering::SeqCst);
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(hits.load(Ordering::SeqCst), 8);
}

#[core_async::test]
async fn test_current_handle_inside_runtime() {
    assert!(core_async::runtime::current_handle().is_some());
}

#[test]
fn test_current_handle_outside_runtime() {
    assert!(core_async::runtime::current_handle().is_none());
}

#[core_async::test(worker_threads = 2)]
async fn test_timer_cancel_races_fire() {
    // Whatever the interleaving, each callback runs at most once.
    for _ in 0..50 {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let timer = DeadlineTimer::schedule(time::Duration::from_micros(50), move || {
            assert!(!flag.swap(true, Ordering::SeqCst));
        })
        .unwrap();
        task::yield_now().await;
        timer.cancel();
    }
    time::sleep(time::Duration::from_millis(10)).await;
}
