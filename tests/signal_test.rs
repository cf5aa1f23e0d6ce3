//! Integration tests for the subscriber registry and asynchronous fan-out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use workfan::diag::{MemoryLog, NullLog};
use workfan::error::Error;
use workfan::model::{Phase, SubscriberId};
use workfan::pool::WorkerPool;
use workfan::signal::{AsyncDispatcher, AsyncSignal, InvokeSummary, Registry};

fn registry() -> Registry {
    Registry::new(Arc::new(NullLog))
}

fn shared_pool(workers: usize) -> Arc<WorkerPool> {
    Arc::new(WorkerPool::new(workers, Arc::new(NullLog)).expect("failed to start pool"))
}

/// Connect a subscriber that appends `name` to `calls`.
fn recorder(registry: &Registry, calls: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) {
    let calls = Arc::clone(calls);
    registry.connect(move || calls.lock().unwrap().push(name));
}

// ---------------------------------------------------------------------------
// Registry: synchronous path
// ---------------------------------------------------------------------------

#[test]
fn invoke_all_calls_in_registration_order_on_caller_thread() {
    let registry = registry();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let threads = Arc::new(Mutex::new(Vec::new()));

    for name in ["a", "b", "c"] {
        let calls = Arc::clone(&calls);
        let threads = Arc::clone(&threads);
        registry.connect(move || {
            calls.lock().unwrap().push(name);
            threads.lock().unwrap().push(std::thread::current().id());
        });
    }

    let summary = registry.invoke_all();

    assert_eq!(summary, InvokeSummary { invoked: 3, failed: 0 });
    assert_eq!(*calls.lock().unwrap(), ["a", "b", "c"]);
    let caller = std::thread::current().id();
    assert!(threads.lock().unwrap().iter().all(|id| *id == caller));
}

#[test]
fn panicking_subscriber_does_not_stop_the_rest() {
    let log = Arc::new(MemoryLog::new());
    let registry = Registry::new(log.clone());
    let calls = Arc::new(Mutex::new(Vec::new()));

    recorder(&registry, &calls, "a");
    let bad = registry.connect(|| panic!("slot exploded"));
    recorder(&registry, &calls, "c");

    let summary = registry.invoke_all();

    assert_eq!(summary, InvokeSummary { invoked: 3, failed: 1 });
    assert_eq!(*calls.lock().unwrap(), ["a", "c"]);
    let lines = log.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(&format!("subscriber {bad} failed")));
    assert!(lines[0].contains("slot exploded"));
}

#[test]
fn duplicate_registration_is_invoked_twice() {
    let registry = registry();
    let hits = Arc::new(AtomicUsize::new(0));
    let subscriber: workfan::signal::Subscriber = {
        let hits = Arc::clone(&hits);
        Arc::new(move || {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    };

    let first = registry.connect_shared(Arc::clone(&subscriber));
    let second = registry.connect_shared(subscriber);
    assert_ne!(first, second);

    registry.invoke_all();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn disconnect_removes_only_that_registration() {
    let registry = registry();
    let calls = Arc::new(Mutex::new(Vec::new()));

    recorder(&registry, &calls, "a");
    let calls_b = Arc::clone(&calls);
    let b = registry.connect(move || calls_b.lock().unwrap().push("b"));
    recorder(&registry, &calls, "c");

    assert!(registry.disconnect(b));
    assert!(!registry.disconnect(b));
    assert!(!registry.disconnect(SubscriberId(999)));
    assert_eq!(registry.len(), 2);

    registry.invoke_all();
    assert_eq!(*calls.lock().unwrap(), ["a", "c"]);
}

#[test]
fn empty_registry_invokes_nothing() {
    let registry = registry();
    assert!(registry.is_empty());
    assert_eq!(registry.invoke_all(), InvokeSummary::default());
}

// ---------------------------------------------------------------------------
// Dispatcher: asynchronous fan-out
// ---------------------------------------------------------------------------

#[test]
fn fan_out_runs_each_subscriber_once() {
    let pool = shared_pool(3);
    let registry = registry();
    let calls = Arc::new(Mutex::new(Vec::new()));
    for name in ["a", "b", "c"] {
        recorder(&registry, &calls, name);
    }

    let dispatcher = AsyncDispatcher::new(Arc::clone(&pool));
    let ids = dispatcher.dispatch(&registry).unwrap();
    assert_eq!(ids.len(), 3);

    pool.shutdown();
    pool.join();

    let mut calls = calls.lock().unwrap().clone();
    calls.sort_unstable();
    assert_eq!(calls, ["a", "b", "c"]);
}

#[test]
fn fan_out_queues_in_registration_order() {
    let pool = shared_pool(1);
    let registry = registry();
    let calls = Arc::new(Mutex::new(Vec::new()));
    for name in ["a", "b", "c", "d"] {
        recorder(&registry, &calls, name);
    }

    AsyncDispatcher::new(Arc::clone(&pool))
        .dispatch(&registry)
        .unwrap();
    pool.shutdown();
    pool.join();

    // One worker: dequeue order is execution order.
    assert_eq!(*calls.lock().unwrap(), ["a", "b", "c", "d"]);
}

#[test]
fn dispatch_returns_before_subscribers_run() {
    let pool = shared_pool(1);
    let registry = registry();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);
    let hits = Arc::new(AtomicUsize::new(0));

    let seen = Arc::clone(&hits);
    registry.connect(move || {
        let _ = release_rx.lock().unwrap().recv_timeout(Duration::from_secs(5));
        seen.fetch_add(1, Ordering::SeqCst);
    });

    AsyncDispatcher::new(Arc::clone(&pool))
        .dispatch(&registry)
        .unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    release_tx.send(()).unwrap();
    pool.shutdown();
    pool.join();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn dispatcher_never_shuts_down_its_pool() {
    let pool = shared_pool(2);
    let registry = registry();
    registry.connect(|| {});

    {
        let dispatcher = AsyncDispatcher::new(Arc::clone(&pool));
        dispatcher.dispatch(&registry).unwrap();
    }

    assert_eq!(pool.phase(), Phase::Running);
    pool.submit(|| {}).expect("pool still accepts work");
    pool.shutdown();
    pool.join();
    assert_eq!(pool.metrics().executed, 2);
}

#[test]
fn dispatch_to_closed_pool_reports_progress() {
    let pool = shared_pool(1);
    pool.shutdown();
    pool.join();

    let registry = registry();
    let first = registry.connect(|| {});
    registry.connect(|| {});

    let err = AsyncDispatcher::new(Arc::clone(&pool))
        .dispatch(&registry)
        .unwrap_err();

    match err {
        Error::Dispatch {
            subscriber,
            queued,
            total,
            source,
        } => {
            assert_eq!(subscriber, first);
            assert_eq!(queued, 0);
            assert_eq!(total, 2);
            assert!(matches!(*source, Error::PoolClosed));
        }
        other => panic!("expected Dispatch, got {other:?}"),
    }
}

#[test]
fn panicking_async_subscriber_is_logged_as_work_failure() {
    let log = Arc::new(MemoryLog::new());
    let pool = Arc::new(WorkerPool::new(2, log.clone()).unwrap());
    let signal = AsyncSignal::new(Arc::clone(&pool), log.clone());
    let hits = Arc::new(AtomicUsize::new(0));

    signal.connect(|| panic!("async slot exploded"));
    let seen = Arc::clone(&hits);
    signal.connect(move || {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    signal.emit().unwrap();
    pool.shutdown();
    pool.join();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(pool.metrics().failed, 1);
    assert_eq!(log.count_matching("async slot exploded"), 1);
}

// ---------------------------------------------------------------------------
// AsyncSignal
// ---------------------------------------------------------------------------

#[test]
fn async_signal_emits_repeatedly_until_pool_closes() {
    let pool = shared_pool(2);
    let signal = AsyncSignal::new(Arc::clone(&pool), Arc::new(NullLog));
    let hits = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
        let hits = Arc::clone(&hits);
        signal.connect(move || {
            hits.fetch_add(1, Ordering::SeqCst);
        });
    }

    signal.emit().unwrap();
    signal.emit().unwrap();
    assert_eq!(signal.emit_sync(), InvokeSummary { invoked: 2, failed: 0 });

    pool.shutdown();
    pool.join();

    assert_eq!(hits.load(Ordering::SeqCst), 6);
    assert!(matches!(signal.emit(), Err(Error::Dispatch { .. })));
    assert_eq!(signal.registry().len(), 2);
    assert!(Arc::ptr_eq(signal.dispatcher().pool(), &pool));
}
