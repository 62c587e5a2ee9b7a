//! End-to-end chain suite.
//!
//! Validates the core chaining invariants against the real two-lane
//! executor:
//!
//! - **Exactly-once propagation**: values, failures, and cancellation
//!   cross combinator boundaries exactly once, with invocation counts
//! - **Short-circuiting**: a failed or cancelled source never invokes a
//!   downstream user operation
//! - **Lane discipline**: background continuations leave the affinity
//!   thread; inline continuations triggered from an affinity listener
//!   never deadlock the lane
//! - **Fan-in**: the wrapped task fails on the first member failure and
//!   delivers its value only after the join resolves

mod common;

use common::init_test_logging;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use taskline::test_utils::wait_for;
use taskline::{Error, ExecutorHandle, Lane, Outcome, Task, TwoLaneConfig, TwoLaneExecutor};

const TIMEOUT: Duration = Duration::from_secs(10);

fn executor(prefix: &str) -> ExecutorHandle {
    Arc::new(TwoLaneExecutor::new(TwoLaneConfig {
        background_threads: 4,
        thread_name_prefix: prefix.to_string(),
    }))
}

#[test]
fn background_sum_times_ten_yields_forty_on_another_thread() {
    init_test_logging();
    let exec = executor("e2e-forty");

    let body_thread = Arc::new(parking_lot::Mutex::new(None));
    let op_thread = Arc::new(parking_lot::Mutex::new(None));
    let bt = Arc::clone(&body_thread);
    let ot = Arc::clone(&op_thread);

    let chain = Task::named("sum", Lane::Background, move || {
        *bt.lock() = std::thread::current().name().map(String::from);
        Ok(2 + 2)
    })
    .then(
        move |v: i32| {
            *ot.lock() = std::thread::current().name().map(String::from);
            Ok(v * 10)
        },
        false,
    );

    let (tx, rx) = mpsc::channel();
    chain.on_succeeded(move |v| {
        tx.send(*v).unwrap();
    });
    chain.submit(&exec);

    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), 40);
    let body_name = body_thread.lock().clone().unwrap();
    let op_name = op_thread.lock().clone().unwrap();
    assert!(body_name.starts_with("e2e-forty-bg-"), "body on the pool");
    assert_ne!(body_name, op_name, "continuation left the pool thread");
}

#[test]
fn boom_failure_short_circuits_with_zero_probe_count() {
    init_test_logging();
    let exec = executor("e2e-boom");

    let probe = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&probe);
    let chain = Task::<i32>::named("thrower", Lane::Background, || {
        Err(Error::operation("boom"))
    })
    .then(
        move |v: i32| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(v)
        },
        true,
    );
    chain.submit(&exec);

    let outcome = wait_for(&chain, TIMEOUT);
    let Outcome::Failed(cause) = outcome else {
        panic!("expected failure");
    };
    assert_eq!(cause.message(), "boom");
    assert_eq!(probe.load(Ordering::SeqCst), 0);
}

#[test]
fn cancellation_propagates_without_invoking_operations() {
    init_test_logging();
    let exec = executor("e2e-cancel");

    let probe = Arc::new(AtomicUsize::new(0));
    let c1 = Arc::clone(&probe);
    let c2 = Arc::clone(&probe);
    let source = Task::new(Lane::Background, || Ok(1));
    source.cancel();
    let chain = source
        .then(
            move |v: i32| {
                c1.fetch_add(1, Ordering::SeqCst);
                Ok(v)
            },
            true,
        )
        .then_task(move |v: i32| {
            c2.fetch_add(1, Ordering::SeqCst);
            Task::ready(v)
        });
    chain.submit(&exec);

    let outcome = wait_for(&chain, TIMEOUT);
    assert!(outcome.is_cancelled());
    assert!(chain.is_cancelled());
    assert!(chain.failure().is_none(), "cancelled, never also failed");
    assert_eq!(probe.load(Ordering::SeqCst), 0);
}

#[test]
fn failure_cause_is_carried_verbatim_through_a_long_chain() {
    init_test_logging();
    let exec = executor("e2e-verbatim");

    let source = Task::<i32>::new(Lane::Background, || Err(Error::operation("original")));
    let mut chain = source.clone();
    for _ in 0..8 {
        chain = chain.then(Ok, false);
    }
    chain.submit(&exec);

    let _ = wait_for(&chain, TIMEOUT);
    let downstream = chain.failure().unwrap();
    assert!(source.failure().unwrap().same_cause(&downstream));
}

#[test]
fn inline_continuation_from_affinity_listener_does_not_deadlock() {
    init_test_logging();
    let exec = executor("e2e-inline");

    // The whole derivation happens inside a completion listener running
    // on the affinity thread; the inline continuation must run right
    // there without waiting on the lane it occupies.
    let source = Task::new(Lane::Background, || Ok(5));
    let (tx, rx) = mpsc::channel();
    let listener_exec = Arc::clone(&exec);
    source.on_succeeded(move |v| {
        let inner = Task::ready(*v).then(|v: i32| Ok(v + 1), false);
        let tx = tx.clone();
        inner.on_succeeded(move |v| {
            tx.send(*v).unwrap();
        });
        inner.submit(&listener_exec);
    });
    source.submit(&exec);

    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), 6);
}

#[test]
fn error_observer_sees_cause_once_and_failure_flows_on() {
    init_test_logging();
    let exec = executor("e2e-observe");

    let observations = Arc::new(AtomicUsize::new(0));
    let probe = Arc::clone(&observations);
    let (tx, rx) = mpsc::channel();
    let chain = Task::<i32>::new(Lane::Background, || Err(Error::operation("seen")))
        .inspect_err(
            move |cause| {
                probe.fetch_add(1, Ordering::SeqCst);
                tx.send(cause.clone()).unwrap();
            },
            Lane::Background,
        )
        .then(Ok, false);
    chain.submit(&exec);

    let outcome = wait_for(&chain, TIMEOUT);
    let Outcome::Failed(downstream) = outcome else {
        panic!("expected failure");
    };
    let observed = rx.recv_timeout(TIMEOUT).unwrap();
    assert!(observed.same_cause(&downstream));
    assert_eq!(observations.load(Ordering::SeqCst), 1);
}

#[test]
fn wrapped_group_fails_when_one_member_fails() {
    init_test_logging();
    let exec = executor("e2e-wrap");

    let members = vec![
        Task::new(Lane::Background, || Ok(1)).member(),
        Task::<i32>::new(Lane::Background, || Err(Error::operation("bad member"))).member(),
        Task::new(Lane::Background, || Ok(3)).member(),
    ];
    let wrapped = Task::named("load deck", Lane::Background, || Ok("deck".to_string()))
        .wrap("import presentation", members);
    wrapped.submit(&exec);

    let outcome = wait_for(&wrapped, TIMEOUT);
    let Outcome::Failed(cause) = outcome else {
        panic!("expected failure");
    };
    assert_eq!(cause.message(), "bad member");
    assert_eq!(wrapped.name(), Some("import presentation"));
}

#[test]
fn wrapped_group_delivers_value_only_after_join_resolves() {
    init_test_logging();
    let exec = executor("e2e-join");

    let done = Arc::new(AtomicUsize::new(0));
    let members = (0..3_u64)
        .map(|i| {
            let done = Arc::clone(&done);
            Task::new(Lane::Background, move || {
                std::thread::sleep(Duration::from_millis(15 * (i + 1)));
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .member()
        })
        .collect();
    let wrapped = Task::new(Lane::Background, || Ok(7)).wrap("slow join", members);

    let members_done_at_delivery = Arc::new(AtomicUsize::new(usize::MAX));
    let probe = Arc::clone(&done);
    let seen = Arc::clone(&members_done_at_delivery);
    wrapped.on_succeeded(move |_| {
        seen.store(probe.load(Ordering::SeqCst), Ordering::SeqCst);
    });
    wrapped.submit(&exec);

    let outcome = wait_for(&wrapped, TIMEOUT);
    assert!(matches!(outcome, Outcome::Succeeded(7)));
    assert_eq!(members_done_at_delivery.load(Ordering::SeqCst), 3);
}

#[test]
fn mixed_chain_spanning_both_lanes_and_all_combinators() {
    init_test_logging();
    let exec = executor("e2e-mixed");

    let observations = Arc::new(AtomicUsize::new(0));
    let probe = Arc::clone(&observations);
    let chain = Task::named("parse", Lane::Background, || Ok(10))
        .then(|v: i32| Ok(v + 1), false)
        .then_task(|v: i32| Task::named("render", Lane::Background, move || Ok(v * 2)))
        .inspect_err(
            move |_| {
                probe.fetch_add(1, Ordering::SeqCst);
            },
            Lane::Affinity,
        )
        .then(|v: i32| Ok(v - 2), true);
    chain.submit(&exec);

    let outcome = wait_for(&chain, TIMEOUT);
    assert!(matches!(outcome, Outcome::Succeeded(20)));
    assert_eq!(observations.load(Ordering::SeqCst), 0);
}
