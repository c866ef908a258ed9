//! Tracking context accounting and propagation tests

use std::sync::Arc;
use std::thread;

use memtrack::{Limit, LimitOpt, Parent, TrackContext, Usage};

fn finite_limits(bytes: u64, objects: u64, calls: u64) -> Vec<LimitOpt> {
    vec![
        LimitOpt::Bytes(Limit::Finite(bytes)),
        LimitOpt::Objects(Limit::Finite(objects)),
        LimitOpt::Calls(Limit::Finite(calls)),
    ]
}

#[test]
fn test_context_with_positive_limits() {
    let ctx = TrackContext::new(Parent::Root, &finite_limits(10, 5, 3));
    assert_eq!(ctx.used(), Usage::default());
    assert_eq!(ctx.limits().bytes, Limit::Finite(10));
    assert_eq!(ctx.limits().objects, Limit::Finite(5));
    assert_eq!(ctx.limits().calls, Limit::Finite(3));
    assert_eq!(ctx.remains().bytes, Limit::Finite(10));
    assert_eq!(ctx.remains().objects, Limit::Finite(5));
    assert_eq!(ctx.remains().calls, Limit::Finite(3));
    assert!(!ctx.exceeded());

    // 4 objects of 2 bytes in 2 calls
    ctx.add(2, 4, 2);
    assert_eq!(
        ctx.used(),
        Usage {
            bytes: 8,
            objects: 4,
            calls: 2
        }
    );
    assert_eq!(ctx.remains().bytes, Limit::Finite(2));
    assert_eq!(ctx.remains().objects, Limit::Finite(1));
    assert_eq!(ctx.remains().calls, Limit::Finite(1));
    assert!(!ctx.exceeded());

    // One more add pushes bytes strictly over; objects and calls only reach
    // their ceilings, which under the strict rule is not a breach by itself.
    ctx.add(3, 1, 1);
    assert_eq!(
        ctx.used(),
        Usage {
            bytes: 11,
            objects: 5,
            calls: 3
        }
    );
    assert_eq!(ctx.remains().bytes, Limit::Finite(0));
    assert_eq!(ctx.remains().objects, Limit::Finite(0));
    assert_eq!(ctx.remains().calls, Limit::Finite(0));
    assert!(ctx.exceeded());

    // Reset clears counters but not limits.
    ctx.reset();
    assert_eq!(ctx.used(), Usage::default());
    assert_eq!(ctx.limits().bytes, Limit::Finite(10));
    assert_eq!(ctx.remains().calls, Limit::Finite(3));
    assert!(!ctx.exceeded());

    // A single quantity alone can trip the predicate.
    ctx.add(0, 0, 10);
    assert_eq!(
        ctx.used(),
        Usage {
            bytes: 0,
            objects: 0,
            calls: 10
        }
    );
    assert_eq!(ctx.remains().bytes, Limit::Finite(10));
    assert_eq!(ctx.remains().objects, Limit::Finite(5));
    assert_eq!(ctx.remains().calls, Limit::Finite(0));
    assert!(ctx.exceeded());
}

#[test]
fn test_context_with_unbounded_limits() {
    use memtrack::limit::{EXA, PB};

    let ctx = TrackContext::new(
        Parent::Root,
        &[
            LimitOpt::Bytes(Limit::Unbounded),
            LimitOpt::Objects(Limit::Finite(3)),
        ],
    );
    assert!(ctx.limits().bytes.is_unbounded());
    assert_eq!(ctx.limits().objects, Limit::Finite(3));
    assert!(ctx.limits().calls.is_unbounded());
    assert!(ctx.remains().bytes.is_unbounded());
    assert!(ctx.remains().calls.is_unbounded());
    assert!(!ctx.exceeded());

    ctx.add(PB, 1, EXA);
    assert_eq!(ctx.used().bytes, PB);
    assert_eq!(ctx.used().calls, EXA);
    assert!(ctx.remains().bytes.is_unbounded());
    assert_eq!(ctx.remains().objects, Limit::Finite(2));
    assert!(!ctx.exceeded());

    ctx.add(PB, 5, EXA);
    assert_eq!(ctx.used().bytes, 6 * PB);
    assert_eq!(ctx.used().objects, 6);
    assert_eq!(ctx.used().calls, 2 * EXA);
    assert_eq!(ctx.remains().objects, Limit::Finite(0));
    assert!(ctx.exceeded());

    ctx.reset();
    assert_eq!(ctx.used(), Usage::default());
    assert_eq!(ctx.remains().objects, Limit::Finite(3));
    assert!(!ctx.exceeded());
}

#[test]
fn test_unbounded_child_inherits_parent_ceilings() {
    let parent = TrackContext::new(Parent::Root, &finite_limits(10, 5, 3));
    let child = TrackContext::new(
        Parent::Tracker(Arc::clone(&parent)),
        &[
            LimitOpt::Bytes(Limit::Unbounded),
            LimitOpt::Objects(Limit::Unbounded),
            LimitOpt::Calls(Limit::Unbounded),
        ],
    );
    // Locally unbounded quantities delegate headroom to the parent.
    assert_eq!(child.remains().bytes, Limit::Finite(10));
    assert_eq!(child.remains().objects, Limit::Finite(5));
    assert_eq!(child.remains().calls, Limit::Finite(3));
    assert!(!child.exceeded());

    child.add(5, 3, 3);
    assert_eq!(
        child.used(),
        Usage {
            bytes: 15,
            objects: 3,
            calls: 3
        }
    );
    // The same deltas landed on the parent.
    assert_eq!(
        parent.used(),
        Usage {
            bytes: 15,
            objects: 3,
            calls: 3
        }
    );
    assert_eq!(child.remains().bytes, Limit::Finite(0));
    assert_eq!(child.remains().objects, Limit::Finite(2));
    assert_eq!(child.remains().calls, Limit::Finite(0));
    // Bytes 15 > 10 on the parent chain makes the child exceeded too.
    assert!(child.exceeded());
    assert!(parent.exceeded());

    // Resetting the child does not touch the parent, which stays over
    // budget, so the composite predicate holds.
    child.reset();
    assert_eq!(child.used(), Usage::default());
    assert_eq!(child.remains().bytes, Limit::Finite(0));
    assert_eq!(child.remains().objects, Limit::Finite(2));
    assert!(child.exceeded());
}

#[test]
fn test_grandparent_propagation() {
    let root = TrackContext::new(Parent::Root, &[LimitOpt::Bytes(Limit::Finite(1000))]);
    let mid = TrackContext::new(Parent::Tracker(Arc::clone(&root)), &[]);
    let leaf = TrackContext::new(Parent::Tracker(Arc::clone(&mid)), &[]);

    leaf.add(10, 3, 1);
    mid.add(5, 1, 1);

    assert_eq!(leaf.used().bytes, 30);
    assert_eq!(mid.used().bytes, 35);
    assert_eq!(root.used().bytes, 35);
    assert_eq!(root.used().objects, 4);
    assert_eq!(root.used().calls, 2);
}

#[test]
fn test_concurrent_adds_lose_nothing() {
    let ctx = TrackContext::new(Parent::Root, &[LimitOpt::Bytes(Limit::Unbounded)]);
    let threads = 8;
    let rounds = 1000;

    let mut handles = vec![];
    for _ in 0..threads {
        let ctx = Arc::clone(&ctx);
        handles.push(thread::spawn(move || {
            for _ in 0..rounds {
                ctx.add(16, 2, 1);
            }
        }));
    }
    for handle in handles {
        handle.join().expect("recorder thread panicked");
    }

    let total = (threads * rounds) as u64;
    assert_eq!(
        ctx.used(),
        Usage {
            bytes: 32 * total,
            objects: 2 * total,
            calls: total
        }
    );
}

#[test]
fn test_concurrent_adds_roll_up_to_shared_parent() {
    let parent = TrackContext::new(Parent::Root, &[LimitOpt::Bytes(Limit::Unbounded)]);
    let mut handles = vec![];
    for _ in 0..4 {
        let child = TrackContext::new(Parent::Tracker(Arc::clone(&parent)), &[]);
        handles.push(thread::spawn(move || {
            for _ in 0..500 {
                child.add(8, 1, 1);
            }
            child.used()
        }));
    }
    let mut child_bytes = 0;
    for handle in handles {
        child_bytes += handle.join().expect("recorder thread panicked").bytes;
    }
    assert_eq!(child_bytes, 4 * 500 * 8);
    assert_eq!(parent.used().bytes, 4 * 500 * 8);
    assert_eq!(parent.used().objects, 4 * 500);
    assert_eq!(parent.used().calls, 4 * 500);
}
