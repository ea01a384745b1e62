//! Unit tests for the visitor registry

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use crate::domain::entities::ClientKey;
use crate::services::rate_limit::{Admission, LimiterConfig, VisitorRegistry};

fn registry(capacity: f64, refill_rate: f64) -> VisitorRegistry {
    VisitorRegistry::new(
        LimiterConfig::new(capacity, refill_rate).with_idle_threshold(Duration::from_secs(60)),
    )
}

#[test]
fn test_burst_then_refill_end_to_end() {
    let registry = registry(5.0, 1.0);
    let key = ClientKey::from("203.0.113.7");
    let start = Instant::now();

    for i in 0..5 {
        assert!(registry.admit(key.clone(), start), "request {} should pass", i + 1);
    }
    assert!(!registry.admit(key.clone(), start + Duration::from_millis(500)));

    let one_second = start + Duration::from_secs(1);
    assert!(registry.admit(key.clone(), one_second));
    assert!(!registry.admit(key.clone(), one_second));
}

#[test]
fn test_keys_are_limited_independently() {
    let registry = registry(1.0, 0.0);
    let now = Instant::now();

    assert!(registry.admit(ClientKey::from("10.0.0.1"), now));
    assert!(!registry.admit(ClientKey::from("10.0.0.1"), now));
    assert!(registry.admit(ClientKey::from("10.0.0.2"), now));
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_check_reports_remaining_and_retry_after() {
    let registry = registry(2.0, 0.5);
    let key = ClientKey::from("198.51.100.4");
    let now = Instant::now();

    assert_eq!(registry.check(key.clone(), now), Admission::Admitted { remaining: 1 });
    assert_eq!(registry.check(key.clone(), now), Admission::Admitted { remaining: 0 });
    assert_eq!(
        registry.check(key.clone(), now),
        Admission::Rejected {
            retry_after: Some(Duration::from_secs(2))
        }
    );
}

#[test]
fn test_concurrent_first_access_creates_one_bucket() {
    const THREADS: usize = 32;

    let registry = Arc::new(registry(5.0, 0.0));
    let barrier = Arc::new(Barrier::new(THREADS));
    let now = Instant::now();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.admit(ClientKey::from("192.0.2.50"), now)
            })
        })
        .collect();

    let admitted = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|admitted| *admitted)
        .count();

    // Two buckets for one key would let 10 through
    assert_eq!(admitted, 5);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.tokens(&ClientKey::from("192.0.2.50")), Some(0.0));
}

#[test]
fn test_concurrent_admits_never_exceed_bound() {
    const THREADS: usize = 8;
    const REQUESTS_PER_THREAD: usize = 50;

    let registry = Arc::new(registry(10.0, 0.0));
    let barrier = Arc::new(Barrier::new(THREADS));
    let now = Instant::now();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..REQUESTS_PER_THREAD)
                    .filter(|_| registry.admit(ClientKey::from("shared"), now))
                    .count()
            })
        })
        .collect();

    let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(admitted, 10);
}

#[test]
fn test_sweep_removes_idle_entries_only() {
    let registry = registry(3.0, 1.0);
    let start = Instant::now();

    registry.admit(ClientKey::from("idle"), start);
    registry.admit(ClientKey::from("active"), start);
    registry.admit(ClientKey::from("active"), start + Duration::from_secs(50));

    let removed = registry.sweep(start + Duration::from_secs(61), registry.idle_threshold());
    assert_eq!(removed, 1);
    assert!(!registry.contains(&ClientKey::from("idle")));
    assert!(registry.contains(&ClientKey::from("active")));
}

#[test]
fn test_sweep_at_threshold_keeps_entry() {
    let registry = registry(3.0, 1.0);
    let start = Instant::now();
    registry.admit(ClientKey::from("edge"), start);

    assert_eq!(registry.sweep(start + Duration::from_secs(60), Duration::from_secs(60)), 0);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_swept_key_starts_with_full_bucket() {
    let registry = registry(3.0, 0.0);
    let key = ClientKey::from("returning");
    let start = Instant::now();

    for _ in 0..3 {
        assert!(registry.admit(key.clone(), start));
    }
    assert!(!registry.admit(key.clone(), start));

    let after_idle = start + Duration::from_secs(120);
    registry.sweep(after_idle, registry.idle_threshold());
    assert!(registry.is_empty());

    // State was discarded, so the whole burst is available again
    for _ in 0..3 {
        assert!(registry.admit(key.clone(), after_idle));
    }
    assert!(!registry.admit(key, after_idle));
}

#[test]
fn test_sweep_concurrent_with_admits_keeps_map_consistent() {
    let registry = Arc::new(registry(1000.0, 0.0));
    let start = Instant::now();
    for i in 0..200 {
        registry.admit(ClientKey::new(format!("old-{}", i)), start);
    }

    let later = start + Duration::from_secs(120);
    let writer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for i in 0..200 {
                assert!(registry.admit(ClientKey::new(format!("new-{}", i)), later));
            }
        })
    };
    let sweeper = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || registry.sweep(later, Duration::from_secs(60)))
    };

    writer.join().unwrap();
    let removed = sweeper.join().unwrap();

    assert_eq!(removed, 200);
    assert_eq!(registry.len(), 200);
    assert!((0..200).all(|i| registry.contains(&ClientKey::new(format!("new-{}", i)))));
}
