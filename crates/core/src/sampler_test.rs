use std::sync::Arc;
use std::thread;

use super::*;

#[test]
fn test_rate_one_passes_everything() {
    let gate = SamplingGate::new(1);
    assert!((0..100).all(|_| gate.sample()));
}

#[test]
fn test_rate_zero_passes_everything() {
    let gate = SamplingGate::new(0);
    assert!((0..100).all(|_| gate.sample()));
}

#[test]
fn test_every_nth_call_passes() {
    let gate = SamplingGate::new(10);
    let passed: Vec<i32> = (1..=30).filter(|_| gate.sample()).collect();
    // Calls 10, 20, and 30 pass.
    assert_eq!(passed, vec![10, 20, 30]);
}

#[test]
fn test_250_calls_at_rate_100_pass_twice() {
    let gate = SamplingGate::new(100);
    let passed = (0..250).filter(|_| gate.sample()).count();
    assert_eq!(passed, 2);
}

#[test]
fn test_concurrent_total_is_exact() {
    let gate = Arc::new(SamplingGate::new(100));
    let mut handles = Vec::new();

    for _ in 0..4 {
        let gate = Arc::clone(&gate);
        handles.push(thread::spawn(move || {
            (0..25_000).filter(|_| gate.sample()).count()
        }));
    }
    let passed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    // 100_000 calls at rate 100: exactly one pass per full window,
    // regardless of interleaving.
    assert_eq!(passed, 1000);
    assert_eq!(gate.observed(), 100_000);
}
