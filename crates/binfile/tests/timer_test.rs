#![cfg(unix)]

use binfile::{ErrorCode, Timer, Times, process_times};

fn burn_cpu(rounds: u64) -> u64 {
    let mut acc = 0u64;
    for i in 0..rounds {
        acc = acc.wrapping_mul(6364136223846793005).wrapping_add(i);
    }
    std::hint::black_box(acc)
}

#[test]
fn elapsed_is_monotone_while_running() {
    let timer = Timer::new();
    let mut last = timer.elapsed().unwrap();
    for _ in 0..5 {
        burn_cpu(200_000);
        let now = timer.elapsed().unwrap();
        assert!(now.wall >= last.wall);
        assert!(now.user >= last.user);
        assert!(now.system >= last.system);
        last = now;
    }
    assert!(!timer.is_stopped());
}

#[test]
fn stop_freezes_reading() {
    let mut timer = Timer::new();
    burn_cpu(100_000);
    let stopped = timer.stop().unwrap();
    assert!(!stopped.is_unavailable());
    burn_cpu(100_000);
    assert_eq!(timer.stop().unwrap(), stopped);
    assert_eq!(timer.elapsed().unwrap(), stopped);

    let mut ec = ErrorCode::default();
    assert_eq!(timer.elapsed_with(&mut ec), stopped);
    assert!(!ec.is_err());
}

#[test]
fn restart_resets_epoch() {
    let mut timer = Timer::new();
    timer.stop().unwrap();
    let mut ec = ErrorCode::default();
    timer.start_with(&mut ec);
    assert!(!ec.is_err());
    assert!(!timer.is_stopped());
    let t = timer.stop_with(&mut ec);
    assert!(!ec.is_err());
    assert!(t.wall >= 0);
}

#[test]
fn process_times_are_cumulative() {
    let before = process_times().unwrap();
    burn_cpu(500_000);
    let after = process_times().unwrap();
    let delta: Times = after - before;
    assert!(!delta.is_unavailable());
    assert!(delta.cpu() >= 0);
}

#[test]
fn report_renders() {
    let mut timer = Timer::new();
    let t = timer.stop().unwrap();
    let text = t.to_string();
    assert!(text.contains("s wall, "), "{text}");
    assert!(text.contains("s CPU ("), "{text}");
}
