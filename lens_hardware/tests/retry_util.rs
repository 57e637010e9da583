use std::cell::Cell;
use std::time::Duration;

use lens_hardware::error::HwError;
use lens_hardware::util::{DEFAULT_MAX_ATTEMPTS, with_retries};
use lens_traits::delay::test_delay::RecordingDelay;
use rstest::rstest;

#[test]
fn succeeds_after_transient_failures() {
    let calls = Cell::new(0u32);
    let res = with_retries(5, Duration::ZERO, &RecordingDelay::new(), || {
        calls.set(calls.get() + 1);
        if calls.get() < 3 {
            Err(HwError::Nack { reg: 0x04 })
        } else {
            Ok(calls.get())
        }
    });
    assert_eq!(res.expect("should recover"), 3);
    assert_eq!(calls.get(), 3);
}

#[test]
fn gives_up_after_default_budget() {
    let calls = Cell::new(0u32);
    let err = with_retries(
        DEFAULT_MAX_ATTEMPTS,
        Duration::ZERO,
        &RecordingDelay::new(),
        || -> Result<(), HwError> {
            calls.set(calls.get() + 1);
            Err(HwError::Bus("arbitration lost".into()))
        },
    )
    .expect_err("budget exhausted");
    assert_eq!(calls.get(), DEFAULT_MAX_ATTEMPTS);
    match err {
        HwError::Bus(msg) => assert!(msg.contains("arbitration")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[rstest]
#[case(0, 1)]
#[case(1, 1)]
#[case(4, 4)]
fn attempt_count_matches_budget(#[case] budget: u32, #[case] expected: u32) {
    let calls = Cell::new(0u32);
    let _ = with_retries(budget, Duration::ZERO, &RecordingDelay::new(), || -> Result<(), HwError> {
        calls.set(calls.get() + 1);
        Err(HwError::Nack { reg: 0 })
    });
    assert_eq!(calls.get(), expected);
}

#[test]
fn pauses_between_attempts_go_through_delay() {
    let delay = RecordingDelay::new();
    let calls = Cell::new(0u32);
    let res = with_retries(4, Duration::from_millis(2), &delay, || {
        calls.set(calls.get() + 1);
        if calls.get() < 3 {
            Err(HwError::Nack { reg: 0x03 })
        } else {
            Ok(())
        }
    });
    assert!(res.is_ok());
    // Two failures, two pauses; none after the success.
    assert_eq!(delay.calls(), vec![Duration::from_millis(2); 2]);
}

#[test]
fn no_pause_after_final_failure() {
    let delay = RecordingDelay::new();
    let _ = with_retries(3, Duration::from_millis(5), &delay, || -> Result<(), HwError> {
        Err(HwError::Bus("timeout".into()))
    });
    assert_eq!(delay.total(), Duration::from_millis(10));
}
