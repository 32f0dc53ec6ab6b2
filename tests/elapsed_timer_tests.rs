// Elapsed-time accounting across pause/resume
//
// Elapsed seconds must equal the wall-clock time spent recording, floored,
// no matter how the recording was split by pauses.

use screen_recorder::session::{Clock, ElapsedTimer, ManualClock};

#[test]
fn test_paused_time_is_excluded() {
    let clock = ManualClock::new();
    let mut timer = ElapsedTimer::new();

    timer.start(clock.now());
    clock.advance_millis(1400);
    assert_eq!(timer.pause(clock.now()), 1);

    clock.advance_secs(10);
    assert_eq!(timer.sample(clock.now()), 1, "Frozen while paused");

    timer.resume(clock.now());
    clock.advance_millis(700);
    assert_eq!(timer.sample(clock.now()), 2);
}

#[test]
fn test_sub_second_segments_accumulate() {
    let clock = ManualClock::new();
    let mut timer = ElapsedTimer::new();

    timer.start(clock.now());
    for _ in 0..10 {
        clock.advance_millis(300);
        timer.pause(clock.now());
        clock.advance_millis(900);
        timer.resume(clock.now());
    }

    // Ten 300ms segments of recording
    assert_eq!(timer.sample(clock.now()), 3);
}

#[test]
fn test_resume_and_pause_are_idempotent() {
    let clock = ManualClock::new();
    let mut timer = ElapsedTimer::new();

    timer.start(clock.now());
    clock.advance_secs(2);
    timer.resume(clock.now());
    clock.advance_secs(1);
    assert_eq!(timer.sample(clock.now()), 3, "Resume while running keeps the anchor");

    assert_eq!(timer.pause(clock.now()), 3);
    clock.advance_secs(4);
    assert_eq!(timer.pause(clock.now()), 3);
    assert!(!timer.is_running());
}

#[test]
fn test_start_and_reset_clear_elapsed() {
    let clock = ManualClock::new();
    let mut timer = ElapsedTimer::new();

    timer.start(clock.now());
    clock.advance_secs(7);
    timer.pause(clock.now());

    timer.reset();
    assert_eq!(timer.sample(clock.now()), 0);

    timer.start(clock.now());
    clock.advance_secs(1);
    assert_eq!(timer.sample(clock.now()), 1);
}
