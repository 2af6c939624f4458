use super::*;

#[test]
fn manual_clock_starts_where_told() {
    let clock = ManualClock::new(1_000);
    assert_eq!(clock.now_ms(), 1_000);
}

#[test]
fn manual_clock_advances_and_sets() {
    let clock = ManualClock::new(0);
    clock.advance(250);
    clock.advance(250);
    assert_eq!(clock.now_ms(), 500);
    clock.set(10);
    assert_eq!(clock.now_ms(), 10);
}

#[test]
fn system_clock_is_after_2020() {
    // 2020-01-01T00:00:00Z
    assert!(SystemClock.now_ms() > 1_577_836_800_000);
}

#[test]
fn clocks_usable_as_trait_objects() {
    let clocks: Vec<Box<dyn Clock>> = vec![Box::new(SystemClock), Box::new(ManualClock::new(5))];
    assert_eq!(clocks[1].now_ms(), 5);
}
