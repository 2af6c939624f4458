use super::*;
use crate::clock::ManualClock;
use crate::config::DEFAULT_TIMER_STORAGE_KEY;
use crate::store::MemoryStore;

const T0: i64 = 1_700_000_000_000;
const TWO_HOURS: i64 = 7_200_000;

struct Rig {
    clock: Rc<ManualClock>,
    store: Rc<MemoryStore>,
    timer: ExamTimer,
}

fn rig() -> Rig {
    rig_with(TimerConfig::default())
}

fn rig_with(config: TimerConfig) -> Rig {
    let clock = Rc::new(ManualClock::new(T0));
    let store = Rc::new(MemoryStore::new());
    let timer = ExamTimer::new(config, clock.clone(), store.clone());
    Rig { clock, store, timer }
}

fn warnings(events: &[TimerEvent]) -> Vec<i64> {
    events
        .iter()
        .filter_map(|e| match e {
            TimerEvent::Warning { minutes } => Some(*minutes),
            _ => None,
        })
        .collect()
}

fn stored(store: &MemoryStore) -> Option<TimerRecord> {
    store::load_json(store, DEFAULT_TIMER_STORAGE_KEY)
}

// =============================================================
// Lifecycle
// =============================================================

#[test]
fn start_sets_deadline_and_persists() {
    let mut r = rig();
    let events = r.timer.start();
    assert_eq!(events[0], TimerEvent::IntervalStarted);
    assert_eq!(events[1], TimerEvent::Tick { remaining_ms: TWO_HOURS, status: TimeStatus::Normal });
    assert_eq!(r.timer.state(), TimerState::Running { deadline_epoch_ms: T0 + TWO_HOURS });
    assert_eq!(
        stored(&r.store),
        Some(TimerRecord { deadline_epoch_ms: T0 + TWO_HOURS, fired_warnings: vec![], duration_ms: TWO_HOURS, paused_remaining_ms: None })
    );
}

#[test]
fn start_twice_is_a_no_op() {
    let mut r = rig();
    r.timer.start();
    r.clock.advance(5_000);
    assert!(r.timer.start().is_empty());
    assert_eq!(r.timer.remaining_ms(), TWO_HOURS - 5_000);
}

#[test]
fn suspended_tab_catches_up_from_deadline() {
    let mut r = rig();
    r.timer.start();
    r.clock.advance(5_999_000);

    let events = r.timer.on_visibility_change(true);
    assert_eq!(events[0], TimerEvent::Tick { remaining_ms: 1_201_000, status: TimeStatus::Warning });
    assert_eq!(warnings(&events), vec![30]);

    r.clock.advance(1_000);
    assert!(warnings(&r.timer.tick()).is_empty());
}

#[test]
fn catch_up_fires_each_crossed_threshold_once() {
    let mut r = rig();
    r.timer.start();
    r.clock.advance(TWO_HOURS - 4 * 60_000);
    assert_eq!(warnings(&r.timer.tick()), vec![30, 15, 5]);
    assert!(warnings(&r.timer.tick()).is_empty());
    assert_eq!(r.timer.status(), TimeStatus::Critical);
}

#[test]
fn warning_fires_at_exact_threshold() {
    let mut r = rig();
    r.timer.start();
    r.clock.advance(TWO_HOURS - 30 * 60_000);
    assert_eq!(warnings(&r.timer.tick()), vec![30]);
    assert_eq!(stored(&r.store).unwrap().fired_warnings, vec![30]);
}

#[test]
fn expiry_fires_once_and_clears_record() {
    let mut r = rig();
    r.timer.start();
    r.clock.advance(TWO_HOURS + 10_000);

    let events = r.timer.tick();
    assert_eq!(
        events,
        vec![
            TimerEvent::Tick { remaining_ms: 0, status: TimeStatus::Expired },
            TimerEvent::IntervalStopped,
            TimerEvent::Expired,
        ]
    );
    assert!(!r.store.contains(DEFAULT_TIMER_STORAGE_KEY));
    assert!(r.timer.tick().is_empty());
    assert!(r.timer.on_visibility_change(true).is_empty());
    assert!(r.timer.start().is_empty());
}

#[test]
fn pause_freezes_and_resume_rederives_deadline() {
    let mut r = rig();
    r.timer.start();
    r.clock.advance(60_000);
    assert_eq!(r.timer.pause(), vec![TimerEvent::IntervalStopped]);

    r.clock.advance(3_600_000);
    assert_eq!(r.timer.remaining_ms(), TWO_HOURS - 60_000);
    assert!(r.timer.tick().is_empty());

    let events = r.timer.resume();
    assert_eq!(events[0], TimerEvent::IntervalStarted);
    let now = T0 + 60_000 + 3_600_000;
    assert_eq!(r.timer.state(), TimerState::Running { deadline_epoch_ms: now + TWO_HOURS - 60_000 });
}

#[test]
fn reload_while_paused_restores_paused() {
    let mut r = rig();
    r.timer.start();
    r.clock.advance(60_000);
    r.timer.pause();
    assert_eq!(stored(&r.store).unwrap().paused_remaining_ms, Some(TWO_HOURS - 60_000));

    r.clock.advance(3_600_000);
    let mut reopened = ExamTimer::new(TimerConfig::default(), r.clock.clone(), r.store.clone());
    let events = reopened.restore();
    assert_eq!(events, vec![TimerEvent::Tick { remaining_ms: TWO_HOURS - 60_000, status: TimeStatus::Normal }]);
    assert_eq!(reopened.state(), TimerState::Paused { remaining_ms: TWO_HOURS - 60_000 });

    reopened.resume();
    assert_eq!(stored(&r.store).unwrap().paused_remaining_ms, None);
}

#[test]
fn stop_clears_record_without_expiring() {
    let mut r = rig();
    r.timer.start();
    let events = r.timer.stop();
    assert_eq!(events, vec![TimerEvent::IntervalStopped]);
    assert_eq!(r.timer.state(), TimerState::Stopped);
    assert!(!r.store.contains(DEFAULT_TIMER_STORAGE_KEY));
    assert!(r.timer.stop().is_empty());
}

#[test]
fn reset_returns_to_full_duration() {
    let mut r = rig();
    r.timer.start();
    r.clock.advance(TWO_HOURS);
    r.timer.tick();
    r.timer.reset();
    assert_eq!(r.timer.state(), TimerState::Idle { remaining_ms: TWO_HOURS });
    assert!(r.timer.fired_warnings().is_empty());
}

// =============================================================
// setRemaining
// =============================================================

#[test]
fn set_remaining_marks_passed_thresholds() {
    let mut r = rig();
    let events = r.timer.set_remaining(600_000);
    assert_eq!(events, vec![TimerEvent::Tick { remaining_ms: 600_000, status: TimeStatus::Warning }]);
    assert_eq!(r.timer.fired_warnings(), vec![30, 15]);

    let events = r.timer.start();
    assert!(warnings(&events).is_empty());
    r.clock.advance(300_000);
    assert_eq!(warnings(&r.timer.tick()), vec![5]);
}

#[test]
fn set_remaining_while_running_moves_deadline() {
    let mut r = rig();
    r.timer.start();
    r.clock.advance(1_000);
    r.timer.set_remaining(1_200_000);
    assert_eq!(r.timer.state(), TimerState::Running { deadline_epoch_ms: T0 + 1_000 + 1_200_000 });
    assert_eq!(stored(&r.store).unwrap().fired_warnings, vec![30]);
}

#[test]
fn set_remaining_clamps_negative_and_expires_running() {
    let mut r = rig();
    r.timer.start();
    let events = r.timer.set_remaining(-5);
    assert!(events.contains(&TimerEvent::Expired));
    assert_eq!(r.timer.state(), TimerState::Expired);
}

#[test]
fn set_remaining_huge_value_saturates_deadline() {
    let mut r = rig();
    r.timer.start();
    let events = r.timer.set_remaining(i64::MAX);
    assert!(!events.contains(&TimerEvent::Expired));
    assert_eq!(r.timer.state(), TimerState::Running { deadline_epoch_ms: i64::MAX });
    assert!(r.timer.remaining_ms() > TWO_HOURS);
}

// =============================================================
// Persistence
// =============================================================

#[test]
fn restore_subtracts_time_closed() {
    let mut first = rig();
    first.timer.start();
    first.clock.advance(600_000);
    first.timer.tick();

    let clock = Rc::new(ManualClock::new(T0 + 600_000 + 3_000_000));
    let mut timer = ExamTimer::new(TimerConfig::default(), clock.clone(), first.store.clone());
    let events = timer.restore();

    assert_eq!(events[0], TimerEvent::IntervalStarted);
    assert_eq!(timer.remaining_ms(), TWO_HOURS - 3_600_000);
    assert!(timer.is_running());
}

#[test]
fn restore_keeps_fired_warnings() {
    let mut first = rig();
    first.timer.start();
    first.clock.advance(TWO_HOURS - 20 * 60_000);
    first.timer.tick();

    let clock = Rc::new(ManualClock::new(first.clock.now_ms() + 1_000));
    let mut timer = ExamTimer::new(TimerConfig::default(), clock, first.store.clone());
    assert!(warnings(&timer.restore()).is_empty());
    assert_eq!(timer.fired_warnings(), vec![30]);
}

#[test]
fn restore_past_deadline_expires() {
    let mut first = rig();
    first.timer.start();

    let clock = Rc::new(ManualClock::new(T0 + TWO_HOURS + 1));
    let mut timer = ExamTimer::new(TimerConfig::default(), clock, first.store.clone());
    let events = timer.restore();
    assert!(events.contains(&TimerEvent::Expired));
    assert!(!first.store.contains(DEFAULT_TIMER_STORAGE_KEY));
}

#[test]
fn restore_without_record_stays_idle() {
    let mut r = rig();
    assert!(r.timer.restore().is_empty());
    assert_eq!(r.timer.state(), TimerState::Idle { remaining_ms: TWO_HOURS });
}

#[test]
fn periodic_persist_follows_interval() {
    let mut r = rig();
    r.timer.start();
    r.store.remove(DEFAULT_TIMER_STORAGE_KEY);

    r.clock.advance(5_000);
    r.timer.tick();
    assert!(!r.store.contains(DEFAULT_TIMER_STORAGE_KEY));

    r.clock.advance(5_000);
    r.timer.tick();
    assert!(r.store.contains(DEFAULT_TIMER_STORAGE_KEY));
}

#[test]
fn unavailable_store_keeps_counting() {
    let mut r = rig();
    r.store.set_failing(true);
    r.timer.start();
    r.clock.advance(5_999_000);
    assert_eq!(warnings(&r.timer.tick()), vec![30]);
    assert_eq!(r.timer.remaining_ms(), 1_201_000);
}

#[test]
fn hidden_page_persists() {
    let mut r = rig();
    r.timer.start();
    r.store.remove(DEFAULT_TIMER_STORAGE_KEY);
    assert!(r.timer.on_visibility_change(false).is_empty());
    assert!(r.store.contains(DEFAULT_TIMER_STORAGE_KEY));
}

// =============================================================
// Classification
// =============================================================

#[test]
fn status_bands() {
    let r = rig();
    assert_eq!(r.timer.classify(31 * 60_000), TimeStatus::Normal);
    assert_eq!(r.timer.classify(30 * 60_000), TimeStatus::Warning);
    assert_eq!(r.timer.classify(5 * 60_000), TimeStatus::Critical);
    assert_eq!(r.timer.classify(0), TimeStatus::Expired);
}

#[test]
fn thresholds_are_normalised() {
    let config = TimerConfig { warning_minutes: vec![5, 30, 0, 15, 5], ..TimerConfig::default() };
    let r = rig_with(config);
    assert_eq!(r.timer.thresholds, vec![30, 15, 5]);
}

#[test]
fn record_remaining_never_negative() {
    let record = TimerRecord { deadline_epoch_ms: 100, fired_warnings: vec![], duration_ms: 100, paused_remaining_ms: None };
    assert_eq!(record.remaining_at(40), 60);
    assert_eq!(record.remaining_at(400), 0);
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["deadlineEpochMs"], 100);
    assert!(json["firedWarnings"].is_array());
    assert!(json.get("pausedRemainingMs").is_none());
}
