//! Exam countdown anchored to an absolute wall-clock deadline.
//!
//! Remaining time is always `deadline - now`, recomputed on demand; nothing
//! is ever decremented per tick. A tab that was suspended for an hour sees
//! the right remaining time on its next tick or visibility change, and a page
//! reopened from the persisted [`TimerRecord`] subtracts the time it was closed.
//!
//! The host owns the actual 1 s interval and the visibility listener. It
//! installs them on [`TimerEvent::IntervalStarted`], removes them on
//! [`TimerEvent::IntervalStopped`], and calls [`ExamTimer::tick`] /
//! [`ExamTimer::on_visibility_change`] from them.

#[cfg(test)]
#[path = "timer_test.rs"]
mod timer_test;

use std::collections::BTreeSet;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::config::TimerConfig;
use crate::consts::MS_PER_MINUTE;
use crate::store::{self, KeyValueStore};

/// The persisted shape, written on start, on pause, on each warning and
/// periodically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerRecord {
    pub deadline_epoch_ms: i64,
    /// Thresholds (minutes) whose warning has already fired.
    pub fired_warnings: Vec<i64>,
    pub duration_ms: i64,
    /// Frozen remaining time while paused; the deadline is then ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_remaining_ms: Option<i64>,
}

impl TimerRecord {
    /// Time left at `now_ms`, never negative.
    #[must_use]
    pub fn remaining_at(&self, now_ms: i64) -> i64 {
        match self.paused_remaining_ms {
            Some(remaining_ms) => remaining_ms.max(0),
            None => self.deadline_epoch_ms.saturating_sub(now_ms).max(0),
        }
    }
}

/// How urgent the remaining time is, for styling the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeStatus {
    Normal,
    /// At or below the largest warning threshold.
    Warning,
    /// At or below the smallest warning threshold.
    Critical,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TimerEvent {
    Tick { remaining_ms: i64, status: TimeStatus },
    /// A threshold was crossed; fires once per threshold.
    Warning { minutes: i64 },
    /// Fires exactly once; the session is over.
    Expired,
    /// Install the 1 s interval and visibility listener.
    IntervalStarted,
    /// Remove the interval and visibility listener.
    IntervalStopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Not started; `remaining_ms` is what `start` will count down from.
    Idle { remaining_ms: i64 },
    Running { deadline_epoch_ms: i64 },
    Paused { remaining_ms: i64 },
    /// Stopped manually (e.g. on submit).
    Stopped,
    Expired,
}

pub struct ExamTimer {
    config: TimerConfig,
    /// Warning thresholds in minutes, largest first.
    thresholds: Vec<i64>,
    fired: BTreeSet<i64>,
    state: TimerState,
    last_persist_ms: i64,
    clock: Rc<dyn Clock>,
    store: Rc<dyn KeyValueStore>,
}

impl ExamTimer {
    #[must_use]
    pub fn new(config: TimerConfig, clock: Rc<dyn Clock>, store: Rc<dyn KeyValueStore>) -> Self {
        let mut thresholds: Vec<i64> = config.warning_minutes.iter().copied().filter(|m| *m > 0).collect();
        thresholds.sort_unstable_by(|a, b| b.cmp(a));
        thresholds.dedup();
        let remaining_ms = config.duration_ms.max(0);
        Self {
            config,
            thresholds,
            fired: BTreeSet::new(),
            state: TimerState::Idle { remaining_ms },
            last_persist_ms: 0,
            clock,
            store,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn state(&self) -> TimerState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    /// Time left, recomputed from the deadline while running.
    #[must_use]
    pub fn remaining_ms(&self) -> i64 {
        match self.state {
            TimerState::Idle { remaining_ms } | TimerState::Paused { remaining_ms } => remaining_ms,
            TimerState::Running { deadline_epoch_ms } => deadline_epoch_ms.saturating_sub(self.clock.now_ms()).max(0),
            TimerState::Stopped | TimerState::Expired => 0,
        }
    }

    #[must_use]
    pub fn status(&self) -> TimeStatus {
        if self.state == TimerState::Expired {
            return TimeStatus::Expired;
        }
        self.classify(self.remaining_ms())
    }

    /// Thresholds (minutes) already warned about, largest first.
    #[must_use]
    pub fn fired_warnings(&self) -> Vec<i64> {
        self.fired.iter().rev().copied().collect()
    }

    // --- Lifecycle ---

    /// Begin counting down. No-op while already running.
    pub fn start(&mut self) -> Vec<TimerEvent> {
        let remaining = match self.state {
            TimerState::Idle { remaining_ms } | TimerState::Paused { remaining_ms } => remaining_ms,
            TimerState::Running { .. } | TimerState::Stopped | TimerState::Expired => return Vec::new(),
        };
        self.run_from(remaining, "timer started")
    }

    /// Freeze the remaining time and stop the interval.
    pub fn pause(&mut self) -> Vec<TimerEvent> {
        if !self.is_running() {
            return Vec::new();
        }
        let remaining_ms = self.remaining_ms();
        self.state = TimerState::Paused { remaining_ms };
        self.persist();
        tracing::info!(remaining_ms, "timer paused");
        vec![TimerEvent::IntervalStopped]
    }

    /// Continue from a pause with a fresh deadline.
    pub fn resume(&mut self) -> Vec<TimerEvent> {
        match self.state {
            TimerState::Paused { remaining_ms } => self.run_from(remaining_ms, "timer resumed"),
            _ => Vec::new(),
        }
    }

    /// Stop without expiring and clear the persisted record.
    pub fn stop(&mut self) -> Vec<TimerEvent> {
        let was_running = self.is_running();
        match self.state {
            TimerState::Stopped | TimerState::Expired => return Vec::new(),
            _ => self.state = TimerState::Stopped,
        }
        self.store.remove(&self.config.storage_key);
        tracing::info!("timer stopped");
        if was_running { vec![TimerEvent::IntervalStopped] } else { Vec::new() }
    }

    /// Back to a fresh, idle countdown of the configured duration.
    pub fn reset(&mut self) -> Vec<TimerEvent> {
        let was_running = self.is_running();
        self.state = TimerState::Idle { remaining_ms: self.config.duration_ms.max(0) };
        self.fired.clear();
        self.store.remove(&self.config.storage_key);
        if was_running { vec![TimerEvent::IntervalStopped] } else { Vec::new() }
    }

    /// Jump to `ms` remaining (clamped at zero). Thresholds above the new
    /// value count as already warned about; the rest stay pending.
    pub fn set_remaining(&mut self, ms: i64) -> Vec<TimerEvent> {
        if matches!(self.state, TimerState::Stopped | TimerState::Expired) {
            return Vec::new();
        }
        let ms = ms.max(0);
        self.fired = self.thresholds.iter().copied().filter(|&m| threshold_ms(m) > ms).collect();
        match self.state {
            TimerState::Running { .. } => {
                self.state = TimerState::Running { deadline_epoch_ms: self.clock.now_ms().saturating_add(ms) };
                self.persist();
                self.tick()
            }
            TimerState::Idle { .. } => {
                self.state = TimerState::Idle { remaining_ms: ms };
                vec![self.tick_event(ms)]
            }
            TimerState::Paused { .. } => {
                self.state = TimerState::Paused { remaining_ms: ms };
                self.persist();
                vec![self.tick_event(ms)]
            }
            TimerState::Stopped | TimerState::Expired => Vec::new(),
        }
    }

    /// Resume from the persisted record, if any. Time that passed while the
    /// page was closed is subtracted; a deadline already gone expires at once.
    /// A record written while paused comes back paused with its frozen time.
    pub fn restore(&mut self) -> Vec<TimerEvent> {
        let Some(record) = store::load_json::<TimerRecord>(self.store.as_ref(), &self.config.storage_key) else {
            return Vec::new();
        };
        let now = self.clock.now_ms();
        self.config.duration_ms = record.duration_ms;
        self.fired = record.fired_warnings.iter().copied().collect();
        if let Some(remaining_ms) = record.paused_remaining_ms {
            let remaining_ms = remaining_ms.max(0);
            self.state = TimerState::Paused { remaining_ms };
            tracing::info!(remaining_ms, "timer restored paused");
            return vec![self.tick_event(remaining_ms)];
        }
        self.state = TimerState::Running { deadline_epoch_ms: record.deadline_epoch_ms };
        self.last_persist_ms = now;
        tracing::info!(remaining_ms = record.remaining_at(now), "timer restored");

        let mut events = vec![TimerEvent::IntervalStarted];
        events.extend(self.tick());
        events
    }

    // --- Time-driven ---

    /// Recompute from the deadline, fire newly crossed warnings, and expire
    /// at zero.
    pub fn tick(&mut self) -> Vec<TimerEvent> {
        let TimerState::Running { .. } = self.state else {
            return Vec::new();
        };
        let now = self.clock.now_ms();
        let remaining = self.remaining_ms();
        if remaining == 0 {
            return self.expire();
        }

        let mut events = vec![self.tick_event(remaining)];
        let crossed: Vec<i64> = self
            .thresholds
            .iter()
            .copied()
            .filter(|&m| !self.fired.contains(&m) && remaining <= threshold_ms(m))
            .collect();
        for minutes in &crossed {
            self.fired.insert(*minutes);
            tracing::info!(minutes, "timer warning");
            events.push(TimerEvent::Warning { minutes: *minutes });
        }

        if !crossed.is_empty() || now - self.last_persist_ms >= self.config.persist_interval_ms {
            self.persist();
        }
        events
    }

    /// The page became visible (or hidden). Visible re-checks immediately;
    /// hidden persists so a closed tab resumes accurately.
    pub fn on_visibility_change(&mut self, visible: bool) -> Vec<TimerEvent> {
        if visible {
            self.tick()
        } else {
            if self.is_running() {
                self.persist();
            }
            Vec::new()
        }
    }

    // --- Helpers ---

    fn run_from(&mut self, remaining_ms: i64, what: &'static str) -> Vec<TimerEvent> {
        self.state = TimerState::Running { deadline_epoch_ms: self.clock.now_ms().saturating_add(remaining_ms) };
        self.persist();
        tracing::info!(remaining_ms, "{what}");
        let mut events = vec![TimerEvent::IntervalStarted];
        events.extend(self.tick());
        events
    }

    fn expire(&mut self) -> Vec<TimerEvent> {
        self.state = TimerState::Expired;
        self.store.remove(&self.config.storage_key);
        tracing::info!("timer expired");
        vec![
            TimerEvent::Tick { remaining_ms: 0, status: TimeStatus::Expired },
            TimerEvent::IntervalStopped,
            TimerEvent::Expired,
        ]
    }

    fn persist(&mut self) -> bool {
        let now = self.clock.now_ms();
        let (deadline_epoch_ms, paused_remaining_ms) = match self.state {
            TimerState::Running { deadline_epoch_ms } => (deadline_epoch_ms, None),
            TimerState::Paused { remaining_ms } => (now.saturating_add(remaining_ms), Some(remaining_ms)),
            TimerState::Idle { .. } | TimerState::Stopped | TimerState::Expired => return false,
        };
        self.last_persist_ms = now;
        let record = TimerRecord {
            deadline_epoch_ms,
            fired_warnings: self.fired_warnings(),
            duration_ms: self.config.duration_ms,
            paused_remaining_ms,
        };
        store::save_json(self.store.as_ref(), &self.config.storage_key, &record)
    }

    fn tick_event(&self, remaining_ms: i64) -> TimerEvent {
        TimerEvent::Tick { remaining_ms, status: self.classify(remaining_ms) }
    }

    fn classify(&self, remaining_ms: i64) -> TimeStatus {
        if remaining_ms <= 0 {
            return TimeStatus::Expired;
        }
        match (self.thresholds.last(), self.thresholds.first()) {
            (Some(&smallest), _) if remaining_ms <= threshold_ms(smallest) => TimeStatus::Critical,
            (_, Some(&largest)) if remaining_ms <= threshold_ms(largest) => TimeStatus::Warning,
            _ => TimeStatus::Normal,
        }
    }
}

fn threshold_ms(minutes: i64) -> i64 {
    minutes.saturating_mul(MS_PER_MINUTE)
}
