//! Simulation-time timers
//!
//! Everything runs on simulation milliseconds advanced by `tick`, never on
//! wall-clock time. Timers live inside the session that owns them, so
//! dropping the session cancels them.

/// Minimum delay, guards against a zero-delay repeating timer spinning forever
const MIN_DELAY_MS: f64 = 1.0;

/// Repeating countdown
#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    delay_ms: f64,
    elapsed_ms: f64,
    paused: bool,
}

impl Timer {
    pub fn repeating(delay_ms: f64) -> Self {
        Self {
            delay_ms: delay_ms.max(MIN_DELAY_MS),
            elapsed_ms: 0.0,
            paused: false,
        }
    }

    /// Advance by `dt_ms`, returning how many times the timer fired
    pub fn advance(&mut self, dt_ms: f64) -> u32 {
        if self.paused {
            return 0;
        }
        self.elapsed_ms += dt_ms;
        let mut fires = 0;
        while self.elapsed_ms >= self.delay_ms {
            self.elapsed_ms -= self.delay_ms;
            fires += 1;
        }
        fires
    }

    /// Change the period. Progress carries over but never past one full
    /// period, so a shorter delay fires at most once on the next advance.
    pub fn set_delay(&mut self, delay_ms: f64) {
        self.delay_ms = delay_ms.max(MIN_DELAY_MS);
        self.elapsed_ms = self.elapsed_ms.min(self.delay_ms);
    }

    pub fn delay(&self) -> f64 {
        self.delay_ms
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Restart the countdown from zero
    pub fn restart(&mut self) {
        self.elapsed_ms = 0.0;
    }
}

/// A one-shot action due at a simulation time
#[derive(Debug, Clone, PartialEq)]
struct Scheduled<T> {
    due_ms: f64,
    action: T,
}

/// Queue of delayed one-shot actions
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule<T> {
    pending: Vec<Scheduled<T>>,
}

impl<T> Default for Schedule<T> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<T> Schedule<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now_ms: f64, delay_ms: f64, action: T) {
        self.pending.push(Scheduled {
            due_ms: now_ms + delay_ms,
            action,
        });
    }

    /// Remove and return every action due at `now_ms`, earliest first.
    /// Actions due at the same time keep scheduling order.
    pub fn take_due(&mut self, now_ms: f64) -> Vec<T> {
        let (mut due, pending): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|s| s.due_ms <= now_ms);
        self.pending = pending;
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms));
        due.into_iter().map(|s| s.action).collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeating_timer() {
        let mut timer = Timer::repeating(1000.0);
        assert_eq!(timer.advance(999.0), 0);
        assert_eq!(timer.advance(1.0), 1);
        assert_eq!(timer.advance(2500.0), 2);
        assert_eq!(timer.advance(499.0), 0);
        assert_eq!(timer.advance(1.0), 1);
        timer.restart();
        assert_eq!(timer.advance(999.0), 0);
    }

    #[test]
    fn test_pause_and_set_delay() {
        let mut timer = Timer::repeating(700.0);
        timer.advance(250.0);
        timer.pause();
        assert_eq!(timer.advance(10_000.0), 0);
        timer.resume();
        timer.set_delay(300.0);
        assert_eq!(timer.advance(50.0), 1);
    }

    #[test]
    fn test_shorter_delay_fires_once() {
        let mut timer = Timer::repeating(700.0);
        assert_eq!(timer.advance(650.0), 0);
        timer.set_delay(300.0);
        assert_eq!(timer.advance(16.0), 1);
        assert_eq!(timer.advance(283.0), 0);
        assert_eq!(timer.advance(1.0), 1);
    }

    #[test]
    fn test_zero_delay_is_clamped() {
        let mut timer = Timer::repeating(0.0);
        assert_eq!(timer.advance(3.0), 3);
    }

    #[test]
    fn test_schedule_order() {
        let mut schedule = Schedule::new();
        schedule.schedule(0.0, 500.0, "b");
        schedule.schedule(0.0, 200.0, "a");
        schedule.schedule(0.0, 500.0, "c");
        schedule.schedule(0.0, 1000.0, "d");
        assert!(schedule.take_due(100.0).is_empty());
        assert_eq!(schedule.take_due(600.0), vec!["a", "b", "c"]);
        assert_eq!(schedule.len(), 1);
        schedule.clear();
        assert!(schedule.is_empty());
    }
}
