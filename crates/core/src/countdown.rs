//! Deterministic countdown state. The services layer drives it from a real clock.

/// Length of one exam sitting.
pub const EXAM_DURATION_SECS: u32 = 60 * 60;

/// Below this many seconds the countdown is shown as urgent.
pub const URGENT_BELOW_SECS: u32 = 60;

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Running { remaining_secs: u32 },
    /// Reached zero on this tick. Returned at most once per countdown.
    Expired,
    /// Already expired; the tick had no effect.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining_secs: u32,
    expired: bool,
}

impl Countdown {
    #[must_use]
    pub fn new(duration_secs: u32) -> Self {
        Self {
            remaining_secs: duration_secs,
            expired: false,
        }
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    #[must_use]
    pub fn is_urgent(&self) -> bool {
        is_urgent(self.remaining_secs)
    }

    /// Advance by one second.
    pub fn tick(&mut self) -> Tick {
        if self.expired {
            return Tick::Stopped;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.expired = true;
            Tick::Expired
        } else {
            Tick::Running {
                remaining_secs: self.remaining_secs,
            }
        }
    }
}

#[must_use]
pub fn is_urgent(remaining_secs: u32) -> bool {
    remaining_secs < URGENT_BELOW_SECS
}

/// `MM:SS`, with minutes allowed past 59 (a full exam starts at `60:00`).
#[must_use]
pub fn format_clock(remaining_secs: u32) -> String {
    format!("{:02}:{:02}", remaining_secs / 60, remaining_secs % 60)
}
