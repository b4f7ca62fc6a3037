use std::fmt;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Countdown {
    pub fn from_seconds(seconds_left: i64) -> Self {
        Self {
            seconds: seconds_left % 60,
            minutes: (seconds_left / 60) % 60,
            hours: (seconds_left / 3600) % 24,
            days: seconds_left / 86400,
        }
    }

    pub fn total_seconds(&self) -> i64 {
        self.days * 86400 + self.hours * 3600 + self.minutes * 60 + self.seconds
    }

    /// `m:ss`, `h:mm:ss` or `d:h:mm:ss`. Seconds are always two digits;
    /// minutes only when a larger unit is shown.
    pub fn display(&self) -> String {
        if self.days > 0 {
            format!(
                "{}:{}:{:02}:{:02}",
                self.days, self.hours, self.minutes, self.seconds
            )
        } else if self.hours > 0 {
            format!("{}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
        } else {
            format!("{}:{:02}", self.minutes, self.seconds)
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartTimer {
    /// No cart is being held, or the event has no cart timeout.
    Inactive,
    Running(Countdown),
    Expired,
}

impl CartTimer {
    pub fn countdown(&self) -> Option<Countdown> {
        match self {
            CartTimer::Running(countdown) => Some(*countdown),
            _ => None,
        }
    }
}

pub fn cart_timer(
    cart_start_time: Option<DateTime<Utc>>,
    cart_timeout_minutes: Option<u32>,
    now: DateTime<Utc>,
) -> CartTimer {
    let (Some(started), Some(timeout)) = (cart_start_time, cart_timeout_minutes) else {
        return CartTimer::Inactive;
    };
    if timeout == 0 {
        return CartTimer::Inactive;
    }

    let elapsed_ms = (now - started).num_milliseconds();
    let remaining_ms = i64::from(timeout) * 60 * 1000 - elapsed_ms;
    if remaining_ms < 0 {
        return CartTimer::Expired;
    }

    CartTimer::Running(Countdown::from_seconds(remaining_ms / 1000))
}

#[cfg(test)]
#[path = "tests/countdown_tests.rs"]
mod tests;
