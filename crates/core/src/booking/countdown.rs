use std::fmt;

/// Total booking window: route minutes plus buffer, or the fallback when the
/// route duration is unknown.
pub fn booking_minutes(route_minutes: Option<u32>, buffer: u32, fallback: u32) -> u32 {
    match route_minutes {
        Some(minutes) => minutes.saturating_add(buffer),
        None => fallback,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hms {
    pub hours: u64,
    pub minutes: u8,
    pub seconds: u8,
}

impl Hms {
    pub fn from_seconds(total: u64) -> Self {
        Self {
            hours: total / 3600,
            minutes: ((total % 3600) / 60) as u8,
            seconds: (total % 60) as u8,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.hours * 3600 + self.minutes as u64 * 60 + self.seconds as u64
    }
}

impl fmt::Display for Hms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    Running(Hms),
    /// Reported exactly once, on the tick that would have gone below zero.
    Expired,
    /// Hidden, or already expired.
    Dormant,
}

/// One-second countdown for a booking window.
#[derive(Clone, Debug)]
pub struct Countdown {
    total_seconds: u64,
    remaining: u64,
    visible: bool,
    expired: bool,
}

impl Countdown {
    /// Starts hidden; call [`Countdown::set_visible`] to run it.
    pub fn new(total_minutes: u32) -> Self {
        let total_seconds = total_minutes as u64 * 60;
        Self {
            total_seconds,
            remaining: total_seconds,
            visible: false,
            expired: false,
        }
    }

    pub fn restart(&mut self, total_minutes: u32) {
        *self = Self {
            visible: self.visible,
            ..Self::new(total_minutes)
        };
    }

    pub fn set_visible(&mut self, visible: bool) {
        if !visible {
            self.remaining = self.total_seconds;
            self.expired = false;
        }
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn remaining(&self) -> Hms {
        Hms::from_seconds(self.remaining)
    }

    pub fn total(&self) -> Hms {
        Hms::from_seconds(self.total_seconds)
    }

    pub fn tick(&mut self) -> Tick {
        if !self.visible || self.expired {
            return Tick::Dormant;
        }

        if self.remaining == 0 {
            self.expired = true;
            return Tick::Expired;
        }

        self.remaining -= 1;
        Tick::Running(self.remaining())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(minutes: u32) -> Countdown {
        let mut countdown = Countdown::new(minutes);
        countdown.set_visible(true);
        countdown
    }

    #[test]
    fn test_booking_minutes() {
        assert_eq!(booking_minutes(Some(45), 30, 30), 75);
        assert_eq!(booking_minutes(None, 30, 30), 30);
        assert_eq!(booking_minutes(Some(0), 30, 30), 30);
    }

    #[test]
    fn test_initial_decomposition() {
        for minutes in [0, 1, 30, 59, 60, 75, 61 * 24] {
            let countdown = Countdown::new(minutes);
            let hms = countdown.remaining();
            assert_eq!(
                hms.hours * 3600 + hms.minutes as u64 * 60 + hms.seconds as u64,
                minutes as u64 * 60
            );
        }

        assert_eq!(Countdown::new(75).remaining().to_string(), "01:15:00");
        assert_eq!(Countdown::new(30).remaining().to_string(), "00:30:00");
    }

    #[test]
    fn test_ticks_decrement_by_one() {
        let mut countdown = running(2);
        for _ in 0..61 {
            assert!(matches!(countdown.tick(), Tick::Running(_)));
        }

        assert_eq!(countdown.remaining().total_seconds(), 120 - 61);
        assert_eq!(countdown.remaining().to_string(), "00:00:59");
    }

    #[test]
    fn test_expires_exactly_once() {
        let mut countdown = running(1);
        for _ in 0..60 {
            countdown.tick();
        }
        assert_eq!(countdown.remaining().to_string(), "00:00:00");

        assert_eq!(countdown.tick(), Tick::Expired);
        assert_eq!(countdown.tick(), Tick::Dormant);
        assert_eq!(countdown.tick(), Tick::Dormant);
        assert_eq!(countdown.remaining().total_seconds(), 0);
    }

    #[test]
    fn test_hidden_countdown_resets_and_sleeps() {
        let mut countdown = running(5);
        for _ in 0..10 {
            countdown.tick();
        }

        countdown.set_visible(false);
        assert_eq!(countdown.remaining(), countdown.total());
        for _ in 0..100 {
            assert_eq!(countdown.tick(), Tick::Dormant);
        }
        assert_eq!(countdown.remaining().to_string(), "00:05:00");
    }

    #[test]
    fn test_restart_reinitializes() {
        let mut countdown = running(5);
        countdown.tick();

        countdown.restart(75);
        assert!(countdown.is_visible());
        assert_eq!(countdown.remaining().to_string(), "01:15:00");
    }

    #[test]
    fn test_zero_minutes_expires_on_first_tick() {
        let mut countdown = running(0);
        assert_eq!(countdown.tick(), Tick::Expired);
    }
}
