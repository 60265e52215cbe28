//! Opening hours parsed from a station's `openTime` text.
//!
//! Accepted shapes:
//! - `"Monday, 10:00 - 21:00"` (a single day)
//! - `"Monday - Friday, 08:00 - 22:00"` (an inclusive, possibly wrapping, day range)
//! - `"Daily, 06:00 - 23:00"` / `"Everyday, ..."`
//! - `"24/7"`
//!
//! A closing time at or before the opening time means the window runs past midnight.

use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike, Weekday};

/// Compact representation of which weekdays a station opens
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeekdayFlags {
    pub(crate) flags: u8,
}

impl WeekdayFlags {
    pub const ALL: WeekdayFlags = WeekdayFlags { flags: 0b1111_1110 };

    pub fn new() -> Self {
        Self { flags: 0 }
    }

    pub fn set(&mut self, weekday: Weekday) {
        self.flags |= 1 << weekday.number_from_monday();
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        (self.flags & (1 << weekday.number_from_monday())) != 0
    }

    /// Inclusive range, wrapping over Sunday when `last` precedes `first`
    pub fn from_range(first: Weekday, last: Weekday) -> Self {
        let mut flags = Self::new();
        let mut day = first;
        loop {
            flags.set(day);
            if day == last {
                break;
            }
            day = day.succ();
        }
        flags
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpeningHours {
    pub weekdays: WeekdayFlags,
    pub opens: NaiveTime,
    pub closes: NaiveTime,
}

impl OpeningHours {
    pub fn always() -> Self {
        Self {
            weekdays: WeekdayFlags::ALL,
            opens: NaiveTime::MIN,
            closes: NaiveTime::MIN,
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text == "24/7" {
            return Some(Self::always());
        }

        let (days, times) = text.split_once(',')?;
        let weekdays = parse_days(days.trim())?;

        let (opens, closes) = times.split_once('-')?;
        let opens = NaiveTime::parse_from_str(opens.trim(), "%H:%M").ok()?;
        let closes = NaiveTime::parse_from_str(closes.trim(), "%H:%M").ok()?;

        Some(Self {
            weekdays,
            opens,
            closes,
        })
    }

    pub fn runs_overnight(&self) -> bool {
        self.closes <= self.opens
    }

    pub fn is_open_at(&self, at: NaiveDateTime) -> bool {
        let time = at.time().with_nanosecond(0).unwrap_or(at.time());
        let today = at.weekday();

        if !self.runs_overnight() {
            return self.weekdays.contains(today) && time >= self.opens && time < self.closes;
        }

        // Either inside today's window, or in the tail of yesterday's.
        (self.weekdays.contains(today) && time >= self.opens)
            || (self.weekdays.contains(today.pred()) && time < self.closes)
    }
}

fn parse_days(days: &str) -> Option<WeekdayFlags> {
    let lowered = days.to_ascii_lowercase();
    if matches!(lowered.as_str(), "daily" | "everyday" | "every day") {
        return Some(WeekdayFlags::ALL);
    }

    match days.split_once('-') {
        Some((first, last)) => Some(WeekdayFlags::from_range(
            first.trim().parse().ok()?,
            last.trim().parse().ok()?,
        )),
        None => {
            let mut flags = WeekdayFlags::new();
            flags.set(days.parse().ok()?);
            Some(flags)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_weekday_range_wraps() {
        let flags = WeekdayFlags::from_range(Weekday::Sat, Weekday::Mon);
        assert!(flags.contains(Weekday::Sat));
        assert!(flags.contains(Weekday::Sun));
        assert!(flags.contains(Weekday::Mon));
        assert!(!flags.contains(Weekday::Tue));
    }

    #[test]
    fn test_single_day() {
        let hours = OpeningHours::parse("Monday, 10:00 - 21:00").unwrap();

        // 2024-01-01 is a Monday
        assert!(hours.is_open_at(at(2024, 1, 1, 10, 0)));
        assert!(!hours.is_open_at(at(2024, 1, 1, 21, 0)));
        assert!(!hours.is_open_at(at(2024, 1, 2, 12, 0)));
    }

    #[test]
    fn test_day_range() {
        let hours = OpeningHours::parse("Mon - Fri, 08:00 - 22:00").unwrap();

        assert!(hours.is_open_at(at(2024, 1, 5, 9, 30))); // Friday
        assert!(!hours.is_open_at(at(2024, 1, 6, 9, 30))); // Saturday
    }

    #[test]
    fn test_overnight_window() {
        let hours = OpeningHours::parse("Daily, 22:00 - 02:00").unwrap();

        assert!(hours.runs_overnight());
        assert!(hours.is_open_at(at(2024, 1, 1, 23, 0)));
        assert!(hours.is_open_at(at(2024, 1, 2, 1, 59)));
        assert!(!hours.is_open_at(at(2024, 1, 2, 2, 0)));
        assert!(!hours.is_open_at(at(2024, 1, 2, 12, 0)));
    }

    #[test]
    fn test_always_open() {
        let hours = OpeningHours::parse("24/7").unwrap();
        assert!(hours.is_open_at(at(2024, 3, 3, 4, 4)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(OpeningHours::parse("soon"), None);
        assert_eq!(OpeningHours::parse("Funday, 10:00 - 11:00"), None);
        assert_eq!(OpeningHours::parse("Monday, ten - eleven"), None);
    }
}
