//! Voting window computation

use chrono::{DateTime, Datelike};

use super::{EventSchedule, Occurrence, SECONDS_PER_DAY};

/// Closed interval `[begin, end]` in seconds since epoch during which votes are accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoteWindow {
    pub begin: i64,
    pub end: i64,
}

impl VoteWindow {
    pub fn new(begin: i64, end: i64) -> Self {
        Self { begin, end }
    }

    pub fn contains(&self, now: i64) -> bool {
        self.begin <= now && now <= self.end
    }

    /// Check whether this window lies entirely within `[begin, end]`
    pub fn within(&self, begin: i64, end: i64) -> bool {
        self.begin >= begin && self.end <= end
    }
}

impl std::fmt::Display for VoteWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.begin, self.end)
    }
}

/// Compute the voting window that is open at `now`
///
/// Returns `None` when the event does not accept votes at `now`: either a
/// recurring event is not scheduled on the current UTC weekday, `now` lies
/// outside the window, or the window would open before the earliest
/// representable timestamp.
pub fn compute_window(schedule: &EventSchedule, now: i64) -> Option<VoteWindow> {
    let end = match schedule.occurrence() {
        Occurrence::OneOff { start } => start,
        Occurrence::Weekly {
            weekdays,
            day_time_utc,
        } => {
            let today = DateTime::from_timestamp(now, 0)?.weekday();
            if !weekdays.contains(today) {
                return None;
            }
            let midnight = now.div_euclid(SECONDS_PER_DAY) * SECONDS_PER_DAY;
            midnight + i64::from(day_time_utc)
        }
    };

    let begin = end.checked_sub(schedule.voting_window())?;
    let window = VoteWindow::new(begin, end);
    window.contains(now).then_some(window)
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, TimeZone, Utc, Weekday};

    use super::*;
    use crate::schedule::WeekdayMask;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap().timestamp()
    }

    #[test]
    fn test_wednesday_evening_scenario() {
        // 2024-01-03 is a Wednesday
        let schedule = EventSchedule::weekly(WeekdayMask::WEDNESDAY, 64_800, 3_600).unwrap();

        let window = compute_window(&schedule, utc(2024, 1, 3, 17, 30)).unwrap();
        assert_eq!(window.end, utc(2024, 1, 3, 18, 0));
        assert_eq!(window.begin, utc(2024, 1, 3, 17, 0));

        assert_eq!(compute_window(&schedule, utc(2024, 1, 3, 19, 0)), None);
    }

    #[test]
    fn test_inactive_weekdays_never_votable() {
        let schedule = EventSchedule::weekly(WeekdayMask::WEDNESDAY, 64_800, 3_600).unwrap();

        // 2024-01-01 (Monday) through 2024-01-07 (Sunday), all at 17:30
        for day in 1..=7 {
            let now = utc(2024, 1, day, 17, 30);
            let weekday = Utc.timestamp_opt(now, 0).unwrap().weekday();
            let result = compute_window(&schedule, now);
            if weekday == Weekday::Wed {
                assert!(result.is_some());
            } else {
                assert_eq!(result, None, "{:?} must not be votable", weekday);
            }
        }
    }

    #[test]
    fn test_active_day_before_window_opens() {
        let schedule = EventSchedule::weekly(WeekdayMask::ALL, 64_800, 3_600).unwrap();

        assert_eq!(compute_window(&schedule, utc(2024, 1, 3, 16, 59)), None);
        assert!(compute_window(&schedule, utc(2024, 1, 3, 17, 0)).is_some());
        assert!(compute_window(&schedule, utc(2024, 1, 3, 18, 0)).is_some());
    }

    #[test]
    fn test_weekday_uses_utc_midnight() {
        // 23:30 UTC Wednesday is still Wednesday regardless of local time zone
        let schedule = EventSchedule::weekly(WeekdayMask::WEDNESDAY, 86_399, 3_600).unwrap();
        assert!(compute_window(&schedule, utc(2024, 1, 3, 23, 30)).is_some());

        let thursday_only = EventSchedule::weekly(WeekdayMask::THURSDAY, 86_399, 3_600).unwrap();
        assert_eq!(compute_window(&thursday_only, utc(2024, 1, 3, 23, 30)), None);
    }

    #[test]
    fn test_one_off_window() {
        let start = utc(2024, 6, 1, 12, 0);
        let schedule = EventSchedule::one_off(start, 7_200).unwrap();

        let window = compute_window(&schedule, start - 60).unwrap();
        assert_eq!(window.end, start);
        assert_eq!(window.begin, start - 7_200);

        assert_eq!(compute_window(&schedule, start - 7_201), None);
        assert_eq!(compute_window(&schedule, start + 1), None);
    }

    #[test]
    fn test_one_off_window_arithmetic_is_exact() {
        for (start, duration) in [(0_i64, 0_i64), (1_000, 1), (1_700_000_000, 86_400)] {
            let schedule = EventSchedule::one_off(start, duration).unwrap();
            let window = compute_window(&schedule, start).unwrap();
            assert_eq!(window.end, start);
            assert_eq!(window.begin, start - duration);
        }
    }

    #[test]
    fn test_zero_duration_is_single_instant() {
        let start = utc(2024, 6, 1, 12, 0);
        let schedule = EventSchedule::one_off(start, 0).unwrap();

        let window = compute_window(&schedule, start).unwrap();
        assert_eq!(window.begin, window.end);
        assert_eq!(compute_window(&schedule, start - 1), None);
        assert_eq!(compute_window(&schedule, start + 1), None);
    }

    #[test]
    fn test_window_below_timestamp_range() {
        let schedule = EventSchedule::one_off(i64::MIN, 1).unwrap();
        assert_eq!(compute_window(&schedule, 0), None);
        assert_eq!(compute_window(&schedule, i64::MIN), None);

        // The earliest window that still fits
        let schedule = EventSchedule::one_off(i64::MIN + 1, 1).unwrap();
        assert_eq!(
            compute_window(&schedule, i64::MIN),
            Some(VoteWindow::new(i64::MIN, i64::MIN + 1))
        );
    }
}
