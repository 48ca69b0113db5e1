//! Event schedules and voting windows
//!
//! An event is either a one-off occurrence at an absolute time, or a weekly
//! recurrence on a set of weekdays at a fixed time of day. Both are expressed
//! in UTC. Location votes are accepted during a window that closes at the
//! occurrence and opens `voting_window` seconds before it.
//!
//! ```text
//!              voting_window
//!        |<----------------------->|
//!   -----[=========================]--------> time
//!     window.begin            window.end (occurrence)
//! ```

pub mod error;
pub mod weekdays;
pub mod window;

pub use error::ScheduleError;
pub use weekdays::WeekdayMask;
pub use window::{compute_window, VoteWindow};

/// Seconds in one UTC day
pub const SECONDS_PER_DAY: i64 = 86_400;

/// How an event occurs in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    /// Single occurrence at an absolute timestamp (seconds since epoch)
    OneOff { start: i64 },
    /// Weekly recurrence on the given weekdays at `day_time_utc` seconds past midnight UTC
    Weekly {
        weekdays: WeekdayMask,
        day_time_utc: u32,
    },
}

/// Validated event schedule
///
/// Construction rejects negative voting windows, out-of-range times of day and
/// ambiguous records, so every value of this type is a well-formed schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSchedule {
    occurrence: Occurrence,
    voting_window: u32,
}

impl EventSchedule {
    /// Create a schedule for a single occurrence
    pub fn one_off(start: i64, voting_window_secs: i64) -> Result<Self, ScheduleError> {
        Ok(Self {
            occurrence: Occurrence::OneOff { start },
            voting_window: validate_voting_window(voting_window_secs)?,
        })
    }

    /// Create a weekly recurring schedule
    pub fn weekly(
        weekdays: WeekdayMask,
        day_time_utc: i64,
        voting_window_secs: i64,
    ) -> Result<Self, ScheduleError> {
        if weekdays.is_empty() {
            return Err(ScheduleError::EmptyWeekdays);
        }
        if !(0..SECONDS_PER_DAY).contains(&day_time_utc) {
            return Err(ScheduleError::DayTimeOutOfRange(day_time_utc));
        }

        Ok(Self {
            occurrence: Occurrence::Weekly {
                weekdays,
                day_time_utc: day_time_utc as u32,
            },
            voting_window: validate_voting_window(voting_window_secs)?,
        })
    }

    /// Build a schedule from the raw fields of a persisted event record
    ///
    /// A non-zero weekday mask selects the weekly form; otherwise the one-off
    /// start must be present. Records carrying both are rejected.
    pub fn from_record(
        one_off_start: Option<i64>,
        repeat_week_days: u32,
        repeat_day_time_utc: i64,
        voting_window_secs: i64,
    ) -> Result<Self, ScheduleError> {
        match (repeat_week_days, one_off_start) {
            (0, Some(start)) => Self::one_off(start, voting_window_secs),
            (0, None) => Err(ScheduleError::MissingStart),
            (_, Some(_)) => Err(ScheduleError::Ambiguous),
            (bits, None) => Self::weekly(
                WeekdayMask::from_bits(bits)?,
                repeat_day_time_utc,
                voting_window_secs,
            ),
        }
    }

    pub fn occurrence(&self) -> Occurrence {
        self.occurrence
    }

    /// Length of the voting window in seconds
    pub fn voting_window(&self) -> i64 {
        i64::from(self.voting_window)
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self.occurrence, Occurrence::Weekly { .. })
    }
}

fn validate_voting_window(secs: i64) -> Result<u32, ScheduleError> {
    if secs < 0 {
        return Err(ScheduleError::NegativeVotingWindow(secs));
    }
    u32::try_from(secs).map_err(|_| ScheduleError::VotingWindowTooLarge(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_voting_window_rejected() {
        let result = EventSchedule::one_off(1_000, -1);
        assert_eq!(result, Err(ScheduleError::NegativeVotingWindow(-1)));

        let result = EventSchedule::weekly(WeekdayMask::MONDAY, 3600, -60);
        assert_eq!(result, Err(ScheduleError::NegativeVotingWindow(-60)));
    }

    #[test]
    fn test_weekly_requires_weekdays() {
        let result = EventSchedule::weekly(WeekdayMask::empty(), 3600, 60);
        assert_eq!(result, Err(ScheduleError::EmptyWeekdays));
    }

    #[test]
    fn test_day_time_range() {
        assert!(EventSchedule::weekly(WeekdayMask::FRIDAY, 0, 60).is_ok());
        assert!(EventSchedule::weekly(WeekdayMask::FRIDAY, SECONDS_PER_DAY - 1, 60).is_ok());
        assert_eq!(
            EventSchedule::weekly(WeekdayMask::FRIDAY, SECONDS_PER_DAY, 60),
            Err(ScheduleError::DayTimeOutOfRange(SECONDS_PER_DAY))
        );
    }

    #[test]
    fn test_from_record() {
        let one_off = EventSchedule::from_record(Some(5_000), 0, 0, 600).unwrap();
        assert_eq!(one_off.occurrence(), Occurrence::OneOff { start: 5_000 });
        assert!(!one_off.is_recurring());

        let weekly = EventSchedule::from_record(None, 0b0000100, 64_800, 3_600).unwrap();
        assert!(weekly.is_recurring());
        assert_eq!(weekly.voting_window(), 3_600);

        assert_eq!(
            EventSchedule::from_record(None, 0, 0, 600),
            Err(ScheduleError::MissingStart)
        );
        assert_eq!(
            EventSchedule::from_record(Some(5_000), 1, 0, 600),
            Err(ScheduleError::Ambiguous)
        );
        assert_eq!(
            EventSchedule::from_record(None, 0x80, 0, 600),
            Err(ScheduleError::InvalidWeekdayMask(0x80))
        );
    }
}
