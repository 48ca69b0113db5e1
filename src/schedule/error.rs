//! Schedule validation errors

/// Error type for schedule construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Voting window duration below zero
    NegativeVotingWindow(i64),
    /// Voting window duration does not fit in 32 bits
    VotingWindowTooLarge(i64),
    /// Weekday mask uses bits beyond Sunday
    InvalidWeekdayMask(u32),
    /// Weekly schedule with no active weekday
    EmptyWeekdays,
    /// Time of day outside `[0, 86400)`
    DayTimeOutOfRange(i64),
    /// Non-recurring record without a start time
    MissingStart,
    /// Record is both recurring and one-off
    Ambiguous,
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleError::NegativeVotingWindow(secs) => {
                write!(f, "Voting window must not be negative: {}s", secs)
            }
            ScheduleError::VotingWindowTooLarge(secs) => {
                write!(f, "Voting window too large: {}s", secs)
            }
            ScheduleError::InvalidWeekdayMask(bits) => {
                write!(f, "Invalid weekday mask: {:#x}", bits)
            }
            ScheduleError::EmptyWeekdays => write!(f, "Weekly schedule has no weekdays"),
            ScheduleError::DayTimeOutOfRange(secs) => {
                write!(f, "Time of day out of range: {}s", secs)
            }
            ScheduleError::MissingStart => write!(f, "One-off schedule without start time"),
            ScheduleError::Ambiguous => {
                write!(f, "Schedule is both recurring and one-off")
            }
        }
    }
}

impl std::error::Error for ScheduleError {}
