//! Weekday bit set
//!
//! Bit `i` stands for weekday `i` counted from Monday, so Monday is bit 0 and
//! Sunday is bit 6.

use std::ops::BitOr;

use chrono::Weekday;

use super::error::ScheduleError;

/// Set of active weekdays for a recurring event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WeekdayMask(u8);

impl WeekdayMask {
    pub const MONDAY: Self = Self(1 << 0);
    pub const TUESDAY: Self = Self(1 << 1);
    pub const WEDNESDAY: Self = Self(1 << 2);
    pub const THURSDAY: Self = Self(1 << 3);
    pub const FRIDAY: Self = Self(1 << 4);
    pub const SATURDAY: Self = Self(1 << 5);
    pub const SUNDAY: Self = Self(1 << 6);
    pub const ALL: Self = Self(0x7f);

    pub const fn empty() -> Self {
        Self(0)
    }

    /// Parse a raw mask, rejecting bits above Sunday
    pub fn from_bits(bits: u32) -> Result<Self, ScheduleError> {
        if bits > u32::from(Self::ALL.0) {
            return Err(ScheduleError::InvalidWeekdayMask(bits));
        }
        Ok(Self(bits as u8))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & Self::from(day).0 != 0
    }

    pub fn with(self, day: Weekday) -> Self {
        self | Self::from(day)
    }
}

impl From<Weekday> for WeekdayMask {
    fn from(day: Weekday) -> Self {
        Self(1 << day.num_days_from_monday())
    }
}

impl BitOr for WeekdayMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl FromIterator<Weekday> for WeekdayMask {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}
