/*!
    Clock time in nanoseconds.
*/

use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use static_assertions::assert_impl_all;

/**
    Signed difference between two clock times, in nanoseconds.
*/
pub type ClockTimeDiff = i64;

/**
    A position or duration on the timeline clock, in nanoseconds.

    Positions are unsigned; use [`ClockTimeDiff`] for signed offsets
    between positions.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(pub u64);

assert_impl_all!(ClockTime: Send, Sync);

impl ClockTime {
    pub const ZERO: Self = Self(0);

    /// One microsecond.
    pub const USECOND: Self = Self(1_000);

    /// One millisecond.
    pub const MSECOND: Self = Self(1_000_000);

    /// One second.
    pub const SECOND: Self = Self(1_000_000_000);

    /**
        The 24-hour daily limit. Timecode conversions reject positions at
        or past this point.
    */
    pub const DAILY_LIMIT: Self = Self(24 * 60 * 60 * Self::SECOND.0);

    /**
        Create a clock time from whole seconds.
    */
    #[inline]
    pub const fn from_seconds(seconds: u64) -> Self {
        Self(seconds * Self::SECOND.0)
    }

    /**
        Nanosecond value.
    */
    #[inline]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /**
        Signed offset from `other` to `self`, in nanoseconds.
    */
    #[inline]
    pub const fn diff(self, other: Self) -> ClockTimeDiff {
        self.0 as i64 - other.0 as i64
    }

    /**
        Apply a signed offset, failing on underflow or overflow.
    */
    #[inline]
    pub const fn checked_add_diff(self, diff: ClockTimeDiff) -> Option<Self> {
        if diff >= 0 {
            match self.0.checked_add(diff as u64) {
                Some(v) => Some(Self(v)),
                None => None,
            }
        } else {
            match self.0.checked_sub(diff.unsigned_abs()) {
                Some(v) => Some(Self(v)),
                None => None,
            }
        }
    }

    /**
        Saturating addition.
    */
    #[inline]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /**
        Saturating subtraction, clamping at zero.
    */
    #[inline]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /**
        Absolute distance to another clock time.
    */
    #[inline]
    pub const fn abs_diff(self, other: Self) -> Self {
        Self(self.0.abs_diff(other.0))
    }
}

impl Add for ClockTime {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for ClockTime {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for ClockTime {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for ClockTime {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl From<u64> for ClockTime {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<ClockTime> for u64 {
    fn from(time: ClockTime) -> Self {
        time.0
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0 / Self::SECOND.0;
        let nanos = self.0 % Self::SECOND.0;
        let (h, m, s) = (secs / 3600, (secs / 60) % 60, secs % 60);
        write!(f, "{h}:{m:02}:{s:02}.{nanos:09}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants() {
        assert_eq!(ClockTime::SECOND.0, 1_000_000_000);
        assert_eq!(ClockTime::DAILY_LIMIT.0, 86_400_000_000_000);
        assert_eq!(ClockTime::from_seconds(2), ClockTime(2_000_000_000));
    }

    #[test]
    fn signed_diff() {
        let a = ClockTime(100);
        let b = ClockTime(250);
        assert_eq!(b.diff(a), 150);
        assert_eq!(a.diff(b), -150);
    }

    #[test]
    fn checked_add_diff() {
        let t = ClockTime(1_000);
        assert_eq!(t.checked_add_diff(500), Some(ClockTime(1_500)));
        assert_eq!(t.checked_add_diff(-1_000), Some(ClockTime::ZERO));
        assert_eq!(t.checked_add_diff(-1_001), None);
    }

    #[test]
    fn saturating_ops() {
        let t = ClockTime(10);
        assert_eq!(t.saturating_sub(ClockTime(20)), ClockTime::ZERO);
        assert_eq!(ClockTime(u64::MAX).saturating_add(t), ClockTime(u64::MAX));
    }

    #[test]
    fn display_format() {
        assert_eq!(ClockTime::ZERO.to_string(), "0:00:00.000000000");
        assert_eq!(ClockTime(834_166_666).to_string(), "0:00:00.834166666");
        assert_eq!(
            ClockTime::from_seconds(3_661).to_string(),
            "1:01:01.000000000"
        );
    }

    #[test]
    fn ordering() {
        assert!(ClockTime(100) < ClockTime(200));
        assert_eq!(ClockTime(100).abs_diff(ClockTime(130)), ClockTime(30));
    }
}
