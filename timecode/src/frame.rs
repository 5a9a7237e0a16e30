/*!
    Frame number type.
*/

use std::fmt;
use std::ops::{Add, Sub};

/**
    A frame index on some framerate's grid.

    Carries a `NONE` sentinel for "no frame value", mirroring timeline
    elements whose frame position has never been set. Valid frame numbers
    are non-negative; signed arithmetic is still useful for offsets.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameNumber(pub i64);

impl FrameNumber {
    /// Sentinel for "no frame value".
    pub const NONE: Self = Self(i64::MAX);

    pub const ZERO: Self = Self(0);

    /**
        True when this is a real frame value (non-negative and not `NONE`).
    */
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 >= 0 && self.0 != Self::NONE.0
    }

    /**
        True when this is the `NONE` sentinel.
    */
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == Self::NONE.0
    }

    /**
        Convert to `Option`, mapping `NONE` to `None`.
    */
    #[inline]
    pub const fn into_option(self) -> Option<Self> {
        if self.is_none() { None } else { Some(self) }
    }
}

impl Add<i64> for FrameNumber {
    type Output = Self;

    fn add(self, rhs: i64) -> Self {
        Self(self.0 + rhs)
    }
}

impl Sub<i64> for FrameNumber {
    type Output = Self;

    fn sub(self, rhs: i64) -> Self {
        Self(self.0 - rhs)
    }
}

impl Sub for FrameNumber {
    type Output = i64;

    /// Signed frame offset from `rhs` to `self`.
    fn sub(self, rhs: Self) -> i64 {
        self.0 - rhs.0
    }
}

impl From<i64> for FrameNumber {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("none")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity() {
        assert!(FrameNumber(0).is_valid());
        assert!(FrameNumber(25).is_valid());
        assert!(!FrameNumber(-1).is_valid());
        assert!(!FrameNumber::NONE.is_valid());
        assert!(FrameNumber::NONE.is_none());
    }

    #[test]
    fn option_conversion() {
        assert_eq!(FrameNumber::NONE.into_option(), None);
        assert_eq!(FrameNumber(5).into_option(), Some(FrameNumber(5)));
    }

    #[test]
    fn offsets() {
        assert_eq!(FrameNumber(10) - FrameNumber(3), 7);
        assert_eq!(FrameNumber(3) - FrameNumber(10), -7);
        assert_eq!(FrameNumber(10) + 5, FrameNumber(15));
        assert_eq!(FrameNumber(10) - 5, FrameNumber(5));
    }

    #[test]
    fn display() {
        assert_eq!(FrameNumber(25).to_string(), "25");
        assert_eq!(FrameNumber::NONE.to_string(), "none");
    }
}
