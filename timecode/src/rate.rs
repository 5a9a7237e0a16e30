/*!
    Rational framerate type.
*/

use std::fmt;
use std::str::FromStr;

use crate::ParseError;

/**
    A framerate represented as a rational number.

    Broadcast rates are rarely integral (NTSC material runs at 30000/1001,
    29.97 fps, or 24000/1001, 23.976 fps), so framerates are kept as exact
    fractions and never collapsed to floats in conversions.
*/
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Framerate {
    pub num: i32,
    pub den: i32,
}

impl Framerate {
    /**
        Create a new framerate.

        # Panics

        Panics if `den` is zero.
    */
    #[inline]
    pub const fn new(num: i32, den: i32) -> Self {
        assert!(den != 0, "denominator cannot be zero");
        Self { num, den }
    }

    /**
        True when both numerator and denominator are positive.
    */
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.num > 0 && self.den > 0
    }

    /**
        Convert to f64.
    */
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl fmt::Debug for Framerate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl fmt::Display for Framerate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl From<(i32, i32)> for Framerate {
    fn from((num, den): (i32, i32)) -> Self {
        Self::new(num, den)
    }
}

impl From<i32> for Framerate {
    fn from(num: i32) -> Self {
        Self::new(num, 1)
    }
}

impl FromStr for Framerate {
    type Err = ParseError;

    /**
        Parse `"num/den"` or a bare integer (`"25"` means 25/1).
    */
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseError {
            kind: "framerate",
            value: s.to_owned(),
        };
        let (num, den) = match s.split_once('/') {
            Some((n, d)) => (
                n.trim().parse().map_err(|_| err())?,
                d.trim().parse().map_err(|_| err())?,
            ),
            None => (s.trim().parse().map_err(|_| err())?, 1),
        };
        if den == 0 {
            return Err(err());
        }
        Ok(Self { num, den })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_framerate() {
        let r = Framerate::new(30000, 1001);
        assert_eq!(r.num, 30000);
        assert_eq!(r.den, 1001);
        assert!(r.is_valid());
    }

    #[test]
    #[should_panic(expected = "denominator cannot be zero")]
    fn zero_denominator_panics() {
        Framerate::new(30, 0);
    }

    #[test]
    fn validity() {
        assert!(Framerate::new(25, 1).is_valid());
        assert!(!Framerate::new(0, 1).is_valid());
        assert!(!Framerate::new(-30, 1).is_valid());
        assert!(!Framerate::new(30, -1).is_valid());
    }

    #[test]
    fn from_str_fraction() {
        assert_eq!("30000/1001".parse::<Framerate>().unwrap(), Framerate::new(30000, 1001));
        assert_eq!("30/1".parse::<Framerate>().unwrap(), Framerate::new(30, 1));
    }

    #[test]
    fn from_str_bare_integer() {
        assert_eq!("25".parse::<Framerate>().unwrap(), Framerate::new(25, 1));
    }

    #[test]
    fn from_str_rejects_garbage() {
        assert!("abc".parse::<Framerate>().is_err());
        assert!("30/0".parse::<Framerate>().is_err());
        assert!("30/".parse::<Framerate>().is_err());
    }

    #[test]
    fn display() {
        assert_eq!(Framerate::new(24000, 1001).to_string(), "24000/1001");
    }

    #[test]
    fn to_f64_conversion() {
        assert_eq!(Framerate::new(1, 2).to_f64(), 0.5);
        assert_eq!(Framerate::new(30000, 1001).to_f64(), 30000.0 / 1001.0);
    }
}
