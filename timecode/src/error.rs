/*!
    Error types for the cutline timing vocabulary.
*/

use std::fmt;

use crate::{ClockTime, FrameNumber, Framerate};

/**
    Error type for timecode conversions.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Framerate with a non-positive numerator or denominator.
    InvalidFramerate(Framerate),
    /// Frame number that is negative or the `NONE` sentinel.
    InvalidFrame(FrameNumber),
    /// Position at or past the 24-hour daily limit.
    PastDailyLimit(ClockTime),
    /// Strict conversion of a time that is not on a frame boundary.
    NotOnFrameBoundary(ClockTime),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFramerate(rate) => write!(f, "invalid framerate: {rate}"),
            Self::InvalidFrame(frame) => write!(f, "invalid frame number: {frame}"),
            Self::PastDailyLimit(time) => {
                write!(f, "position {time} is at or past the 24-hour limit")
            }
            Self::NotOnFrameBoundary(time) => {
                write!(f, "position {time} is not on a frame boundary")
            }
        }
    }
}

impl std::error::Error for Error {}

/**
    Result type alias for timecode conversions.
*/
pub type Result<T> = std::result::Result<T, Error>;

/**
    Error returned when parsing a named value fails.

    Used by `FromStr` impls across the ecosystem for enum-like types
    with a fixed set of names.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for ParseError {}
