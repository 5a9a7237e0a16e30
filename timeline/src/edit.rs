use core::fmt;
use core::str::FromStr;

use timecode_types::{ClockTime, ParseError};

/**
    How an edit repositions clips around the edited one.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditMode {
    /// Move the edited clip, leaving every other clip in place.
    Normal,
    /// Change one edge of the edited clip, adjusting its in-point or
    /// duration.
    Trim,
    /// Move the edited clip and every clip starting at or after it by the
    /// same amount.
    Ripple,
    /// Trim one edge of the edited clip and the matching edge of each
    /// neighbour sharing that boundary.
    Roll,
    /// Not supported.
    Slide,
}

impl EditMode {
    pub const fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"normal" => Some(Self::Normal),
            b"trim" => Some(Self::Trim),
            b"ripple" => Some(Self::Ripple),
            b"roll" => Some(Self::Roll),
            b"slide" => Some(Self::Slide),
            _ => None,
        }
    }

    pub const fn to_name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Trim => "trim",
            Self::Ripple => "ripple",
            Self::Roll => "roll",
            Self::Slide => "slide",
        }
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

impl FromStr for EditMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s.as_bytes()).ok_or_else(|| ParseError {
            kind: "edit mode",
            value: s.to_owned(),
        })
    }
}

/**
    The edge of a clip an edit applies to.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Start,
    End,
    None,
}

impl Edge {
    pub const fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"start" => Some(Self::Start),
            b"end" => Some(Self::End),
            b"none" => Some(Self::None),
            _ => None,
        }
    }

    pub const fn to_name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::None => "none",
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

impl FromStr for Edge {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s.as_bytes()).ok_or_else(|| ParseError {
            kind: "edge",
            value: s.to_owned(),
        })
    }
}

/**
    The result of a successful edit.
*/
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditOutcome {
    /// The edge position another clip's edge attracted the edit to, when
    /// snapping was active and triggered.
    pub snapped: Option<ClockTime>,
}

impl EditOutcome {
    pub(crate) const fn unsnapped() -> Self {
        Self { snapped: None }
    }
}
