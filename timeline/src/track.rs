use core::fmt;
use core::str::FromStr;

use timecode_types::ParseError;

/**
    Identifier of a track inside its timeline.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackId(pub u32);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/**
    The kind of media a track outputs.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl TrackKind {
    pub const fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"audio" => Some(Self::Audio),
            b"video" => Some(Self::Video),
            _ => None,
        }
    }

    pub const fn to_name(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }

    /// The matching bit in a [`TrackTypes`] set.
    pub const fn types(self) -> TrackTypes {
        match self {
            Self::Audio => TrackTypes::AUDIO,
            Self::Video => TrackTypes::VIDEO,
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

impl FromStr for TrackKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s.as_bytes()).ok_or_else(|| ParseError {
            kind: "track kind",
            value: s.to_owned(),
        })
    }
}

/**
    A set of track kinds.

    `UNKNOWN` is the empty set and means "unspecified": operations taking a
    [`TrackTypes`] argument treat it as "keep whatever is already selected".
*/
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TrackTypes(pub u32);

impl TrackTypes {
    pub const UNKNOWN: Self = Self(0);
    pub const AUDIO: Self = Self(1 << 0);
    pub const VIDEO: Self = Self(1 << 1);
    pub const AUDIO_VIDEO: Self = Self(Self::AUDIO.0 | Self::VIDEO.0);

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn is_unknown(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TrackTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return f.write_str("unknown");
        }
        let mut first = true;
        if self.contains(Self::AUDIO) {
            f.write_str("audio")?;
            first = false;
        }
        if self.contains(Self::VIDEO) {
            if !first {
                f.write_str("+")?;
            }
            f.write_str("video")?;
        }
        Ok(())
    }
}

impl FromStr for TrackTypes {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "unknown" {
            return Ok(Self::UNKNOWN);
        }
        let mut types = Self::UNKNOWN;
        for part in s.split('+') {
            match TrackKind::from_name(part.as_bytes()) {
                Some(kind) => types = types.union(kind.types()),
                None => {
                    return Err(ParseError {
                        kind: "track types",
                        value: s.to_owned(),
                    });
                }
            }
        }
        Ok(types)
    }
}

/**
    An output track of a timeline.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Track {
    id: TrackId,
    kind: TrackKind,
}

impl Track {
    pub(crate) const fn new(id: TrackId, kind: TrackKind) -> Self {
        Self { id, kind }
    }

    pub const fn id(&self) -> TrackId {
        self.id
    }

    pub const fn kind(&self) -> TrackKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip() {
        for kind in [TrackKind::Audio, TrackKind::Video] {
            assert_eq!(kind.to_name().parse::<TrackKind>().unwrap(), kind);
        }
        assert!("subtitle".parse::<TrackKind>().is_err());
    }

    #[test]
    fn types_display_and_parse() {
        assert_eq!(TrackTypes::UNKNOWN.to_string(), "unknown");
        assert_eq!(TrackTypes::AUDIO.to_string(), "audio");
        assert_eq!(TrackTypes::AUDIO_VIDEO.to_string(), "audio+video");
        assert_eq!(
            "audio+video".parse::<TrackTypes>().unwrap(),
            TrackTypes::AUDIO_VIDEO
        );
        assert_eq!("unknown".parse::<TrackTypes>().unwrap(), TrackTypes::UNKNOWN);
        assert!("audio+subtitle".parse::<TrackTypes>().is_err());
    }

    #[test]
    fn types_set_operations() {
        assert!(TrackTypes::AUDIO_VIDEO.contains(TrackTypes::AUDIO));
        assert!(!TrackTypes::AUDIO.contains(TrackTypes::VIDEO));
        assert!(TrackTypes::AUDIO.intersects(TrackTypes::AUDIO_VIDEO));
        assert!(!TrackTypes::AUDIO.intersects(TrackTypes::VIDEO));
    }
}
