/*!
    The common timeline document every adapter reads into and writes
    from.

    The shape follows editorial-interchange convention: a document is a
    stack of tracks, each an ordered sequence of clips and gaps, with all
    times kept as rational values (`value` counts of `1/rate` seconds,
    both doubles). Schema-bearing objects carry a `"schema"` tag with a
    versioned name so serialized documents stay recognizable across
    revisions.
*/

use serde::{Deserialize, Serialize};

/**
    A time position or duration: `value` units of `1/rate` seconds.
*/
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RationalTime {
    pub value: f64,
    pub rate: f64,
}

impl RationalTime {
    pub fn new(value: f64, rate: f64) -> Self {
        Self { value, rate }
    }

    pub fn to_seconds(self) -> f64 {
        self.value / self.rate
    }

    /// The same instant expressed against another rate.
    pub fn rescaled_to(self, rate: f64) -> Self {
        Self {
            value: self.value * rate / self.rate,
            rate,
        }
    }
}

/**
    A half-open span: `start_time` inclusive, lasting `duration`.
*/
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_time: RationalTime,
    pub duration: RationalTime,
}

impl TimeRange {
    pub fn new(start_time: RationalTime, duration: RationalTime) -> Self {
        Self {
            start_time,
            duration,
        }
    }
}

/**
    Where a clip's media lives.

    `External` points at real media; `Missing` marks a reference that
    could not be resolved, keeping the clip's timing intact.
*/
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema")]
pub enum MediaReference {
    #[serde(rename = "ExternalReference.1")]
    External {
        target_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        available_range: Option<TimeRange>,
    },
    #[serde(rename = "MissingReference.1")]
    Missing,
}

/**
    One item on a track: media, or empty time.
*/
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema")]
pub enum Item {
    #[serde(rename = "Clip.1")]
    Clip {
        name: String,
        /// Portion of the media the clip plays. A clip without one plays
        /// its reference's full available range.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source_range: Option<TimeRange>,
        media_reference: MediaReference,
    },
    #[serde(rename = "Gap.1")]
    Gap { source_range: TimeRange },
}

impl Item {
    /**
        How long the item occupies its track, when determinable.
    */
    pub fn duration(&self) -> Option<RationalTime> {
        match self {
            Self::Gap { source_range } => Some(source_range.duration),
            Self::Clip {
                source_range: Some(range),
                ..
            } => Some(range.duration),
            Self::Clip {
                source_range: None,
                media_reference:
                    MediaReference::External {
                        available_range: Some(range),
                        ..
                    },
                ..
            } => Some(range.duration),
            Self::Clip { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocTrackKind {
    Video,
    Audio,
}

/**
    An ordered sequence of items of one kind.
*/
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocTrack {
    pub name: String,
    pub kind: DocTrackKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,
}

impl DocTrack {
    pub fn new(name: impl Into<String>, kind: DocTrackKind) -> Self {
        Self {
            name: name.into(),
            kind,
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }
}

/**
    A complete interchange timeline.
*/
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tracks: Vec<DocTrack>,
}

impl Document {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tracks: Vec::new(),
        }
    }

    pub fn with_track(mut self, track: DocTrack) -> Self {
        self.tracks.push(track);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rational_time_conversions() {
        let t = RationalTime::new(48.0, 24.0);
        assert_eq!(t.to_seconds(), 2.0);
        assert_eq!(t.rescaled_to(30.0), RationalTime::new(60.0, 30.0));
    }

    #[test]
    fn item_durations() {
        let range = TimeRange::new(RationalTime::new(0.0, 24.0), RationalTime::new(12.0, 24.0));
        let gap = Item::Gap {
            source_range: range,
        };
        assert_eq!(gap.duration(), Some(RationalTime::new(12.0, 24.0)));

        let full = Item::Clip {
            name: "full".into(),
            source_range: None,
            media_reference: MediaReference::External {
                target_url: "file:///a.mov".into(),
                available_range: Some(range),
            },
        };
        assert_eq!(full.duration(), Some(RationalTime::new(12.0, 24.0)));

        let unsized_clip = Item::Clip {
            name: "unsized".into(),
            source_range: None,
            media_reference: MediaReference::Missing,
        };
        assert_eq!(unsized_clip.duration(), None);
    }

    #[test]
    fn schema_tags_round_trip() {
        let doc = Document::new("tagged").with_track(
            DocTrack::new("V1", DocTrackKind::Video).with_item(Item::Clip {
                name: "one".into(),
                source_range: Some(TimeRange::new(
                    RationalTime::new(0.0, 24.0),
                    RationalTime::new(24.0, 24.0),
                )),
                media_reference: MediaReference::Missing,
            }),
        );

        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains(r#""schema":"Clip.1""#));
        assert!(json.contains(r#""schema":"MissingReference.1""#));
        assert!(json.contains(r#""kind":"Video""#));

        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }
}
