use thiserror::Error;

use timecode_types::ClockTime;

use crate::clip::{Clip, ClipId};
use crate::edit::{Edge, EditMode};
use crate::formatter::FormatterError;

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("timing: {0}")]
    Timing(#[from] timecode_types::Error),

    #[error("timeline has no timecodes configuration")]
    NoTimecodesConfig,

    #[error("clip carries frame values but the timeline has no timecodes configuration")]
    FrameValuesNeedConfig,

    #[error("no clip {0} in the timeline")]
    UnknownClip(ClipId),

    #[error("no layer with priority {0}")]
    UnknownLayer(u32),

    #[error("no asset {0:?} in the project")]
    UnknownAsset(String),

    #[error("{moving:?} would fully overlap {against:?}")]
    FullOverlap { moving: String, against: String },

    #[error("{moving:?} would overlap two clips at its {edge} edge")]
    EdgeOverlap { moving: String, edge: Edge },

    #[error("{what} would move out of range")]
    OutOfRange { what: &'static str },

    #[error(
        "in-point {inpoint} plus duration {duration} exceeds max-duration {max_duration}"
    )]
    DurationLimit {
        inpoint: ClockTime,
        duration: ClockTime,
        max_duration: ClockTime,
    },

    #[error("{mode} edit on edge {edge} is not supported")]
    UnsupportedEdit { mode: EditMode, edge: Edge },

    #[error("can only load into an empty timeline")]
    NotEmpty,

    #[error(transparent)]
    Formatter(#[from] FormatterError),
}

/**
    Failure to add a clip to a layer.

    The clip comes back exactly as it was handed in: a rejected insertion
    leaves no trace on the clip or the timeline.
*/
#[derive(Debug, Error)]
#[error("could not add clip: {reason}")]
pub struct AddClipError {
    pub clip: Box<Clip>,
    pub reason: TimelineError,
}

impl AddClipError {
    pub(crate) fn new(clip: Clip, reason: TimelineError) -> Self {
        Self {
            clip: Box::new(clip),
            reason,
        }
    }
}
