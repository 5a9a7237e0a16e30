/*!
    Frame-accurate editing timeline.

    A [`Timeline`] arranges [`Clip`]s on prioritized [`Layer`]s, with one
    [`TrackElement`] child per output [`Track`] a clip occupies. Positions
    and durations are nanosecond [`ClockTime`]s, optionally pinned to a
    frame grid through the timeline's [`TimecodeConfig`]: every element
    carries cached frame values for its start, in-point, duration, and
    max-duration that survive rate changes and serialization.

    Projects serialize through the [`formatter`] registry; the built-in
    format is an XML document with the `.xcut` extension.

    ```
    use cutline_timeline::{Timeline, Clip};
    use timecode_types::FrameNumber;

    let mut timeline = Timeline::new_audio_video();
    let layer = timeline.append_layer();

    let mut clip = Clip::pattern();
    clip.set_fstart(FrameNumber(25));
    let id = timeline.add_clip(layer, clip)?;
    # let _ = id;
    # Ok::<(), Box<dyn std::error::Error>>(())
    ```
*/

pub mod formatter;
pub mod uri;

mod asset;
mod clip;
mod edit;
mod error;
mod layer;
mod project;
mod slots;
mod timeline;
mod track;

pub use asset::Asset;
pub use clip::{Clip, ClipId, ClipSource, TrackElement};
pub use edit::{Edge, EditMode, EditOutcome};
pub use error::{AddClipError, TimelineError};
pub use layer::Layer;
pub use project::Project;
pub use slots::{FrameSlot, FrameSlots, SlotKind};
pub use timeline::Timeline;
pub use track::{Track, TrackId, TrackKind, TrackTypes};

pub use timecode_types::{
    ClockTime, FrameNumber, Framerate, Timecode, TimecodeConfig, TimecodeFlags,
};
