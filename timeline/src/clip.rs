use core::fmt;

use timecode_types::{ClockTime, FrameNumber};

use crate::asset::Asset;
use crate::slots::{FrameSlots, SlotKind};
use crate::track::{Track, TrackId, TrackKind, TrackTypes};

/**
    Identifier of a clip inside its timeline, handed out by
    [`Timeline::add_clip`](crate::Timeline::add_clip).
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipId(pub u64);

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/**
    What a clip plays.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipSource {
    /// A generated test pattern with matching test audio.
    Pattern,
    /// Media described by an [`Asset`] registered on the project.
    Media { asset_id: String },
}

impl ClipSource {
    pub(crate) fn nick(&self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Media { .. } => "media",
        }
    }
}

/**
    The per-track child of a clip.

    One element exists for every timeline track the clip occupies. Its
    timing always mirrors the owning clip.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackElement {
    name: String,
    track: TrackId,
    kind: TrackKind,
    start: ClockTime,
    inpoint: ClockTime,
    duration: ClockTime,
    max_duration: Option<ClockTime>,
    slots: FrameSlots,
}

impl TrackElement {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn track(&self) -> TrackId {
        self.track
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn start(&self) -> ClockTime {
        self.start
    }

    pub fn inpoint(&self) -> ClockTime {
        self.inpoint
    }

    pub fn duration(&self) -> ClockTime {
        self.duration
    }

    pub fn max_duration(&self) -> Option<ClockTime> {
        self.max_duration
    }

    pub fn fstart(&self) -> FrameNumber {
        self.frame_value(SlotKind::Start)
    }

    pub fn finpoint(&self) -> FrameNumber {
        self.frame_value(SlotKind::Inpoint)
    }

    pub fn fduration(&self) -> FrameNumber {
        self.frame_value(SlotKind::Duration)
    }

    fn frame_value(&self, kind: SlotKind) -> FrameNumber {
        let slot = self.slots.get(kind);
        if slot.used { slot.frames } else { FrameNumber::NONE }
    }
}

/**
    An editable unit on a timeline layer.

    A clip holds its position (`start`), the offset into its source
    material (`inpoint`), its `duration`, and an optional `max_duration`
    bounding how much material exists. Each of those also carries a cached
    frame count (see [`FrameSlots`]).

    Outside a timeline the frame setters only record the requested count;
    the nanosecond fields stay as they are until the clip is added and the
    counts are applied against the timeline's frame grid. Inside a
    timeline, clips are reached through their [`ClipId`] and mutated via
    the [`Timeline`](crate::Timeline) methods.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clip {
    id: Option<ClipId>,
    name: String,
    source: ClipSource,
    track_types: TrackTypes,
    start: ClockTime,
    inpoint: ClockTime,
    duration: ClockTime,
    max_duration: Option<ClockTime>,
    slots: FrameSlots,
    children: Vec<TrackElement>,
    in_timeline: bool,
}

impl Clip {
    /**
        A pattern clip: test video and audio, zero-length until told
        otherwise, with unbounded source material.
    */
    pub fn pattern() -> Self {
        Self {
            id: None,
            name: String::new(),
            source: ClipSource::Pattern,
            track_types: TrackTypes::AUDIO_VIDEO,
            start: ClockTime::ZERO,
            inpoint: ClockTime::ZERO,
            duration: ClockTime::ZERO,
            max_duration: None,
            slots: FrameSlots::new(),
            children: Vec::new(),
            in_timeline: false,
        }
    }

    /**
        A clip playing the given asset, spanning all of it.
    */
    pub fn from_asset(asset: &Asset) -> Self {
        Self {
            id: None,
            name: String::new(),
            source: ClipSource::Media {
                asset_id: asset.id().to_owned(),
            },
            track_types: asset.track_types(),
            start: ClockTime::ZERO,
            inpoint: ClockTime::ZERO,
            duration: asset.duration().unwrap_or(ClockTime::ZERO),
            max_duration: asset.duration(),
            slots: FrameSlots::new(),
            children: Vec::new(),
            in_timeline: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_track_types(mut self, track_types: TrackTypes) -> Self {
        self.track_types = track_types;
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The clip's id while it is in a timeline.
    pub fn id(&self) -> Option<ClipId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &ClipSource {
        &self.source
    }

    pub fn track_types(&self) -> TrackTypes {
        self.track_types
    }

    pub fn start(&self) -> ClockTime {
        self.start
    }

    pub fn inpoint(&self) -> ClockTime {
        self.inpoint
    }

    pub fn duration(&self) -> ClockTime {
        self.duration
    }

    pub fn max_duration(&self) -> Option<ClockTime> {
        self.max_duration
    }

    pub fn end(&self) -> ClockTime {
        self.start + self.duration
    }

    pub fn children(&self) -> &[TrackElement] {
        &self.children
    }

    // -----------------------------------------------------------------------
    // Nanosecond setters (outside a timeline)
    // -----------------------------------------------------------------------

    pub fn set_start(&mut self, start: ClockTime) {
        self.start = start;
    }

    pub fn set_inpoint(&mut self, inpoint: ClockTime) {
        self.inpoint = inpoint;
    }

    pub fn set_duration(&mut self, duration: ClockTime) {
        self.duration = duration;
    }

    pub fn set_max_duration(&mut self, max_duration: Option<ClockTime>) {
        self.max_duration = max_duration;
    }

    // -----------------------------------------------------------------------
    // Frame setters (outside a timeline: cache only)
    // -----------------------------------------------------------------------

    /**
        Record the frame the clip should start at.

        Nothing else changes until the clip joins a timeline; the count is
        then applied against the timeline's configured rate.
    */
    pub fn set_fstart(&mut self, frame: FrameNumber) {
        self.slots.set_frames(SlotKind::Start, frame);
    }

    /**
        Record the first source frame the clip should output, counted at
        the clip's natural rate.
    */
    pub fn set_finpoint(&mut self, frame: FrameNumber) {
        self.slots.set_frames(SlotKind::Inpoint, frame);
    }

    /// Record how many timeline frames the clip should last.
    pub fn set_fduration(&mut self, frame: FrameNumber) {
        self.slots.set_frames(SlotKind::Duration, frame);
    }

    /// Record the available source material in natural-rate frames.
    pub fn set_fmax_duration(&mut self, frame: FrameNumber) {
        self.slots.set_frames(SlotKind::MaxDuration, frame);
    }

    // -----------------------------------------------------------------------
    // Frame getters
    // -----------------------------------------------------------------------

    pub fn fstart(&self) -> FrameNumber {
        self.frame_value(SlotKind::Start)
    }

    pub fn finpoint(&self) -> FrameNumber {
        self.frame_value(SlotKind::Inpoint)
    }

    pub fn fduration(&self) -> FrameNumber {
        self.frame_value(SlotKind::Duration)
    }

    pub fn fmax_duration(&self) -> FrameNumber {
        self.frame_value(SlotKind::MaxDuration)
    }

    /**
        The cached frame count for one timed property.

        Outside a timeline this is whatever was last recorded. Inside one,
        a cache that has never been applied reads as
        [`FrameNumber::NONE`]; an applied cache returns the count as of
        the last frame operation, which a later nanosecond setter does
        *not* refresh.
    */
    pub fn frame_value(&self, kind: SlotKind) -> FrameNumber {
        let slot = self.slots.get(kind);
        if !self.in_timeline {
            return slot.frames;
        }
        if !slot.used {
            return FrameNumber::NONE;
        }
        slot.frames
    }

    // -----------------------------------------------------------------------
    // Crate internals
    // -----------------------------------------------------------------------

    pub(crate) fn slots(&self) -> &FrameSlots {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut FrameSlots {
        &mut self.slots
    }

    pub(crate) fn set_in_timeline(&mut self, in_timeline: bool) {
        self.in_timeline = in_timeline;
    }

    pub(crate) fn set_id(&mut self, id: Option<ClipId>) {
        self.id = id;
    }

    pub(crate) fn assign_name(&mut self, name: String) {
        self.name = name;
    }

    /// Create one child per timeline track this clip occupies.
    pub(crate) fn make_children(&mut self, tracks: &[Track]) {
        self.children = tracks
            .iter()
            .filter(|track| self.track_types.contains(track.kind().types()))
            .map(|track| TrackElement {
                name: format!("{}-{}{}", self.name, track.kind(), track.id()),
                track: track.id(),
                kind: track.kind(),
                start: self.start,
                inpoint: self.inpoint,
                duration: self.duration,
                max_duration: self.max_duration,
                slots: self.slots,
            })
            .collect();
    }

    pub(crate) fn clear_children(&mut self) {
        self.children.clear();
    }

    /// Mirror the clip's timing and caches onto its children.
    pub(crate) fn sync_children(&mut self) {
        for child in &mut self.children {
            child.start = self.start;
            child.inpoint = self.inpoint;
            child.duration = self.duration;
            child.max_duration = self.max_duration;
            child.slots = self.slots;
        }
    }

    pub(crate) fn occupies_track(&self, track: TrackId) -> bool {
        self.children.iter().any(|child| child.track == track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_defaults() {
        let clip = Clip::pattern();
        assert_eq!(clip.start(), ClockTime::ZERO);
        assert_eq!(clip.inpoint(), ClockTime::ZERO);
        assert_eq!(clip.duration(), ClockTime::ZERO);
        assert_eq!(clip.max_duration(), None);
        assert_eq!(clip.track_types(), TrackTypes::AUDIO_VIDEO);
        assert!(clip.id().is_none());
    }

    #[test]
    fn from_asset_spans_the_asset() {
        let asset = Asset::new("file:///a.mov")
            .with_duration(ClockTime::SECOND)
            .with_track_types(TrackTypes::VIDEO);
        let clip = Clip::from_asset(&asset);

        assert_eq!(clip.duration(), ClockTime::SECOND);
        assert_eq!(clip.max_duration(), Some(ClockTime::SECOND));
        assert_eq!(clip.track_types(), TrackTypes::VIDEO);
        assert_eq!(
            clip.source(),
            &ClipSource::Media {
                asset_id: "file:///a.mov".into()
            }
        );
    }

    #[test]
    fn detached_frame_setters_leave_times_alone() {
        let mut clip = Clip::pattern();
        clip.set_fstart(FrameNumber(25));
        clip.set_finpoint(FrameNumber(15));

        assert_eq!(clip.start(), ClockTime::ZERO);
        assert_eq!(clip.inpoint(), ClockTime::ZERO);
        assert_eq!(clip.fstart(), FrameNumber(25));
        assert_eq!(clip.finpoint(), FrameNumber(15));
        assert_eq!(clip.fduration(), FrameNumber::NONE);
    }

    #[test]
    fn children_follow_track_types() {
        let tracks = [
            Track::new(TrackId(0), TrackKind::Audio),
            Track::new(TrackId(1), TrackKind::Video),
        ];

        let mut clip = Clip::pattern().with_name("pattern0");
        clip.make_children(&tracks);
        assert_eq!(clip.children().len(), 2);

        let mut video_only = Clip::pattern()
            .with_name("pattern1")
            .with_track_types(TrackTypes::VIDEO);
        video_only.make_children(&tracks);
        assert_eq!(video_only.children().len(), 1);
        assert_eq!(video_only.children()[0].kind(), TrackKind::Video);
        assert_eq!(video_only.children()[0].name(), "pattern1-video1");
    }
}
