/*!
    The timeline: tracks, prioritized layers, and the editing operations
    that move clips around while keeping layers overlap-free.

    Editing comes in two flavours. The nanosecond operations ([`set_start`],
    [`edit`], and friends) place edges at arbitrary clock times. The frame
    operations ([`set_fstart`], [`ftrim`], [`fedit`], ...) place edges on
    the frame grid of the timeline's [`TimecodeConfig`] and record the frame
    in the clip's slot cache, so the value survives a later rate change.

    Every mutation is atomic: on failure the timeline is exactly as it was
    before the call.

    [`set_start`]: Timeline::set_start
    [`edit`]: Timeline::edit
    [`set_fstart`]: Timeline::set_fstart
    [`ftrim`]: Timeline::ftrim
    [`fedit`]: Timeline::fedit
*/

use timecode_types::{
    frames_diff_to_ns, frames_to_ns, ns_to_frames, ClockTime, ClockTimeDiff, FrameNumber,
    Framerate, TimecodeConfig, TimecodeFlags,
};

use crate::asset::Asset;
use crate::clip::{Clip, ClipId, ClipSource};
use crate::edit::{Edge, EditMode, EditOutcome};
use crate::error::{AddClipError, TimelineError};
use crate::formatter::FormatterError;
use crate::layer::Layer;
use crate::project::Project;
use crate::slots::SlotKind;
use crate::track::{Track, TrackId, TrackKind, TrackTypes};

/// Slot application order: a value later in the list may depend on one
/// applied earlier (duration limits read the in-point).
const SLOT_ORDER: [SlotKind; 4] = [
    SlotKind::Start,
    SlotKind::Inpoint,
    SlotKind::Duration,
    SlotKind::MaxDuration,
];

/**
    A frame-accurate editing timeline.
*/
#[derive(Debug, Clone)]
pub struct Timeline {
    tracks: Vec<Track>,
    layers: Vec<Layer>,
    project: Project,
    timecodes: Option<TimecodeConfig>,
    snapping_distance: ClockTime,
    next_clip_id: u64,
    pattern_count: u64,
    media_count: u64,
}

impl Timeline {
    /// Configuration a new timeline starts with: 30 fps, no flags.
    pub const DEFAULT_TIMECODES: TimecodeConfig =
        TimecodeConfig::new(Framerate::new(30, 1), TimecodeFlags::NONE);

    /**
        Create an empty timeline with no tracks or layers.
    */
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            layers: Vec::new(),
            project: Project::new(),
            timecodes: Some(Self::DEFAULT_TIMECODES),
            snapping_distance: ClockTime::ZERO,
            next_clip_id: 0,
            pattern_count: 0,
            media_count: 0,
        }
    }

    /**
        Create a timeline with one video track and one audio track.
    */
    pub fn new_audio_video() -> Self {
        let mut timeline = Self::new();
        timeline.add_track(TrackKind::Video);
        timeline.add_track(TrackKind::Audio);
        timeline
    }

    /**
        Create a timeline and load the project at `uri` into it.
    */
    pub fn new_from_uri(uri: &str) -> Result<Self, TimelineError> {
        let mut timeline = Self::new();
        timeline.load_from_uri(uri)?;
        Ok(timeline)
    }

    // Structure ------------------------------------------------------------

    /**
        Append an output track. Existing clips grow a child element for it
        when their track types match.
    */
    pub fn add_track(&mut self, kind: TrackKind) -> TrackId {
        let id = TrackId(self.tracks.len() as u32);
        self.tracks.push(Track::new(id, kind));
        let tracks = self.tracks.clone();
        for layer in &mut self.layers {
            for clip in layer.clips_mut() {
                clip.make_children(&tracks);
                clip.sync_children();
            }
        }
        id
    }

    /**
        Append a layer below all existing layers and return its priority.
    */
    pub fn append_layer(&mut self) -> u32 {
        let priority = self.layers.len() as u32;
        self.layers.push(Layer::new(priority));
        priority
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, priority: u32) -> Option<&Layer> {
        self.layers.get(priority as usize)
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /**
        Register an asset on the project, replacing any previous asset with
        the same id.
    */
    pub fn register_asset(&mut self, asset: Asset) {
        self.project.add_asset(asset);
    }

    // Timecodes ------------------------------------------------------------

    pub fn timecodes_config(&self) -> Option<TimecodeConfig> {
        self.timecodes
    }

    /**
        Install (or clear) the timecodes configuration.

        Installing a configuration re-applies every valid frame slot on the
        new grid: clips whose frame values were in use snap down from their
        current clock times, the rest re-apply their cached frames. Clearing
        leaves all clock times and cached frames untouched.

        Re-application is not transactional across clips; an error leaves
        the clips before the failing one on the new grid.
    */
    pub fn set_timecodes_config(
        &mut self,
        config: Option<TimecodeConfig>,
    ) -> Result<(), TimelineError> {
        self.timecodes = config;
        if config.is_some() {
            for id in self.clip_ids() {
                self.reset_clip_slots(id, &SLOT_ORDER, false)?;
            }
        }
        Ok(())
    }

    pub fn snapping_distance(&self) -> ClockTime {
        self.snapping_distance
    }

    /**
        Set the snap attraction distance for edits. Zero disables snapping.
    */
    pub fn set_snapping_distance(&mut self, distance: ClockTime) {
        self.snapping_distance = distance;
    }

    /**
        Clock time of `frame` on the timeline's grid.
    */
    pub fn frame_time(&self, frame: FrameNumber) -> Result<ClockTime, TimelineError> {
        Ok(frames_to_ns(frame, self.config()?.rate)?)
    }

    /**
        Frame of the timeline's grid at or before `time`.
    */
    pub fn frame_at(&self, time: ClockTime) -> Result<FrameNumber, TimelineError> {
        Ok(ns_to_frames(time, self.config()?.rate)?)
    }

    // Clips ----------------------------------------------------------------

    /**
        Add a clip to the layer with the given priority.

        Pending frame values on the clip are applied against the timeline's
        grid before insertion, and the whole operation either succeeds or
        hands the clip back exactly as it came in.
    */
    pub fn add_clip(&mut self, layer: u32, clip: Clip) -> Result<ClipId, AddClipError> {
        let auto_named = clip.name().is_empty();
        match self.stage_clip(layer, &clip) {
            Ok((mut staged, layer_idx)) => {
                let id = ClipId(self.next_clip_id);
                self.next_clip_id += 1;
                if auto_named {
                    match staged.source() {
                        ClipSource::Pattern => self.pattern_count += 1,
                        ClipSource::Media { .. } => self.media_count += 1,
                    }
                }
                staged.set_id(Some(id));
                staged.set_in_timeline(true);
                self.layers[layer_idx].insert_sorted(staged);
                Ok(id)
            }
            Err(reason) => Err(AddClipError::new(clip, reason)),
        }
    }

    /**
        Take a clip out of the timeline. Its clock times and cached frame
        values survive, so it can be re-added later.
    */
    pub fn remove_clip(&mut self, id: ClipId) -> Result<Clip, TimelineError> {
        let (li, _) = self.locate(id)?;
        let mut clip = self.layers[li]
            .take_clip(id)
            .ok_or(TimelineError::UnknownClip(id))?;
        clip.set_in_timeline(false);
        clip.set_id(None);
        clip.clear_children();
        Ok(clip)
    }

    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.layers.iter().find_map(|layer| layer.clip(id))
    }

    /**
        Priority of the layer currently holding `id`.
    */
    pub fn clip_layer(&self, id: ClipId) -> Option<u32> {
        self.layers
            .iter()
            .find(|layer| layer.clip(id).is_some())
            .map(Layer::priority)
    }

    /**
        Create a clip from `asset` and add it at the given clock times.

        With no start, the clip lands at the end of the layer. With no
        duration, it keeps the asset's full duration. The asset is
        registered on the project if it was not already.
    */
    pub fn add_asset(
        &mut self,
        layer: u32,
        asset: &Asset,
        start: Option<ClockTime>,
        inpoint: ClockTime,
        duration: Option<ClockTime>,
        track_types: TrackTypes,
    ) -> Result<ClipId, TimelineError> {
        let layer_idx = self.layer_index(layer)?;
        if self.project.asset(asset.id()).is_none() {
            self.project.add_asset(asset.clone());
        }
        let start = start.unwrap_or_else(|| self.layers[layer_idx].duration());
        let mut clip = Clip::from_asset(asset);
        if !track_types.is_unknown() {
            clip = clip.with_track_types(track_types);
        }
        clip.set_start(start);
        clip.set_inpoint(inpoint);
        if let Some(duration) = duration {
            clip.set_duration(duration);
        }
        self.add_clip(layer, clip).map_err(|err| err.reason)
    }

    /**
        Create a clip from `asset` and add it at the given frame values.

        With no start frame, the clip lands at the layer's last occupied
        frame. With no duration frame, it keeps the asset's full duration.
        After insertion all four frame slots are in use, pinned to the grid.
    */
    pub fn add_fasset(
        &mut self,
        layer: u32,
        asset: &Asset,
        fstart: FrameNumber,
        finpoint: FrameNumber,
        fduration: FrameNumber,
        track_types: TrackTypes,
    ) -> Result<ClipId, TimelineError> {
        self.layer_index(layer)?;
        self.config()?;
        if self.project.asset(asset.id()).is_none() {
            self.project.add_asset(asset.clone());
        }
        let fstart = if fstart.is_none() {
            self.layer_fduration(layer)?
        } else {
            fstart
        };
        let mut clip = Clip::from_asset(asset);
        if !track_types.is_unknown() {
            clip = clip.with_track_types(track_types);
        }
        clip.set_fstart(fstart);
        clip.set_finpoint(finpoint);
        if fduration.is_valid() {
            clip.set_fduration(fduration);
        }
        let id = self.add_clip(layer, clip).map_err(|err| err.reason)?;
        if let Err(err) = self.reset_clip_slots(id, &SLOT_ORDER, true) {
            let _ = self.remove_clip(id);
            return Err(err);
        }
        Ok(id)
    }

    // Durations ------------------------------------------------------------

    /**
        Clock time at which the last clip ends.
    */
    pub fn duration(&self) -> ClockTime {
        self.layers
            .iter()
            .map(Layer::duration)
            .max()
            .unwrap_or(ClockTime::ZERO)
    }

    /**
        Frame at which the last clip ends, on the timeline's grid.
    */
    pub fn fduration(&self) -> Result<FrameNumber, TimelineError> {
        let mut out = FrameNumber::ZERO;
        for layer in &self.layers {
            let end = self.layer_fduration(layer.priority())?;
            if end.0 > out.0 {
                out = end;
            }
        }
        Ok(out)
    }

    /**
        Frame at which the last clip of one layer ends.

        Clips whose start and duration frames are both in use contribute
        their exact frame extent; the rest snap down from their end time.
    */
    pub fn layer_fduration(&self, layer: u32) -> Result<FrameNumber, TimelineError> {
        let config = self.config()?;
        let idx = self.layer_index(layer)?;
        let mut out = FrameNumber::ZERO;
        for clip in self.layers[idx].clips() {
            let fstart = clip.fstart();
            let fduration = clip.fduration();
            let end = if fstart.is_valid() && fduration.is_valid() {
                FrameNumber(fstart.0 + fduration.0)
            } else {
                ns_to_frames(clip.end(), config.rate)?
            };
            if end.0 > out.0 {
                out = end;
            }
        }
        Ok(out)
    }

    // Nanosecond editing ---------------------------------------------------

    /**
        Move a clip's start to a clock time, keeping its duration.
    */
    pub fn set_start(
        &mut self,
        id: ClipId,
        start: ClockTime,
    ) -> Result<EditOutcome, TimelineError> {
        self.move_clip(id, start, true)
    }

    /**
        Set a clip's duration by trimming its end edge.
    */
    pub fn set_duration(
        &mut self,
        id: ClipId,
        duration: ClockTime,
    ) -> Result<EditOutcome, TimelineError> {
        let (li, _) = self.locate(id)?;
        let start = self.layers[li]
            .clip(id)
            .ok_or(TimelineError::UnknownClip(id))?
            .start();
        let end = ClockTime(
            start
                .nanos()
                .checked_add(duration.nanos())
                .ok_or(TimelineError::OutOfRange { what: "duration" })?,
        );
        self.trim_clip(id, Edge::End, end, true)
    }

    /**
        Set a clip's in-point. Fails if the in-point plus the current
        duration would pass the max-duration.
    */
    pub fn set_inpoint(&mut self, id: ClipId, inpoint: ClockTime) -> Result<(), TimelineError> {
        self.set_inpoint_ns(id, inpoint)
    }

    /**
        Set or clear a clip's max-duration. Fails if the current in-point
        plus duration would pass the new limit.
    */
    pub fn set_max_duration(
        &mut self,
        id: ClipId,
        max_duration: Option<ClockTime>,
    ) -> Result<(), TimelineError> {
        self.set_max_ns(id, max_duration)
    }

    /**
        Edit a clip: reposition it, trim an edge, ripple everything after
        it, or roll a shared boundary.

        `Normal` moves the chosen edge of the clip to `position`, first
        moving it to `new_layer_priority` when one is given; a priority one
        past the last layer creates that layer. `Trim` moves one edge,
        adjusting in-point and duration. `Ripple` moves the clip and every
        clip starting at or after it by the same offset. `Roll` trims the
        chosen edge together with every opposite edge meeting it exactly.
        `Slide` is not supported.
    */
    pub fn edit(
        &mut self,
        id: ClipId,
        new_layer_priority: Option<u32>,
        mode: EditMode,
        edge: Edge,
        position: ClockTime,
    ) -> Result<EditOutcome, TimelineError> {
        self.locate(id)?;
        match (mode, edge) {
            (EditMode::Normal, _) => {
                let saved = self.layers.clone();
                let result = self.normal_edit(id, new_layer_priority, edge, position);
                if result.is_err() {
                    self.layers = saved;
                }
                result
            }
            (EditMode::Trim, Edge::Start | Edge::End) => self.trim_clip(id, edge, position, true),
            (EditMode::Ripple, Edge::None) => self.ripple_edit(id, position),
            (EditMode::Roll, Edge::Start | Edge::End) => self.roll_edit(id, edge, position),
            (mode, edge) => Err(TimelineError::UnsupportedEdit { mode, edge }),
        }
    }

    // Frame editing --------------------------------------------------------

    /**
        Move a clip's start to a frame of the timeline's grid and pin it
        there.
    */
    pub fn set_fstart(
        &mut self,
        id: ClipId,
        frame: FrameNumber,
    ) -> Result<EditOutcome, TimelineError> {
        self.locate(id)?;
        let config = self.config()?;
        let exact = frames_to_ns(frame, config.rate)?;
        let saved = self.layers.clone();
        let result = (|| {
            self.mark_slot(id, SlotKind::Start, frame)?;
            self.move_clip(id, exact, true)
        })();
        match result {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.layers = saved;
                Err(err)
            }
        }
    }

    /**
        Set a clip's duration to a frame count of the timeline's grid and
        pin it there.

        All four slots are first re-applied on the grid, so the whole clip
        ends up frame-accurate.
    */
    pub fn set_fduration(
        &mut self,
        id: ClipId,
        frame: FrameNumber,
    ) -> Result<EditOutcome, TimelineError> {
        self.locate(id)?;
        let config = self.config()?;
        let exact = frames_to_ns(frame, config.rate)?;
        let saved = self.layers.clone();
        let result = (|| {
            self.reset_clip_slots(id, &SLOT_ORDER, true)?;
            self.mark_slot(id, SlotKind::Duration, frame)?;
            let (li, _) = self.locate(id)?;
            let start = self.layers[li]
                .clip(id)
                .ok_or(TimelineError::UnknownClip(id))?
                .start();
            let end = ClockTime(
                start
                    .nanos()
                    .checked_add(exact.nanos())
                    .ok_or(TimelineError::OutOfRange { what: "duration" })?,
            );
            self.trim_clip(id, Edge::End, end, true)
        })();
        match result {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.layers = saved;
                Err(err)
            }
        }
    }

    /**
        Set a clip's in-point to a frame and pin it there.

        The frame sits on the source's natural framerate grid when its
        asset declares one, on the timeline's grid otherwise.
    */
    pub fn set_finpoint(&mut self, id: ClipId, frame: FrameNumber) -> Result<(), TimelineError> {
        self.config()?;
        let rate = self.clip_slot_rate(id, SlotKind::Inpoint)?;
        self.apply_frame_value(id, SlotKind::Inpoint, frame, rate)
    }

    /**
        Set a clip's max-duration to a frame and pin it there. Uses the
        same grid as [`set_finpoint`](Timeline::set_finpoint).
    */
    pub fn set_fmax_duration(
        &mut self,
        id: ClipId,
        frame: FrameNumber,
    ) -> Result<(), TimelineError> {
        self.config()?;
        let rate = self.clip_slot_rate(id, SlotKind::MaxDuration)?;
        self.apply_frame_value(id, SlotKind::MaxDuration, frame, rate)
    }

    /**
        Trim a clip's start edge to a frame of the timeline's grid.

        The affected slots stay pinned: after the trim the clip's start,
        in-point, and duration all sit exactly on their grids, shifted by
        the frame difference.
    */
    pub fn ftrim(&mut self, id: ClipId, frame: FrameNumber) -> Result<EditOutcome, TimelineError> {
        self.frame_trim(id, Edge::Start, frame)
    }

    /**
        Frame-accurate counterpart of [`edit`](Timeline::edit).

        Only trims are supported; `position` is a frame on the timeline's
        grid. Trims never change the layer, so `new_layer_priority` has no
        effect.
    */
    pub fn fedit(
        &mut self,
        id: ClipId,
        new_layer_priority: Option<u32>,
        mode: EditMode,
        edge: Edge,
        frame: FrameNumber,
    ) -> Result<EditOutcome, TimelineError> {
        self.locate(id)?;
        self.config()?;
        if mode != EditMode::Trim || edge == Edge::None {
            return Err(TimelineError::UnsupportedEdit { mode, edge });
        }
        let _ = new_layer_priority;
        self.frame_trim(id, edge, frame)
    }

    // Serialization --------------------------------------------------------

    /**
        Save the timeline through the formatter registry.

        The formatter handling the uri's extension is used when it can
        save; otherwise the highest-ranked formatter that can.
    */
    pub fn save_to_uri(&self, uri: &str, overwrite: bool) -> Result<(), TimelineError> {
        crate::formatter::init();
        let chosen = crate::formatter::for_uri(uri)
            .filter(|(_, formatter)| formatter.can_save_uri(uri));
        let (_, formatter) = match chosen {
            Some(found) => found,
            None => crate::formatter::default_formatter()
                .ok_or_else(|| FormatterError::NoFormatterFound(uri.to_owned()))?,
        };
        formatter.save_to_uri(self, uri, overwrite)?;
        Ok(())
    }

    /**
        Load the project at `uri` into this timeline.

        Only an untouched timeline can load: no tracks, no layers. On
        success the project's uri is set to `uri`.
    */
    pub fn load_from_uri(&mut self, uri: &str) -> Result<(), TimelineError> {
        if !self.tracks.is_empty() || !self.layers.is_empty() {
            return Err(TimelineError::NotEmpty);
        }
        crate::formatter::init();
        let (_, formatter) = crate::formatter::for_load_uri(uri)
            .ok_or_else(|| FormatterError::NoFormatterFound(uri.to_owned()))?;
        formatter.load_from_uri(self, uri)?;
        self.project.set_uri(uri);
        Ok(())
    }

    // Loader hooks ---------------------------------------------------------

    pub(crate) fn restore_timecodes(&mut self, config: Option<TimecodeConfig>) {
        self.timecodes = config;
    }

    pub(crate) fn project_mut(&mut self) -> &mut Project {
        &mut self.project
    }

    /// Re-insert a deserialized clip without touching its times or slots.
    pub(crate) fn restore_clip(
        &mut self,
        layer: u32,
        mut clip: Clip,
    ) -> Result<ClipId, TimelineError> {
        let layer_idx = self.layer_index(layer)?;
        let id = ClipId(self.next_clip_id);
        clip.set_id(Some(id));
        clip.set_in_timeline(true);
        clip.make_children(&self.tracks);
        clip.sync_children();
        for track in &self.tracks {
            if !clip.occupies_track(track.id()) {
                continue;
            }
            let mut group: Vec<&Clip> = self.layers[layer_idx]
                .clips()
                .iter()
                .filter(|c| c.occupies_track(track.id()))
                .collect();
            group.push(&clip);
            check_group(&group)?;
        }
        // Keep auto-naming clear of restored names like "pattern3".
        if let Some(rest) = clip.name().strip_prefix(clip.source().nick())
            && let Ok(n) = rest.parse::<u64>()
        {
            let counter = match clip.source() {
                ClipSource::Pattern => &mut self.pattern_count,
                ClipSource::Media { .. } => &mut self.media_count,
            };
            *counter = (*counter).max(n + 1);
        }
        self.next_clip_id += 1;
        self.layers[layer_idx].insert_sorted(clip);
        Ok(id)
    }

    // Internals ------------------------------------------------------------

    fn config(&self) -> Result<TimecodeConfig, TimelineError> {
        self.timecodes.ok_or(TimelineError::NoTimecodesConfig)
    }

    fn layer_index(&self, priority: u32) -> Result<usize, TimelineError> {
        let idx = priority as usize;
        if idx < self.layers.len() {
            Ok(idx)
        } else {
            Err(TimelineError::UnknownLayer(priority))
        }
    }

    fn locate(&self, id: ClipId) -> Result<(usize, usize), TimelineError> {
        for (li, layer) in self.layers.iter().enumerate() {
            if let Some(ci) = layer.clips().iter().position(|c| c.id() == Some(id)) {
                return Ok((li, ci));
            }
        }
        Err(TimelineError::UnknownClip(id))
    }

    fn clip_ids(&self) -> Vec<ClipId> {
        self.layers
            .iter()
            .flat_map(|layer| layer.clips())
            .filter_map(Clip::id)
            .collect()
    }

    fn natural_framerate_of(
        &self,
        source: &ClipSource,
    ) -> Result<Option<Framerate>, TimelineError> {
        match source {
            ClipSource::Pattern => Ok(None),
            ClipSource::Media { asset_id } => {
                let asset = self
                    .project
                    .asset(asset_id)
                    .ok_or_else(|| TimelineError::UnknownAsset(asset_id.clone()))?;
                Ok(asset.natural_framerate())
            }
        }
    }

    /// Framerate governing one slot of one source: in-point and
    /// max-duration prefer the source's natural rate.
    fn slot_rate(&self, source: &ClipSource, kind: SlotKind) -> Result<Framerate, TimelineError> {
        let config = self.config()?;
        if kind.uses_natural_rate()
            && let Some(natural) = self.natural_framerate_of(source)?
        {
            return Ok(natural);
        }
        Ok(config.rate)
    }

    fn clip_slot_rate(&self, id: ClipId, kind: SlotKind) -> Result<Framerate, TimelineError> {
        let (li, _) = self.locate(id)?;
        let clip = self.layers[li]
            .clip(id)
            .ok_or(TimelineError::UnknownClip(id))?;
        self.slot_rate(clip.source(), kind)
    }

    fn mark_slot(
        &mut self,
        id: ClipId,
        kind: SlotKind,
        frame: FrameNumber,
    ) -> Result<(), TimelineError> {
        let (li, _) = self.locate(id)?;
        let clip = self.layers[li]
            .clip_mut(id)
            .ok_or(TimelineError::UnknownClip(id))?;
        clip.slots_mut().mark_applied(kind, frame);
        clip.sync_children();
        Ok(())
    }

    fn set_inpoint_ns(&mut self, id: ClipId, inpoint: ClockTime) -> Result<(), TimelineError> {
        let (li, _) = self.locate(id)?;
        let clip = self.layers[li]
            .clip_mut(id)
            .ok_or(TimelineError::UnknownClip(id))?;
        if let Some(max) = clip.max_duration()
            && inpoint.saturating_add(clip.duration()) > max
        {
            return Err(TimelineError::DurationLimit {
                inpoint,
                duration: clip.duration(),
                max_duration: max,
            });
        }
        clip.set_inpoint(inpoint);
        clip.sync_children();
        Ok(())
    }

    fn set_max_ns(
        &mut self,
        id: ClipId,
        max_duration: Option<ClockTime>,
    ) -> Result<(), TimelineError> {
        let (li, _) = self.locate(id)?;
        let clip = self.layers[li]
            .clip_mut(id)
            .ok_or(TimelineError::UnknownClip(id))?;
        if let Some(max) = max_duration
            && clip.inpoint().saturating_add(clip.duration()) > max
        {
            return Err(TimelineError::DurationLimit {
                inpoint: clip.inpoint(),
                duration: clip.duration(),
                max_duration: max,
            });
        }
        clip.set_max_duration(max_duration);
        clip.sync_children();
        Ok(())
    }

    /// Validate the staged copy of a clip up for insertion; the caller
    /// commits it only on success.
    fn stage_clip(&self, layer: u32, clip: &Clip) -> Result<(Clip, usize), TimelineError> {
        let layer_idx = self.layer_index(layer)?;
        let mut staged = clip.clone();
        if staged.name().is_empty() {
            let n = match staged.source() {
                ClipSource::Pattern => self.pattern_count,
                ClipSource::Media { .. } => self.media_count,
            };
            staged.assign_name(format!("{}{}", staged.source().nick(), n));
        }
        if self.timecodes.is_none() {
            if staged.slots().any_valid() {
                return Err(TimelineError::FrameValuesNeedConfig);
            }
        } else {
            self.apply_staged_slots(&mut staged)?;
        }
        if let Some(max) = staged.max_duration()
            && staged.inpoint().saturating_add(staged.duration()) > max
        {
            return Err(TimelineError::DurationLimit {
                inpoint: staged.inpoint(),
                duration: staged.duration(),
                max_duration: max,
            });
        }
        staged.make_children(&self.tracks);
        staged.sync_children();
        for track in &self.tracks {
            if !staged.occupies_track(track.id()) {
                continue;
            }
            let mut group: Vec<&Clip> = self.layers[layer_idx]
                .clips()
                .iter()
                .filter(|c| c.occupies_track(track.id()))
                .collect();
            group.push(&staged);
            check_group(&group)?;
        }
        Ok((staged, layer_idx))
    }

    /// Pin the staged clip's pending frame values to their grids. Slots
    /// already in use re-snap from the clip's current clock times.
    fn apply_staged_slots(&self, staged: &mut Clip) -> Result<(), TimelineError> {
        for kind in SLOT_ORDER {
            let slot = staged.slots().get(kind);
            if !slot.frames.is_valid() {
                continue;
            }
            let rate = self.slot_rate(staged.source(), kind)?;
            let current = match kind {
                SlotKind::Start => Some(staged.start()),
                SlotKind::Duration => Some(staged.duration()),
                SlotKind::Inpoint => Some(staged.inpoint()),
                SlotKind::MaxDuration => staged.max_duration(),
            };
            let frame = if slot.used {
                match current {
                    Some(ns) => ns_to_frames(ns, rate)?,
                    None => slot.frames,
                }
            } else {
                slot.frames
            };
            if !frame.is_valid() {
                continue;
            }
            let exact = frames_to_ns(frame, rate)?;
            match kind {
                SlotKind::Start => staged.set_start(exact),
                SlotKind::Duration => staged.set_duration(exact),
                SlotKind::Inpoint => staged.set_inpoint(exact),
                SlotKind::MaxDuration => staged.set_max_duration(Some(exact)),
            }
            staged.slots_mut().mark_applied(kind, frame);
        }
        Ok(())
    }

    /// Re-apply frame slots of an attached clip on the current grid.
    ///
    /// A slot in use resolves its frame from the clip's current clock
    /// time; one merely cached re-applies the cached frame. Without
    /// `force`, slots holding no frame are skipped.
    fn reset_clip_slots(
        &mut self,
        id: ClipId,
        kinds: &[SlotKind],
        force: bool,
    ) -> Result<(), TimelineError> {
        for &kind in kinds {
            let (li, _) = self.locate(id)?;
            let clip = self.layers[li]
                .clip(id)
                .ok_or(TimelineError::UnknownClip(id))?;
            let slot = clip.slots().get(kind);
            if !slot.frames.is_valid() && !force {
                continue;
            }
            let source = clip.source().clone();
            let current = match kind {
                SlotKind::Start => Some(clip.start()),
                SlotKind::Duration => Some(clip.duration()),
                SlotKind::Inpoint => Some(clip.inpoint()),
                SlotKind::MaxDuration => clip.max_duration(),
            };
            let rate = self.slot_rate(&source, kind)?;
            let frame = if slot.used || force {
                match current {
                    Some(ns) => ns_to_frames(ns, rate)?,
                    None => slot.frames,
                }
            } else {
                slot.frames
            };
            if !frame.is_valid() {
                continue;
            }
            self.apply_frame_value(id, kind, frame, rate)?;
        }
        Ok(())
    }

    /// Write one frame value through its slot: pin the slot, then land the
    /// matching clock time exactly on the grid. Atomic per value.
    fn apply_frame_value(
        &mut self,
        id: ClipId,
        kind: SlotKind,
        frame: FrameNumber,
        rate: Framerate,
    ) -> Result<(), TimelineError> {
        let exact = frames_to_ns(frame, rate)?;
        let saved = self.layers.clone();
        let result: Result<(), TimelineError> = (|| {
            self.mark_slot(id, kind, frame)?;
            match kind {
                SlotKind::Start => self.move_clip(id, exact, false).map(|_| ()),
                SlotKind::Duration => {
                    let (li, _) = self.locate(id)?;
                    let start = self.layers[li]
                        .clip(id)
                        .ok_or(TimelineError::UnknownClip(id))?
                        .start();
                    let end = ClockTime(
                        start
                            .nanos()
                            .checked_add(exact.nanos())
                            .ok_or(TimelineError::OutOfRange { what: "duration" })?,
                    );
                    self.trim_clip(id, Edge::End, end, false).map(|_| ())
                }
                SlotKind::Inpoint => self.set_inpoint_ns(id, exact),
                SlotKind::MaxDuration => self.set_max_ns(id, Some(exact)),
            }
        })();
        match result {
            Ok(()) => Ok(()),
            Err(err) => {
                self.layers = saved;
                Err(err)
            }
        }
    }

    fn normal_edit(
        &mut self,
        id: ClipId,
        new_layer_priority: Option<u32>,
        edge: Edge,
        position: ClockTime,
    ) -> Result<EditOutcome, TimelineError> {
        if let Some(priority) = new_layer_priority {
            self.move_to_layer(id, priority)?;
        }
        let duration = self
            .clip(id)
            .ok_or(TimelineError::UnknownClip(id))?
            .duration();
        let target = match edge {
            Edge::Start | Edge::None => position,
            Edge::End => {
                if position < duration {
                    return Err(TimelineError::OutOfRange { what: "start" });
                }
                position - duration
            }
        };
        self.move_clip(id, target, true)
    }

    fn move_to_layer(&mut self, id: ClipId, priority: u32) -> Result<(), TimelineError> {
        let (li, _) = self.locate(id)?;
        if self.layers[li].priority() == priority {
            return Ok(());
        }
        if priority as usize == self.layers.len() {
            self.append_layer();
        }
        let target = self.layer_index(priority)?;
        let clip = self.layers[li]
            .take_clip(id)
            .ok_or(TimelineError::UnknownClip(id))?;
        self.layers[target].insert_sorted(clip);
        Ok(())
    }

    fn move_clip(
        &mut self,
        id: ClipId,
        target: ClockTime,
        snap: bool,
    ) -> Result<EditOutcome, TimelineError> {
        let (li, _) = self.locate(id)?;
        let duration = self.layers[li]
            .clip(id)
            .ok_or(TimelineError::UnknownClip(id))?
            .duration();
        let mut outcome = EditOutcome::default();
        let mut target = target;
        if snap
            && let Some((delta, to)) =
                self.nearest_snap(&[id], &[target, target.saturating_add(duration)])
        {
            target = target
                .checked_add_diff(delta)
                .ok_or(TimelineError::OutOfRange { what: "start" })?;
            outcome.snapped = Some(to);
        }
        let saved = self.layers.clone();
        {
            let clip = self.layers[li]
                .clip_mut(id)
                .ok_or(TimelineError::UnknownClip(id))?;
            clip.set_start(target);
            clip.sync_children();
        }
        self.layers[li].resort();
        if let Err(err) = self.check_overlaps() {
            self.layers = saved;
            return Err(err);
        }
        Ok(outcome)
    }

    fn trim_clip(
        &mut self,
        id: ClipId,
        edge: Edge,
        target: ClockTime,
        snap: bool,
    ) -> Result<EditOutcome, TimelineError> {
        let mut outcome = EditOutcome::default();
        let mut target = target;
        if snap && let Some((delta, to)) = self.nearest_snap(&[id], &[target]) {
            target = target
                .checked_add_diff(delta)
                .ok_or(TimelineError::OutOfRange { what: "start" })?;
            outcome.snapped = Some(to);
        }
        let saved = self.layers.clone();
        if let Err(err) = self
            .apply_trim(id, edge, target)
            .and_then(|()| self.check_overlaps())
        {
            self.layers = saved;
            return Err(err);
        }
        Ok(outcome)
    }

    /// Move one edge of a clip to `target`, adjusting in-point and
    /// duration. No snapping, no overlap check.
    fn apply_trim(
        &mut self,
        id: ClipId,
        edge: Edge,
        target: ClockTime,
    ) -> Result<(), TimelineError> {
        let (li, _) = self.locate(id)?;
        let clip = self.layers[li]
            .clip_mut(id)
            .ok_or(TimelineError::UnknownClip(id))?;
        match edge {
            Edge::Start => {
                let moved = clip.start().diff(target);
                let inpoint = clip
                    .inpoint()
                    .checked_add_diff(-moved)
                    .ok_or(TimelineError::OutOfRange { what: "in-point" })?;
                let duration = clip
                    .duration()
                    .checked_add_diff(moved)
                    .ok_or(TimelineError::OutOfRange { what: "duration" })?;
                if let Some(max) = clip.max_duration()
                    && inpoint.saturating_add(duration) > max
                {
                    return Err(TimelineError::DurationLimit {
                        inpoint,
                        duration,
                        max_duration: max,
                    });
                }
                clip.set_start(target);
                clip.set_inpoint(inpoint);
                clip.set_duration(duration);
            }
            Edge::End => {
                if target < clip.start() {
                    return Err(TimelineError::OutOfRange { what: "duration" });
                }
                let duration = target - clip.start();
                if let Some(max) = clip.max_duration()
                    && clip.inpoint().saturating_add(duration) > max
                {
                    return Err(TimelineError::DurationLimit {
                        inpoint: clip.inpoint(),
                        duration,
                        max_duration: max,
                    });
                }
                clip.set_duration(duration);
            }
            Edge::None => {
                return Err(TimelineError::UnsupportedEdit {
                    mode: EditMode::Trim,
                    edge,
                });
            }
        }
        clip.sync_children();
        self.layers[li].resort();
        Ok(())
    }

    fn ripple_edit(
        &mut self,
        id: ClipId,
        position: ClockTime,
    ) -> Result<EditOutcome, TimelineError> {
        let anchor = self.clip(id).ok_or(TimelineError::UnknownClip(id))?;
        let anchor_start = anchor.start();
        let duration = anchor.duration();
        let moving: Vec<ClipId> = self
            .layers
            .iter()
            .flat_map(|layer| layer.clips())
            .filter(|c| c.start() >= anchor_start)
            .filter_map(Clip::id)
            .collect();
        let mut outcome = EditOutcome::default();
        let mut target = position;
        if let Some((delta, to)) =
            self.nearest_snap(&moving, &[position, position.saturating_add(duration)])
        {
            target = target
                .checked_add_diff(delta)
                .ok_or(TimelineError::OutOfRange { what: "start" })?;
            outcome.snapped = Some(to);
        }
        let shift = target.diff(anchor_start);
        let saved = self.layers.clone();
        let result: Result<(), TimelineError> = (|| {
            for li in 0..self.layers.len() {
                for ci in 0..self.layers[li].clips().len() {
                    let clip = &self.layers[li].clips()[ci];
                    let Some(cid) = clip.id() else { continue };
                    if !moving.contains(&cid) {
                        continue;
                    }
                    let new_start = clip
                        .start()
                        .checked_add_diff(shift)
                        .ok_or(TimelineError::OutOfRange { what: "start" })?;
                    let clip = &mut self.layers[li].clips_mut()[ci];
                    clip.set_start(new_start);
                    clip.sync_children();
                }
                self.layers[li].resort();
            }
            self.check_overlaps()
        })();
        match result {
            Ok(()) => Ok(outcome),
            Err(err) => {
                self.layers = saved;
                Err(err)
            }
        }
    }

    fn roll_edit(
        &mut self,
        id: ClipId,
        edge: Edge,
        position: ClockTime,
    ) -> Result<EditOutcome, TimelineError> {
        let clip = self.clip(id).ok_or(TimelineError::UnknownClip(id))?;
        let boundary = match edge {
            Edge::Start => clip.start(),
            Edge::End => clip.end(),
            Edge::None => {
                return Err(TimelineError::UnsupportedEdit {
                    mode: EditMode::Roll,
                    edge,
                });
            }
        };
        let mut participants: Vec<(ClipId, Edge)> = vec![(id, edge)];
        for layer in &self.layers {
            for other in layer.clips() {
                let Some(oid) = other.id() else { continue };
                if oid == id {
                    continue;
                }
                match edge {
                    Edge::Start if other.end() == boundary => participants.push((oid, Edge::End)),
                    Edge::End if other.start() == boundary => {
                        participants.push((oid, Edge::Start));
                    }
                    _ => {}
                }
            }
        }
        let exclude: Vec<ClipId> = participants.iter().map(|(cid, _)| *cid).collect();
        let mut outcome = EditOutcome::default();
        let mut target = position;
        if let Some((delta, to)) = self.nearest_snap(&exclude, &[position]) {
            target = target
                .checked_add_diff(delta)
                .ok_or(TimelineError::OutOfRange { what: "start" })?;
            outcome.snapped = Some(to);
        }
        let saved = self.layers.clone();
        let result: Result<(), TimelineError> = (|| {
            for &(cid, cedge) in &participants {
                self.apply_trim(cid, cedge, target)?;
            }
            self.check_overlaps()
        })();
        match result {
            Ok(()) => Ok(outcome),
            Err(err) => {
                self.layers = saved;
                Err(err)
            }
        }
    }

    /// Frame-accurate trim shared by [`ftrim`](Timeline::ftrim) and
    /// [`fedit`](Timeline::fedit).
    ///
    /// The affected slots are first re-applied so the moving edge starts
    /// from the grid, then everything shifts by the frame difference. When
    /// a snap point interferes, the edge lands on the snap point instead
    /// and only the cached frames shift.
    fn frame_trim(
        &mut self,
        id: ClipId,
        edge: Edge,
        frame: FrameNumber,
    ) -> Result<EditOutcome, TimelineError> {
        let config = self.config()?;
        if !frame.is_valid() {
            return Err(TimelineError::OutOfRange { what: "frame" });
        }
        self.locate(id)?;

        let mut outcome = EditOutcome::default();
        let saved = self.layers.clone();
        let result: Result<(), TimelineError> = (|| {
            self.reset_clip_slots(id, edge_slot_kinds(edge), true)?;

            let (li, _) = self.locate(id)?;
            let clip = self.layers[li]
                .clip(id)
                .ok_or(TimelineError::UnknownClip(id))?;
            let slots = *clip.slots();
            let start = clip.start();
            let duration = clip.duration();
            let source = clip.source().clone();

            let fstart = slots.get(SlotKind::Start).frames;
            let frame_diff = match edge {
                Edge::Start => fstart - frame,
                Edge::End => {
                    let fduration = slots.get(SlotKind::Duration).frames;
                    if !fstart.is_valid() || !fduration.is_valid() {
                        return Err(TimelineError::OutOfRange { what: "frame" });
                    }
                    fstart.0 + fduration.0 - frame.0
                }
                Edge::None => {
                    return Err(TimelineError::UnsupportedEdit {
                        mode: EditMode::Trim,
                        edge,
                    });
                }
            };
            let diff_ns = frames_diff_to_ns(frame_diff, config.rate)?;
            let edge_ns = match edge {
                Edge::Start => start,
                _ => start.saturating_add(duration),
            };
            let raw_target = edge_ns
                .checked_add_diff(-diff_ns)
                .ok_or(TimelineError::OutOfRange { what: "frame" })?;

            let inpoint_rate = self
                .natural_framerate_of(&source)?
                .unwrap_or(config.rate);

            if let Some((delta, to)) = self.nearest_snap(&[id], &[raw_target]) {
                let target = raw_target
                    .checked_add_diff(delta)
                    .ok_or(TimelineError::OutOfRange { what: "frame" })?;
                outcome.snapped = Some(to);
                self.apply_trim(id, edge, target)?;
                let (li, _) = self.locate(id)?;
                let clip = self.layers[li]
                    .clip_mut(id)
                    .ok_or(TimelineError::UnknownClip(id))?;
                match edge {
                    Edge::Start => {
                        clip.slots_mut().shift(SlotKind::Start, -frame_diff);
                        clip.slots_mut().shift(SlotKind::Inpoint, -frame_diff);
                        clip.slots_mut().shift(SlotKind::Duration, frame_diff);
                    }
                    _ => clip.slots_mut().shift(SlotKind::Duration, -frame_diff),
                }
                clip.sync_children();
            } else {
                self.apply_frame_trim(id, edge, frame_diff, config.rate, inpoint_rate)?;
            }
            self.check_overlaps()
        })();
        match result {
            Ok(()) => Ok(outcome),
            Err(err) => {
                self.layers = saved;
                Err(err)
            }
        }
    }

    /// The unsnapped frame trim: every slot-backed value lands exactly on
    /// its grid at the shifted frame; values without a pinned slot move by
    /// the raw nanosecond difference.
    fn apply_frame_trim(
        &mut self,
        id: ClipId,
        edge: Edge,
        frame_diff: i64,
        rate: Framerate,
        inpoint_rate: Framerate,
    ) -> Result<(), TimelineError> {
        let (li, _) = self.locate(id)?;
        let clip = self.layers[li]
            .clip_mut(id)
            .ok_or(TimelineError::UnknownClip(id))?;
        match edge {
            Edge::Start => {
                let new_fstart = clip.slots().get(SlotKind::Start).frames - frame_diff;
                let new_finpoint = clip.slots().get(SlotKind::Inpoint).frames - frame_diff;
                if new_fstart.0 < 0 {
                    return Err(TimelineError::OutOfRange { what: "start" });
                }
                if new_finpoint.0 < 0 {
                    return Err(TimelineError::OutOfRange { what: "in-point" });
                }
                let new_start = frames_to_ns(new_fstart, rate)?;
                let new_inpoint = frames_to_ns(new_finpoint, inpoint_rate)?;
                let duration_slot = clip.slots().get(SlotKind::Duration);
                let new_duration = if duration_slot.used && duration_slot.frames.is_valid() {
                    let frames = duration_slot.frames + frame_diff;
                    if frames.0 < 0 {
                        return Err(TimelineError::OutOfRange { what: "duration" });
                    }
                    let exact = frames_to_ns(frames, rate)?;
                    clip.slots_mut().mark_applied(SlotKind::Duration, frames);
                    exact
                } else {
                    let moved = clip.start().diff(new_start);
                    clip.duration()
                        .checked_add_diff(moved)
                        .ok_or(TimelineError::OutOfRange { what: "duration" })?
                };
                if let Some(max) = clip.max_duration()
                    && new_inpoint.saturating_add(new_duration) > max
                {
                    return Err(TimelineError::DurationLimit {
                        inpoint: new_inpoint,
                        duration: new_duration,
                        max_duration: max,
                    });
                }
                clip.set_start(new_start);
                clip.set_inpoint(new_inpoint);
                clip.set_duration(new_duration);
                clip.slots_mut().mark_applied(SlotKind::Start, new_fstart);
                clip.slots_mut().mark_applied(SlotKind::Inpoint, new_finpoint);
            }
            Edge::End | Edge::None => {
                let new_fduration = clip.slots().get(SlotKind::Duration).frames - frame_diff;
                if new_fduration.0 < 0 {
                    return Err(TimelineError::OutOfRange { what: "duration" });
                }
                let new_duration = frames_to_ns(new_fduration, rate)?;
                if let Some(max) = clip.max_duration()
                    && clip.inpoint().saturating_add(new_duration) > max
                {
                    return Err(TimelineError::DurationLimit {
                        inpoint: clip.inpoint(),
                        duration: new_duration,
                        max_duration: max,
                    });
                }
                clip.set_duration(new_duration);
                clip.slots_mut()
                    .mark_applied(SlotKind::Duration, new_fduration);
            }
        }
        clip.sync_children();
        self.layers[li].resort();
        Ok(())
    }

    /// Nearest snap point within the snapping distance: the smallest move
    /// taking one of `edges` onto the start or end of a clip not in
    /// `exclude`.
    fn nearest_snap(
        &self,
        exclude: &[ClipId],
        edges: &[ClockTime],
    ) -> Option<(ClockTimeDiff, ClockTime)> {
        if self.snapping_distance == ClockTime::ZERO {
            return None;
        }
        let mut best: Option<(ClockTimeDiff, ClockTime)> = None;
        for layer in &self.layers {
            for other in layer.clips() {
                if other.id().is_some_and(|oid| exclude.contains(&oid)) {
                    continue;
                }
                for snap_point in [other.start(), other.end()] {
                    for &edge in edges {
                        if edge.abs_diff(snap_point) > self.snapping_distance {
                            continue;
                        }
                        let delta = snap_point.diff(edge);
                        if best.is_none_or(|(b, _)| delta.unsigned_abs() < b.unsigned_abs()) {
                            best = Some((delta, snap_point));
                        }
                    }
                }
            }
        }
        best
    }

    fn check_overlaps(&self) -> Result<(), TimelineError> {
        for layer in &self.layers {
            for track in &self.tracks {
                let group: Vec<&Clip> = layer
                    .clips()
                    .iter()
                    .filter(|c| c.occupies_track(track.id()))
                    .collect();
                check_group(&group)?;
            }
        }
        Ok(())
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

const fn edge_slot_kinds(edge: Edge) -> &'static [SlotKind] {
    match edge {
        Edge::Start => &[SlotKind::Start, SlotKind::Inpoint],
        Edge::End => &[SlotKind::Duration, SlotKind::MaxDuration],
        Edge::None => &[
            SlotKind::Start,
            SlotKind::Inpoint,
            SlotKind::Duration,
            SlotKind::MaxDuration,
        ],
    }
}

/// Overlap rules for clips sharing a layer and a track: no clip may fully
/// cover another, and no edge may overlap two clips at once.
fn check_group(clips: &[&Clip]) -> Result<(), TimelineError> {
    for (i, clip) in clips.iter().enumerate() {
        let mut at_start = 0;
        let mut at_end = 0;
        for (j, other) in clips.iter().enumerate() {
            if i == j {
                continue;
            }
            if other.start() >= clip.end() || clip.start() >= other.end() {
                continue;
            }
            let clip_inside = other.start() <= clip.start() && other.end() >= clip.end();
            let other_inside = clip.start() <= other.start() && clip.end() >= other.end();
            if clip_inside || other_inside {
                return Err(TimelineError::FullOverlap {
                    moving: clip.name().to_owned(),
                    against: other.name().to_owned(),
                });
            }
            if other.start() <= clip.start() {
                at_start += 1;
            } else {
                at_end += 1;
            }
        }
        if at_start > 1 {
            return Err(TimelineError::EdgeOverlap {
                moving: clip.name().to_owned(),
                edge: Edge::Start,
            });
        }
        if at_end > 1 {
            return Err(TimelineError::EdgeOverlap {
                moving: clip.name().to_owned(),
                edge: Edge::End,
            });
        }
    }
    Ok(())
}
