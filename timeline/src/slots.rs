/*!
    Cached frame values for timeline elements.

    Every element carries one slot per timed property. A slot holds the
    last frame count requested or derived for that property, and whether
    that count has been applied against a frame grid (`used`). Slots are
    written by the frame setters and by edits; the plain nanosecond
    setters leave them alone, so a cached count can intentionally go
    stale until the next grid reset.
*/

use timecode_types::FrameNumber;

/**
    The four timed properties that carry a frame cache.

    `Start` and `Duration` are expressed against the timeline's configured
    rate, `Inpoint` and `MaxDuration` against the element's natural rate.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Start,
    Duration,
    Inpoint,
    MaxDuration,
}

impl SlotKind {
    pub const ALL: [Self; 4] = [Self::Start, Self::Duration, Self::Inpoint, Self::MaxDuration];

    /// Whether frame counts in this slot use the element's natural rate.
    pub const fn uses_natural_rate(self) -> bool {
        matches!(self, Self::Inpoint | Self::MaxDuration)
    }

    const fn index(self) -> usize {
        match self {
            Self::Start => 0,
            Self::Duration => 1,
            Self::Inpoint => 2,
            Self::MaxDuration => 3,
        }
    }
}

/**
    One cached frame value.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSlot {
    pub frames: FrameNumber,
    pub used: bool,
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self {
            frames: FrameNumber::NONE,
            used: false,
        }
    }
}

/**
    The full set of frame caches of one element.
*/
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSlots([FrameSlot; 4]);

impl FrameSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: SlotKind) -> FrameSlot {
        self.0[kind.index()]
    }

    /**
        Record a requested frame count without applying it.

        Used while the element is outside a timeline; the count is picked
        up when the element is attached.
    */
    pub fn set_frames(&mut self, kind: SlotKind, frames: FrameNumber) {
        self.0[kind.index()].frames = frames;
    }

    /**
        Record a frame count that has been applied against a grid.
    */
    pub fn mark_applied(&mut self, kind: SlotKind, frames: FrameNumber) {
        self.0[kind.index()] = FrameSlot { frames, used: true };
    }

    /// Put back a previously read slot, `used` flag included.
    pub(crate) fn restore(&mut self, kind: SlotKind, slot: FrameSlot) {
        self.0[kind.index()] = slot;
    }

    /**
        Shift an applied cache by a signed frame count. Unapplied slots
        are left alone.
    */
    pub fn shift(&mut self, kind: SlotKind, diff: i64) {
        let slot = &mut self.0[kind.index()];
        if slot.used && slot.frames.is_valid() {
            slot.frames = slot.frames + diff;
        }
    }

    /// True when any slot holds a valid frame count.
    pub fn any_valid(&self) -> bool {
        self.0.iter().any(|slot| slot.frames.is_valid())
    }
}
