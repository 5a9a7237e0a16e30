use timecode_types::ClockTime;

use crate::clip::{Clip, ClipId};

/**
    An ordered shelf of clips.

    Layers stack by priority: lower priorities sit on top when tracks are
    mixed. Clips are kept sorted by start time.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    priority: u32,
    clips: Vec<Clip>,
}

impl Layer {
    pub(crate) fn new(priority: u32) -> Self {
        Self {
            priority,
            clips: Vec::new(),
        }
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// End of the last clip, in nanoseconds.
    pub fn duration(&self) -> ClockTime {
        self.clips
            .iter()
            .map(Clip::end)
            .max()
            .unwrap_or(ClockTime::ZERO)
    }

    pub(crate) fn insert_sorted(&mut self, clip: Clip) {
        let at = self
            .clips
            .partition_point(|existing| existing.start() <= clip.start());
        self.clips.insert(at, clip);
    }

    pub(crate) fn take_clip(&mut self, id: ClipId) -> Option<Clip> {
        let at = self.clips.iter().position(|clip| clip.id() == Some(id))?;
        Some(self.clips.remove(at))
    }

    pub(crate) fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|clip| clip.id() == Some(id))
    }

    pub(crate) fn clip_mut(&mut self, id: ClipId) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|clip| clip.id() == Some(id))
    }

    pub(crate) fn clips_mut(&mut self) -> &mut [Clip] {
        &mut self.clips
    }

    /// Restore start ordering after an edit moved a clip.
    pub(crate) fn resort(&mut self) {
        self.clips.sort_by_key(Clip::start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip_at(start: u64, duration: u64) -> Clip {
        let mut clip = Clip::pattern();
        clip.set_start(ClockTime(start));
        clip.set_duration(ClockTime(duration));
        clip
    }

    #[test]
    fn clips_stay_sorted_by_start() {
        let mut layer = Layer::new(0);
        layer.insert_sorted(clip_at(200, 10));
        layer.insert_sorted(clip_at(0, 10));
        layer.insert_sorted(clip_at(100, 10));

        let starts: Vec<u64> = layer.clips().iter().map(|c| c.start().0).collect();
        assert_eq!(starts, vec![0, 100, 200]);
    }

    #[test]
    fn duration_is_last_end() {
        let mut layer = Layer::new(0);
        assert_eq!(layer.duration(), ClockTime::ZERO);

        layer.insert_sorted(clip_at(0, 100));
        layer.insert_sorted(clip_at(500, 250));
        assert_eq!(layer.duration(), ClockTime(750));
    }
}
