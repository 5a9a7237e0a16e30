use timecode_types::{ClockTime, Framerate};

use crate::track::TrackTypes;

/**
    Declared metadata for a piece of media.

    Assets are registered on a timeline's [`Project`](crate::Project) and
    referenced by clips through their id (typically the media URI). The
    *natural framerate* is the frame rate intrinsic to the media itself,
    independent of any timeline's configured rate; in-point and
    max-duration frame values of clips made from this asset are expressed
    against it.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    id: String,
    duration: Option<ClockTime>,
    natural_framerate: Option<Framerate>,
    track_types: TrackTypes,
}

impl Asset {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            duration: None,
            natural_framerate: None,
            track_types: TrackTypes::AUDIO_VIDEO,
        }
    }

    pub fn with_duration(mut self, duration: ClockTime) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_natural_framerate(mut self, framerate: Framerate) -> Self {
        self.natural_framerate = Some(framerate);
        self
    }

    pub fn with_track_types(mut self, track_types: TrackTypes) -> Self {
        self.track_types = track_types;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn duration(&self) -> Option<ClockTime> {
        self.duration
    }

    pub fn natural_framerate(&self) -> Option<Framerate> {
        self.natural_framerate
    }

    pub fn track_types(&self) -> TrackTypes {
        self.track_types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let asset = Asset::new("file:///media/a.mov");
        assert_eq!(asset.id(), "file:///media/a.mov");
        assert_eq!(asset.duration(), None);
        assert_eq!(asset.natural_framerate(), None);
        assert_eq!(asset.track_types(), TrackTypes::AUDIO_VIDEO);
    }

    #[test]
    fn builder_overrides() {
        let asset = Asset::new("a")
            .with_duration(ClockTime::SECOND)
            .with_natural_framerate(Framerate::new(30, 1))
            .with_track_types(TrackTypes::VIDEO);
        assert_eq!(asset.duration(), Some(ClockTime::SECOND));
        assert_eq!(asset.natural_framerate(), Some(Framerate::new(30, 1)));
        assert_eq!(asset.track_types(), TrackTypes::VIDEO);
    }
}
