/*!
    Bridges foreign editorial formats into the formatter registry.

    [`InterchangeFormatter`] wraps the interchange library's adapters as
    one loader: it reads whatever the adapters can read, flattens the
    result into a native project in a scoped temp file, and hands that
    file to the built-in formatter. [`register`] installs it at
    [`Rank::Secondary`] so native projects keep their direct path.
*/

use std::sync::{Arc, Once};

use cutline_interchange::adapters::{self, Adapter};
use cutline_interchange::{Document, MediaLinkerPolicy};
use cutline_timeline::formatter::{
    self, Formatter, FormatterError, FormatterInfo, NATIVE_EXTENSION, Rank,
};
use cutline_timeline::{Timeline, uri};

/// Name of the adapter emitting the native project format.
const NATIVE_ADAPTER: &str = "xcut";

/**
    Loader for every format the interchange adapters can read.

    Conversion is file-to-file: the foreign document is rewritten as a
    native project in a temp file, which the default formatter then
    loads. The temp file is removed again whatever the outcome.
*/
#[derive(Debug, Clone, Copy, Default)]
pub struct InterchangeFormatter;

impl Formatter for InterchangeFormatter {
    fn can_load_uri(&self, uri: &str) -> bool {
        if !uri::is_file_uri(uri) || uri::has_extension(uri, NATIVE_EXTENSION) {
            return false;
        }
        uri::to_file_path(uri).is_some_and(|path| adapters::from_filepath(&path).is_some())
    }

    fn load_from_uri(&self, timeline: &mut Timeline, uri: &str) -> Result<(), FormatterError> {
        let path =
            uri::to_file_path(uri).ok_or_else(|| FormatterError::UnsupportedUri(uri.to_owned()))?;
        let Some(adapter) = adapters::from_filepath(&path) else {
            debug_assert!(false, "can_load_uri vouched for {uri:?}");
            return Err(FormatterError::NoFormatterFound(uri.to_owned()));
        };
        let document =
            adapters::read_from_file(&path, adapter.name(), MediaLinkerPolicy::ForceDefault)
                .map_err(|err| FormatterError::Conversion(err.to_string()))?;

        // Dropped, and thereby deleted, on every path out of here.
        let staging = tempfile::Builder::new()
            .prefix("interchange-")
            .suffix(".xcut")
            .tempfile()?;
        adapters::write_to_file(&document, staging.path(), NATIVE_ADAPTER)
            .map_err(|err| FormatterError::Conversion(err.to_string()))?;

        formatter::init();
        let (_, native) = formatter::default_formatter()
            .ok_or_else(|| FormatterError::NoFormatterFound(uri.to_owned()))?;
        native.load_from_uri(timeline, &uri::from_file_path(staging.path()))
    }
}

/**
    Install the interchange loader into the formatter registry.

    Idempotent. Returns `false` without registering when the native
    write adapter is unavailable or no foreign suffix remains to claim.
*/
pub fn register() -> bool {
    let Some(info) = bridge_info() else {
        return false;
    };
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| formatter::register(info, Arc::new(InterchangeFormatter)));
    true
}

fn bridge_info() -> Option<FormatterInfo> {
    let native = adapters::from_name(NATIVE_ADAPTER)?;
    if !writes(native) {
        return None;
    }
    let foreign: Vec<&str> = adapters::suffixes()
        .into_iter()
        .filter(|suffix| !native.suffixes().contains(suffix))
        .collect();
    if foreign.is_empty() {
        return None;
    }
    Some(
        FormatterInfo::new("interchange")
            .with_description("Foreign editorial formats through the interchange adapters")
            .with_extensions(foreign.join(","))
            .with_mimetype("application/x-interchange")
            .with_version(0.1)
            .with_rank(Rank::Secondary),
    )
}

/// Probe whether the adapter can actually serialize documents.
fn writes(adapter: &dyn Adapter) -> bool {
    adapter.write_to_string(&Document::new("probe")).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::path::PathBuf;

    use cutline_interchange::{
        DocTrack, DocTrackKind, Item, MediaReference, RationalTime, TimeRange,
    };
    use cutline_timeline::{
        ClipSource, ClockTime, Framerate, TimecodeConfig, TimecodeFlags, TrackKind,
    };

    fn range(start: f64, duration: f64, rate: f64) -> TimeRange {
        TimeRange::new(
            RationalTime::new(start, rate),
            RationalTime::new(duration, rate),
        )
    }

    fn pickups_document() -> Document {
        Document::new("pickups").with_track(
            DocTrack::new("V1", DocTrackKind::Video)
                .with_item(Item::Clip {
                    name: "hero".to_owned(),
                    source_range: Some(range(30.0, 60.0, 30.0)),
                    media_reference: MediaReference::External {
                        target_url: "file:///media/hero.mov".to_owned(),
                        available_range: Some(range(0.0, 300.0, 30.0)),
                    },
                })
                .with_item(Item::Gap {
                    source_range: range(0.0, 15.0, 30.0),
                })
                .with_item(Item::Clip {
                    name: "slate".to_owned(),
                    source_range: Some(range(0.0, 30.0, 30.0)),
                    media_reference: MediaReference::Missing,
                }),
        )
    }

    fn staging_leftovers() -> Vec<PathBuf> {
        fs::read_dir(std::env::temp_dir())
            .map(|entries| {
                entries
                    .flatten()
                    .map(|entry| entry.path())
                    .filter(|path| {
                        path.file_name()
                            .and_then(|name| name.to_str())
                            .is_some_and(|name| name.starts_with("interchange-"))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn recognizes_only_foreign_files() {
        let bridge = InterchangeFormatter;
        assert!(bridge.can_load_uri("file:///cut/pickups.itl"));
        assert!(bridge.can_load_uri("file:///cut/pickups.edl"));
        assert!(!bridge.can_load_uri("file:///cut/pickups.xcut"));
        assert!(!bridge.can_load_uri("file:///cut/pickups.mov"));
        assert!(!bridge.can_load_uri("file:///cut/pickups"));
        assert!(!bridge.can_load_uri("https://example.com/pickups.itl"));
        assert!(!bridge.can_load_uri("pickups.itl"));
    }

    #[test]
    fn registration_claims_every_foreign_suffix() {
        assert!(register());
        assert!(register());

        let info = formatter::formatters()
            .into_iter()
            .find(|info| info.name() == "interchange")
            .expect("bridge registered");
        assert_eq!(info.rank(), Rank::Secondary);
        assert_eq!(info.mimetype(), "application/x-interchange");
        assert!(info.handles_extension("itl"));
        assert!(info.handles_extension("edl"));
        assert!(!info.handles_extension("xcut"));
    }

    #[test]
    fn write_less_adapters_fail_the_probe() {
        struct Sink;

        impl Adapter for Sink {
            fn name(&self) -> &'static str {
                "sink"
            }

            fn suffixes(&self) -> &'static [&'static str] {
                &["sink"]
            }
        }

        assert!(!writes(&Sink));
        assert!(writes(
            adapters::from_name(NATIVE_ADAPTER).expect("native adapter")
        ));
    }

    #[test]
    fn loads_foreign_documents_and_cleans_up() {
        let dir = tempfile::tempdir().expect("temp dir");
        let source = dir.path().join("pickups.itl");
        adapters::write_to_file(&pickups_document(), &source, "json").expect("write itl");

        let before = staging_leftovers();

        assert!(register());
        let uri = uri::from_file_path(&source);
        let timeline = Timeline::new_from_uri(&uri).expect("load through the bridge");

        assert_eq!(timeline.project().uri(), Some(uri.as_str()));
        assert_eq!(
            timeline.timecodes_config(),
            Some(TimecodeConfig::new(Framerate::new(30, 1), TimecodeFlags::NONE))
        );
        assert_eq!(timeline.tracks().len(), 1);
        assert_eq!(timeline.tracks()[0].kind(), TrackKind::Video);

        let asset = timeline
            .project()
            .asset("file:///media/hero.mov")
            .expect("asset carried over");
        assert_eq!(asset.duration(), Some(ClockTime::from_seconds(10)));

        let clips = timeline.layer(0).expect("layer").clips();
        assert_eq!(clips.len(), 2);

        let hero = &clips[0];
        assert_eq!(hero.name(), "hero");
        assert_eq!(
            hero.source(),
            &ClipSource::Media {
                asset_id: "file:///media/hero.mov".to_owned()
            }
        );
        assert_eq!(hero.start(), ClockTime::ZERO);
        assert_eq!(hero.inpoint(), ClockTime::from_seconds(1));
        assert_eq!(hero.duration(), ClockTime::from_seconds(2));
        assert_eq!(hero.max_duration(), Some(ClockTime::from_seconds(10)));

        let slate = &clips[1];
        assert_eq!(slate.source(), &ClipSource::Pattern);
        assert_eq!(slate.start(), ClockTime(2_500_000_000));
        assert_eq!(slate.duration(), ClockTime::from_seconds(1));

        // A document the adapters read but cannot flatten: conversion
        // fails after the staging file already exists.
        let broken = dir.path().join("broken.itl");
        let floating = Document::new("broken").with_track(
            DocTrack::new("V1", DocTrackKind::Video).with_item(Item::Clip {
                name: "floating".to_owned(),
                source_range: None,
                media_reference: MediaReference::Missing,
            }),
        );
        adapters::write_to_file(&floating, &broken, "json").expect("write itl");

        let mut scratch = Timeline::new();
        let result =
            InterchangeFormatter.load_from_uri(&mut scratch, &uri::from_file_path(&broken));
        assert!(matches!(result, Err(FormatterError::Conversion(_))));

        assert_eq!(staging_leftovers(), before);
    }

    #[test]
    fn malformed_content_is_a_conversion_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let garbage = dir.path().join("garbage.edl");
        fs::write(&garbage, "this is no edit decision list\n").expect("write edl");

        let mut timeline = Timeline::new();
        let result =
            InterchangeFormatter.load_from_uri(&mut timeline, &uri::from_file_path(&garbage));
        assert!(matches!(result, Err(FormatterError::Conversion(_))));
        assert!(timeline.layers().iter().all(|layer| layer.is_empty()));
    }
}
