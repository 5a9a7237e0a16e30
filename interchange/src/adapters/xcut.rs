/*!
    Write-only emitter for the `.xcut` project format.

    This is an independent rendition of the format, kept in lockstep with
    version 0.4 of its schema, so documents can be converted for hosts
    that read `.xcut` without this library depending on any of them.

    Layout choices when flattening a document:

    - every distinct external `target_url` becomes one project asset;
    - each document track becomes a layer, in order, with clips typed to
      the track's kind; gaps only advance the running position;
    - a timeline framerate is declared only when every placed item agrees
      on one integral rate, and then as `N/1`.
*/

use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::document::{DocTrackKind, Document, Item, MediaReference, RationalTime, TimeRange};
use crate::error::AdapterError;

use super::Adapter;

const FORMAT_VERSION: &str = "0.4";

#[derive(Debug, Clone, Copy, Default)]
pub struct XcutAdapter;

impl Adapter for XcutAdapter {
    fn name(&self) -> &'static str {
        "xcut"
    }

    fn suffixes(&self) -> &'static [&'static str] {
        &["xcut"]
    }

    fn write_to_string(&self, document: &Document) -> Result<String, AdapterError> {
        let mut buffer = Cursor::new(Vec::new());
        let mut writer = Writer::new_with_indent(&mut buffer, b' ', 2);

        emit(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
        )?;

        let mut root = BytesStart::new("cutline");
        root.push_attribute(("version", FORMAT_VERSION));
        emit(&mut writer, Event::Start(root))?;
        emit(&mut writer, Event::Start(BytesStart::new("project")))?;

        emit(&mut writer, Event::Start(BytesStart::new("resources")))?;
        for (url, duration) in collect_assets(document) {
            let mut e = BytesStart::new("asset");
            e.push_attribute(("id", url.as_str()));
            if let Some(duration) = duration {
                e.push_attribute(("duration", duration.to_string().as_str()));
            }
            emit(&mut writer, Event::Empty(e))?;
        }
        emit(&mut writer, Event::End(BytesEnd::new("resources")))?;

        let mut t = BytesStart::new("timeline");
        if let Some(rate) = uniform_integral_rate(document) {
            t.push_attribute(("framerate", format!("{rate}/1").as_str()));
            t.push_attribute(("timecode-flags", "none"));
        }
        emit(&mut writer, Event::Start(t))?;

        for (id, kind) in track_kinds(document).into_iter().enumerate() {
            let mut e = BytesStart::new("track");
            e.push_attribute(("id", id.to_string().as_str()));
            e.push_attribute(("kind", kind_name(kind)));
            emit(&mut writer, Event::Empty(e))?;
        }

        for (priority, track) in document.tracks.iter().enumerate() {
            let mut l = BytesStart::new("layer");
            l.push_attribute(("priority", priority.to_string().as_str()));
            emit(&mut writer, Event::Start(l))?;

            let mut position: u64 = 0;
            for item in &track.items {
                let Some(duration) = item.duration() else {
                    return Err(AdapterError::Malformed(
                        "an item has no determinable duration".to_owned(),
                    ));
                };
                let duration_ns = ns(duration);
                if let Item::Clip {
                    name,
                    source_range,
                    media_reference,
                } = item
                {
                    let inpoint = ns(source_start(source_range, media_reference));
                    let mut e = BytesStart::new("clip");
                    e.push_attribute(("name", name.as_str()));
                    if let MediaReference::External { target_url, .. } = media_reference {
                        e.push_attribute(("asset-id", target_url.as_str()));
                    }
                    e.push_attribute(("track-types", kind_name(track.kind)));
                    e.push_attribute(("start", position.to_string().as_str()));
                    e.push_attribute(("inpoint", inpoint.to_string().as_str()));
                    e.push_attribute(("duration", duration_ns.to_string().as_str()));
                    if let MediaReference::External {
                        available_range: Some(range),
                        ..
                    } = media_reference
                    {
                        e.push_attribute(("max-duration", ns(range.duration).to_string().as_str()));
                    }
                    emit(&mut writer, Event::Empty(e))?;
                }
                position += duration_ns;
            }
            emit(&mut writer, Event::End(BytesEnd::new("layer")))?;
        }

        emit(&mut writer, Event::End(BytesEnd::new("timeline")))?;
        emit(&mut writer, Event::End(BytesEnd::new("project")))?;
        emit(&mut writer, Event::End(BytesEnd::new("cutline")))?;

        let mut output = buffer.into_inner();
        output.push(b'\n');
        String::from_utf8(output).map_err(|e| AdapterError::Xml(e.to_string()))
    }
}

fn emit<W: std::io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), AdapterError> {
    writer
        .write_event(event)
        .map_err(|e| AdapterError::Xml(e.to_string()))
}

fn ns(time: RationalTime) -> u64 {
    (time.value * 1_000_000_000.0 / time.rate).round() as u64
}

fn source_start(
    source_range: &Option<TimeRange>,
    media_reference: &MediaReference,
) -> RationalTime {
    match (source_range, media_reference) {
        (Some(range), _) => range.start_time,
        (
            None,
            MediaReference::External {
                available_range: Some(range),
                ..
            },
        ) => range.start_time,
        _ => RationalTime::new(0.0, 1.0),
    }
}

fn kind_name(kind: DocTrackKind) -> &'static str {
    match kind {
        DocTrackKind::Video => "video",
        DocTrackKind::Audio => "audio",
    }
}

fn track_kinds(document: &Document) -> Vec<DocTrackKind> {
    let mut kinds = Vec::new();
    for track in &document.tracks {
        if !kinds.contains(&track.kind) {
            kinds.push(track.kind);
        }
    }
    kinds
}

/// Distinct external targets in order of first appearance, with the
/// first declared available duration for each.
fn collect_assets(document: &Document) -> Vec<(String, Option<u64>)> {
    let mut assets: Vec<(String, Option<u64>)> = Vec::new();
    for track in &document.tracks {
        for item in &track.items {
            let Item::Clip {
                media_reference:
                    MediaReference::External {
                        target_url,
                        available_range,
                    },
                ..
            } = item
            else {
                continue;
            };
            let duration = available_range.map(|range| ns(range.duration));
            match assets.iter_mut().find(|(url, _)| url == target_url) {
                Some((_, known)) => {
                    if known.is_none() {
                        *known = duration;
                    }
                }
                None => assets.push((target_url.clone(), duration)),
            }
        }
    }
    assets
}

/// The single integral rate every placed item uses, if there is one.
fn uniform_integral_rate(document: &Document) -> Option<i32> {
    let mut rate: Option<f64> = None;
    for track in &document.tracks {
        for item in &track.items {
            let Some(duration) = item.duration() else {
                continue;
            };
            match rate {
                None => rate = Some(duration.rate),
                Some(seen) if seen == duration.rate => {}
                Some(_) => return None,
            }
        }
    }
    let rate = rate?;
    (rate > 0.0 && rate.fract() == 0.0 && rate <= i32::MAX as f64).then_some(rate as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::document::DocTrack;

    fn hero_range() -> TimeRange {
        TimeRange::new(RationalTime::new(0.0, 30.0), RationalTime::new(300.0, 30.0))
    }

    fn sample_doc(rate: f64) -> Document {
        Document::new("flattened")
            .with_track(
                DocTrack::new("V1", DocTrackKind::Video)
                    .with_item(Item::Clip {
                        name: "hero".into(),
                        source_range: Some(TimeRange::new(
                            RationalTime::new(30.0, rate),
                            RationalTime::new(60.0, rate),
                        )),
                        media_reference: MediaReference::External {
                            target_url: "file:///media/hero.mov".into(),
                            available_range: Some(hero_range()),
                        },
                    })
                    .with_item(Item::Gap {
                        source_range: TimeRange::new(
                            RationalTime::new(0.0, rate),
                            RationalTime::new(15.0, rate),
                        ),
                    })
                    .with_item(Item::Clip {
                        name: "slate".into(),
                        source_range: Some(TimeRange::new(
                            RationalTime::new(0.0, rate),
                            RationalTime::new(30.0, rate),
                        )),
                        media_reference: MediaReference::Missing,
                    }),
            )
            .with_track(DocTrack::new("A1", DocTrackKind::Audio).with_item(Item::Clip {
                name: "bed".into(),
                source_range: Some(TimeRange::new(
                    RationalTime::new(0.0, rate),
                    RationalTime::new(90.0, rate),
                )),
                media_reference: MediaReference::Missing,
            }))
    }

    #[test]
    fn emits_the_flattened_project() {
        let text = XcutAdapter.write_to_string(&sample_doc(30.0)).unwrap();

        assert!(text.starts_with("<?xml"));
        assert!(text.contains(r#"<cutline version="0.4">"#));
        assert!(text.contains(r#"<asset id="file:///media/hero.mov" duration="10000000000"/>"#));
        assert!(text.contains(r#"framerate="30/1""#));
        assert!(text.contains(r#"<track id="0" kind="video"/>"#));
        assert!(text.contains(r#"<track id="1" kind="audio"/>"#));
        assert!(text.contains(r#"<layer priority="0">"#));
        assert!(text.contains(r#"<layer priority="1">"#));

        // hero: on the grid at 30 fps, a second of in-point, two of media.
        assert!(text.contains(
            r#"name="hero" asset-id="file:///media/hero.mov" track-types="video" start="0" inpoint="1000000000" duration="2000000000" max-duration="10000000000""#
        ));
        // slate starts after the gap and carries no asset.
        assert!(text.contains(
            r#"name="slate" track-types="video" start="2500000000" inpoint="0" duration="1000000000""#
        ));
        assert!(text.contains(r#"name="bed" track-types="audio" start="0""#));
        assert!(text.ends_with("</cutline>\n"));
    }

    #[test]
    fn fractional_rates_leave_the_grid_undeclared() {
        let text = XcutAdapter.write_to_string(&sample_doc(23.976)).unwrap();
        assert!(!text.contains("framerate"));
    }

    #[test]
    fn disagreeing_rates_leave_the_grid_undeclared() {
        let mut doc = sample_doc(30.0);
        doc.tracks[1].items[0] = Item::Clip {
            name: "bed".into(),
            source_range: Some(TimeRange::new(
                RationalTime::new(0.0, 48000.0),
                RationalTime::new(144_000.0, 48000.0),
            )),
            media_reference: MediaReference::Missing,
        };
        let text = XcutAdapter.write_to_string(&doc).unwrap();
        assert!(!text.contains("framerate"));
    }

    #[test]
    fn unsized_items_cannot_be_flattened() {
        let doc = Document::new("broken").with_track(
            DocTrack::new("V1", DocTrackKind::Video).with_item(Item::Clip {
                name: "floating".into(),
                source_range: None,
                media_reference: MediaReference::Missing,
            }),
        );
        assert!(matches!(
            XcutAdapter.write_to_string(&doc),
            Err(AdapterError::Malformed(_))
        ));
    }

    #[test]
    fn reading_is_not_supported() {
        assert!(matches!(
            XcutAdapter.read_from_string("<cutline/>"),
            Err(AdapterError::ReadUnsupported("xcut"))
        ));
    }
}
