/*!
    The native project format: one XML document per project, saved
    with the `.xcut` extension.

    The document carries the whole editing state, cached frame values
    included, so a project diverged from the frame grid round-trips
    without resnapping:

    ```xml
    <?xml version="1.0" encoding="UTF-8"?>
    <cutline version="0.4">
      <project>
        <resources>
          <asset id="file:///media/a.mov" duration="1000000000"
                 natural-framerate="30/1" track-types="audio+video"/>
        </resources>
        <timeline framerate="25/1" timecode-flags="none" snapping-distance="0">
          <track id="0" kind="video"/>
          <track id="1" kind="audio"/>
          <layer priority="0">
            <clip name="media0" asset-id="file:///media/a.mov"
                  track-types="audio+video" start="400000000"
                  inpoint="333333333" duration="400000000"
                  max-duration="1000000000" fstart="10" finpoint="10"
                  fduration="10" fmax-duration="30"/>
          </layer>
        </timeline>
      </project>
    </cutline>
    ```

    Unknown elements and attributes are skipped, so documents written by
    newer minor versions still load.
*/

use std::fs;
use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use timecode_types::{ClockTime, FrameNumber, Framerate, TimecodeConfig, TimecodeFlags};

use crate::clip::{Clip, ClipSource};
use crate::slots::{FrameSlot, SlotKind};
use crate::track::{TrackKind, TrackTypes};
use crate::{uri, Asset, Timeline};

use super::{Formatter, FormatterError, FormatterInfo, Rank, NATIVE_EXTENSION};

/// Version written to new documents; loading rejects anything newer.
const FORMAT_VERSION: f64 = 0.4;

const FRAME_ATTRS: [(SlotKind, &str); 4] = [
    (SlotKind::Start, "fstart"),
    (SlotKind::Inpoint, "finpoint"),
    (SlotKind::Duration, "fduration"),
    (SlotKind::MaxDuration, "fmax-duration"),
];

/**
    The built-in formatter for the native `.xcut` project format.
*/
#[derive(Debug, Clone, Copy, Default)]
pub struct XcutFormatter;

impl XcutFormatter {
    pub fn formatter_info() -> FormatterInfo {
        FormatterInfo::new("xcut")
            .with_description("Native XML project format")
            .with_extensions(NATIVE_EXTENSION)
            .with_mimetype("application/xcut")
            .with_version(FORMAT_VERSION)
            .with_rank(Rank::Primary)
    }
}

impl Formatter for XcutFormatter {
    fn can_load_uri(&self, uri: &str) -> bool {
        uri::is_file_uri(uri) && uri::has_extension(uri, NATIVE_EXTENSION)
    }

    fn load_from_uri(&self, timeline: &mut Timeline, uri: &str) -> Result<(), FormatterError> {
        let path = uri::to_file_path(uri)
            .ok_or_else(|| FormatterError::UnsupportedUri(uri.to_owned()))?;
        let xml = fs::read_to_string(&path)?;
        read_document(timeline, &xml)
    }

    fn can_save_uri(&self, uri: &str) -> bool {
        uri::is_file_uri(uri)
    }

    fn save_to_uri(
        &self,
        timeline: &Timeline,
        uri: &str,
        overwrite: bool,
    ) -> Result<(), FormatterError> {
        let path = uri::to_file_path(uri)
            .ok_or_else(|| FormatterError::UnsupportedUri(uri.to_owned()))?;
        if path.exists() && !overwrite {
            return Err(FormatterError::WouldOverwrite(path));
        }
        let document = write_document(timeline)?;
        fs::write(&path, document)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

fn write_document(timeline: &Timeline) -> Result<Vec<u8>, FormatterError> {
    let mut buffer = Cursor::new(Vec::new());
    let mut writer = Writer::new_with_indent(&mut buffer, b' ', 2);

    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;

    let mut root = BytesStart::new("cutline");
    root.push_attribute(("version", FORMAT_VERSION.to_string().as_str()));
    emit(&mut writer, Event::Start(root))?;
    emit(&mut writer, Event::Start(BytesStart::new("project")))?;

    emit(&mut writer, Event::Start(BytesStart::new("resources")))?;
    for asset in timeline.project().assets() {
        let mut e = BytesStart::new("asset");
        e.push_attribute(("id", asset.id()));
        if let Some(duration) = asset.duration() {
            e.push_attribute(("duration", duration.nanos().to_string().as_str()));
        }
        if let Some(rate) = asset.natural_framerate() {
            e.push_attribute(("natural-framerate", rate.to_string().as_str()));
        }
        e.push_attribute(("track-types", asset.track_types().to_string().as_str()));
        emit(&mut writer, Event::Empty(e))?;
    }
    emit(&mut writer, Event::End(BytesEnd::new("resources")))?;

    let mut t = BytesStart::new("timeline");
    if let Some(config) = timeline.timecodes_config() {
        t.push_attribute(("framerate", config.rate.to_string().as_str()));
        t.push_attribute(("timecode-flags", config.flags.to_string().as_str()));
    }
    t.push_attribute((
        "snapping-distance",
        timeline.snapping_distance().nanos().to_string().as_str(),
    ));
    emit(&mut writer, Event::Start(t))?;

    for track in timeline.tracks() {
        let mut e = BytesStart::new("track");
        e.push_attribute(("id", track.id().0.to_string().as_str()));
        e.push_attribute(("kind", track.kind().to_name()));
        emit(&mut writer, Event::Empty(e))?;
    }

    for layer in timeline.layers() {
        let mut l = BytesStart::new("layer");
        l.push_attribute(("priority", layer.priority().to_string().as_str()));
        emit(&mut writer, Event::Start(l))?;
        for clip in layer.clips() {
            emit(&mut writer, Event::Empty(clip_element(clip)))?;
        }
        emit(&mut writer, Event::End(BytesEnd::new("layer")))?;
    }

    emit(&mut writer, Event::End(BytesEnd::new("timeline")))?;
    emit(&mut writer, Event::End(BytesEnd::new("project")))?;
    emit(&mut writer, Event::End(BytesEnd::new("cutline")))?;

    let mut output = buffer.into_inner();
    output.push(b'\n');
    Ok(output)
}

fn clip_element(clip: &Clip) -> BytesStart<'static> {
    let mut e = BytesStart::new("clip");
    e.push_attribute(("name", clip.name()));
    if let ClipSource::Media { asset_id } = clip.source() {
        e.push_attribute(("asset-id", asset_id.as_str()));
    }
    e.push_attribute(("track-types", clip.track_types().to_string().as_str()));
    e.push_attribute(("start", clip.start().nanos().to_string().as_str()));
    e.push_attribute(("inpoint", clip.inpoint().nanos().to_string().as_str()));
    e.push_attribute(("duration", clip.duration().nanos().to_string().as_str()));
    if let Some(max) = clip.max_duration() {
        e.push_attribute(("max-duration", max.nanos().to_string().as_str()));
    }
    for (kind, attr) in FRAME_ATTRS {
        let slot = clip.slots().get(kind);
        if slot.used && slot.frames.is_valid() {
            e.push_attribute((attr, slot.frames.0.to_string().as_str()));
        }
    }
    e
}

fn emit<W: std::io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), FormatterError> {
    writer
        .write_event(event)
        .map_err(|e| FormatterError::InvalidXml(e.to_string()))
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

struct ReadState {
    seen_root: bool,
    in_resources: bool,
    layer: Option<u32>,
}

fn read_document(timeline: &mut Timeline, xml: &str) -> Result<(), FormatterError> {
    let mut reader = Reader::from_str(xml);
    let mut state = ReadState {
        seen_root: false,
        in_resources: false,
        layer: None,
    };
    loop {
        match reader
            .read_event()
            .map_err(|e| FormatterError::InvalidXml(e.to_string()))?
        {
            Event::Start(e) => open_element(timeline, &e, &mut state)?,
            Event::Empty(e) => {
                open_element(timeline, &e, &mut state)?;
                close_element(e.name().as_ref(), &mut state);
            }
            Event::End(e) => close_element(e.name().as_ref(), &mut state),
            Event::Eof => break,
            _ => {}
        }
    }
    if !state.seen_root {
        return Err(FormatterError::Malformed("empty document".to_owned()));
    }
    Ok(())
}

fn open_element(
    timeline: &mut Timeline,
    e: &BytesStart<'_>,
    state: &mut ReadState,
) -> Result<(), FormatterError> {
    let name = e.name();
    if !state.seen_root {
        if name.as_ref() != b"cutline" {
            return Err(FormatterError::Malformed(
                "not a cutline project".to_owned(),
            ));
        }
        check_version(e)?;
        state.seen_root = true;
        return Ok(());
    }
    match name.as_ref() {
        b"resources" => state.in_resources = true,
        b"asset" if state.in_resources => read_asset(timeline, e)?,
        b"timeline" => read_timeline_attrs(timeline, e)?,
        b"track" => read_track(timeline, e)?,
        b"layer" => state.layer = Some(timeline.append_layer()),
        b"clip" => {
            let layer = state
                .layer
                .ok_or_else(|| FormatterError::Malformed("clip outside a layer".to_owned()))?;
            read_clip(timeline, layer, e)?;
        }
        _ => {}
    }
    Ok(())
}

fn close_element(name: &[u8], state: &mut ReadState) {
    match name {
        b"resources" => state.in_resources = false,
        b"layer" => state.layer = None,
        _ => {}
    }
}

fn check_version(e: &BytesStart<'_>) -> Result<(), FormatterError> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"version" {
            let value = String::from_utf8_lossy(&attr.value).into_owned();
            let version: f64 = value
                .parse()
                .map_err(|_| FormatterError::Malformed(format!("bad version: {value:?}")))?;
            if version > FORMAT_VERSION {
                return Err(FormatterError::Malformed(format!(
                    "document version {version} is newer than {FORMAT_VERSION}"
                )));
            }
        }
    }
    Ok(())
}

fn read_asset(timeline: &mut Timeline, e: &BytesStart<'_>) -> Result<(), FormatterError> {
    let mut id = None;
    let mut duration = None;
    let mut natural = None;
    let mut track_types = None;
    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        match attr.key.as_ref() {
            b"id" => id = Some(value),
            b"duration" => duration = Some(ClockTime(parse_u64("asset duration", &value)?)),
            b"natural-framerate" => natural = Some(value.parse::<Framerate>()?),
            b"track-types" => track_types = Some(value.parse::<TrackTypes>()?),
            _ => {}
        }
    }
    let id = id.ok_or_else(|| FormatterError::Malformed("asset without an id".to_owned()))?;
    let mut asset = Asset::new(id);
    if let Some(duration) = duration {
        asset = asset.with_duration(duration);
    }
    if let Some(rate) = natural {
        asset = asset.with_natural_framerate(rate);
    }
    if let Some(types) = track_types {
        asset = asset.with_track_types(types);
    }
    timeline.register_asset(asset);
    Ok(())
}

fn read_timeline_attrs(timeline: &mut Timeline, e: &BytesStart<'_>) -> Result<(), FormatterError> {
    let mut rate = None;
    let mut flags = TimecodeFlags::NONE;
    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        match attr.key.as_ref() {
            b"framerate" => rate = Some(value.parse::<Framerate>()?),
            b"timecode-flags" => flags = value.parse::<TimecodeFlags>()?,
            b"snapping-distance" => {
                let distance = ClockTime(parse_u64("snapping-distance", &value)?);
                timeline.set_snapping_distance(distance);
            }
            _ => {}
        }
    }
    timeline.restore_timecodes(rate.map(|rate| TimecodeConfig::new(rate, flags)));
    Ok(())
}

fn read_track(timeline: &mut Timeline, e: &BytesStart<'_>) -> Result<(), FormatterError> {
    let mut kind = None;
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"kind" {
            let value = String::from_utf8_lossy(&attr.value).into_owned();
            kind = Some(TrackKind::from_name(value.as_bytes()).ok_or_else(|| {
                FormatterError::Malformed(format!("bad track kind: {value:?}"))
            })?);
        }
    }
    let kind = kind.ok_or_else(|| FormatterError::Malformed("track without a kind".to_owned()))?;
    timeline.add_track(kind);
    Ok(())
}

fn read_clip(
    timeline: &mut Timeline,
    layer: u32,
    e: &BytesStart<'_>,
) -> Result<(), FormatterError> {
    let mut name = None;
    let mut asset_id = None;
    let mut track_types = None;
    let mut start = ClockTime::ZERO;
    let mut inpoint = ClockTime::ZERO;
    let mut duration = ClockTime::ZERO;
    let mut max_duration = None;
    let mut slots: Vec<(SlotKind, FrameNumber)> = Vec::new();
    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        match attr.key.as_ref() {
            b"name" => name = Some(value),
            b"asset-id" => asset_id = Some(value),
            b"track-types" => track_types = Some(value.parse::<TrackTypes>()?),
            b"start" => start = ClockTime(parse_u64("clip start", &value)?),
            b"inpoint" => inpoint = ClockTime(parse_u64("clip inpoint", &value)?),
            b"duration" => duration = ClockTime(parse_u64("clip duration", &value)?),
            b"max-duration" => {
                max_duration = Some(ClockTime(parse_u64("clip max-duration", &value)?));
            }
            key => {
                for (kind, attr_name) in FRAME_ATTRS {
                    if key == attr_name.as_bytes() {
                        let frames = FrameNumber(parse_i64(attr_name, &value)?);
                        slots.push((kind, frames));
                    }
                }
            }
        }
    }
    let mut clip = match asset_id {
        Some(asset_id) => {
            let asset = timeline
                .project()
                .asset(&asset_id)
                .cloned()
                .ok_or_else(|| {
                    FormatterError::Malformed(format!(
                        "clip references unknown asset {asset_id:?}"
                    ))
                })?;
            Clip::from_asset(&asset)
        }
        None => Clip::pattern(),
    };
    if let Some(name) = name {
        clip = clip.with_name(name);
    }
    if let Some(types) = track_types {
        clip = clip.with_track_types(types);
    }
    clip.set_start(start);
    clip.set_inpoint(inpoint);
    clip.set_duration(duration);
    clip.set_max_duration(max_duration);
    for (kind, frames) in slots {
        clip.slots_mut().restore(kind, FrameSlot { frames, used: true });
    }
    timeline
        .restore_clip(layer, clip)
        .map_err(|err| FormatterError::Malformed(err.to_string()))?;
    Ok(())
}

fn parse_u64(name: &str, value: &str) -> Result<u64, FormatterError> {
    value
        .parse()
        .map_err(|_| FormatterError::Malformed(format!("bad {name}: {value:?}")))
}

fn parse_i64(name: &str, value: &str) -> Result<i64, FormatterError> {
    value
        .parse()
        .map_err(|_| FormatterError::Malformed(format!("bad {name}: {value:?}")))
}
