/*!
    CMX 3600 edit decision lists, under the `.edl` suffix.

    The supported subset is the one cut-only lists use: a `TITLE:` line,
    `FCM:` frame-count marks, numbered events with `C` transitions, and
    the `* FROM CLIP NAME:` / `* SOURCE FILE:` note lines that follow an
    event. Timecodes are read and written at the format's customary
    24 fps; drop-frame marks relabel timecodes without moving them, so
    `FCM:` lines are accepted and otherwise ignored.

    Record timecodes are absolute track positions: a hole between one
    event's record-out and the next event's record-in becomes an
    [`Item::Gap`]. Events within a track must be in record order.
*/

use crate::document::{
    DocTrack, DocTrackKind, Document, Item, MediaReference, RationalTime, TimeRange,
};
use crate::error::AdapterError;

use super::Adapter;

const DEFAULT_RATE: f64 = 24.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct EdlAdapter;

impl Adapter for EdlAdapter {
    fn name(&self) -> &'static str {
        "cmx_3600"
    }

    fn suffixes(&self) -> &'static [&'static str] {
        &["edl"]
    }

    fn read_from_string(&self, content: &str) -> Result<Document, AdapterError> {
        let mut name = String::new();
        let mut tracks: Vec<DocTrack> = Vec::new();
        let mut last_clip: Option<(usize, usize)> = None;

        for raw in content.lines() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(title) = line.strip_prefix("TITLE:") {
                name = title.trim().to_owned();
            } else if line.strip_prefix("FCM:").is_some() {
                continue;
            } else if let Some(note) = line.strip_prefix('*') {
                let Some((track, item)) = last_clip else {
                    return Err(AdapterError::Malformed(format!(
                        "note before any event: {line:?}"
                    )));
                };
                apply_note(note.trim(), &mut tracks[track].items[item]);
            } else {
                last_clip = Some(read_event(line, &mut tracks)?);
            }
        }
        Ok(Document { name, tracks })
    }

    fn write_to_string(&self, document: &Document) -> Result<String, AdapterError> {
        let mut out = String::new();
        out.push_str(&format!("TITLE: {}\n", document.name));
        out.push_str("FCM: NON-DROP FRAME\n");

        let mut event = 0u32;
        for track in &document.tracks {
            let channel = match track.kind {
                DocTrackKind::Video => "V",
                DocTrackKind::Audio => "A",
            };
            let mut record = 0i64;
            for item in &track.items {
                let Some(duration) = item.duration() else {
                    return Err(AdapterError::Malformed(
                        "an item has no determinable duration".to_owned(),
                    ));
                };
                let frames = frames_at_default(duration);
                let Item::Clip {
                    name,
                    source_range,
                    media_reference,
                } = item
                else {
                    record += frames;
                    continue;
                };
                let start = match (source_range, media_reference) {
                    (Some(range), _) => range.start_time,
                    (
                        None,
                        MediaReference::External {
                            available_range: Some(range),
                            ..
                        },
                    ) => range.start_time,
                    _ => RationalTime::new(0.0, DEFAULT_RATE),
                };
                let src_in = frames_at_default(start);

                event += 1;
                out.push('\n');
                out.push_str(&format!(
                    "{event:03}  AX       {channel:<4} C        {} {} {} {}\n",
                    format_timecode(src_in),
                    format_timecode(src_in + frames),
                    format_timecode(record),
                    format_timecode(record + frames),
                ));
                if !name.is_empty() {
                    out.push_str(&format!("* FROM CLIP NAME: {name}\n"));
                }
                if let MediaReference::External { target_url, .. } = media_reference {
                    out.push_str(&format!("* SOURCE FILE: {target_url}\n"));
                }
                record += frames;
            }
        }
        Ok(out)
    }
}

fn apply_note(note: &str, item: &mut Item) {
    let Item::Clip {
        name,
        media_reference,
        ..
    } = item
    else {
        return;
    };
    if let Some(clip_name) = note.strip_prefix("FROM CLIP NAME:") {
        *name = clip_name.trim().to_owned();
    } else if let Some(url) = note.strip_prefix("SOURCE FILE:") {
        *media_reference = MediaReference::External {
            target_url: url.trim().to_owned(),
            available_range: None,
        };
    }
}

fn read_event(line: &str, tracks: &mut Vec<DocTrack>) -> Result<(usize, usize), AdapterError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 8 || fields[0].parse::<u32>().is_err() {
        return Err(AdapterError::Malformed(format!(
            "unrecognized line: {line:?}"
        )));
    }
    let reel = fields[1];
    let (track_name, kind) = match fields[2] {
        "V" => ("V", DocTrackKind::Video),
        "A" => ("A", DocTrackKind::Audio),
        other => {
            return Err(AdapterError::Malformed(format!(
                "unsupported channel {other:?}"
            )));
        }
    };
    if fields[3] != "C" {
        return Err(AdapterError::Malformed(format!(
            "only cut transitions are supported, got {:?}",
            fields[3]
        )));
    }
    let src_in = parse_timecode(fields[4])?;
    let src_out = parse_timecode(fields[5])?;
    let rec_in = parse_timecode(fields[6])?;
    let rec_out = parse_timecode(fields[7])?;
    if src_out < src_in || rec_out < rec_in {
        return Err(AdapterError::Malformed(format!(
            "event runs backwards: {line:?}"
        )));
    }

    let track = match tracks.iter().position(|t| t.kind == kind) {
        Some(found) => found,
        None => {
            tracks.push(DocTrack::new(track_name, kind));
            tracks.len() - 1
        }
    };
    let end = track_end(&tracks[track]);
    if rec_in < end {
        return Err(AdapterError::Malformed(format!(
            "event out of record order: {line:?}"
        )));
    }
    if rec_in > end {
        tracks[track].items.push(Item::Gap {
            source_range: TimeRange::new(
                RationalTime::new(0.0, DEFAULT_RATE),
                RationalTime::new((rec_in - end) as f64, DEFAULT_RATE),
            ),
        });
    }
    tracks[track].items.push(Item::Clip {
        name: reel.to_owned(),
        source_range: Some(TimeRange::new(
            RationalTime::new(src_in as f64, DEFAULT_RATE),
            RationalTime::new((rec_out - rec_in) as f64, DEFAULT_RATE),
        )),
        media_reference: MediaReference::Missing,
    });
    Ok((track, tracks[track].items.len() - 1))
}

fn track_end(track: &DocTrack) -> i64 {
    track
        .items
        .iter()
        .filter_map(Item::duration)
        .map(frames_at_default)
        .sum()
}

fn frames_at_default(time: RationalTime) -> i64 {
    time.rescaled_to(DEFAULT_RATE).value.round() as i64
}

fn parse_timecode(field: &str) -> Result<i64, AdapterError> {
    let err = || AdapterError::Malformed(format!("bad timecode: {field:?}"));
    let parts: Vec<&str> = field.split([':', ';']).collect();
    if parts.len() != 4 {
        return Err(err());
    }
    let mut numbers = [0i64; 4];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        *slot = part.parse().map_err(|_| err())?;
    }
    let [hh, mm, ss, ff] = numbers;
    let fps = DEFAULT_RATE as i64;
    if hh < 0 || !(0..60).contains(&mm) || !(0..60).contains(&ss) || !(0..fps).contains(&ff) {
        return Err(err());
    }
    Ok(((hh * 60 + mm) * 60 + ss) * fps + ff)
}

fn format_timecode(frames: i64) -> String {
    let fps = DEFAULT_RATE as i64;
    let ff = frames % fps;
    let seconds = frames / fps;
    let ss = seconds % 60;
    let mm = (seconds / 60) % 60;
    let hh = seconds / 3600;
    format!("{hh:02}:{mm:02}:{ss:02}:{ff:02}")
}
