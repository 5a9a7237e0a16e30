/*!
    The library's own serialization: the [`Document`] model as JSON,
    under the `.itl` suffix.
*/

use crate::document::Document;
use crate::error::AdapterError;

use super::Adapter;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonAdapter;

impl Adapter for JsonAdapter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn suffixes(&self) -> &'static [&'static str] {
        &["itl"]
    }

    fn read_from_string(&self, content: &str) -> Result<Document, AdapterError> {
        Ok(serde_json::from_str(content)?)
    }

    fn write_to_string(&self, document: &Document) -> Result<String, AdapterError> {
        let mut out = serde_json::to_string_pretty(document)?;
        out.push('\n');
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::document::{DocTrack, DocTrackKind, Item, MediaReference, RationalTime, TimeRange};

    #[test]
    fn document_round_trip() {
        let doc = Document::new("two lane")
            .with_track(
                DocTrack::new("V1", DocTrackKind::Video)
                    .with_item(Item::Gap {
                        source_range: TimeRange::new(
                            RationalTime::new(0.0, 30.0),
                            RationalTime::new(15.0, 30.0),
                        ),
                    })
                    .with_item(Item::Clip {
                        name: "hero".into(),
                        source_range: Some(TimeRange::new(
                            RationalTime::new(30.0, 30.0),
                            RationalTime::new(60.0, 30.0),
                        )),
                        media_reference: MediaReference::External {
                            target_url: "file:///media/hero.mov".into(),
                            available_range: Some(TimeRange::new(
                                RationalTime::new(0.0, 30.0),
                                RationalTime::new(300.0, 30.0),
                            )),
                        },
                    }),
            )
            .with_track(DocTrack::new("A1", DocTrackKind::Audio).with_item(Item::Clip {
                name: "bed".into(),
                source_range: Some(TimeRange::new(
                    RationalTime::new(0.0, 30.0),
                    RationalTime::new(75.0, 30.0),
                )),
                media_reference: MediaReference::Missing,
            }));

        let text = JsonAdapter.write_to_string(&doc).unwrap();
        assert!(text.ends_with('\n'));
        let back = JsonAdapter.read_from_string(&text).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn malformed_json_is_a_typed_error() {
        assert!(matches!(
            JsonAdapter.read_from_string("{ not json"),
            Err(AdapterError::Json(_))
        ));
        assert!(matches!(
            JsonAdapter.read_from_string(r#"{"name": "x", "tracks": 3}"#),
            Err(AdapterError::Json(_))
        ));
    }
}
