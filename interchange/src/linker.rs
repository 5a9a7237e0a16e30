/*!
    Media linking: resolving document media references against the
    filesystem.

    Interchange files routinely carry `target_url`s relative to the
    project file itself. The default linker turns those into absolute
    `file://` URIs when the media exists next to the document, and
    downgrades the reference to [`MediaReference::Missing`] when it does
    not. Absolute URLs and paths are taken as already concrete and left
    alone.
*/

use std::fs;
use std::path::Path;

use crate::document::{Document, Item, MediaReference};

/**
    What to do about media references while reading a document.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaLinkerPolicy {
    /// Run the default linker over every external reference.
    ForceDefault,
    /// Leave references exactly as the file states them.
    DoNotLink,
}

/**
    Apply the linking policy to every clip of the document. `base` is
    the directory relative targets resolve against.
*/
pub fn link_media(document: &mut Document, base: &Path, policy: MediaLinkerPolicy) {
    if policy == MediaLinkerPolicy::DoNotLink {
        return;
    }
    for track in &mut document.tracks {
        for item in &mut track.items {
            let Item::Clip {
                media_reference, ..
            } = item
            else {
                continue;
            };
            let MediaReference::External { target_url, .. } = media_reference else {
                continue;
            };
            if !is_relative(target_url) {
                continue;
            }
            match fs::canonicalize(base.join(&*target_url)) {
                Ok(absolute) => {
                    *target_url = format!("file://{}", absolute.display());
                }
                Err(_) => *media_reference = MediaReference::Missing,
            }
        }
    }
}

fn is_relative(target: &str) -> bool {
    !target.contains("://") && !target.starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::document::{DocTrack, DocTrackKind};

    fn doc_with_target(target: &str) -> Document {
        Document::new("linked").with_track(DocTrack::new("V1", DocTrackKind::Video).with_item(
            Item::Clip {
                name: "clip".into(),
                source_range: None,
                media_reference: MediaReference::External {
                    target_url: target.into(),
                    available_range: None,
                },
            },
        ))
    }

    fn reference(document: &Document) -> &MediaReference {
        match &document.tracks[0].items[0] {
            Item::Clip {
                media_reference, ..
            } => media_reference,
            Item::Gap { .. } => panic!("expected a clip"),
        }
    }

    #[test]
    fn relative_target_next_to_the_document_is_resolved() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("take.mov"), b"x").unwrap();

        let mut doc = doc_with_target("take.mov");
        link_media(&mut doc, dir.path(), MediaLinkerPolicy::ForceDefault);

        match reference(&doc) {
            MediaReference::External { target_url, .. } => {
                assert!(target_url.starts_with("file:///"));
                assert!(target_url.ends_with("/take.mov"));
            }
            MediaReference::Missing => panic!("reference was downgraded"),
        }
    }

    #[test]
    fn unresolvable_relative_target_goes_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = doc_with_target("no-such.mov");
        link_media(&mut doc, dir.path(), MediaLinkerPolicy::ForceDefault);
        assert_eq!(reference(&doc), &MediaReference::Missing);
    }

    #[test]
    fn absolute_targets_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = doc_with_target("file:///media/elsewhere.mov");
        link_media(&mut doc, dir.path(), MediaLinkerPolicy::ForceDefault);
        match reference(&doc) {
            MediaReference::External { target_url, .. } => {
                assert_eq!(target_url, "file:///media/elsewhere.mov");
            }
            MediaReference::Missing => panic!("reference was downgraded"),
        }
    }

    #[test]
    fn do_not_link_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = doc_with_target("no-such.mov");
        link_media(&mut doc, dir.path(), MediaLinkerPolicy::DoNotLink);
        match reference(&doc) {
            MediaReference::External { target_url, .. } => assert_eq!(target_url, "no-such.mov"),
            MediaReference::Missing => panic!("reference was downgraded"),
        }
    }
}
