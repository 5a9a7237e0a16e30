/*!
    Per-format adapters and their registry.

    An [`Adapter`] converts between one file format and the common
    [`Document`] model; either direction may be unsupported. The registry
    is a fixed set known at compile time, looked up by adapter name or by
    file suffix. Lookups are try-parse style: they return `Option` or a
    typed error, never panic.
*/

use std::fs;
use std::path::Path;

use crate::document::Document;
use crate::error::AdapterError;
use crate::linker::{self, MediaLinkerPolicy};

mod edl;
mod json;
mod xcut;

pub use edl::EdlAdapter;
pub use json::JsonAdapter;
pub use xcut::XcutAdapter;

/**
    One interchange file format.
*/
pub trait Adapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// File suffixes (without dots) this adapter claims.
    fn suffixes(&self) -> &'static [&'static str];

    fn read_from_string(&self, _content: &str) -> Result<Document, AdapterError> {
        Err(AdapterError::ReadUnsupported(self.name()))
    }

    fn write_to_string(&self, _document: &Document) -> Result<String, AdapterError> {
        Err(AdapterError::WriteUnsupported(self.name()))
    }
}

static ADAPTERS: [&dyn Adapter; 3] = [&JsonAdapter, &EdlAdapter, &XcutAdapter];

/**
    Every registered adapter, in registration order.
*/
pub fn adapters() -> impl Iterator<Item = &'static dyn Adapter> {
    ADAPTERS.iter().copied()
}

/**
    The adapter registered under `name`.
*/
pub fn from_name(name: &str) -> Option<&'static dyn Adapter> {
    adapters().find(|adapter| adapter.name() == name)
}

/**
    The adapter claiming the path's suffix, matched case-insensitively.
*/
pub fn from_filepath(path: &Path) -> Option<&'static dyn Adapter> {
    let ext = path.extension()?.to_str()?;
    adapters().find(|adapter| {
        adapter
            .suffixes()
            .iter()
            .any(|suffix| suffix.eq_ignore_ascii_case(ext))
    })
}

/**
    Every suffix any adapter claims, in registration order.
*/
pub fn suffixes() -> Vec<&'static str> {
    adapters()
        .flat_map(|adapter| adapter.suffixes().iter().copied())
        .collect()
}

/**
    Read `path` with the named adapter, then apply the media-linking
    policy against the document's directory.
*/
pub fn read_from_file(
    path: &Path,
    name: &str,
    policy: MediaLinkerPolicy,
) -> Result<Document, AdapterError> {
    let adapter = from_name(name).ok_or_else(|| AdapterError::UnknownName(name.to_owned()))?;
    let content = fs::read_to_string(path)?;
    let mut document = adapter.read_from_string(&content)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    linker::link_media(&mut document, base, policy);
    Ok(document)
}

/**
    Write the document to `path` with the named adapter.
*/
pub fn write_to_file(document: &Document, path: &Path, name: &str) -> Result<(), AdapterError> {
    let adapter = from_name(name).ok_or_else(|| AdapterError::UnknownName(name.to_owned()))?;
    let content = adapter.write_to_string(document)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::document::{DocTrack, DocTrackKind, Item, MediaReference, RationalTime, TimeRange};

    fn small_doc() -> Document {
        Document::new("routing").with_track(
            DocTrack::new("V1", DocTrackKind::Video).with_item(Item::Clip {
                name: "only".into(),
                source_range: Some(TimeRange::new(
                    RationalTime::new(0.0, 24.0),
                    RationalTime::new(24.0, 24.0),
                )),
                media_reference: MediaReference::Missing,
            }),
        )
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(from_name("json").unwrap().name(), "json");
        assert_eq!(from_name("cmx_3600").unwrap().name(), "cmx_3600");
        assert_eq!(from_name("xcut").unwrap().name(), "xcut");
        assert!(from_name("fcpxml").is_none());
    }

    #[test]
    fn lookup_by_suffix() {
        assert_eq!(from_filepath(Path::new("/p/cut.itl")).unwrap().name(), "json");
        assert_eq!(from_filepath(Path::new("/p/cut.EDL")).unwrap().name(), "cmx_3600");
        assert_eq!(from_filepath(Path::new("/p/cut.xcut")).unwrap().name(), "xcut");
        assert!(from_filepath(Path::new("/p/cut.mov")).is_none());
        assert!(from_filepath(Path::new("/p/no-suffix")).is_none());
    }

    #[test]
    fn suffix_inventory() {
        let all = suffixes();
        assert!(all.contains(&"itl"));
        assert!(all.contains(&"edl"));
        assert!(all.contains(&"xcut"));
    }

    #[test]
    fn file_round_trip_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.itl");
        let doc = small_doc();

        write_to_file(&doc, &path, "json").unwrap();
        let back = read_from_file(&path, "json", MediaLinkerPolicy::DoNotLink).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn unknown_adapter_names_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.itl");
        assert!(matches!(
            write_to_file(&small_doc(), &path, "fcpxml"),
            Err(AdapterError::UnknownName(_))
        ));
        assert!(matches!(
            read_from_file(&path, "fcpxml", MediaLinkerPolicy::DoNotLink),
            Err(AdapterError::UnknownName(_))
        ));
    }

    #[test]
    fn xcut_adapter_cannot_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.xcut");
        fs::write(&path, "<cutline/>").unwrap();
        assert!(matches!(
            read_from_file(&path, "xcut", MediaLinkerPolicy::DoNotLink),
            Err(AdapterError::ReadUnsupported("xcut"))
        ));
    }
}
