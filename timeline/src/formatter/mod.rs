/*!
    Project formatters and their registry.

    A [`Formatter`] serializes timelines to, and deserializes them from,
    one file format. Formatters register themselves process-wide with a
    [`FormatterInfo`] describing their name, file extensions, and
    [`Rank`]; lookups walk the registry from the highest rank down, in
    registration order within a rank.

    [`init`] installs the built-in native XML formatter and is safe to
    call any number of times.
*/

use core::fmt;
use core::str::FromStr;

use std::path::PathBuf;
use std::sync::{Arc, Once, OnceLock, RwLock};

use thiserror::Error;

use timecode_types::ParseError;

use crate::Timeline;

mod xml;

pub use xml::XcutFormatter;

/// Extension of the native project format.
pub const NATIVE_EXTENSION: &str = "xcut";

#[derive(Debug, Error)]
pub enum FormatterError {
    #[error("unsupported uri {0:?}")]
    UnsupportedUri(String),

    #[error("no formatter can handle {0:?}")]
    NoFormatterFound(String),

    #[error("refusing to overwrite {0:?}")]
    WouldOverwrite(PathBuf),

    #[error("this formatter cannot save")]
    SaveUnsupported,

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("invalid XML: {0}")]
    InvalidXml(String),

    #[error("invalid value: {0}")]
    InvalidValue(#[from] ParseError),

    #[error("conversion failed: {0}")]
    Conversion(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Rank
// ---------------------------------------------------------------------------

/**
    Priority class of a formatter.

    Lookups prefer higher ranks; `Secondary` formatters are only tried
    after every `Primary` one passed.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    None,
    Marginal,
    Secondary,
    Primary,
}

impl Rank {
    pub const fn value(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Marginal => 64,
            Self::Secondary => 128,
            Self::Primary => 256,
        }
    }

    pub const fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"none" => Some(Self::None),
            b"marginal" => Some(Self::Marginal),
            b"secondary" => Some(Self::Secondary),
            b"primary" => Some(Self::Primary),
            _ => None,
        }
    }

    pub const fn to_name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Marginal => "marginal",
            Self::Secondary => "secondary",
            Self::Primary => "primary",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

impl FromStr for Rank {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s.as_bytes()).ok_or_else(|| ParseError {
            kind: "formatter rank",
            value: s.to_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Formatter metadata and trait
// ---------------------------------------------------------------------------

/**
    Registration metadata of a formatter.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct FormatterInfo {
    name: String,
    description: String,
    extensions: String,
    mimetype: String,
    version: f64,
    rank: Rank,
}

impl FormatterInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            extensions: String::new(),
            mimetype: String::new(),
            version: 0.0,
            rank: Rank::None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Comma-separated list of file extensions (without dots).
    pub fn with_extensions(mut self, extensions: impl Into<String>) -> Self {
        self.extensions = extensions.into();
        self
    }

    pub fn with_mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.mimetype = mimetype.into();
        self
    }

    pub fn with_version(mut self, version: f64) -> Self {
        self.version = version;
        self
    }

    pub fn with_rank(mut self, rank: Rank) -> Self {
        self.rank = rank;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn extensions(&self) -> &str {
        &self.extensions
    }

    pub fn mimetype(&self) -> &str {
        &self.mimetype
    }

    pub fn version(&self) -> f64 {
        self.version
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn extension_list(&self) -> impl Iterator<Item = &str> {
        self.extensions
            .split(',')
            .map(str::trim)
            .filter(|ext| !ext.is_empty())
    }

    pub fn handles_extension(&self, ext: &str) -> bool {
        self.extension_list()
            .any(|known| known.eq_ignore_ascii_case(ext))
    }
}

/**
    One project file format.

    Loading is mandatory; saving defaults to unsupported.
*/
pub trait Formatter: Send + Sync {
    fn can_load_uri(&self, uri: &str) -> bool;

    fn load_from_uri(&self, timeline: &mut Timeline, uri: &str) -> Result<(), FormatterError>;

    fn can_save_uri(&self, _uri: &str) -> bool {
        false
    }

    fn save_to_uri(
        &self,
        _timeline: &Timeline,
        _uri: &str,
        _overwrite: bool,
    ) -> Result<(), FormatterError> {
        Err(FormatterError::SaveUnsupported)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

struct Entry {
    info: FormatterInfo,
    formatter: Arc<dyn Formatter>,
}

static REGISTRY: OnceLock<RwLock<Vec<Entry>>> = OnceLock::new();
static INIT: Once = Once::new();

fn entries() -> &'static RwLock<Vec<Entry>> {
    REGISTRY.get_or_init(|| RwLock::new(Vec::new()))
}

/**
    Install the built-in formatters. Idempotent.
*/
pub fn init() {
    INIT.call_once(|| {
        register(XcutFormatter::formatter_info(), Arc::new(XcutFormatter));
    });
}

/**
    Add a formatter to the process-wide registry.
*/
pub fn register(info: FormatterInfo, formatter: Arc<dyn Formatter>) {
    entries().write().unwrap().push(Entry { info, formatter });
}

/**
    Metadata of every registered formatter, best rank first.
*/
pub fn formatters() -> Vec<FormatterInfo> {
    ranked().into_iter().map(|(info, _)| info).collect()
}

/**
    The highest-ranked formatter; ties go to the earliest registration.
*/
pub fn default_formatter() -> Option<(FormatterInfo, Arc<dyn Formatter>)> {
    ranked().into_iter().next()
}

/**
    The best formatter claiming it can load the given URI.
*/
pub fn for_load_uri(uri: &str) -> Option<(FormatterInfo, Arc<dyn Formatter>)> {
    ranked()
        .into_iter()
        .find(|(_, formatter)| formatter.can_load_uri(uri))
}

/**
    The best formatter registered for the URI's file extension.
*/
pub fn for_uri(uri: &str) -> Option<(FormatterInfo, Arc<dyn Formatter>)> {
    let ext = crate::uri::extension(uri)?;
    ranked()
        .into_iter()
        .find(|(info, _)| info.handles_extension(&ext))
}

fn ranked() -> Vec<(FormatterInfo, Arc<dyn Formatter>)> {
    let mut all: Vec<_> = entries()
        .read()
        .unwrap()
        .iter()
        .map(|entry| (entry.info.clone(), Arc::clone(&entry.formatter)))
        .collect();
    // Stable sort keeps registration order inside a rank.
    all.sort_by(|a, b| b.0.rank().cmp(&a.0.rank()));
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Refusenik;

    impl Formatter for Refusenik {
        fn can_load_uri(&self, _uri: &str) -> bool {
            false
        }

        fn load_from_uri(
            &self,
            _timeline: &mut Timeline,
            uri: &str,
        ) -> Result<(), FormatterError> {
            Err(FormatterError::UnsupportedUri(uri.to_owned()))
        }
    }

    #[test]
    fn rank_values() {
        assert_eq!(Rank::None.value(), 0);
        assert_eq!(Rank::Marginal.value(), 64);
        assert_eq!(Rank::Secondary.value(), 128);
        assert_eq!(Rank::Primary.value(), 256);
        assert!(Rank::Primary > Rank::Secondary);
    }

    #[test]
    fn rank_names_round_trip() {
        for rank in [Rank::None, Rank::Marginal, Rank::Secondary, Rank::Primary] {
            assert_eq!(rank.to_name().parse::<Rank>().unwrap(), rank);
        }
        assert!("tertiary".parse::<Rank>().is_err());
    }

    #[test]
    fn info_extension_list() {
        let info = FormatterInfo::new("multi").with_extensions("itl, edl,xcut");
        let list: Vec<&str> = info.extension_list().collect();
        assert_eq!(list, vec!["itl", "edl", "xcut"]);
        assert!(info.handles_extension("EDL"));
        assert!(!info.handles_extension("mov"));
    }

    #[test]
    fn native_formatter_wins_by_rank() {
        init();
        register(
            FormatterInfo::new("refusenik")
                .with_extensions("xcut")
                .with_rank(Rank::Marginal),
            Arc::new(Refusenik),
        );

        let (info, _) = default_formatter().unwrap();
        assert_eq!(info.rank(), Rank::Primary);

        let (info, _) = for_uri("file:///tmp/project.xcut").unwrap();
        assert_eq!(info.name(), "xcut");
    }

    #[test]
    fn save_defaults_to_unsupported() {
        let timeline = Timeline::new();
        assert!(!Refusenik.can_save_uri("file:///x.any"));
        assert!(matches!(
            Refusenik.save_to_uri(&timeline, "file:///x.any", true),
            Err(FormatterError::SaveUnsupported)
        ));
    }
}
