/*!
    Editorial interchange: one in-memory timeline document, many file
    formats.

    The [`Document`] model is a neutral description of an edit (tracks
    of clips and gaps with rational times) and [`adapters`] convert it
    to and from concrete formats: the library's own JSON serialization
    (`.itl`), CMX 3600 edit decision lists (`.edl`), and a write-only
    emitter of the `.xcut` project format. Reading goes through
    [`adapters::read_from_file`], which also applies a
    [`MediaLinkerPolicy`] to resolve relative media references against
    the document's own directory.

    This crate stands alone; hosts that consume the converted output do
    so through the emitted files, not through a code dependency.
*/

pub mod adapters;

mod document;
mod error;
mod linker;

pub use document::{
    DocTrack, DocTrackKind, Document, Item, MediaReference, RationalTime, TimeRange,
};
pub use error::AdapterError;
pub use linker::MediaLinkerPolicy;
