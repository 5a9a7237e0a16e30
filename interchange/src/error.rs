use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("no adapter named {0:?}")]
    UnknownName(String),

    #[error("no adapter handles {0:?}")]
    UnknownSuffix(PathBuf),

    #[error("the {0} adapter cannot read")]
    ReadUnsupported(&'static str),

    #[error("the {0} adapter cannot write")]
    WriteUnsupported(&'static str),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("xml: {0}")]
    Xml(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
