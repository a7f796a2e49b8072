//! Format and archive errors

use std::path::PathBuf;

use relic_codec::CodecError;

/// Result alias for format operations
pub type Result<T> = std::result::Result<T, FormatError>;

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize asset: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Bad signature: expected {expected:?}, found {found:?}")]
    BadSignature { expected: String, found: String },

    #[error("Unknown episode: {0} (expected ep4..ep8)")]
    UnknownEpisode(String),

    #[error("Unknown asset kind: {0}")]
    UnknownKind(String),

    #[error("No entry at {0}")]
    EntryNotFound(String),

    #[error(
        "Entry {path} ({length} bytes at offset {offset}) lies outside the {archive_len}-byte archive"
    )]
    EntryOutOfBounds {
        path: String,
        offset: u64,
        length: u64,
        archive_len: u64,
    },

    #[error("Invalid entry name {0:?}")]
    InvalidName(String),

    #[error("Folder nesting deeper than {limit} levels at {path}")]
    FolderTooDeep { path: PathBuf, limit: usize },
}

impl FormatError {
    /// The codec error behind this one, if any
    pub fn codec(&self) -> Option<&CodecError> {
        match self {
            FormatError::Codec(e) => Some(e),
            _ => None,
        }
    }
}
