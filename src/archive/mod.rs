//! Anki package (`.apkg`) reading and writing.
//!
//! An `.apkg` is a zip archive:
//!
//! ```text
//! deck.apkg
//! ├── collection.anki2   # SQLite collection, schema version 11
//! ├── media              # JSON map {"0": "sound_….mp3", "1": "img_….png"}
//! ├── 0                  # media file bytes, stored under their index
//! └── 1
//! ```
//!
//! | Module | Direction | Entry point |
//! |---|---|---|
//! | [`writer`] | deck → archive | [`assemble`] |
//! | [`reader`] | archive → collection | [`read_collection`] |
//! | [`dump`] | collection → CSV files | [`dump_collection`] |
//! | [`catalog`] | JSON blobs in the `col` row | |
//!
//! Both directions work on a SQLite file inside a [`tempfile::TempDir`]
//! that lives only for the duration of the call.

pub mod catalog;
pub mod dump;
pub mod reader;
mod sql;
pub mod writer;

pub use dump::dump_collection;
pub use reader::read_collection;
pub use writer::assemble;

use thiserror::Error;

/// Zip entry holding the SQLite collection.
pub const COLLECTION_ENTRY: &str = "collection.anki2";
/// Zip entry holding the media index.
pub const MEDIA_ENTRY: &str = "media";
/// Separator between field values in `notes.flds`.
pub const FIELD_SEPARATOR: char = '\u{1f}';

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Archive has no '{0}' entry")]
    MissingEntry(String),
    #[error("Collection has no '{0}' table")]
    MissingTable(String),
    #[error("Note refers to unknown model {0}")]
    UnknownModel(u64),
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),
}
