//! Media generation: phonetic transcriptions, pronunciations and pictures.
//!
//! Media files are content-addressed. The name of a file is derived from the
//! text it illustrates, so rebuilding a deck finds the files it generated
//! last time instead of fetching them again:
//!
//! | Kind | File name | Field reference |
//! |---|---|---|
//! | sound | `sound_<hash>.mp3` | `[sound:sound_<hash>.mp3]` |
//! | image | `img_<hash>.png` | `<img src="img_<hash>.png">` |
//!
//! `<hash>` is [`media_hash`] of the text.
//!
//! Each kind of media comes from a trait so the enrichment logic can be
//! driven by mocks in tests:
//!
//! | Trait | Production implementation |
//! |---|---|
//! | [`Phonemizer`](phonetics::Phonemizer) | [`EspeakPhonemizer`](phonetics::EspeakPhonemizer) |
//! | [`SpeechSynthesizer`](speech::SpeechSynthesizer) | [`CommandSpeech`](speech::CommandSpeech) |
//! | [`ImageSource`](images::ImageSource) | [`BingImageSearch`](images::BingImageSearch) |

pub mod images;
pub mod imaging;
pub mod phonetics;
pub mod speech;

use regex::Regex;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Command '{program}' failed: {message}")]
    Command { program: String, message: String },
    #[error("No image found for '{0}'")]
    NoImage(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

static SOUND_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[sound:([^\]]+)\]").expect("valid regex"));
static IMAGE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img[^>]*\ssrc=["']([^"']+)["']"#).expect("valid regex"));

/// Characters trimmed from both ends before hashing.
const HASH_TRIM: &[char] = &[
    ' ', '.', ',', ';', ':', '!', '?', '\'', '"', '(', ')', '[', ']', '{', '}', '<', '>',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Sound,
}

impl MediaKind {
    pub fn prefix(self) -> &'static str {
        match self {
            MediaKind::Image => "img",
            MediaKind::Sound => "sound",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Image => "png",
            MediaKind::Sound => "mp3",
        }
    }
}

/// First 16 hex digits of SHA-256 over the lower-cased, trimmed text.
///
/// `"Chat!"`, `chat` and `(chat)` share a hash.
pub fn media_hash(text: &str) -> String {
    let normalized = text.to_lowercase();
    let digest = Sha256::digest(normalized.trim_matches(HASH_TRIM).as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..16].to_string()
}

/// `img_<hash>.png` or `sound_<hash>.mp3`.
pub fn media_file_name(text: &str, kind: MediaKind) -> String {
    format!("{}_{}.{}", kind.prefix(), media_hash(text), kind.extension())
}

/// The field value Anki renders as the media for `text`.
pub fn media_reference(text: &str, kind: MediaKind) -> String {
    let file = media_file_name(text, kind);
    match kind {
        MediaKind::Image => format!(r#"<img src="{file}">"#),
        MediaKind::Sound => format!("[sound:{file}]"),
    }
}

/// The file name a field value refers to, if it holds a media reference of
/// `kind`.
pub fn referenced_file_name(value: &str, kind: MediaKind) -> Option<&str> {
    let pattern = match kind {
        MediaKind::Image => &IMAGE_REFERENCE,
        MediaKind::Sound => &SOUND_REFERENCE,
    };
    pattern
        .captures(value)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

/// Look for `file_name` anywhere below `dir`.
///
/// Media directories are sometimes organised into sub-folders by hand; a
/// file moved there still counts as generated.
pub fn find_existing(dir: &Path, file_name: &str) -> Option<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .find(|e| e.file_name() == file_name)
        .map(|e| e.into_path())
}
