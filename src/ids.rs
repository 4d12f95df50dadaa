//! Content-addressed identifiers for decks, models and notes.
//!
//! Anki keys decks and note types by integer ID and notes by a short GUID
//! string. Re-importing a deck only updates existing cards when all three are
//! stable, so every identifier here is a pure function of content:
//!
//! | Identifier | Seed | Function |
//! |---|---|---|
//! | Deck ID | deck name | [`generate_id`] |
//! | Model ID | model name + field names | [`generate_id`] |
//! | Note GUID | normalized front field | [`note_guid`] |
//!
//! No wall-clock time ever feeds an identifier.

use sha1::Sha1;
use sha2::{Digest, Sha256};

/// IDs are reduced into `[0, ID_MODULUS)`.
pub const ID_MODULUS: u64 = 10_000_000_000;

/// Alphabet Anki uses for base91-encoded note GUIDs.
const BASE91_TABLE: &[u8; 91] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!#$%&()*+,-./:;<=>?@[]^_`{|}~";

/// Deterministic integer ID for a seed string.
///
/// The SHA-1 digest of the seed is read as one big-endian unsigned integer
/// and reduced modulo 10^10. The reduction is done digit by digit so the full
/// 160-bit value never has to be materialized.
pub fn generate_id(seed: &str) -> u64 {
    let digest = Sha1::digest(seed.as_bytes());
    digest.iter().fold(0u64, |acc, &byte| {
        ((u128::from(acc) * 256 + u128::from(byte)) % u128::from(ID_MODULUS)) as u64
    })
}

/// Base91 GUID for an arbitrary string, matching the scheme Anki tooling
/// uses: first 8 bytes of SHA-256, big-endian, base91 encoded.
pub fn guid_for(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let mut value = u64::from_be_bytes(bytes);

    let mut encoded = Vec::new();
    while value > 0 {
        encoded.push(BASE91_TABLE[(value % 91) as usize]);
        value /= 91;
    }
    encoded.reverse();
    String::from_utf8(encoded).unwrap_or_default()
}

/// Normalized form of a front field used for note identity.
///
/// Spaces, double quotes and dots are trimmed from both ends, then the text
/// is lower-cased. `"Chat."` and `chat` are the same note.
pub fn normalize_front(front: &str) -> String {
    front
        .trim_matches(|c| c == ' ' || c == '"' || c == '.')
        .to_lowercase()
}

/// GUID for a note with the given front field.
pub fn note_guid(front: &str) -> String {
    guid_for(&normalize_front(front))
}

/// Anki's `csum` column: the first 8 hex digits of SHA-1 over the
/// tag-stripped sort field.
pub fn field_checksum(text: &str) -> i64 {
    let stripped = strip_html_tags(text);
    let digest = Sha1::digest(stripped.as_bytes());
    let head = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    i64::from(head)
}

/// Strip HTML tags from a string (simple angle-bracket stripping).
pub fn strip_html_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result
}
