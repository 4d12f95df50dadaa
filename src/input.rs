//! Tabular input: delimited text files with a header row.
//!
//! Decoding tries each configured encoding in order with strict error
//! handling. A decoding that fails, or that yields a header but no data rows,
//! moves on to the next encoding. ISO-8859-1 accepts every byte sequence, so
//! it belongs after the stricter encodings in the list.
//!
//! ## Delimiters
//!
//! | Setting | Delimiter |
//! |---|---|
//! | `auto` | most frequent of `;` `,` tab `\|` in the header line, else `,` |
//! | `tab` or `\t` | tab |
//! | any single ASCII character | that character |
//!
//! Records are read with the `csv` crate in flexible mode: rows may be
//! shorter or longer than the header. Shape checks happen later, in
//! [`crate::normalize`], where a bad row is skipped instead of failing the
//! whole file.

use crate::config::InputConfig;
use crate::schema::{FieldSchema, SchemaError};
use crate::types::{Row, Table};
use encoding::label::encoding_from_whatwg_label;
use encoding::{DecoderTrap, EncodingRef, all};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Candidate delimiters for `auto` detection, in tie-break order.
pub const SNIFF_DELIMITERS: &[u8] = b";,\t|";

#[derive(Error, Debug)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not read {path} with any of the encodings: {tried}")]
    Unreadable { path: PathBuf, tried: String },
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),
    #[error("Invalid delimiter: {0:?}")]
    InvalidDelimiter(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Header error: {0}")]
    Schema(#[from] SchemaError),
}

/// Read a delimited file into a [`Table`].
pub fn read_table(path: &Path, config: &InputConfig) -> Result<Table, InputError> {
    let bytes = fs::read(path)?;
    let delimiter = parse_delimiter(&config.delimiter)?;

    for label in &config.encodings {
        let encoding = lookup_encoding(label)?;
        let text = match encoding.decode(&bytes, DecoderTrap::Strict) {
            Ok(text) => text,
            Err(reason) => {
                debug!("{} is not valid {label}: {reason}", path.display());
                continue;
            }
        };
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
        let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(text));

        match parse_table(text, delimiter)? {
            Some(table) => {
                info!(
                    "Read {} rows from {} ({label}, delimiter {:?})",
                    table.rows.len(),
                    path.display(),
                    delimiter as char
                );
                return Ok(table);
            }
            None => debug!("{} has no data rows as {label}", path.display()),
        }
    }

    Err(InputError::Unreadable {
        path: path.to_path_buf(),
        tried: config.encodings.join(", "),
    })
}

/// Resolve an encoding label.
///
/// `iso-8859-1` and `latin1` map to true ISO-8859-1 rather than the WHATWG
/// alias for windows-1252.
pub fn lookup_encoding(label: &str) -> Result<EncodingRef, InputError> {
    let normalized = label.trim().to_ascii_lowercase();
    let encoding: EncodingRef = match normalized.as_str() {
        "utf-8" | "utf8" => all::UTF_8,
        "iso-8859-1" | "latin1" | "latin-1" => all::ISO_8859_1,
        "windows-1252" | "cp1252" => all::WINDOWS_1252,
        other => encoding_from_whatwg_label(other)
            .ok_or_else(|| InputError::UnknownEncoding(label.to_string()))?,
    };
    Ok(encoding)
}

/// Parse a delimiter setting. `None` means detect from the header line.
pub fn parse_delimiter(setting: &str) -> Result<Option<u8>, InputError> {
    match setting {
        "auto" => Ok(None),
        "tab" | "\\t" | "\t" => Ok(Some(b'\t')),
        s if s.len() == 1 && s.is_ascii() => Ok(s.bytes().next()),
        s => Err(InputError::InvalidDelimiter(s.to_string())),
    }
}

/// Pick the most frequent candidate delimiter in the first non-blank line.
pub fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let mut best = (b',', 0);
    for &candidate in SNIFF_DELIMITERS {
        let count = header.bytes().filter(|&b| b == candidate).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}

/// Parse decoded text. Returns `None` when there is no header or no data.
fn parse_table(text: &str, delimiter: u8) -> Result<Option<Table>, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record?,
        None => return Ok(None),
    };
    let schema = FieldSchema::from_header(header.iter().map(str::trim))?;

    let mut rows = Vec::new();
    for (index, record) in records.enumerate() {
        let record = record?;
        let line = record
            .position()
            .map_or(index + 2, |p| p.line() as usize);
        rows.push(Row::new(line, record.iter().map(String::from).collect()));
    }

    if rows.is_empty() {
        return Ok(None);
    }
    Ok(Some(Table { schema, rows }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_file;
    use tempfile::TempDir;

    fn read(bytes: &[u8]) -> Result<Table, InputError> {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "words.csv", bytes);
        read_table(&path, &InputConfig::default())
    }

    // =========================================================================
    // Decoding
    // =========================================================================

    #[test]
    fn reads_utf8_with_header() {
        let table = read("Front,Back\nchat,cat\nchien,dog\n".as_bytes()).unwrap();
        assert_eq!(table.schema.names(), &["Front", "Back"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cells, vec!["chat", "cat"]);
        assert_eq!(table.rows[1].cells, vec!["chien", "dog"]);
    }

    #[test]
    fn strips_byte_order_mark() {
        let table = read("\u{feff}Front,Back\nchat,cat\n".as_bytes()).unwrap();
        assert_eq!(table.schema.get(0), Some("Front"));
    }

    #[test]
    fn falls_back_to_latin1() {
        let mut bytes = b"Front,Back\n".to_vec();
        bytes.extend_from_slice(&[0xE9, b'l', 0xE8, b'v', b'e', b',', b's', b't', b'\n']);
        let table = read(&bytes).unwrap();
        assert_eq!(table.rows[0].cells[0], "élève");
    }

    #[test]
    fn header_only_is_unreadable() {
        let err = read(b"Front,Back\n").unwrap_err();
        assert!(matches!(err, InputError::Unreadable { .. }));
    }

    #[test]
    fn empty_file_is_unreadable() {
        assert!(matches!(read(b"").unwrap_err(), InputError::Unreadable { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = read_table(&tmp.path().join("nope.csv"), &InputConfig::default()).unwrap_err();
        assert!(matches!(err, InputError::Io(_)));
    }

    #[test]
    fn unknown_encoding_is_reported() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "w.csv", b"Front\nx\n");
        let config = InputConfig {
            encodings: vec!["klingon".into()],
            ..InputConfig::default()
        };
        let err = read_table(&path, &config).unwrap_err();
        assert!(matches!(err, InputError::UnknownEncoding(ref e) if e == "klingon"));
    }

    #[test]
    fn encoding_labels() {
        assert_eq!(lookup_encoding("UTF-8").unwrap().name(), "utf-8");
        assert_eq!(lookup_encoding("latin1").unwrap().name(), "iso-8859-1");
        assert_eq!(lookup_encoding("cp1252").unwrap().name(), "windows-1252");
    }

    // =========================================================================
    // Delimiters and records
    // =========================================================================

    #[test]
    fn detects_semicolon() {
        let table = read(b"Front;Back\nchat;cat\n").unwrap();
        assert_eq!(table.schema.names(), &["Front", "Back"]);
        assert_eq!(table.rows[0].cells, vec!["chat", "cat"]);
    }

    #[test]
    fn detects_tab() {
        let table = read(b"Front\tBack\nchat\tcat\n").unwrap();
        assert_eq!(table.rows[0].cells, vec!["chat", "cat"]);
    }

    #[test]
    fn sniff_defaults_to_comma() {
        assert_eq!(sniff_delimiter("Front\nchat\n"), b',');
        assert_eq!(sniff_delimiter("\n\nA|B|C\n"), b'|');
    }

    #[test]
    fn explicit_delimiter_overrides_detection() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "w.csv", b"Front,Back;More\na,b;c\n");
        let config = InputConfig {
            delimiter: ";".into(),
            ..InputConfig::default()
        };
        let table = read_table(&path, &config).unwrap();
        assert_eq!(table.schema.names(), &["Front,Back", "More"]);
    }

    #[test]
    fn parse_delimiter_settings() {
        assert_eq!(parse_delimiter("auto").unwrap(), None);
        assert_eq!(parse_delimiter("tab").unwrap(), Some(b'\t'));
        assert_eq!(parse_delimiter("|").unwrap(), Some(b'|'));
        assert!(matches!(
            parse_delimiter("::"),
            Err(InputError::InvalidDelimiter(_))
        ));
    }

    #[test]
    fn quoted_cells_keep_delimiters() {
        let table = read(b"Front,Back\n\"easy, simple\",facile\n").unwrap();
        assert_eq!(table.rows[0].cells, vec!["easy, simple", "facile"]);
    }

    #[test]
    fn ragged_rows_are_kept_for_normalization() {
        let table = read(b"Front,Back\nchat\nchien,dog,extra\n").unwrap();
        assert_eq!(table.rows[0].cells.len(), 1);
        assert_eq!(table.rows[1].cells.len(), 3);
    }

    #[test]
    fn rows_carry_source_lines() {
        let table = read(b"Front,Back\nchat,cat\nchien,dog\n").unwrap();
        assert_eq!(table.rows[0].line, 2);
        assert_eq!(table.rows[1].line, 3);
    }

    #[test]
    fn header_names_are_trimmed() {
        let table = read(b"Front , Back\nchat,cat\n").unwrap();
        assert_eq!(table.schema.names(), &["Front", "Back"]);
    }

    #[test]
    fn duplicate_header_is_schema_error() {
        let err = read(b"Front,Front\nchat,cat\n").unwrap_err();
        assert!(matches!(
            err,
            InputError::Schema(SchemaError::DuplicateName(_))
        ));
    }
}
