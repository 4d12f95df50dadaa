//! Shared test utilities.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let input = write_file(tmp.path(), "words.csv", b"Front;Back\nchat;cat\n");
//! let data = rows(&[&["chat", "cat"], &["chien", "dog"]]);
//! let picture = png_bytes(20, 10);
//! ```

use crate::types::Row;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

// =========================================================================
// Files
// =========================================================================

/// Write `bytes` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

// =========================================================================
// Rows
// =========================================================================

/// Rows as the reader would produce them, numbered from line 2 (line 1 is
/// the header).
pub fn rows(data: &[&[&str]]) -> Vec<Row> {
    data.iter()
        .enumerate()
        .map(|(i, cells)| Row::new(i + 2, cells.iter().map(|c| c.to_string()).collect()))
        .collect()
}

// =========================================================================
// Images
// =========================================================================

/// An encoded PNG of the given size with a horizontal gradient.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, _| Rgb([(x % 256) as u8, 128, 64]));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn png_bytes_decode_to_requested_size() {
    let img = image::load_from_memory(&png_bytes(7, 3)).unwrap();
    assert_eq!((img.width(), img.height()), (7, 3));
}

#[test]
fn rows_are_numbered_after_header() {
    let r = rows(&[&["a"], &["b", "c"]]);
    assert_eq!(r[0].line, 2);
    assert_eq!(r[1].cells, vec!["b", "c"]);
}
