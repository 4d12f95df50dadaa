//! Deck assembly: write a deck and its model into an `.apkg` archive.
//!
//! The collection is built in a temporary SQLite file, then zipped together
//! with the media index and the media files. The zip is staged next to the
//! destination and renamed over it only once it is complete, so a failed
//! build leaves any previous archive untouched.

use super::sql::{CREATE_COLLECTION, SCHEMA_VERSION};
use super::{ArchiveError, COLLECTION_ENTRY, FIELD_SEPARATOR, MEDIA_ENTRY, catalog};
use crate::ids::{field_checksum, strip_html_tags};
use crate::types::{Deck, Model, Note};
use chrono::Utc;
use log::{debug, info, warn};
use rusqlite::{Connection, params};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Counts reported after a successful write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub notes: usize,
    pub cards: usize,
    pub media: usize,
}

/// Write `deck` (whose notes all use `model`) and `media_files` to
/// `destination`.
///
/// Media files that do not exist are skipped with a warning.
pub fn assemble(
    deck: &Deck,
    model: &Model,
    media_files: &[PathBuf],
    destination: &Path,
) -> Result<ArchiveSummary, ArchiveError> {
    let workspace = TempDir::new()?;
    let collection_path = workspace.path().join(COLLECTION_ENTRY);

    let (notes, cards) = {
        let mut conn = Connection::open(&collection_path)?;
        write_collection(&mut conn, deck, model)?
    };

    let media = present_media(media_files);
    if let Some(parent) = destination.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    write_package(&collection_path, &media, destination)?;

    info!(
        "Wrote {} ({} notes, {} cards, {} media files)",
        destination.display(),
        notes,
        cards,
        media.len()
    );
    Ok(ArchiveSummary {
        notes,
        cards,
        media: media.len(),
    })
}

fn now() -> (i64, i64) {
    let now = Utc::now();
    (now.timestamp(), now.timestamp_millis())
}

/// Create the schema and insert the collection row, notes and cards.
///
/// Note and card row IDs start at the current time in milliseconds and
/// increase by one per row, so cards sort in note order.
fn write_collection(
    conn: &mut Connection,
    deck: &Deck,
    model: &Model,
) -> Result<(usize, usize), ArchiveError> {
    let (secs, millis) = now();
    conn.execute_batch(CREATE_COLLECTION)?;

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO col (id, crt, mod, scm, ver, dty, usn, ls, conf, models, decks, dconf, tags)
         VALUES (1, ?1, ?2, ?2, ?3, 0, 0, 0, ?4, ?5, ?6, ?7, '{}')",
        params![
            secs,
            millis,
            SCHEMA_VERSION,
            catalog::collection_conf_json(deck, model),
            catalog::models_json(model, deck, secs)?,
            catalog::decks_json(deck, secs),
            catalog::deck_options_json(secs),
        ],
    )?;

    let mut next_id = millis;
    let mut card_count = 0;
    for (position, note) in deck.notes.iter().enumerate() {
        let note_id = next_id;
        next_id += 1;
        insert_note(&tx, note_id, note, secs)?;

        let mut produced = 0;
        for (ord, template) in model.templates.iter().enumerate() {
            if !template.requirement.is_met(&model.schema, &note.fields) {
                continue;
            }
            tx.execute(
                "INSERT INTO cards (id, nid, did, ord, mod, usn, type, queue, due, ivl, factor,
                                    reps, lapses, left, odue, odid, flags, data)
                 VALUES (?1, ?2, ?3, ?4, ?5, -1, 0, 0, ?6, 0, 0, 0, 0, 0, 0, 0, 0, '')",
                params![
                    next_id,
                    note_id,
                    deck.id as i64,
                    ord as i64,
                    secs,
                    (position + 1) as i64
                ],
            )?;
            next_id += 1;
            produced += 1;
        }
        if produced == 0 {
            warn!("Note {} produces no cards", note.guid);
        }
        card_count += produced;
    }
    tx.commit()?;
    Ok((deck.notes.len(), card_count))
}

fn insert_note(conn: &Connection, id: i64, note: &Note, modified: i64) -> Result<(), ArchiveError> {
    let sort_field = note.fields.first().map(String::as_str).unwrap_or("");
    let fields = note.fields.join(&FIELD_SEPARATOR.to_string());
    conn.execute(
        "INSERT INTO notes (id, guid, mid, mod, usn, tags, flds, sfld, csum, flags, data)
         VALUES (?1, ?2, ?3, ?4, -1, ?5, ?6, ?7, ?8, 0, '')",
        params![
            id,
            note.guid,
            note.model_id as i64,
            modified,
            tags_column(&note.tags),
            fields,
            strip_html_tags(sort_field),
            field_checksum(sort_field),
        ],
    )?;
    Ok(())
}

/// Anki stores tags space-separated with a leading and trailing space.
fn tags_column(tags: &[String]) -> String {
    if tags.is_empty() {
        String::new()
    } else {
        format!(" {} ", tags.join(" "))
    }
}

/// Keep only the media files that exist, warning about the rest.
fn present_media(media_files: &[PathBuf]) -> Vec<&Path> {
    media_files
        .iter()
        .filter(|path| {
            let exists = path.is_file();
            if !exists {
                warn!("Media file {} not found, skipping", path.display());
            }
            exists
        })
        .map(PathBuf::as_path)
        .collect()
}

fn write_package(collection: &Path, media: &[&Path], destination: &Path) -> Result<(), ArchiveError> {
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)?;
    write_zip(collection, media, staged.as_file_mut())?;
    staged.persist(destination).map_err(|e| e.error)?;
    Ok(())
}

fn write_zip(collection: &Path, media: &[&Path], out: &mut File) -> Result<(), ArchiveError> {
    let mut zip = ZipWriter::new(out);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(COLLECTION_ENTRY, options)?;
    io::copy(&mut File::open(collection)?, &mut zip)?;

    let mut index = BTreeMap::new();
    for (i, path) in media.iter().enumerate() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!("media {i}: {name}");
        zip.start_file(i.to_string(), options)?;
        io::copy(&mut File::open(path)?, &mut zip)?;
        index.insert(i.to_string(), name);
    }

    zip.start_file(MEDIA_ENTRY, options)?;
    zip.write_all(serde_json::to_string(&index)?.as_bytes())?;
    zip.finish()?;
    Ok(())
}
