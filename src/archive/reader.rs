//! Archive reading: recover models and notes from an `.apkg`.

use super::{ArchiveError, COLLECTION_ENTRY, FIELD_SEPARATOR, catalog};
use crate::types::{Collection, CollectionNote};
use log::debug;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::fs::File;
use std::io;
use std::path::Path;
use tempfile::TempDir;
use zip::ZipArchive;
use zip::result::ZipError;

/// Read the models and notes of the archive at `path`.
///
/// Notes come back ordered by their row ID, which is creation order for
/// archives written by [`super::assemble`].
pub fn read_collection(path: &Path) -> Result<Collection, ArchiveError> {
    let workspace = TempDir::new()?;
    let collection_path = workspace.path().join(COLLECTION_ENTRY);

    let mut archive = ZipArchive::new(File::open(path)?)?;
    {
        let mut entry = archive.by_name(COLLECTION_ENTRY).map_err(|e| match e {
            ZipError::FileNotFound => ArchiveError::MissingEntry(COLLECTION_ENTRY.into()),
            other => other.into(),
        })?;
        io::copy(&mut entry, &mut File::create(&collection_path)?)?;
    }

    let conn = Connection::open_with_flags(&collection_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let collection = read_from(&conn)?;
    debug!(
        "{}: {} models, {} notes",
        path.display(),
        collection.models.len(),
        collection.notes.len()
    );
    Ok(collection)
}

fn read_from(conn: &Connection) -> Result<Collection, ArchiveError> {
    require_table(conn, "col")?;
    require_table(conn, "notes")?;

    let models_json: String = conn
        .query_row("SELECT models FROM col LIMIT 1", [], |row| row.get(0))
        .optional()?
        .ok_or_else(|| ArchiveError::InvalidCatalog("'col' table is empty".into()))?;
    let models = catalog::parse_models(&models_json)?;

    let mut stmt = conn.prepare("SELECT mid, flds, tags FROM notes ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut notes = Vec::new();
    for row in rows {
        let (mid, flds, tags) = row?;
        let model_id = mid as u64;
        if !models.contains_key(&model_id) {
            return Err(ArchiveError::UnknownModel(model_id));
        }
        notes.push(CollectionNote {
            model_id,
            fields: flds.split(FIELD_SEPARATOR).map(String::from).collect(),
            tags: tags.split_whitespace().map(String::from).collect(),
        });
    }

    Ok(Collection { models, notes })
}

fn require_table(conn: &Connection, name: &str) -> Result<(), ArchiveError> {
    let count: i64 = conn.query_row(
        "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get(0),
    )?;
    if count == 0 {
        return Err(ArchiveError::MissingTable(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::assemble;
    use crate::schema::FieldSchema;
    use crate::templates::build_model;
    use crate::types::{Deck, Note};
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    /// Zip `collection` (a SQLite file built by `setup`) into an archive.
    fn archive_with(dir: &Path, setup: &str) -> std::path::PathBuf {
        let db = dir.join("source.anki2");
        let conn = Connection::open(&db).unwrap();
        conn.execute_batch(setup).unwrap();
        drop(conn);

        let dest = dir.join("custom.apkg");
        let mut zip = ZipWriter::new(File::create(&dest).unwrap());
        zip.start_file(COLLECTION_ENTRY, SimpleFileOptions::default())
            .unwrap();
        zip.write_all(&std::fs::read(&db).unwrap()).unwrap();
        zip.finish().unwrap();
        dest
    }

    const MODELS: &str = r#"{"7": {"name": "Basic", "flds": [{"name": "Front", "ord": 0}, {"name": "Back", "ord": 1}], "tmpls": []}}"#;

    #[test]
    fn reads_back_written_deck() {
        let tmp = TempDir::new().unwrap();
        let model =
            build_model(FieldSchema::from_header(["Front", "Back"]).unwrap(), "").unwrap();
        let mut deck = Deck::new("French");
        deck.add_note(Note::new(&model, vec!["chat".into(), "cat".into()]));
        deck.add_note(Note::new(&model, vec!["chien".into(), "dog".into()]));
        let dest = tmp.path().join("French.apkg");
        assemble(&deck, &model, &[], &dest).unwrap();

        let collection = read_collection(&dest).unwrap();
        assert_eq!(collection.models.len(), 1);
        assert_eq!(collection.models[&model.id].name, "Basic Vanilla");
        assert_eq!(collection.notes.len(), 2);
        assert_eq!(collection.notes[0].fields, vec!["chat", "cat"]);
        assert_eq!(collection.notes[1].fields, vec!["chien", "dog"]);
        assert!(collection.notes.iter().all(|n| n.tags.is_empty()));
    }

    #[test]
    fn notes_are_ordered_by_id_and_tags_split() {
        let tmp = TempDir::new().unwrap();
        let setup = format!(
            "CREATE TABLE col (models text);
             INSERT INTO col VALUES ('{MODELS}');
             CREATE TABLE notes (id integer primary key, mid integer, flds text, tags text);
             INSERT INTO notes VALUES (20, 7, 'b' || char(31) || '2', '');
             INSERT INTO notes VALUES (10, 7, 'a' || char(31) || '1', ' verb  a1 ');"
        );
        let collection = read_collection(&archive_with(tmp.path(), &setup)).unwrap();
        assert_eq!(collection.notes[0].fields, vec!["a", "1"]);
        assert_eq!(
            collection.notes[0].tags.iter().collect::<Vec<_>>(),
            ["a1", "verb"]
        );
        assert_eq!(collection.notes[1].fields, vec!["b", "2"]);
    }

    #[test]
    fn missing_collection_entry() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("empty.apkg");
        let mut zip = ZipWriter::new(File::create(&dest).unwrap());
        zip.start_file("media", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"{}").unwrap();
        zip.finish().unwrap();

        let err = read_collection(&dest).unwrap_err();
        assert!(matches!(err, ArchiveError::MissingEntry(ref e) if e == COLLECTION_ENTRY));
    }

    #[test]
    fn missing_notes_table() {
        let tmp = TempDir::new().unwrap();
        let setup = format!("CREATE TABLE col (models text); INSERT INTO col VALUES ('{MODELS}');");
        let err = read_collection(&archive_with(tmp.path(), &setup)).unwrap_err();
        assert!(matches!(err, ArchiveError::MissingTable(ref t) if t == "notes"));
    }

    #[test]
    fn missing_col_table() {
        let tmp = TempDir::new().unwrap();
        let setup = "CREATE TABLE notes (id integer primary key, mid integer, flds text, tags text);";
        let err = read_collection(&archive_with(tmp.path(), setup)).unwrap_err();
        assert!(matches!(err, ArchiveError::MissingTable(ref t) if t == "col"));
    }

    #[test]
    fn note_with_unknown_model() {
        let tmp = TempDir::new().unwrap();
        let setup = format!(
            "CREATE TABLE col (models text);
             INSERT INTO col VALUES ('{MODELS}');
             CREATE TABLE notes (id integer primary key, mid integer, flds text, tags text);
             INSERT INTO notes VALUES (1, 99, 'x', '');"
        );
        let err = read_collection(&archive_with(tmp.path(), &setup)).unwrap_err();
        assert!(matches!(err, ArchiveError::UnknownModel(99)));
    }

    #[test]
    fn not_a_zip_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bogus.apkg");
        std::fs::write(&path, b"plain text").unwrap();
        assert!(matches!(
            read_collection(&path).unwrap_err(),
            ArchiveError::Zip(_)
        ));
    }
}
