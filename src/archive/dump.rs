//! Collection dump: one CSV file per note model.
//!
//! Handy for checking a generated deck without importing it into Anki.
//! Each file is named after its model, has the model's field names plus a
//! trailing `tags` column as header, and one line per note in archive order.

use super::ArchiveError;
use crate::types::Collection;
use log::info;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Write `collection` as CSV files under `out_dir` and return their paths.
///
/// Models without notes produce no file. Two models sharing a name get
/// distinct files, the later one suffixed with its ID.
pub fn dump_collection(collection: &Collection, out_dir: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();
    let mut used = HashSet::new();

    for model in collection.models.values() {
        let notes: Vec<_> = collection.notes_of(model.id).collect();
        if notes.is_empty() {
            continue;
        }

        let stem = file_stem(&model.name);
        let stem = if used.insert(stem.clone()) {
            stem
        } else {
            format!("{stem} ({})", model.id)
        };
        let path = out_dir.join(format!("{stem}.csv"));

        let width = notes
            .iter()
            .map(|n| n.fields.len())
            .max()
            .unwrap_or(0)
            .max(model.schema.len());
        let mut header: Vec<String> = (0..width)
            .map(|i| {
                model
                    .schema
                    .get(i)
                    .map(String::from)
                    .unwrap_or_else(|| format!("field {}", i + 1))
            })
            .collect();
        header.push("tags".into());

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(&header)?;
        for note in &notes {
            let mut record: Vec<String> = (0..width)
                .map(|i| note.fields.get(i).cloned().unwrap_or_default())
                .collect();
            record.push(note.tags.iter().cloned().collect::<Vec<_>>().join(", "));
            writer.write_record(&record)?;
        }
        writer.flush()?;

        info!("Dumped {} notes to {}", notes.len(), path.display());
        written.push(path);
    }
    Ok(written)
}

/// Model names may contain path separators; those become underscores.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect()
}
