//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Deck french (6766479517)
//!     Model: Basic Vanilla (1234567890)
//!     Layout: Vanilla
//!     Fields: Front, Back, Remark, More, Phonetics, Sound, Image
//!     Notes: created 2 of 2 notes
//!     Cards: 2
//!     Media: 0 files
//!     Archive: out/french.apkg
//! ```
//!
//! ## Inspect
//!
//! ```text
//! 001 Basic Vanilla (2 notes)
//!     Id: 1234567890
//!     Fields: Front, Back
//!     Templates: Card 1
//!     001 chat | cat
//!     002 chien | dog
//!         Tags: animal
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::ids::strip_html_tags;
use crate::pipeline::BuildReport;
use crate::types::{Collection, CollectionNote};
use std::path::PathBuf;

/// Characters of a note preview before it is cut off.
const PREVIEW_WIDTH: usize = 60;

/// Fields shown in a note preview.
const PREVIEW_FIELDS: usize = 2;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// First non-empty fields of a note, without markup, joined by ` | `.
fn note_preview(note: &CollectionNote) -> String {
    let parts: Vec<String> = note
        .fields
        .iter()
        .map(|f| strip_html_tags(f).trim().to_string())
        .filter(|f| !f.is_empty())
        .take(PREVIEW_FIELDS)
        .collect();
    if parts.is_empty() {
        return "(empty)".to_string();
    }
    truncate(&parts.join(" | "), PREVIEW_WIDTH)
}

// ============================================================================
// build
// ============================================================================

pub fn format_build_report(report: &BuildReport) -> Vec<String> {
    let pad = indent(1);
    let mut notes = format!("{pad}Notes: {}", report.counts);
    if report.counts.skipped() > 0 {
        notes.push_str(&format!(" ({} skipped)", report.counts.skipped()));
    }
    vec![
        format!("Deck {} ({})", report.deck_name, report.deck_id),
        format!("{pad}Model: {} ({})", report.model_name, report.model_id),
        format!("{pad}Layout: {:?}", report.layout),
        format!("{pad}Fields: {}", report.fields.join(", ")),
        notes,
        format!("{pad}Cards: {}", report.cards),
        format!("{pad}Media: {}", plural(report.media, "file", "files")),
        format!("{pad}Archive: {}", report.archive.display()),
    ]
}

pub fn print_build_report(report: &BuildReport) {
    for line in format_build_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// inspect
// ============================================================================

/// Models in id order, each followed by a preview of its notes.
pub fn format_collection(collection: &Collection) -> Vec<String> {
    let mut lines = Vec::new();
    for (pos, (id, model)) in collection.models.iter().enumerate() {
        let notes: Vec<&CollectionNote> = collection.notes_of(*id).collect();
        lines.push(format!(
            "{} {} ({})",
            format_index(pos + 1),
            model.name,
            plural(notes.len(), "note", "notes")
        ));
        let pad = indent(1);
        lines.push(format!("{pad}Id: {id}"));
        lines.push(format!("{pad}Fields: {}", model.schema.names().join(", ")));
        let templates: Vec<&str> = model.templates.iter().map(|t| t.name.as_str()).collect();
        lines.push(format!("{pad}Templates: {}", templates.join(", ")));
        for (i, note) in notes.iter().enumerate() {
            lines.push(format!("{pad}{} {}", format_index(i + 1), note_preview(note)));
            if !note.tags.is_empty() {
                let tags: Vec<&str> = note.tags.iter().map(String::as_str).collect();
                lines.push(format!("{}Tags: {}", indent(2), tags.join(", ")));
            }
        }
    }
    if lines.is_empty() {
        lines.push("No models".to_string());
    }
    lines
}

pub fn print_collection(collection: &Collection) {
    for line in format_collection(collection) {
        println!("{}", line);
    }
}

// ============================================================================
// dump
// ============================================================================

pub fn format_dump_output(files: &[PathBuf]) -> Vec<String> {
    let mut lines = vec![format!("Wrote {}", plural(files.len(), "file", "files"))];
    lines.extend(
        files
            .iter()
            .map(|f| format!("{}{}", indent(1), f.display())),
    );
    lines
}

pub fn print_dump_output(files: &[PathBuf]) {
    for line in format_dump_output(files) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::BuildCounts;
    use crate::schema::FieldSchema;
    use crate::templates::{CardLayout, build_model};
    use std::collections::BTreeSet;

    fn report() -> BuildReport {
        BuildReport {
            deck_name: "french".into(),
            deck_id: 42,
            model_name: "Basic Vanilla".into(),
            model_id: 7,
            layout: CardLayout::Vanilla,
            fields: vec!["Front".into(), "Back".into()],
            counts: BuildCounts {
                created: 2,
                seen: 2,
            },
            cards: 2,
            media: 1,
            archive: PathBuf::from("out/french.apkg"),
        }
    }

    fn note(model_id: u64, fields: &[&str], tags: &[&str]) -> CollectionNote {
        CollectionNote {
            model_id,
            fields: fields.iter().map(|f| f.to_string()).collect(),
            tags: tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
        }
    }

    fn collection() -> Collection {
        let schema = FieldSchema::from_header(["Front", "Back"]).unwrap();
        let model = build_model(schema, "").unwrap();
        let id = model.id;
        let mut collection = Collection::default();
        collection.models.insert(id, model);
        collection.notes.push(note(id, &["chat", "cat"], &[]));
        collection
            .notes
            .push(note(id, &["<b>chien</b>", "dog"], &["animal", "b1"]));
        collection
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("élève", 2), "él...");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "file", "files"), "1 file");
        assert_eq!(plural(0, "file", "files"), "0 files");
    }

    #[test]
    fn preview_skips_empty_fields_and_markup() {
        assert_eq!(
            note_preview(&note(1, &["", "<b>chat</b>", "", "cat", "x"], &[])),
            "chat | cat"
        );
        assert_eq!(note_preview(&note(1, &["", ""], &[])), "(empty)");
    }

    // =========================================================================
    // Build report
    // =========================================================================

    #[test]
    fn build_report_lines() {
        let lines = format_build_report(&report());
        assert_eq!(lines[0], "Deck french (42)");
        assert_eq!(lines[1], "    Model: Basic Vanilla (7)");
        assert_eq!(lines[2], "    Layout: Vanilla");
        assert_eq!(lines[3], "    Fields: Front, Back");
        assert_eq!(lines[4], "    Notes: created 2 of 2 notes");
        assert_eq!(lines[6], "    Media: 1 file");
        assert_eq!(lines[7], "    Archive: out/french.apkg");
    }

    #[test]
    fn build_report_mentions_skips() {
        let mut r = report();
        r.counts.seen = 3;
        let lines = format_build_report(&r);
        assert_eq!(lines[4], "    Notes: created 2 of 3 notes (1 skipped)");
    }

    // =========================================================================
    // Inspect
    // =========================================================================

    #[test]
    fn collection_lists_models_and_notes() {
        let c = collection();
        let id = *c.models.keys().next().unwrap();
        let lines = format_collection(&c);
        assert_eq!(
            lines,
            vec![
                "001 Basic Vanilla (2 notes)".to_string(),
                format!("    Id: {id}"),
                "    Fields: Front, Back".to_string(),
                "    Templates: Card 1".to_string(),
                "    001 chat | cat".to_string(),
                "    002 chien | dog".to_string(),
                "        Tags: animal, b1".to_string(),
            ]
        );
    }

    #[test]
    fn empty_collection() {
        assert_eq!(format_collection(&Collection::default()), vec!["No models"]);
    }

    // =========================================================================
    // Dump
    // =========================================================================

    #[test]
    fn dump_lists_files() {
        let lines = format_dump_output(&[PathBuf::from("out/Basic Vanilla.csv")]);
        assert_eq!(lines, vec!["Wrote 1 file", "    out/Basic Vanilla.csv"]);
    }
}
