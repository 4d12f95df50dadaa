//! Note building: normalized rows become notes appended to a deck.

use crate::normalize::normalize;
use crate::types::{Deck, Model, Note, Row};
use log::{debug, error};
use std::fmt;

/// Outcome of a note-building pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildCounts {
    /// Notes appended to the deck.
    pub created: usize,
    /// Rows looked at, including skipped ones.
    pub seen: usize,
}

impl BuildCounts {
    pub fn skipped(&self) -> usize {
        self.seen - self.created
    }
}

impl fmt::Display for BuildCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "created {} of {} notes", self.created, self.seen)
    }
}

/// Normalize every row against `model`'s schema and append the resulting
/// notes to `deck`, in row order.
///
/// Rows with too many values are logged and skipped; they only show up as
/// the difference between `created` and `seen`.
pub fn build_notes(deck: &mut Deck, model: &Model, rows: &[Row]) -> BuildCounts {
    let mut counts = BuildCounts::default();
    for row in rows {
        counts.seen += 1;
        match normalize(row, &model.schema) {
            Ok(fields) => {
                let note = Note::new(model, fields);
                debug!("note {} from line {}", note.guid, row.line);
                deck.add_note(note);
                counts.created += 1;
            }
            Err(e) => error!("Skipping row: {e}. Row: {:?}", row.cells),
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSchema;
    use crate::test_helpers::rows;
    use crate::templates::build_model;

    fn model(names: &[&str]) -> Model {
        build_model(FieldSchema::from_header(names.iter().copied()).unwrap(), "").unwrap()
    }

    #[test]
    fn every_valid_row_becomes_a_note() {
        let model = model(&["Front", "Back"]);
        let mut deck = Deck::new("French");
        let counts = build_notes(&mut deck, &model, &rows(&[&["chat", "cat"], &["chien", "dog"]]));

        assert_eq!(counts, BuildCounts { created: 2, seen: 2 });
        assert_eq!(deck.notes.len(), 2);
        assert_eq!(deck.notes[0].fields, vec!["chat", "cat"]);
        assert_eq!(deck.notes[1].fields, vec!["chien", "dog"]);
        assert!(deck.notes.iter().all(|n| n.model_id == model.id));
    }

    #[test]
    fn oversized_rows_are_counted_not_created() {
        let model = model(&["Front", "Back"]);
        let mut deck = Deck::new("French");
        let counts = build_notes(
            &mut deck,
            &model,
            &rows(&[&["chat", "cat"], &["a", "b", "c"], &["chien"]]),
        );

        assert_eq!(counts.created, 2);
        assert_eq!(counts.seen, 3);
        assert_eq!(counts.skipped(), 1);
        assert_eq!(deck.notes[1].fields, vec!["chien", ""]);
    }

    #[test]
    fn duplicate_fronts_share_a_guid() {
        let model = model(&["Front", "Back"]);
        let mut deck = Deck::new("French");
        build_notes(&mut deck, &model, &rows(&[&["Chat", "cat"], &["chat.", "tomcat"]]));
        assert_eq!(deck.notes[0].guid, deck.notes[1].guid);
    }

    #[test]
    fn notes_are_appended_after_existing_ones() {
        let model = model(&["Front", "Back"]);
        let mut deck = Deck::new("French");
        build_notes(&mut deck, &model, &rows(&[&["un", "one"]]));
        build_notes(&mut deck, &model, &rows(&[&["deux", "two"]]));
        assert_eq!(deck.notes.len(), 2);
        assert_eq!(deck.notes[1].fields[0], "deux");
    }

    #[test]
    fn counts_display() {
        let counts = BuildCounts { created: 98, seen: 100 };
        assert_eq!(counts.to_string(), "created 98 of 100 notes");
    }
}
