//! Shared types used across the build and read paths.
//!
//! The write path produces [`Model`], [`Deck`] and [`Note`]; the read path
//! reconstructs the same [`Model`] plus [`CollectionNote`]s inside a
//! [`Collection`]. Both paths agree on these shapes so an archive written by
//! the assembler reads back field-for-field.

use crate::ids::{generate_id, note_guid};
use crate::schema::FieldSchema;
use std::collections::{BTreeMap, BTreeSet};

/// One input row: raw cells as read, plus values filled in by enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based line in the source file (the header is line 1).
    pub line: usize,
    pub cells: Vec<String>,
    /// Generated values keyed by schema position. Win over raw cells.
    pub filled: BTreeMap<usize, String>,
}

impl Row {
    pub fn new(line: usize, cells: Vec<String>) -> Self {
        Self {
            line,
            cells,
            filled: BTreeMap::new(),
        }
    }

    /// Raw cell at `index`, or `""` when the row is short.
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }

    /// Record a generated value for the field at `index`.
    pub fn fill(&mut self, index: usize, value: String) {
        self.filled.insert(index, value);
    }
}

/// A parsed input file: header schema and data rows in file order.
#[derive(Debug, Clone)]
pub struct Table {
    pub schema: FieldSchema,
    pub rows: Vec<Row>,
}

/// Whether a card needs any or all of its listed fields to be non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementKind {
    Any,
    All,
}

impl RequirementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RequirementKind::Any => "any",
            RequirementKind::All => "all",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "any" => Some(RequirementKind::Any),
            "all" => Some(RequirementKind::All),
            _ => None,
        }
    }
}

/// Fields a note must populate before a template produces a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub kind: RequirementKind,
    pub fields: Vec<String>,
}

impl Requirement {
    pub fn any<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            kind: RequirementKind::Any,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn all<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            kind: RequirementKind::All,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Evaluate against a note's values laid out by `schema`.
    ///
    /// Fields missing from the schema count as empty.
    pub fn is_met(&self, schema: &FieldSchema, values: &[String]) -> bool {
        let filled = |name: &String| {
            schema
                .position(name)
                .and_then(|i| values.get(i))
                .is_some_and(|v| !v.trim().is_empty())
        };
        match self.kind {
            RequirementKind::Any => self.fields.iter().any(filled),
            RequirementKind::All => !self.fields.is_empty() && self.fields.iter().all(filled),
        }
    }
}

/// A question/answer markup pair referencing field placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardTemplate {
    pub name: String,
    pub question: String,
    pub answer: String,
    pub requirement: Requirement,
}

/// A note type: schema, templates and style under a stable ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub id: u64,
    pub name: String,
    pub schema: FieldSchema,
    pub templates: Vec<CardTemplate>,
    pub css: String,
}

impl Model {
    /// Build a model whose ID is derived from its name and field names.
    ///
    /// Two schemas that differ in any field name never share an ID, while
    /// rebuilding the same deck always yields the same one.
    pub fn new(
        name: impl Into<String>,
        schema: FieldSchema,
        templates: Vec<CardTemplate>,
        css: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let id = generate_id(&model_seed(&name, &schema));
        Self {
            id,
            name,
            schema,
            templates,
            css: css.into(),
        }
    }
}

fn model_seed(name: &str, schema: &FieldSchema) -> String {
    format!("{}\u{1f}{}", name, schema.names().join("\u{1f}"))
}

/// One flashcard's worth of field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub model_id: u64,
    pub guid: String,
    pub fields: Vec<String>,
    pub tags: Vec<String>,
}

impl Note {
    /// Create a note bound to `model`; the GUID comes from the front field.
    pub fn new(model: &Model, fields: Vec<String>) -> Self {
        let guid = note_guid(fields.first().map(String::as_str).unwrap_or(""));
        Self {
            model_id: model.id,
            guid,
            fields,
            tags: Vec::new(),
        }
    }
}

/// A named, ordered collection of notes shipped as one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    pub id: u64,
    pub name: String,
    pub notes: Vec<Note>,
}

impl Deck {
    /// The deck ID is a pure content hash of the name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: generate_id(&name),
            name,
            notes: Vec::new(),
        }
    }

    pub fn add_note(&mut self, note: Note) {
        self.notes.push(note);
    }
}

/// A note read back from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionNote {
    pub model_id: u64,
    pub fields: Vec<String>,
    pub tags: BTreeSet<String>,
}

/// Parsed contents of an existing archive.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub models: BTreeMap<u64, Model>,
    pub notes: Vec<CollectionNote>,
}

impl Collection {
    pub fn model_of(&self, note: &CollectionNote) -> Option<&Model> {
        self.models.get(&note.model_id)
    }

    /// Pair each field name of the note's model with its value.
    ///
    /// Field names without a value map to `""`; surplus values are kept
    /// under positional names (`field 4`, …) rather than dropped.
    pub fn named_fields(&self, note: &CollectionNote) -> Vec<(String, String)> {
        let names: &[String] = self
            .model_of(note)
            .map(|m| m.schema.names())
            .unwrap_or(&[]);
        let width = names.len().max(note.fields.len());
        (0..width)
            .map(|i| {
                let name = names
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("field {}", i + 1));
                let value = note.fields.get(i).cloned().unwrap_or_default();
                (name, value)
            })
            .collect()
    }

    /// Notes that belong to `model_id`, in archive order.
    pub fn notes_of(&self, model_id: u64) -> impl Iterator<Item = &CollectionNote> {
        self.notes.iter().filter(move |n| n.model_id == model_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(names: &[&str]) -> FieldSchema {
        FieldSchema::from_header(names.iter().copied()).unwrap()
    }

    fn values(vals: &[&str]) -> Vec<String> {
        vals.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn deck_id_depends_only_on_name() {
        assert_eq!(Deck::new("French").id, Deck::new("French").id);
        assert_ne!(Deck::new("French").id, Deck::new("German").id);
    }

    #[test]
    fn model_id_is_stable() {
        let a = Model::new("Basic Vanilla", schema(&["Front", "Back"]), vec![], "");
        let b = Model::new("Basic Vanilla", schema(&["Front", "Back"]), vec![], "x");
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn model_id_changes_with_fields() {
        let a = Model::new("Basic Vanilla", schema(&["Front", "Back"]), vec![], "");
        let b = Model::new("Basic Vanilla", schema(&["Word", "Meaning"]), vec![], "");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn note_guid_from_first_field() {
        let model = Model::new("m", schema(&["Front", "Back"]), vec![], "");
        let a = Note::new(&model, values(&["Chat", "cat"]));
        let b = Note::new(&model, values(&["chat.", "kitty"]));
        assert_eq!(a.guid, b.guid);
        assert_eq!(a.model_id, model.id);
        assert!(a.tags.is_empty());
    }

    #[test]
    fn requirement_any() {
        let s = schema(&["Front", "Back", "Sound"]);
        let req = Requirement::any(["Front", "Sound"]);
        assert!(req.is_met(&s, &values(&["chat", "", ""])));
        assert!(!req.is_met(&s, &values(&["", "cat", " "])));
    }

    #[test]
    fn requirement_all() {
        let s = schema(&["Front", "Back", "Reverse"]);
        let req = Requirement::all(["Reverse", "Back"]);
        assert!(req.is_met(&s, &values(&["chat", "cat", "y"])));
        assert!(!req.is_met(&s, &values(&["chat", "cat", ""])));
    }

    #[test]
    fn requirement_on_missing_field_is_unmet() {
        let s = schema(&["Front"]);
        assert!(!Requirement::all(["Reverse"]).is_met(&s, &values(&["chat"])));
    }

    #[test]
    fn row_cell_out_of_range_is_empty() {
        let row = Row::new(2, values(&["chat"]));
        assert_eq!(row.cell(0), "chat");
        assert_eq!(row.cell(3), "");
    }

    #[test]
    fn named_fields_pads_and_keeps_surplus() {
        let model = Model::new("m", schema(&["Front", "Back"]), vec![], "");
        let mut collection = Collection::default();
        let id = model.id;
        collection.models.insert(id, model);
        let short = CollectionNote {
            model_id: id,
            fields: values(&["chat"]),
            tags: BTreeSet::new(),
        };
        assert_eq!(
            collection.named_fields(&short),
            vec![
                ("Front".to_string(), "chat".to_string()),
                ("Back".to_string(), String::new())
            ]
        );
        let long = CollectionNote {
            model_id: id,
            fields: values(&["chat", "cat", "extra"]),
            tags: BTreeSet::new(),
        };
        assert_eq!(collection.named_fields(&long)[2].0, "field 3");
    }
}
