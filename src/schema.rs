//! Field schemas: the ordered, named value slots of a note model.
//!
//! A schema starts as the header row of the input table. It can then grow in
//! two ways:
//!
//! - [`FieldSchema::extend_well_known`] appends the standard optional fields
//!   ([`WELL_KNOWN_FIELDS`]) so decks built from differently shaped files
//!   still share one field layout.
//! - Enrichment appends generated companions such as `Sound_Answer`.
//!
//! The schema remembers its *input width*, the number of header columns.
//! Marker columns (`Listen`, `Q&A`, `Reverse`) and enrichment triggers are
//! only honoured when the input file declared them, never when they were
//! appended as padding.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Schema has no fields")]
    Empty,
    #[error("Field name at column {0} is empty")]
    EmptyName(usize),
    #[error("Duplicate field name: {0}")]
    DuplicateName(String),
}

/// Optional fields appended by [`FieldSchema::extend_well_known`], in order.
pub const WELL_KNOWN_FIELDS: &[&str] = &["Remark", "More", "Phonetics", "Sound", "Image"];

/// Ordered, unique field names plus the width of the input header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    names: Vec<String>,
    input_width: usize,
}

impl FieldSchema {
    /// Build a schema from header names. Every name counts as declared.
    pub fn from_header<I, S>(names: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut schema = Self {
            names: Vec::new(),
            input_width: 0,
        };
        for (column, name) in names.into_iter().enumerate() {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(SchemaError::EmptyName(column + 1));
            }
            schema.try_push(name)?;
        }
        if schema.names.is_empty() {
            return Err(SchemaError::Empty);
        }
        schema.input_width = schema.names.len();
        Ok(schema)
    }

    fn try_push(&mut self, name: String) -> Result<(), SchemaError> {
        if self.contains(&name) {
            return Err(SchemaError::DuplicateName(name));
        }
        self.names.push(name);
        Ok(())
    }

    /// Append a field unless it already exists. Returns its position.
    pub fn ensure(&mut self, name: &str) -> usize {
        match self.position(name) {
            Some(index) => index,
            None => {
                self.names.push(name.to_string());
                self.names.len() - 1
            }
        }
    }

    /// Append every missing well-known field.
    pub fn extend_well_known(&mut self) {
        for name in WELL_KNOWN_FIELDS {
            self.ensure(name);
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of columns the input header declared.
    pub fn input_width(&self) -> usize {
        self.input_width
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// True if the field exists, declared or appended.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// True only if the input header declared the field.
    pub fn declares(&self, name: &str) -> bool {
        self.position(name).is_some_and(|i| i < self.input_width)
    }

    /// First of `candidates` present in the schema.
    pub fn first_present<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        candidates.iter().copied().find(|name| self.contains(name))
    }

    /// First of `candidates` declared by the input header.
    pub fn first_declared<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        candidates.iter().copied().find(|name| self.declares(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_header_keeps_order() {
        let schema = FieldSchema::from_header(["Front", "Back", "Sound"]).unwrap();
        assert_eq!(schema.names(), &["Front", "Back", "Sound"]);
        assert_eq!(schema.input_width(), 3);
        assert_eq!(schema.get(1), Some("Back"));
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = FieldSchema::from_header(["Front", "Front"]).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateName("Front".into()));
    }

    #[test]
    fn empty_name_rejected_with_column() {
        let err = FieldSchema::from_header(["Front", " "]).unwrap_err();
        assert_eq!(err, SchemaError::EmptyName(2));
    }

    #[test]
    fn empty_header_rejected() {
        let err = FieldSchema::from_header(Vec::<String>::new()).unwrap_err();
        assert_eq!(err, SchemaError::Empty);
    }

    #[test]
    fn extend_well_known_appends_missing_only() {
        let mut schema = FieldSchema::from_header(["Front", "Back", "Sound"]).unwrap();
        schema.extend_well_known();
        assert_eq!(
            schema.names(),
            &["Front", "Back", "Sound", "Remark", "More", "Phonetics", "Image"]
        );
        assert_eq!(schema.input_width(), 3);
    }

    #[test]
    fn declares_ignores_appended_fields() {
        let mut schema = FieldSchema::from_header(["Front", "Back"]).unwrap();
        schema.extend_well_known();
        assert!(schema.contains("Sound"));
        assert!(!schema.declares("Sound"));
        assert!(schema.declares("Back"));
    }

    #[test]
    fn ensure_is_idempotent() {
        let mut schema = FieldSchema::from_header(["Front", "Back"]).unwrap();
        let first = schema.ensure("Sound_Answer");
        let second = schema.ensure("Sound_Answer");
        assert_eq!(first, 2);
        assert_eq!(first, second);
        assert_eq!(schema.len(), 3);
    }

    #[test]
    fn first_present_respects_candidate_order() {
        let schema = FieldSchema::from_header(["Front", "Extra", "Remark"]).unwrap();
        assert_eq!(schema.first_present(&["Remark", "Extra"]), Some("Remark"));
        assert_eq!(schema.first_present(&["Sound", "Audio"]), None);
    }
}
