//! # vocab-deck
//!
//! Turns a delimited vocabulary table into an Anki package (`.apkg`).
//! The header row is the data model: column names decide which fields the
//! note type has and which cards get generated.
//!
//! # Architecture: One Pass Per Table
//!
//! ```text
//! 1. Read      table.csv  →  Table            (decode, split, header schema)
//! 2. Enrich    Table      →  Table + media    (phonetics, sounds, images)
//! 3. Model     schema     →  Model            (card templates for the layout)
//! 4. Notes     rows       →  Deck             (normalize, skip bad rows)
//! 5. Assemble  Deck       →  deck.apkg        (SQLite collection + media, zipped)
//! ```
//!
//! The reverse direction (`inspect`, `dump`) reads an archive back into a
//! [`types::Collection`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`input`] | Encoding fallback, delimiter detection, CSV parsing |
//! | [`schema`] | Ordered field names and the declared input width |
//! | [`normalize`] | Cell cleanup and row padding against the schema |
//! | [`enrich`] | Fills Phonetics, Sound and Image columns |
//! | [`media`] | Content-addressed media names and the collaborator traits |
//! | [`templates`] | Card layout detection and template synthesis (Maud) |
//! | [`notes`] | Row-to-note conversion with skip accounting |
//! | [`ids`] | Stable deck/model IDs and note GUIDs |
//! | [`archive`] | `.apkg` writing, reading and CSV dumping |
//! | [`pipeline`] | The `build` command end to end |
//! | [`config`] | `config.toml` loading, validation and merging |
//! | [`types`] | Shared data types |
//! | [`logging`] | env_logger setup for the binary |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Stable Identifiers
//!
//! Deck and model IDs are hashes of their names (and the model's field
//! names), and note GUIDs hash the front field. Importing a rebuilt deck
//! updates existing notes in Anki instead of duplicating them.
//!
//! ## Declared vs Appended Fields
//!
//! Well-known fields (`Phonetics`, `Sound`, `Image`, ...) may be appended so
//! every deck shares one note shape, but only fields the input header
//! declared change behaviour. An appended `Listen` never turns a deck into a
//! listening deck.
//!
//! ## Collaborators Behind Traits
//!
//! espeak-ng, the speech command and the image search sit behind
//! [`media::phonetics::Phonemizer`], [`media::speech::SpeechSynthesizer`]
//! and [`media::images::ImageSource`]. Tests drive enrichment with a
//! recording mock; nothing in the test suite touches the network.

pub mod archive;
pub mod config;
pub mod enrich;
pub mod ids;
pub mod input;
pub mod logging;
pub mod media;
pub mod normalize;
pub mod notes;
pub mod output;
pub mod pipeline;
pub mod schema;
pub mod templates;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
