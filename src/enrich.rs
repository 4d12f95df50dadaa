//! Enrichment: fill generated columns before notes are built.
//!
//! Enrichment is triggered by columns the input header declares. Appended
//! well-known fields never trigger it.
//!
//! | Declared column | Fills | From | With `Q&A` also fills |
//! |---|---|---|---|
//! | `Phonetics` | `/ipa/` | first field | `Phonetics_Answer` from the second |
//! | `Sound` | `[sound:sound_<hash>.mp3]` | first field | `Sound_Answer` from the second |
//! | `Image` | `<img src="img_<hash>.png">` | first field | |
//!
//! A cell that already holds a value is left alone unless `force_replace` is
//! set. A kept sound or image value still brings its file into the package
//! when that file can be found below the media directory. Media files already present anywhere below the media directory are
//! reused. A failing collaborator only costs the affected cell: the failure
//! is logged and the cell stays empty. Rows with more values than the header
//! are not touched; they will be skipped when notes are built.

use crate::media::images::ImageSource;
use crate::media::imaging::save_png;
use crate::media::phonetics::{Phonemizer, format_phonetics};
use crate::media::speech::SpeechSynthesizer;
use crate::media::{
    MediaError, MediaKind, find_existing, media_file_name, media_reference, referenced_file_name,
};
use crate::normalize::clean_cell;
use crate::templates::{IMAGE, PHONETICS, PHONETICS_ANSWER, QUESTION_ANSWER, SOUND_ANSWER};
use crate::types::{Row, Table};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// The sound column enrichment fills. `Audio` is accepted by templates but
/// is never generated into.
pub const SOUND: &str = "Sound";

/// Collaborators used for enrichment. A missing one disables that kind.
#[derive(Clone, Copy, Default)]
pub struct MediaServices<'a> {
    pub phonemizer: Option<&'a dyn Phonemizer>,
    pub speech: Option<&'a dyn SpeechSynthesizer>,
    pub images: Option<&'a dyn ImageSource>,
}

impl MediaServices<'_> {
    pub fn none() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone)]
pub struct EnrichOptions {
    pub media_dir: PathBuf,
    pub language: String,
    pub force_replace: bool,
    pub image_max_width: u32,
}

/// Media files referenced by the table, without duplicates, in first-use
/// order.
#[derive(Debug, Default)]
struct MediaSet {
    seen: HashSet<PathBuf>,
    files: Vec<PathBuf>,
}

impl MediaSet {
    fn insert(&mut self, path: PathBuf) {
        if self.seen.insert(path.clone()) {
            self.files.push(path);
        }
    }

    fn contains(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }
}

/// A source column and the field it generates into.
#[derive(Debug, Clone, Copy)]
struct Target {
    source: usize,
    field: usize,
}

pub struct Enricher<'a> {
    options: EnrichOptions,
    services: MediaServices<'a>,
}

impl<'a> Enricher<'a> {
    pub fn new(options: EnrichOptions, services: MediaServices<'a>) -> Self {
        Self { options, services }
    }

    /// Fill generated columns of `table` and return the media files its
    /// cells now reference.
    ///
    /// Only failing to create the media directory is an error.
    pub fn enrich(&self, table: &mut Table) -> Result<Vec<PathBuf>, MediaError> {
        let mut media = MediaSet::default();
        let qa = table.schema.declares(QUESTION_ANSWER);

        if table.schema.declares(PHONETICS)
            && let Some(phonemizer) = self.services.phonemizer
        {
            let targets = self.targets(table, PHONETICS, qa.then_some(PHONETICS_ANSWER));
            let filled = self.fill(table, &targets, None, &mut media, |text, _| {
                let ipa = phonemizer.phonemize(text, &self.options.language)?;
                Ok(Some(format_phonetics(&ipa)))
            });
            info!("Added phonetics to {filled} cells");
        }

        let speech = self.services.speech.filter(|_| table.schema.declares(SOUND));
        let images = self.services.images.filter(|_| table.schema.declares(IMAGE));
        if speech.is_some() || images.is_some() {
            fs::create_dir_all(&self.options.media_dir)?;
        }

        if let Some(speech) = speech {
            let targets = self.targets(table, SOUND, qa.then_some(SOUND_ANSWER));
            let kind = Some(MediaKind::Sound);
            let filled = self.fill(table, &targets, kind, &mut media, |text, media| {
                let generated = self.ensure_file(text, MediaKind::Sound, media, |out| {
                    speech.synthesize(text, &self.options.language, out)
                })?;
                Ok(generated.then(|| media_reference(text, MediaKind::Sound)))
            });
            info!("Added sounds to {filled} cells");
        }

        if let Some(images) = images {
            let targets = self.targets(table, IMAGE, None);
            let max_width = self.options.image_max_width;
            let kind = Some(MediaKind::Image);
            let filled = self.fill(table, &targets, kind, &mut media, |text, media| {
                let generated = self.ensure_file(text, MediaKind::Image, media, |out| {
                    let bytes = images.fetch_image(text)?;
                    save_png(&bytes, out, max_width)
                })?;
                Ok(generated.then(|| media_reference(text, MediaKind::Image)))
            });
            info!("Added images to {filled} cells");
        }

        Ok(media.files)
    }

    /// Field 0 feeds `primary`; field 1 feeds `answer` when given. The answer
    /// field is appended to the schema if missing.
    fn targets(&self, table: &mut Table, primary: &str, answer: Option<&str>) -> Vec<Target> {
        let mut targets = Vec::new();
        if let Some(field) = table.schema.position(primary) {
            targets.push(Target { source: 0, field });
        }
        if let Some(answer) = answer
            && table.schema.len() > 1
        {
            let field = table.schema.ensure(answer);
            targets.push(Target { source: 1, field });
        }
        targets
    }

    /// Run `generate` for every target cell that needs a value. Returns the
    /// number of cells filled.
    ///
    /// Kept values of a media `kind` have their file added to `media`.
    fn fill<F>(
        &self,
        table: &mut Table,
        targets: &[Target],
        kind: Option<MediaKind>,
        media: &mut MediaSet,
        mut generate: F,
    ) -> usize
    where
        F: FnMut(&str, &mut MediaSet) -> Result<Option<String>, MediaError>,
    {
        let width = table.schema.input_width();
        let mut filled = 0;
        for row in table.rows.iter_mut().filter(|r| r.cells.len() <= width) {
            for target in targets {
                let text = clean_cell(row.cell(target.source));
                if text.trim().is_empty() {
                    continue;
                }
                let current = current_value(row, target.field);
                if !self.options.force_replace && !current.is_empty() {
                    debug!("line {}: keeping existing value", row.line);
                    if let Some(kind) = kind {
                        self.keep_file(row.line, current, &text, kind, media);
                    }
                    continue;
                }
                match generate(&text, media) {
                    Ok(Some(value)) => {
                        row.fill(target.field, value);
                        filled += 1;
                    }
                    Ok(None) => {}
                    Err(e) => warn!("line {}: no media for '{text}': {e}", row.line),
                }
            }
        }
        filled
    }

    /// Add the file a kept `value` refers to. Values that are not a media
    /// reference fall back to the generated name for `text`.
    fn keep_file(
        &self,
        line: usize,
        value: &str,
        text: &str,
        kind: MediaKind,
        media: &mut MediaSet,
    ) {
        let name = referenced_file_name(value, kind)
            .map(str::to_string)
            .unwrap_or_else(|| media_file_name(text, kind));
        match find_existing(&self.options.media_dir, &name) {
            Some(path) => media.insert(path),
            None => warn!(
                "line {line}: {name} is not in {}, the card will miss it",
                self.options.media_dir.display()
            ),
        }
    }

    /// Make sure the media file for `text` exists. Returns whether it does.
    ///
    /// Generation errors are logged and reported as `false`.
    fn ensure_file<G>(
        &self,
        text: &str,
        kind: MediaKind,
        media: &mut MediaSet,
        generate: G,
    ) -> Result<bool, MediaError>
    where
        G: FnOnce(&Path) -> Result<(), MediaError>,
    {
        let name = media_file_name(text, kind);
        let target = self.options.media_dir.join(&name);
        if media.contains(&target) {
            return Ok(true);
        }
        if !self.options.force_replace
            && let Some(existing) = find_existing(&self.options.media_dir, &name)
        {
            debug!("reusing {} for '{text}'", existing.display());
            media.insert(existing);
            return Ok(true);
        }
        match generate(&target) {
            Ok(()) => {
                debug!("generated {} for '{text}'", target.display());
                media.insert(target);
                Ok(true)
            }
            Err(e) => {
                warn!("could not generate {name} for '{text}': {e}");
                Ok(false)
            }
        }
    }
}

/// The value a row currently holds at schema position `index`.
fn current_value(row: &Row, index: usize) -> &str {
    row.filled
        .get(&index)
        .map(String::as_str)
        .unwrap_or_else(|| row.cell(index))
}
