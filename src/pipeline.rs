//! The `build` pipeline: one input table in, one `.apkg` out.
//!
//! ```text
//! read table → extend schema → check layout → enrich → model → notes → archive
//! ```
//!
//! The card layout is checked before enrichment so that an invalid header
//! fails before any media is generated or any note exists.

use crate::archive::{ArchiveError, assemble};
use crate::config::{ConfigError, DeckConfig};
use crate::enrich::{EnrichOptions, Enricher, MediaServices};
use crate::input::{InputError, read_table};
use crate::media::MediaError;
use crate::media::images::{BingImageSearch, ImageSource};
use crate::media::phonetics::PhonemizerCache;
use crate::media::speech::CommandSpeech;
use crate::notes::{BuildCounts, build_notes};
use crate::templates::{CardLayout, TemplateError, build_model};
use crate::types::Deck;
use log::info;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const PACKAGE_EXTENSION: &str = "apkg";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Input error: {0}")]
    Input(#[from] InputError),
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
    #[error("Media error: {0}")]
    Media(#[from] MediaError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Cannot derive a deck name from {0}")]
    NoDeckName(PathBuf),
}

/// Per-invocation settings. Overrides here win over the config file.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub input: PathBuf,
    /// Defaults to the input file stem.
    pub deck_name: Option<String>,
    /// Archive file name without extension. Defaults to the deck name.
    pub package_name: Option<String>,
    pub output_dir: PathBuf,
    /// Directory `style.css_file` is resolved against. Defaults to the
    /// input file's directory.
    pub config_dir: Option<PathBuf>,
    /// Skip enrichment entirely.
    pub no_media: bool,
    pub force_media: bool,
    pub language: Option<String>,
}

impl BuildOptions {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: PathBuf::from("."),
            ..Self::default()
        }
    }

    /// Directory holding the input file.
    pub fn input_dir(&self) -> &Path {
        match self.input.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    pub fn resolved_deck_name(&self) -> Result<String, BuildError> {
        if let Some(name) = &self.deck_name {
            return Ok(name.clone());
        }
        self.input
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| BuildError::NoDeckName(self.input.clone()))
    }

    /// `<output_dir>/<package name>.apkg`.
    pub fn archive_path(&self, deck_name: &str) -> PathBuf {
        let package = self.package_name.as_deref().unwrap_or(deck_name);
        self.output_dir
            .join(format!("{package}.{PACKAGE_EXTENSION}"))
    }

    pub fn language<'a>(&'a self, config: &'a DeckConfig) -> &'a str {
        self.language.as_deref().unwrap_or(&config.media.language)
    }
}

/// What a build produced.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub deck_name: String,
    pub deck_id: u64,
    pub model_name: String,
    pub model_id: u64,
    pub layout: CardLayout,
    pub fields: Vec<String>,
    pub counts: BuildCounts,
    pub cards: usize,
    pub media: usize,
    pub archive: PathBuf,
}

/// Production media collaborators built from config.
pub struct MediaStack {
    phonemizer: PhonemizerCache,
    speech: CommandSpeech,
    images: Option<BingImageSearch>,
}

impl MediaStack {
    pub fn from_config(config: &DeckConfig, language: &str) -> Result<Self, MediaError> {
        let mut phonemizer =
            PhonemizerCache::new(&config.phonetics.command, config.phonetics.with_stress);
        phonemizer.get(language);
        let speech = CommandSpeech::new(config.media.sound.command.clone())?;
        let search = &config.media.images;
        let images = if search.enabled() {
            Some(BingImageSearch::new(
                language,
                &search.adult,
                &search.filter,
                Duration::from_secs(search.timeout_secs),
            )?)
        } else {
            None
        };
        Ok(Self {
            phonemizer,
            speech,
            images,
        })
    }

    pub fn services(&self) -> MediaServices<'_> {
        MediaServices {
            phonemizer: Some(&self.phonemizer),
            speech: Some(&self.speech),
            images: self.images.as_ref().map(|i| i as &dyn ImageSource),
        }
    }
}

/// Build `options.input` into an archive.
pub fn build_deck(
    options: &BuildOptions,
    config: &DeckConfig,
    services: MediaServices<'_>,
) -> Result<BuildReport, BuildError> {
    let deck_name = options.resolved_deck_name()?;
    let config_dir = options
        .config_dir
        .as_deref()
        .unwrap_or_else(|| options.input_dir());
    let css = config.css(config_dir)?;

    let mut table = read_table(&options.input, &config.input)?;
    info!(
        "Read {} rows from {}",
        table.rows.len(),
        options.input.display()
    );
    if config.fields.extend_well_known {
        table.schema.extend_well_known();
    }
    let layout = CardLayout::detect(&table.schema)?;

    let media = if options.no_media {
        Vec::new()
    } else {
        let enrich_options = EnrichOptions {
            media_dir: options.input_dir().join(&config.media.dir),
            language: options.language(config).to_string(),
            force_replace: options.force_media || config.media.force_replace,
            image_max_width: config.media.image_max_width,
        };
        Enricher::new(enrich_options, services).enrich(&mut table)?
    };

    let model = build_model(table.schema, &css)?;
    info!("Using model '{}' ({:?} layout)", model.name, layout);

    let mut deck = Deck::new(deck_name);
    let counts = build_notes(&mut deck, &model, &table.rows);
    info!("Deck '{}': {counts}", deck.name);

    let archive = options.archive_path(&deck.name);
    let summary = assemble(&deck, &model, &media, &archive)?;

    Ok(BuildReport {
        deck_name: deck.name,
        deck_id: deck.id,
        model_name: model.name,
        model_id: model.id,
        layout,
        fields: model.schema.names().to_vec(),
        counts,
        cards: summary.cards,
        media: summary.media,
        archive,
    })
}
