//! Deck configuration module.
//!
//! Handles loading, validating, and merging `config.toml` files. Stock
//! defaults are overridden by a `config.toml` placed next to the input file,
//! or by a file passed explicitly with `--config`.
//!
//! ## Config File Location
//!
//! ```text
//! vocabulary/
//! ├── config.toml      # Applies to every table in this directory
//! ├── french.csv
//! ├── style.css        # Optional, referenced by [style] css_file
//! └── media/           # Generated sounds and images (reused across builds)
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [input]
//! delimiter = "auto"        # "auto", "tab", or a single character
//! encodings = ["utf-8", "iso-8859-1", "windows-1252"]
//!
//! [fields]
//! extend_well_known = true  # Append Remark, More, Phonetics, Sound, Image when absent
//!
//! [style]
//! # css_file = "style.css"  # Card CSS, relative to the config directory
//!
//! [media]
//! dir = "media"
//! language = "en"
//! force_replace = false
//! image_max_width = 800
//!
//! [media.sound]
//! command = ["gtts-cli", "--lang", "{lang}", "--output", "{out}", "{text}"]
//!
//! [media.images]
//! engine = "bing"           # "bing" or "none"
//! filter = ""               # line, photo, clipart, transparent
//! adult = "off"             # off, moderate, strict
//! timeout_secs = 10
//!
//! [phonetics]
//! command = "espeak-ng"
//! with_stress = true
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse, override just the values you want:
//!
//! ```toml
//! [media]
//! language = "fr"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::input::{lookup_encoding, parse_delimiter};
use crate::media::speech::default_speech_command;
use crate::templates::DEFAULT_CSS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "config.toml";

const IMAGE_ENGINES: &[&str] = &["bing", "none"];
const ADULT_LEVELS: &[&str] = &["off", "moderate", "strict"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

/// Deck configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeckConfig {
    /// How the input table is decoded and split.
    pub input: InputConfig,
    /// Schema extension.
    pub fields: FieldsConfig,
    /// Card styling.
    pub style: StyleConfig,
    /// Generated sounds and images.
    pub media: MediaConfig,
    /// IPA transcription.
    pub phonetics: PhoneticsConfig,
}

impl DeckConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_delimiter(&self.input.delimiter)
            .map_err(|e| ConfigError::Validation(format!("input.delimiter: {e}")))?;
        if self.input.encodings.is_empty() {
            return Err(ConfigError::Validation(
                "input.encodings must not be empty".into(),
            ));
        }
        for label in &self.input.encodings {
            lookup_encoding(label)
                .map_err(|e| ConfigError::Validation(format!("input.encodings: {e}")))?;
        }
        if self.media.language.trim().is_empty() {
            return Err(ConfigError::Validation(
                "media.language must not be empty".into(),
            ));
        }
        if self.media.image_max_width == 0 {
            return Err(ConfigError::Validation(
                "media.image_max_width must be non-zero".into(),
            ));
        }
        if self.media.sound.command.is_empty() {
            return Err(ConfigError::Validation(
                "media.sound.command must not be empty".into(),
            ));
        }
        if !IMAGE_ENGINES.contains(&self.media.images.engine.as_str()) {
            return Err(ConfigError::Validation(format!(
                "media.images.engine must be one of {IMAGE_ENGINES:?}"
            )));
        }
        if !ADULT_LEVELS.contains(&self.media.images.adult.as_str()) {
            return Err(ConfigError::Validation(format!(
                "media.images.adult must be one of {ADULT_LEVELS:?}"
            )));
        }
        if self.media.images.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "media.images.timeout_secs must be non-zero".into(),
            ));
        }
        if self.phonetics.command.trim().is_empty() {
            return Err(ConfigError::Validation(
                "phonetics.command must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Card CSS: the configured file, resolved against `base_dir`, or the
    /// bundled stylesheet.
    pub fn css(&self, base_dir: &Path) -> Result<String, ConfigError> {
        match &self.style.css_file {
            Some(file) => Ok(fs::read_to_string(base_dir.join(file))?),
            None => Ok(DEFAULT_CSS.to_string()),
        }
    }
}

/// Input table decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// `"auto"` to sniff from the header line, `"tab"`, or one character.
    pub delimiter: String,
    /// Encodings tried in order; the first that decodes to data rows wins.
    pub encodings: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiter: "auto".to_string(),
            encodings: vec![
                "utf-8".to_string(),
                "iso-8859-1".to_string(),
                "windows-1252".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldsConfig {
    /// Append absent well-known fields so every deck shares the same shape.
    pub extend_well_known: bool,
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            extend_well_known: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    /// Card CSS file, relative to the config directory.
    pub css_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaConfig {
    /// Directory for generated media, relative to the input file.
    pub dir: PathBuf,
    /// Language code for speech, phonetics and image search.
    pub language: String,
    /// Regenerate media even when the file already exists.
    pub force_replace: bool,
    /// Downloaded images wider than this are scaled down.
    pub image_max_width: u32,
    pub sound: SoundConfig,
    pub images: ImageSearchConfig,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("media"),
            language: "en".to_string(),
            force_replace: false,
            image_max_width: 800,
            sound: SoundConfig::default(),
            images: ImageSearchConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SoundConfig {
    /// Text-to-speech argv with `{text}`, `{lang}` and `{out}` placeholders.
    pub command: Vec<String>,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            command: default_speech_command(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageSearchConfig {
    /// `"bing"`, or `"none"` to leave image columns alone.
    pub engine: String,
    /// Bing filter shorthand.
    pub filter: String,
    /// Bing safe search level.
    pub adult: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for ImageSearchConfig {
    fn default() -> Self {
        Self {
            engine: "bing".to_string(),
            filter: String::new(),
            adult: "off".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ImageSearchConfig {
    pub fn enabled(&self) -> bool {
        self.engine != "none"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhoneticsConfig {
    /// espeak-ng executable.
    pub command: String,
    /// Keep primary and secondary stress marks in transcriptions.
    pub with_stress: bool,
}

impl Default for PhoneticsConfig {
    fn default() -> Self {
        Self {
            command: "espeak-ng".to_string(),
            with_stress: true,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(DeckConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `config.toml`.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    load_raw_config_file(&config_path).map(Some)
}

/// Load an explicitly named config file. A missing file is an error.
pub fn load_raw_config_file(path: &Path) -> Result<toml::Value, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<DeckConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: DeckConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory, over stock
/// defaults.
pub fn load_config(dir: &Path) -> Result<DeckConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Load config from an explicit file, over stock defaults.
pub fn load_config_file(path: &Path) -> Result<DeckConfig, ConfigError> {
    resolve_config(stock_defaults_value(), Some(load_raw_config_file(path)?))
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# vocab-deck configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file next to your vocabulary tables as config.toml, or pass it
# with --config. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Input tables
# ---------------------------------------------------------------------------
[input]
# "auto" picks the most frequent of ; , tab | in the header line.
# Otherwise "tab" or a single character.
delimiter = "auto"

# Encodings tried in order. The first one that decodes the whole file and
# yields at least one data row is used.
encodings = ["utf-8", "iso-8859-1", "windows-1252"]

# ---------------------------------------------------------------------------
# Fields
# ---------------------------------------------------------------------------
[fields]
# Append Remark, More, Phonetics, Sound and Image when the header does not
# name them, so every deck shares one note shape.
# Appended fields never change which cards are generated.
extend_well_known = true

# ---------------------------------------------------------------------------
# Card style
# ---------------------------------------------------------------------------
[style]
# CSS file for the cards, relative to this file. The bundled style is used
# when unset.
# css_file = "style.css"

# ---------------------------------------------------------------------------
# Media
# ---------------------------------------------------------------------------
[media]
# Generated sounds and images, relative to the input file. Files already
# present anywhere below this directory are reused.
dir = "media"

# Language of the first column: used for speech, phonetics and image search.
language = "en"

# Regenerate media and phonetics even when they already exist.
force_replace = false

# Downloaded images wider than this (pixels) are scaled down.
image_max_width = 800

[media.sound]
# Text-to-speech command. {text}, {lang} and {out} are substituted.
command = ["gtts-cli", "--lang", "{lang}", "--output", "{out}", "{text}"]

[media.images]
# "bing", or "none" to leave Image columns empty.
engine = "bing"

# One of: line, photo, clipart, transparent. Empty for no filter.
filter = ""

# Safe search: off, moderate, strict.
adult = "off"

# Seconds before a search or download is abandoned.
timeout_secs = 10

# ---------------------------------------------------------------------------
# Phonetics
# ---------------------------------------------------------------------------
[phonetics]
# espeak-ng executable used for IPA transcriptions.
command = "espeak-ng"

# Keep stress marks (ˈ ˌ) in transcriptions.
with_stress = true
"##
}
