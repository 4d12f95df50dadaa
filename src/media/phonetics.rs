//! Phonetic transcription (IPA) through espeak-ng.

use super::MediaError;
use log::debug;
use std::collections::HashMap;
use std::process::Command;

/// Stress marks espeak-ng emits in IPA mode.
const STRESS_MARKS: &[char] = &['ˈ', 'ˌ'];

/// Converts text into an IPA transcription.
pub trait Phonemizer {
    fn phonemize(&self, text: &str, language: &str) -> Result<String, MediaError>;
}

/// Map a short language code to the espeak-ng voice for it.
///
/// `fr` and `en` have several regional voices; the bare code picks the one
/// learners usually expect.
pub fn espeak_voice(language: &str) -> &str {
    match language {
        "fr" => "fr-fr",
        "en" => "en-us",
        other => other,
    }
}

/// Runs `espeak-ng -q --ipa -v <voice> <text>`.
#[derive(Debug, Clone)]
pub struct EspeakPhonemizer {
    program: String,
    voice: String,
    with_stress: bool,
}

impl EspeakPhonemizer {
    pub fn new(program: impl Into<String>, language: &str, with_stress: bool) -> Self {
        Self {
            program: program.into(),
            voice: espeak_voice(language).to_string(),
            with_stress,
        }
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }
}

impl Phonemizer for EspeakPhonemizer {
    fn phonemize(&self, text: &str, _language: &str) -> Result<String, MediaError> {
        let output = Command::new(&self.program)
            .args(["-q", "--ipa", "-v", self.voice.as_str(), text])
            .output()
            .map_err(|e| MediaError::Command {
                program: self.program.clone(),
                message: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(MediaError::Command {
                program: self.program.clone(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let ipa = clean_transcription(&String::from_utf8_lossy(&output.stdout), self.with_stress);
        debug!("{text} -> /{ipa}/");
        Ok(ipa)
    }
}

/// Join espeak's per-clause lines and optionally drop stress marks.
pub fn clean_transcription(raw: &str, with_stress: bool) -> String {
    let joined = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if with_stress {
        joined
    } else {
        joined.replace(STRESS_MARKS, "")
    }
}

/// Wrap a transcription in slashes, the way dictionaries print it.
pub fn format_phonetics(ipa: &str) -> String {
    format!("/{ipa}/")
}

/// Phonemizers keyed by language, created on first use.
///
/// Owned by the caller of a build; nothing is cached between builds.
pub struct PhonemizerCache {
    program: String,
    with_stress: bool,
    entries: HashMap<String, EspeakPhonemizer>,
}

impl PhonemizerCache {
    pub fn new(program: impl Into<String>, with_stress: bool) -> Self {
        Self {
            program: program.into(),
            with_stress,
            entries: HashMap::new(),
        }
    }

    /// The phonemizer for `language`, created if needed.
    pub fn get(&mut self, language: &str) -> &EspeakPhonemizer {
        let program = &self.program;
        let with_stress = self.with_stress;
        self.entries
            .entry(language.to_string())
            .or_insert_with(|| EspeakPhonemizer::new(program.clone(), language, with_stress))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Phonemizer for PhonemizerCache {
    /// Languages never requested through [`PhonemizerCache::get`] get a
    /// one-off phonemizer.
    fn phonemize(&self, text: &str, language: &str) -> Result<String, MediaError> {
        match self.entries.get(language) {
            Some(phonemizer) => phonemizer.phonemize(text, language),
            None => EspeakPhonemizer::new(self.program.clone(), language, self.with_stress)
                .phonemize(text, language),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voices_for_short_codes() {
        assert_eq!(espeak_voice("fr"), "fr-fr");
        assert_eq!(espeak_voice("en"), "en-us");
        assert_eq!(espeak_voice("de"), "de");
    }

    #[test]
    fn clean_joins_lines() {
        assert_eq!(clean_transcription(" bɔ̃ʒˈuʁ\n mɔ̃sjˈø\n", true), "bɔ̃ʒˈuʁ mɔ̃sjˈø");
    }

    #[test]
    fn clean_strips_stress_when_asked() {
        assert_eq!(clean_transcription(" ʃˈa\n", false), "ʃa");
        assert_eq!(clean_transcription("ˌɪntəˈnæʃənəl", false), "ɪntənæʃənəl");
    }

    #[test]
    fn phonetics_are_slash_wrapped() {
        assert_eq!(format_phonetics("ʃa"), "/ʃa/");
    }

    #[test]
    fn cache_reuses_phonemizers() {
        let mut cache = PhonemizerCache::new("espeak-ng", true);
        assert_eq!(cache.get("fr").voice(), "fr-fr");
        assert_eq!(cache.get("fr").voice(), "fr-fr");
        assert_eq!(cache.get("en").voice(), "en-us");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn missing_program_is_command_error() {
        let phonemizer = EspeakPhonemizer::new("/nonexistent/espeak-ng", "fr", true);
        let err = phonemizer.phonemize("chat", "fr").unwrap_err();
        assert!(matches!(err, MediaError::Command { .. }));
    }
}
