//! Text-to-speech through an external command.
//!
//! The command line is configurable; placeholders are substituted per
//! argument:
//!
//! | Placeholder | Value |
//! |---|---|
//! | `{text}` | the text to pronounce |
//! | `{lang}` | the deck language |
//! | `{out}` | the `.mp3` path to write |
//!
//! The default is `gtts-cli --lang {lang} --output {out} {text}`.

use super::MediaError;
use log::debug;
use std::path::Path;
use std::process::Command;

/// Writes a pronunciation of `text` to `output`.
pub trait SpeechSynthesizer {
    fn synthesize(&self, text: &str, language: &str, output: &Path) -> Result<(), MediaError>;
}

pub fn default_speech_command() -> Vec<String> {
    ["gtts-cli", "--lang", "{lang}", "--output", "{out}", "{text}"]
        .map(String::from)
        .to_vec()
}

/// Runs a configured argv for every pronunciation.
#[derive(Debug, Clone)]
pub struct CommandSpeech {
    argv: Vec<String>,
}

impl CommandSpeech {
    /// Fails when `argv` is empty.
    pub fn new(argv: Vec<String>) -> Result<Self, MediaError> {
        if argv.is_empty() {
            return Err(MediaError::InvalidRequest("speech command is empty".into()));
        }
        Ok(Self { argv })
    }

    /// The argv with placeholders substituted.
    pub fn command_line(&self, text: &str, language: &str, output: &Path) -> Vec<String> {
        let out = output.to_string_lossy();
        self.argv
            .iter()
            .map(|arg| {
                arg.replace("{text}", text)
                    .replace("{lang}", language)
                    .replace("{out}", &out)
            })
            .collect()
    }
}

impl Default for CommandSpeech {
    fn default() -> Self {
        Self {
            argv: default_speech_command(),
        }
    }
}

impl SpeechSynthesizer for CommandSpeech {
    fn synthesize(&self, text: &str, language: &str, output: &Path) -> Result<(), MediaError> {
        let line = self.command_line(text, language, output);
        let (program, args) = line
            .split_first()
            .ok_or_else(|| MediaError::InvalidRequest("speech command is empty".into()))?;

        debug!("speaking '{text}' into {}", output.display());
        let result = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| MediaError::Command {
                program: program.clone(),
                message: e.to_string(),
            })?;
        if !result.status.success() {
            return Err(MediaError::Command {
                program: program.clone(),
                message: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        if !output.is_file() {
            return Err(MediaError::Command {
                program: program.clone(),
                message: format!("no file written to {}", output.display()),
            });
        }
        Ok(())
    }
}
