use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::warn;

use crate::error::TextError;
use crate::session::Difficulty;

static TEXT_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/texts");

/// Source of target texts for a difficulty
pub trait TextProvider {
    fn fetch(&mut self, difficulty: Difficulty) -> Result<String, TextError>;
}

#[derive(Deserialize, Clone, Debug)]
pub struct Corpus {
    pub name: String,
    pub passages: Vec<String>,
}

impl Corpus {
    pub fn load(difficulty: Difficulty) -> Result<Self, TextError> {
        let file = TEXT_DIR
            .get_file(format!("{difficulty}.json"))
            .ok_or(TextError::MissingCorpus(difficulty))?;
        let contents = file
            .contents_utf8()
            .ok_or(TextError::MissingCorpus(difficulty))?;
        let corpus: Corpus = serde_json::from_str(contents)?;
        if corpus.passages.is_empty() {
            return Err(TextError::EmptyCorpus(difficulty));
        }
        Ok(corpus)
    }
}

/// Random passages from the bundled corpora
#[derive(Debug, Default, Clone, Copy)]
pub struct CorpusTextProvider;

impl TextProvider for CorpusTextProvider {
    fn fetch(&mut self, difficulty: Difficulty) -> Result<String, TextError> {
        let corpus = Corpus::load(difficulty)?;
        corpus
            .passages
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(TextError::EmptyCorpus(difficulty))
    }
}

/// User-supplied text, returned as-is for every difficulty
#[derive(Debug, Clone)]
pub struct CustomTextProvider {
    text: String,
}

impl CustomTextProvider {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl TextProvider for CustomTextProvider {
    fn fetch(&mut self, _difficulty: Difficulty) -> Result<String, TextError> {
        if self.text.trim().is_empty() {
            return Err(TextError::EmptyText);
        }
        Ok(self.text.clone())
    }
}

/// Fixed passage used when a provider fails
pub fn fallback_text(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Beginner => "the quick brown fox jumps over the lazy dog",
        Difficulty::Intermediate | Difficulty::Unrecognized => {
            "The quick brown fox jumps over the lazy dog while the sun sets behind the hills."
        }
        Difficulty::Advanced => {
            "Pack my box with five dozen liquor jugs; then, quietly, sweep the floor before anyone wakes."
        }
        Difficulty::Expert => {
            "Invoice #207 (due 04/15) lists 3 items @ $19.99 each: total $59.97 + 7% tax = $64.17!"
        }
        Difficulty::Code => "fn add(a: i32, b: i32) -> i32 {\n    a + b\n}",
    }
}

/// Line endings unified and trailing whitespace dropped
pub fn normalize_text(text: &str) -> String {
    text.replace("\r\n", "\n").trim_end().to_string()
}

/// Asks the provider for a text, substituting the fallback on failure
pub fn resolve_text(provider: &mut dyn TextProvider, difficulty: Difficulty) -> String {
    match provider.fetch(difficulty) {
        Ok(text) if !text.trim().is_empty() => normalize_text(&text),
        Ok(_) => {
            warn!(%difficulty, "text provider returned empty text, using fallback");
            fallback_text(difficulty).to_string()
        }
        Err(e) => {
            warn!(%difficulty, error = %e, "text provider failed, using fallback");
            fallback_text(difficulty).to_string()
        }
    }
}
