//! Flashcard is a vocabulary pair <term, definition>. The term is written in the
//! lesson's script; the optional transliteration is in Latin letters.
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transliteration: Option<String>,
    pub definition: String,
}

impl Flashcard {
    pub fn new(term: &str, definition: &str) -> Self {
        Self {
            term: term.to_string(),
            transliteration: None,
            definition: definition.to_string(),
        }
    }

    pub fn with_transliteration(mut self, transliteration: &str) -> Self {
        self.transliteration = Some(transliteration.to_string());
        self
    }
}
