//! Lesson is a titled vocabulary list in one of the taught languages.
use super::Flashcard;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Hebrew,
    Yiddish,
    Aramaic,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Hebrew => "hebrew",
            Language::Yiddish => "yiddish",
            Language::Aramaic => "aramaic",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hebrew" => Ok(Language::Hebrew),
            "yiddish" => Ok(Language::Yiddish),
            "aramaic" => Ok(Language::Aramaic),
            other => Err(Error::InvalidLesson(format!("unknown language '{}'", other))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub title: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub vocabulary: Vec<Flashcard>,
}

impl Default for Lesson {
    fn default() -> Self {
        Self {
            title: "My Lesson".to_string(),
            language: Language::Hebrew,
            description: None,
            vocabulary: Vec::new(),
        }
    }
}

impl Lesson {
    pub fn new(title: &str, language: Language) -> Self {
        Self {
            title: title.to_string(),
            language,
            ..Default::default()
        }
    }

    /// Rejects empty titles, blank terms/definitions and duplicate terms.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidLesson("title is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for (i, card) in self.vocabulary.iter().enumerate() {
            if card.term.trim().is_empty() {
                return Err(Error::InvalidLesson(format!("card {} has an empty term", i + 1)));
            }
            if card.definition.trim().is_empty() {
                return Err(Error::InvalidLesson(format!(
                    "card '{}' has an empty definition",
                    card.term
                )));
            }
            if !seen.insert(card.term.as_str()) {
                return Err(Error::InvalidLesson(format!("duplicate term '{}'", card.term)));
            }
        }

        Ok(())
    }
}
