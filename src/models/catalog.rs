//! Container for all available lessons
use super::Lesson;

#[derive(Clone, Default)]
pub struct LessonCatalog {
    pub lessons: Vec<Lesson>,
}

impl LessonCatalog {
    pub fn find(&self, title: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.title == title)
    }

    pub fn contains(&self, title: &str) -> bool {
        self.find(title).is_some()
    }

    pub fn total_cards(&self) -> usize {
        self.lessons.iter().map(|l| l.vocabulary.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Flashcard, Language};

    #[test]
    fn test_lookup_and_count() {
        let mut alef = Lesson::new("Alef", Language::Hebrew);
        alef.vocabulary.push(Flashcard::new("אָב", "father"));
        let mut bet = Lesson::new("Bet", Language::Yiddish);
        bet.vocabulary.push(Flashcard::new("ברויט", "bread"));
        bet.vocabulary.push(Flashcard::new("וואַסער", "water"));

        let catalog = LessonCatalog {
            lessons: vec![alef, bet],
        };

        assert!(catalog.contains("Bet"));
        assert!(!catalog.contains("Gimel"));
        assert_eq!(catalog.find("Bet").map(|l| l.language), Some(Language::Yiddish));
        assert_eq!(catalog.total_cards(), 3);
    }
}
