//! Wrapper for flashcards that tracks progress within one review session.
use super::{Flashcard, Rating};

#[derive(Clone, Debug)]
pub struct LearningCard {
    pub flashcard: Flashcard,
    pub is_learned: bool,
    pub last_rating: Option<Rating>,
}

impl LearningCard {
    pub fn new(flashcard: Flashcard) -> Self {
        Self {
            flashcard,
            is_learned: false,
            last_rating: None,
        }
    }

    /// Records a rating. Anything but `Again` counts as learned for this session.
    pub fn record_rating(&mut self, rating: Rating) {
        self.last_rating = Some(rating);
        self.is_learned = rating != Rating::Again;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_again_is_not_learned() {
        let mut card = LearningCard::new(Flashcard::new("מַיִם", "water"));
        assert_eq!(card.last_rating, None);

        card.record_rating(Rating::Hard);
        assert!(card.is_learned);
        assert_eq!(card.last_rating, Some(Rating::Hard));

        card.record_rating(Rating::Again);
        assert!(!card.is_learned);
        assert_eq!(card.last_rating, Some(Rating::Again));
    }
}
