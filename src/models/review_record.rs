use super::Rating;
use super::fsrs::{self, ReviewOutcome};
use chrono::{DateTime, Utc};

/// Memory state of one card.
#[derive(Clone, Debug, PartialEq)]
pub struct ReviewRecord {
    pub card_id: i64,
    pub stability: f64,
    pub difficulty: f64,
    pub last_reviewed: Option<DateTime<Utc>>,
    pub next_review_due: DateTime<Utc>,
    pub reps: u32,
    pub lapses: u32,
}

impl ReviewRecord {
    /// Seeds a record for a card seen for the first time. It is due immediately.
    pub fn new(card_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            card_id,
            stability: fsrs::initial_stability(),
            difficulty: fsrs::initial_difficulty(),
            last_reviewed: None,
            next_review_due: now,
            reps: 0,
            lapses: 0,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_due <= now
    }

    /// Rates the card at `now` and stores the new state in place.
    pub fn apply(&mut self, rating: Rating, now: DateTime<Utc>) -> ReviewOutcome {
        let outcome = fsrs::calculate_next_review(self.stability, self.difficulty, rating, now);

        self.stability = outcome.new_stability;
        self.difficulty = outcome.new_difficulty;
        self.last_reviewed = Some(now);
        self.next_review_due = outcome.next_review_date;
        self.reps += 1;
        if rating == Rating::Again {
            self.lapses += 1;
        }

        outcome
    }
}
