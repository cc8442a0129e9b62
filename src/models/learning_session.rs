//! Review session management for spaced repetition practice.
//! Handles multi-round review with the FSRS-style scheduler and XP awards.

use super::fsrs::ReviewOutcome;
use super::{Flashcard, LearningCard, Rating, ReviewRecord, xp};
use crate::database::db;
use crate::error::{Error, Result};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// What grading one card produced
#[derive(Debug, Clone)]
pub struct GradeResult {
    pub outcome: ReviewOutcome,
    pub xp_awarded: u64,
    pub total_xp: u64,
}

/// Manages a review session with multiple rounds.
/// Cards rated `Again` are repeated in subsequent rounds.
pub struct LearningSession {
    pub lesson_title: String,
    pub all_cards: Vec<(i64, LearningCard, ReviewRecord)>,
    pub current_round_cards: Vec<usize>,
    pub current_index: usize,
    pub show_definition: bool,
    pub conn: Arc<Mutex<Connection>>,
    pub round_number: usize,
    pub xp_earned: u64,
    bonus_attempted: bool,
}

impl LearningSession {
    /// Creates a new session from cards that are due for review.
    pub fn new_from_due_cards(
        lesson_title: String,
        cards: Vec<(i64, Flashcard, ReviewRecord)>,
        conn: Arc<Mutex<Connection>>,
    ) -> Self {
        let learning_cards: Vec<_> = cards
            .into_iter()
            .map(|(id, fc, record)| (id, LearningCard::new(fc), record))
            .collect();

        let indices: Vec<usize> = (0..learning_cards.len()).collect();

        Self {
            lesson_title,
            all_cards: learning_cards,
            current_round_cards: indices,
            current_index: 0,
            show_definition: false,
            conn,
            round_number: 1,
            xp_earned: 0,
            bonus_attempted: false,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::StoragePoisoned)
    }

    pub fn current_card(&self) -> Option<&LearningCard> {
        self.current_round_cards
            .get(self.current_index)
            .and_then(|&idx| self.all_cards.get(idx).map(|(_, card, _)| card))
    }

    pub fn toggle_definition(&mut self) {
        self.show_definition = !self.show_definition;
    }

    pub fn next_card(&mut self) {
        if self.current_index + 1 < self.current_round_cards.len() {
            self.current_index += 1;
            self.show_definition = false;
        } else {
            self.start_next_round();
        }
    }

    /// Starts a new round with the cards rated `Again`.
    /// If none remain, the session is complete.
    fn start_next_round(&mut self) {
        let failed_indices: Vec<usize> = self
            .current_round_cards
            .iter()
            .copied()
            .filter(|&idx| {
                self.all_cards
                    .get(idx)
                    .map(|(_, card, _)| !card.is_learned)
                    .unwrap_or(false)
            })
            .collect();

        if !failed_indices.is_empty() {
            debug!(
                round = self.round_number + 1,
                cards = failed_indices.len(),
                "starting review round"
            );
            self.current_round_cards = failed_indices;
            self.current_index = 0;
            self.show_definition = false;
            self.round_number += 1;
        }
    }

    /// Rates the current card, persists its new review record and awards XP.
    /// Both writes share one transaction; in-memory state changes only after commit.
    /// Returns `None` when there is no card to grade.
    pub fn grade_current_card(&mut self, rating: Rating) -> Result<Option<GradeResult>> {
        let Some(&actual_idx) = self.current_round_cards.get(self.current_index) else {
            return Ok(None);
        };
        let Some((_, _, record)) = self.all_cards.get(actual_idx) else {
            return Ok(None);
        };

        let conn = self.conn.clone();
        let mut conn = conn.lock().map_err(|_| Error::StoragePoisoned)?;
        let tx = conn.transaction()?;
        let now = db::get_current_date(&tx)?;

        let mut updated = record.clone();
        let outcome = updated.apply(rating, now);
        db::update_review_record(&updated, &tx)?;

        let xp_awarded = xp::xp_for_rating(rating);
        let total_xp = db::add_xp(xp_awarded, &tx)?;
        tx.commit()?;

        if let Some((card_id, card, record)) = self.all_cards.get_mut(actual_idx) {
            *record = updated;
            card.record_rating(rating);

            debug!(
                card_id = *card_id,
                %rating,
                stability = outcome.new_stability,
                difficulty = outcome.new_difficulty,
                interval_days = outcome.next_interval,
                "card graded"
            );
        }
        self.xp_earned += xp_awarded;

        Ok(Some(GradeResult {
            outcome,
            xp_awarded,
            total_xp,
        }))
    }

    /// Grants the completion bonus once the session is complete.
    /// Only the first call on a completed session writes; a failed write is not retried.
    /// Returns the new XP total, or `None` if not complete or already attempted.
    pub fn claim_completion_bonus(&mut self) -> Result<Option<u64>> {
        if !self.is_completed() || self.bonus_attempted || self.all_cards.is_empty() {
            return Ok(None);
        }
        self.bonus_attempted = true;

        let total = db::add_xp(xp::SESSION_COMPLETE_BONUS, &*self.lock()?)?;
        self.xp_earned += xp::SESSION_COMPLETE_BONUS;

        info!(
            lesson = %self.lesson_title,
            rounds = self.round_number,
            xp = self.xp_earned,
            "review session completed"
        );
        Ok(Some(total))
    }

    pub fn learned_count(&self) -> usize {
        self.current_round_cards
            .iter()
            .filter(|&&idx| {
                self.all_cards
                    .get(idx)
                    .map(|(_, card, _)| card.is_learned)
                    .unwrap_or(false)
            })
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.current_round_cards.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.learned_count()
    }

    /// True when the current round is empty or every card in it is learned.
    pub fn is_completed(&self) -> bool {
        self.current_round_cards.is_empty() || self.learned_count() == self.total_count()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} cards", self.round_number, self.total_count())
        } else {
            format!(
                "Round {} (Review): {} cards to retry",
                self.round_number,
                self.total_count()
            )
        }
    }
}
