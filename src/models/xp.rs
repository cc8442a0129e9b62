//! XP and level table for review gamification.

use super::Rating;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Level {
    pub level: u32,
    pub title: &'static str,
    pub min_xp: u64,
}

/// Sorted ascending by `min_xp`; the first entry starts at zero.
pub const LEVELS: [Level; 10] = [
    Level { level: 1, title: "Aleph", min_xp: 0 },
    Level { level: 2, title: "Bet", min_xp: 100 },
    Level { level: 3, title: "Gimel", min_xp: 250 },
    Level { level: 4, title: "Dalet", min_xp: 500 },
    Level { level: 5, title: "He", min_xp: 1_000 },
    Level { level: 6, title: "Vav", min_xp: 2_000 },
    Level { level: 7, title: "Zayin", min_xp: 3_500 },
    Level { level: 8, title: "Chet", min_xp: 5_500 },
    Level { level: 9, title: "Tet", min_xp: 8_000 },
    Level { level: 10, title: "Yod", min_xp: 12_000 },
];

/// Granted once when a review session is completed.
pub const SESSION_COMPLETE_BONUS: u64 = 50;

pub fn xp_for_rating(rating: Rating) -> u64 {
    match rating {
        Rating::Again => 2,
        Rating::Hard => 5,
        Rating::Good => 10,
        Rating::Easy => 15,
    }
}

pub fn level_for_xp(xp: u64) -> &'static Level {
    let mut current = &LEVELS[0];
    for level in LEVELS.iter() {
        if level.min_xp <= xp {
            current = level;
        } else {
            break;
        }
    }
    current
}

/// Returns (xp earned within the current level, xp the level spans),
/// or None at the top level.
pub fn progress_to_next_level(xp: u64) -> Option<(u64, u64)> {
    let current = level_for_xp(xp);
    let next = LEVELS.iter().find(|l| l.level == current.level + 1)?;
    Some((xp - current.min_xp, next.min_xp - current.min_xp))
}
