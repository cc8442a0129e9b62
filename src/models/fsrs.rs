//! Simplified FSRS-style review scheduler.
//!
//! Each card carries a stability (days until recall decays to the reference
//! threshold) and a difficulty in `[0.1, 1.0]`. A rating updates both:
//! - Stability grows by `factor * 1.3 * difficulty`, where the factor is picked
//!   by rating (0.1, 0.5, 1.0, 1.5). It never drops below 0.1.
//! - Difficulty moves by a fixed delta per rating and is clamped after every update.
//! - The next interval is a fixed lookup per rating (1 hour, 2, 4 or 7 days).
//!   It does not depend on the new stability.

use super::Rating;
use chrono::{DateTime, Duration, Utc};

pub const INITIAL_STABILITY: f64 = 0.4;
pub const INITIAL_DIFFICULTY: f64 = 0.3;

pub const MIN_STABILITY: f64 = 0.1;
pub const MIN_DIFFICULTY: f64 = 0.1;
pub const MAX_DIFFICULTY: f64 = 1.0;

/// Scales how strongly difficulty amplifies the stability gain.
const STABILITY_GAIN: f64 = 1.3;

const MS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Result of rating a card once
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome {
    pub new_stability: f64,
    pub new_difficulty: f64,
    /// Days until the next review; fractional for sub-day intervals
    pub next_interval: f64,
    pub next_review_date: DateTime<Utc>,
}

pub fn initial_stability() -> f64 {
    INITIAL_STABILITY
}

pub fn initial_difficulty() -> f64 {
    INITIAL_DIFFICULTY
}

fn stability_factor(rating: Rating) -> f64 {
    match rating {
        Rating::Again => 0.1,
        Rating::Hard => 0.5,
        Rating::Good => 1.0,
        Rating::Easy => 1.5,
    }
}

fn difficulty_delta(rating: Rating) -> f64 {
    match rating {
        Rating::Again => 0.15,
        Rating::Hard => 0.05,
        Rating::Good => 0.0,
        Rating::Easy => -0.05,
    }
}

/// Fixed interval table, in days.
pub fn interval_for(rating: Rating) -> f64 {
    match rating {
        Rating::Again => 1.0 / 24.0,
        Rating::Hard => 2.0,
        Rating::Good => 4.0,
        Rating::Easy => 7.0,
    }
}

/// Converts fractional days to a chrono duration, rounded to the millisecond.
pub fn interval_to_duration(days: f64) -> Duration {
    Duration::milliseconds((days * MS_PER_DAY).round() as i64)
}

/// Calculates the new memory state and next review date for one rating.
pub fn calculate_next_review(
    current_stability: f64,
    current_difficulty: f64,
    rating: Rating,
    now: DateTime<Utc>,
) -> ReviewOutcome {
    let factor = stability_factor(rating);

    let new_difficulty =
        (current_difficulty + difficulty_delta(rating)).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);

    let new_stability = (current_stability
        * (1.0 + factor * STABILITY_GAIN * current_difficulty))
        .max(MIN_STABILITY);

    let next_interval = interval_for(rating);

    ReviewOutcome {
        new_stability,
        new_difficulty,
        next_interval,
        next_review_date: now + interval_to_duration(next_interval),
    }
}

/// Same as [`calculate_next_review`] against the system clock.
pub fn calculate_next_review_now(
    current_stability: f64,
    current_difficulty: f64,
    rating: Rating,
) -> ReviewOutcome {
    calculate_next_review(current_stability, current_difficulty, rating, Utc::now())
}

/// Interval each rating would produce, in `Rating::ALL` order.
/// Used to label the rating buttons.
pub fn preview_intervals() -> [(Rating, f64); 4] {
    Rating::ALL.map(|rating| (rating, interval_for(rating)))
}

/// Formats an interval in days as a short label ("1h", "4d", "1w", ...).
pub fn format_interval(days: f64) -> String {
    if days <= 0.0 {
        "now".to_string()
    } else if days < 1.0 {
        let hours = (days * 24.0).round().max(1.0) as i64;
        format!("{}h", hours)
    } else if days < 7.0 {
        format!("{}d", days.round() as i64)
    } else if days < 30.0 {
        format!("{}w", (days / 7.0).floor() as i64)
    } else if days < 365.0 {
        format!("{}mo", (days / 30.0).floor() as i64)
    } else {
        format!("{}y", (days / 365.0).floor() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const EPS: f64 = 1e-9;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_good_keeps_difficulty() {
        let now = fixed_now();
        let out = calculate_next_review(1.0, 0.3, Rating::Good, now);
        assert!((out.new_stability - 1.39).abs() < EPS);
        assert!((out.new_difficulty - 0.3).abs() < EPS);
        assert_eq!(out.next_interval, 4.0);
        assert_eq!(out.next_review_date, now + Duration::days(4));
    }

    #[test]
    fn test_again_is_one_hour() {
        let now = fixed_now();
        let out = calculate_next_review(1.0, 0.3, Rating::Again, now);
        assert!((out.new_stability - 1.039).abs() < EPS);
        assert!((out.new_difficulty - 0.45).abs() < EPS);
        assert!((out.next_interval - 1.0 / 24.0).abs() < EPS);
        assert_eq!(out.next_review_date, now + Duration::hours(1));
    }

    #[test]
    fn test_easy_lowers_difficulty() {
        let now = fixed_now();
        let out = calculate_next_review(0.4, 1.0, Rating::Easy, now);
        assert!((out.new_stability - 1.18).abs() < EPS);
        assert!((out.new_difficulty - 0.95).abs() < EPS);
        assert_eq!(out.next_interval, 7.0);
        assert_eq!(out.next_review_date, now + Duration::days(7));
    }

    #[test]
    fn test_stability_floor() {
        let out = calculate_next_review(0.05, 0.3, Rating::Hard, fixed_now());
        assert_eq!(out.new_stability, MIN_STABILITY);
        assert!((out.new_difficulty - 0.35).abs() < EPS);
        assert_eq!(out.next_interval, 2.0);
    }

    #[test]
    fn test_difficulty_ceiling_and_floor() {
        let out = calculate_next_review(1.0, 0.95, Rating::Again, fixed_now());
        assert_eq!(out.new_difficulty, MAX_DIFFICULTY);

        let out = calculate_next_review(1.0, 0.12, Rating::Easy, fixed_now());
        assert_eq!(out.new_difficulty, MIN_DIFFICULTY);
    }

    #[test]
    fn test_out_of_range_difficulty_is_clamped() {
        let out = calculate_next_review(1.0, 1.4, Rating::Good, fixed_now());
        assert_eq!(out.new_difficulty, MAX_DIFFICULTY);
    }

    #[test]
    fn test_seed_constants() {
        assert_eq!(initial_stability(), 0.4);
        assert_eq!(initial_difficulty(), 0.3);
        assert_eq!(initial_stability(), initial_stability());
    }

    #[test]
    fn test_preview_intervals_ordered() {
        let preview = preview_intervals();
        assert_eq!(preview[0].0, Rating::Again);
        assert_eq!(preview[3], (Rating::Easy, 7.0));
        assert!(preview.windows(2).all(|w| w[0].1 < w[1].1));
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(0.0), "now");
        assert_eq!(format_interval(1.0 / 24.0), "1h");
        assert_eq!(format_interval(2.0), "2d");
        assert_eq!(format_interval(4.0), "4d");
        assert_eq!(format_interval(7.0), "1w");
        assert_eq!(format_interval(90.0), "3mo");
        assert_eq!(format_interval(400.0), "1y");
    }

    #[test]
    fn test_now_wrapper_uses_clock() {
        let before = Utc::now();
        let out = calculate_next_review_now(1.0, 0.3, Rating::Hard);
        let after = Utc::now();
        assert!(out.next_review_date >= before + Duration::days(2));
        assert!(out.next_review_date <= after + Duration::days(2));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn stability() -> impl Strategy<Value = f64> {
            prop_oneof![Just(0.01), Just(0.1), 0.001f64..365.0]
        }

        fn difficulty() -> impl Strategy<Value = f64> {
            prop_oneof![Just(MIN_DIFFICULTY), Just(MAX_DIFFICULTY), 0.1f64..=1.0]
        }

        fn rating() -> impl Strategy<Value = Rating> {
            prop::sample::select(Rating::ALL.to_vec())
        }

        proptest! {
            #[test]
            fn outputs_stay_in_range(s in stability(), d in difficulty(), r in rating()) {
                let out = calculate_next_review(s, d, r, fixed_now());
                prop_assert!(out.new_stability >= MIN_STABILITY);
                prop_assert!(out.new_difficulty >= MIN_DIFFICULTY);
                prop_assert!(out.new_difficulty <= MAX_DIFFICULTY);
            }

            #[test]
            fn again_raises_difficulty(s in stability(), d in difficulty()) {
                let out = calculate_next_review(s, d, Rating::Again, fixed_now());
                prop_assert!(out.new_difficulty >= d);
                if d < MAX_DIFFICULTY {
                    prop_assert!(out.new_difficulty > d);
                }
                let shortest = Rating::ALL.iter().map(|&r| interval_for(r)).fold(f64::MAX, f64::min);
                prop_assert_eq!(out.next_interval, shortest);
            }

            #[test]
            fn easy_lowers_difficulty(s in stability(), d in difficulty()) {
                let out = calculate_next_review(s, d, Rating::Easy, fixed_now());
                prop_assert!(out.new_difficulty <= d);
                if d > MIN_DIFFICULTY {
                    prop_assert!(out.new_difficulty < d);
                }
                let longest = Rating::ALL.iter().map(|&r| interval_for(r)).fold(0.0, f64::max);
                prop_assert_eq!(out.next_interval, longest);
            }

            #[test]
            fn stability_non_decreasing_in_rating(s in stability(), d in difficulty()) {
                let stabilities: Vec<f64> = Rating::ALL
                    .iter()
                    .map(|&r| calculate_next_review(s, d, r, fixed_now()).new_stability)
                    .collect();
                for pair in stabilities.windows(2) {
                    prop_assert!(pair[0] <= pair[1], "{:?}", stabilities);
                }
            }

            #[test]
            fn due_date_is_now_plus_interval(s in stability(), d in difficulty(), r in rating()) {
                let now = fixed_now();
                let out = calculate_next_review(s, d, r, now);
                prop_assert_eq!(out.next_review_date, now + interval_to_duration(out.next_interval));
            }
        }
    }
}
