//! SM-2 spaced repetition algorithm.
//!
//! Classic SuperMemo 2 bootstrap: fixed first and second intervals, then
//! compounding by the ease factor.

use super::SchedulingAlgorithm;
use crate::types::{Rating, ReviewState};

/// SM-2 with configurable parameters.
#[derive(Debug, Clone)]
pub struct Sm2 {
    pub initial_ease: f64,
    pub minimum_ease: f64,
    pub first_interval: u32,
    pub second_interval: u32,
}

impl Default for Sm2 {
    fn default() -> Self {
        Self {
            initial_ease: 2.5,
            minimum_ease: 1.3,
            first_interval: 1,
            second_interval: 6,
        }
    }
}

impl SchedulingAlgorithm for Sm2 {
    fn name(&self) -> &'static str {
        "sm2"
    }

    fn initial_state(&self) -> ReviewState {
        ReviewState {
            ease_factor: self.initial_ease,
            interval_days: 0,
            repetitions: 0,
        }
    }

    fn next_state(&self, state: &ReviewState, rating: Rating) -> ReviewState {
        let quality = rating.quality();

        if quality < 3 {
            // Failure: streak and interval collapse, ease is preserved.
            return ReviewState {
                ease_factor: state.ease_factor,
                interval_days: self.first_interval,
                repetitions: 0,
            };
        }

        let spread = f64::from(5 - quality);
        let ease = state.ease_factor + (0.1 - spread * (0.08 + spread * 0.02));
        let ease = round_ease(ease.max(self.minimum_ease));

        // Interval growth keys off the streak before this review.
        let interval = match state.repetitions {
            0 => self.first_interval,
            1 => self.second_interval,
            _ => (f64::from(state.interval_days) * ease).round() as u32,
        };

        ReviewState {
            ease_factor: ease,
            interval_days: interval,
            repetitions: state.repetitions + 1,
        }
    }
}

/// Ease factors are stored rounded to 2 decimal places.
fn round_ease(ease: f64) -> f64 {
    (ease * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn state(ease_factor: f64, interval_days: u32, repetitions: u32) -> ReviewState {
        ReviewState {
            ease_factor,
            interval_days,
            repetitions,
        }
    }

    #[test]
    fn failure_resets_streak_and_interval_but_not_ease() {
        let sm2 = Sm2::default();
        let result = sm2.next_state(&state(2.21, 42, 7), Rating::Again);
        assert_eq!(result, state(2.21, 1, 0));
    }

    #[test]
    fn bootstrap_intervals_are_one_then_six() {
        let sm2 = Sm2::default();
        let first = sm2.next_state(&sm2.initial_state(), Rating::Good);
        assert_eq!(first.interval_days, 1);
        assert_eq!(first.repetitions, 1);

        let second = sm2.next_state(&first, Rating::Good);
        assert_eq!(second.interval_days, 6);
        assert_eq!(second.repetitions, 2);
    }

    #[test]
    fn third_good_review_multiplies_by_ease() {
        let sm2 = Sm2::default();
        let mut current = sm2.initial_state();
        for _ in 0..3 {
            current = sm2.next_state(&current, Rating::Good);
        }
        // Quality 4 leaves ease at 2.5, so 6 * 2.5 = 15.
        assert_eq!(current, state(2.5, 15, 3));
    }

    #[test]
    fn good_keeps_ease_unchanged() {
        let sm2 = Sm2::default();
        let result = sm2.next_state(&state(2.5, 0, 0), Rating::Good);
        assert_eq!(result.ease_factor, 2.5);
    }

    #[test]
    fn hard_lowers_ease_by_fourteen_hundredths() {
        let sm2 = Sm2::default();
        let result = sm2.next_state(&state(2.5, 0, 0), Rating::Hard);
        assert_eq!(result.ease_factor, 2.36);
    }

    #[test]
    fn easy_raises_ease_by_a_tenth() {
        let sm2 = Sm2::default();
        let result = sm2.next_state(&state(2.5, 0, 0), Rating::Easy);
        assert_eq!(result.ease_factor, 2.6);
    }

    #[test]
    fn ease_never_drops_below_minimum() {
        let sm2 = Sm2::default();
        let mut current = state(1.31, 10, 5);
        for _ in 0..10 {
            current = sm2.next_state(&current, Rating::Hard);
            assert!(current.ease_factor >= sm2.minimum_ease);
        }
        assert_eq!(current.ease_factor, 1.3);
    }

    #[test]
    fn fail_then_recover_walk() {
        let sm2 = Sm2::default();
        let mut current = sm2.initial_state();

        current = sm2.next_state(&current, Rating::Good);
        assert_eq!((current.repetitions, current.interval_days), (1, 1));

        current = sm2.next_state(&current, Rating::Again);
        assert_eq!((current.repetitions, current.interval_days), (0, 1));

        current = sm2.next_state(&current, Rating::Good);
        assert_eq!((current.repetitions, current.interval_days), (1, 1));
    }

    #[test]
    fn preview_again_is_always_the_failure_interval() {
        let sm2 = Sm2::default();
        let preview = sm2.preview(&state(2.8, 30, 9));
        assert_eq!(preview.again, 1);
        assert_eq!(preview.easy, (30.0 * 2.9_f64).round() as u32);
    }
}
