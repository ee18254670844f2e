//! Leitner-box review scheduler.
//!
//! The scheduler is a pure state machine over a card's `(box, interval)`
//! pair. States are the box levels 1..=5; transitions are driven only by
//! the four recall grades:
//!
//! ```text
//! again -> box 1, interval 1
//! hard  -> max(1, box - 1), max(1, floor(interval * 0.5))
//! good  -> min(5, box + 1), interval * 2
//! easy  -> min(5, box + 1), interval * 2.5
//! ```
//!
//! There is no terminal state; a card cycles indefinitely as it is
//! reviewed. The table is deliberately literal -- this is not SM-2.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Weakest box level.
pub const MIN_BOX: i32 = 1;
/// Strongest box level.
pub const MAX_BOX: i32 = 5;

/// User-supplied recall quality signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    /// Recall failed: restart the schedule.
    Again,
    /// Partial recall: step back one level, shrink the interval.
    Hard,
    /// Normal recall: advance one level, double the interval.
    Good,
    /// Confident recall: advance one level, grow the interval faster.
    Easy,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Again => "again",
            Grade::Hard => "hard",
            Grade::Good => "good",
            Grade::Easy => "easy",
        }
    }
}

impl FromStr for Grade {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "again" => Ok(Grade::Again),
            "hard" => Ok(Grade::Hard),
            "good" => Ok(Grade::Good),
            "easy" => Ok(Grade::Easy),
            other => Err(ValidationError::InvalidGrade(other.to_string())),
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of applying a grade to a card's repetition state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    #[serde(rename = "box")]
    pub box_level: i32,
    pub interval_days: f64,
    pub next_due: DateTime<Utc>,
}

/// Compute the next `(box, interval)` pair for a grade.
///
/// Box is clamped to [`MIN_BOX`, `MAX_BOX`] in every branch; the interval
/// never drops below one day.
pub fn next_state(box_level: i32, interval_days: f64, grade: Grade) -> (i32, f64) {
    let (new_box, new_interval) = match grade {
        Grade::Again => (MIN_BOX, 1.0),
        Grade::Hard => (box_level - 1, (interval_days * 0.5).floor().max(1.0)),
        Grade::Good => (box_level + 1, interval_days * 2.0),
        Grade::Easy => (box_level + 1, interval_days * 2.5),
    };
    (new_box.clamp(MIN_BOX, MAX_BOX), new_interval)
}

/// Apply a grade and compute the full outcome, with `next_due` scheduled
/// `interval` whole days after `now`.
pub fn schedule(
    box_level: i32,
    interval_days: f64,
    grade: Grade,
    now: DateTime<Utc>,
) -> ReviewOutcome {
    let (new_box, new_interval) = next_state(box_level, interval_days, grade);
    ReviewOutcome {
        box_level: new_box,
        interval_days: new_interval,
        next_due: now + Duration::days(new_interval.round() as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn good_advances_and_doubles() {
        let (b, i) = next_state(2, 4.0, Grade::Good);
        assert_eq!(b, 3);
        assert_eq!(i, 8.0);
    }

    #[test]
    fn again_resets_regardless_of_state() {
        let (b, i) = next_state(5, 64.0, Grade::Again);
        assert_eq!(b, 1);
        assert_eq!(i, 1.0);
    }

    #[test]
    fn hard_clamps_at_bottom() {
        let (b, i) = next_state(1, 3.0, Grade::Hard);
        assert_eq!(b, 1);
        assert_eq!(i, 1.0); // floor(3 * 0.5) = 1
    }

    #[test]
    fn easy_caps_at_top_box() {
        let (b, i) = next_state(5, 10.0, Grade::Easy);
        assert_eq!(b, 5);
        assert_eq!(i, 25.0);
    }

    #[test]
    fn schedule_sets_due_in_whole_days() {
        let now = Utc::now();
        let outcome = schedule(2, 4.0, Grade::Good, now);
        assert_eq!(outcome.box_level, 3);
        assert_eq!(outcome.interval_days, 8.0);
        assert_eq!(outcome.next_due, now + Duration::days(8));
    }

    #[test]
    fn grade_parses_exact_strings_only() {
        assert_eq!("good".parse::<Grade>().unwrap(), Grade::Good);
        assert!("Good".parse::<Grade>().is_err());
        assert!("ok".parse::<Grade>().is_err());
        assert!("".parse::<Grade>().is_err());
    }

    #[test]
    fn repeat_reviews_diverge() {
        // Grading the same card twice with the same grade must compound,
        // not repeat: the scheduler is intentionally not idempotent.
        let first = next_state(2, 4.0, Grade::Good);
        let second = next_state(first.0, first.1, Grade::Good);
        assert_ne!(first, second);
        assert!(second.1 > first.1);
    }

    proptest! {
        #[test]
        fn box_always_within_range(
            b in MIN_BOX..=MAX_BOX,
            interval in 1.0f64..4096.0,
            g in 0usize..4,
        ) {
            let (new_box, new_interval) = next_state(b, interval, Grade::ALL[g]);
            prop_assert!((MIN_BOX..=MAX_BOX).contains(&new_box));
            prop_assert!(new_interval >= 1.0);
        }

        #[test]
        fn never_due_in_the_past(
            b in MIN_BOX..=MAX_BOX,
            interval in 1.0f64..4096.0,
            g in 0usize..4,
        ) {
            let now = Utc::now();
            let outcome = schedule(b, interval, Grade::ALL[g], now);
            prop_assert!(outcome.next_due >= now);
        }

        #[test]
        fn invariants_hold_over_any_sequence(
            grades in proptest::collection::vec(0usize..4, 1..64),
        ) {
            let mut b = MIN_BOX;
            let mut interval = 1.0f64;
            for g in grades {
                let (nb, ni) = next_state(b, interval, Grade::ALL[g]);
                match Grade::ALL[g] {
                    Grade::Again => {
                        prop_assert_eq!(nb, MIN_BOX);
                        prop_assert_eq!(ni, 1.0);
                    }
                    Grade::Hard => prop_assert!(nb <= b),
                    Grade::Good | Grade::Easy => prop_assert!(nb >= b),
                }
                prop_assert!((MIN_BOX..=MAX_BOX).contains(&nb));
                prop_assert!(ni >= 1.0);
                b = nb;
                interval = ni;
            }
        }
    }
}
