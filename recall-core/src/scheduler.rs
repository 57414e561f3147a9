use crate::{Card, StoreError, EF_MAX, EF_MIN};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Self-rated recall quality, 0 (blackout) through 5 (perfect).
///
/// Range validation happens here, once, at construction. Everything past
/// this type can assume a valid rating.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const PASS_THRESHOLD: u8 = 3;

    pub fn new(value: u8) -> Result<Self, StoreError> {
        if value > 5 {
            return Err(StoreError::Invalid("quality must be between 0 and 5"));
        }
        Ok(Quality(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Quality >= 3 counts as a successful recall.
    pub fn is_correct(self) -> bool {
        self.0 >= Self::PASS_THRESHOLD
    }
}

impl TryFrom<u8> for Quality {
    type Error = StoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Quality::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(q: Quality) -> u8 {
        q.0
    }
}

/// The scheduling fields SM-2 operates on, detached from the card.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Schedule {
    pub ease_factor: f32,
    pub interval_days: u32,
    pub repetitions: u32,
}

fn clamp_ef(x: f32) -> f32 {
    x.clamp(EF_MIN, EF_MAX)
}

/// SM-2 transition. Pure and deterministic.
///
/// A failed recall (quality < 3) resets repetitions and makes the card due
/// again immediately; the ease factor still moves by the usual formula.
pub fn compute_next_review(
    quality: Quality,
    prev_ease_factor: f32,
    prev_interval_days: u32,
    prev_repetitions: u32,
) -> Schedule {
    let miss = (5 - quality.value()) as f32;
    let ease_factor = clamp_ef(prev_ease_factor + (0.1 - miss * (0.08 + miss * 0.02)));

    if !quality.is_correct() {
        return Schedule {
            ease_factor,
            interval_days: 0,
            repetitions: 0,
        };
    }

    let repetitions = prev_repetitions + 1;
    let interval_days = match repetitions {
        1 => 1,
        2 => 6,
        _ => (prev_interval_days as f32 * ease_factor).round() as u32,
    };

    Schedule {
        ease_factor,
        interval_days,
        repetitions,
    }
}

/// Applies a review outcome to a card and stamps its review timestamps.
pub fn apply_review(mut card: Card, quality: Quality, now: DateTime<Utc>) -> Card {
    let next = compute_next_review(
        quality,
        card.ease_factor,
        card.interval_days,
        card.repetitions,
    );
    card.ease_factor = next.ease_factor;
    card.interval_days = next.interval_days;
    card.repetitions = next.repetitions;
    card.next_review_at = Some(now + Duration::days(next.interval_days as i64));
    card.last_reviewed_at = Some(now);
    card
}
