use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One ledger entry per local calendar day with any study activity.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyRecord {
    pub reviews: u32,
    pub correct: u32,
    pub study_minutes: u32,
}

/// Rolling per-day review ledger. Day keys are the observing client's
/// local calendar day, so streaks can shift across timezone changes.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewHistory {
    pub days: BTreeMap<NaiveDate, DailyRecord>,
}

impl ReviewHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_review(&mut self, today: NaiveDate, correct: bool) {
        let day = self.days.entry(today).or_default();
        day.reviews += 1;
        if correct {
            day.correct += 1;
        }
    }

    pub fn add_study_time(&mut self, today: NaiveDate, minutes: u32) {
        self.days.entry(today).or_default().study_minutes += minutes;
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DailyRecord> {
        self.days.get(&date)
    }

    pub fn reviews_on(&self, date: NaiveDate) -> u32 {
        self.days.get(&date).map(|d| d.reviews).unwrap_or(0)
    }

    /// Consecutive active days ending today, or ending yesterday if today
    /// has no activity yet (an unbroken streak awaiting today's first
    /// review).
    pub fn current_streak(&self, today: NaiveDate) -> u32 {
        let mut day = if self.reviews_on(today) > 0 {
            today
        } else {
            today - Duration::days(1)
        };
        let mut streak = 0u32;
        while self.reviews_on(day) > 0 {
            streak += 1;
            day -= Duration::days(1);
        }
        streak
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreakState {
    pub current: u32,
    pub longest: u32,
    pub last_study_date: Option<NaiveDate>,
}

impl StreakState {
    /// Recomputes the current streak from the ledger after a review has
    /// been recorded for `today`. `longest` only ever grows.
    pub fn update_after_review(&mut self, history: &ReviewHistory, today: NaiveDate) {
        self.current = history.current_streak(today);
        self.longest = self.longest.max(self.current);
        self.last_study_date = Some(today);
    }
}
