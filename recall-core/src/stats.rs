use crate::{Card, Pack, PackId, ReviewHistory, StreakState};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Derived study snapshot. Always recomputed from the card collection,
/// ledger, and streak state; never stored as a source of truth.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudyStats {
    pub total_cards: u32,
    pub due_now: u32,
    pub reviewed_today: u32,
    pub mastered: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_study_date: Option<NaiveDate>,
}

pub fn summarize(
    cards: &[Card],
    history: &ReviewHistory,
    streak: &StreakState,
    now: DateTime<Utc>,
    today: NaiveDate,
) -> StudyStats {
    StudyStats {
        total_cards: cards.len() as u32,
        due_now: cards.iter().filter(|c| c.is_due(now)).count() as u32,
        reviewed_today: history.reviews_on(today),
        mastered: cards.iter().filter(|c| c.is_mastered()).count() as u32,
        current_streak: streak.current,
        longest_streak: streak.longest,
        last_study_date: streak.last_study_date,
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackSummary {
    pub pack_id: PackId,
    pub name: String,
    pub card_count: u32,
    pub due_count: u32,
}

pub fn pack_summaries(packs: &[Pack], cards: &[Card], now: DateTime<Utc>) -> Vec<PackSummary> {
    packs
        .iter()
        .map(|p| {
            let members: Vec<&Card> = cards.iter().filter(|c| c.in_pack(p.id)).collect();
            PackSummary {
                pack_id: p.id,
                name: p.name.clone(),
                card_count: members.len() as u32,
                due_count: members.iter().filter(|c| c.is_due(now)).count() as u32,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Card, SourceType};
    use chrono::Duration;

    #[test]
    fn summary_counts_due_and_mastered() {
        let now = Utc::now();
        let today = now.date_naive();

        let due = Card::new(SourceType::Milestone, "m-2012-alexnet");
        let mut future = Card::new(SourceType::Concept, "c-convnet");
        future.next_review_at = Some(now + Duration::days(9));
        let mut mastered = Card::new(SourceType::Concept, "c-gradient-descent");
        mastered.interval_days = 30;
        mastered.next_review_at = Some(now + Duration::days(30));

        let mut history = ReviewHistory::new();
        history.record_review(today, true);
        let mut streak = StreakState::default();
        streak.update_after_review(&history, today);

        let stats = summarize(&[due, future, mastered], &history, &streak, now, today);
        assert_eq!(stats.total_cards, 3);
        assert_eq!(stats.due_now, 1);
        assert_eq!(stats.mastered, 1);
        assert_eq!(stats.reviewed_today, 1);
        assert_eq!(stats.current_streak, 1);
        assert!(stats.longest_streak >= stats.current_streak);
        assert_eq!(stats.last_study_date, Some(today));
    }

    #[test]
    fn pack_summaries_count_members() {
        let now = Utc::now();
        let pack = Pack::new("Deep Learning", None, "#ef4444");
        let mut a = Card::new(SourceType::Concept, "c-dropout");
        a.add_to_pack(pack.id);
        let mut b = Card::new(SourceType::Concept, "c-batchnorm");
        b.add_to_pack(pack.id);
        b.next_review_at = Some(now + Duration::days(2));

        let sums = pack_summaries(&[pack.clone()], &[a, b], now);
        assert_eq!(sums.len(), 1);
        assert_eq!(sums[0].card_count, 2);
        assert_eq!(sums[0].due_count, 1);
        assert_eq!(sums[0].name, "Deep Learning");
    }
}
