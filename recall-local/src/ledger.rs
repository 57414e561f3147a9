use crate::kv::KeyValue;
use crate::schema::{save_ledger, save_stats, KEY_LEDGER, KEY_STATS};
use recall_core::{ReviewHistory, StreakState};
use std::sync::Arc;

/// Persistence for the study-time/streak ledger.
///
/// Both backends keep this data local-only: cards and packs may sync
/// through a remote API, but the per-day ledger and streak never leave
/// the client. The remote store reuses this type for exactly that
/// reason.
pub struct LedgerStore {
    kv: Arc<dyn KeyValue>,
}

impl LedgerStore {
    pub fn new(kv: Arc<dyn KeyValue>) -> Self {
        Self { kv }
    }

    pub fn load(&self) -> (ReviewHistory, StreakState) {
        let history = self
            .kv
            .get(KEY_LEDGER)
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        let mut streak: StreakState = self
            .kv
            .get(KEY_STATS)
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        streak.longest = streak.longest.max(streak.current);
        (history, streak)
    }

    pub fn save(&self, history: &ReviewHistory, streak: &StreakState) {
        save_ledger(self.kv.as_ref(), history);
        save_stats(self.kv.as_ref(), streak);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;
    use chrono::NaiveDate;

    #[test]
    fn ledger_roundtrips() {
        let kv: Arc<dyn KeyValue> = Arc::new(MemoryKv::new());
        let ledger = LedgerStore::new(kv.clone());

        let today: NaiveDate = "2026-08-07".parse().unwrap();
        let mut history = ReviewHistory::new();
        history.record_review(today, true);
        let mut streak = StreakState::default();
        streak.update_after_review(&history, today);
        ledger.save(&history, &streak);

        let (h2, s2) = LedgerStore::new(kv).load();
        assert_eq!(h2, history);
        assert_eq!(s2, streak);
    }

    #[test]
    fn missing_keys_load_as_empty() {
        let ledger = LedgerStore::new(Arc::new(MemoryKv::new()));
        let (history, streak) = ledger.load();
        assert!(history.days.is_empty());
        assert_eq!(streak, StreakState::default());
    }
}
