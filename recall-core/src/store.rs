use crate::{
    Card, CardId, DailyRecord, Pack, PackId, PackSummary, Quality, SourceType, StoreError,
    StreakState, StudyStats,
};
use async_trait::async_trait;
use chrono::NaiveDate;

/// The operation contract both storage backends implement.
///
/// One session owns one store instance; operations on it are serialized
/// by the backend's interior lock. Duplicate card creation is signaled by
/// `Ok(None)`, and rename/delete attempts on default packs are silent
/// no-ops rather than errors.
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Creates a card for a content source, placing it in the default
    /// packs plus `extra_packs`. Returns `None` if a card for this
    /// `(source_type, source_id)` pair already exists.
    async fn add_card(
        &self,
        source_type: SourceType,
        source_id: &str,
        extra_packs: &[PackId],
    ) -> Result<Option<Card>, StoreError>;

    /// Removes a card and its membership in every pack.
    async fn remove_card(&self, card_id: CardId) -> Result<(), StoreError>;

    async fn card_by_id(&self, card_id: CardId) -> Result<Option<Card>, StoreError>;

    async fn card_by_source(
        &self,
        source_type: SourceType,
        source_id: &str,
    ) -> Result<Option<Card>, StoreError>;

    async fn is_card_saved(
        &self,
        source_type: SourceType,
        source_id: &str,
    ) -> Result<bool, StoreError>;

    async fn list_cards(&self) -> Result<Vec<Card>, StoreError>;

    /// Due cards, optionally restricted to one pack. Insertion order.
    async fn due_cards(&self, pack_id: Option<PackId>) -> Result<Vec<Card>, StoreError>;

    async fn cards_in_pack(&self, pack_id: PackId) -> Result<Vec<Card>, StoreError>;

    async fn list_packs(&self) -> Result<Vec<Pack>, StoreError>;

    async fn pack_summaries(&self) -> Result<Vec<PackSummary>, StoreError>;

    /// Grades a card, reschedules it, updates the daily ledger and
    /// streak, and arms the single-slot undo. Returns the updated card.
    async fn record_review(&self, card_id: CardId, quality: Quality) -> Result<Card, StoreError>;

    /// Reverts the most recent review iff it targeted `card_id` and no
    /// other mutating operation has run since. Returns whether anything
    /// was reverted.
    async fn undo_last_review(&self, card_id: CardId) -> Result<bool, StoreError>;

    /// Adds study minutes to today's ledger entry, creating it if absent.
    async fn add_study_time(&self, minutes: u32) -> Result<(), StoreError>;

    async fn create_pack(
        &self,
        name: &str,
        description: Option<&str>,
        color: &str,
    ) -> Result<Pack, StoreError>;

    /// No-op when the pack is a default pack.
    async fn rename_pack(&self, pack_id: PackId, name: &str) -> Result<(), StoreError>;

    /// Strips the pack from every card, then deletes it. No-op on
    /// default packs; member cards are never deleted.
    async fn delete_pack(&self, pack_id: PackId) -> Result<(), StoreError>;

    async fn add_card_to_pack(&self, card_id: CardId, pack_id: PackId) -> Result<(), StoreError>;

    /// No-op when the pack is a default pack.
    async fn remove_card_from_pack(
        &self,
        card_id: CardId,
        pack_id: PackId,
    ) -> Result<(), StoreError>;

    /// Reorders the pack listing to match `order`. Unknown ids are
    /// ignored; packs missing from `order` keep their relative position
    /// at the end. Display-only state: the remote backend does not
    /// persist it to the server.
    async fn reorder_packs(&self, order: &[PackId]) -> Result<(), StoreError>;

    async fn stats(&self) -> Result<StudyStats, StoreError>;

    /// Clears all cards and non-default packs and reinitializes the
    /// defaults and study ledger.
    async fn reset_all(&self) -> Result<(), StoreError>;
}

/// Snapshot held by the single-slot undo: the pre-review card plus the
/// ledger day and streak state it displaced. Any mutating operation
/// other than `record_review` disarms the slot.
#[derive(Clone, Debug)]
pub struct UndoSlot {
    pub card: Card,
    pub day_date: NaiveDate,
    pub day_before: Option<DailyRecord>,
    pub streak_before: StreakState,
}
