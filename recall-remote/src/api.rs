use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recall_core::{Card, CardId, Pack, PackId, Quality, SourceType, StoreError};
use serde::{Deserialize, Serialize};

/// Scheduling fields the server confirms after a review submission.
/// The server is authoritative for these; the mirror applies them as-is.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub ease_factor: f32,
    pub interval_days: u32,
    pub repetitions: u32,
    pub next_review_at: Option<DateTime<Utc>>,
    pub is_mastered: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewCard {
    pub source_type: SourceType,
    pub source_id: String,
    pub pack_ids: Vec<PackId>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewPack {
    pub name: String,
    pub description: Option<String>,
    pub color: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PackUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// The consumed backend API, keyed by an opaque session id supplied by
/// the session-management layer. This crate only calls these endpoints;
/// it never implements them.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn list_cards(&self, session: &str) -> Result<Vec<Card>, StoreError>;

    async fn list_packs(&self, session: &str) -> Result<Vec<Pack>, StoreError>;

    async fn add_card(&self, session: &str, new: &NewCard) -> Result<Card, StoreError>;

    async fn remove_card(&self, session: &str, card_id: CardId) -> Result<(), StoreError>;

    async fn submit_review(
        &self,
        session: &str,
        card_id: CardId,
        quality: Quality,
    ) -> Result<ReviewOutcome, StoreError>;

    async fn create_pack(&self, session: &str, new: &NewPack) -> Result<Pack, StoreError>;

    async fn update_pack(
        &self,
        session: &str,
        pack_id: PackId,
        update: &PackUpdate,
    ) -> Result<Pack, StoreError>;

    async fn delete_pack(&self, session: &str, pack_id: PackId) -> Result<(), StoreError>;

    /// Replaces a card's pack membership list, returning the confirmed card.
    async fn set_card_packs(
        &self,
        session: &str,
        card_id: CardId,
        pack_ids: &[PackId],
    ) -> Result<Card, StoreError>;
}
