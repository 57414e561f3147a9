use crate::api::{NewCard, NewPack, PackUpdate, RemoteApi};
use async_trait::async_trait;
use chrono::{Local, NaiveDate, Utc};
use parking_lot::RwLock;
use recall_core::{
    selection, stats, validate_pack_description, validate_pack_name, Card, CardId, CardStore,
    Pack, PackId, PackSummary, Quality, ReviewHistory, SourceType, StoreError, StreakState,
    StudyStats, UndoSlot,
};
use recall_local::{KeyValue, LedgerStore};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

struct Mirror {
    cards: Vec<Card>,
    packs: Vec<Pack>,
    history: ReviewHistory,
    streak: StreakState,
    undo: Option<UndoSlot>,
}

/// Remote-backed store. The server is authoritative for cards, packs,
/// and scheduling fields; this type keeps an in-memory mirror that is
/// only updated from confirmed server responses. The study ledger and
/// streak stay local-only by design: cards sync across devices, study
/// time and streaks do not.
pub struct RemoteStore {
    api: Arc<dyn RemoteApi>,
    session: String,
    state: RwLock<Mirror>,
    ledger: LedgerStore,
    generation: AtomicU64,
}

impl RemoteStore {
    /// Fetches the session's cards and packs and loads the local ledger.
    pub async fn connect(
        api: Arc<dyn RemoteApi>,
        session: impl Into<String>,
        kv: Arc<dyn KeyValue>,
    ) -> Result<Self, StoreError> {
        let session = session.into();
        let cards = api.list_cards(&session).await?;
        let packs = api.list_packs(&session).await?;
        let ledger = LedgerStore::new(kv);
        let (history, streak) = ledger.load();
        Ok(Self {
            api,
            session,
            state: RwLock::new(Mirror {
                cards,
                packs,
                history,
                streak,
                undo: None,
            }),
            ledger,
            generation: AtomicU64::new(0),
        })
    }

    /// Re-fetches cards and packs. A refresh superseded by a newer one
    /// discards its result instead of overwriting newer data; the
    /// network call itself is not aborted.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cards = self.api.list_cards(&self.session).await?;
        let packs = self.api.list_packs(&self.session).await?;

        let mut m = self.state.write();
        if self.generation.load(Ordering::SeqCst) != gen {
            log::debug!("discarding superseded refresh (generation {gen})");
            return Ok(());
        }
        m.cards = cards;
        m.packs = packs;
        m.undo = None;
        Ok(())
    }
}

#[async_trait]
impl CardStore for RemoteStore {
    async fn add_card(
        &self,
        source_type: SourceType,
        source_id: &str,
        extra_packs: &[PackId],
    ) -> Result<Option<Card>, StoreError> {
        let pack_ids = {
            let m = self.state.read();
            if selection::find_by_source(&m.cards, source_type, source_id).is_some() {
                return Ok(None);
            }
            for pack_id in extra_packs {
                if !m.packs.iter().any(|p| p.id == *pack_id) {
                    return Err(StoreError::NotFound("pack"));
                }
            }
            let mut ids: Vec<PackId> = m
                .packs
                .iter()
                .filter(|p| p.is_default)
                .map(|p| p.id)
                .collect();
            for pack_id in extra_packs {
                if !ids.contains(pack_id) {
                    ids.push(*pack_id);
                }
            }
            ids
        };

        let new = NewCard {
            source_type,
            source_id: source_id.to_string(),
            pack_ids,
        };
        let card = self.api.add_card(&self.session, &new).await?;

        let mut m = self.state.write();
        m.cards.push(card.clone());
        m.undo = None;
        Ok(Some(card))
    }

    async fn remove_card(&self, card_id: CardId) -> Result<(), StoreError> {
        if !self.state.read().cards.iter().any(|c| c.id == card_id) {
            return Err(StoreError::NotFound("card"));
        }
        self.api.remove_card(&self.session, card_id).await?;

        let mut m = self.state.write();
        m.cards.retain(|c| c.id != card_id);
        m.undo = None;
        Ok(())
    }

    async fn card_by_id(&self, card_id: CardId) -> Result<Option<Card>, StoreError> {
        Ok(self.state.read().cards.iter().find(|c| c.id == card_id).cloned())
    }

    async fn card_by_source(
        &self,
        source_type: SourceType,
        source_id: &str,
    ) -> Result<Option<Card>, StoreError> {
        let m = self.state.read();
        Ok(selection::find_by_source(&m.cards, source_type, source_id).cloned())
    }

    async fn is_card_saved(
        &self,
        source_type: SourceType,
        source_id: &str,
    ) -> Result<bool, StoreError> {
        let m = self.state.read();
        Ok(selection::find_by_source(&m.cards, source_type, source_id).is_some())
    }

    async fn list_cards(&self) -> Result<Vec<Card>, StoreError> {
        Ok(self.state.read().cards.clone())
    }

    async fn due_cards(&self, pack_id: Option<PackId>) -> Result<Vec<Card>, StoreError> {
        let m = self.state.read();
        Ok(selection::due_cards(&m.cards, pack_id, Utc::now()))
    }

    async fn cards_in_pack(&self, pack_id: PackId) -> Result<Vec<Card>, StoreError> {
        let m = self.state.read();
        Ok(selection::cards_in_pack(&m.cards, pack_id))
    }

    async fn list_packs(&self) -> Result<Vec<Pack>, StoreError> {
        Ok(self.state.read().packs.clone())
    }

    async fn pack_summaries(&self) -> Result<Vec<PackSummary>, StoreError> {
        let m = self.state.read();
        Ok(stats::pack_summaries(&m.packs, &m.cards, Utc::now()))
    }

    async fn record_review(&self, card_id: CardId, quality: Quality) -> Result<Card, StoreError> {
        if !self.state.read().cards.iter().any(|c| c.id == card_id) {
            return Err(StoreError::NotFound("card"));
        }
        let outcome = self.api.submit_review(&self.session, card_id, quality).await?;

        let now = Utc::now();
        let today = local_today();
        let mut guard = self.state.write();
        let m = &mut *guard;
        let idx = m
            .cards
            .iter()
            .position(|c| c.id == card_id)
            .ok_or(StoreError::NotFound("card"))?;

        m.undo = Some(UndoSlot {
            card: m.cards[idx].clone(),
            day_date: today,
            day_before: m.history.day(today).cloned(),
            streak_before: m.streak,
        });

        let card = &mut m.cards[idx];
        card.ease_factor = outcome.ease_factor;
        card.interval_days = outcome.interval_days;
        card.repetitions = outcome.repetitions;
        card.next_review_at = outcome.next_review_at;
        card.last_reviewed_at = Some(now);
        let updated = card.clone();

        m.history.record_review(today, quality.is_correct());
        m.streak.update_after_review(&m.history, today);
        self.ledger.save(&m.history, &m.streak);
        Ok(updated)
    }

    /// Reverts only the in-memory mirror and the local ledger; no
    /// rollback request is sent. After a successful undo the server
    /// still holds the post-review scheduling state for this card, and
    /// the two stay inconsistent until the next review or `refresh()`.
    async fn undo_last_review(&self, card_id: CardId) -> Result<bool, StoreError> {
        let mut guard = self.state.write();
        let m = &mut *guard;
        let slot = match m.undo.take() {
            Some(slot) if slot.card.id == card_id => slot,
            other => {
                m.undo = other;
                return Ok(false);
            }
        };

        if let Some(card) = m.cards.iter_mut().find(|c| c.id == card_id) {
            *card = slot.card;
        }
        match slot.day_before {
            Some(day) => {
                m.history.days.insert(slot.day_date, day);
            }
            None => {
                m.history.days.remove(&slot.day_date);
            }
        }
        m.streak = slot.streak_before;
        self.ledger.save(&m.history, &m.streak);
        Ok(true)
    }

    async fn add_study_time(&self, minutes: u32) -> Result<(), StoreError> {
        let mut m = self.state.write();
        m.history.add_study_time(local_today(), minutes);
        m.undo = None;
        self.ledger.save(&m.history, &m.streak);
        Ok(())
    }

    async fn create_pack(
        &self,
        name: &str,
        description: Option<&str>,
        color: &str,
    ) -> Result<Pack, StoreError> {
        if !validate_pack_name(name) {
            return Err(StoreError::Invalid("pack name must be 1-50 characters"));
        }
        if !validate_pack_description(description) {
            return Err(StoreError::Invalid("pack description must be at most 200 characters"));
        }
        if self
            .state
            .read()
            .packs
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(name))
        {
            return Err(StoreError::Conflict("pack name already exists"));
        }

        let new = NewPack {
            name: name.to_string(),
            description: description.map(str::to_string),
            color: color.to_string(),
        };
        let pack = self.api.create_pack(&self.session, &new).await?;

        let mut m = self.state.write();
        m.packs.push(pack.clone());
        m.undo = None;
        Ok(pack)
    }

    async fn rename_pack(&self, pack_id: PackId, name: &str) -> Result<(), StoreError> {
        {
            let m = self.state.read();
            let pack = m
                .packs
                .iter()
                .find(|p| p.id == pack_id)
                .ok_or(StoreError::NotFound("pack"))?;
            if pack.is_default {
                return Ok(());
            }
        }
        if !validate_pack_name(name) {
            return Err(StoreError::Invalid("pack name must be 1-50 characters"));
        }

        let update = PackUpdate {
            name: Some(name.to_string()),
            ..PackUpdate::default()
        };
        let confirmed = self.api.update_pack(&self.session, pack_id, &update).await?;

        let mut m = self.state.write();
        if let Some(pack) = m.packs.iter_mut().find(|p| p.id == pack_id) {
            *pack = confirmed;
        }
        m.undo = None;
        Ok(())
    }

    async fn delete_pack(&self, pack_id: PackId) -> Result<(), StoreError> {
        {
            let m = self.state.read();
            let pack = m
                .packs
                .iter()
                .find(|p| p.id == pack_id)
                .ok_or(StoreError::NotFound("pack"))?;
            if pack.is_default {
                return Ok(());
            }
        }
        self.api.delete_pack(&self.session, pack_id).await?;

        let mut m = self.state.write();
        for card in m.cards.iter_mut() {
            card.remove_from_pack(pack_id);
        }
        m.packs.retain(|p| p.id != pack_id);
        m.undo = None;
        Ok(())
    }

    async fn add_card_to_pack(&self, card_id: CardId, pack_id: PackId) -> Result<(), StoreError> {
        let desired = {
            let m = self.state.read();
            if !m.packs.iter().any(|p| p.id == pack_id) {
                return Err(StoreError::NotFound("pack"));
            }
            let card = m
                .cards
                .iter()
                .find(|c| c.id == card_id)
                .ok_or(StoreError::NotFound("card"))?;
            if card.in_pack(pack_id) {
                return Ok(());
            }
            let mut ids = card.pack_ids.clone();
            ids.push(pack_id);
            ids
        };

        let confirmed = self.api.set_card_packs(&self.session, card_id, &desired).await?;

        let mut m = self.state.write();
        if let Some(card) = m.cards.iter_mut().find(|c| c.id == card_id) {
            *card = confirmed;
        }
        m.undo = None;
        Ok(())
    }

    async fn remove_card_from_pack(
        &self,
        card_id: CardId,
        pack_id: PackId,
    ) -> Result<(), StoreError> {
        let desired = {
            let m = self.state.read();
            let pack = m
                .packs
                .iter()
                .find(|p| p.id == pack_id)
                .ok_or(StoreError::NotFound("pack"))?;
            if pack.is_default {
                return Ok(());
            }
            let card = m
                .cards
                .iter()
                .find(|c| c.id == card_id)
                .ok_or(StoreError::NotFound("card"))?;
            if !card.in_pack(pack_id) {
                return Ok(());
            }
            let mut ids = card.pack_ids.clone();
            ids.retain(|p| *p != pack_id);
            ids
        };

        let confirmed = self.api.set_card_packs(&self.session, card_id, &desired).await?;

        let mut m = self.state.write();
        if let Some(card) = m.cards.iter_mut().find(|c| c.id == card_id) {
            *card = confirmed;
        }
        m.undo = None;
        Ok(())
    }

    /// Pack order is display state and stays local: the mirror is
    /// reordered without any server call.
    async fn reorder_packs(&self, order: &[PackId]) -> Result<(), StoreError> {
        let mut m = self.state.write();
        recall_core::reorder_packs(&mut m.packs, order);
        m.undo = None;
        Ok(())
    }

    async fn stats(&self) -> Result<StudyStats, StoreError> {
        let m = self.state.read();
        Ok(stats::summarize(
            &m.cards,
            &m.history,
            &m.streak,
            Utc::now(),
            local_today(),
        ))
    }

    /// Best-effort: per-item deletion failures are logged and skipped so
    /// the reset always completes.
    async fn reset_all(&self) -> Result<(), StoreError> {
        let (card_ids, pack_ids): (Vec<CardId>, Vec<PackId>) = {
            let m = self.state.read();
            (
                m.cards.iter().map(|c| c.id).collect(),
                m.packs.iter().filter(|p| !p.is_default).map(|p| p.id).collect(),
            )
        };

        for card_id in card_ids {
            if let Err(err) = self.api.remove_card(&self.session, card_id).await {
                log::warn!("reset: failed to remove card {card_id}: {err}");
            }
        }
        for pack_id in pack_ids {
            if let Err(err) = self.api.delete_pack(&self.session, pack_id).await {
                log::warn!("reset: failed to delete pack {pack_id}: {err}");
            }
        }

        let mut m = self.state.write();
        m.cards.clear();
        m.packs.retain(|p| p.is_default);
        m.history = ReviewHistory::new();
        m.streak = StreakState::default();
        m.undo = None;
        self.ledger.save(&m.history, &m.streak);
        Ok(())
    }
}
