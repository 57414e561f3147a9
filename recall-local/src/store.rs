use crate::kv::{FileKv, KeyValue};
use crate::schema::{self, Snapshot};
use async_trait::async_trait;
use chrono::{Local, NaiveDate, Utc};
use parking_lot::RwLock;
use recall_core::{
    apply_review, default_packs, selection, stats, validate_pack_description, validate_pack_name,
    Card, CardId, CardStore, Pack, PackId, PackSummary, Quality, SourceType, StoreError,
    StudyStats, UndoSlot,
};
use std::sync::Arc;

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

struct State {
    cards: Vec<Card>,
    packs: Vec<Pack>,
    history: recall_core::ReviewHistory,
    streak: recall_core::StreakState,
    undo: Option<UndoSlot>,
}

impl State {
    fn from_snapshot(snap: Snapshot) -> Self {
        Self {
            cards: snap.cards,
            packs: snap.packs,
            history: snap.history,
            streak: snap.streak,
            undo: None,
        }
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            cards: self.cards.clone(),
            packs: self.packs.clone(),
            history: self.history.clone(),
            streak: self.streak.clone(),
        }
    }

    fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    fn card_mut(&mut self, id: CardId) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id == id)
    }

    fn pack(&self, id: PackId) -> Option<&Pack> {
        self.packs.iter().find(|p| p.id == id)
    }

    fn default_pack_ids(&self) -> Vec<PackId> {
        self.packs.iter().filter(|p| p.is_default).map(|p| p.id).collect()
    }

    /// Seeds any missing system pack ahead of the user's packs.
    /// Returns true if the collection changed.
    fn ensure_default_packs(&mut self) -> bool {
        let missing: Vec<Pack> = default_packs()
            .into_iter()
            .filter(|pack| {
                !self
                    .packs
                    .iter()
                    .any(|p| p.is_default && p.name == pack.name)
            })
            .collect();
        let changed = !missing.is_empty();
        for pack in missing.into_iter().rev() {
            self.packs.insert(0, pack);
        }
        changed
    }
}

/// Local-only persistent store. All state lives in memory behind one
/// lock and is written back to the key-value collaborator synchronously
/// after every mutation.
pub struct LocalStore {
    kv: Arc<dyn KeyValue>,
    state: RwLock<State>,
}

impl LocalStore {
    pub fn open(kv: Arc<dyn KeyValue>) -> Self {
        let snap = schema::load(kv.as_ref());
        let mut state = State::from_snapshot(snap);
        if state.ensure_default_packs() {
            schema::save_packs(kv.as_ref(), &state.packs);
        }
        Self {
            kv,
            state: RwLock::new(state),
        }
    }

    pub fn open_default() -> anyhow::Result<Self> {
        let kv = FileKv::open(crate::paths::default_store_file())?;
        Ok(Self::open(Arc::new(kv)))
    }
}

#[async_trait]
impl CardStore for LocalStore {
    async fn add_card(
        &self,
        source_type: SourceType,
        source_id: &str,
        extra_packs: &[PackId],
    ) -> Result<Option<Card>, StoreError> {
        let mut s = self.state.write();
        if selection::find_by_source(&s.cards, source_type, source_id).is_some() {
            return Ok(None);
        }
        for pack_id in extra_packs {
            if s.pack(*pack_id).is_none() {
                return Err(StoreError::NotFound("pack"));
            }
        }
        let mut card = Card::new(source_type, source_id);
        for pack_id in s.default_pack_ids() {
            card.add_to_pack(pack_id);
        }
        for pack_id in extra_packs {
            card.add_to_pack(*pack_id);
        }
        s.cards.push(card.clone());
        s.undo = None;
        schema::save_cards(self.kv.as_ref(), &s.cards);
        Ok(Some(card))
    }

    async fn remove_card(&self, card_id: CardId) -> Result<(), StoreError> {
        let mut s = self.state.write();
        let before = s.cards.len();
        s.cards.retain(|c| c.id != card_id);
        if s.cards.len() == before {
            return Err(StoreError::NotFound("card"));
        }
        s.undo = None;
        schema::save_cards(self.kv.as_ref(), &s.cards);
        Ok(())
    }

    async fn card_by_id(&self, card_id: CardId) -> Result<Option<Card>, StoreError> {
        Ok(self.state.read().card(card_id).cloned())
    }

    async fn card_by_source(
        &self,
        source_type: SourceType,
        source_id: &str,
    ) -> Result<Option<Card>, StoreError> {
        let s = self.state.read();
        Ok(selection::find_by_source(&s.cards, source_type, source_id).cloned())
    }

    async fn is_card_saved(
        &self,
        source_type: SourceType,
        source_id: &str,
    ) -> Result<bool, StoreError> {
        let s = self.state.read();
        Ok(selection::find_by_source(&s.cards, source_type, source_id).is_some())
    }

    async fn list_cards(&self) -> Result<Vec<Card>, StoreError> {
        Ok(self.state.read().cards.clone())
    }

    async fn due_cards(&self, pack_id: Option<PackId>) -> Result<Vec<Card>, StoreError> {
        let s = self.state.read();
        Ok(selection::due_cards(&s.cards, pack_id, Utc::now()))
    }

    async fn cards_in_pack(&self, pack_id: PackId) -> Result<Vec<Card>, StoreError> {
        let s = self.state.read();
        Ok(selection::cards_in_pack(&s.cards, pack_id))
    }

    async fn list_packs(&self) -> Result<Vec<Pack>, StoreError> {
        Ok(self.state.read().packs.clone())
    }

    async fn pack_summaries(&self) -> Result<Vec<PackSummary>, StoreError> {
        let s = self.state.read();
        Ok(stats::pack_summaries(&s.packs, &s.cards, Utc::now()))
    }

    async fn record_review(&self, card_id: CardId, quality: Quality) -> Result<Card, StoreError> {
        let now = Utc::now();
        let today = local_today();
        let mut guard = self.state.write();
        let s = &mut *guard;

        let idx = s
            .cards
            .iter()
            .position(|c| c.id == card_id)
            .ok_or(StoreError::NotFound("card"))?;
        let before = s.cards[idx].clone();
        s.undo = Some(UndoSlot {
            card: before.clone(),
            day_date: today,
            day_before: s.history.day(today).cloned(),
            streak_before: s.streak,
        });

        let updated = apply_review(before, quality, now);
        s.cards[idx] = updated.clone();
        s.history.record_review(today, quality.is_correct());
        s.streak.update_after_review(&s.history, today);

        schema::save_cards(self.kv.as_ref(), &s.cards);
        schema::save_ledger(self.kv.as_ref(), &s.history);
        schema::save_stats(self.kv.as_ref(), &s.streak);
        Ok(updated)
    }

    async fn undo_last_review(&self, card_id: CardId) -> Result<bool, StoreError> {
        let mut s = self.state.write();
        let slot = match s.undo.take() {
            Some(slot) if slot.card.id == card_id => slot,
            other => {
                s.undo = other;
                return Ok(false);
            }
        };

        if let Some(card) = s.card_mut(card_id) {
            *card = slot.card;
        }
        match slot.day_before {
            Some(day) => {
                s.history.days.insert(slot.day_date, day);
            }
            None => {
                s.history.days.remove(&slot.day_date);
            }
        }
        s.streak = slot.streak_before;

        schema::save_cards(self.kv.as_ref(), &s.cards);
        schema::save_ledger(self.kv.as_ref(), &s.history);
        schema::save_stats(self.kv.as_ref(), &s.streak);
        Ok(true)
    }

    async fn add_study_time(&self, minutes: u32) -> Result<(), StoreError> {
        let mut s = self.state.write();
        s.history.add_study_time(local_today(), minutes);
        s.undo = None;
        schema::save_ledger(self.kv.as_ref(), &s.history);
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
        let mut s = self.state.write();
        if s.packs.iter().any(|p| p.name.eq_ignore_ascii_case(name)) {
            return Err(StoreError::Conflict("pack name already exists"));
        }
        let pack = Pack::new(name, description.map(str::to_string), color);
        s.packs.push(pack.clone());
        s.undo = None;
        schema::save_packs(self.kv.as_ref(), &s.packs);
        Ok(pack)
    }

    async fn rename_pack(&self, pack_id: PackId, name: &str) -> Result<(), StoreError> {
        let mut s = self.state.write();
        let pack = s
            .packs
            .iter_mut()
            .find(|p| p.id == pack_id)
            .ok_or(StoreError::NotFound("pack"))?;
        if pack.is_default {
            return Ok(());
        }
        if !validate_pack_name(name) {
            return Err(StoreError::Invalid("pack name must be 1-50 characters"));
        }
        pack.name = name.to_string();
        s.undo = None;
        schema::save_packs(self.kv.as_ref(), &s.packs);
        Ok(())
    }

    async fn delete_pack(&self, pack_id: PackId) -> Result<(), StoreError> {
        let mut s = self.state.write();
        let is_default = s
            .pack(pack_id)
            .map(|p| p.is_default)
            .ok_or(StoreError::NotFound("pack"))?;
        if is_default {
            return Ok(());
        }
        for card in s.cards.iter_mut() {
            card.remove_from_pack(pack_id);
        }
        s.packs.retain(|p| p.id != pack_id);
        s.undo = None;
        schema::save_packs(self.kv.as_ref(), &s.packs);
        schema::save_cards(self.kv.as_ref(), &s.cards);
        Ok(())
    }

    async fn add_card_to_pack(&self, card_id: CardId, pack_id: PackId) -> Result<(), StoreError> {
        let mut s = self.state.write();
        if s.pack(pack_id).is_none() {
            return Err(StoreError::NotFound("pack"));
        }
        let card = s.card_mut(card_id).ok_or(StoreError::NotFound("card"))?;
        card.add_to_pack(pack_id);
        s.undo = None;
        schema::save_cards(self.kv.as_ref(), &s.cards);
        Ok(())
    }

    async fn remove_card_from_pack(
        &self,
        card_id: CardId,
        pack_id: PackId,
    ) -> Result<(), StoreError> {
        let mut s = self.state.write();
        let pack = s.pack(pack_id).ok_or(StoreError::NotFound("pack"))?;
        if pack.is_default {
            return Ok(());
        }
        let card = s.card_mut(card_id).ok_or(StoreError::NotFound("card"))?;
        card.remove_from_pack(pack_id);
        s.undo = None;
        schema::save_cards(self.kv.as_ref(), &s.cards);
        Ok(())
    }

    async fn reorder_packs(&self, order: &[PackId]) -> Result<(), StoreError> {
        let mut s = self.state.write();
        recall_core::reorder_packs(&mut s.packs, order);
        s.undo = None;
        schema::save_packs(self.kv.as_ref(), &s.packs);
        Ok(())
    }

    async fn stats(&self) -> Result<StudyStats, StoreError> {
        let s = self.state.read();
        Ok(stats::summarize(
            &s.cards,
            &s.history,
            &s.streak,
            Utc::now(),
            local_today(),
        ))
    }

    async fn reset_all(&self) -> Result<(), StoreError> {
        let mut s = self.state.write();
        *s = State::from_snapshot(Snapshot::default());
        s.ensure_default_packs();
        schema::save_all(self.kv.as_ref(), &s.to_snapshot());
        Ok(())
    }
}
