use recall_core::{CardStore, Quality, SourceType, DEFAULT_PACK_ALL, DEFAULT_PACK_RECENT};
use recall_local::{KeyValue, LocalStore, MemoryKv};
use std::sync::Arc;

fn q(v: u8) -> Quality {
    Quality::new(v).unwrap()
}

fn open_store() -> LocalStore {
    LocalStore::open(Arc::new(MemoryKv::new()))
}

#[tokio::test]
async fn fresh_store_has_default_packs_only() {
    let store = open_store();
    let packs = store.list_packs().await.unwrap();
    assert_eq!(packs.len(), 2);
    assert!(packs.iter().all(|p| p.is_default));
    assert!(store.list_cards().await.unwrap().is_empty());
}

#[tokio::test]
async fn added_cards_join_default_packs_and_dedupe() {
    let store = open_store();
    let card = store
        .add_card(SourceType::Milestone, "m-1969-shakey", &[])
        .await
        .unwrap()
        .expect("first add creates");
    assert_eq!(card.pack_ids.len(), 2);

    let dup = store
        .add_card(SourceType::Milestone, "m-1969-shakey", &[])
        .await
        .unwrap();
    assert!(dup.is_none());
    assert_eq!(store.list_cards().await.unwrap().len(), 1);
    assert!(store
        .is_card_saved(SourceType::Milestone, "m-1969-shakey")
        .await
        .unwrap());
    // Same source id under the other source type is a different card.
    assert!(!store
        .is_card_saved(SourceType::Concept, "m-1969-shakey")
        .await
        .unwrap());
}

#[tokio::test]
async fn review_updates_schedule_stats_and_due_selection() {
    let store = open_store();
    let card = store
        .add_card(SourceType::Concept, "c-perceptron", &[])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(store.due_cards(None).await.unwrap().len(), 1);

    let updated = store.record_review(card.id, q(5)).await.unwrap();
    assert_eq!(updated.repetitions, 1);
    assert_eq!(updated.interval_days, 1);
    assert!((updated.ease_factor - 2.6).abs() < 1e-4);
    assert!(store.due_cards(None).await.unwrap().is_empty());

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_cards, 1);
    assert_eq!(stats.reviewed_today, 1);
    assert_eq!(stats.current_streak, 1);
    assert!(stats.longest_streak >= stats.current_streak);
}

#[tokio::test]
async fn undo_restores_card_and_ledger_once() {
    let store = open_store();
    let card = store
        .add_card(SourceType::Concept, "c-lisp", &[])
        .await
        .unwrap()
        .unwrap();

    store.record_review(card.id, q(4)).await.unwrap();
    assert!(store.undo_last_review(card.id).await.unwrap());

    let restored = store.card_by_id(card.id).await.unwrap().unwrap();
    assert_eq!(restored.repetitions, 0);
    assert_eq!(restored.interval_days, 0);
    assert!(restored.last_reviewed_at.is_none());
    assert_eq!(store.stats().await.unwrap().reviewed_today, 0);

    // The slot is single-shot.
    assert!(!store.undo_last_review(card.id).await.unwrap());
}

#[tokio::test]
async fn undo_requires_matching_card_and_no_interleaving() {
    let store = open_store();
    let a = store
        .add_card(SourceType::Concept, "c-eliza", &[])
        .await
        .unwrap()
        .unwrap();
    let b = store
        .add_card(SourceType::Concept, "c-shrdlu", &[])
        .await
        .unwrap()
        .unwrap();

    store.record_review(a.id, q(5)).await.unwrap();
    // Wrong card: nothing happens, the slot stays armed.
    assert!(!store.undo_last_review(b.id).await.unwrap());
    assert!(store.undo_last_review(a.id).await.unwrap());

    // A mutating operation between review and undo disarms the slot.
    store.record_review(a.id, q(5)).await.unwrap();
    store.remove_card(b.id).await.unwrap();
    assert!(!store.undo_last_review(a.id).await.unwrap());
}

#[tokio::test]
async fn default_packs_are_protected() {
    let store = open_store();
    let packs = store.list_packs().await.unwrap();
    let all = packs.iter().find(|p| p.name == DEFAULT_PACK_ALL).unwrap();
    let recent = packs.iter().find(|p| p.name == DEFAULT_PACK_RECENT).unwrap();

    store.rename_pack(all.id, "Everything").await.unwrap();
    store.delete_pack(recent.id).await.unwrap();

    let after = store.list_packs().await.unwrap();
    assert_eq!(after.len(), 2);
    assert!(after.iter().any(|p| p.name == DEFAULT_PACK_ALL));
    assert!(after.iter().any(|p| p.name == DEFAULT_PACK_RECENT));

    // Membership in a default pack cannot be removed either.
    let card = store
        .add_card(SourceType::Milestone, "m-1950-turing-test", &[])
        .await
        .unwrap()
        .unwrap();
    store.remove_card_from_pack(card.id, all.id).await.unwrap();
    let card = store.card_by_id(card.id).await.unwrap().unwrap();
    assert!(card.in_pack(all.id));
}

#[tokio::test]
async fn deleting_a_custom_pack_keeps_its_cards() {
    let store = open_store();
    let pack = store
        .create_pack("Golden Age", Some("1956-1974"), "#f97316")
        .await
        .unwrap();
    let card = store
        .add_card(SourceType::Milestone, "m-1965-dendral", &[pack.id])
        .await
        .unwrap()
        .unwrap();
    assert!(card.in_pack(pack.id));
    assert_eq!(store.cards_in_pack(pack.id).await.unwrap().len(), 1);

    store.delete_pack(pack.id).await.unwrap();
    assert_eq!(store.list_packs().await.unwrap().len(), 2);
    let card = store.card_by_id(card.id).await.unwrap().unwrap();
    assert!(!card.in_pack(pack.id));
    assert_eq!(card.pack_ids.len(), 2);
}

#[tokio::test]
async fn pack_validation_and_conflicts() {
    let store = open_store();
    assert!(store.create_pack("", None, "#fff").await.is_err());
    assert!(store
        .create_pack(&"x".repeat(51), None, "#fff")
        .await
        .is_err());
    store.create_pack("Winters", None, "#94a3b8").await.unwrap();
    assert!(store.create_pack("winters", None, "#94a3b8").await.is_err());
}

#[tokio::test]
async fn due_filter_respects_pack_argument() {
    let store = open_store();
    let pack = store.create_pack("Neural Nets", None, "#a855f7").await.unwrap();
    let inside = store
        .add_card(SourceType::Concept, "c-backprop", &[pack.id])
        .await
        .unwrap()
        .unwrap();
    store
        .add_card(SourceType::Concept, "c-minimax", &[])
        .await
        .unwrap()
        .unwrap();

    let due_in_pack = store.due_cards(Some(pack.id)).await.unwrap();
    assert_eq!(due_in_pack.len(), 1);
    assert_eq!(due_in_pack[0].id, inside.id);
    assert_eq!(store.due_cards(None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn state_survives_reopen_from_same_kv() {
    let kv: Arc<dyn KeyValue> = Arc::new(MemoryKv::new());
    let card_id = {
        let store = LocalStore::open(kv.clone());
        let card = store
            .add_card(SourceType::Milestone, "m-2016-alphago", &[])
            .await
            .unwrap()
            .unwrap();
        store.record_review(card.id, q(5)).await.unwrap();
        store.add_study_time(15).await.unwrap();
        card.id
    };

    let store = LocalStore::open(kv);
    let card = store.card_by_id(card_id).await.unwrap().unwrap();
    assert_eq!(card.repetitions, 1);
    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_cards, 1);
    assert_eq!(stats.reviewed_today, 1);
    assert_eq!(stats.current_streak, 1);
}

#[tokio::test]
async fn pack_order_is_persisted() {
    let kv: Arc<dyn KeyValue> = Arc::new(MemoryKv::new());
    let custom_id = {
        let store = LocalStore::open(kv.clone());
        let custom = store.create_pack("History", None, "#475569").await.unwrap();
        store.reorder_packs(&[custom.id]).await.unwrap();
        custom.id
    };

    let store = LocalStore::open(kv);
    let packs = store.list_packs().await.unwrap();
    assert_eq!(packs[0].id, custom_id);
    assert_eq!(packs.len(), 3);
}

#[tokio::test]
async fn reset_reinitializes_defaults() {
    let store = open_store();
    let pack = store.create_pack("Scratch", None, "#eab308").await.unwrap();
    let card = store
        .add_card(SourceType::Concept, "c-qlearning", &[pack.id])
        .await
        .unwrap()
        .unwrap();
    store.record_review(card.id, q(3)).await.unwrap();

    store.reset_all().await.unwrap();
    assert!(store.list_cards().await.unwrap().is_empty());
    let packs = store.list_packs().await.unwrap();
    assert_eq!(packs.len(), 2);
    assert!(packs.iter().all(|p| p.is_default));
    let stats = store.stats().await.unwrap();
    assert_eq!(stats.reviewed_today, 0);
    assert_eq!(stats.current_streak, 0);
}
