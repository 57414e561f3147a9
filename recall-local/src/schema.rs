use crate::kv::KeyValue;
use recall_core::{Card, Pack, ReviewHistory, StreakState, EF_MAX, EF_MIN};
use serde_json::{json, Value};

pub const KEY_CARDS: &str = "recall.cards";
pub const KEY_PACKS: &str = "recall.packs";
pub const KEY_STATS: &str = "recall.stats";
pub const KEY_LEDGER: &str = "recall.ledger";
pub const KEY_SCHEMA: &str = "recall.schema_version";

pub const SCHEMA_VERSION: u32 = 2;

type Migration = fn(&mut Value);

/// Steps keyed by the version they migrate FROM, applied in sequence.
/// Adding version N+1 means appending one `(N, migrate_vN)` entry here.
fn migration_steps() -> [(u32, Migration); 2] {
    [
        (0, migrate_v0_card_shape as Migration),
        (1, migrate_v1_pack_fields as Migration),
    ]
}

/// v0 cards predate packs and used the `next_review` key.
fn migrate_v0_card_shape(doc: &mut Value) {
    if let Some(cards) = doc["cards"].as_array_mut() {
        for card in cards.iter_mut() {
            if let Some(obj) = card.as_object_mut() {
                if let Some(v) = obj.remove("next_review") {
                    obj.entry("next_review_at").or_insert(v);
                }
                obj.entry("pack_ids").or_insert_with(|| json!([]));
            }
        }
    }
}

/// v1 packs had no description, color, or default flag.
fn migrate_v1_pack_fields(doc: &mut Value) {
    if let Some(packs) = doc["packs"].as_array_mut() {
        for pack in packs.iter_mut() {
            if let Some(obj) = pack.as_object_mut() {
                obj.entry("description").or_insert(Value::Null);
                obj.entry("color").or_insert_with(|| json!("#6366f1"));
                obj.entry("is_default").or_insert_with(|| json!(false));
            }
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub cards: Vec<Card>,
    pub packs: Vec<Pack>,
    pub history: ReviewHistory,
    pub streak: StreakState,
}

fn parse_key(kv: &dyn KeyValue, key: &str, fallback: Value) -> Value {
    match kv.get(key) {
        Some(text) => match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(err) => {
                log::warn!("discarding unreadable value under {key}: {err}");
                fallback
            }
        },
        None => fallback,
    }
}

/// Loads the persisted snapshot, coercing older schema versions through
/// the migration chain. Items that fail validation are dropped one by
/// one; loading never fails as a whole.
pub fn load(kv: &dyn KeyValue) -> Snapshot {
    if kv.get(KEY_CARDS).is_none() && kv.get(KEY_PACKS).is_none() {
        kv.set(KEY_SCHEMA, &SCHEMA_VERSION.to_string());
        return Snapshot::default();
    }

    let version = kv
        .get(KEY_SCHEMA)
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(0);

    let mut doc = json!({
        "cards": parse_key(kv, KEY_CARDS, json!([])),
        "packs": parse_key(kv, KEY_PACKS, json!([])),
        "ledger": parse_key(kv, KEY_LEDGER, json!({ "days": {} })),
        "stats": parse_key(kv, KEY_STATS, json!({})),
    });

    if version < SCHEMA_VERSION {
        log::info!("migrating stored data from schema v{version} to v{SCHEMA_VERSION}");
        for (from, step) in migration_steps() {
            if from >= version {
                step(&mut doc);
            }
        }
    }

    let cards: Vec<Card> = doc["cards"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| match serde_json::from_value::<Card>(v.clone()) {
                    Ok(mut c) => {
                        c.ease_factor = c.ease_factor.clamp(EF_MIN, EF_MAX);
                        Some(c)
                    }
                    Err(err) => {
                        log::debug!("dropping invalid stored card: {err}");
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let packs: Vec<Pack> = doc["packs"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| match serde_json::from_value::<Pack>(v.clone()) {
                    Ok(p) => Some(p),
                    Err(err) => {
                        log::debug!("dropping invalid stored pack: {err}");
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let history =
        serde_json::from_value::<ReviewHistory>(doc["ledger"].take()).unwrap_or_default();
    let mut streak = serde_json::from_value::<StreakState>(doc["stats"].take()).unwrap_or_default();
    streak.longest = streak.longest.max(streak.current);

    let snapshot = Snapshot {
        cards,
        packs,
        history,
        streak,
    };
    if version < SCHEMA_VERSION {
        save_all(kv, &snapshot);
    }
    snapshot
}

pub fn save_cards(kv: &dyn KeyValue, cards: &[Card]) {
    kv.set(KEY_CARDS, &serde_json::to_string(cards).expect("serialize cards"));
}

pub fn save_packs(kv: &dyn KeyValue, packs: &[Pack]) {
    kv.set(KEY_PACKS, &serde_json::to_string(packs).expect("serialize packs"));
}

pub fn save_ledger(kv: &dyn KeyValue, history: &ReviewHistory) {
    kv.set(KEY_LEDGER, &serde_json::to_string(history).expect("serialize ledger"));
}

pub fn save_stats(kv: &dyn KeyValue, streak: &StreakState) {
    kv.set(KEY_STATS, &serde_json::to_string(streak).expect("serialize streak"));
}

pub fn save_all(kv: &dyn KeyValue, snapshot: &Snapshot) {
    save_cards(kv, &snapshot.cards);
    save_packs(kv, &snapshot.packs);
    save_ledger(kv, &snapshot.history);
    save_stats(kv, &snapshot.streak);
    kv.set(KEY_SCHEMA, &SCHEMA_VERSION.to_string());
}
