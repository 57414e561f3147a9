use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CardId = Uuid;
pub type PackId = Uuid;

pub const EF_MIN: f32 = 1.3;
pub const EF_MAX: f32 = 3.0;
pub const EF_DEFAULT: f32 = 2.5;

/// A card is mastered once its interval has grown past this many days.
pub const MASTERY_INTERVAL_DAYS: u32 = 21;

pub const PACK_NAME_MAX: usize = 50;
pub const PACK_DESCRIPTION_MAX: usize = 200;

pub const DEFAULT_PACK_ALL: &str = "All Cards";
pub const DEFAULT_PACK_RECENT: &str = "Recently Added";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Milestone,
    Concept,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub source_type: SourceType,
    pub source_id: String,
    pub pack_ids: Vec<PackId>,

    pub ease_factor: f32,
    pub interval_days: u32,
    pub repetitions: u32,
    /// None means the card has never been scheduled and is due immediately.
    pub next_review_at: Option<DateTime<Utc>>,
    pub last_reviewed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl Card {
    pub fn new(source_type: SourceType, source_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            source_type,
            source_id: source_id.into(),
            pack_ids: Vec::new(),
            ease_factor: EF_DEFAULT,
            interval_days: 0,
            repetitions: 0,
            next_review_at: Some(now),
            last_reviewed_at: None,
            created_at: now,
        }
    }

    pub fn matches_source(&self, source_type: SourceType, source_id: &str) -> bool {
        self.source_type == source_type && self.source_id == source_id
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.next_review_at {
            None => true,
            Some(at) => at <= now,
        }
    }

    pub fn is_mastered(&self) -> bool {
        self.interval_days > MASTERY_INTERVAL_DAYS
    }

    pub fn in_pack(&self, pack_id: PackId) -> bool {
        self.pack_ids.contains(&pack_id)
    }

    pub fn add_to_pack(&mut self, pack_id: PackId) {
        if !self.pack_ids.contains(&pack_id) {
            self.pack_ids.push(pack_id);
        }
    }

    pub fn remove_from_pack(&mut self, pack_id: PackId) {
        self.pack_ids.retain(|p| *p != pack_id);
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pack {
    pub id: PackId,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl Pack {
    pub fn new(name: impl Into<String>, description: Option<String>, color: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description,
            color: color.into(),
            is_default: false,
            created_at: Utc::now(),
        }
    }

    fn default_pack(name: &str, color: &str) -> Self {
        let mut p = Pack::new(name, None, color);
        p.is_default = true;
        p
    }
}

/// The two system packs every store starts with. New cards always join both.
pub fn default_packs() -> Vec<Pack> {
    vec![
        Pack::default_pack(DEFAULT_PACK_ALL, "#6366f1"),
        Pack::default_pack(DEFAULT_PACK_RECENT, "#f59e0b"),
    ]
}

/// Reorders `packs` to follow `order`. Unknown ids are ignored; packs
/// not named in `order` keep their relative order after the named ones.
pub fn reorder_packs(packs: &mut Vec<Pack>, order: &[PackId]) {
    let mut sorted = Vec::with_capacity(packs.len());
    for id in order {
        if let Some(pos) = packs.iter().position(|p| p.id == *id) {
            sorted.push(packs.remove(pos));
        }
    }
    sorted.append(packs);
    *packs = sorted;
}

pub fn validate_pack_name(name: &str) -> bool {
    !name.is_empty() && name.chars().count() <= PACK_NAME_MAX
}

pub fn validate_pack_description(description: Option<&str>) -> bool {
    description.map_or(true, |d| d.chars().count() <= PACK_DESCRIPTION_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn new_card_is_immediately_due() {
        let card = Card::new(SourceType::Milestone, "m-1969-apollo");
        assert!(card.is_due(Utc::now()));
        assert_eq!(card.ease_factor, EF_DEFAULT);
        assert_eq!(card.interval_days, 0);
        assert_eq!(card.repetitions, 0);
        assert!(card.last_reviewed_at.is_none());
    }

    #[test]
    fn due_respects_future_schedule() {
        let mut card = Card::new(SourceType::Concept, "c-backprop");
        let now = Utc::now();
        card.next_review_at = Some(now + Duration::days(3));
        assert!(!card.is_due(now));
        assert!(card.is_due(now + Duration::days(3)));
        card.next_review_at = None;
        assert!(card.is_due(now));
    }

    #[test]
    fn mastery_boundary_is_exclusive() {
        let mut card = Card::new(SourceType::Concept, "c-turing-test");
        card.interval_days = 21;
        assert!(!card.is_mastered());
        card.interval_days = 22;
        assert!(card.is_mastered());
    }

    #[test]
    fn pack_membership_is_a_set() {
        let mut card = Card::new(SourceType::Milestone, "m-1956-dartmouth");
        let pack = Pack::new("Foundations", None, "#22c55e");
        card.add_to_pack(pack.id);
        card.add_to_pack(pack.id);
        assert_eq!(card.pack_ids.len(), 1);
        card.remove_from_pack(pack.id);
        assert!(card.pack_ids.is_empty());
    }

    #[test]
    fn default_packs_are_flagged() {
        let packs = default_packs();
        assert_eq!(packs.len(), 2);
        assert!(packs.iter().all(|p| p.is_default));
        assert!(packs.iter().any(|p| p.name == DEFAULT_PACK_ALL));
        assert!(packs.iter().any(|p| p.name == DEFAULT_PACK_RECENT));
    }

    #[test]
    fn reorder_keeps_unlisted_packs_at_the_end() {
        let a = Pack::new("A", None, "#111111");
        let b = Pack::new("B", None, "#222222");
        let c = Pack::new("C", None, "#333333");
        let mut packs = vec![a.clone(), b.clone(), c.clone()];

        reorder_packs(&mut packs, &[c.id, Pack::new("ghost", None, "#000").id, a.id]);
        let names: Vec<&str> = packs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["C", "A", "B"]);
    }

    #[test]
    fn pack_name_limits() {
        assert!(!validate_pack_name(""));
        assert!(validate_pack_name("Transformers"));
        assert!(!validate_pack_name(&"x".repeat(51)));
        assert!(validate_pack_description(None));
        assert!(!validate_pack_description(Some(&"y".repeat(201))));
    }
}
