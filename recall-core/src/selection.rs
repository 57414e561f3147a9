use crate::{Card, PackId, SourceType};
use chrono::{DateTime, Utc};

/// Cards due for review, optionally restricted to one pack first.
///
/// Ordering is the collection's insertion order: stable, not sorted by
/// overdueness.
pub fn due_cards(cards: &[Card], pack_id: Option<PackId>, now: DateTime<Utc>) -> Vec<Card> {
    cards
        .iter()
        .filter(|c| pack_id.map_or(true, |p| c.in_pack(p)))
        .filter(|c| c.is_due(now))
        .cloned()
        .collect()
}

pub fn cards_in_pack(cards: &[Card], pack_id: PackId) -> Vec<Card> {
    cards.iter().filter(|c| c.in_pack(pack_id)).cloned().collect()
}

pub fn find_by_source<'a>(
    cards: &'a [Card],
    source_type: SourceType,
    source_id: &str,
) -> Option<&'a Card> {
    cards.iter().find(|c| c.matches_source(source_type, source_id))
}
