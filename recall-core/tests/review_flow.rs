use chrono::{Duration, Utc};
use recall_core::{
    apply_review, compute_next_review, Card, Quality, SourceType, EF_MAX, EF_MIN,
};

fn q(v: u8) -> Quality {
    Quality::new(v).unwrap()
}

#[test]
fn fresh_card_reviewed_perfectly_twice() {
    let card = Card::new(SourceType::Milestone, "m-1956-dartmouth");
    let now = Utc::now();

    let card = apply_review(card, q(5), now);
    assert!((card.ease_factor - 2.6).abs() < 1e-4);
    assert_eq!(card.interval_days, 1);
    assert_eq!(card.repetitions, 1);
    assert_eq!(card.next_review_at, Some(now + Duration::days(1)));

    let next_day = now + Duration::days(1);
    let card = apply_review(card, q(5), next_day);
    assert_eq!(card.repetitions, 2);
    assert_eq!(card.interval_days, 6);
    assert_eq!(card.next_review_at, Some(next_day + Duration::days(6)));
}

#[test]
fn failing_a_mature_card_resets_schedule_not_ease() {
    let mut card = Card::new(SourceType::Concept, "c-symbol-grounding");
    card.ease_factor = 2.0;
    card.interval_days = 10;
    card.repetitions = 3;

    let now = Utc::now();
    let card = apply_review(card, q(2), now);
    assert_eq!(card.interval_days, 0);
    assert_eq!(card.repetitions, 0);
    // 2.0 + (0.1 - 3*(0.08 + 3*0.02)) = 1.68, not a reset to default
    assert!((card.ease_factor - 1.68).abs() < 1e-4);
    assert!(card.is_due(now));
}

#[test]
fn every_failing_quality_resets_regardless_of_history() {
    for quality in 0..3u8 {
        for reps in [0u32, 1, 5, 40] {
            let s = compute_next_review(q(quality), 2.5, 17, reps);
            assert_eq!(s.repetitions, 0);
            assert_eq!(s.interval_days, 0);
        }
    }
}

#[test]
fn every_passing_quality_follows_the_interval_ladder() {
    for quality in 3..=5u8 {
        let first = compute_next_review(q(quality), 2.5, 0, 0);
        assert_eq!(first.repetitions, 1);
        assert_eq!(first.interval_days, 1);

        let second = compute_next_review(q(quality), first.ease_factor, 1, 1);
        assert_eq!(second.repetitions, 2);
        assert_eq!(second.interval_days, 6);
    }
}

#[test]
fn ease_factor_stays_in_domain_for_all_inputs() {
    for quality in 0..=5u8 {
        for ef_tenths in 13..=30u32 {
            let ef = ef_tenths as f32 / 10.0;
            let s = compute_next_review(q(quality), ef, 8, 3);
            assert!(s.ease_factor >= EF_MIN && s.ease_factor <= EF_MAX);
        }
    }
}

#[test]
fn card_json_shape_is_stable() {
    let card = Card::new(SourceType::Concept, "c-attention");
    let json = serde_json::to_value(&card).unwrap();
    assert_eq!(json["source_type"], "concept");
    assert!(json["pack_ids"].as_array().unwrap().is_empty());
    assert!(json["last_reviewed_at"].is_null());

    let back: Card = serde_json::from_value(json).unwrap();
    assert_eq!(back.id, card.id);
    assert_eq!(back.source_id, "c-attention");
    assert_eq!(back.next_review_at, card.next_review_at);
}

#[test]
fn quality_rejects_out_of_range_in_serde_too() {
    assert!(serde_json::from_str::<Quality>("6").is_err());
    let five: Quality = serde_json::from_str("5").unwrap();
    assert_eq!(five.value(), 5);
}
