//! End-to-end review flow over an in-memory store.

use std::sync::{Arc, Barrier};
use std::thread;

use chrono::{Duration, Utc};
use cardbox_core::{
    Card, CoreError, Deck, DeckDb, Grade, ReviewService, User, MAX_BOX, MIN_BOX,
};

struct Fixture {
    svc: ReviewService,
    user: User,
    card: Card,
}

fn fixture(box_level: i32, interval_days: f64) -> Fixture {
    let db = DeckDb::open_memory().unwrap();
    let user = User::new("learner");
    db.create_user(&user).unwrap();
    let deck = Deck::new(&user.id, "Integration", None);
    db.create_deck(&deck).unwrap();
    let mut card = Card::new(&deck.id, "question", "answer", 1.0);
    card.box_level = box_level;
    card.interval_days = interval_days;
    db.create_card(&card).unwrap();
    Fixture {
        svc: ReviewService::new(db),
        user,
        card,
    }
}

#[test]
fn good_from_box_two_interval_four() {
    let f = fixture(2, 4.0);
    let now = Utc::now();
    let result = f
        .svc
        .review_card_at(&f.user.id, &f.card.id, Grade::Good, None, now)
        .unwrap();
    assert_eq!(result.card.box_level, 3);
    assert_eq!(result.card.interval_days, 8.0);
    assert_eq!(result.next_review, now + Duration::days(8));
}

#[test]
fn again_from_box_two_interval_four() {
    let f = fixture(2, 4.0);
    let now = Utc::now();
    let result = f
        .svc
        .review_card_at(&f.user.id, &f.card.id, Grade::Again, None, now)
        .unwrap();
    assert_eq!(result.card.box_level, 1);
    assert_eq!(result.card.interval_days, 1.0);
    assert_eq!(result.next_review, now + Duration::days(1));
}

#[test]
fn hard_clamped_at_box_floor() {
    let f = fixture(1, 3.0);
    let result = f
        .svc
        .review_card(&f.user.id, &f.card.id, Grade::Hard, None)
        .unwrap();
    assert_eq!(result.card.box_level, 1);
    assert_eq!(result.card.interval_days, 1.0);
}

#[test]
fn foreign_card_yields_not_found() {
    let f = fixture(1, 1.0);
    let stranger = User::new("stranger");
    f.svc.db().create_user(&stranger).unwrap();

    let err = f
        .svc
        .review_card(&stranger.id, &f.card.id, Grade::Good, None)
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[test]
fn repeated_grades_are_not_idempotent() {
    let f = fixture(1, 1.0);
    let now = Utc::now();

    let first = f
        .svc
        .review_card_at(&f.user.id, &f.card.id, Grade::Good, None, now)
        .unwrap();
    let second = f
        .svc
        .review_card_at(&f.user.id, &f.card.id, Grade::Good, None, now)
        .unwrap();

    assert!(second.card.interval_days > first.card.interval_days);
    assert_ne!(second.next_review, first.next_review);
}

#[test]
fn box_stays_in_range_over_long_sequences() {
    let f = fixture(1, 1.0);
    let now = Utc::now();

    let grades = [
        Grade::Good,
        Grade::Easy,
        Grade::Easy,
        Grade::Good,
        Grade::Good,
        Grade::Hard,
        Grade::Again,
        Grade::Easy,
        Grade::Good,
        Grade::Good,
        Grade::Good,
    ];
    for grade in grades {
        let result = f
            .svc
            .review_card_at(&f.user.id, &f.card.id, grade, None, now)
            .unwrap();
        assert!((MIN_BOX..=MAX_BOX).contains(&result.card.box_level));
        assert!(result.next_review >= result.log.reviewed_at);
    }
}

#[test]
fn due_queue_empty_when_all_future() {
    let f = fixture(1, 1.0);
    let now = Utc::now();
    f.svc
        .review_card_at(&f.user.id, &f.card.id, Grade::Easy, None, now)
        .unwrap();

    assert!(f.svc.due_cards_at(&f.user.id, None, now).unwrap().is_empty());
    // The card shows up again once its interval elapses.
    let later = now + Duration::days(4);
    assert_eq!(f.svc.due_cards_at(&f.user.id, None, later).unwrap().len(), 1);
}

#[test]
fn concurrent_reviews_of_one_card_serialize() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cardbox.db");

    let db = DeckDb::open_at(&path).unwrap();
    let user = User::new("learner");
    db.create_user(&user).unwrap();
    let deck = Deck::new(&user.id, "Concurrent", None);
    db.create_deck(&deck).unwrap();
    let card = Card::new(&deck.id, "q", "a", 1.0);
    db.create_card(&card).unwrap();
    drop(db);

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            let user_id = user.id.clone();
            let card_id = card.id.clone();
            thread::spawn(move || {
                let svc = ReviewService::new(DeckDb::open_at(&path).unwrap());
                barrier.wait();
                svc.review_card(&user_id, &card_id, Grade::Good, None)
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Neither review may start from a stale snapshot: the transitions
    // must compound 1 -> 2 -> 3, never collapse into a lost update.
    let db = DeckDb::open_at(&path).unwrap();
    let stored = db.get_card(&card.id).unwrap().unwrap();
    assert_eq!(stored.box_level, 3);
    assert_eq!(stored.interval_days, 4.0);

    let logs = db.recent_logs(&card.id, 5).unwrap();
    assert_eq!(logs.len(), 2);
    let mut befores: Vec<i32> = logs.iter().map(|log| log.box_before).collect();
    befores.sort_unstable();
    assert_eq!(befores, vec![1, 2]);
}

#[test]
fn review_log_records_transition() {
    let f = fixture(3, 8.0);
    let result = f
        .svc
        .review_card(&f.user.id, &f.card.id, Grade::Hard, Some("mixed up terms"))
        .unwrap();

    assert_eq!(result.log.box_before, 3);
    assert_eq!(result.log.box_after, 2);
    assert_eq!(result.log.interval_days_after, 4.0);
    assert_eq!(result.log.note.as_deref(), Some("mixed up terms"));

    let logs = f.svc.db().recent_logs(&f.card.id, 5).unwrap();
    assert_eq!(logs[0].id, result.log.id);
}
