use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tango_core::{
    calc_weight, DistractorStrategy, Session, SessionHandle, SessionState, StudyConfig, StudyMode, VocabItem,
    WordHistory, WordLog, RECENT_CAPACITY,
};

fn pool(n: usize) -> Vec<VocabItem> {
    (0..n)
        .map(|i| VocabItem::new(format!("w{i}"), format!("word{i}"), format!("単語{i}")))
        .collect()
}

fn seeded(items: Vec<VocabItem>, question_count: usize, choice_count: usize, seed: u64) -> Session {
    Session::with_rng(
        StudyConfig::new(items, StudyMode::EnJa, question_count, choice_count),
        StdRng::seed_from_u64(seed),
    )
}

#[test]
fn missed_item_returns_once_out_of_recency_window() {
    for seed in 0..10 {
        let mut session = seeded(pool(20), 50, 4, seed);

        let missed = session.next_question().unwrap();
        session.answer_question(&missed, "wrong").unwrap();

        // the miss stays blocked while it is among the last 12 shown
        for _ in 0..RECENT_CAPACITY {
            let q = session.next_question().unwrap();
            assert_ne!(q.id, missed.id);
            session.answer_question(&q, q.correct_choice()).unwrap();
        }

        let q = session.next_question().unwrap();
        assert_eq!(q.id, missed.id, "seed {seed}");
        assert!(session.pool().wrong_queue.is_empty());
        assert!(!session.pool().remaining_ids.is_empty());
    }
}

#[test]
fn consecutive_questions_never_repeat_with_large_pool() {
    let mut answer_rng = StdRng::seed_from_u64(1234);
    for seed in 0..5 {
        let mut session = seeded(pool(RECENT_CAPACITY + 4), 120, 4, seed);
        let mut previous: Option<String> = None;

        while let Some(q) = session.next_question() {
            assert_ne!(previous.as_deref(), Some(q.id.as_str()));
            let choice = if answer_rng.gen_bool(0.5) {
                q.correct_choice().to_string()
            } else {
                "wrong".to_string()
            };
            session.answer_question(&q, &choice).unwrap();
            previous = Some(q.id);
        }
        assert_eq!(session.progress().done, 120);
    }
}

#[test]
fn choices_are_distinct_and_hold_the_answer_once() {
    let mut items = pool(8);
    // shared surface forms must not produce duplicate choices
    items.push(VocabItem::new("dup1", "large", "大きい"));
    items.push(VocabItem::new("dup2", "big", "大きい"));
    items.push(VocabItem::new("dup3", "huge", "大きい"));

    for strategy in [DistractorStrategy::Random, DistractorStrategy::Confusable] {
        for mode in [StudyMode::EnJa, StudyMode::JaEn] {
            let config = StudyConfig::new(items.clone(), mode, 40, 5).with_strategy(strategy);
            let mut session = Session::with_rng(config, StdRng::seed_from_u64(77));

            while let Some(q) = session.next_question() {
                let unique: HashSet<&String> = q.choices.iter().collect();
                assert_eq!(unique.len(), q.choices.len(), "duplicate in {:?}", q.choices);
                assert!(q.choices.len() <= 5);
                let correct = q.correct_choice();
                assert_eq!(q.choices.iter().filter(|c| *c == correct).count(), 1);
                session.answer_question(&q, correct).unwrap();
            }
        }
    }
}

#[test]
fn progress_is_monotonic_and_ends_exactly_at_total() {
    let mut session = seeded(pool(5), 7, 3, 42);
    let mut done = 0;
    while let Some(q) = session.next_question() {
        assert!(session.progress().done < session.progress().total);
        session.answer_question(&q, "whatever").unwrap();
        done += 1;
        assert_eq!(session.progress().done, done);
    }
    assert_eq!(session.progress().done, session.progress().total);
    assert_eq!(done, 7);
}

#[test]
fn three_misses_on_three_items() {
    let mut handle = SessionHandle::new();
    let items = vec![
        VocabItem::new("A", "apple", "りんご"),
        VocabItem::new("B", "book", "本"),
        VocabItem::new("C", "cat", "ねこ"),
    ];
    handle.make_session_with_rng(StudyConfig::new(items, StudyMode::EnJa, 3, 2), StdRng::seed_from_u64(3));

    let mut seen = HashSet::new();
    for expected_queue in 1..=3 {
        let q = handle.next_question().unwrap().unwrap();
        assert_eq!(q.choices.len(), 2);
        seen.insert(q.id.clone());
        let outcome = handle.answer_question(&q, "not it").unwrap();
        assert!(!outcome.correct);
        assert_eq!(handle.get_session().unwrap().pool().wrong_queue.len(), expected_queue);
    }
    assert_eq!(seen.len(), 3);

    let session = handle.get_session().unwrap();
    assert_eq!(session.stats().wrong, 3);
    assert_eq!(session.stats().correct, 0);
    assert_eq!(session.progress().done, 3);
    assert_eq!(session.progress().total, 3);
    assert_eq!(handle.state(), SessionState::Exhausted);
    assert!(handle.next_question().unwrap().is_none());
}

#[test]
fn single_item_pool_has_only_the_correct_choice() {
    let mut session = seeded(vec![VocabItem::new("A", "apple", "りんご")], 1, 4, 5);
    let q = session.next_question().unwrap();
    assert_eq!(q.prompt_text, "apple");
    assert_eq!(q.choices, vec!["りんご".to_string()]);
    assert!(session.answer_question(&q, "りんご").unwrap().correct);
}

#[test]
fn streak_and_recency_floor_weight() {
    let now = 1_700_000_000_000;
    let history = WordHistory::Seen(WordLog {
        wrong_recent: 0,
        streak: 5,
        last_shown_at: now - 5_000,
        ..WordLog::default()
    });
    assert!((calc_weight(&history, now) - 0.1).abs() < 1e-12);
}
