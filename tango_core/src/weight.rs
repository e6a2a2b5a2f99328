//! History-based sampling weights
//!
//! Favors never-shown items and recent misses, damps items on a correct
//! streak, and suppresses anything shown in the last half minute.

use std::collections::HashMap;

#[cfg(feature = "python")]
use pyo3::prelude::*;
use rand::Rng;

use crate::progress::{WordHistory, WordLog};
use crate::questions::VocabItem;

const UNSEEN_WEIGHT: f64 = 5.0;
const BASE_WEIGHT: f64 = 1.0;
const WRONG_RECENT_BONUS: f64 = 2.0;
const STREAK_PENALTY: f64 = 0.7;
const RECENT_WINDOW_MS: i64 = 30_000;
const RECENT_PENALTY: f64 = 3.0;
const VERY_RECENT_WINDOW_MS: i64 = 10_000;
const VERY_RECENT_PENALTY: f64 = 2.0;
const MIN_WEIGHT: f64 = 0.1;

/// Sampling weight for an item; always at least `0.1`.
pub fn calc_weight(history: &WordHistory, now_ms: i64) -> f64 {
    let log = match history {
        WordHistory::Unseen => return UNSEEN_WEIGHT,
        WordHistory::Seen(log) => log,
    };

    let mut weight = BASE_WEIGHT;
    weight += f64::from(log.wrong_recent) * WRONG_RECENT_BONUS;
    weight -= f64::from(log.streak) * STREAK_PENALTY;

    let since = now_ms.saturating_sub(log.last_shown_at);
    if since < RECENT_WINDOW_MS {
        weight -= RECENT_PENALTY;
    }
    if since < VERY_RECENT_WINDOW_MS {
        weight -= VERY_RECENT_PENALTY;
    }

    weight.max(MIN_WEIGHT)
}

/// [`calc_weight`] against the wall clock.
pub fn calc_weight_now(history: &WordHistory) -> f64 {
    calc_weight(history, chrono::Utc::now().timestamp_millis())
}

/// Pick one item with probability proportional to `weight_of`.
///
/// Returns `None` only for an empty slice.
pub fn weighted_pick<'a, T, R, F>(items: &'a [T], weight_of: F, rng: &mut R) -> Option<&'a T>
where
    R: Rng + ?Sized,
    F: Fn(&T) -> f64,
{
    let first = items.first()?;
    let weights: Vec<f64> = items.iter().map(&weight_of).collect();
    let total: f64 = weights.iter().sum();
    let mut remaining = rng.gen::<f64>() * total;

    for (item, weight) in items.iter().zip(&weights) {
        remaining -= weight;
        if remaining <= 0.0 {
            return Some(item);
        }
    }
    // float rounding can leave a sliver above zero
    Some(first)
}

/// Weighted pick over a vocabulary pool using per-id logs.
pub fn pick_by_history<'a, R>(
    items: &'a [VocabItem],
    logs: &HashMap<String, WordLog>,
    now_ms: i64,
    rng: &mut R,
) -> Option<&'a VocabItem>
where
    R: Rng + ?Sized,
{
    weighted_pick(
        items,
        |item| calc_weight(&WordHistory::from(logs.get(&item.id).copied()), now_ms),
        rng,
    )
}

// ============= Python Binding =============

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "calc_weight", signature = (log=None, now_ms=None))]
pub fn py_calc_weight(log: Option<WordLog>, now_ms: Option<i64>) -> f64 {
    let history = WordHistory::from(log);
    match now_ms {
        Some(now) => calc_weight(&history, now),
        None => calc_weight_now(&history),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const NOW: i64 = 1_700_000_000_000;

    fn seen(wrong_recent: u32, streak: u32, last_shown_at: i64) -> WordHistory {
        WordHistory::Seen(WordLog {
            seen: 1,
            correct: 0,
            streak,
            wrong_recent,
            last_shown_at,
        })
    }

    #[test]
    fn unseen_items_get_novelty_boost() {
        assert_eq!(calc_weight(&WordHistory::Unseen, NOW), 5.0);
    }

    #[test]
    fn old_log_starts_from_base() {
        assert_eq!(calc_weight(&seen(0, 0, NOW - 60_000), NOW), 1.0);
    }

    #[test]
    fn recent_misses_raise_weight() {
        assert_eq!(calc_weight(&seen(3, 0, NOW - 60_000), NOW), 7.0);
    }

    #[test]
    fn recency_penalties_stack() {
        // 1 + 2*4 - 3 = 6 inside 30s, another -2 inside 10s
        assert_eq!(calc_weight(&seen(4, 0, NOW - 20_000), NOW), 6.0);
        assert_eq!(calc_weight(&seen(4, 0, NOW - 5_000), NOW), 4.0);
    }

    #[test]
    fn streak_and_recency_floor_at_minimum() {
        let weight = calc_weight(&seen(0, 5, NOW - 5_000), NOW);
        assert!((weight - 0.1).abs() < 1e-12);
    }

    #[test]
    fn weight_stays_positive_for_extreme_logs() {
        for history in [seen(u32::MAX, 0, NOW), seen(0, u32::MAX, NOW), seen(0, 0, i64::MIN)] {
            assert!(calc_weight(&history, NOW) > 0.0);
        }
    }

    #[test]
    fn weighted_pick_on_empty_is_none() {
        let mut rng = StdRng::seed_from_u64(1);
        let empty: [u32; 0] = [];
        assert!(weighted_pick(&empty, |_| 1.0, &mut rng).is_none());
    }

    #[test]
    fn weighted_pick_follows_weights() {
        let mut rng = StdRng::seed_from_u64(7);
        let items = ["heavy", "light"];
        let mut heavy = 0;
        for _ in 0..1_000 {
            let picked = weighted_pick(&items, |s| if *s == "heavy" { 99.0 } else { 1.0 }, &mut rng).unwrap();
            if *picked == "heavy" {
                heavy += 1;
            }
        }
        assert!(heavy > 900, "heavy picked {heavy} times");
    }

    #[test]
    fn pick_by_history_prefers_unseen() {
        let mut rng = StdRng::seed_from_u64(3);
        let items = vec![VocabItem::new("a", "apple", "りんご"), VocabItem::new("b", "book", "本")];
        let mut logs = HashMap::new();
        logs.insert(
            "a".to_string(),
            WordLog {
                streak: 10,
                last_shown_at: NOW,
                ..WordLog::default()
            },
        );
        let mut unseen = 0;
        for _ in 0..500 {
            if pick_by_history(&items, &logs, NOW, &mut rng).unwrap().id == "b" {
                unseen += 1;
            }
        }
        // 5.0 vs 0.1
        assert!(unseen > 450, "unseen picked {unseen} times");
    }
}
