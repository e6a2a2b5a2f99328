//! Lexical similarity scoring for confusable answer choices

#[cfg(feature = "python")]
use pyo3::prelude::*;
use strsim::normalized_levenshtein;

const COMMON_SUFFIXES: [&str; 6] = ["ing", "ed", "ly", "tion", "s", "es"];

/// Lightweight score of how easily `a` could be mistaken for `b`.
///
/// Tuned for English word forms. Not exactly symmetric: only `a` contributes
/// the inner-substring probe.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    let mut score = 0u32;

    if a[0] == b[0] {
        score += 2;
    }
    if prefix(&a, 2) == prefix(&b, 2) {
        score += 1;
    }

    let len_diff = a.len().abs_diff(b.len());
    if len_diff <= 1 {
        score += 2;
    } else if len_diff <= 2 {
        score += 1;
    }

    if suffix(&a, 2) == suffix(&b, 2) {
        score += 1;
    }

    let a_str: String = a.iter().collect();
    let b_str: String = b.iter().collect();
    for suf in COMMON_SUFFIXES {
        if a_str.ends_with(suf) && b_str.ends_with(suf) {
            score += 1;
        }
    }

    // short words would match too easily
    if a.len() >= 5 {
        let mid: String = a[1..4].iter().collect();
        if b_str.contains(&mid) {
            score += 1;
        }
    }

    f64::from(score)
}

fn prefix(chars: &[char], n: usize) -> &[char] {
    &chars[..n.min(chars.len())]
}

fn suffix(chars: &[char], n: usize) -> &[char] {
    &chars[chars.len().saturating_sub(n)..]
}

/// Stable-sort candidates so the most confusable with `target` come first.
///
/// Ties on the heuristic fall back to normalized Levenshtein similarity; full
/// ties keep their incoming order, so shuffle beforehand for random tie-breaks.
pub fn rank_confusable(target: &str, candidates: &mut [String]) {
    let target = target.to_lowercase();
    candidates.sort_by_cached_key(|candidate| {
        let lowered = candidate.to_lowercase();
        let heuristic = similarity(&target, &lowered);
        let edit = normalized_levenshtein(&target, &lowered);
        (std::cmp::Reverse(OrderedScore(heuristic)), std::cmp::Reverse(OrderedScore(edit)))
    });
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct OrderedScore(f64);

impl Eq for OrderedScore {}

impl PartialOrd for OrderedScore {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedScore {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

// ============= Python Binding =============

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "similarity")]
pub fn py_similarity(a: &str, b: &str) -> f64 {
    similarity(a, b)
}
