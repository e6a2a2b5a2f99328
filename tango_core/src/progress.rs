//! Per-word learning history and end-of-session statistics

#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

/// Long-lived learning record for one item, kept by the caller across sessions.
#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WordLog {
    pub seen: u32,
    pub correct: u32,
    pub streak: u32,
    pub wrong_recent: u32,
    /// Unix epoch milliseconds.
    pub last_shown_at: i64,
}

impl WordLog {
    /// Fold one answer into the log.
    ///
    /// A correct answer extends the streak and lets one recent miss decay; a
    /// wrong answer resets the streak.
    pub fn record(&mut self, correct: bool, now_ms: i64) {
        self.seen += 1;
        if correct {
            self.correct += 1;
            self.streak += 1;
            self.wrong_recent = self.wrong_recent.saturating_sub(1);
        } else {
            self.streak = 0;
            self.wrong_recent += 1;
        }
        self.last_shown_at = now_ms;
    }
}

/// Whether an item has ever been shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordHistory {
    Unseen,
    Seen(WordLog),
}

impl From<Option<WordLog>> for WordHistory {
    fn from(log: Option<WordLog>) -> Self {
        match log {
            Some(log) => WordHistory::Seen(log),
            None => WordHistory::Unseen,
        }
    }
}

/// Result summary for a finished (or abandoned) session
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub total: usize,
    pub answered: usize,
    pub correct: usize,
    pub wrong: usize,
    /// Rounded to the nearest whole percent of `total`.
    pub accuracy_percent: u32,
    pub wrong_item_ids: Vec<String>,
}

impl SessionSummary {
    pub fn new(total: usize, answered: usize, correct: usize, wrong: usize, wrong_item_ids: Vec<String>) -> Self {
        let accuracy_percent = if total > 0 {
            ((correct as f64 / total as f64) * 100.0).round() as u32
        } else {
            0
        };
        Self {
            total,
            answered,
            correct,
            wrong,
            accuracy_percent,
            wrong_item_ids,
        }
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl WordLog {
    #[new]
    #[pyo3(signature = (seen=0, correct=0, streak=0, wrong_recent=0, last_shown_at=0))]
    fn py_new(seen: u32, correct: u32, streak: u32, wrong_recent: u32, last_shown_at: i64) -> Self {
        Self {
            seen,
            correct,
            streak,
            wrong_recent,
            last_shown_at,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "WordLog(seen={}, correct={}, streak={}, wrong_recent={})",
            self.seen, self.correct, self.streak, self.wrong_recent
        )
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl SessionSummary {
    fn __repr__(&self) -> String {
        format!(
            "SessionSummary(total={}, correct={}, accuracy={}%)",
            self.total, self.correct, self.accuracy_percent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_answer_extends_streak_and_decays_misses() {
        let mut log = WordLog {
            wrong_recent: 2,
            ..WordLog::default()
        };
        log.record(true, 1_000);
        assert_eq!(log.seen, 1);
        assert_eq!(log.correct, 1);
        assert_eq!(log.streak, 1);
        assert_eq!(log.wrong_recent, 1);
        assert_eq!(log.last_shown_at, 1_000);
    }

    #[test]
    fn wrong_answer_resets_streak() {
        let mut log = WordLog {
            streak: 4,
            ..WordLog::default()
        };
        log.record(false, 2_000);
        assert_eq!(log.streak, 0);
        assert_eq!(log.wrong_recent, 1);
        assert_eq!(log.correct, 0);
        assert_eq!(log.seen, 1);
    }

    #[test]
    fn wrong_recent_never_underflows() {
        let mut log = WordLog::default();
        log.record(true, 0);
        assert_eq!(log.wrong_recent, 0);
    }

    #[test]
    fn missing_log_is_unseen() {
        assert_eq!(WordHistory::from(None), WordHistory::Unseen);
        let log = WordLog::default();
        assert_eq!(WordHistory::from(Some(log)), WordHistory::Seen(log));
    }

    #[test]
    fn accuracy_rounds_against_total() {
        let summary = SessionSummary::new(3, 3, 2, 1, vec!["b".into()]);
        assert_eq!(summary.accuracy_percent, 67);
        assert_eq!(SessionSummary::new(0, 0, 0, 0, Vec::new()).accuracy_percent, 0);
    }
}
