//! Adaptive drill session: question selection and answer scoring
//!
//! A [`Session`] walks a shuffled item pool, re-asks missed items as soon as
//! they fall out of the recency window, and stops after a fixed number of
//! answers. [`SessionHandle`] holds at most one live session for a caller.

use std::collections::{BTreeMap, VecDeque};

#[cfg(feature = "python")]
use pyo3::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{DistractorStrategy, StudyConfig, StudyMode};
use crate::error::{DrillError, Result};
use crate::progress::SessionSummary;
use crate::questions::{build_question, Question, VocabItem};

/// How many recently shown ids are held back from selection.
pub const RECENT_CAPACITY: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.done >= self.total
    }
}

/// Item ids waiting to be asked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPool {
    /// Not yet presented, in shuffled order.
    pub remaining_ids: VecDeque<String>,
    /// Missed and not yet re-asked, oldest first. No duplicates.
    pub wrong_queue: VecDeque<String>,
    /// Most recent first, at most [`RECENT_CAPACITY`] entries.
    pub recent_ids: VecDeque<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub correct: usize,
    pub wrong: usize,
    /// Miss count per item id.
    pub wrong_ids: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub correct: bool,
}

/// Lifecycle of a [`SessionHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Active,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    WrongQueue,
    Fresh,
    Fallback,
}

/// Serializable image of a session, for callers that persist or resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub items: Vec<VocabItem>,
    pub mode: StudyMode,
    pub question_count: usize,
    pub choice_count: usize,
    #[serde(default)]
    pub distractor_strategy: DistractorStrategy,
    pub progress: Progress,
    pub pool: QuestionPool,
    pub stats: SessionStats,
    #[serde(default)]
    pub pending_id: Option<String>,
}

/// One bounded run of questions over a fixed item pool.
#[derive(Debug, Clone)]
pub struct Session<R = StdRng> {
    items: Vec<VocabItem>,
    mode: StudyMode,
    question_count: usize,
    choice_count: usize,
    distractor_strategy: DistractorStrategy,
    progress: Progress,
    pool: QuestionPool,
    stats: SessionStats,
    /// Id of the issued question still awaiting an answer.
    pending: Option<String>,
    rng: R,
}

impl Session<StdRng> {
    pub fn new(config: StudyConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl<R: Rng> Session<R> {
    /// Create a session drawing all randomness from `rng`.
    pub fn with_rng(config: StudyConfig, rng: R) -> Self {
        let question_count = config.question_count.max(1);
        let mut session = Self {
            items: config.items,
            mode: config.mode,
            question_count,
            choice_count: config.choice_count.max(2),
            distractor_strategy: config.distractor_strategy,
            progress: Progress {
                done: 0,
                total: question_count,
            },
            pool: QuestionPool::default(),
            stats: SessionStats::default(),
            pending: None,
            rng,
        };
        session.reset();
        debug!(
            items = session.items.len(),
            total = session.progress.total,
            mode = ?session.mode,
            "created drill session"
        );
        session
    }

    /// Start over with the same items and settings.
    pub fn restart(&mut self) {
        self.reset();
        debug!(items = self.items.len(), "restarted drill session");
    }

    fn reset(&mut self) {
        let mut ids: Vec<String> = self
            .items
            .iter()
            .filter(|item| !item.id.is_empty())
            .map(|item| item.id.clone())
            .collect();
        ids.shuffle(&mut self.rng);

        self.progress = Progress {
            done: 0,
            total: self.question_count,
        };
        self.pool = QuestionPool {
            remaining_ids: ids.into(),
            wrong_queue: VecDeque::new(),
            recent_ids: VecDeque::with_capacity(RECENT_CAPACITY + 1),
        };
        self.stats = SessionStats::default();
        self.pending = None;
    }

    /// Rebuild a session from a snapshot, repairing broken invariants.
    pub fn restore(snapshot: SessionSnapshot, rng: R) -> Self {
        let total = snapshot.question_count.max(1);
        let items = snapshot.items;
        let known = |id: &String| !id.is_empty() && items.iter().any(|item| item.id == *id);

        let mut pool = snapshot.pool;
        pool.recent_ids.truncate(RECENT_CAPACITY);
        pool.remaining_ids.retain(|id| known(id));

        let mut wrong_queue = VecDeque::with_capacity(pool.wrong_queue.len());
        for id in pool.wrong_queue {
            if known(&id) && !wrong_queue.contains(&id) {
                wrong_queue.push_back(id);
            }
        }
        pool.wrong_queue = wrong_queue;

        let pending = snapshot.pending_id.filter(|id| known(id));

        Self {
            items,
            mode: snapshot.mode,
            question_count: total,
            choice_count: snapshot.choice_count.max(2),
            distractor_strategy: snapshot.distractor_strategy,
            progress: Progress {
                done: snapshot.progress.done.min(total),
                total,
            },
            pool,
            stats: snapshot.stats,
            pending,
            rng,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            items: self.items.clone(),
            mode: self.mode,
            question_count: self.question_count,
            choice_count: self.choice_count,
            distractor_strategy: self.distractor_strategy,
            progress: self.progress,
            pool: self.pool.clone(),
            stats: self.stats.clone(),
            pending_id: self.pending.clone(),
        }
    }

    /// Produce the next question, or `None` once the session is exhausted.
    ///
    /// Missed items come first, then unseen ones, then a random item outside
    /// the recency window. Does not advance progress.
    pub fn next_question(&mut self) -> Option<Question> {
        if self.progress.is_complete() {
            return None;
        }

        let (id, via) = self.pick_next_id()?;
        let Some(item) = self.items.iter().find(|item| item.id == id) else {
            warn!(id = %id, "selected id is not in the item pool");
            return None;
        };

        let question = build_question(
            &self.items,
            item,
            self.mode,
            self.choice_count,
            self.distractor_strategy,
            &mut self.rng,
        );

        self.pool.recent_ids.push_front(id.clone());
        self.pool.recent_ids.truncate(RECENT_CAPACITY);
        debug!(id = %id, via = ?via, choices = question.choices.len(), "issued question");
        self.pending = Some(id);

        Some(question)
    }

    fn pick_next_id(&mut self) -> Option<(String, Selection)> {
        let recent = &self.pool.recent_ids;
        let missed = self.pool.wrong_queue.iter().position(|id| !recent.contains(id));
        if let Some(id) = missed.and_then(|pos| self.pool.wrong_queue.remove(pos)) {
            return Some((id, Selection::WrongQueue));
        }

        while let Some(id) = self.pool.remaining_ids.pop_front() {
            if !self.pool.recent_ids.contains(&id) {
                return Some((id, Selection::Fresh));
            }
        }

        let recent = &self.pool.recent_ids;
        let candidates: Vec<&VocabItem> = self
            .items
            .iter()
            .filter(|item| !item.id.is_empty() && !recent.contains(&item.id))
            .collect();
        let picked = match candidates.choose(&mut self.rng) {
            Some(item) => *item,
            None => self.items.first().filter(|item| !item.id.is_empty())?,
        };
        Some((picked.id.clone(), Selection::Fallback))
    }

    /// Score `selected` against the pending question.
    ///
    /// Only the most recently issued question can be answered, and only once;
    /// anything else is rejected with [`DrillError::StaleQuestion`].
    pub fn answer_question(&mut self, question: &Question, selected: &str) -> Result<AnswerOutcome> {
        if self.pending.as_deref() != Some(question.id.as_str()) {
            return Err(DrillError::StaleQuestion {
                expected: self.pending.clone(),
                got: question.id.clone(),
            });
        }
        self.pending = None;

        let correct = question.is_correct(selected);
        if correct {
            self.stats.correct += 1;
        } else {
            self.stats.wrong += 1;
            *self.stats.wrong_ids.entry(question.id.clone()).or_insert(0) += 1;
            if !self.pool.wrong_queue.contains(&question.id) {
                self.pool.wrong_queue.push_back(question.id.clone());
            }
        }
        self.progress.done += 1;

        debug!(
            id = %question.id,
            correct,
            done = self.progress.done,
            total = self.progress.total,
            "recorded answer"
        );
        Ok(AnswerOutcome { correct })
    }

    /// Answer by self-assessment instead of picking a choice.
    pub fn answer_self_check(&mut self, question: &Question, knew_it: bool) -> Result<AnswerOutcome> {
        let choice = question.self_check_choice(knew_it);
        self.answer_question(question, &choice)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary::new(
            self.progress.total,
            self.progress.done,
            self.stats.correct,
            self.stats.wrong,
            self.stats.wrong_ids.keys().cloned().collect(),
        )
    }

    pub fn is_exhausted(&self) -> bool {
        self.progress.is_complete()
    }
}

impl<R> Session<R> {
    pub fn items(&self) -> &[VocabItem] {
        &self.items
    }

    pub fn mode(&self) -> StudyMode {
        self.mode
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub fn choice_count(&self) -> usize {
        self.choice_count
    }

    pub fn distractor_strategy(&self) -> DistractorStrategy {
        self.distractor_strategy
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn pool(&self) -> &QuestionPool {
        &self.pool
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn pending_id(&self) -> Option<&str> {
        self.pending.as_deref()
    }
}

/// Caller-owned slot holding the one live session.
///
/// Creating a session replaces the previous one outright. The handle does no
/// locking; share it across threads only behind the caller's own mutex.
#[derive(Debug, Clone)]
pub struct SessionHandle<R = StdRng> {
    current: Option<Session<R>>,
}

impl<R> Default for SessionHandle<R> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl SessionHandle<StdRng> {
    pub fn make_session(&mut self, config: StudyConfig) -> &Session<StdRng> {
        self.make_session_with_rng(config, StdRng::from_entropy())
    }
}

impl<R: Rng> SessionHandle<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make_session_with_rng(&mut self, config: StudyConfig, rng: R) -> &Session<R> {
        if self.current.is_some() {
            debug!("discarding previous session");
        }
        self.current.insert(Session::with_rng(config, rng))
    }

    pub fn get_session(&self) -> Result<&Session<R>> {
        self.current.as_ref().ok_or(DrillError::UninitializedSession)
    }

    fn session_mut(&mut self) -> Result<&mut Session<R>> {
        self.current.as_mut().ok_or(DrillError::UninitializedSession)
    }

    pub fn next_question(&mut self) -> Result<Option<Question>> {
        Ok(self.session_mut()?.next_question())
    }

    pub fn answer_question(&mut self, question: &Question, selected: &str) -> Result<AnswerOutcome> {
        self.session_mut()?.answer_question(question, selected)
    }

    pub fn answer_self_check(&mut self, question: &Question, knew_it: bool) -> Result<AnswerOutcome> {
        self.session_mut()?.answer_self_check(question, knew_it)
    }

    pub fn restart(&mut self) -> Result<()> {
        self.session_mut()?.restart();
        Ok(())
    }

    pub fn clear_session(&mut self) {
        self.current = None;
    }

    pub fn state(&self) -> SessionState {
        match &self.current {
            None => SessionState::Uninitialized,
            Some(session) if session.is_exhausted() => SessionState::Exhausted,
            Some(_) => SessionState::Active,
        }
    }
}

// ============= Python Bindings =============

#[cfg(feature = "python")]
#[pyclass(unsendable, name = "Session")]
#[derive(Default)]
pub struct PySession {
    handle: SessionHandle,
}

#[cfg(feature = "python")]
#[pymethods]
impl PySession {
    #[new]
    fn py_new() -> Self {
        Self::default()
    }

    #[pyo3(signature = (items, mode="en-ja", question_count=10, choice_count=4, confusable=false))]
    fn make_session(
        &mut self,
        items: Vec<VocabItem>,
        mode: &str,
        question_count: usize,
        choice_count: usize,
        confusable: bool,
    ) -> PyResult<()> {
        let mode = match mode {
            "en-ja" => StudyMode::EnJa,
            "ja-en" => StudyMode::JaEn,
            other => {
                return Err(pyo3::exceptions::PyValueError::new_err(format!(
                    "unknown study mode: {other}"
                )))
            }
        };
        let strategy = if confusable {
            DistractorStrategy::Confusable
        } else {
            DistractorStrategy::Random
        };
        let config = StudyConfig::new(items, mode, question_count, choice_count).with_strategy(strategy);
        self.handle.make_session(config);
        Ok(())
    }

    fn next_question(&mut self) -> PyResult<Option<Question>> {
        Ok(self.handle.next_question()?)
    }

    fn answer_question(&mut self, question: Question, selected: &str) -> PyResult<bool> {
        Ok(self.handle.answer_question(&question, selected)?.correct)
    }

    fn answer_self_check(&mut self, question: Question, knew_it: bool) -> PyResult<bool> {
        Ok(self.handle.answer_self_check(&question, knew_it)?.correct)
    }

    fn restart(&mut self) -> PyResult<()> {
        Ok(self.handle.restart()?)
    }

    fn clear_session(&mut self) {
        self.handle.clear_session();
    }

    /// `(done, total)` of the live session.
    fn progress(&self) -> PyResult<(usize, usize)> {
        let progress = self.handle.get_session()?.progress();
        Ok((progress.done, progress.total))
    }

    fn summary(&self) -> PyResult<SessionSummary> {
        Ok(self.handle.get_session()?.summary())
    }

    fn snapshot_json(&self) -> PyResult<String> {
        let snapshot = self.handle.get_session()?.snapshot();
        Ok(serde_json::to_string(&snapshot).map_err(DrillError::from)?)
    }
}
