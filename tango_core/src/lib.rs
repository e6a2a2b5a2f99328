//! Tango Core - adaptive vocabulary drill engine
//!
//! Builds multiple-choice English/Japanese questions from a word pool, re-asks
//! missed words, and keeps per-session statistics. Unit import and SQLite log
//! storage are provided for callers that want them; the session engine itself
//! does no I/O.

mod config;
mod db;
mod error;
mod progress;
mod questions;
mod session;
mod similarity;
mod units;
mod weight;

#[cfg(feature = "python")]
use pyo3::prelude::*;

pub use config::{AnswerMode, DistractorStrategy, PromptLang, StudyConfig, StudyMode, UserSettings};
pub use db::{
    add_user, get_current_user, get_user_log, get_user_logs, get_user_settings, init_database, init_schema,
    list_users, record_answer, remove_user, set_current_user, set_user_settings, upsert_user_log,
};
pub use error::{DrillError, Result};
pub use progress::{SessionSummary, WordHistory, WordLog};
pub use questions::{
    build_question, generate_confusable_distractors, generate_distractors, Question, VocabItem,
    SELF_CHECK_WRONG_SENTINEL,
};
pub use session::{
    AnswerOutcome, Progress, QuestionPool, Session, SessionHandle, SessionSnapshot, SessionState, SessionStats,
    RECENT_CAPACITY,
};
pub use similarity::{rank_confusable, similarity};
pub use units::{
    flatten_items, load_unit_file, load_unit_index, load_units_by_ids, parse_csv, parse_excel, parse_unit_index,
    resolve_unit_path, ColumnMapping, UnitFile, UnitMeta,
};
pub use weight::{calc_weight, calc_weight_now, pick_by_history, weighted_pick};

/// Tango Core Python Module
#[cfg(feature = "python")]
#[pymodule]
fn tango_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Session engine
    m.add_class::<session::PySession>()?;

    // Pure helpers
    m.add_function(wrap_pyfunction!(weight::py_calc_weight, m)?)?;
    m.add_function(wrap_pyfunction!(similarity::py_similarity, m)?)?;

    // Unit files
    m.add_function(wrap_pyfunction!(units::py_load_unit_file, m)?)?;

    // Learning logs
    m.add_function(wrap_pyfunction!(db::py_init_database, m)?)?;
    m.add_function(wrap_pyfunction!(db::py_get_user_logs, m)?)?;
    m.add_function(wrap_pyfunction!(db::py_record_answer, m)?)?;

    // Register classes
    m.add_class::<questions::VocabItem>()?;
    m.add_class::<questions::Question>()?;
    m.add_class::<config::PromptLang>()?;
    m.add_class::<progress::WordLog>()?;
    m.add_class::<progress::SessionSummary>()?;

    Ok(())
}
