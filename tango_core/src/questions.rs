//! Multiple-choice question generation for vocabulary drills

#[cfg(feature = "python")]
use pyo3::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{DistractorStrategy, PromptLang, StudyMode};
use crate::similarity::rank_confusable;

/// Submitted by self-check answers when a question offers no wrong choice.
pub const SELF_CHECK_WRONG_SENTINEL: &str = "__wrong__";

/// One English/Japanese word pair from a vocabulary unit
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabItem {
    pub id: String,
    pub en: String,
    pub ja: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl VocabItem {
    pub fn new(id: impl Into<String>, en: impl Into<String>, ja: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            en: en.into(),
            ja: ja.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// A question ready to present; plain data, safe to drop unanswered.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub prompt_lang: PromptLang,
    pub prompt_text: String,
    pub correct_en: String,
    pub correct_ja: String,
    pub choices: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl Question {
    /// The expected answer, in the language opposite the prompt.
    pub fn correct_choice(&self) -> &str {
        match self.prompt_lang {
            PromptLang::En => &self.correct_ja,
            PromptLang::Ja => &self.correct_en,
        }
    }

    pub fn is_correct(&self, selected: &str) -> bool {
        selected == self.correct_choice()
    }

    /// Choice to submit for a self-graded answer.
    pub fn self_check_choice(&self, knew_it: bool) -> String {
        if knew_it {
            return self.correct_choice().to_string();
        }
        self.choices
            .iter()
            .find(|choice| !self.is_correct(choice))
            .cloned()
            .unwrap_or_else(|| SELF_CHECK_WRONG_SENTINEL.to_string())
    }
}

/// Candidate answer strings from every item except `correct_id`.
///
/// Blank strings and the correct item's own answer text are skipped so a
/// question can never show the right answer twice.
fn candidate_answers<'a>(pool: &'a [VocabItem], correct_id: &str, answer_lang: PromptLang) -> Vec<&'a str> {
    let correct_text = pool
        .iter()
        .find(|item| item.id == correct_id)
        .map(|item| answer_lang.text_of(item));

    pool.iter()
        .filter(|item| item.id != correct_id)
        .map(|item| answer_lang.text_of(item))
        .filter(|text| !text.is_empty() && Some(*text) != correct_text)
        .collect()
}

fn take_distinct<'a>(candidates: impl IntoIterator<Item = &'a str>, count: usize) -> Vec<String> {
    let mut distractors: Vec<String> = Vec::with_capacity(count);
    for candidate in candidates {
        if distractors.len() >= count {
            break;
        }
        if !distractors.iter().any(|d| d == candidate) {
            distractors.push(candidate.to_string());
        }
    }
    distractors
}

/// Up to `count` distinct wrong answers in random order.
///
/// Answers are drawn from the language opposite `prompt_lang`. A pool with
/// too few distinct answers yields a shorter list.
pub fn generate_distractors<R>(
    pool: &[VocabItem],
    correct_id: &str,
    prompt_lang: PromptLang,
    count: usize,
    rng: &mut R,
) -> Vec<String>
where
    R: Rng + ?Sized,
{
    let mut candidates = candidate_answers(pool, correct_id, prompt_lang.opposite());
    candidates.shuffle(rng);
    take_distinct(candidates, count)
}

/// Like [`generate_distractors`], but near-miss spellings of the correct
/// answer come first.
pub fn generate_confusable_distractors<R>(
    pool: &[VocabItem],
    correct_id: &str,
    prompt_lang: PromptLang,
    count: usize,
    rng: &mut R,
) -> Vec<String>
where
    R: Rng + ?Sized,
{
    let answer_lang = prompt_lang.opposite();
    let Some(correct) = pool.iter().find(|item| item.id == correct_id) else {
        return generate_distractors(pool, correct_id, prompt_lang, count, rng);
    };

    let mut candidates: Vec<String> = candidate_answers(pool, correct_id, answer_lang)
        .into_iter()
        .map(str::to_string)
        .collect();
    candidates.shuffle(rng);
    rank_confusable(answer_lang.text_of(correct), &mut candidates);
    take_distinct(candidates.iter().map(String::as_str), count)
}

/// Build the question for `item` under the given mode.
///
/// Choices are the correct answer plus up to `choice_count - 1` distractors,
/// shuffled. A small pool can leave fewer than `choice_count` choices.
pub fn build_question<R>(
    pool: &[VocabItem],
    item: &VocabItem,
    mode: StudyMode,
    choice_count: usize,
    strategy: DistractorStrategy,
    rng: &mut R,
) -> Question
where
    R: Rng + ?Sized,
{
    let prompt_lang = mode.prompt_lang();
    let correct_choice = prompt_lang.opposite().text_of(item).to_string();
    let wanted = choice_count.saturating_sub(1);

    let distractors = match strategy {
        DistractorStrategy::Random => generate_distractors(pool, &item.id, prompt_lang, wanted, rng),
        DistractorStrategy::Confusable => generate_confusable_distractors(pool, &item.id, prompt_lang, wanted, rng),
    };

    let mut choices = Vec::with_capacity(distractors.len() + 1);
    choices.push(correct_choice);
    choices.extend(distractors);
    choices.shuffle(rng);
    choices.truncate(choice_count);

    Question {
        id: item.id.clone(),
        prompt_lang,
        prompt_text: prompt_lang.text_of(item).to_string(),
        correct_en: item.en.clone(),
        correct_ja: item.ja.clone(),
        choices,
        hint: item.hint.clone(),
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl VocabItem {
    #[new]
    #[pyo3(signature = (id, en, ja, hint=None))]
    fn py_new(id: String, en: String, ja: String, hint: Option<String>) -> Self {
        Self { id, en, ja, hint }
    }

    fn __repr__(&self) -> String {
        format!("VocabItem(id='{}', en='{}', ja='{}')", self.id, self.en, self.ja)
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl Question {
    #[getter(correct_choice)]
    fn py_correct_choice(&self) -> String {
        self.correct_choice().to_string()
    }

    fn __repr__(&self) -> String {
        format!(
            "Question(id='{}', prompt='{}', choices={})",
            self.id,
            self.prompt_text.chars().take(40).collect::<String>(),
            self.choices.len()
        )
    }
}
