//! Study configuration and persisted user preferences

#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::questions::VocabItem;

/// Direction of a drill: which language is shown and which is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StudyMode {
    #[default]
    #[serde(rename = "en-ja")]
    EnJa,
    #[serde(rename = "ja-en")]
    JaEn,
}

impl StudyMode {
    /// Language the prompt is posed in.
    pub fn prompt_lang(self) -> PromptLang {
        match self {
            StudyMode::EnJa => PromptLang::En,
            StudyMode::JaEn => PromptLang::Ja,
        }
    }
}

#[cfg_attr(feature = "python", pyclass(eq, eq_int))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptLang {
    En,
    Ja,
}

impl PromptLang {
    pub fn opposite(self) -> PromptLang {
        match self {
            PromptLang::En => PromptLang::Ja,
            PromptLang::Ja => PromptLang::En,
        }
    }

    /// The item's surface form in this language.
    pub fn text_of(self, item: &VocabItem) -> &str {
        match self {
            PromptLang::En => &item.en,
            PromptLang::Ja => &item.ja,
        }
    }
}

/// How wrong answer choices are drawn from the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistractorStrategy {
    #[default]
    Random,
    /// Prefer lexically similar near-misses.
    Confusable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnswerMode {
    #[default]
    Choices,
    SelfCheck,
}

/// Input to session creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyConfig {
    #[serde(default)]
    pub items: Vec<VocabItem>,
    #[serde(default)]
    pub mode: StudyMode,
    #[serde(default = "default_question_count")]
    pub question_count: usize,
    #[serde(default = "default_choice_count")]
    pub choice_count: usize,
    #[serde(default)]
    pub distractor_strategy: DistractorStrategy,
}

impl StudyConfig {
    pub fn new(items: Vec<VocabItem>, mode: StudyMode, question_count: usize, choice_count: usize) -> Self {
        Self {
            items,
            mode,
            question_count,
            choice_count,
            distractor_strategy: DistractorStrategy::Random,
        }
    }

    pub fn with_strategy(mut self, strategy: DistractorStrategy) -> Self {
        self.distractor_strategy = strategy;
        self
    }
}

/// Per-user preferences as stored by the settings collaborator.
///
/// `auto_speak` and `tts_rate` only matter to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[serde(default)]
    pub unit_ids: Vec<String>,
    #[serde(default)]
    pub mode: StudyMode,
    #[serde(default)]
    pub answer_mode: AnswerMode,
    #[serde(default = "default_question_count")]
    pub question_count: usize,
    #[serde(default = "default_choice_count")]
    pub choice_count: usize,
    #[serde(default)]
    pub auto_speak: bool,
    #[serde(default = "default_tts_rate")]
    pub tts_rate: f64,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            unit_ids: Vec::new(),
            mode: StudyMode::default(),
            answer_mode: AnswerMode::default(),
            question_count: default_question_count(),
            choice_count: default_choice_count(),
            auto_speak: false,
            tts_rate: default_tts_rate(),
        }
    }
}

impl UserSettings {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Build a session config over an already-loaded item pool.
    pub fn to_study_config(&self, items: Vec<VocabItem>) -> StudyConfig {
        StudyConfig::new(items, self.mode, self.question_count, self.choice_count)
    }
}

fn default_question_count() -> usize {
    10
}

fn default_choice_count() -> usize {
    4
}

fn default_tts_rate() -> f64 {
    0.9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_fill_defaults_from_sparse_json() {
        let settings = UserSettings::from_json(r#"{"unitIds":["u1"],"mode":"ja-en"}"#).unwrap();
        assert_eq!(settings.unit_ids, vec!["u1".to_string()]);
        assert_eq!(settings.mode, StudyMode::JaEn);
        assert_eq!(settings.answer_mode, AnswerMode::Choices);
        assert_eq!(settings.question_count, 10);
        assert_eq!(settings.choice_count, 4);
        assert!((settings.tts_rate - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn answer_mode_uses_kebab_case() {
        let settings = UserSettings::from_json(r#"{"answerMode":"self-check"}"#).unwrap();
        assert_eq!(settings.answer_mode, AnswerMode::SelfCheck);
        assert!(settings.to_json().unwrap().contains("\"self-check\""));
    }

    #[test]
    fn mode_decides_prompt_language() {
        assert_eq!(StudyMode::EnJa.prompt_lang(), PromptLang::En);
        assert_eq!(StudyMode::JaEn.prompt_lang(), PromptLang::Ja);
        assert_eq!(PromptLang::En.opposite(), PromptLang::Ja);
    }

    #[test]
    fn study_config_tolerates_missing_items() {
        let config: StudyConfig = serde_json::from_str(r#"{"mode":"en-ja","questionCount":3}"#).unwrap();
        assert!(config.items.is_empty());
        assert_eq!(config.question_count, 3);
        assert_eq!(config.choice_count, 4);
        assert_eq!(config.distractor_strategy, DistractorStrategy::Random);
    }
}
