use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub frontend_url: String,
    pub model_timeout_secs: u64,
    pub quiz: QuizSettings,
}

/// Rules the generation pipeline and validator work against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    pub default_questions_per_quiz: usize,
    pub options_per_question: usize,
    pub max_topic_length: usize,
    pub option_labels: Vec<String>,
    pub blocked_topic_terms: Vec<String>,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            default_questions_per_quiz: 5,
            options_per_question: 4,
            max_topic_length: 100,
            option_labels: ["A", "B", "C", "D"].iter().map(|l| l.to_string()).collect(),
            blocked_topic_terms: ["explicit", "nsfw", "adult", "violence"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl QuizSettings {
    /// Every question is checked against the full label set, so the label
    /// count must equal the option count.
    pub fn ensure_consistent(&self) -> Result<()> {
        if self.option_labels.len() != self.options_per_question {
            return Err(Error::Config(format!(
                "OPTION_LABELS has {} labels but DEFAULT_OPTIONS_PER_QUESTION is {}",
                self.option_labels.len(),
                self.options_per_question
            )));
        }
        Ok(())
    }
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let defaults = QuizSettings::default();
        let quiz = QuizSettings {
            default_questions_per_quiz: get_env_parse_or(
                "DEFAULT_QUESTIONS_PER_QUIZ",
                defaults.default_questions_per_quiz,
            )?,
            options_per_question: get_env_parse_or(
                "DEFAULT_OPTIONS_PER_QUESTION",
                defaults.options_per_question,
            )?,
            max_topic_length: get_env_parse_or("MAX_TOPIC_LENGTH", defaults.max_topic_length)?,
            option_labels: match env::var("OPTION_LABELS") {
                Ok(raw) => parse_labels(&raw)?,
                Err(_) => defaults.option_labels,
            },
            blocked_topic_terms: match env::var("BLOCKED_TOPIC_TERMS") {
                Ok(raw) => raw
                    .split(',')
                    .map(|t| t.trim().to_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect(),
                Err(_) => defaults.blocked_topic_terms,
            },
        };

        quiz.ensure_consistent()?;

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "127.0.0.1:8000"),
            database_url: get_env("DATABASE_URL")?,
            gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            gemini_model: get_env_or("GEMINI_MODEL", "gemini-2.5-flash"),
            gemini_base_url: get_env_or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            frontend_url: get_env_or("FRONTEND_URL", "http://localhost:3000"),
            model_timeout_secs: get_env_parse_or("MODEL_TIMEOUT_SECS", 120)?,
            quiz,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

/// `ABCD` or `A,B,C,D` both describe the same label set.
fn parse_labels(raw: &str) -> Result<Vec<String>> {
    let labels: Vec<String> = if raw.contains(',') {
        raw.split(',').map(|l| l.trim().to_string()).collect()
    } else {
        raw.trim().chars().map(|c| c.to_string()).collect()
    };

    if labels.is_empty() || labels.iter().any(|l| l.chars().count() != 1) {
        return Err(Error::Config(format!(
            "Invalid value for OPTION_LABELS: {:?} (expected single-character labels)",
            raw
        )));
    }
    Ok(labels)
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_accept_compact_and_comma_forms() {
        assert_eq!(parse_labels("ABCD").unwrap(), vec!["A", "B", "C", "D"]);
        assert_eq!(parse_labels("A, B, C").unwrap(), vec!["A", "B", "C"]);
    }

    #[test]
    fn multi_character_labels_are_rejected() {
        assert!(parse_labels("A,BB,C").is_err());
        assert!(parse_labels("").is_err());
    }

    #[test]
    fn option_count_must_match_label_count() {
        assert!(QuizSettings::default().ensure_consistent().is_ok());

        let five_options = QuizSettings {
            options_per_question: 5,
            ..QuizSettings::default()
        };
        assert!(matches!(
            five_options.ensure_consistent(),
            Err(Error::Config(msg)) if msg.contains("DEFAULT_OPTIONS_PER_QUESTION is 5")
        ));

        let five_labels = QuizSettings {
            options_per_question: 5,
            option_labels: parse_labels("ABCDE").unwrap(),
            ..QuizSettings::default()
        };
        assert!(five_labels.ensure_consistent().is_ok());
    }

    #[test]
    fn default_settings_match_canonical_quiz_shape() {
        let settings = QuizSettings::default();
        assert_eq!(settings.default_questions_per_quiz, 5);
        assert_eq!(settings.options_per_question, 4);
        assert_eq!(settings.max_topic_length, 100);
        assert_eq!(settings.option_labels.len(), settings.options_per_question);
    }
}
