use std::collections::BTreeSet;

use crate::config::QuizSettings;
use crate::dto::quiz_dto::QuizCandidate;

/// First business rule a candidate breaks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuizViolation {
    #[error("topic {0:?} is not allowed")]
    InvalidTopic(String),
    #[error("expected {expected} questions, got {actual}")]
    QuestionCount { expected: usize, actual: usize },
    #[error("question {index} has empty text")]
    EmptyQuestion { index: usize },
    #[error("question {index} has {actual} options, expected {expected}")]
    OptionCount {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("question {index} has incorrect option labels: {labels:?}")]
    OptionLabels { index: usize, labels: Vec<String> },
    #[error("question {index} correct answer {answer:?} not in options")]
    CorrectAnswer { index: usize, answer: String },
    #[error("question {index}, option {label} has empty text")]
    EmptyOption { index: usize, label: String },
}

#[derive(Debug, Clone)]
pub struct QuizValidator {
    settings: QuizSettings,
}

impl QuizValidator {
    pub fn new(settings: QuizSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    pub fn validate_topic(&self, topic: &str) -> bool {
        if topic.trim().is_empty() {
            return false;
        }
        if topic.chars().count() > self.settings.max_topic_length {
            return false;
        }
        let lowered = topic.to_lowercase();
        self.settings
            .blocked_topic_terms
            .iter()
            .all(|term| !lowered.contains(&term.to_lowercase()))
    }

    /// Accepts the candidate only if every rule holds; nothing is repaired.
    pub fn accept(&self, candidate: &QuizCandidate, expected_questions: usize) -> bool {
        match self.check(candidate, expected_questions) {
            Ok(()) => {
                tracing::info!(topic = %candidate.topic, "Quiz validation passed all business rules");
                true
            }
            Err(violation) => {
                tracing::warn!(topic = %candidate.topic, %violation, "Generated quiz rejected");
                false
            }
        }
    }

    pub fn check(
        &self,
        candidate: &QuizCandidate,
        expected_questions: usize,
    ) -> Result<(), QuizViolation> {
        if !self.validate_topic(&candidate.topic) {
            return Err(QuizViolation::InvalidTopic(candidate.topic.clone()));
        }

        if candidate.questions.len() != expected_questions {
            return Err(QuizViolation::QuestionCount {
                expected: expected_questions,
                actual: candidate.questions.len(),
            });
        }

        let canonical: BTreeSet<&str> = self
            .settings
            .option_labels
            .iter()
            .map(String::as_str)
            .collect();

        for (i, question) in candidate.questions.iter().enumerate() {
            let index = i + 1;

            if question.question.trim().is_empty() {
                return Err(QuizViolation::EmptyQuestion { index });
            }

            if question.options.len() != self.settings.options_per_question {
                return Err(QuizViolation::OptionCount {
                    index,
                    expected: self.settings.options_per_question,
                    actual: question.options.len(),
                });
            }

            let labels: BTreeSet<&str> = question.options.keys().map(String::as_str).collect();
            if labels != canonical {
                return Err(QuizViolation::OptionLabels {
                    index,
                    labels: question.options.keys().cloned().collect(),
                });
            }

            if !question.options.contains_key(&question.correct_answer) {
                return Err(QuizViolation::CorrectAnswer {
                    index,
                    answer: question.correct_answer.clone(),
                });
            }

            if let Some((label, _)) = question
                .options
                .iter()
                .find(|(_, text)| text.trim().is_empty())
            {
                return Err(QuizViolation::EmptyOption {
                    index,
                    label: label.clone(),
                });
            }
        }

        Ok(())
    }
}
