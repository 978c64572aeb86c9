use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::question::{Question, QuestionOption};
use crate::models::quiz::Quiz;
use crate::models::quiz_attempt::QuizAttempt;

// --- Model output ---

/// Quiz as produced by the language model, before any business rule is checked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizCandidate {
    pub topic: String,
    #[serde(default)]
    pub difficulty_level: Option<String>,
    pub questions: Vec<QuestionCandidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionCandidate {
    pub question: String,
    /// Label to option text, in the order the model emitted them.
    pub options: IndexMap<String, String>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

// --- Quiz requests / responses ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct QuizCreate {
    #[validate(length(min = 1, message = "Topic must not be empty"))]
    pub topic: String,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuizzesQuery {
    /// Maximum number of quizzes to return (1-100, default 20).
    pub limit: Option<i64>,
    /// Number of quizzes to skip (default 0).
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionOptionResponse {
    pub id: i64,
    pub option_text: String,
    pub option_letter: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionResponse {
    pub id: i64,
    pub question_text: String,
    pub question_order: i32,
    pub options: Vec<QuestionOptionResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuizResponse {
    pub id: i64,
    pub topic: String,
    pub created_at: DateTime<Utc>,
    pub questions: Vec<QuestionResponse>,
}

impl From<QuestionOption> for QuestionOptionResponse {
    fn from(option: QuestionOption) -> Self {
        Self {
            id: option.id,
            option_text: option.option_text,
            option_letter: option.option_letter,
            is_correct: option.is_correct,
        }
    }
}

impl From<Question> for QuestionResponse {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            question_text: question.question_text,
            question_order: question.question_order,
            options: question.options.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Quiz> for QuizResponse {
    fn from(quiz: Quiz) -> Self {
        let mut questions: Vec<QuestionResponse> =
            quiz.questions.into_iter().map(Into::into).collect();
        questions.sort_by_key(|q| q.question_order);
        Self {
            id: quiz.id,
            topic: quiz.topic,
            created_at: quiz.created_at,
            questions,
        }
    }
}

// --- Submissions ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserAnswerSubmission {
    pub question_id: i64,
    pub selected_option_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuizSubmission {
    pub quiz_id: i64,
    #[serde(default)]
    pub answers: Vec<UserAnswerSubmission>,
}

/// Outcome of one answered question, in submission order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct AnswerOutcome {
    pub question_id: i64,
    pub question_text: String,
    pub correct_option: String,
    pub correct_text: String,
    pub user_selected: String,
    pub user_selected_text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct QuizResult {
    pub score: i32,
    pub total_questions: i32,
    pub percentage: f64,
    pub correct_answers: Vec<AnswerOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuizAttemptResponse {
    pub id: i64,
    pub quiz_id: i64,
    pub attempted_at: DateTime<Utc>,
    pub score: i32,
    pub total_questions: i32,
}

impl From<QuizAttempt> for QuizAttemptResponse {
    fn from(attempt: QuizAttempt) -> Self {
        Self {
            id: attempt.id,
            quiz_id: attempt.quiz_id,
            attempted_at: attempt.attempted_at,
            score: attempt.score,
            total_questions: attempt.total_questions,
        }
    }
}

// --- Feedback ---

/// A wrong answer the client wants explained.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Mismatch {
    pub question_id: i64,
    pub question_text: String,
    pub user_selected: String,
    pub user_selected_text: String,
    pub correct_option: String,
    pub correct_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct FeedbackRequest {
    #[validate(length(min = 1, message = "Topic must not be empty"))]
    pub topic: String,
    #[serde(default)]
    pub items: Vec<Mismatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct FeedbackItem {
    pub question_id: i64,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct FeedbackResponse {
    pub items: Vec<FeedbackItem>,
}
