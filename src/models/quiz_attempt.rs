use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::user_response::NewUserResponse;

/// One scored submission against a quiz. Never updated after insert.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuizAttempt {
    pub id: i64,
    pub quiz_id: i64,
    pub attempted_at: DateTime<Utc>,
    pub score: i32,
    /// Question count of the quiz at submission time.
    pub total_questions: i32,
}

/// A fully scored attempt waiting to be committed with its responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttempt {
    pub quiz_id: i64,
    pub score: i32,
    pub total_questions: i32,
    pub responses: Vec<NewUserResponse>,
}
