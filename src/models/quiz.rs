use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::question::{NewQuestion, Question};

/// A persisted quiz together with its ordered questions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quiz {
    pub id: i64,
    pub topic: String,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Quiz {
    pub fn question(&self, question_id: i64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

/// Quiz aggregate that has been assembled but not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuiz {
    pub topic: String,
    pub questions: Vec<NewQuestion>,
}
