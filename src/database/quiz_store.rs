use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::Result;
use crate::models::question::{Question, QuestionOption};
use crate::models::quiz::{NewQuiz, Quiz};
use crate::models::quiz_attempt::{NewAttempt, QuizAttempt};

/// Persistence for quiz aggregates and their attempt history. Every write
/// runs in its own transaction and either commits fully or not at all.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn create_quiz(&self, quiz: NewQuiz) -> Result<Quiz>;

    /// Loads a quiz with its questions (by order index) and their options.
    async fn get_quiz(&self, quiz_id: i64) -> Result<Option<Quiz>>;

    /// Newest quizzes first.
    async fn list_quizzes(&self, limit: i64, offset: i64) -> Result<Vec<Quiz>>;

    async fn record_attempt(&self, attempt: NewAttempt) -> Result<QuizAttempt>;

    /// Newest attempts first.
    async fn list_attempts(&self, quiz_id: i64) -> Result<Vec<QuizAttempt>>;

    /// Removes the quiz and everything it owns. Returns false if it did not exist.
    async fn delete_quiz(&self, quiz_id: i64) -> Result<bool>;
}

#[derive(Clone)]
pub struct PgQuizStore {
    pool: PgPool,
}

impl PgQuizStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_questions(&self, quiz_ids: &[i64]) -> Result<HashMap<i64, Vec<Question>>> {
        if quiz_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, quiz_id, question_text, question_order
            FROM questions
            WHERE quiz_id = ANY($1)
            ORDER BY quiz_id, question_order
            "#,
        )
        .bind(quiz_ids)
        .fetch_all(&self.pool)
        .await?;

        let question_ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
        let options = sqlx::query_as::<_, QuestionOption>(
            r#"
            SELECT id, question_id, option_text, option_letter, is_correct
            FROM question_options
            WHERE question_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&question_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut options_by_question: HashMap<i64, Vec<QuestionOption>> = HashMap::new();
        for option in options {
            options_by_question
                .entry(option.question_id)
                .or_default()
                .push(option);
        }

        let mut by_quiz: HashMap<i64, Vec<Question>> = HashMap::new();
        for mut question in questions {
            question.options = options_by_question.remove(&question.id).unwrap_or_default();
            by_quiz.entry(question.quiz_id).or_default().push(question);
        }
        Ok(by_quiz)
    }
}

#[async_trait]
impl QuizStore for PgQuizStore {
    async fn create_quiz(&self, new_quiz: NewQuiz) -> Result<Quiz> {
        let mut tx = self.pool.begin().await?;

        let mut quiz = sqlx::query_as::<_, Quiz>(
            r#"INSERT INTO quizzes (topic) VALUES ($1) RETURNING id, topic, created_at"#,
        )
        .bind(&new_quiz.topic)
        .fetch_one(&mut *tx)
        .await?;

        for new_question in new_quiz.questions {
            let mut question = sqlx::query_as::<_, Question>(
                r#"
                INSERT INTO questions (quiz_id, question_text, question_order)
                VALUES ($1, $2, $3)
                RETURNING id, quiz_id, question_text, question_order
                "#,
            )
            .bind(quiz.id)
            .bind(&new_question.question_text)
            .bind(new_question.question_order)
            .fetch_one(&mut *tx)
            .await?;

            for new_option in new_question.options {
                let option = sqlx::query_as::<_, QuestionOption>(
                    r#"
                    INSERT INTO question_options (question_id, option_text, option_letter, is_correct)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id, question_id, option_text, option_letter, is_correct
                    "#,
                )
                .bind(question.id)
                .bind(&new_option.option_text)
                .bind(&new_option.option_letter)
                .bind(new_option.is_correct)
                .fetch_one(&mut *tx)
                .await?;
                question.options.push(option);
            }

            quiz.questions.push(question);
        }

        tx.commit().await?;
        tracing::info!(quiz_id = quiz.id, topic = %quiz.topic, "Stored quiz");
        Ok(quiz)
    }

    async fn get_quiz(&self, quiz_id: i64) -> Result<Option<Quiz>> {
        let quiz = sqlx::query_as::<_, Quiz>(
            r#"SELECT id, topic, created_at FROM quizzes WHERE id = $1"#,
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut quiz) = quiz else {
            return Ok(None);
        };
        quiz.questions = self
            .load_questions(&[quiz.id])
            .await?
            .remove(&quiz.id)
            .unwrap_or_default();
        Ok(Some(quiz))
    }

    async fn list_quizzes(&self, limit: i64, offset: i64) -> Result<Vec<Quiz>> {
        let mut quizzes = sqlx::query_as::<_, Quiz>(
            r#"
            SELECT id, topic, created_at
            FROM quizzes
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = quizzes.iter().map(|q| q.id).collect();
        let mut questions = self.load_questions(&ids).await?;
        for quiz in &mut quizzes {
            quiz.questions = questions.remove(&quiz.id).unwrap_or_default();
        }
        Ok(quizzes)
    }

    async fn record_attempt(&self, attempt: NewAttempt) -> Result<QuizAttempt> {
        let mut tx = self.pool.begin().await?;

        let stored = sqlx::query_as::<_, QuizAttempt>(
            r#"
            INSERT INTO quiz_attempts (quiz_id, score, total_questions)
            VALUES ($1, $2, $3)
            RETURNING id, quiz_id, attempted_at, score, total_questions
            "#,
        )
        .bind(attempt.quiz_id)
        .bind(attempt.score)
        .bind(attempt.total_questions)
        .fetch_one(&mut *tx)
        .await?;

        for response in &attempt.responses {
            sqlx::query(
                r#"
                INSERT INTO user_responses (attempt_id, question_id, selected_option_id, is_correct)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(stored.id)
            .bind(response.question_id)
            .bind(response.selected_option_id)
            .bind(response.is_correct)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!(
            quiz_id = stored.quiz_id,
            attempt_id = stored.id,
            score = stored.score,
            total = stored.total_questions,
            "Recorded quiz attempt"
        );
        Ok(stored)
    }

    async fn list_attempts(&self, quiz_id: i64) -> Result<Vec<QuizAttempt>> {
        let attempts = sqlx::query_as::<_, QuizAttempt>(
            r#"
            SELECT id, quiz_id, attempted_at, score, total_questions
            FROM quiz_attempts
            WHERE quiz_id = $1
            ORDER BY attempted_at DESC, id DESC
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(attempts)
    }

    async fn delete_quiz(&self, quiz_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        delete_quiz_aggregate(&mut tx, quiz_id).await?;
        let deleted = sqlx::query(r#"DELETE FROM quizzes WHERE id = $1"#)
            .bind(quiz_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        if deleted > 0 {
            tracing::info!(quiz_id, "Deleted quiz and its attempts");
        }
        Ok(deleted > 0)
    }
}

/// Children go first: responses, attempts, options, questions.
async fn delete_quiz_aggregate(tx: &mut Transaction<'_, Postgres>, quiz_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM user_responses
        WHERE attempt_id IN (SELECT id FROM quiz_attempts WHERE quiz_id = $1)
        "#,
    )
    .bind(quiz_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query(r#"DELETE FROM quiz_attempts WHERE quiz_id = $1"#)
        .bind(quiz_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        r#"
        DELETE FROM question_options
        WHERE question_id IN (SELECT id FROM questions WHERE quiz_id = $1)
        "#,
    )
    .bind(quiz_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query(r#"DELETE FROM questions WHERE quiz_id = $1"#)
        .bind(quiz_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}
