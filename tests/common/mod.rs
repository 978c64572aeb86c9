#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use chrono::Utc;
use quiz_backend::{
    config::QuizSettings,
    database::quiz_store::QuizStore,
    error::{Error, Result},
    middleware::cors::frontend_cors,
    models::{
        question::{Question, QuestionOption},
        quiz::{NewQuiz, Quiz},
        quiz_attempt::{NewAttempt, QuizAttempt},
        user_response::UserResponse,
    },
    routes,
    services::ai_service::{AIService, ModelClient},
    AppState,
};
use serde_json::Value as JsonValue;
use tower::ServiceExt;

#[derive(Default)]
struct Tables {
    next_id: i64,
    quizzes: Vec<Quiz>,
    attempts: Vec<QuizAttempt>,
    responses: Vec<UserResponse>,
}

impl Tables {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// `QuizStore` kept in memory, with a switch that makes the next attempt fail.
#[derive(Default)]
pub struct InMemoryQuizStore {
    tables: Mutex<Tables>,
    fail_next_attempt: AtomicBool,
}

impl InMemoryQuizStore {
    pub fn fail_next_attempt(&self) {
        self.fail_next_attempt.store(true, Ordering::SeqCst);
    }

    pub fn response_count(&self) -> usize {
        self.tables.lock().unwrap().responses.len()
    }

    pub fn attempt_count(&self) -> usize {
        self.tables.lock().unwrap().attempts.len()
    }
}

#[async_trait]
impl QuizStore for InMemoryQuizStore {
    async fn create_quiz(&self, new_quiz: NewQuiz) -> Result<Quiz> {
        let mut t = self.tables.lock().unwrap();
        let quiz_id = t.id();
        let mut quiz = Quiz {
            id: quiz_id,
            topic: new_quiz.topic,
            created_at: Utc::now(),
            questions: vec![],
        };
        for nq in new_quiz.questions {
            let question_id = t.id();
            let mut question = Question {
                id: question_id,
                quiz_id,
                question_text: nq.question_text,
                question_order: nq.question_order,
                options: vec![],
            };
            for no in nq.options {
                let option_id = t.id();
                question.options.push(QuestionOption {
                    id: option_id,
                    question_id,
                    option_text: no.option_text,
                    option_letter: no.option_letter,
                    is_correct: no.is_correct,
                });
            }
            quiz.questions.push(question);
        }
        t.quizzes.push(quiz.clone());
        Ok(quiz)
    }

    async fn get_quiz(&self, quiz_id: i64) -> Result<Option<Quiz>> {
        let t = self.tables.lock().unwrap();
        Ok(t.quizzes.iter().find(|q| q.id == quiz_id).cloned())
    }

    async fn list_quizzes(&self, limit: i64, offset: i64) -> Result<Vec<Quiz>> {
        let t = self.tables.lock().unwrap();
        let mut quizzes = t.quizzes.clone();
        quizzes.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(quizzes
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn record_attempt(&self, attempt: NewAttempt) -> Result<QuizAttempt> {
        if self.fail_next_attempt.swap(false, Ordering::SeqCst) {
            return Err(Error::Internal("simulated commit failure".into()));
        }
        let mut t = self.tables.lock().unwrap();
        let attempt_id = t.id();
        let stored = QuizAttempt {
            id: attempt_id,
            quiz_id: attempt.quiz_id,
            attempted_at: Utc::now(),
            score: attempt.score,
            total_questions: attempt.total_questions,
        };
        for r in attempt.responses {
            let id = t.id();
            t.responses.push(UserResponse {
                id,
                attempt_id,
                question_id: r.question_id,
                selected_option_id: r.selected_option_id,
                is_correct: r.is_correct,
            });
        }
        t.attempts.push(stored.clone());
        Ok(stored)
    }

    async fn list_attempts(&self, quiz_id: i64) -> Result<Vec<QuizAttempt>> {
        let t = self.tables.lock().unwrap();
        let mut attempts: Vec<QuizAttempt> = t
            .attempts
            .iter()
            .filter(|a| a.quiz_id == quiz_id)
            .cloned()
            .collect();
        attempts.sort_by(|a, b| (b.attempted_at, b.id).cmp(&(a.attempted_at, a.id)));
        Ok(attempts)
    }

    async fn delete_quiz(&self, quiz_id: i64) -> Result<bool> {
        let mut t = self.tables.lock().unwrap();
        let attempt_ids: Vec<i64> = t
            .attempts
            .iter()
            .filter(|a| a.quiz_id == quiz_id)
            .map(|a| a.id)
            .collect();
        t.responses.retain(|r| !attempt_ids.contains(&r.attempt_id));
        t.attempts.retain(|a| a.quiz_id != quiz_id);
        let before = t.quizzes.len();
        t.quizzes.retain(|q| q.id != quiz_id);
        Ok(t.quizzes.len() < before)
    }
}

/// Model that replays queued replies, then reports itself offline.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<anyhow::Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn with_replies<I: IntoIterator<Item = String>>(replies: I) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Ok).collect()),
            prompts: Mutex::new(vec![]),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("model offline")))
    }
}

pub fn two_question_settings() -> QuizSettings {
    QuizSettings {
        default_questions_per_quiz: 2,
        ..QuizSettings::default()
    }
}

pub fn quiz_reply(topic: &str) -> String {
    let body = serde_json::json!({
        "topic": topic,
        "difficulty_level": "medium",
        "questions": [
            {
                "question": "What is 2 + 2?",
                "options": {"A": "3", "B": "4", "C": "5", "D": "22"},
                "correct_answer": "B",
                "explanation": "Basic addition."
            },
            {
                "question": "What is 3 * 3?",
                "options": {"A": "9", "B": "6", "C": "33", "D": "0"},
                "correct_answer": "A",
                "explanation": "Basic multiplication."
            }
        ]
    });
    format!("```json\n{}\n```", body)
}

pub fn build_app(
    store: Arc<InMemoryQuizStore>,
    model: Option<Arc<ScriptedModel>>,
    settings: QuizSettings,
) -> Router {
    let ai_service = model.map(|m| AIService::new(m, settings.clone()));
    let state = AppState::new(store, ai_service, settings);
    routes::create_router(state, frontend_cors("http://localhost:3000"))
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<JsonValue>) -> (u16, JsonValue) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status().as_u16();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };
    (status, json)
}
