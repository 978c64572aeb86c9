pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use crate::config::QuizSettings;
use crate::database::quiz_store::QuizStore;
use crate::services::{
    ai_service::AIService, feedback_service::FeedbackService, quiz_service::QuizService,
};

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: QuizService,
    pub feedback_service: FeedbackService,
    /// `None` when no model is configured.
    pub ai_service: Option<AIService>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn QuizStore>,
        ai_service: Option<AIService>,
        settings: QuizSettings,
    ) -> Self {
        let quiz_service = QuizService::new(store.clone(), ai_service.clone(), settings);
        let feedback_service = FeedbackService::new(store, ai_service.clone());

        Self {
            quiz_service,
            feedback_service,
            ai_service,
        }
    }
}
