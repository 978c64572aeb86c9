use std::collections::HashMap;
use std::sync::Arc;

use crate::database::quiz_store::QuizStore;
use crate::dto::quiz_dto::{FeedbackItem, FeedbackRequest, FeedbackResponse, Mismatch};
use crate::error::Result;
use crate::services::ai_service::AIService;
use crate::services::quiz_service::quiz_not_found;

#[derive(Clone)]
pub struct FeedbackService {
    store: Arc<dyn QuizStore>,
    ai_service: Option<AIService>,
}

impl FeedbackService {
    pub fn new(store: Arc<dyn QuizStore>, ai_service: Option<AIService>) -> Self {
        Self { store, ai_service }
    }

    /// Explains every mismatch. Model output is preferred; anything the model
    /// cannot provide is filled with a templated explanation.
    pub async fn explain(&self, quiz_id: i64, request: &FeedbackRequest) -> Result<FeedbackResponse> {
        if self.store.get_quiz(quiz_id).await?.is_none() {
            return Err(quiz_not_found(quiz_id));
        }

        if request.items.is_empty() {
            return Ok(FeedbackResponse { items: vec![] });
        }

        let generated = match &self.ai_service {
            Some(ai) => ai
                .explain_incorrect_answers(&request.topic, &request.items)
                .await
                .unwrap_or_default(),
            None => {
                tracing::debug!(quiz_id, "Model unavailable, using templated feedback");
                Vec::new()
            }
        };

        let mut by_question: HashMap<i64, String> = generated
            .into_iter()
            .filter(|item| !item.explanation.trim().is_empty())
            .map(|item| (item.question_id, item.explanation))
            .collect();

        let items = request
            .items
            .iter()
            .map(|mismatch| FeedbackItem {
                question_id: mismatch.question_id,
                explanation: by_question
                    .remove(&mismatch.question_id)
                    .unwrap_or_else(|| fallback_explanation(mismatch)),
            })
            .collect();

        Ok(FeedbackResponse { items })
    }
}

pub fn fallback_explanation(mismatch: &Mismatch) -> String {
    format!(
        "You chose {}. {}. The correct answer is {}. {}.",
        mismatch.user_selected,
        mismatch.user_selected_text,
        mismatch.correct_option,
        mismatch.correct_text
    )
}
