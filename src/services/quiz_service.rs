use std::sync::Arc;

use crate::config::QuizSettings;
use crate::database::quiz_store::QuizStore;
use crate::dto::quiz_dto::{QuizResult, QuizSubmission};
use crate::error::{Error, Result};
use crate::models::quiz::Quiz;
use crate::models::quiz_attempt::QuizAttempt;
use crate::services::ai_service::AIService;
use crate::services::assembly_service::AssemblyService;
use crate::services::grading_service::GradingService;
use crate::services::validation_service::QuizValidator;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct QuizService {
    store: Arc<dyn QuizStore>,
    ai_service: Option<AIService>,
    validator: QuizValidator,
}

impl QuizService {
    pub fn new(
        store: Arc<dyn QuizStore>,
        ai_service: Option<AIService>,
        settings: QuizSettings,
    ) -> Self {
        Self {
            store,
            ai_service,
            validator: QuizValidator::new(settings),
        }
    }

    /// Topic -> model -> validator -> assembler -> store.
    pub async fn generate_quiz(&self, topic: &str) -> Result<Quiz> {
        if !self.validator.validate_topic(topic) {
            tracing::warn!(topic, "Invalid topic provided");
            return Err(Error::BadRequest(
                "Invalid topic. Please check your topic and try again.".to_string(),
            ));
        }

        let ai_service = self.ai_service.as_ref().ok_or_else(|| {
            tracing::error!(topic, "Quiz generation requested but the model is unavailable");
            Error::Upstream("Quiz generation is currently unavailable".to_string())
        })?;

        let expected = self.validator.settings().default_questions_per_quiz;
        let candidate = ai_service
            .generate_quiz(topic, expected)
            .await
            .ok_or_else(|| {
                tracing::error!(topic, "Failed to generate quiz");
                Error::Upstream("Failed to generate quiz. Please try again.".to_string())
            })?;

        if !self.validator.accept(&candidate, expected) {
            return Err(Error::BadRequest(
                "Generated quiz did not meet quality requirements. Please try again.".to_string(),
            ));
        }

        let quiz = self.store.create_quiz(AssemblyService::build(&candidate)).await?;
        tracing::info!(quiz_id = quiz.id, topic, "Successfully created quiz");
        Ok(quiz)
    }

    pub async fn get_quiz(&self, quiz_id: i64) -> Result<Quiz> {
        self.store
            .get_quiz(quiz_id)
            .await?
            .ok_or_else(|| quiz_not_found(quiz_id))
    }

    pub async fn list_quizzes(&self, limit: Option<i64>, offset: Option<i64>) -> Result<Vec<Quiz>> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
        let offset = offset.unwrap_or(0).max(0);
        self.store.list_quizzes(limit, offset).await
    }

    /// Scores a submission and stores the attempt. The caller has already
    /// checked that `submission.quiz_id` is the quiz being submitted.
    pub async fn submit_answers(&self, submission: &QuizSubmission) -> Result<QuizResult> {
        let quiz = self.get_quiz(submission.quiz_id).await?;
        let graded = GradingService::grade(&quiz, &submission.answers);

        if let Err(e) = self.store.record_attempt(graded.attempt).await {
            tracing::error!(quiz_id = quiz.id, error = %e, "Failed to process quiz submission");
            return Err(e);
        }

        Ok(graded.result)
    }

    pub async fn list_attempts(&self, quiz_id: i64) -> Result<Vec<QuizAttempt>> {
        self.get_quiz(quiz_id).await?;
        self.store.list_attempts(quiz_id).await
    }

    pub async fn delete_quiz(&self, quiz_id: i64) -> Result<()> {
        if self.store.delete_quiz(quiz_id).await? {
            Ok(())
        } else {
            Err(quiz_not_found(quiz_id))
        }
    }
}

pub(crate) fn quiz_not_found(quiz_id: i64) -> Error {
    Error::NotFound(format!("Quiz with ID {} not found", quiz_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::quiz_store::MockQuizStore;
    use crate::dto::quiz_dto::UserAnswerSubmission;
    use crate::models::question::{Question, QuestionOption};
    use crate::services::ai_service::MockModelClient;
    use chrono::Utc;
    use mockall::predicate::eq;

    fn stored_quiz() -> Quiz {
        Quiz {
            id: 3,
            topic: "Biology".into(),
            created_at: Utc::now(),
            questions: vec![Question {
                id: 30,
                quiz_id: 3,
                question_text: "Powerhouse of the cell?".into(),
                question_order: 1,
                options: vec![
                    QuestionOption {
                        id: 301,
                        question_id: 30,
                        option_text: "Mitochondria".into(),
                        option_letter: "A".into(),
                        is_correct: true,
                    },
                    QuestionOption {
                        id: 302,
                        question_id: 30,
                        option_text: "Nucleus".into(),
                        option_letter: "B".into(),
                        is_correct: false,
                    },
                ],
            }],
        }
    }

    fn one_question_settings() -> QuizSettings {
        QuizSettings {
            default_questions_per_quiz: 1,
            ..QuizSettings::default()
        }
    }

    fn gateway_replying(reply: &'static str) -> AIService {
        let mut model = MockModelClient::new();
        model
            .expect_generate()
            .returning(move |_| Ok(reply.to_string()));
        AIService::new(Arc::new(model), one_question_settings())
    }

    #[tokio::test]
    async fn blocked_topic_never_reaches_model_or_store() {
        let mut model = MockModelClient::new();
        model.expect_generate().never();
        let ai = AIService::new(Arc::new(model), QuizSettings::default());
        let mut store = MockQuizStore::new();
        store.expect_create_quiz().never();

        let service = QuizService::new(Arc::new(store), Some(ai), QuizSettings::default());
        let err = service.generate_quiz("explicit content").await.unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[tokio::test]
    async fn unavailable_model_is_upstream_error() {
        let service = QuizService::new(Arc::new(MockQuizStore::new()), None, QuizSettings::default());
        let err = service.generate_quiz("Rivers").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn rejected_candidate_is_not_stored() {
        let reply = r#"{"topic": "Rivers", "questions": [{
            "question": "Longest river?",
            "options": {"A": "Nile", "B": "Amazon", "C": "Yangtze", "E": "Danube"},
            "correct_answer": "A"
        }]}"#;
        let mut store = MockQuizStore::new();
        store.expect_create_quiz().never();
        let service = QuizService::new(
            Arc::new(store),
            Some(gateway_replying(reply)),
            one_question_settings(),
        );
        let err = service.generate_quiz("Rivers").await.unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[tokio::test]
    async fn accepted_candidate_is_stored_as_one_aggregate() {
        let reply = "```json\n{\"topic\": \"Rivers\", \"questions\": [{\"question\": \"Longest river?\", \"options\": {\"A\": \"Nile\", \"B\": \"Amazon\", \"C\": \"Yangtze\", \"D\": \"Danube\"}, \"correct_answer\": \"A\"}]}\n```";
        let mut store = MockQuizStore::new();
        store
            .expect_create_quiz()
            .withf(|quiz| {
                quiz.topic == "Rivers"
                    && quiz.questions.len() == 1
                    && quiz.questions[0].options.iter().filter(|o| o.is_correct).count() == 1
            })
            .times(1)
            .returning(|_| Ok(stored_quiz()));

        let service = QuizService::new(
            Arc::new(store),
            Some(gateway_replying(reply)),
            one_question_settings(),
        );
        let quiz = service.generate_quiz("Rivers").await.unwrap();
        assert_eq!(quiz.id, 3);
    }

    #[tokio::test]
    async fn submission_records_scored_attempt() {
        let mut store = MockQuizStore::new();
        store
            .expect_get_quiz()
            .with(eq(3))
            .returning(|_| Ok(Some(stored_quiz())));
        store
            .expect_record_attempt()
            .withf(|attempt| attempt.score == 1 && attempt.total_questions == 1 && attempt.responses.len() == 1)
            .times(1)
            .returning(|attempt| {
                Ok(QuizAttempt {
                    id: 1,
                    quiz_id: attempt.quiz_id,
                    attempted_at: Utc::now(),
                    score: attempt.score,
                    total_questions: attempt.total_questions,
                })
            });

        let service = QuizService::new(Arc::new(store), None, QuizSettings::default());
        let result = service
            .submit_answers(&QuizSubmission {
                quiz_id: 3,
                answers: vec![UserAnswerSubmission {
                    question_id: 30,
                    selected_option_id: 301,
                }],
            })
            .await
            .unwrap();
        assert_eq!(result.score, 1);
        assert_eq!(result.percentage, 100.0);
    }

    #[tokio::test]
    async fn failed_commit_reports_failure() {
        let mut store = MockQuizStore::new();
        store.expect_get_quiz().returning(|_| Ok(Some(stored_quiz())));
        store
            .expect_record_attempt()
            .returning(|_| Err(Error::Internal("commit failed".into())));

        let service = QuizService::new(Arc::new(store), None, QuizSettings::default());
        let submission = QuizSubmission {
            quiz_id: 3,
            answers: vec![],
        };
        assert!(service.submit_answers(&submission).await.is_err());
    }

    #[tokio::test]
    async fn unknown_quiz_is_not_found() {
        let mut store = MockQuizStore::new();
        store.expect_get_quiz().returning(|_| Ok(None));
        store.expect_list_attempts().never();

        let service = QuizService::new(Arc::new(store), None, QuizSettings::default());
        assert!(matches!(service.get_quiz(9).await, Err(Error::NotFound(_))));
        assert!(matches!(service.list_attempts(9).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn list_limit_is_clamped() {
        let mut store = MockQuizStore::new();
        store
            .expect_list_quizzes()
            .with(eq(MAX_PAGE_LIMIT), eq(0))
            .times(1)
            .returning(|_, _| Ok(vec![]));
        store
            .expect_list_quizzes()
            .with(eq(DEFAULT_PAGE_LIMIT), eq(5))
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let service = QuizService::new(Arc::new(store), None, QuizSettings::default());
        service.list_quizzes(Some(5000), Some(-3)).await.unwrap();
        service.list_quizzes(None, Some(5)).await.unwrap();
    }
}
