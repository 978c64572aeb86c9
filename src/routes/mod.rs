pub mod health;
pub mod quiz;

use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::dto::quiz_dto::{
    AnswerOutcome, FeedbackItem, FeedbackRequest, FeedbackResponse, Mismatch,
    QuestionOptionResponse, QuestionResponse, QuizAttemptResponse, QuizCreate, QuizResponse,
    QuizResult, QuizSubmission, UserAnswerSubmission,
};
use crate::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        quiz::generate_quiz,
        quiz::get_quiz,
        quiz::list_quizzes,
        quiz::submit_quiz,
        quiz::get_quiz_attempts,
        quiz::get_quiz_feedback,
        quiz::delete_quiz,
    ),
    components(schemas(
        QuizCreate,
        QuizResponse,
        QuestionResponse,
        QuestionOptionResponse,
        QuizSubmission,
        UserAnswerSubmission,
        QuizResult,
        AnswerOutcome,
        QuizAttemptResponse,
        FeedbackRequest,
        Mismatch,
        FeedbackItem,
        FeedbackResponse,
    )),
    tags((name = "quiz", description = "AI-generated multiple-choice quizzes"))
)]
pub struct ApiDoc;

/// Full application router: the quiz API under `/api/v1` plus the banner and health routes.
pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    let api = Router::new()
        .route("/quiz/generate", post(quiz::generate_quiz))
        .route("/quiz", get(quiz::list_quizzes))
        .route("/quiz/", get(quiz::list_quizzes))
        .route("/quiz/:quiz_id", get(quiz::get_quiz).delete(quiz::delete_quiz))
        .route("/quiz/:quiz_id/submit", post(quiz::submit_quiz))
        .route("/quiz/:quiz_id/attempts", get(quiz::get_quiz_attempts))
        .route("/quiz/:quiz_id/feedback", post(quiz::get_quiz_feedback))
        .route("/health", get(health::api_health))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }));

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .nest("/api/v1", api)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
