use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::dto::quiz_dto::{
    FeedbackRequest, FeedbackResponse, ListQuizzesQuery, QuizAttemptResponse, QuizCreate,
    QuizResponse, QuizResult, QuizSubmission,
};
use crate::error::{Error, Result};
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/quiz/generate",
    request_body = QuizCreate,
    responses(
        (status = 200, description = "Quiz generated and stored", body = QuizResponse),
        (status = 400, description = "Invalid topic or generated quiz rejected"),
        (status = 502, description = "Model unavailable or produced no usable quiz"),
    ),
)]
pub async fn generate_quiz(
    State(state): State<AppState>,
    Json(payload): Json<QuizCreate>,
) -> Result<Json<QuizResponse>> {
    payload.validate()?;
    let quiz = state.quiz_service.generate_quiz(&payload.topic).await?;
    Ok(Json(quiz.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/quiz/{quiz_id}",
    params(("quiz_id" = i64, Path, description = "Quiz ID")),
    responses(
        (status = 200, description = "Quiz with questions and options", body = QuizResponse),
        (status = 404, description = "Quiz not found"),
    ),
)]
pub async fn get_quiz(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> Result<Json<QuizResponse>> {
    let quiz = state.quiz_service.get_quiz(quiz_id).await?;
    Ok(Json(quiz.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/quiz",
    params(ListQuizzesQuery),
    responses(
        (status = 200, description = "Quizzes, newest first", body = [QuizResponse]),
    ),
)]
pub async fn list_quizzes(
    State(state): State<AppState>,
    Query(query): Query<ListQuizzesQuery>,
) -> Result<Json<Vec<QuizResponse>>> {
    let quizzes = state
        .quiz_service
        .list_quizzes(query.limit, query.offset)
        .await?;
    Ok(Json(quizzes.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/quiz/{quiz_id}/submit",
    params(("quiz_id" = i64, Path, description = "Quiz ID")),
    request_body = QuizSubmission,
    responses(
        (status = 200, description = "Scored result", body = QuizResult),
        (status = 400, description = "Quiz ID in URL does not match submission"),
        (status = 404, description = "Quiz not found"),
    ),
)]
pub async fn submit_quiz(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
    Json(submission): Json<QuizSubmission>,
) -> Result<Json<QuizResult>> {
    if quiz_id != submission.quiz_id {
        return Err(Error::BadRequest(
            "Quiz ID in URL does not match quiz ID in submission".to_string(),
        ));
    }
    let result = state.quiz_service.submit_answers(&submission).await?;
    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/api/v1/quiz/{quiz_id}/attempts",
    params(("quiz_id" = i64, Path, description = "Quiz ID")),
    responses(
        (status = 200, description = "Attempts, newest first", body = [QuizAttemptResponse]),
        (status = 404, description = "Quiz not found"),
    ),
)]
pub async fn get_quiz_attempts(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> Result<Json<Vec<QuizAttemptResponse>>> {
    let attempts = state.quiz_service.list_attempts(quiz_id).await?;
    Ok(Json(attempts.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/quiz/{quiz_id}/feedback",
    params(("quiz_id" = i64, Path, description = "Quiz ID")),
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "One explanation per wrong answer", body = FeedbackResponse),
        (status = 404, description = "Quiz not found"),
    ),
)]
pub async fn get_quiz_feedback(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>> {
    payload.validate()?;
    let feedback = state.feedback_service.explain(quiz_id, &payload).await?;
    Ok(Json(feedback))
}

#[utoipa::path(
    delete,
    path = "/api/v1/quiz/{quiz_id}",
    params(("quiz_id" = i64, Path, description = "Quiz ID")),
    responses(
        (status = 204, description = "Quiz and its history deleted"),
        (status = 404, description = "Quiz not found"),
    ),
)]
pub async fn delete_quiz(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.quiz_service.delete_quiz(quiz_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
