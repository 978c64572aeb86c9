use crate::dto::quiz_dto::{AnswerOutcome, QuizResult, UserAnswerSubmission};
use crate::models::quiz::Quiz;
use crate::models::quiz_attempt::NewAttempt;
use crate::models::user_response::NewUserResponse;

/// A scored submission: the attempt to commit and the result to return.
#[derive(Debug, Clone, PartialEq)]
pub struct GradedSubmission {
    pub attempt: NewAttempt,
    pub result: QuizResult,
}

pub struct GradingService;

impl GradingService {
    /// Scores `answers` against `quiz`. Answers naming a question outside the
    /// quiz, or an option outside its question, are skipped.
    pub fn grade(quiz: &Quiz, answers: &[UserAnswerSubmission]) -> GradedSubmission {
        let total_questions = quiz.questions.len() as i32;
        let mut correct_count: i32 = 0;
        let mut responses = Vec::new();
        let mut outcomes = Vec::new();

        for answer in answers {
            let Some(question) = quiz.question(answer.question_id) else {
                tracing::debug!(
                    quiz_id = quiz.id,
                    question_id = answer.question_id,
                    "Skipping answer for unknown question"
                );
                continue;
            };
            let Some(selected) = question.option(answer.selected_option_id) else {
                tracing::debug!(
                    quiz_id = quiz.id,
                    question_id = question.id,
                    option_id = answer.selected_option_id,
                    "Skipping answer with foreign option"
                );
                continue;
            };

            let is_correct = selected.is_correct;
            if is_correct {
                correct_count += 1;
            }

            responses.push(NewUserResponse {
                question_id: question.id,
                selected_option_id: selected.id,
                is_correct,
            });

            let (correct_option, correct_text) = match question.correct_option() {
                Some(opt) => (opt.option_letter.clone(), opt.option_text.clone()),
                None => ("N/A".to_string(), "N/A".to_string()),
            };
            outcomes.push(AnswerOutcome {
                question_id: question.id,
                question_text: question.question_text.clone(),
                correct_option,
                correct_text,
                user_selected: selected.option_letter.clone(),
                user_selected_text: selected.option_text.clone(),
                is_correct,
            });
        }

        GradedSubmission {
            attempt: NewAttempt {
                quiz_id: quiz.id,
                score: correct_count,
                total_questions,
                responses,
            },
            result: QuizResult {
                score: correct_count,
                total_questions,
                percentage: percentage(correct_count, total_questions),
                correct_answers: outcomes,
            },
        }
    }
}

/// Share of correct answers in percent, rounded to two decimals.
pub fn percentage(score: i32, total_questions: i32) -> f64 {
    if total_questions <= 0 {
        return 0.0;
    }
    let raw = (score as f64 / total_questions as f64) * 100.0;
    (raw * 100.0).round() / 100.0
}
