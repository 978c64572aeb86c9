use crate::dto::quiz_dto::QuizCandidate;
use crate::models::question::{NewQuestion, NewQuestionOption};
use crate::models::quiz::NewQuiz;

pub struct AssemblyService;

impl AssemblyService {
    /// Turns an accepted candidate into a storable aggregate. Question order
    /// and option order follow the candidate.
    pub fn build(candidate: &QuizCandidate) -> NewQuiz {
        let questions = candidate
            .questions
            .iter()
            .enumerate()
            .map(|(idx, q)| NewQuestion {
                question_text: q.question.clone(),
                question_order: (idx as i32) + 1,
                options: q
                    .options
                    .iter()
                    .map(|(letter, text)| NewQuestionOption {
                        option_text: text.clone(),
                        option_letter: letter.clone(),
                        is_correct: *letter == q.correct_answer,
                    })
                    .collect(),
            })
            .collect();

        NewQuiz {
            topic: candidate.topic.clone(),
            questions,
        }
    }
}
