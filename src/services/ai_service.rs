use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::{Config, QuizSettings};
use crate::dto::quiz_dto::{FeedbackItem, Mismatch, QuizCandidate};

const CONNECTION_PING_PROMPT: &str = "Hello, can you respond with 'API connection successful'?";
const CONNECTION_PING_REPLY: &str = "API connection successful";

/// Text-in, text-out access to a generative model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Google Gemini `generateContent` client with search grounding enabled.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let payload = serde_json::json!({
            "contents": [
                { "role": "user", "parts": [ { "text": prompt } ] }
            ],
            "tools": [ { "google_search": {} } ]
        });

        let res = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Gemini API Error {}: {}", status, text));
        }

        let body: GenerateContentResponse = res.json().await?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(text)
    }
}

/// Gateway between the quiz pipeline and the model. Every failure is logged
/// here and surfaces to callers only as `None` / `false`.
#[derive(Clone)]
pub struct AIService {
    client: Arc<dyn ModelClient>,
    settings: QuizSettings,
}

impl AIService {
    pub fn new(client: Arc<dyn ModelClient>, settings: QuizSettings) -> Self {
        Self { client, settings }
    }

    /// Builds the gateway when an API key is configured; `None` marks the
    /// model as unavailable for the lifetime of the process.
    pub fn from_config(config: &Config, http_client: Client) -> Option<Self> {
        let api_key = config.gemini_api_key.clone()?;
        let client = GeminiClient::new(
            api_key,
            config.gemini_model.clone(),
            config.gemini_base_url.clone(),
            http_client,
        )
        .with_timeout(Duration::from_secs(config.model_timeout_secs));
        Some(Self::new(Arc::new(client), config.quiz.clone()))
    }

    pub async fn generate_quiz(&self, topic: &str, num_questions: usize) -> Option<QuizCandidate> {
        let prompt = quiz_prompt(topic, num_questions, &self.settings);

        let response_text = match self.client.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(topic, error = %e, "Error generating quiz with model");
                return None;
            }
        };

        if response_text.trim().is_empty() {
            tracing::error!(topic, "Empty response from model");
            return None;
        }

        match serde_json::from_str::<QuizCandidate>(strip_code_fence(&response_text)) {
            Ok(candidate) => {
                tracing::info!(
                    topic,
                    questions = candidate.questions.len(),
                    "Parsed quiz candidate from model"
                );
                Some(candidate)
            }
            Err(e) => {
                tracing::error!(
                    topic,
                    error = %e,
                    payload = %response_text,
                    "Failed to parse quiz response"
                );
                None
            }
        }
    }

    /// Asks for short explanations of every mismatch in a single prompt.
    pub async fn explain_incorrect_answers(
        &self,
        topic: &str,
        mismatches: &[Mismatch],
    ) -> Option<Vec<FeedbackItem>> {
        let prompt = feedback_prompt(topic, mismatches);

        let response_text = match self.client.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(topic, error = %e, "Failed to get feedback explanations");
                return None;
            }
        };

        if response_text.trim().is_empty() {
            tracing::warn!(topic, "Empty feedback response from model");
            return None;
        }

        match serde_json::from_str::<Vec<FeedbackItem>>(strip_code_fence(&response_text)) {
            Ok(items) => Some(items),
            Err(e) => {
                tracing::error!(
                    topic,
                    error = %e,
                    payload = %response_text,
                    "Failed to parse feedback response"
                );
                None
            }
        }
    }

    pub async fn test_connection(&self) -> bool {
        match self.client.generate(CONNECTION_PING_PROMPT).await {
            Ok(text) => text.contains(CONNECTION_PING_REPLY),
            Err(e) => {
                tracing::error!(error = %e, "API connection test failed");
                false
            }
        }
    }
}

pub fn quiz_prompt(topic: &str, num_questions: usize, settings: &QuizSettings) -> String {
    let labels = settings.option_labels.join(", ");
    let example_options = settings
        .option_labels
        .iter()
        .enumerate()
        .map(|(idx, label)| format!("                \"{}\": \"Option {}\"", label, idx + 1))
        .collect::<Vec<_>>()
        .join(",\n");
    let first_label = settings
        .option_labels
        .first()
        .map(String::as_str)
        .unwrap_or("A");

    format!(
        r#"Generate a multiple-choice quiz about "{topic}".

Requirements:
- Create exactly {num_questions} questions
- Each question should have exactly {option_count} options ({labels})
- Only one option should be correct
- Questions should be factual and educational
- Include a brief explanation for each correct answer
- Vary the difficulty from basic to intermediate
- Use current, accurate information

Use the search tool to find up-to-date and accurate information about {topic} to ensure factual correctness.

Return the response as a JSON object with this exact structure:
{{
    "topic": "{topic}",
    "difficulty_level": "medium",
    "questions": [
        {{
            "question": "Question text here?",
            "options": {{
{example_options}
            }},
            "correct_answer": "{first_label}",
            "explanation": "Brief explanation of why this answer is correct"
        }}
    ]
}}

Make sure the JSON is valid and properly formatted."#,
        topic = topic,
        num_questions = num_questions,
        option_count = settings.options_per_question,
        labels = labels,
        example_options = example_options,
        first_label = first_label,
    )
}

pub fn feedback_prompt(topic: &str, mismatches: &[Mismatch]) -> String {
    let lines = mismatches
        .iter()
        .map(|m| {
            format!(
                "- QID {}: Q='{}' | you='{}. {}' | correct='{}. {}'",
                m.question_id,
                m.question_text,
                m.user_selected,
                m.user_selected_text,
                m.correct_option,
                m.correct_text
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an instructor. For each question below, explain in 2-3 short sentences why the user-selected answer is incorrect and why the correct answer is right. \
         Use plain language, no hedging, and avoid repeating the full question text. \
         Output strict JSON array with items of the form {{\"question_id\": number, \"explanation\": string}}.\n\n\
         Topic: {}\nQuestions:\n{}",
        topic, lines
    )
}

/// Removes a surrounding markdown code fence, with or without a language tag.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };

    let tag_len = inner
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(inner.len());
    let body = if tag_len > 0 && inner[tag_len..].starts_with(char::is_whitespace) {
        &inner[tag_len..]
    } else {
        inner
    };
    body.trim()
}
