use std::env;
use std::fmt::Write as _;

use async_trait::async_trait;
use exam_core::model::QuestionDraft;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{BatchRequest, QuestionGenerator};
use crate::error::{ConfigError, GenerationError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const TEMPERATURE: f32 = 0.7;

const SYSTEM_PROMPT: &str = "You are an exam engine for the HashiCorp Terraform Associate (003) \
certification. You write realistic practice questions and answer with JSON only.";

#[derive(Clone, Debug)]
pub struct AiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl AiConfig {
    /// Build a config, checking that `base_url` parses.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` for a malformed URL.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let base_url = base_url.into();
        if Url::parse(&base_url).is_err() {
            return Err(ConfigError::InvalidBaseUrl(base_url));
        }
        Ok(Self {
            base_url,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Read `EXAM_AI_API_KEY`, `EXAM_AI_BASE_URL` and `EXAM_AI_MODEL`.
    ///
    /// Returns `Ok(None)` when no API key is set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` if `EXAM_AI_BASE_URL` is malformed.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = env::var("EXAM_AI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
        else {
            return Ok(None);
        };
        let base_url = env::var("EXAM_AI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let model = env::var("EXAM_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        Self::new(base_url, api_key, model).map(Some)
    }
}

/// Question generator backed by an OpenAI-compatible chat-completions API.
#[derive(Clone)]
pub struct AiQuestionClient {
    client: Client,
    config: Option<AiConfig>,
}

impl AiQuestionClient {
    #[must_use]
    pub fn new(config: Option<AiConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl QuestionGenerator for AiQuestionClient {
    async fn generate_batch(
        &self,
        request: &BatchRequest,
    ) -> Result<Vec<QuestionDraft>, GenerationError> {
        let config = self.config.as_ref().ok_or(GenerationError::Disabled)?;

        let url = format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        );
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: build_prompt(request),
                },
            ],
            temperature: TEMPERATURE,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        debug!(batch = request.batch, model = %config.model, "requesting question batch");
        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerationError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        parse_questions(&content)
    }
}

/// Prompt for one batch: every topic with its exact question count.
pub(crate) fn build_prompt(request: &BatchRequest) -> String {
    let mut prompt = String::from(
        "Generate a subset of questions for a practice exam.\n\
         \n\
         Requirements:\n\
         1. Generate exactly the number of questions requested per topic below.\n\
         2. Questions must be strictly aligned with the \"003\" exam version.\n\
         3. Mix multiple choice (single answer), multiple select (several answers) and true/false.\n\
         4. Present \"text match\" style questions as multiple choice with command or code options.\n\
         5. Use HCL code snippets frequently, especially for configuration and module topics.\n\
         6. Set \"domain\" to the exact topic name the question belongs to.\n\
         \n\
         Topics for this batch:\n",
    );
    for topic in &request.topics {
        let _ = writeln!(
            prompt,
            "- {} (generate exactly {} questions)",
            topic.label, topic.question_count
        );
    }
    prompt.push_str(
        "\nRespond with a JSON object {\"questions\": [...]} where each question has \
         \"questionText\" (string), \"codeSnippet\" (string or null), \"options\" (array of strings), \
         \"correctAnswerIndices\" (array of zero-based integers), \"explanation\" (string) and \
         \"domain\" (string).",
    );
    prompt
}

/// Parse the model output into drafts. Accepts the requested object, a bare
/// array, and either wrapped in a Markdown code fence.
pub(crate) fn parse_questions(content: &str) -> Result<Vec<QuestionDraft>, GenerationError> {
    let trimmed = strip_code_fence(content.trim());
    let payload: QuestionsPayload = serde_json::from_str(trimmed)
        .map_err(|err| GenerationError::MalformedResponse(err.to_string()))?;
    Ok(match payload {
        QuestionsPayload::Wrapped { questions } => questions,
        QuestionsPayload::Bare(questions) => questions,
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuestionsPayload {
    Wrapped { questions: Vec<QuestionDraft> },
    Bare(Vec<QuestionDraft>),
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{EXAM_TOPICS, TestId};

    const SAMPLE: &str = r#"{"questions": [{
        "questionText": "Which block configures remote state?",
        "codeSnippet": null,
        "options": ["backend", "provider", "module", "output"],
        "correctAnswerIndices": [0],
        "explanation": "The backend block lives inside the terraform block.",
        "domain": "7. Implement and maintain state (backend, locking, remote)"
    }]}"#;

    #[test]
    fn prompt_lists_every_topic_with_its_count() {
        let request = BatchRequest::new(TestId::new(1), "B", &EXAM_TOPICS[5..]);
        let prompt = build_prompt(&request);
        assert!(prompt.contains("- 6. Navigate Terraform workflow (write -> plan -> create) (generate exactly 14 questions)"));
        assert!(prompt.contains("9. Understand Terraform Cloud capabilities (generate exactly 2 questions)"));
        assert!(!prompt.contains("1. Understand infrastructure as code"));
        assert!(prompt.contains("JSON"));
    }

    #[test]
    fn parses_wrapped_bare_and_fenced_payloads() {
        let wrapped = parse_questions(SAMPLE).unwrap();
        assert_eq!(wrapped.len(), 1);
        assert_eq!(wrapped[0].correct_answer_indices, vec![0]);
        assert_eq!(wrapped[0].code_snippet, None);

        let bare = SAMPLE
            .trim()
            .trim_start_matches("{\"questions\":")
            .trim_end_matches('}')
            .trim();
        assert!(bare.starts_with('['));
        assert_eq!(parse_questions(bare).unwrap(), wrapped);

        let fenced = format!("```json\n{SAMPLE}\n```");
        assert_eq!(parse_questions(&fenced).unwrap(), wrapped);
    }

    #[test]
    fn malformed_payload_is_reported() {
        let err = parse_questions("here are your questions").unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));

        let err = parse_questions(r#"{"questions": [{"questionText": "x"}]}"#).unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));
    }

    #[test]
    fn config_rejects_bad_base_url() {
        assert!(AiConfig::new("not a url", "key", "model").is_err());
        let config = AiConfig::new("http://localhost:8080/v1", "key", "model").unwrap();
        assert_eq!(config.model, "model");
    }

    #[tokio::test]
    async fn disabled_client_refuses_to_generate() {
        let client = AiQuestionClient::new(None);
        assert!(!client.enabled());
        let request = BatchRequest::new(TestId::new(1), "A", &EXAM_TOPICS[..5]);
        let err = client.generate_batch(&request).await.unwrap_err();
        assert!(matches!(err, GenerationError::Disabled));
    }
}
