//! Question provider for live tests
//!
//! Asks a chat-completions endpoint for multiple-choice critical thinking
//! questions. Providers sit behind [`QuestionProvider`] so tests and offline
//! runs can swap in a canned source.

use crate::config::QuestionConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

const QUESTION_PROMPT: &str = r#"Generate a critical thinking question with 4 multiple choice options. Format as JSON:
{
  "question": "question text",
  "options": ["option1", "option2", "option3", "option4"],
  "correctAnswer": "correct option text",
  "explanation": "explanation of the correct answer"
}"#;

/// Options every generated question must carry
pub const OPTION_COUNT: usize = 4;

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum QuestionError {
  #[error("Request failed: {0}")]
  Request(String),

  #[error("API error: {0}")]
  Api(String),

  #[error("Parse error: {0}")]
  Parse(String),

  #[error("Invalid question: {0}")]
  Invalid(String),

  #[error("No questions could be generated ({failures} attempts failed)")]
  Exhausted { failures: usize },
}

/// ---------------------------------------------------------------------------
/// Generated Question
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
  pub question: String,
  pub options: Vec<String>,
  pub correct_answer: String,
  #[serde(default)]
  pub explanation: Option<String>,
}

impl GeneratedQuestion {
  /// Exactly four options, the correct answer among them
  pub fn validate(&self) -> Result<(), QuestionError> {
    if self.question.trim().is_empty() {
      return Err(QuestionError::Invalid("empty question text".into()));
    }
    if self.options.len() != OPTION_COUNT {
      return Err(QuestionError::Invalid(format!(
        "expected {} options, got {}",
        OPTION_COUNT,
        self.options.len()
      )));
    }
    if !self.options.contains(&self.correct_answer) {
      return Err(QuestionError::Invalid(format!(
        "correct answer '{}' is not one of the options",
        self.correct_answer
      )));
    }
    Ok(())
  }
}

/// Parse and validate a question out of free-form model output
pub fn parse_question(text: &str) -> Result<GeneratedQuestion, QuestionError> {
  let json_str = extract_json(text)?;
  let question: GeneratedQuestion =
    serde_json::from_str(&json_str).map_err(|e| QuestionError::Parse(format!("{}: {}", e, json_str)))?;
  question.validate()?;
  Ok(question)
}

/// Pull the JSON object out of a completion (handles markdown code fences)
fn extract_json(text: &str) -> Result<String, QuestionError> {
  let trimmed = text.trim();
  if trimmed.starts_with('{') {
    return Ok(trimmed.to_string());
  }

  if let Some(start) = text.find("```json") {
    let start = start + 7;
    if let Some(end) = text[start..].find("```") {
      return Ok(text[start..start + end].trim().to_string());
    }
  }

  if let Some(start) = text.find("```") {
    let start = start + 3;
    let content_start = text[start..].find('\n').map(|i| start + i + 1).unwrap_or(start);
    if let Some(end) = text[content_start..].find("```") {
      return Ok(text[content_start..content_start + end].trim().to_string());
    }
  }

  if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
    if start < end {
      return Ok(text[start..=end].to_string());
    }
  }

  Err(QuestionError::Parse("Could not extract JSON from response".to_string()))
}

/// ---------------------------------------------------------------------------
/// Provider Seam
/// ---------------------------------------------------------------------------

#[allow(async_fn_in_trait)]
pub trait QuestionProvider {
  async fn request_question(&self) -> Result<GeneratedQuestion, QuestionError>;
}

/// Request `count` questions one at a time. Individual failures are logged
/// and skipped; only a run with no successes is an error.
pub async fn load_questions<P: QuestionProvider>(
  provider: &P,
  count: usize,
) -> Result<Vec<GeneratedQuestion>, QuestionError> {
  let mut questions = Vec::with_capacity(count);
  let mut failures = 0;

  for attempt in 1..=count {
    match provider.request_question().await {
      Ok(q) => questions.push(q),
      Err(e) => {
        failures += 1;
        tracing::warn!(attempt, "Question request failed: {}", e);
      }
    }
  }

  if questions.is_empty() && count > 0 {
    return Err(QuestionError::Exhausted { failures });
  }

  tracing::info!("Loaded {} of {} questions", questions.len(), count);
  Ok(questions)
}

/// ---------------------------------------------------------------------------
/// Chat Completions Client
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
  model: &'a str,
  messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
  role: &'a str,
  content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
  choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
  message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
  content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
  error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
  message: String,
}

pub struct OpenAiClient {
  client: Client,
  api_key: String,
  endpoint: Url,
  model: String,
}

impl OpenAiClient {
  pub fn new(config: &QuestionConfig) -> Result<Self, QuestionError> {
    let endpoint = config
      .base_url
      .join("chat/completions")
      .map_err(|e| QuestionError::Request(e.to_string()))?;

    Ok(Self {
      client: Client::new(),
      api_key: config.api_key.clone(),
      endpoint,
      model: config.model.clone(),
    })
  }

  /// Send one user message and return the first choice's text
  async fn complete(&self, prompt: &str) -> Result<String, QuestionError> {
    let request = ChatRequest {
      model: &self.model,
      messages: vec![ChatMessage {
        role: "user",
        content: prompt,
      }],
    };

    let response = self
      .client
      .post(self.endpoint.clone())
      .bearer_auth(&self.api_key)
      .json(&request)
      .send()
      .await
      .map_err(|e| QuestionError::Request(e.to_string()))?;

    let status = response.status();
    let body = response.text().await.map_err(|e| QuestionError::Request(e.to_string()))?;

    if !status.is_success() {
      if let Ok(error_resp) = serde_json::from_str::<ApiErrorResponse>(&body) {
        return Err(QuestionError::Api(error_resp.error.message));
      }
      return Err(QuestionError::Api(format!("HTTP {}: {}", status, body)));
    }

    let chat: ChatResponse = serde_json::from_str(&body).map_err(|e| QuestionError::Parse(e.to_string()))?;

    chat
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .filter(|c| !c.trim().is_empty())
      .ok_or_else(|| QuestionError::Parse("No content in response".to_string()))
  }
}

impl QuestionProvider for OpenAiClient {
  async fn request_question(&self) -> Result<GeneratedQuestion, QuestionError> {
    tracing::debug!(model = %self.model, "Requesting question");
    let text = self.complete(QUESTION_PROMPT).await?;
    parse_question(&text)
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::parse_base_url;
  use std::sync::atomic::{AtomicUsize, Ordering};

  const GOOD_QUESTION: &str = r#"{"question": "Which is larger?", "options": ["1", "2", "3", "4"], "correctAnswer": "4", "explanation": "4 is largest"}"#;

  fn client_for(server: &mockito::Server) -> OpenAiClient {
    let config = QuestionConfig {
      api_key: "test-key".into(),
      base_url: parse_base_url(&server.url()).unwrap(),
      model: "gpt-3.5-turbo".into(),
    };
    OpenAiClient::new(&config).unwrap()
  }

  fn completion_body(content: &str) -> String {
    serde_json::json!({
      "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
    .to_string()
  }

  #[test]
  fn test_extract_json_direct() {
    let result = extract_json(GOOD_QUESTION).unwrap();
    assert!(result.contains("correctAnswer"));
  }

  #[test]
  fn test_extract_json_code_block() {
    let input = format!("Here you go:\n\n```json\n{}\n```\n\nGood luck!", GOOD_QUESTION);
    let result = extract_json(&input).unwrap();
    assert!(result.starts_with('{'));
    assert!(result.contains("Which is larger?"));
  }

  #[test]
  fn test_extract_json_fallback() {
    let input = r#"The question is {"question": "x"} as shown."#;
    let result = extract_json(input).unwrap();
    assert_eq!(result, r#"{"question": "x"}"#);

    assert!(extract_json("no json here").is_err());
  }

  #[test]
  fn test_parse_question_validates() {
    let q = parse_question(GOOD_QUESTION).unwrap();
    assert_eq!(q.options.len(), 4);
    assert_eq!(q.correct_answer, "4");

    let three = r#"{"question": "q", "options": ["a", "b", "c"], "correctAnswer": "a"}"#;
    assert!(matches!(parse_question(three), Err(QuestionError::Invalid(_))));

    let stray = r#"{"question": "q", "options": ["a", "b", "c", "d"], "correctAnswer": "e"}"#;
    assert!(matches!(parse_question(stray), Err(QuestionError::Invalid(_))));

    let missing = r#"{"question": "q", "options": ["a", "b", "c", "d"]}"#;
    assert!(matches!(parse_question(missing), Err(QuestionError::Parse(_))));
  }

  #[tokio::test]
  async fn test_client_requests_question() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/chat/completions")
      .match_header("authorization", "Bearer test-key")
      .match_body(mockito::Matcher::PartialJson(serde_json::json!({"model": "gpt-3.5-turbo"})))
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(completion_body(GOOD_QUESTION))
      .expect(1)
      .create_async()
      .await;

    let question = client_for(&server).request_question().await.unwrap();
    assert_eq!(question.question, "Which is larger?");
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_client_surfaces_api_errors() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
      .mock("POST", "/chat/completions")
      .with_status(401)
      .with_body(r#"{"error": {"message": "Incorrect API key provided"}}"#)
      .create_async()
      .await;

    let err = client_for(&server).request_question().await.unwrap_err();
    assert!(matches!(err, QuestionError::Api(ref m) if m.contains("Incorrect API key")));
  }

  #[tokio::test]
  async fn test_client_rejects_empty_content() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
      .mock("POST", "/chat/completions")
      .with_status(200)
      .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#)
      .create_async()
      .await;

    let err = client_for(&server).request_question().await.unwrap_err();
    assert!(matches!(err, QuestionError::Parse(_)));
  }

  /// Fails every `fail_every`-th call
  struct FlakyProvider {
    calls: AtomicUsize,
    fail_every: usize,
  }

  impl QuestionProvider for FlakyProvider {
    async fn request_question(&self) -> Result<GeneratedQuestion, QuestionError> {
      let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
      if self.fail_every > 0 && n % self.fail_every == 0 {
        return Err(QuestionError::Request("connection reset".into()));
      }
      parse_question(GOOD_QUESTION)
    }
  }

  #[tokio::test]
  async fn test_load_questions_tolerates_partial_failure() {
    let provider = FlakyProvider { calls: AtomicUsize::new(0), fail_every: 2 };
    let questions = load_questions(&provider, 5).await.unwrap();
    assert_eq!(questions.len(), 3);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 5);
  }

  #[tokio::test]
  async fn test_load_questions_fails_when_nothing_loads() {
    let provider = FlakyProvider { calls: AtomicUsize::new(0), fail_every: 1 };
    let err = load_questions(&provider, 3).await.unwrap_err();
    assert!(matches!(err, QuestionError::Exhausted { failures: 3 }));
  }
}
