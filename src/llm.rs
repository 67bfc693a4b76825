use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Deterministic sampling: the extraction must be reproducible.
const TEMPERATURE: f64 = 0.0;
/// Output cap; a structured receipt fits well inside this.
const MAX_TOKENS: u32 = 1200;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// A chat-completion backend. One implementation per provider; the parser
/// only ever sees this trait so tests can swap in a fake.
pub trait LlmClient {
    fn complete(&self, model: &str, prompt: &str) -> Result<String, ParseError>;
}

/// OpenAI chat-completions client.
pub struct OpenAiChat {
    client: reqwest::blocking::Client,
    api_key: String,
}

impl OpenAiChat {
    pub fn new(api_key: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            api_key: api_key.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl LlmClient for OpenAiChat {
    fn complete(&self, model: &str, prompt: &str) -> Result<String, ParseError> {
        let body = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| ParseError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ParseError::Backend(format!("status {status}: {body}")));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| ParseError::Backend(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ParseError::Backend("response contained no choices".into()))?;
        Ok(content)
    }
}
