//! Concrete remote dialogue backend hitting Gemini's OpenAI-compatible Chat
//! Completions endpoint. Grounded on codex-core's `model_provider_info.rs`,
//! which already registers Gemini at exactly this base URL behind
//! `GEMINI_API_KEY`, and on `chat_completions.rs`'s messages-array request
//! shape and `util::backoff` retry schedule.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use tokio::time::timeout;
use tracing::debug;
use tracing::warn;

use crate::adapter::ChatFactory;
use crate::adapter::ChatSession;
use crate::util::backoff;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);
const MAX_RETRIES: u64 = 3;

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct GeminiChatFactory {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiChatFactory {
    /// `base_url_override` lets callers point at a mock endpoint (spec.md §8's
    /// end-to-end scenarios exercise this through [`GatewayConfig`]'s own
    /// `GEMINI_BASE_URL` override); production startup always passes `None`.
    pub fn new(api_key: String, base_url_override: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url_override.unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    async fn send_messages(&self, messages: &[Message]) -> anyhow::Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionsRequest {
            model: &self.model,
            messages,
        };

        let mut last_err = None;
        for attempt in 1..=MAX_RETRIES {
            let request = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body);

            let outcome = timeout(REQUEST_TIMEOUT, request.send()).await;
            match outcome {
                Ok(Ok(response)) => {
                    let status = response.status();
                    if status.is_success() {
                        let parsed: ChatCompletionsResponse = response.json().await?;
                        let content = parsed
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|c| c.message.content)
                            .unwrap_or_default();
                        return Ok(content);
                    }
                    let text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        warn!(%status, attempt, "gemini request failed, retrying");
                        last_err = Some(anyhow::anyhow!("gemini request failed ({status}): {text}"));
                    } else {
                        return Err(anyhow::anyhow!("gemini request failed ({status}): {text}"));
                    }
                }
                Ok(Err(e)) => {
                    warn!(error = %e, attempt, "gemini transport error, retrying");
                    last_err = Some(anyhow::anyhow!(e));
                }
                Err(_) => {
                    last_err = Some(anyhow::anyhow!("gemini request timed out"));
                }
            }
            if attempt < MAX_RETRIES {
                tokio::time::sleep(backoff(attempt)).await;
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("gemini request failed with no detail")))
    }
}

#[async_trait]
impl ChatFactory for GeminiChatFactory {
    async fn start_chat(
        &self,
        system_instructions: &str,
    ) -> anyhow::Result<Box<dyn ChatSession>> {
        debug!("starting a new gemini chat session");
        Ok(Box::new(GeminiChatSession {
            client: self.client.clone(),
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            history: Mutex::new(vec![Message {
                role: "system",
                content: system_instructions.to_string(),
            }]),
        }))
    }
}

struct GeminiChatSession {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    history: Mutex<Vec<Message>>,
}

#[async_trait]
impl ChatSession for GeminiChatSession {
    async fn send(&self, text: &str) -> anyhow::Result<String> {
        let messages = {
            let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
            history.push(Message {
                role: "user",
                content: text.to_string(),
            });
            history.clone()
        };

        let delegate = GeminiChatFactory {
            client: self.client.clone(),
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
        };
        let reply = delegate.send_messages(&messages).await?;

        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Message {
                role: "assistant",
                content: reply.clone(),
            });
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[tokio::test]
    async fn session_seeds_history_with_system_instructions() {
        let session = GeminiChatSession {
            client: reqwest::Client::new(),
            api_key: "test-key".to_string(),
            base_url: "http://127.0.0.1:0".to_string(),
            model: DEFAULT_MODEL.to_string(),
            history: Mutex::new(vec![Message {
                role: "system",
                content: "be terse".to_string(),
            }]),
        };
        // Without a live endpoint the call itself fails, but it must still
        // append the user turn before attempting the request, so a retry
        // carries full context rather than just the latest message.
        let _ = session.send("hello").await;
        let history = session.history.lock().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "system");
        assert_eq!(history[1].role, "user");
    }
}
