//! A local stand-in for Gemini's chat-completions endpoint, grounded in the
//! teacher's `core/tests/stream_no_completed.rs` `impl Respond for
//! SeqResponder` pattern: each mounted mock serves one reply per call in a
//! fixed sequence, letting a test script an entire multi-turn dialogue.

use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use wiremock::Mock;
use wiremock::MockServer;
use wiremock::Request;
use wiremock::Respond;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;

fn chat_completions_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{ "message": { "content": content } }]
    })
}

struct SeqResponder {
    replies: Vec<String>,
    calls: AtomicUsize,
}

impl Respond for SeqResponder {
    fn respond(&self, _: &Request) -> ResponseTemplate {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let content = self.replies.get(n).cloned().unwrap_or_default();
        ResponseTemplate::new(200).set_body_json(chat_completions_body(&content))
    }
}

/// Spins up a mock server that replies to successive `/chat/completions`
/// calls with `replies`, in order, regardless of which session sent them.
/// Suited to tests that drive a single dialogue sequentially.
pub async fn sequential_server(replies: Vec<&str>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(SeqResponder {
            replies: replies.into_iter().map(str::to_string).collect(),
            calls: AtomicUsize::new(0),
        })
        .mount(&server)
        .await;
    server
}

struct DelayedCallResponder {
    replies: Vec<String>,
    calls: AtomicUsize,
    delay_at_index: usize,
    delay: Duration,
}

impl Respond for DelayedCallResponder {
    fn respond(&self, _: &Request) -> ResponseTemplate {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let content = self.replies.get(n).cloned().unwrap_or_default();
        let template = ResponseTemplate::new(200).set_body_json(chat_completions_body(&content));
        if n == self.delay_at_index {
            template.set_delay(self.delay)
        } else {
            template
        }
    }
}

/// Like [`sequential_server`], but the call at `delay_at_index` (0-based,
/// across the whole server's lifetime) is held back for `delay` before
/// responding, so a second concurrent call can be observed racing it
/// (spec.md §8's session lock contention scenario).
pub async fn sequential_server_with_delay(
    replies: Vec<&str>,
    delay_at_index: usize,
    delay: Duration,
) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(DelayedCallResponder {
            replies: replies.into_iter().map(str::to_string).collect(),
            calls: AtomicUsize::new(0),
            delay_at_index,
            delay,
        })
        .mount(&server)
        .await;
    server
}

/// Scripts replies by inspecting the outbound prompt rather than call order,
/// for tests where several chat sessions are in flight concurrently (the
/// hypothesis tournament) and a strict sequence can't be guaranteed.
pub struct ScriptedByPrompt {
    pub rules: Vec<(&'static str, &'static str)>,
    pub default_reply: &'static str,
    pub calls: Mutex<Vec<String>>,
}

impl Respond for ScriptedByPrompt {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body = request.body_json::<serde_json::Value>().unwrap_or_default();
        let last_message = body["messages"]
            .as_array()
            .and_then(|m| m.last())
            .and_then(|m| m["content"].as_str())
            .unwrap_or_default()
            .to_string();

        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(last_message.clone());

        let content = self
            .rules
            .iter()
            .find(|(needle, _)| last_message.contains(needle))
            .map(|(_, reply)| *reply)
            .unwrap_or(self.default_reply);

        ResponseTemplate::new(200).set_body_json(chat_completions_body(content))
    }
}

pub async fn scripted_server(responder: ScriptedByPrompt) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(responder)
        .mount(&server)
        .await;
    server
}
