//! Chat relay contract: request validation, upstream body shaping and the
//! redacted error responses returned to the extension.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatRequest {
    /// Decode and validate a raw request body.
    pub fn parse(body: &Value) -> Result<Self, RelayError> {
        let request =
            Self::deserialize(body).map_err(|err| RelayError::Validation(err.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), RelayError> {
        if self.messages.is_empty() {
            return Err(RelayError::Validation("messages must not be empty".into()));
        }
        if let Some(pos) = self.messages.iter().position(|m| m.role.trim().is_empty()) {
            return Err(RelayError::Validation(format!("message {pos} has no role")));
        }
        Ok(())
    }

    /// Body forwarded upstream, with defaults filled in.
    pub fn upstream_body(&self) -> Value {
        json!({
            "model": self.model.as_deref().unwrap_or(DEFAULT_MODEL),
            "max_tokens": self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "messages": self.messages,
            "temperature": self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("relay credential is not configured")]
    MissingCredential,
    #[error("upstream returned status {status}")]
    Upstream { status: u16, unauthorized: bool },
    #[error("upstream transport failed: {0}")]
    Transport(String),
}

impl RelayError {
    /// Classify a non-success upstream status.
    pub fn from_upstream(status: u16, body: &str) -> Self {
        tracing::warn!(status, body_len = body.len(), "chat upstream rejected request");
        Self::Upstream {
            status,
            unauthorized: status == 401,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::Validation(_) => 400,
            RelayError::MissingCredential | RelayError::Transport(_) => 500,
            RelayError::Upstream { status, .. } => *status,
        }
    }

    /// Client-facing body. Upstream and transport details are never echoed.
    pub fn body(&self) -> Value {
        match self {
            RelayError::Validation(_) => json!({ "error": "Invalid request format" }),
            RelayError::MissingCredential => json!({ "error": "Server configuration error" }),
            RelayError::Upstream { unauthorized, .. } => json!({
                "error": "AI service error",
                "details": if *unauthorized { "Invalid API key" } else { "Service unavailable" },
            }),
            RelayError::Transport(_) => json!({ "error": "Internal server error" }),
        }
    }
}

pub struct UpstreamReply {
    pub status: u16,
    pub body: String,
}

/// The chat-completion service behind the relay.
#[async_trait::async_trait]
pub trait ChatUpstream: Send + Sync {
    async fn complete(&self, credential: &str, body: &Value) -> anyhow::Result<UpstreamReply>;
}

async fn forward(
    upstream: &dyn ChatUpstream,
    credential: Option<&str>,
    body: &Value,
) -> Result<Value, RelayError> {
    let request = ChatRequest::parse(body)?;
    let credential = credential
        .filter(|c| !c.trim().is_empty())
        .ok_or(RelayError::MissingCredential)?;
    let reply = upstream
        .complete(credential, &request.upstream_body())
        .await
        .map_err(|err| RelayError::Transport(format!("{err:#}")))?;
    if !(200..300).contains(&reply.status) {
        return Err(RelayError::from_upstream(reply.status, &reply.body));
    }
    serde_json::from_str(&reply.body).map_err(|err| RelayError::Transport(err.to_string()))
}

/// Handle one relay call; returns the HTTP status and JSON body to send back.
pub async fn relay(
    upstream: &dyn ChatUpstream,
    credential: Option<&str>,
    body: &Value,
) -> (u16, Value) {
    match forward(upstream, credential, body).await {
        Ok(value) => (200, value),
        Err(err) => {
            tracing::warn!(error = %err, "chat relay failed");
            (err.status_code(), err.body())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Canned {
        status: u16,
        body: &'static str,
        seen: Mutex<Option<Value>>,
    }

    impl Canned {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                seen: Mutex::new(None),
            }
        }
    }

    #[async_trait::async_trait]
    impl ChatUpstream for Canned {
        async fn complete(&self, _credential: &str, body: &Value) -> anyhow::Result<UpstreamReply> {
            *self.seen.lock().unwrap() = Some(body.clone());
            Ok(UpstreamReply {
                status: self.status,
                body: self.body.to_string(),
            })
        }
    }

    struct Offline;

    #[async_trait::async_trait]
    impl ChatUpstream for Offline {
        async fn complete(&self, _credential: &str, _body: &Value) -> anyhow::Result<UpstreamReply> {
            anyhow::bail!("connection refused")
        }
    }

    fn hello() -> Value {
        json!({ "messages": [{ "role": "user", "content": "hi" }] })
    }

    #[test]
    fn empty_or_missing_messages_fail_validation() {
        for body in [json!({}), json!({ "messages": [] }), json!({ "messages": "x" })] {
            let err = ChatRequest::parse(&body).unwrap_err();
            assert_eq!(err.status_code(), 400);
            assert_eq!(err.body(), json!({ "error": "Invalid request format" }));
        }
    }

    #[test]
    fn upstream_body_fills_defaults() {
        let req = ChatRequest::parse(&hello()).unwrap();
        let body = req.upstream_body();
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0]["content"], "hi");
    }

    #[test]
    fn unauthorized_is_distinguished() {
        let denied = RelayError::from_upstream(401, "bad key");
        assert_eq!(denied.status_code(), 401);
        assert_eq!(denied.body()["details"], "Invalid API key");

        let busy = RelayError::from_upstream(529, "overloaded");
        assert_eq!(busy.status_code(), 529);
        assert_eq!(busy.body()["details"], "Service unavailable");
    }

    #[tokio::test]
    async fn success_passes_body_through() {
        let upstream = Canned::new(200, r#"{"id":"msg_1","content":[]}"#);
        let (status, body) = relay(&upstream, Some("key"), &hello()).await;
        assert_eq!(status, 200);
        assert_eq!(body["id"], "msg_1");
        let seen = upstream.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen["temperature"].as_f64().map(|t| (t * 10.0).round()), Some(7.0));
    }

    #[tokio::test]
    async fn missing_credential_is_server_error() {
        let upstream = Canned::new(200, "{}");
        let (status, body) = relay(&upstream, None, &hello()).await;
        assert_eq!(status, 500);
        assert_eq!(body["error"], "Server configuration error");
        assert!(upstream.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn upstream_failure_is_redacted() {
        let upstream = Canned::new(401, r#"{"error":"secret detail"}"#);
        let (status, body) = relay(&upstream, Some("key"), &hello()).await;
        assert_eq!(status, 401);
        assert!(!body.to_string().contains("secret detail"));

        let (status, body) = relay(&Offline, Some("key"), &hello()).await;
        assert_eq!(status, 500);
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }
}
