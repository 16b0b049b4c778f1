//! Request/response handling for the host messaging channel.
//!
//! Every request yields exactly one [`Response`]; failures are reported in
//! the response body rather than as Rust errors.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tla_protocol::{Advice, Snapshot};
use tla_topics::{
    KEY_GAME_CONTEXT, KEY_LAST_UPDATE, MSG_CHAT_MESSAGE_WITH_CONTEXT, MSG_GAME_CONTEXT_UPDATE,
    MSG_GET_GAME_CONTEXT, MSG_REFRESH_DATA, MSG_REQUEST_USER_EMAIL,
};
use tokio::sync::Mutex;

use crate::aggregator::Aggregator;
use crate::kv::KeyValueStore;
use crate::profile::ProfileStore;

const UNKNOWN_MESSAGE: &str = "Unknown message type";
const NO_IDENTITY: &str = "No user identity stored";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum Request {
    GetGameContext,
    ChatMessageWithContext {
        game_context: Value,
        /// Milliseconds since the Unix epoch.
        #[serde(default)]
        timestamp: Option<i64>,
    },
    RequestUserEmail,
    RefreshData {
        #[serde(default)]
        observation: Option<String>,
    },
    GameContextUpdate {
        context: Value,
    },
}

impl Request {
    pub fn kind(&self) -> &'static str {
        match self {
            Request::GetGameContext => MSG_GET_GAME_CONTEXT,
            Request::ChatMessageWithContext { .. } => MSG_CHAT_MESSAGE_WITH_CONTEXT,
            Request::RequestUserEmail => MSG_REQUEST_USER_EMAIL,
            Request::RefreshData { .. } => MSG_REFRESH_DATA,
            Request::GameContextUpdate { .. } => MSG_GAME_CONTEXT_UPDATE,
        }
    }
}

fn is_known_kind(kind: &str) -> bool {
    [
        MSG_GET_GAME_CONTEXT,
        MSG_CHAT_MESSAGE_WITH_CONTEXT,
        MSG_REQUEST_USER_EMAIL,
        MSG_REFRESH_DATA,
        MSG_GAME_CONTEXT_UPDATE,
    ]
    .contains(&kind)
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Snapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advice: Option<Advice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

#[derive(Default)]
struct HostContext {
    context: Option<Value>,
    last_update: Option<i64>,
}

pub struct Router {
    aggregator: Aggregator,
    profiles: ProfileStore,
    kv: Arc<dyn KeyValueStore>,
    host: Mutex<HostContext>,
    observation: String,
}

impl Router {
    pub fn new(aggregator: Aggregator, kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            aggregator,
            profiles: ProfileStore::new(kv.clone()),
            kv,
            host: Mutex::new(HostContext::default()),
            observation: String::new(),
        }
    }

    /// Observation target used by `REFRESH_DATA` when the request has none.
    pub fn with_observation(mut self, observation: impl Into<String>) -> Self {
        self.observation = observation.into();
        self
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    /// Reload the host context persisted by an earlier process.
    pub async fn restore(&self) -> anyhow::Result<bool> {
        let context = self.kv.get(KEY_GAME_CONTEXT).await?;
        let last_update = self.kv.get(KEY_LAST_UPDATE).await?.and_then(|v| v.as_i64());
        let found = context.is_some();
        let mut host = self.host.lock().await;
        host.context = context;
        host.last_update = last_update;
        Ok(found)
    }

    pub async fn handle(&self, request: Request) -> Response {
        let kind = request.kind();
        let response = match request {
            Request::GetGameContext => self.game_context().await,
            Request::ChatMessageWithContext {
                game_context,
                timestamp,
            } => {
                let mut host = self.host.lock().await;
                host.context = Some(game_context);
                host.last_update = Some(timestamp.unwrap_or_else(|| Utc::now().timestamp_millis()));
                Response::ok()
            }
            Request::GameContextUpdate { context } => self.store_context(context).await,
            Request::RefreshData { observation } => {
                let observation = observation.unwrap_or_else(|| self.observation.clone());
                self.aggregator.run_cycle(&observation).await;
                Response {
                    snapshot: Some(self.aggregator.snapshot()),
                    advice: Some(self.aggregator.advice()),
                    ..Response::ok()
                }
            }
            Request::RequestUserEmail => match self.profiles.identity().await {
                Ok(Some(hash)) => Response {
                    user_hash: Some(hash),
                    ..Response::ok()
                },
                Ok(None) => Response::failure(NO_IDENTITY),
                Err(err) => Response::failure(format!("{err:#}")),
            },
        };
        tracing::debug!(kind, success = response.success, "handled host message");
        response
    }

    /// Decode a raw message and handle it. Unrecognized kinds get the
    /// standard "unknown message type" failure.
    pub async fn handle_json(&self, message: &Value) -> Value {
        let response = match Request::deserialize(message) {
            Ok(request) => self.handle(request).await,
            Err(err) => {
                let kind = message.get("type").and_then(Value::as_str).unwrap_or_default();
                if is_known_kind(kind) {
                    Response::failure(format!("Invalid {kind} message: {err}"))
                } else {
                    tracing::warn!(kind, "unknown host message type");
                    Response::failure(UNKNOWN_MESSAGE)
                }
            }
        };
        serde_json::to_value(&response)
            .unwrap_or_else(|err| json!({ "success": false, "error": err.to_string() }))
    }

    async fn game_context(&self) -> Response {
        let host = self.host.lock().await;
        if let Some(context) = &host.context {
            return Response {
                context: Some(context.clone()),
                last_update: host.last_update,
                ..Response::ok()
            };
        }
        drop(host);
        let snapshot = self.aggregator.snapshot();
        match serde_json::to_value(&snapshot) {
            Ok(context) => Response {
                context: Some(context),
                last_update: Some(snapshot.timestamp.timestamp_millis()),
                advice: Some(self.aggregator.advice()),
                ..Response::ok()
            },
            Err(err) => Response::failure(err.to_string()),
        }
    }

    async fn store_context(&self, context: Value) -> Response {
        let now = Utc::now().timestamp_millis();
        {
            let mut host = self.host.lock().await;
            host.context = Some(context.clone());
            host.last_update = Some(now);
        }
        let persisted = async {
            self.kv.set(KEY_GAME_CONTEXT, context).await?;
            self.kv.set(KEY_LAST_UPDATE, json!(now)).await
        };
        match persisted.await {
            Ok(()) => Response::ok(),
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "failed to persist game context");
                Response::failure(format!("{err:#}"))
            }
        }
    }
}
