//! Canonical event and message kind constants shared across crates.
//!
//! Event kinds are dot.case; host message kinds keep the SCREAMING_CASE
//! spelling used on the extension messaging channel.

// Advice envelope kinds: what triggered the re-evaluation
pub const TOPIC_SNAPSHOT_COLLECTED: &str = "snapshot.collected";
pub const TOPIC_SNAPSHOT_PATCHED: &str = "snapshot.patched";

// Live-update listener patch kinds
pub const PATCH_RESOURCES: &str = "resources";
pub const PATCH_PRODUCTION: &str = "production";

// Host messaging channel
pub const MSG_GET_GAME_CONTEXT: &str = "GET_GAME_CONTEXT";
pub const MSG_CHAT_MESSAGE_WITH_CONTEXT: &str = "CHAT_MESSAGE_WITH_CONTEXT";
pub const MSG_REQUEST_USER_EMAIL: &str = "REQUEST_USER_EMAIL";
pub const MSG_REFRESH_DATA: &str = "REFRESH_DATA";
pub const MSG_GAME_CONTEXT_UPDATE: &str = "GAME_CONTEXT_UPDATE";

// Host key-value store keys
pub const KEY_PROFILE: &str = "profile";
pub const KEY_USER_HASH: &str = "userHash";
pub const KEY_GAME_CONTEXT: &str = "gameContext";
pub const KEY_LAST_UPDATE: &str = "lastUpdate";
