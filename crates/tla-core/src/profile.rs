use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tla_topics::{KEY_PROFILE, KEY_USER_HASH};

use crate::kv::KeyValueStore;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayStyle {
    Aggressive,
    Defensive,
    Economic,
    #[default]
    Balanced,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoldUsage {
    #[default]
    None,
    Minimal,
    Moderate,
    Aggressive,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryGoal {
    TopAttacker,
    TopDefender,
    #[default]
    TopClimber,
    WonderWin,
    Support,
}

/// Focus scores (0..=100) derived from the play style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weights {
    pub economy: u8,
    pub military: u8,
    pub alliance: u8,
    pub risk: u8,
}

impl Weights {
    pub fn for_style(style: PlayStyle) -> Self {
        Self {
            economy: if style == PlayStyle::Economic { 70 } else { 30 },
            military: if style == PlayStyle::Aggressive { 70 } else { 20 },
            alliance: 10,
            risk: if style == PlayStyle::Aggressive { 30 } else { 10 },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub tribe: String,
    pub style: PlayStyle,
    pub gold_usage: GoldUsage,
    pub hours_per_day: f32,
    pub primary_goal: PrimaryGoal,
    pub weights: Weights,
}

impl UserProfile {
    pub fn new(
        tribe: impl Into<String>,
        style: PlayStyle,
        gold_usage: GoldUsage,
        hours_per_day: f32,
        primary_goal: PrimaryGoal,
    ) -> Self {
        Self {
            tribe: tribe.into(),
            style,
            gold_usage,
            hours_per_day,
            primary_goal,
            weights: Weights::for_style(style),
        }
    }
}

/// Lowercase hex SHA-256 of the normalized email.
pub fn identity_token(email: &str) -> String {
    let normalized = email.trim().to_ascii_lowercase();
    hex::encode(Sha256::digest(normalized.as_bytes()))
}

/// Typed access to the profile and identity entries of the host store.
#[derive(Clone)]
pub struct ProfileStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ProfileStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub async fn load(&self) -> anyhow::Result<Option<UserProfile>> {
        match self.kv.get(KEY_PROFILE).await? {
            Some(value) => {
                let profile =
                    serde_json::from_value(value).context("stored profile is malformed")?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    /// Persist `profile`, re-deriving its weights from the play style.
    pub async fn save(&self, profile: &UserProfile) -> anyhow::Result<UserProfile> {
        let mut stored = profile.clone();
        stored.weights = Weights::for_style(stored.style);
        self.kv
            .set(KEY_PROFILE, serde_json::to_value(&stored)?)
            .await?;
        Ok(stored)
    }

    pub async fn identity(&self) -> anyhow::Result<Option<String>> {
        let value = self.kv.get(KEY_USER_HASH).await?;
        Ok(value.and_then(|v| v.as_str().map(str::to_string)))
    }

    /// Hash and store the user's email; only the hash is kept.
    pub async fn set_identity_from_email(&self, email: &str) -> anyhow::Result<String> {
        let token = identity_token(email);
        self.kv
            .set(KEY_USER_HASH, serde_json::Value::String(token.clone()))
            .await?;
        Ok(token)
    }

    pub async fn personalization_enabled(&self) -> anyhow::Result<bool> {
        Ok(self.identity().await?.is_some())
    }
}
