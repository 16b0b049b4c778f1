use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The closed set of advisory agents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Resource,
    Build,
    Hero,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Resource => "resource",
            AgentKind::Build => "build",
            AgentKind::Hero => "hero",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const MAX_PRIORITY: u8 = 100;

/// A candidate recommendation from one agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Proposal {
    pub agent: AgentKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// 0..=100, higher wins.
    pub priority: u8,
}

impl Proposal {
    pub fn new(agent: AgentKind, title: impl Into<String>, priority: u8) -> Self {
        Self {
            agent,
            title: title.into(),
            detail: None,
            priority: priority.min(MAX_PRIORITY),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Arbitration result: the winner plus every candidate, best first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Advice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pick: Option<Proposal>,
    #[serde(default)]
    pub all: Vec<Proposal>,
}

impl Advice {
    pub fn from_ranked(all: Vec<Proposal>) -> Self {
        Self {
            pick: all.first().cloned(),
            all,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pick.is_none()
    }
}
