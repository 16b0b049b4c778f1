use serde::{Deserialize, Serialize};
use tla_protocol::Fragment;

/// Merge precedence class of a collector.
///
/// Fragments are folded in rank order: comprehensive sources first, the
/// current-page source second, background sources last.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectorRole {
    /// Multi-location source; authoritative for the fields it supplies.
    Comprehensive,
    /// Single current-location source; may add or overwrite locations.
    CurrentPage,
    /// Cached or memory-resident data; only fills gaps.
    Background,
}

impl CollectorRole {
    pub fn rank(&self) -> u8 {
        match self {
            CollectorRole::Comprehensive => 0,
            CollectorRole::CurrentPage => 1,
            CollectorRole::Background => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectorRole::Comprehensive => "comprehensive",
            CollectorRole::CurrentPage => "current_page",
            CollectorRole::Background => "background",
        }
    }

    pub fn from_slug(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "comprehensive" | "overview" => Some(CollectorRole::Comprehensive),
            "current_page" | "current" | "page" => Some(CollectorRole::CurrentPage),
            "background" | "memory" | "cache" => Some(CollectorRole::Background),
            _ => None,
        }
    }
}

/// An independent, possibly unreliable data source.
#[async_trait::async_trait]
pub trait Collector: Send + Sync {
    /// Stable name used in logs and cycle reports.
    fn id(&self) -> &str;

    fn role(&self) -> CollectorRole;

    /// Produce a fragment, or `Ok(None)` when nothing is available.
    ///
    /// Implementations bound their own latency; the aggregator applies no
    /// timeout. Errors and panics are tolerated and logged by the caller.
    async fn collect(&self) -> anyhow::Result<Option<Fragment>>;
}

/// Collector returning a fixed fragment on every call.
#[derive(Clone, Debug)]
pub struct StaticCollector {
    id: String,
    role: CollectorRole,
    fragment: Option<Fragment>,
}

impl StaticCollector {
    pub fn new(id: impl Into<String>, role: CollectorRole, fragment: Option<Fragment>) -> Self {
        Self {
            id: id.into(),
            role,
            fragment,
        }
    }
}

#[async_trait::async_trait]
impl Collector for StaticCollector {
    fn id(&self) -> &str {
        &self.id
    }

    fn role(&self) -> CollectorRole {
        self.role
    }

    async fn collect(&self) -> anyhow::Result<Option<Fragment>> {
        Ok(self.fragment.clone())
    }
}

/// What happened to one collector during a cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CollectorOutcome {
    Merged { locations: usize },
    Empty,
    Failed { error: String },
    Panicked,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorReport {
    pub collector: String,
    pub role: CollectorRole,
    #[serde(flatten)]
    pub outcome: CollectorOutcome,
}
