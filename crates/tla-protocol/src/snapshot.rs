use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub type LocationId = String;

/// Stock of the four tracked resources.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResourceSet {
    pub wood: u64,
    pub clay: u64,
    pub iron: u64,
    pub crop: u64,
}

/// Per-hour rates. Crop is the net rate and may be negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Production {
    pub wood: i64,
    pub clay: i64,
    pub iron: i64,
    pub crop: i64,
}

impl Production {
    pub fn min_rate(&self) -> i64 {
        self.wood.min(self.clay).min(self.iron).min(self.crop)
    }

    pub fn saturating_add(self, other: Production) -> Production {
        Production {
            wood: self.wood.saturating_add(other.wood),
            clay: self.clay.saturating_add(other.clay),
            iron: self.iron.saturating_add(other.iron),
            crop: self.crop.saturating_add(other.crop),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Capacity {
    pub warehouse_max: u64,
    pub granary_max: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Coordinates {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildQueueItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Remaining time as shown by the game, usually `h:mm:ss`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_text: Option<String>,
}

/// One location ("village") and its economy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationState {
    pub id: LocationId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    /// Current stock; `None` until a source has reported it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceSet>,
    #[serde(default)]
    pub production: Production,
    /// Storage limits; `None` until a source has reported them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<Capacity>,
    #[serde(default)]
    pub build_queue: Vec<BuildQueueItem>,
}

impl LocationState {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Progress toward the next expansion milestone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Culture {
    pub current: u64,
    pub required: u64,
    /// Points gained per day; zero or negative means no progress.
    pub daily: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Account {
    pub tribe: String,
    pub population: u64,
    pub culture: Culture,
}

pub const UNKNOWN_TRIBE: &str = "Unknown";

impl Default for Account {
    fn default() -> Self {
        Self {
            tribe: UNKNOWN_TRIBE.to_string(),
            population: 0,
            culture: Culture::default(),
        }
    }
}

/// What the observer was looking at when the data was gathered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PageContext {
    /// Resource fields view.
    Resources,
    /// Village center / buildings view.
    Buildings,
    Overview,
    RallyPoint,
    Building,
    Profile,
    Statistics,
    #[default]
    Unknown,
}

impl PageContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageContext::Resources => "resources",
            PageContext::Buildings => "buildings",
            PageContext::Overview => "overview",
            PageContext::RallyPoint => "rally_point",
            PageContext::Building => "building",
            PageContext::Profile => "profile",
            PageContext::Statistics => "statistics",
            PageContext::Unknown => "unknown",
        }
    }

    pub fn from_slug(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "resources" | "dorf1" => PageContext::Resources,
            "buildings" | "dorf2" => PageContext::Buildings,
            "overview" | "dorf3" => PageContext::Overview,
            "rally_point" | "rally" => PageContext::RallyPoint,
            "building" => PageContext::Building,
            "profile" => PageContext::Profile,
            "statistics" => PageContext::Statistics,
            _ => PageContext::Unknown,
        }
    }
}

impl std::fmt::Display for PageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HeroStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_pct: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silver: Option<u64>,
}

/// The canonical reconciled view of the game.
///
/// Locations are keyed by id; a `BTreeMap` keeps iteration deterministic
/// regardless of the order collectors reported them in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub locations: BTreeMap<LocationId, LocationState>,
    #[serde(default)]
    pub account: Account,
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub page: PageContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_location: Option<LocationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero: Option<HeroStats>,
}

impl Snapshot {
    /// The location currently in view, if it is known.
    pub fn focus(&self) -> Option<&LocationState> {
        self.active_location
            .as_ref()
            .and_then(|id| self.locations.get(id))
    }

    pub fn location(&self, id: &str) -> Option<&LocationState> {
        self.locations.get(id)
    }

    /// Sum of every known location's production rates.
    pub fn total_production(&self) -> Production {
        self.locations
            .values()
            .fold(Production::default(), |acc, loc| {
                acc.saturating_add(loc.production)
            })
    }
}
