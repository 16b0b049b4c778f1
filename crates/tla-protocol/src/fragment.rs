use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::snapshot::{
    BuildQueueItem, Capacity, Coordinates, Culture, HeroStats, LocationId, Production, ResourceSet,
};

/// Partial view of one location. Only `id` is mandatory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationFragment {
    pub id: LocationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production: Option<Production>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<Capacity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_queue: Option<Vec<BuildQueueItem>>,
}

impl LocationFragment {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AccountFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tribe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub culture: Option<Culture>,
}

impl AccountFragment {
    pub fn is_empty(&self) -> bool {
        self.tribe.is_none() && self.population.is_none() && self.culture.is_none()
    }
}

/// A partial state contribution from a single collector.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    #[serde(default)]
    pub locations: Vec<LocationFragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountFragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_location: Option<LocationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero: Option<HeroStats>,
}

impl Fragment {
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
            && self.account.as_ref().map_or(true, AccountFragment::is_empty)
            && self.active_location.is_none()
            && self.hero.is_none()
    }
}

/// Incremental update pushed by the live-update listener between cycles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RealtimePatch {
    pub location_id: LocationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production: Option<Production>,
    pub kind: String,
}
