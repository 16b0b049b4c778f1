use serde::{Deserialize, Serialize};
use tla_protocol::{Culture, LocationState, Production, ResourceSet, Snapshot};

/// Culture points needed to found location number `index`.
pub const DEFAULT_CULTURE_THRESHOLDS: [u64; 11] = [
    0, 0, 2_000, 8_000, 20_000, 40_000, 70_000, 112_000, 168_000, 240_000, 330_000,
];
pub const DEFAULT_GROWTH: f64 = 1.3;

/// Reported instead of a day count when the daily rate cannot close the gap.
pub const NEVER_DAYS: u64 = 999;

const SETTLERS_PER_LOCATION: u32 = 3;
const SETTLER_RESOURCES: ResourceSet = ResourceSet {
    wood: 750,
    clay: 750,
    iron: 750,
    crop: 750,
};

#[derive(Clone, Debug, PartialEq)]
pub struct SettlementTable {
    thresholds: Vec<u64>,
    growth: f64,
}

impl Default for SettlementTable {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_CULTURE_THRESHOLDS.to_vec(),
            growth: DEFAULT_GROWTH,
        }
    }
}

impl SettlementTable {
    /// An empty table falls back to the defaults.
    pub fn new(thresholds: Vec<u64>, growth: f64) -> Self {
        if thresholds.is_empty() {
            return Self::default();
        }
        Self { thresholds, growth }
    }

    /// Requirement for the `target`-th location: the tabulated value when in
    /// range, otherwise the last value scaled by `growth^(target - last_index)`.
    pub fn required_for(&self, target: usize) -> u64 {
        if let Some(value) = self.thresholds.get(target) {
            return *value;
        }
        let last_index = self.thresholds.len() - 1;
        let last = self.thresholds[last_index] as f64;
        let exponent = (target - last_index) as i32;
        (last * self.growth.powi(exponent)).round() as u64
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReadiness {
    /// Location number the requirement applies to (current count + 1).
    pub target_locations: usize,
    pub settlers: u32,
    pub resources: ResourceSet,
    pub culture_points: u64,
    pub current_points: u64,
    pub deficit: u64,
    /// Full days until the deficit closes, or [`NEVER_DAYS`].
    pub days_to_close: u64,
}

pub fn readiness(
    location_count: usize,
    culture: &Culture,
    table: &SettlementTable,
) -> SettlementReadiness {
    let target = location_count + 1;
    let required = table.required_for(target);
    let deficit = required.saturating_sub(culture.current);
    let days_to_close = if culture.daily <= 0 {
        NEVER_DAYS
    } else {
        deficit.div_ceil(culture.daily as u64)
    };
    SettlementReadiness {
        target_locations: target,
        settlers: SETTLERS_PER_LOCATION,
        resources: SETTLER_RESOURCES,
        culture_points: required,
        current_points: culture.current,
        deficit,
        days_to_close,
    }
}

/// Everything a settlement advisor needs in one read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementOverview {
    pub locations: Vec<LocationState>,
    pub culture: Culture,
    pub population: u64,
    pub total_production: Production,
    pub next: SettlementReadiness,
}

impl SettlementOverview {
    pub fn from_snapshot(snapshot: &Snapshot, table: &SettlementTable) -> Self {
        Self {
            locations: snapshot.locations.values().cloned().collect(),
            culture: snapshot.account.culture,
            population: snapshot.account.population,
            total_production: snapshot.total_production(),
            next: readiness(snapshot.locations.len(), &snapshot.account.culture, table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabulated_requirement_is_literal() {
        let table = SettlementTable::default();
        assert_eq!(table.required_for(3), 8_000);
        assert_eq!(table.required_for(10), 330_000);
        assert_eq!(table.required_for(0), 0);
    }

    #[test]
    fn beyond_table_grows_geometrically() {
        let table = SettlementTable::default();
        let expected = (330_000f64 * 1.3f64.powi(2)).round() as u64;
        assert_eq!(table.required_for(12), expected);
        assert_eq!(table.required_for(12), 557_700);
        assert_eq!(table.required_for(11), 429_000);
    }

    #[test]
    fn deficit_and_days() {
        let culture = Culture {
            current: 5_000,
            required: 0,
            daily: 400,
        };
        let r = readiness(2, &culture, &SettlementTable::default());
        assert_eq!(r.target_locations, 3);
        assert_eq!(r.culture_points, 8_000);
        assert_eq!(r.deficit, 3_000);
        assert_eq!(r.days_to_close, 8);
        assert_eq!(r.settlers, 3);
        assert_eq!(r.resources.crop, 750);
    }

    #[test]
    fn surplus_floors_deficit_at_zero() {
        let culture = Culture {
            current: 50_000,
            required: 0,
            daily: 10,
        };
        let r = readiness(1, &culture, &SettlementTable::default());
        assert_eq!(r.deficit, 0);
        assert_eq!(r.days_to_close, 0);
    }

    #[test]
    fn no_daily_progress_is_never() {
        for daily in [0, -25] {
            let culture = Culture {
                current: 0,
                required: 0,
                daily,
            };
            let r = readiness(1, &culture, &SettlementTable::default());
            assert_eq!(r.days_to_close, NEVER_DAYS);
        }
    }

    #[test]
    fn empty_table_uses_defaults() {
        assert_eq!(
            SettlementTable::new(Vec::new(), 2.0),
            SettlementTable::default()
        );
    }
}
