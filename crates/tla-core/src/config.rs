use std::time::Duration;

use anyhow::Result;
use jsonschema::{validator_for, Validator};
use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::settlement::{SettlementTable, DEFAULT_CULTURE_THRESHOLDS, DEFAULT_GROWTH};

const DEFAULT_INTERVAL_SECS: u64 = 30;
const DEFAULT_ADVICE_CAPACITY: usize = 16;

#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
pub struct CollectionConfig {
    /// Seconds between periodic collection cycles (default 30)
    #[serde(default)]
    #[schemars(range(min = 1))]
    pub interval_secs: Option<u64>,
    /// Observation target (page URL) used when a caller supplies none
    #[serde(default)]
    pub observation: Option<String>,
}

impl CollectionConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.unwrap_or(DEFAULT_INTERVAL_SECS).max(1))
    }

    pub fn observation(&self) -> &str {
        self.observation.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SettlementConfig {
    /// Culture points required per location number, starting at location 0
    #[serde(default)]
    #[schemars(length(min = 1))]
    pub thresholds: Option<Vec<u64>>,
    /// Growth factor applied per location beyond the table (default 1.3)
    #[serde(default)]
    #[schemars(range(min = 1.0))]
    pub growth: Option<f64>,
}

impl SettlementConfig {
    pub fn table(&self) -> SettlementTable {
        SettlementTable::new(
            self.thresholds
                .clone()
                .unwrap_or_else(|| DEFAULT_CULTURE_THRESHOLDS.to_vec()),
            self.growth.unwrap_or(DEFAULT_GROWTH),
        )
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
pub struct BusConfig {
    /// Initial handler slots reserved on the outgoing advice bus
    #[serde(default)]
    pub advice_capacity: Option<usize>,
}

impl BusConfig {
    pub fn advice_capacity(&self) -> usize {
        self.advice_capacity.unwrap_or(DEFAULT_ADVICE_CAPACITY)
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub settlement: SettlementConfig,
    #[serde(default)]
    pub bus: BusConfig,
}

static CONFIG_SCHEMA: Lazy<Validator> = Lazy::new(|| {
    let schema = schemars::schema_for!(Config);
    let schema_value = serde_json::to_value(&schema).expect("schema value");
    validator_for(&schema_value).expect("valid schema")
});

/// Returns the JSON schema describing the configuration structure.
///
/// # Panics
///
/// Panics if schema generation fails; this indicates a programming error.
pub fn config_schema_json() -> serde_json::Value {
    let schema = schemars::schema_for!(Config);
    serde_json::to_value(&schema).expect("schema json")
}

pub fn write_schema_file(path: &str) -> std::io::Result<()> {
    let schema_json = config_schema_json();
    std::fs::write(path, serde_json::to_string_pretty(&schema_json)?)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let raw: toml::Value = toml::from_str(content)?;
    let json_value = serde_json::to_value(&raw)?;
    let validation_errors: Vec<_> = CONFIG_SCHEMA
        .iter_errors(&json_value)
        .map(|e| e.to_string())
        .collect();
    if !validation_errors.is_empty() {
        return Err(anyhow::anyhow!(validation_errors.join(", ")));
    }
    let cfg: Config = toml::from_str(content)?;
    Ok(cfg)
}

pub fn load_config(path: &str) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_when_sections_missing() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.collection.interval(), Duration::from_secs(30));
        assert_eq!(cfg.collection.observation(), "");
        assert_eq!(cfg.settlement.table(), SettlementTable::default());
        assert_eq!(cfg.bus.advice_capacity(), 16);
    }

    #[test]
    fn loads_settlement_overrides_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[collection]\ninterval_secs = 5\nobservation = \"https://x/dorf1.php\"\n\n[settlement]\nthresholds = [0, 0, 100]\ngrowth = 2.0\n"
        )
        .unwrap();

        let cfg = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.collection.interval(), Duration::from_secs(5));
        assert_eq!(cfg.collection.observation(), "https://x/dorf1.php");
        let table = cfg.settlement.table();
        assert_eq!(table.required_for(2), 100);
        assert_eq!(table.required_for(4), 400);
    }

    #[test]
    fn schema_rejects_wrong_types() {
        let err = parse_config("[collection]\ninterval_secs = \"soon\"\n").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn schema_mentions_sections() {
        let schema = config_schema_json();
        let text = schema.to_string();
        assert!(text.contains("collection"));
        assert!(text.contains("settlement"));
    }
}
