//! Collection, merge and advice pipeline for the game assistant.

pub mod aggregator;
pub mod collector;
pub mod config;
pub mod kv;
pub mod merge;
pub mod messaging;
pub mod profile;
pub mod relay;
pub mod settlement;
mod store;

pub use aggregator::{Aggregator, CycleReport};
pub use collector::{Collector, CollectorOutcome, CollectorReport, CollectorRole, StaticCollector};
pub use config::{config_schema_json, load_config, parse_config, write_schema_file, Config};
pub use kv::{KeyValueStore, MemoryStore};
pub use messaging::{Request, Response, Router};
pub use profile::{identity_token, ProfileStore, UserProfile};
pub use settlement::{SettlementOverview, SettlementReadiness, SettlementTable};
