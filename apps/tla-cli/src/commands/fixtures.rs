use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use tla_core::{load_config, Collector, CollectorRole, Config};
use tla_protocol::Fragment;

/// `ROLE=FILE` pair naming a fragment fixture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixtureSpec {
    pub role: CollectorRole,
    pub path: PathBuf,
}

pub fn parse_fixture(raw: &str) -> Result<FixtureSpec, String> {
    let (role, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ROLE=FILE, got '{raw}'"))?;
    let role = CollectorRole::from_slug(role).ok_or_else(|| {
        format!("unknown role '{role}' (use comprehensive, current_page or background)")
    })?;
    if path.trim().is_empty() {
        return Err("fixture path is empty".into());
    }
    Ok(FixtureSpec {
        role,
        path: PathBuf::from(path),
    })
}

#[derive(Args, Clone, Debug)]
pub struct SourceArgs {
    /// Fragment fixture as ROLE=FILE; repeat for several collectors
    #[arg(long = "fixture", value_name = "ROLE=FILE", value_parser = parse_fixture)]
    pub fixtures: Vec<FixtureSpec>,
    /// Observation target (page URL); defaults to collection.observation
    #[arg(long)]
    pub page: Option<String>,
    /// TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl SourceArgs {
    pub fn config(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => {
                let path = path.to_str().context("config path is not valid UTF-8")?;
                load_config(path).with_context(|| format!("loading config {path}"))
            }
            None => Ok(Config::default()),
        }
    }

    pub fn observation(&self, config: &Config) -> String {
        self.page
            .clone()
            .unwrap_or_else(|| config.collection.observation().to_string())
    }

    pub fn collectors(&self) -> Vec<Arc<dyn Collector>> {
        self.fixtures
            .iter()
            .map(|spec| Arc::new(FixtureCollector::new(spec)) as Arc<dyn Collector>)
            .collect()
    }
}

/// Reads its fixture file on every cycle, so edits show up in `watch`.
/// A missing or malformed file fails that collector only.
pub struct FixtureCollector {
    id: String,
    role: CollectorRole,
    path: PathBuf,
}

impl FixtureCollector {
    pub fn new(spec: &FixtureSpec) -> Self {
        let id = spec
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("fixture")
            .to_string();
        Self {
            id,
            role: spec.role,
            path: spec.path.clone(),
        }
    }
}

async fn read_fragment(path: &Path) -> anyhow::Result<Option<Fragment>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    let fragment = serde_json::from_str(&text)
        .with_context(|| format!("parsing fragment {}", path.display()))?;
    Ok(Some(fragment))
}

#[async_trait::async_trait]
impl Collector for FixtureCollector {
    fn id(&self) -> &str {
        &self.id
    }

    fn role(&self) -> CollectorRole {
        self.role
    }

    async fn collect(&self) -> anyhow::Result<Option<Fragment>> {
        read_fragment(&self.path).await
    }
}
