use std::path::PathBuf;

use once_cell::sync::OnceCell;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{
    fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

/// Target used for per-cycle summaries.
pub const CYCLE_TARGET: &str = "tla.cycle";

static CYCLE_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rotation {
    Minutely,
    Hourly,
    Daily,
}

/// Where the cycle log goes when file logging is enabled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleLog {
    pub dir: PathBuf,
    pub prefix: String,
    pub rotation: Rotation,
}

impl CycleLog {
    /// Reads `TLA_LOG_DIR`, `TLA_LOG_PREFIX` and `TLA_LOG_ROTATION`.
    /// Returns `None` unless a directory is set.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let dir = lookup("TLA_LOG_DIR").filter(|d| !d.trim().is_empty())?;
        let prefix = lookup("TLA_LOG_PREFIX").unwrap_or_else(|| "cycles".into());
        let rotation = match lookup("TLA_LOG_ROTATION")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "hourly" => Rotation::Hourly,
            "minutely" => Rotation::Minutely,
            _ => Rotation::Daily,
        };
        Some(Self {
            dir: PathBuf::from(dir),
            prefix,
            rotation,
        })
    }

    fn appender(&self) -> tracing_appender::rolling::RollingFileAppender {
        match self.rotation {
            Rotation::Hourly => tracing_appender::rolling::hourly(&self.dir, &self.prefix),
            Rotation::Minutely => tracing_appender::rolling::minutely(&self.dir, &self.prefix),
            Rotation::Daily => tracing_appender::rolling::daily(&self.dir, &self.prefix),
        }
    }
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries command output
    let console = fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(console.with_filter(filter));

    match CycleLog::from_env() {
        Some(cycle_log) => {
            if std::fs::create_dir_all(&cycle_log.dir).is_err() {
                tracing::warn!(directory = %cycle_log.dir.display(), "failed to create cycle log directory");
            }
            let (nb, guard) = tracing_appender::non_blocking(cycle_log.appender());
            let _ = CYCLE_GUARD.set(guard);
            let targets = Targets::new().with_target(CYCLE_TARGET, tracing::Level::INFO);
            let cycle_layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(nb)
                .with_filter(targets);
            let _ = registry.with(cycle_layer).try_init();
        }
        None => {
            let _ = registry.try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn file_log_requires_directory() {
        assert_eq!(CycleLog::from_lookup(lookup(&[])), None);
        assert_eq!(CycleLog::from_lookup(lookup(&[("TLA_LOG_DIR", " ")])), None);
    }

    #[test]
    fn defaults_to_daily_cycles_prefix() {
        let log = CycleLog::from_lookup(lookup(&[("TLA_LOG_DIR", "/tmp/tla")])).unwrap();
        assert_eq!(log.prefix, "cycles");
        assert_eq!(log.rotation, Rotation::Daily);
        assert_eq!(log.dir, PathBuf::from("/tmp/tla"));
    }

    #[test]
    fn rotation_is_case_insensitive() {
        let log = CycleLog::from_lookup(lookup(&[
            ("TLA_LOG_DIR", "logs"),
            ("TLA_LOG_ROTATION", "Hourly"),
        ]))
        .unwrap();
        assert_eq!(log.rotation, Rotation::Hourly);
    }

    #[test]
    fn appender_writes_under_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log = CycleLog {
            dir: dir.path().to_path_buf(),
            prefix: "cycles".into(),
            rotation: Rotation::Daily,
        };
        let _appender = log.appender();
        init();
        init();
        tracing::info!(target: CYCLE_TARGET, "smoke");
    }
}
