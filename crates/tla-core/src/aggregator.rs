use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use tla_events::{Bus, Envelope, Subscription};
use tla_heuristics::Arbiter;
use tla_protocol::{Advice, PageContext, Production, RealtimePatch, Snapshot};
use tla_topics::{TOPIC_SNAPSHOT_COLLECTED, TOPIC_SNAPSHOT_PATCHED};

use crate::collector::{Collector, CollectorOutcome, CollectorReport};
use crate::config::Config;
use crate::merge;
use crate::settlement::{self, SettlementOverview, SettlementReadiness, SettlementTable};
use crate::store::SnapshotStore;

/// Summary of one collection cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub page: PageContext,
    pub location_count: usize,
    /// One entry per collector, in merge order.
    pub collectors: Vec<CollectorReport>,
}

impl CycleReport {
    pub fn failures(&self) -> usize {
        self.collectors
            .iter()
            .filter(|r| {
                matches!(
                    r.outcome,
                    CollectorOutcome::Failed { .. } | CollectorOutcome::Panicked
                )
            })
            .count()
    }
}

/// Owns the snapshot, runs collectors and keeps advice current.
///
/// Cheap to clone; all clones share one store and one advice bus.
#[derive(Clone)]
pub struct Aggregator {
    inner: Arc<AggregatorInner>,
}

struct AggregatorInner {
    collectors: Vec<Arc<dyn Collector>>,
    arbiter: Arbiter,
    store: RwLock<SnapshotStore>,
    advice_bus: Bus<Envelope<Advice>>,
    settlement: SettlementTable,
}

impl Aggregator {
    pub fn new(collectors: Vec<Arc<dyn Collector>>) -> Self {
        Self::with_config(collectors, &Config::default())
    }

    pub fn with_config(collectors: Vec<Arc<dyn Collector>>, config: &Config) -> Self {
        Self::with_arbiter(collectors, Arbiter::standard(), config)
    }

    pub fn with_arbiter(
        collectors: Vec<Arc<dyn Collector>>,
        arbiter: Arbiter,
        config: &Config,
    ) -> Self {
        Self {
            inner: Arc::new(AggregatorInner {
                collectors,
                arbiter,
                store: RwLock::new(SnapshotStore::default()),
                advice_bus: Bus::new(config.bus.advice_capacity()),
                settlement: config.settlement.table(),
            }),
        }
    }

    fn read_store(&self) -> RwLockReadGuard<'_, SnapshotStore> {
        self.inner
            .store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_store(&self) -> RwLockWriteGuard<'_, SnapshotStore> {
        self.inner
            .store
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run every collector once and fold the results into the snapshot.
    ///
    /// Collectors run concurrently; folding starts only after all of them
    /// have settled. A failing or panicking collector contributes nothing.
    pub async fn run_cycle(&self, observation: &str) -> CycleReport {
        let started_at = Utc::now();
        let runs = self.inner.collectors.iter().map(|collector| {
            let collector = collector.clone();
            async move {
                let result = AssertUnwindSafe(collector.collect()).catch_unwind().await;
                (collector, result)
            }
        });
        let mut results = join_all(runs).await;
        results.sort_by_key(|(collector, _)| collector.role().rank());

        let mut reports = Vec::with_capacity(results.len());
        let (advice, page, location_count) = {
            let mut store = self.write_store();
            let snapshot = store.snapshot_mut();
            for (collector, result) in results {
                let outcome = match result {
                    Ok(Ok(Some(fragment))) => {
                        let locations = merge::fold_fragment(snapshot, collector.role(), &fragment);
                        tracing::debug!(
                            collector = collector.id(),
                            role = collector.role().as_str(),
                            locations,
                            "folded fragment"
                        );
                        CollectorOutcome::Merged { locations }
                    }
                    Ok(Ok(None)) => CollectorOutcome::Empty,
                    Ok(Err(err)) => {
                        tracing::warn!(collector = collector.id(), error = %format!("{err:#}"), "collector failed");
                        CollectorOutcome::Failed {
                            error: format!("{err:#}"),
                        }
                    }
                    Err(_) => {
                        tracing::warn!(collector = collector.id(), "collector panicked");
                        CollectorOutcome::Panicked
                    }
                };
                reports.push(CollectorReport {
                    collector: collector.id().to_string(),
                    role: collector.role(),
                    outcome,
                });
            }
            snapshot.timestamp = Utc::now();
            snapshot.page = merge::classify_page(observation);
            let page = snapshot.page;
            let location_count = snapshot.locations.len();
            let advice = self.inner.arbiter.evaluate(store.snapshot());
            store.set_advice(advice.clone());
            (advice, page, location_count)
        };

        let report = CycleReport {
            started_at,
            finished_at: Utc::now(),
            page,
            location_count,
            collectors: reports,
        };
        tracing::info!(
            target: "tla.cycle",
            locations = report.location_count,
            page = %report.page,
            failures = report.failures(),
            pick = advice.pick.as_ref().map(|p| p.title.as_str()).unwrap_or("-"),
            "collection cycle complete"
        );
        self.inner
            .advice_bus
            .publish(&Envelope::new(TOPIC_SNAPSHOT_COLLECTED, advice));
        report
    }

    /// Apply a live update and re-evaluate advice. Returns false when the
    /// location is unknown, in which case nothing changes.
    pub fn apply_patch(&self, patch: &RealtimePatch) -> bool {
        let advice = {
            let mut store = self.write_store();
            if !merge::apply_patch(store.snapshot_mut(), patch) {
                tracing::debug!(location = %patch.location_id, kind = %patch.kind, "patch for unknown location ignored");
                return false;
            }
            let advice = self.inner.arbiter.evaluate(store.snapshot());
            store.set_advice(advice.clone());
            advice
        };
        self.inner
            .advice_bus
            .publish(&Envelope::new(TOPIC_SNAPSHOT_PATCHED, advice));
        true
    }

    /// Apply every patch published on `patches` until the subscription is
    /// cancelled.
    pub fn attach(&self, patches: &Bus<RealtimePatch>) -> Subscription {
        let this = self.clone();
        patches.subscribe(move |patch| {
            this.apply_patch(patch);
        })
    }

    /// Point-in-time copy of the snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.read_store().snapshot().clone()
    }

    pub fn advice(&self) -> Advice {
        self.read_store().advice().clone()
    }

    /// Advice published after every cycle and every accepted patch.
    pub fn advice_bus(&self) -> &Bus<Envelope<Advice>> {
        &self.inner.advice_bus
    }

    pub fn total_production(&self) -> Production {
        self.read_store().snapshot().total_production()
    }

    pub fn settlement_readiness(&self) -> SettlementReadiness {
        let store = self.read_store();
        let snapshot = store.snapshot();
        settlement::readiness(
            snapshot.locations.len(),
            &snapshot.account.culture,
            &self.inner.settlement,
        )
    }

    /// Run a fresh cycle, then report everything a settlement advisor needs.
    pub async fn settlement_overview(&self, observation: &str) -> SettlementOverview {
        self.run_cycle(observation).await;
        SettlementOverview::from_snapshot(self.read_store().snapshot(), &self.inner.settlement)
    }

    /// Run cycles every `period` until `shutdown` resolves. The first cycle
    /// runs immediately. Returns the number of completed cycles.
    pub async fn run_periodic<F>(&self, observation: &str, period: Duration, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);
        let mut cycles = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.run_cycle(observation).await;
                    cycles += 1;
                }
            }
        }
        tracing::info!(target: "tla.cycle", cycles, "periodic collection stopped");
        cycles
    }
}
