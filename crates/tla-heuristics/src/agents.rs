use tla_protocol::{AgentKind, PageContext, Proposal, Snapshot};

use crate::time_text::secs_until;

/// A pure evaluator over the current snapshot.
///
/// Implementations must not have side effects; the arbiter may call them in
/// any context and treats a panic as an abstention.
pub trait Agent: Send + Sync {
    fn kind(&self) -> AgentKind;

    fn propose(&self, snapshot: &Snapshot) -> Option<Proposal>;
}

pub const PRIORITY_CROP_DEFICIT: u8 = 95;
pub const PRIORITY_STORAGE_OVERFLOW: u8 = 80;
pub const PRIORITY_IDLE_QUEUE: u8 = 70;
pub const PRIORITY_HERO_HEAL: u8 = 65;
pub const PRIORITY_LOW_YIELD: u8 = 55;
pub const PRIORITY_QUEUE_NEXT: u8 = 50;

const STORAGE_ALERT_RATIO: f64 = 0.9;
const LOW_YIELD_PER_HOUR: i64 = 100;
const QUEUE_SOON_SECS: u64 = 15 * 60;
const HERO_HEAL_BELOW_PCT: u8 = 60;

/// Crop deficit, storage overflow and low-yield production.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResourceAgent;

impl Agent for ResourceAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Resource
    }

    fn propose(&self, snapshot: &Snapshot) -> Option<Proposal> {
        let loc = snapshot.focus()?;
        // Unknown stock or limits: nothing to judge.
        let (res, cap) = (loc.resources?, loc.capacity?);
        let net_crop = loc.production.crop;

        if net_crop < 0 {
            return Some(
                Proposal::new(self.kind(), "Fix negative crop", PRIORITY_CROP_DEFICIT).with_detail(
                    format!(
                        "Net crop is {net_crop}/h. Queue crop fields or reduce consumption."
                    ),
                ),
            );
        }

        let warehouse = utilization(res.wood.max(res.clay).max(res.iron), cap.warehouse_max);
        let granary = utilization(res.crop, cap.granary_max);
        let over = |u: Option<f64>| u.is_some_and(|ratio| ratio > STORAGE_ALERT_RATIO);

        if over(warehouse) || over(granary) {
            let detail = if over(warehouse) {
                format!(
                    "Warehouse at {}% of capacity. Start a build or trade.",
                    percent(warehouse)
                )
            } else {
                format!(
                    "Granary at {}% of capacity. Spend or sell crop.",
                    percent(granary)
                )
            };
            return Some(
                Proposal::new(self.kind(), "Spend before overflow", PRIORITY_STORAGE_OVERFLOW)
                    .with_detail(detail),
            );
        }

        if snapshot.page == PageContext::Resources {
            let min_rate = loc.production.min_rate();
            if min_rate > 0 && min_rate < LOW_YIELD_PER_HOUR {
                return Some(
                    Proposal::new(self.kind(), "Upgrade low-yield fields", PRIORITY_LOW_YIELD)
                        .with_detail(format!(
                            "Lowest income is {min_rate}/h. Balance wood, clay, iron and crop."
                        )),
                );
            }
        }

        None
    }
}

fn utilization(amount: u64, capacity: u64) -> Option<f64> {
    if capacity == 0 {
        return None;
    }
    Some(amount as f64 / capacity as f64)
}

fn percent(ratio: Option<f64>) -> u64 {
    ratio.map_or(0, |r| (r * 100.0).round() as u64)
}

/// Keeps the construction queue busy.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuildAgent;

impl Agent for BuildAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Build
    }

    fn propose(&self, snapshot: &Snapshot) -> Option<Proposal> {
        let queue = snapshot
            .focus()
            .map(|loc| loc.build_queue.as_slice())
            .unwrap_or_default();

        let Some(first) = queue.first() else {
            let detail = if snapshot.page == PageContext::Buildings {
                "No buildings queued. Add an upgrade now."
            } else {
                "Open the village center and queue a building."
            };
            return Some(
                Proposal::new(self.kind(), "Idle build queue", PRIORITY_IDLE_QUEUE)
                    .with_detail(detail),
            );
        };

        let eta = first.time_text.as_deref().and_then(secs_until)?;
        if eta < QUEUE_SOON_SECS {
            let minutes = ((eta as f64 / 60.0).round() as u64).max(1);
            return Some(
                Proposal::new(self.kind(), "Queue next build", PRIORITY_QUEUE_NEXT)
                    .with_detail(format!("Next completes in ~{minutes}m.")),
            );
        }
        None
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct HeroAgent;

impl Agent for HeroAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Hero
    }

    fn propose(&self, snapshot: &Snapshot) -> Option<Proposal> {
        let health = snapshot.hero.as_ref()?.health_pct?;
        if health < HERO_HEAL_BELOW_PCT {
            return Some(
                Proposal::new(self.kind(), "Heal hero", PRIORITY_HERO_HEAL).with_detail(format!(
                    "Health {health}%. Consider a salve or wait for regeneration."
                )),
            );
        }
        None
    }
}
