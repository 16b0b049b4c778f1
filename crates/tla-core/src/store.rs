use tla_protocol::{Advice, Snapshot};

/// Holds the current snapshot and the advice derived from it.
#[derive(Clone, Debug, Default)]
pub struct SnapshotStore {
    snapshot: Snapshot,
    advice: Advice,
}

impl SnapshotStore {
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn snapshot_mut(&mut self) -> &mut Snapshot {
        &mut self.snapshot
    }

    pub fn advice(&self) -> &Advice {
        &self.advice
    }

    pub fn set_advice(&mut self, advice: Advice) {
        self.advice = advice;
    }
}
