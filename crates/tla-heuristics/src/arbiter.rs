use std::cmp::Reverse;
use std::panic::{self, AssertUnwindSafe};

use tla_protocol::{Advice, AgentKind, Proposal, Snapshot};

use crate::agents::{Agent, BuildAgent, HeroAgent, ResourceAgent};

/// Runs a fixed, ordered list of agents and picks one winner.
///
/// Ties on priority go to the agent registered first.
pub struct Arbiter {
    agents: Vec<Box<dyn Agent>>,
}

impl Default for Arbiter {
    fn default() -> Self {
        Self::standard()
    }
}

impl Arbiter {
    pub fn empty() -> Self {
        Self { agents: Vec::new() }
    }

    /// Resource, build, hero: in that order.
    pub fn standard() -> Self {
        Self::empty()
            .with_agent(ResourceAgent)
            .with_agent(BuildAgent)
            .with_agent(HeroAgent)
    }

    pub fn with_agent(mut self, agent: impl Agent + 'static) -> Self {
        self.agents.push(Box::new(agent));
        self
    }

    pub fn kinds(&self) -> Vec<AgentKind> {
        self.agents.iter().map(|a| a.kind()).collect()
    }

    /// Registration index of the first agent of `kind`.
    pub fn registration_index(&self, kind: AgentKind) -> Option<usize> {
        self.agents.iter().position(|a| a.kind() == kind)
    }

    pub fn evaluate(&self, snapshot: &Snapshot) -> Advice {
        let mut candidates = Vec::with_capacity(self.agents.len());
        for (index, agent) in self.agents.iter().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| agent.propose(snapshot))) {
                Ok(Some(proposal)) => candidates.push((index, proposal)),
                Ok(None) => {}
                Err(_) => {
                    tracing::warn!(agent = %agent.kind(), "agent panicked; treating as abstention");
                }
            }
        }
        arbitrate(candidates)
    }

    /// Rank proposals that were produced elsewhere, using this arbiter's
    /// registration order for ties. Proposals from unregistered agents rank
    /// after registered ones of equal priority.
    pub fn rank(&self, proposals: Vec<Proposal>) -> Advice {
        let candidates = proposals
            .into_iter()
            .map(|p| {
                let index = self.registration_index(p.agent).unwrap_or(usize::MAX);
                (index, p)
            })
            .collect();
        arbitrate(candidates)
    }
}

/// Sort by priority (descending), then by registration index (ascending).
pub fn arbitrate(mut candidates: Vec<(usize, Proposal)>) -> Advice {
    candidates.sort_by_key(|(index, p)| (Reverse(p.priority), *index));
    Advice::from_ranked(candidates.into_iter().map(|(_, p)| p).collect())
}
