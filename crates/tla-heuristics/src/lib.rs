//! Advisory agents and the arbiter that turns their proposals into advice.
//!
//! Every agent is a pure function of a [`Snapshot`](tla_protocol::Snapshot);
//! the arbiter evaluates them in registration order, isolates failures, and
//! returns the winner alongside the full ranked list.

pub mod agents;
pub mod arbiter;
mod time_text;

pub use agents::{Agent, BuildAgent, HeroAgent, ResourceAgent};
pub use arbiter::{arbitrate, Arbiter};
pub use time_text::secs_until;
