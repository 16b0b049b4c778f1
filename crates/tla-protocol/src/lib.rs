//! Shared data model: the reconciled snapshot, collector fragments,
//! real-time patches and advisory proposals.

mod advice;
mod fragment;
mod snapshot;

pub use advice::*;
pub use fragment::*;
pub use snapshot::*;
