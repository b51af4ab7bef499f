//! Scheduler module: greedy list scheduling, manual pins and rebalance.
//!
//! The base schedule and rebalance share one list scheduler; they differ only
//! in which tasks arrive pre-pinned.

mod core;
mod ledger;
mod overrides;
mod rebalance;

pub use core::{base_schedule, ListScheduler, Placement, Placements};
pub use ledger::{Demand, UsageLedger};
pub use overrides::{apply_overrides, pinned_start};
pub use rebalance::rebalance;
