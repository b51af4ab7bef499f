//! Configuration types for the scheduling system.

/// Tunables shared by every stage of the scheduling pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct SchedulerConfig {
    /// How many months past the earliest start a placement probe may look
    /// before giving up and placing at the cap anyway.
    pub probe_limit_months: i64,
    /// Slack allowed when comparing committed usage against capacity.
    pub capacity_epsilon: f64,
    /// Utilization histograms always cover at least this many months.
    pub min_horizon_months: i64,
    /// Months shown after the last scheduled end.
    pub horizon_padding_months: i64,
    /// Multiplier separating project sequence from phase sequence in `Task::order`.
    pub order_stride: u64,
    /// Maximum depth of the structural undo history.
    pub structural_history_limit: usize,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    pub verbosity: u8,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            probe_limit_months: 240,
            capacity_epsilon: 1e-9,
            min_horizon_months: 24,
            horizon_padding_months: 6,
            order_stride: 1000,
            structural_history_limit: 50,
            verbosity: 0,
        }
    }
}

impl SchedulerConfig {
    /// Same configuration with a different verbosity.
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }
}
