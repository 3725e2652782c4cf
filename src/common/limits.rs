//! Compile-time defaults from `spec.md` §6. Kept as plain constants rather
//! than `#[cfg]` features: these bound simulation inputs, not target
//! platform capabilities.

pub const MAX_CORES: usize = 20;
pub const MAX_TASKS: usize = 20;
pub const MAX_LEVELS: usize = 5;
pub const LPD_THRESHOLD: u64 = 10;
pub const SHUTDOWN_THRESHOLD: f64 = 10.0;
pub const TIME_GRANULARITY: f64 = 0.01;
pub const BASE_OPERATING_FREQUENCY: f64 = 1.0;

/// Proportion of HI-criticality utilization below which the partitioner
/// uses a WFD+FFD split instead of pure FFD (`allocator.c`'s `0.40`).
pub const HI_CRIT_WFD_SHARE_THRESHOLD: f64 = 0.40;
