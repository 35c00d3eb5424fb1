//! Default values for the configurable limits.

/// Minimum sampling interval in milliseconds. Requested intervals below
/// this are revised up.
pub const MIN_SAMPLING_INTERVAL_MS: f64 = 10.0;

/// Sampling interval used when a create request does not ask for one.
pub const DEFAULT_SAMPLING_INTERVAL_MS: f64 = 250.0;

/// Cap on the per-item notification queue bound. 0 for no cap.
pub const MAX_MONITORED_ITEM_QUEUE_SIZE: usize = 1000;

/// Default maximum number of monitored items per subscription.
/// 0 for no limit.
pub const DEFAULT_MAX_MONITORED_ITEMS_PER_SUB: usize = 10_000;

/// How long the async sampling driver sleeps when no callback is due.
pub const SAMPLER_IDLE_POLL_MS: u64 = 100;
