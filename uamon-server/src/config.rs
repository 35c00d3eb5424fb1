use serde::{Deserialize, Serialize};

use crate::constants;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
/// Limits applied when monitored items are created or modified.
pub struct MonitorLimits {
    /// Specifies the minimum sampling interval for this server in
    /// milliseconds. Requested intervals below this are revised up.
    #[serde(default = "defaults::min_sampling_interval_ms")]
    pub min_sampling_interval_ms: f64,
    /// Sampling interval assigned when a request does not specify one.
    #[serde(default = "defaults::default_sampling_interval_ms")]
    pub default_sampling_interval_ms: f64,
    /// Maximum number of values in a monitored item queue. 0 for no cap.
    #[serde(default = "defaults::max_monitored_item_queue_size")]
    pub max_monitored_item_queue_size: usize,
    /// Maximum number of monitored items per subscription, 0 for no limit.
    #[serde(default = "defaults::max_monitored_items_per_sub")]
    pub max_monitored_items_per_sub: usize,
}

impl Default for MonitorLimits {
    fn default() -> Self {
        Self {
            min_sampling_interval_ms: defaults::min_sampling_interval_ms(),
            default_sampling_interval_ms: defaults::default_sampling_interval_ms(),
            max_monitored_item_queue_size: defaults::max_monitored_item_queue_size(),
            max_monitored_items_per_sub: defaults::max_monitored_items_per_sub(),
        }
    }
}

mod defaults {
    use crate::constants;

    pub fn min_sampling_interval_ms() -> f64 {
        constants::MIN_SAMPLING_INTERVAL_MS
    }
    pub fn default_sampling_interval_ms() -> f64 {
        constants::DEFAULT_SAMPLING_INTERVAL_MS
    }
    pub fn max_monitored_item_queue_size() -> usize {
        constants::MAX_MONITORED_ITEM_QUEUE_SIZE
    }
    pub fn max_monitored_items_per_sub() -> usize {
        constants::DEFAULT_MAX_MONITORED_ITEMS_PER_SUB
    }
}

impl MonitorLimits {
    /// Limits that accept everything, for tests and embedded use.
    pub fn unlimited() -> Self {
        Self {
            min_sampling_interval_ms: 0.0,
            default_sampling_interval_ms: constants::DEFAULT_SAMPLING_INTERVAL_MS,
            max_monitored_item_queue_size: 0,
            max_monitored_items_per_sub: 0,
        }
    }
}
