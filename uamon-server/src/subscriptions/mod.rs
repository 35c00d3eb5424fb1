//! Subscriptions and monitored items: the data change monitoring
//! engine.
//!
//! Clients create [`Subscription`]s holding [`MonitoredItem`]s. Each
//! item periodically samples one attribute of one node and, when the
//! sampled value has changed under the item's trigger filter, enqueues
//! a [`Notification`] in two places at once: the item's own bounded
//! FIFO and the subscription-global queue the publish path drains.

mod engine;
mod monitored_item;
mod notification;
mod scheduler;
mod subscription;

pub use engine::{run_sampler, MonitoringEngine};
pub use monitored_item::{MonitoredItem, MonitoredItemType};
pub use notification::{Notification, NotificationId};
pub use scheduler::{CallbackId, SamplingScheduler};
pub use subscription::{NotificationQueue, Subscription};

use uamon_types::ReadValueId;

/// Identifies a subscription within the engine.
pub type SubscriptionId = u32;

/// Identifies a monitored item within the engine.
pub type MonitoredItemId = u32;

/// The tunable parameters of a monitored item. Requested values are
/// revised against the engine limits before they take effect.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoringParameters {
    /// How often to sample, in milliseconds.
    pub sampling_interval: f64,
    /// Requested bound on the item's notification queue. Revised to at
    /// least 1.
    pub queue_size: u32,
    /// On overflow, discard the oldest entry; otherwise the second
    /// newest is discarded and the oldest history kept.
    pub discard_oldest: bool,
    /// Which components of the sampled value trigger a notification.
    pub trigger: uamon_types::DataChangeTrigger,
    /// Which timestamps the sampled values carry.
    pub timestamps_to_return: uamon_types::TimestampsToReturn,
}

impl Default for MonitoringParameters {
    fn default() -> Self {
        Self {
            sampling_interval: crate::constants::DEFAULT_SAMPLING_INTERVAL_MS,
            queue_size: 1,
            discard_oldest: true,
            trigger: Default::default(),
            timestamps_to_return: Default::default(),
        }
    }
}

/// A request to create one monitored item.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonitoredItemCreateRequest {
    /// The node attribute to monitor.
    pub item_to_monitor: ReadValueId,
    /// What kind of notifications the item produces.
    pub monitored_item_type: MonitoredItemType,
    /// The requested monitoring parameters.
    pub requested_parameters: MonitoringParameters,
}
