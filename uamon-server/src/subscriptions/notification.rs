use uamon_types::DataValue;

use super::MonitoredItemId;

/// Identifies one queued notification within its subscription. Ids are
/// allocated from a per-subscription monotonic counter and never
/// reused, so a stale id simply fails to resolve.
pub type NotificationId = u64;

/// One sampled value waiting to be published.
///
/// A notification is a member of two ordered queues: it is owned by
/// value in its monitored item's local queue, and referenced by id from
/// the subscription's global queue. Removing it from either side goes
/// through operations that maintain both.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub(crate) id: NotificationId,
    pub(crate) monitored_item_id: MonitoredItemId,
    pub(crate) value: DataValue,
}

impl Notification {
    /// The id of this notification within its subscription.
    pub fn id(&self) -> NotificationId {
        self.id
    }

    /// The monitored item this notification was sampled by.
    pub fn monitored_item_id(&self) -> MonitoredItemId {
        self.monitored_item_id
    }

    /// The sampled value.
    pub fn value(&self) -> &DataValue {
        &self.value
    }

    /// Consume the notification, yielding the sampled value.
    pub fn into_value(self) -> DataValue {
        self.value
    }
}
