use std::collections::VecDeque;

use hashbrown::HashMap;
use log::{error, warn};

use uamon_types::StatusCode;

use crate::address_space::AddressSpaceReader;

use super::{
    monitored_item::MonitoredItem,
    notification::{Notification, NotificationId},
    MonitoredItemId, SubscriptionId,
};

/// One entry in the subscription-global queue: a key into the owning
/// item's local queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GlobalEntry {
    pub notification_id: NotificationId,
    pub monitored_item_id: MonitoredItemId,
}

/// The subscription-global notification queue.
///
/// Holds keys in insertion order across all items of the subscription,
/// plus the pending/ready accounting the publish path relies on. Every
/// entry is counted in exactly one of the two buckets; dequeuing
/// decrements pending first.
#[derive(Debug, Default)]
pub struct NotificationQueue {
    entries: VecDeque<GlobalEntry>,
    pending: usize,
    ready: usize,
    next_notification_id: NotificationId,
}

impl NotificationQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Allocate the id for a notification about to be enqueued.
    pub(crate) fn next_id(&mut self) -> NotificationId {
        self.next_notification_id += 1;
        self.next_notification_id
    }

    /// Append a new entry at the tail, counted as pending.
    pub(crate) fn push_back(&mut self, notification_id: NotificationId, item: MonitoredItemId) {
        self.entries.push_back(GlobalEntry {
            notification_id,
            monitored_item_id: item,
        });
        self.pending += 1;
    }

    /// Replace an evicted victim with the newcomer that forced it out.
    /// The victim's entry is removed and the newcomer appended in its
    /// own insertion position; the counters are left untouched, so the
    /// newcomer inherits the victim's pending/ready bucket.
    pub(crate) fn replace(
        &mut self,
        victim: NotificationId,
        newcomer: NotificationId,
        item: MonitoredItemId,
    ) {
        if let Some(index) = self
            .entries
            .iter()
            .position(|e| e.notification_id == victim)
        {
            self.entries.remove(index);
        } else {
            debug_assert!(false, "victim {} missing from the global queue", victim);
        }
        self.entries.push_back(GlobalEntry {
            notification_id: newcomer,
            monitored_item_id: item,
        });
    }

    /// Remove an entry, decrementing the matching counter, pending
    /// first.
    pub(crate) fn remove(&mut self, notification_id: NotificationId) {
        if let Some(index) = self
            .entries
            .iter()
            .position(|e| e.notification_id == notification_id)
        {
            self.entries.remove(index);
            self.decrement();
        }
    }

    /// Remove the head entry, decrementing the matching counter,
    /// pending first.
    pub(crate) fn pop_front(&mut self) -> Option<GlobalEntry> {
        let entry = self.entries.pop_front()?;
        self.decrement();
        Some(entry)
    }

    fn decrement(&mut self) {
        if self.pending > 0 {
            self.pending -= 1;
        } else {
            debug_assert!(self.ready > 0, "counters out of sync with the queue");
            self.ready = self.ready.saturating_sub(1);
        }
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &GlobalEntry> + '_ {
        self.entries.iter()
    }

    /// Number of queued entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no notifications are queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Notifications enqueued since the last publish boundary.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Notifications already prepared for a publish response.
    pub fn ready(&self) -> usize {
        self.ready
    }

    /// Publish boundary: everything pending becomes ready.
    pub fn promote_pending(&mut self) {
        self.ready += self.pending;
        self.pending = 0;
    }
}

/// A container of monitored items sharing one global notification
/// queue.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    session_id: u32,
    items: HashMap<MonitoredItemId, MonitoredItem>,
    queue: NotificationQueue,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, session_id: u32) -> Self {
        Self {
            id,
            session_id,
            items: HashMap::new(),
            queue: NotificationQueue::new(),
        }
    }

    /// The id of this subscription.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// The session this subscription belongs to.
    pub fn session_id(&self) -> u32 {
        self.session_id
    }

    /// The number of monitored items.
    pub fn monitored_item_count(&self) -> usize {
        self.items.len()
    }

    /// One monitored item by id.
    pub fn item(&self, id: MonitoredItemId) -> Option<&MonitoredItem> {
        self.items.get(&id)
    }

    pub(crate) fn item_mut(&mut self, id: MonitoredItemId) -> Option<&mut MonitoredItem> {
        self.items.get_mut(&id)
    }

    /// The monitored items, in no particular order.
    pub fn items(&self) -> impl Iterator<Item = &MonitoredItem> + '_ {
        self.items.values()
    }

    pub(crate) fn item_ids(&self) -> impl Iterator<Item = MonitoredItemId> + '_ {
        self.items.keys().copied()
    }

    pub(crate) fn insert_item(&mut self, item: MonitoredItem) {
        self.items.insert(item.id(), item);
    }

    pub(crate) fn queue_mut(&mut self) -> &mut NotificationQueue {
        &mut self.queue
    }

    /// The global queue and its counters.
    pub fn notification_queue(&self) -> &NotificationQueue {
        &self.queue
    }

    /// The queued notifications in publish order, head first.
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> + '_ {
        self.queue.entries().filter_map(|entry| {
            self.items
                .get(&entry.monitored_item_id)
                .and_then(|item| item.notification(entry.notification_id))
        })
    }

    /// Remove and return the notification at the head of the global
    /// queue, removing it from the owning item's local queue as well.
    /// The matching counter is decremented, pending first.
    pub fn dequeue(&mut self) -> Option<Notification> {
        while let Some(entry) = self.queue.pop_front() {
            match self
                .items
                .get_mut(&entry.monitored_item_id)
                .and_then(|item| item.take_notification(entry.notification_id))
            {
                Some(notification) => return Some(notification),
                None => {
                    // Fails closed: a key with no payload cannot be
                    // published twice or dangle.
                    error!(
                        "Subscription {} | MonitoredItem {} | Global queue entry without a local notification",
                        self.id, entry.monitored_item_id
                    );
                }
            }
        }
        None
    }

    /// Remove one notification by id from both queues, decrementing the
    /// matching counter, pending first.
    pub fn remove(&mut self, id: NotificationId) -> Option<Notification> {
        let item_id = self
            .queue
            .entries()
            .find(|e| e.notification_id == id)?
            .monitored_item_id;
        self.queue.remove(id);
        self.items
            .get_mut(&item_id)
            .and_then(|item| item.take_notification(id))
    }

    /// Publish boundary: everything pending becomes ready.
    pub fn promote_pending(&mut self) {
        self.queue.promote_pending();
    }

    /// Run one sampling tick for the given item. Returns whether a
    /// notification was produced. Ticks for an item deleted while the
    /// callback was in flight fall through to a no-op.
    pub(crate) fn sample_monitored_item(
        &mut self,
        id: MonitoredItemId,
        reader: &dyn AddressSpaceReader,
    ) -> bool {
        let Some(item) = self.items.get_mut(&id) else {
            return false;
        };
        item.sample(&mut self.queue, reader, self.session_id)
    }

    /// Apply revised monitoring parameters to one item. Returns whether
    /// the sampling interval changed, or `None` for an unknown item.
    pub(crate) fn modify_monitored_item(
        &mut self,
        id: MonitoredItemId,
        params: &super::MonitoringParameters,
    ) -> Option<bool> {
        let item = self.items.get_mut(&id)?;
        Some(item.set_parameters(&mut self.queue, params))
    }

    /// Delete one monitored item, draining its notifications from both
    /// queues. The caller must have unregistered the sampling callback
    /// first.
    pub(crate) fn delete_monitored_item(
        &mut self,
        id: MonitoredItemId,
    ) -> Result<(), StatusCode> {
        let Some(mut item) = self.items.remove(&id) else {
            return Err(StatusCode::BadMonitoredItemIdInvalid);
        };
        warn!(
            "Subscription {} | MonitoredItem {} | Delete the monitored item",
            self.id, id
        );
        // Clear the queued samples from the global queue; dropping the
        // item afterwards releases the payloads.
        for notification in item.drain_queue() {
            self.queue.remove(notification.id());
        }
        Ok(())
    }
}
