use std::{collections::VecDeque, io::Cursor};

use log::debug;

use uamon_types::{
    AttributeId, BinaryEncodable, DataChangeTrigger, DataValue, NodeId, ReadValueId, StatusCode,
    TimestampsToReturn, UAString, INFO_BITS_OVERFLOW, INFO_TYPE_DATA_VALUE,
};

use crate::address_space::{AddressSpaceReader, SampledValue};

use super::{
    notification::{Notification, NotificationId},
    scheduler::CallbackId,
    subscription::NotificationQueue,
    MonitoredItemId, MonitoringParameters, SubscriptionId,
};

/// Size of the stack buffer a sample tick encodes into. Heap memory is
/// only allocated when the encoded value exceeds this, or when a sample
/// is kept and its snapshot has to outlive the tick.
pub(crate) const VALUE_ENCODING_MAX_STACK: usize = 512;

/// What kind of notifications an item produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitoredItemType {
    /// Sample an attribute and report value changes.
    #[default]
    DataChange,
    /// Report events. Not implemented: sampling an event item is a
    /// no-op, but the item participates in lifecycle management.
    Event,
}

/// Where a comparison encoding ended up.
enum ValueEncoding {
    /// The encoding fit in the caller's stack buffer; holds its length.
    Stack(usize),
    /// The encoding was too large and went to the heap.
    Heap(Vec<u8>),
}

/// The per-(node, attribute) sampler and its bounded notification
/// queue.
#[derive(Debug)]
pub struct MonitoredItem {
    id: MonitoredItemId,
    subscription_id: SubscriptionId,
    item_type: MonitoredItemType,
    node_id: NodeId,
    attribute_id: AttributeId,
    index_range: UAString,
    timestamps_to_return: TimestampsToReturn,
    trigger: DataChangeTrigger,
    sampling_interval: f64,
    max_queue_size: usize,
    discard_oldest: bool,
    /// Local FIFO, tail = newest. Its length never exceeds
    /// `max_queue_size` outside of `ensure_queue_space`.
    queue: VecDeque<Notification>,
    /// Comparison encoding of the last kept sample. Empty until the
    /// first sample is kept.
    last_sampled_value: Vec<u8>,
    sample_callback_id: Option<CallbackId>,
}

impl MonitoredItem {
    pub(crate) fn new(
        item_type: MonitoredItemType,
        id: MonitoredItemId,
        subscription_id: SubscriptionId,
        node_id: NodeId,
        attribute_id: AttributeId,
        index_range: UAString,
        params: &MonitoringParameters,
    ) -> Self {
        Self {
            id,
            subscription_id,
            item_type,
            node_id,
            attribute_id,
            index_range,
            timestamps_to_return: params.timestamps_to_return,
            trigger: params.trigger,
            sampling_interval: params.sampling_interval,
            max_queue_size: (params.queue_size as usize).max(1),
            discard_oldest: params.discard_oldest,
            queue: VecDeque::new(),
            last_sampled_value: Vec::new(),
            sample_callback_id: None,
        }
    }

    /// The id of this item within its subscription.
    pub fn id(&self) -> MonitoredItemId {
        self.id
    }

    /// The kind of notifications this item produces.
    pub fn item_type(&self) -> MonitoredItemType {
        self.item_type
    }

    /// The node this item monitors.
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// The attribute this item monitors.
    pub fn attribute_id(&self) -> AttributeId {
        self.attribute_id
    }

    /// The active change trigger.
    pub fn trigger(&self) -> DataChangeTrigger {
        self.trigger
    }

    /// The sampling interval in milliseconds.
    pub fn sampling_interval(&self) -> f64 {
        self.sampling_interval
    }

    /// The queue bound, always at least 1.
    pub fn max_queue_size(&self) -> usize {
        self.max_queue_size
    }

    /// Whether overflow discards the oldest entry (or the second
    /// newest).
    pub fn discard_oldest(&self) -> bool {
        self.discard_oldest
    }

    /// The number of queued notifications.
    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// The queued notifications, oldest first.
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> + '_ {
        self.queue.iter()
    }

    /// True while a sampling callback registration is held.
    pub fn sample_callback_registered(&self) -> bool {
        self.sample_callback_id.is_some()
    }

    pub(crate) fn set_sample_callback_id(&mut self, id: CallbackId) {
        self.sample_callback_id = Some(id);
    }

    /// Clears the registration and yields the callback id for removal
    /// from the scheduler. Clearing before removing means a tick that
    /// still checks the flag sees it unregistered and does nothing.
    pub(crate) fn take_sample_callback_id(&mut self) -> Option<CallbackId> {
        self.sample_callback_id.take()
    }

    /// Apply revised monitoring parameters. Returns true if the
    /// sampling interval changed, in which case the caller must
    /// re-register the sampling callback.
    pub(crate) fn set_parameters(
        &mut self,
        queue: &mut NotificationQueue,
        params: &MonitoringParameters,
    ) -> bool {
        let interval_changed = self.sampling_interval != params.sampling_interval;
        self.sampling_interval = params.sampling_interval;
        self.trigger = params.trigger;
        self.timestamps_to_return = params.timestamps_to_return;
        self.discard_oldest = params.discard_oldest;
        self.max_queue_size = (params.queue_size as usize).max(1);
        // A shrunken bound evicts immediately
        self.ensure_queue_space(queue, None);
        interval_changed
    }

    pub(crate) fn notification(&self, id: NotificationId) -> Option<&Notification> {
        self.queue.iter().find(|n| n.id == id)
    }

    /// Remove one notification from the local queue, yielding its
    /// payload. Used by the publish path after it removed the matching
    /// global entry.
    pub(crate) fn take_notification(&mut self, id: NotificationId) -> Option<Notification> {
        let index = self.queue.iter().position(|n| n.id == id)?;
        self.queue.remove(index)
    }

    /// Drain the local queue for deletion. The caller removes the
    /// matching global entries.
    pub(crate) fn drain_queue(&mut self) -> impl Iterator<Item = Notification> + '_ {
        self.queue.drain(..)
    }

    /// One sampling tick: read the attribute and enqueue a notification
    /// if the value changed under the active trigger. Returns whether a
    /// notification was produced.
    pub(crate) fn sample(
        &mut self,
        queue: &mut NotificationQueue,
        reader: &dyn AddressSpaceReader,
        session_id: u32,
    ) -> bool {
        if self.item_type != MonitoredItemType::DataChange {
            debug!(
                "Subscription {} | MonitoredItem {} | Not a data change notification",
                self.subscription_id, self.id
            );
            return false;
        }

        let node_to_read = ReadValueId {
            node_id: self.node_id.clone(),
            attribute_id: self.attribute_id as u32,
            index_range: self.index_range.clone(),
        };
        let value = reader.read(session_id, &node_to_read, self.timestamps_to_return);

        // Enough stack for scalars and small structures; larger values
        // fall back to the heap inside detect_value_change.
        let mut stack_buffer = [0u8; VALUE_ENCODING_MAX_STACK];
        self.sample_with_value(queue, value, &mut stack_buffer)
        // A rejected sample and its encoding are dropped here
    }

    /// Compare `value` against the last kept snapshot and enqueue it on
    /// change. Returns whether a notification was produced.
    fn sample_with_value(
        &mut self,
        queue: &mut NotificationQueue,
        value: SampledValue,
        stack_buffer: &mut [u8; VALUE_ENCODING_MAX_STACK],
    ) -> bool {
        let Some(encoding) = self.detect_value_change(value.data_value(), stack_buffer) else {
            return false;
        };

        // Move an owned value, deep copy a borrowed one
        let retained = value.into_retained();

        // The snapshot has to outlive this tick: copy it off the stack
        // unless it already lives on the heap.
        let snapshot = match encoding {
            ValueEncoding::Stack(len) => stack_buffer[..len].to_vec(),
            ValueEncoding::Heap(buffer) => buffer,
        };

        // <-- Point of no return -->

        debug!(
            "Subscription {} | MonitoredItem {} | Sampled a new value",
            self.subscription_id, self.id
        );

        // Replace the encoding for the next comparison
        self.last_sampled_value = snapshot;

        let notification = Notification {
            id: queue.next_id(),
            monitored_item_id: self.id,
            value: retained,
        };
        let notification_id = notification.id;
        self.queue.push_back(notification);

        // Evict if required and add the sample to the global queue
        self.ensure_queue_space(queue, Some(notification_id));

        true
    }

    /// Encode the trigger-filtered value and compare it to the previous
    /// snapshot. Returns the encoding when the value changed, `None`
    /// when it is unchanged. Errors are returned as no change detected.
    fn detect_value_change(
        &self,
        value: &DataValue,
        stack_buffer: &mut [u8; VALUE_ENCODING_MAX_STACK],
    ) -> Option<ValueEncoding> {
        let filtered = value.filtered(self.trigger);

        let size = filtered.byte_len();
        if size == 0 {
            return None;
        }

        // Encode into the stack buffer, or the heap if it cannot fit
        let encoding = if size <= stack_buffer.len() {
            let mut cursor = Cursor::new(&mut stack_buffer[..]);
            if filtered.encode(&mut cursor).is_err() {
                return None;
            }
            ValueEncoding::Stack(size)
        } else {
            let mut buffer = Vec::with_capacity(size);
            if filtered.encode(&mut buffer).is_err() {
                return None;
            }
            ValueEncoding::Heap(buffer)
        };

        let encoded = match &encoding {
            ValueEncoding::Stack(len) => &stack_buffer[..*len],
            ValueEncoding::Heap(buffer) => buffer.as_slice(),
        };
        let changed =
            self.last_sampled_value.is_empty() || encoded != self.last_sampled_value.as_slice();
        changed.then_some(encoding)
    }

    /// Evict until the local queue is back within its bound, then place
    /// the newcomer (if any) in the global queue.
    ///
    /// The newcomer has already been appended to the local queue tail
    /// but is not yet in the global queue. When an eviction makes room
    /// for it, it takes over the victim's pending/ready accounting
    /// bucket: the counters are left untouched because the removed
    /// entry was replaced one-for-one by the incoming notification.
    pub(crate) fn ensure_queue_space(
        &mut self,
        queue: &mut NotificationQueue,
        newcomer: Option<NotificationId>,
    ) {
        let mut newcomer = newcomer;
        let mut discarded = false;
        while self.queue.len() > self.max_queue_size {
            // max_queue_size is at least 1, so the queue holds at least
            // two entries and a victim other than the newest exists.
            let victim = if self.discard_oldest {
                self.queue.pop_front()
            } else {
                // Keep the newest, remove the second newest
                self.queue.remove(self.queue.len() - 2)
            };
            let Some(victim) = victim else {
                break;
            };

            if let Some(id) = newcomer.take() {
                queue.replace(victim.id, id, self.id);
            } else {
                queue.remove(victim.id);
            }

            discarded = true;
            // The victim and its payload are released here
        }

        if discarded {
            // The element that carries the infobits sits at the newest
            // side of the surviving history.
            let marker = if self.discard_oldest {
                self.queue.front_mut()
            } else {
                self.queue.back_mut()
            };
            if let Some(marker) = marker {
                if self.max_queue_size == 1 {
                    // A queue bound of one holds no history, so the
                    // retained element carries no overflow marker.
                    if let Some(status) = marker.value.status {
                        marker.value.status =
                            Some(status & !(INFO_TYPE_DATA_VALUE | INFO_BITS_OVERFLOW));
                    }
                } else {
                    marker.value.status = Some(
                        marker.value.status.unwrap_or(StatusCode::Good)
                            | (INFO_TYPE_DATA_VALUE | INFO_BITS_OVERFLOW),
                    );
                }
            }
        }

        if let Some(id) = newcomer {
            queue.push_back(id, self.id);
        }
    }
}
