use std::sync::Arc;

use hashbrown::HashMap;
use log::debug;
use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use uamon_types::{AttributeId, StatusCode};

use crate::{address_space::AddressSpaceReader, config::MonitorLimits, constants};

use super::{
    monitored_item::{MonitoredItem, MonitoredItemType},
    scheduler::SamplingScheduler,
    subscription::Subscription,
    MonitoredItemCreateRequest, MonitoredItemId, MonitoringParameters, SubscriptionId,
};

/// The sampled state: subscriptions plus the read surface. Split from
/// the scheduler so scheduler callbacks can borrow it mutably while the
/// scheduler itself runs them.
pub(crate) struct EngineCore {
    subscriptions: HashMap<SubscriptionId, Subscription>,
    address_space: Arc<dyn AddressSpaceReader + Send + Sync>,
    limits: MonitorLimits,
    next_subscription_id: SubscriptionId,
    next_monitored_item_id: MonitoredItemId,
}

impl EngineCore {
    fn sample_monitored_item(&mut self, subscription_id: SubscriptionId, id: MonitoredItemId) {
        let Some(subscription) = self.subscriptions.get_mut(&subscription_id) else {
            debug!(
                "Subscription {} | MonitoredItem {} | Tick for a deleted subscription",
                subscription_id, id
            );
            return;
        };
        subscription.sample_monitored_item(id, &*self.address_space);
    }
}

/// The data change monitoring engine: subscriptions, their monitored
/// items and the sampling scheduler, fed by an address space reader.
///
/// All operations are serialized through `&mut self`, which is what
/// makes the queues and counters safe without further locking. The
/// async driver ([`run_sampler`]) wraps the engine in a mutex and
/// preserves that discipline.
pub struct MonitoringEngine {
    core: EngineCore,
    scheduler: SamplingScheduler<EngineCore>,
}

impl MonitoringEngine {
    /// An engine sampling from `address_space` under `limits`.
    pub fn new(
        address_space: Arc<dyn AddressSpaceReader + Send + Sync>,
        limits: MonitorLimits,
    ) -> Self {
        Self {
            core: EngineCore {
                subscriptions: HashMap::new(),
                address_space,
                limits,
                next_subscription_id: 0,
                next_monitored_item_id: 0,
            },
            scheduler: SamplingScheduler::new(),
        }
    }

    /// The limits this engine revises requests against.
    pub fn limits(&self) -> &MonitorLimits {
        &self.core.limits
    }

    /// Create an empty subscription owned by `session_id`.
    pub fn create_subscription(&mut self, session_id: u32) -> SubscriptionId {
        self.core.next_subscription_id += 1;
        let id = self.core.next_subscription_id;
        self.core
            .subscriptions
            .insert(id, Subscription::new(id, session_id));
        id
    }

    /// Delete a subscription and every monitored item in it.
    pub fn delete_subscription(&mut self, id: SubscriptionId) -> Result<(), StatusCode> {
        let item_ids: Vec<MonitoredItemId> = self
            .core
            .subscriptions
            .get(&id)
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?
            .item_ids()
            .collect();
        for item_id in item_ids {
            self.delete_monitored_item(id, item_id)?;
        }
        self.core.subscriptions.remove(&id);
        Ok(())
    }

    /// One subscription by id.
    pub fn subscription(&self, id: SubscriptionId) -> Option<&Subscription> {
        self.core.subscriptions.get(&id)
    }

    /// One subscription by id, for the publish path.
    pub fn subscription_mut(&mut self, id: SubscriptionId) -> Option<&mut Subscription> {
        self.core.subscriptions.get_mut(&id)
    }

    /// The subscriptions, in no particular order.
    pub fn subscriptions(&self) -> impl Iterator<Item = &Subscription> + '_ {
        self.core.subscriptions.values()
    }

    /// Create a monitored item and register its sampling callback.
    /// The requested parameters are revised against the engine limits;
    /// the item samples with whatever was granted.
    pub fn create_monitored_item(
        &mut self,
        subscription_id: SubscriptionId,
        request: MonitoredItemCreateRequest,
    ) -> Result<MonitoredItemId, StatusCode> {
        let attribute_id = AttributeId::try_from(request.item_to_monitor.attribute_id)?;
        let limits = self.core.limits.clone();
        let subscription = self
            .core
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        if limits.max_monitored_items_per_sub > 0
            && subscription.monitored_item_count() >= limits.max_monitored_items_per_sub
        {
            return Err(StatusCode::BadTooManyMonitoredItems);
        }

        let mut params = request.requested_parameters;
        revise_parameters(&mut params, &limits);

        self.core.next_monitored_item_id += 1;
        let id = self.core.next_monitored_item_id;
        let item = MonitoredItem::new(
            request.monitored_item_type,
            id,
            subscription_id,
            request.item_to_monitor.node_id,
            attribute_id,
            request.item_to_monitor.index_range,
            &params,
        );
        let register = item.item_type() == MonitoredItemType::DataChange;
        subscription.insert_item(item);
        if register {
            self.register_sample_callback(subscription_id, id)?;
        }
        Ok(id)
    }

    /// Apply new monitoring parameters to an item, after revision
    /// against the engine limits. A reduced queue bound evicts
    /// immediately; a changed sampling interval re-registers the
    /// sampling callback. Returns the revised parameters.
    pub fn modify_monitored_item(
        &mut self,
        subscription_id: SubscriptionId,
        id: MonitoredItemId,
        mut params: MonitoringParameters,
    ) -> Result<MonitoringParameters, StatusCode> {
        revise_parameters(&mut params, &self.core.limits);
        let subscription = self
            .core
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        let interval_changed = subscription
            .modify_monitored_item(id, &params)
            .ok_or(StatusCode::BadMonitoredItemIdInvalid)?;
        if interval_changed {
            let was_registered = subscription
                .item(id)
                .is_some_and(|i| i.sample_callback_registered());
            if was_registered {
                self.unregister_sample_callback(subscription_id, id)?;
                self.register_sample_callback(subscription_id, id)?;
            }
        }
        Ok(params)
    }

    /// Delete a monitored item: unregister its sampling callback, then
    /// drain its notifications from both queues.
    pub fn delete_monitored_item(
        &mut self,
        subscription_id: SubscriptionId,
        id: MonitoredItemId,
    ) -> Result<(), StatusCode> {
        // Unregister first so no further tick can observe the item
        self.unregister_sample_callback(subscription_id, id)?;
        self.core
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?
            .delete_monitored_item(id)
    }

    /// Register the periodic sampling callback for an item. Idempotent:
    /// an already registered item is left as it is.
    pub fn register_sample_callback(
        &mut self,
        subscription_id: SubscriptionId,
        id: MonitoredItemId,
    ) -> Result<(), StatusCode> {
        let item = self
            .core
            .subscriptions
            .get(&subscription_id)
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?
            .item(id)
            .ok_or(StatusCode::BadMonitoredItemIdInvalid)?;
        if item.sample_callback_registered() {
            return Ok(());
        }
        let interval = item.sampling_interval();
        let callback_id = self.scheduler.add_repeated_callback(
            move |core: &mut EngineCore| core.sample_monitored_item(subscription_id, id),
            interval,
        )?;
        if let Some(item) = self
            .core
            .subscriptions
            .get_mut(&subscription_id)
            .and_then(|s| s.item_mut(id))
        {
            item.set_sample_callback_id(callback_id);
        }
        Ok(())
    }

    /// Unregister the sampling callback for an item. Idempotent: an
    /// unregistered item is left as it is. The registration is cleared
    /// on the item before the scheduler removal.
    pub fn unregister_sample_callback(
        &mut self,
        subscription_id: SubscriptionId,
        id: MonitoredItemId,
    ) -> Result<(), StatusCode> {
        let item = self
            .core
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?
            .item_mut(id)
            .ok_or(StatusCode::BadMonitoredItemIdInvalid)?;
        let Some(callback_id) = item.take_sample_callback_id() else {
            return Ok(());
        };
        self.scheduler.remove_repeated_callback(callback_id)
    }

    /// Run one sampling tick for an item immediately, outside its
    /// schedule. Returns whether a notification was produced.
    pub fn sample_monitored_item(
        &mut self,
        subscription_id: SubscriptionId,
        id: MonitoredItemId,
    ) -> bool {
        self.core
            .subscriptions
            .get_mut(&subscription_id)
            .map(|s| s.sample_monitored_item(id, &*self.core.address_space))
            .unwrap_or(false)
    }

    /// Fire every sampling callback whose deadline has passed. Returns
    /// the number of callbacks fired.
    pub fn run_due(&mut self, now: Instant) -> usize {
        self.scheduler.run_due(now, &mut self.core)
    }

    /// The next scheduler deadline, if any callback is registered.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }
}

/// Revise requested monitoring parameters against the limits, the way
/// the granted parameters are reported back to a client.
fn revise_parameters(params: &mut MonitoringParameters, limits: &MonitorLimits) {
    if params.queue_size == 0 {
        params.queue_size = 1;
    }
    let cap = limits.max_monitored_item_queue_size;
    if cap > 0 && params.queue_size as usize > cap {
        params.queue_size = cap as u32;
    }
    if !params.sampling_interval.is_finite() || params.sampling_interval < 0.0 {
        params.sampling_interval = limits.default_sampling_interval_ms;
    }
    if params.sampling_interval < limits.min_sampling_interval_ms {
        params.sampling_interval = limits.min_sampling_interval_ms;
    }
}

/// Drive a shared engine's sampling scheduler until `token` is
/// cancelled. The engine is locked once per batch of due callbacks;
/// publish draining and management calls interleave through the same
/// mutex, which serializes all queue mutation as the engine requires.
pub async fn run_sampler(engine: Arc<Mutex<MonitoringEngine>>, token: CancellationToken) {
    let idle_poll = std::time::Duration::from_millis(constants::SAMPLER_IDLE_POLL_MS);
    loop {
        let deadline = {
            let engine = engine.lock();
            engine.next_deadline()
        };
        // Cap the sleep so callbacks registered while we were asleep
        // are picked up within one poll interval.
        let wake_at = match deadline {
            Some(deadline) => deadline.min(Instant::now() + idle_poll),
            None => Instant::now() + idle_poll,
        };
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep_until(wake_at) => {}
        }
        engine.lock().run_due(Instant::now());
    }
}
