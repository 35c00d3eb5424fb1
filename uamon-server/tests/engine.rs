//! End to end scenarios for the monitoring engine, driving sampling
//! ticks by hand against an in-memory address space.

use std::sync::Arc;

use uamon_server::{
    address_space::MemoryAddressSpace,
    subscriptions::{
        MonitoredItemCreateRequest, MonitoredItemId, MonitoredItemType, MonitoringParameters,
        SubscriptionId,
    },
    MonitorLimits, MonitoringEngine,
};
use uamon_types::{
    AttributeId, DataChangeTrigger, DataValue, NodeId, ReadValueId, StatusCode, Variant,
    INFO_BITS_OVERFLOW,
};

struct Harness {
    space: Arc<MemoryAddressSpace>,
    engine: MonitoringEngine,
    subscription: SubscriptionId,
}

impl Harness {
    fn new() -> Self {
        let space = Arc::new(MemoryAddressSpace::new());
        let mut engine = MonitoringEngine::new(space.clone(), MonitorLimits::default());
        let subscription = engine.create_subscription(1);
        Harness {
            space,
            engine,
            subscription,
        }
    }

    fn create_item(&mut self, name: &str, params: MonitoringParameters) -> MonitoredItemId {
        self.engine
            .create_monitored_item(
                self.subscription,
                MonitoredItemCreateRequest {
                    item_to_monitor: ReadValueId {
                        node_id: NodeId::new(1, name),
                        attribute_id: AttributeId::Value as u32,
                        ..Default::default()
                    },
                    monitored_item_type: MonitoredItemType::DataChange,
                    requested_parameters: params,
                },
            )
            .expect("create monitored item")
    }

    fn write(&self, name: &str, value: impl Into<Variant>) {
        self.space.set_value(
            NodeId::new(1, name),
            AttributeId::Value,
            DataValue::from(value.into()),
        );
    }

    fn tick(&mut self, item: MonitoredItemId) -> bool {
        self.engine.sample_monitored_item(self.subscription, item)
    }

    fn local_values(&self, item: MonitoredItemId) -> Vec<i32> {
        self.engine
            .subscription(self.subscription)
            .unwrap()
            .item(item)
            .unwrap()
            .notifications()
            .map(|n| match n.value().value {
                Some(Variant::Int32(v)) => v,
                ref other => panic!("expected Int32, got {:?}", other),
            })
            .collect()
    }

    fn overflow_flags(&self, item: MonitoredItemId) -> Vec<bool> {
        self.engine
            .subscription(self.subscription)
            .unwrap()
            .item(item)
            .unwrap()
            .notifications()
            .map(|n| n.value().status().contains_info_bits(INFO_BITS_OVERFLOW))
            .collect()
    }

    fn global_values(&self) -> Vec<i32> {
        self.engine
            .subscription(self.subscription)
            .unwrap()
            .notifications()
            .map(|n| match n.value().value {
                Some(Variant::Int32(v)) => v,
                ref other => panic!("expected Int32, got {:?}", other),
            })
            .collect()
    }
}

#[test]
fn overflow_discarding_oldest() {
    let mut h = Harness::new();
    let item = h.create_item(
        "v",
        MonitoringParameters {
            queue_size: 3,
            discard_oldest: true,
            ..Default::default()
        },
    );
    for v in 1..=5i32 {
        h.write("v", v);
        assert!(h.tick(item));
    }
    assert_eq!(h.local_values(item), [3, 4, 5]);
    assert_eq!(h.overflow_flags(item), [true, false, false]);
    assert_eq!(h.global_values(), [3, 4, 5]);
}

#[test]
fn overflow_discarding_second_newest() {
    let mut h = Harness::new();
    let item = h.create_item(
        "v",
        MonitoringParameters {
            queue_size: 3,
            discard_oldest: false,
            ..Default::default()
        },
    );
    for v in 1..=5i32 {
        h.write("v", v);
        assert!(h.tick(item));
    }
    // v4 evicted v3, then v5 evicted v4; the oldest history survives
    assert_eq!(h.local_values(item), [1, 2, 5]);
    assert_eq!(h.overflow_flags(item), [false, false, true]);
    assert_eq!(h.global_values(), [1, 2, 5]);
}

#[test]
fn status_trigger_suppresses_value_changes() {
    let mut h = Harness::new();
    let item = h.create_item(
        "v",
        MonitoringParameters {
            queue_size: 10,
            trigger: DataChangeTrigger::Status,
            ..Default::default()
        },
    );
    h.write("v", 1i32);
    assert!(h.tick(item));
    for v in 2..=8i32 {
        h.write("v", v);
        assert!(!h.tick(item));
    }
    assert_eq!(
        h.engine
            .subscription(h.subscription)
            .unwrap()
            .item(item)
            .unwrap()
            .queued_len(),
        1
    );
}

#[test]
fn queue_of_one_replaces_without_overflow_bit() {
    let mut h = Harness::new();
    let item = h.create_item(
        "v",
        MonitoringParameters {
            queue_size: 1,
            discard_oldest: true,
            ..Default::default()
        },
    );
    h.write("v", 1i32);
    assert!(h.tick(item));
    h.write("v", 2i32);
    assert!(h.tick(item));
    assert_eq!(h.local_values(item), [2]);
    assert_eq!(h.overflow_flags(item), [false]);
}

#[test]
fn interleaved_items_publish_in_insertion_order() {
    let mut h = Harness::new();
    let a = h.create_item("a", MonitoringParameters {
        queue_size: 10,
        ..Default::default()
    });
    let b = h.create_item("b", MonitoringParameters {
        queue_size: 10,
        ..Default::default()
    });

    h.write("a", 101i32);
    assert!(h.tick(a));
    h.write("b", 201i32);
    assert!(h.tick(b));
    h.write("a", 102i32);
    assert!(h.tick(a));
    h.write("b", 202i32);
    assert!(h.tick(b));

    assert_eq!(h.global_values(), [101, 201, 102, 202]);

    let order: Vec<MonitoredItemId> = h
        .engine
        .subscription(h.subscription)
        .unwrap()
        .notifications()
        .map(|n| n.monitored_item_id())
        .collect();
    assert_eq!(order, [a, b, a, b]);
}

#[test]
fn delete_with_queued_notifications_updates_counters() {
    let mut h = Harness::new();
    let a = h.create_item("a", MonitoringParameters {
        queue_size: 10,
        ..Default::default()
    });
    let b = h.create_item("b", MonitoringParameters {
        queue_size: 10,
        ..Default::default()
    });

    h.write("a", 1i32);
    assert!(h.tick(a));
    h.write("b", 2i32);
    assert!(h.tick(b));
    {
        let sub = h.engine.subscription_mut(h.subscription).unwrap();
        sub.promote_pending();
    }
    h.write("a", 3i32);
    assert!(h.tick(a));

    let queue_len = |h: &Harness| {
        h.engine
            .subscription(h.subscription)
            .unwrap()
            .notification_queue()
            .len()
    };
    assert_eq!(queue_len(&h), 3);

    // Item a holds two notifications: one ready, one pending
    h.engine
        .delete_monitored_item(h.subscription, a)
        .expect("delete item");
    assert_eq!(queue_len(&h), 1);
    let sub = h.engine.subscription(h.subscription).unwrap();
    // Pending decremented first, then ready
    assert_eq!(sub.notification_queue().pending(), 0);
    assert_eq!(sub.notification_queue().ready(), 1);
    // The survivor is item b's notification and still resolves
    let survivors: Vec<MonitoredItemId> = sub
        .notifications()
        .map(|n| n.monitored_item_id())
        .collect();
    assert_eq!(survivors, [b]);
    assert!(sub.item(a).is_none());
}

#[test]
fn borrowed_values_are_deep_copied_into_the_queue() {
    let mut h = Harness::new();
    let item = h.create_item("v", MonitoringParameters {
        queue_size: 10,
        ..Default::default()
    });
    h.write("v", 1i32);
    assert!(h.tick(item));

    // Overwrite the address space storage; the queued notification must
    // keep the value it sampled.
    h.write("v", 999i32);
    assert_eq!(h.local_values(item), [1]);
}

#[test]
fn bad_read_status_is_a_value_change() {
    let mut h = Harness::new();
    let item = h.create_item("v", MonitoringParameters {
        queue_size: 10,
        ..Default::default()
    });
    h.write("v", 1i32);
    assert!(h.tick(item));

    // The node disappears: the bad status is enqueued as a change
    h.space
        .remove_value(&NodeId::new(1, "v"), AttributeId::Value);
    assert!(h.tick(item));
    // And repeating the failed read is not another change
    assert!(!h.tick(item));

    let sub = h.engine.subscription(h.subscription).unwrap();
    let statuses: Vec<StatusCode> = sub
        .item(item)
        .unwrap()
        .notifications()
        .map(|n| n.value().status())
        .collect();
    assert_eq!(statuses, [StatusCode::Good, StatusCode::BadNodeIdUnknown]);
}

#[test]
fn publish_drain_interleaves_with_sampling() {
    let mut h = Harness::new();
    let item = h.create_item("v", MonitoringParameters {
        queue_size: 5,
        ..Default::default()
    });
    h.write("v", 1i32);
    assert!(h.tick(item));
    h.write("v", 2i32);
    assert!(h.tick(item));

    let first = h
        .engine
        .subscription_mut(h.subscription)
        .unwrap()
        .dequeue()
        .expect("queued notification");
    assert_eq!(first.value().value, Some(Variant::from(1i32)));

    h.write("v", 3i32);
    assert!(h.tick(item));
    assert_eq!(h.global_values(), [2, 3]);
    assert_eq!(
        h.engine
            .subscription(h.subscription)
            .unwrap()
            .item(item)
            .unwrap()
            .queued_len(),
        2
    );
}

#[test]
fn event_items_participate_in_lifecycle_but_not_sampling() {
    let mut h = Harness::new();
    let event_item = h
        .engine
        .create_monitored_item(
            h.subscription,
            MonitoredItemCreateRequest {
                item_to_monitor: ReadValueId {
                    node_id: NodeId::new(1, "ev"),
                    attribute_id: AttributeId::Value as u32,
                    ..Default::default()
                },
                monitored_item_type: MonitoredItemType::Event,
                requested_parameters: MonitoringParameters::default(),
            },
        )
        .expect("create event item");

    // Sampling an event item produces nothing
    assert!(!h.tick(event_item));

    // Deleting it runs the full cleanup instead of leaking it
    h.engine
        .delete_monitored_item(h.subscription, event_item)
        .expect("delete event item");
    assert!(h
        .engine
        .subscription(h.subscription)
        .unwrap()
        .item(event_item)
        .is_none());
}
