//! Property tests for the queue invariants: random operation sequences
//! against a two-item subscription, checking the structural invariants
//! after every step.

use std::sync::Arc;

use proptest::prelude::*;

use uamon_server::{
    address_space::MemoryAddressSpace,
    subscriptions::{
        MonitoredItemCreateRequest, MonitoredItemId, MonitoredItemType, MonitoringParameters,
        NotificationId, SubscriptionId,
    },
    MonitorLimits, MonitoringEngine,
};
use uamon_types::{
    AttributeId, DataValue, NodeId, ReadValueId, Variant, INFO_BITS_OVERFLOW,
};

#[derive(Debug, Clone)]
enum Op {
    /// Write a value to an item's node and run its sampling tick.
    Sample { item: usize, value: i64 },
    /// Drain the head of the global queue.
    Dequeue,
    /// Publish boundary: pending becomes ready.
    Promote,
    /// Remove the newest queued notification by id.
    RemoveNewest,
    /// Revise an item's queue bound. The discard policy stays fixed:
    /// the overflow marker position is only meaningful under one
    /// policy.
    Modify { item: usize, queue_size: u32 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..2, 0i64..6).prop_map(|(item, value)| Op::Sample { item, value }),
        1 => Just(Op::Dequeue),
        1 => Just(Op::Promote),
        1 => Just(Op::RemoveNewest),
        1 => (0usize..2, 1u32..5).prop_map(|(item, queue_size)| {
            Op::Modify { item, queue_size }
        }),
    ]
}

struct Model {
    space: Arc<MemoryAddressSpace>,
    engine: MonitoringEngine,
    subscription: SubscriptionId,
    items: Vec<MonitoredItemId>,
}

fn node(index: usize) -> NodeId {
    NodeId::new(1, format!("node{}", index).as_str())
}

fn build_model() -> Model {
    let space = Arc::new(MemoryAddressSpace::new());
    let mut engine = MonitoringEngine::new(space.clone(), MonitorLimits::default());
    let subscription = engine.create_subscription(1);
    let items = (0..2usize)
        .map(|index| {
            engine
                .create_monitored_item(
                    subscription,
                    MonitoredItemCreateRequest {
                        item_to_monitor: ReadValueId {
                            node_id: node(index),
                            attribute_id: AttributeId::Value as u32,
                            ..Default::default()
                        },
                        monitored_item_type: MonitoredItemType::DataChange,
                        requested_parameters: MonitoringParameters {
                            queue_size: 3,
                            discard_oldest: index == 0,
                            ..Default::default()
                        },
                    },
                )
                .expect("create monitored item")
        })
        .collect();
    Model {
        space,
        engine,
        subscription,
        items,
    }
}

impl Model {
    fn apply(&mut self, op: &Op) {
        match op {
            Op::Sample { item, value } => {
                self.space.set_value(
                    node(*item),
                    AttributeId::Value,
                    DataValue::from(Variant::from(*value)),
                );
                self.engine
                    .sample_monitored_item(self.subscription, self.items[*item]);
            }
            Op::Dequeue => {
                self.engine
                    .subscription_mut(self.subscription)
                    .unwrap()
                    .dequeue();
            }
            Op::Promote => {
                self.engine
                    .subscription_mut(self.subscription)
                    .unwrap()
                    .promote_pending();
            }
            Op::RemoveNewest => {
                let newest = self
                    .engine
                    .subscription(self.subscription)
                    .unwrap()
                    .notifications()
                    .last()
                    .map(|n| n.id());
                if let Some(id) = newest {
                    self.engine
                        .subscription_mut(self.subscription)
                        .unwrap()
                        .remove(id)
                        .expect("newest notification resolves");
                }
            }
            Op::Modify { item, queue_size } => {
                self.engine
                    .modify_monitored_item(
                        self.subscription,
                        self.items[*item],
                        MonitoringParameters {
                            queue_size: *queue_size,
                            discard_oldest: *item == 0,
                            ..Default::default()
                        },
                    )
                    .expect("modify monitored item");
            }
        }
    }

    fn check_invariants(&self) {
        let sub = self.engine.subscription(self.subscription).unwrap();
        let queue = sub.notification_queue();

        // Counter sum equals the global queue length
        assert_eq!(
            queue.pending() + queue.ready(),
            queue.len(),
            "pending + ready != |global queue|"
        );

        // Every global entry resolves to exactly one local notification
        let global_ids: Vec<NotificationId> = sub.notifications().map(|n| n.id()).collect();
        assert_eq!(
            global_ids.len(),
            queue.len(),
            "global entry without a local notification"
        );

        // Insertion order: ids are allocated monotonically, so the
        // global queue must be strictly increasing
        assert!(
            global_ids.windows(2).all(|w| w[0] < w[1]),
            "global queue out of insertion order: {:?}",
            global_ids
        );

        let mut total_local = 0;
        for item in sub.items() {
            // Queue bound holds at every observable boundary
            assert!(
                item.queued_len() <= item.max_queue_size(),
                "item {} exceeds its queue bound",
                item.id()
            );
            total_local += item.queued_len();

            // Every local notification is in the global queue
            for notification in item.notifications() {
                assert!(
                    global_ids.contains(&notification.id()),
                    "local notification {} missing from the global queue",
                    notification.id()
                );
            }

            // At most one element carries the overflow marker, sitting
            // at the newest side of the surviving history
            let flags: Vec<bool> = item
                .notifications()
                .map(|n| n.value().status().contains_info_bits(INFO_BITS_OVERFLOW))
                .collect();
            let marked = flags.iter().filter(|f| **f).count();
            assert!(marked <= 1, "item {} carries {} overflow markers", item.id(), marked);
            if marked == 1 && item.max_queue_size() > 1 {
                let expected = if item.discard_oldest() {
                    flags.first()
                } else {
                    flags.last()
                };
                assert_eq!(
                    expected,
                    Some(&true),
                    "overflow marker in the wrong position for item {}",
                    item.id()
                );
            }
        }

        // Dual membership: both sides have the same cardinality
        assert_eq!(
            total_local,
            queue.len(),
            "local queues and global queue disagree"
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn queue_invariants_hold(ops in proptest::collection::vec(op_strategy(), 1..60)) {
        let mut model = build_model();
        for op in &ops {
            model.apply(op);
            model.check_invariants();
        }
    }

    #[test]
    fn draining_everything_empties_both_sides(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let mut model = build_model();
        for op in &ops {
            model.apply(op);
        }
        while model
            .engine
            .subscription_mut(model.subscription)
            .unwrap()
            .dequeue()
            .is_some()
        {}
        let sub = model.engine.subscription(model.subscription).unwrap();
        prop_assert!(sub.notification_queue().is_empty());
        prop_assert_eq!(sub.notification_queue().pending(), 0);
        prop_assert_eq!(sub.notification_queue().ready(), 0);
        for item in sub.items() {
            prop_assert_eq!(item.queued_len(), 0);
        }
    }
}
