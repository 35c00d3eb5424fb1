use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use uamon_types::{
    AttributeId, DataValue, DateTime, NodeId, ReadValueId, StatusCode, TimestampsToReturn,
};

use super::{AddressSpaceReader, SampledValue};

/// A flat in-memory attribute store.
///
/// Values are stored per `(node, attribute)` pair behind shared
/// pointers, so reads that need no timestamp rewriting are answered
/// with `Borrowed` values straight out of the store. Writers may
/// replace a value at any time; whoever sampled the old value keeps
/// the storage alive until it is done with it.
#[derive(Debug, Default)]
pub struct MemoryAddressSpace {
    values: RwLock<HashMap<(NodeId, AttributeId), Arc<DataValue>>>,
}

impl MemoryAddressSpace {
    /// An empty address space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value of one attribute. The source timestamp is stamped
    /// with the current time if the writer did not provide one; server
    /// timestamps are produced per read and not stored.
    pub fn set_value(&self, node_id: NodeId, attribute_id: AttributeId, mut value: DataValue) {
        if value.source_timestamp.is_none() {
            value.source_timestamp = Some(DateTime::now());
        }
        value.server_timestamp = None;
        value.server_picoseconds = None;
        self.values
            .write()
            .insert((node_id, attribute_id), Arc::new(value));
    }

    /// Remove one attribute. Subsequent reads return `BadNodeIdUnknown`.
    pub fn remove_value(&self, node_id: &NodeId, attribute_id: AttributeId) -> bool {
        self.values
            .write()
            .remove(&(node_id.clone(), attribute_id))
            .is_some()
    }
}

impl AddressSpaceReader for MemoryAddressSpace {
    fn read(
        &self,
        _session_id: u32,
        node_to_read: &ReadValueId,
        timestamps_to_return: TimestampsToReturn,
    ) -> SampledValue {
        let Ok(attribute_id) = AttributeId::try_from(node_to_read.attribute_id) else {
            return SampledValue::Owned(DataValue::from_status(StatusCode::BadAttributeIdInvalid));
        };
        // Index ranges are not resolved by this store.
        if !node_to_read.index_range.is_null() {
            return SampledValue::Owned(DataValue::from_status(StatusCode::BadIndexRangeInvalid));
        }
        let stored = {
            let values = self.values.read();
            match values.get(&(node_to_read.node_id.clone(), attribute_id)) {
                Some(value) => value.clone(),
                None => {
                    return SampledValue::Owned(DataValue::from_status(
                        StatusCode::BadNodeIdUnknown,
                    ))
                }
            }
        };
        match timestamps_to_return {
            // Stored values carry exactly the source timestamp, so the
            // hot path hands out the shared storage as-is.
            TimestampsToReturn::Source => SampledValue::Borrowed(stored),
            TimestampsToReturn::Neither => SampledValue::Owned(DataValue {
                source_timestamp: None,
                source_picoseconds: None,
                ..(*stored).clone()
            }),
            TimestampsToReturn::Server => SampledValue::Owned(DataValue {
                source_timestamp: None,
                source_picoseconds: None,
                server_timestamp: Some(DateTime::now()),
                ..(*stored).clone()
            }),
            TimestampsToReturn::Both => SampledValue::Owned(DataValue {
                server_timestamp: Some(DateTime::now()),
                ..(*stored).clone()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uamon_types::Variant;

    fn read_value_id(node_id: NodeId) -> ReadValueId {
        ReadValueId {
            node_id,
            attribute_id: AttributeId::Value as u32,
            ..Default::default()
        }
    }

    #[test]
    fn read_unknown_node_is_bad_status() {
        let space = MemoryAddressSpace::new();
        let value = space.read(
            1,
            &read_value_id(NodeId::new(1, "missing")),
            TimestampsToReturn::Source,
        );
        assert_eq!(
            value.data_value().status(),
            StatusCode::BadNodeIdUnknown
        );
    }

    #[test]
    fn read_source_is_borrowed() {
        let space = MemoryAddressSpace::new();
        let id = NodeId::new(1, "v");
        space.set_value(id.clone(), AttributeId::Value, DataValue::from(Variant::from(1i32)));
        let value = space.read(1, &read_value_id(id), TimestampsToReturn::Source);
        assert!(matches!(value, SampledValue::Borrowed(_)));
        assert!(value.data_value().source_timestamp.is_some());
        assert!(value.data_value().server_timestamp.is_none());
    }

    #[test]
    fn read_server_timestamps_are_stamped_per_read() {
        let space = MemoryAddressSpace::new();
        let id = NodeId::new(1, "v");
        space.set_value(id.clone(), AttributeId::Value, DataValue::from(Variant::from(1i32)));
        let value = space.read(1, &read_value_id(id), TimestampsToReturn::Both);
        assert!(matches!(value, SampledValue::Owned(_)));
        assert!(value.data_value().source_timestamp.is_some());
        assert!(value.data_value().server_timestamp.is_some());
    }

    #[test]
    fn invalid_attribute_is_bad_status() {
        let space = MemoryAddressSpace::new();
        let rvid = ReadValueId {
            node_id: NodeId::new(1, "v"),
            attribute_id: 999,
            ..Default::default()
        };
        let value = space.read(1, &rvid, TimestampsToReturn::Source);
        assert_eq!(
            value.data_value().status(),
            StatusCode::BadAttributeIdInvalid
        );
    }
}
