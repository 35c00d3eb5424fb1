//! The read surface the monitoring engine samples from.

mod memory;

pub use memory::MemoryAddressSpace;

use std::sync::Arc;

use uamon_types::{DataValue, ReadValueId, TimestampsToReturn};

/// A value produced by an attribute read.
///
/// `Borrowed` values are backed by storage the address space retains
/// and may hand out again, so they must be deep copied before they are
/// kept beyond the current sample tick. `Owned` values belong to the
/// caller outright.
#[derive(Debug, Clone)]
pub enum SampledValue {
    /// The caller owns the value.
    Owned(DataValue),
    /// The value is shared with address space storage.
    Borrowed(Arc<DataValue>),
}

impl SampledValue {
    /// Borrow the underlying value.
    pub fn data_value(&self) -> &DataValue {
        match self {
            SampledValue::Owned(value) => value,
            SampledValue::Borrowed(value) => value,
        }
    }

    /// Take a value that may be kept indefinitely: moves an `Owned`
    /// value, deep copies a `Borrowed` one (unless this was the last
    /// reference to it).
    pub fn into_retained(self) -> DataValue {
        match self {
            SampledValue::Owned(value) => value,
            SampledValue::Borrowed(value) => {
                Arc::try_unwrap(value).unwrap_or_else(|shared| (*shared).clone())
            }
        }
    }
}

impl From<DataValue> for SampledValue {
    fn from(value: DataValue) -> Self {
        SampledValue::Owned(value)
    }
}

/// Resolves attribute reads for the monitoring engine.
///
/// Read failures are reported in-band: the returned value carries a bad
/// status code instead of a payload. A bad status is a legitimate value
/// that participates in change detection like any other.
pub trait AddressSpaceReader {
    /// Read one attribute of one node on behalf of the session that
    /// owns the calling subscription.
    fn read(
        &self,
        session_id: u32,
        node_to_read: &ReadValueId,
        timestamps_to_return: TimestampsToReturn,
    ) -> SampledValue;
}
