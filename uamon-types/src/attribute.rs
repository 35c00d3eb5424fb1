// UAMon for Rust
// SPDX-License-Identifier: MPL-2.0

//! Contains the `AttributeId` enum and the types describing what to
//! read from a node.

use crate::{node_id::NodeId, status_code::StatusCode, string::UAString};

/// The possible attributes of a node.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum AttributeId {
    NodeId = 1,
    NodeClass = 2,
    BrowseName = 3,
    DisplayName = 4,
    Description = 5,
    WriteMask = 6,
    UserWriteMask = 7,
    IsAbstract = 8,
    Symmetric = 9,
    InverseName = 10,
    ContainsNoLoops = 11,
    EventNotifier = 12,
    Value = 13,
    DataType = 14,
    ValueRank = 15,
    ArrayDimensions = 16,
    AccessLevel = 17,
    UserAccessLevel = 18,
    MinimumSamplingInterval = 19,
    Historizing = 20,
    Executable = 21,
    UserExecutable = 22,
}

impl TryFrom<u32> for AttributeId {
    type Error = StatusCode;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => AttributeId::NodeId,
            2 => AttributeId::NodeClass,
            3 => AttributeId::BrowseName,
            4 => AttributeId::DisplayName,
            5 => AttributeId::Description,
            6 => AttributeId::WriteMask,
            7 => AttributeId::UserWriteMask,
            8 => AttributeId::IsAbstract,
            9 => AttributeId::Symmetric,
            10 => AttributeId::InverseName,
            11 => AttributeId::ContainsNoLoops,
            12 => AttributeId::EventNotifier,
            13 => AttributeId::Value,
            14 => AttributeId::DataType,
            15 => AttributeId::ValueRank,
            16 => AttributeId::ArrayDimensions,
            17 => AttributeId::AccessLevel,
            18 => AttributeId::UserAccessLevel,
            19 => AttributeId::MinimumSamplingInterval,
            20 => AttributeId::Historizing,
            21 => AttributeId::Executable,
            22 => AttributeId::UserExecutable,
            _ => return Err(StatusCode::BadAttributeIdInvalid),
        })
    }
}

/// Which timestamps a read should populate on the returned value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum TimestampsToReturn {
    /// Return the source timestamp. The default for monitored items.
    #[default]
    Source = 0,
    /// Return the server timestamp.
    Server = 1,
    /// Return both the source and the server timestamp.
    Both = 2,
    /// Return neither timestamp.
    Neither = 3,
}

impl TryFrom<u32> for TimestampsToReturn {
    type Error = StatusCode;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TimestampsToReturn::Source),
            1 => Ok(TimestampsToReturn::Server),
            2 => Ok(TimestampsToReturn::Both),
            3 => Ok(TimestampsToReturn::Neither),
            _ => Err(StatusCode::BadTimestampsToReturnInvalid),
        }
    }
}

/// Identifies one attribute of one node, optionally restricted to an
/// index range within an array value. The range is kept opaque here;
/// the address space resolves it when servicing the read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadValueId {
    /// The node to read.
    pub node_id: NodeId,
    /// The attribute to read.
    pub attribute_id: u32,
    /// Used to identify a single element of an array, or a single range
    /// of indexes for arrays. Null for the whole value.
    pub index_range: UAString,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_id_from_u32() {
        assert_eq!(AttributeId::try_from(13), Ok(AttributeId::Value));
        assert_eq!(
            AttributeId::try_from(99),
            Err(StatusCode::BadAttributeIdInvalid)
        );
    }

    #[test]
    fn timestamps_default_is_source() {
        assert_eq!(TimestampsToReturn::default(), TimestampsToReturn::Source);
    }
}
