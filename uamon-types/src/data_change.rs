// UAMon for Rust
// SPDX-License-Identifier: MPL-2.0

//! Data change triggers and the trigger-masked comparison view of a
//! `DataValue`.

use std::io::Write;

use crate::{
    data_value::{byte_len_parts, encode_parts, DataValue},
    date_time::DateTime,
    encoding::{BinaryEncodable, EncodingResult},
    status_code::StatusCode,
    variant::Variant,
};

/// Selects which components of a `DataValue` participate in change
/// detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(u32)]
pub enum DataChangeTrigger {
    /// Report a notification only if the status changes.
    Status = 0,
    /// Report a notification if either the status or the value change.
    #[default]
    StatusValue = 1,
    /// Report a notification if the status, value or source timestamp
    /// change.
    StatusValueTimestamp = 2,
}

impl TryFrom<u32> for DataChangeTrigger {
    type Error = StatusCode;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DataChangeTrigger::Status),
            1 => Ok(DataChangeTrigger::StatusValue),
            2 => Ok(DataChangeTrigger::StatusValueTimestamp),
            _ => Err(StatusCode::BadMonitoredItemFilterUnsupported),
        }
    }
}

/// A borrowing view of a `DataValue` with the components masked out by
/// a [`DataChangeTrigger`] removed. Encodes byte-identically to the
/// `DataValue` that masking would have produced, without mutating or
/// copying the underlying value.
///
/// Server timestamps never participate in change detection and are
/// always absent from the view.
#[derive(Debug, Clone, Copy)]
pub struct FilteredDataValue<'a> {
    value: Option<&'a Variant>,
    status: Option<StatusCode>,
    source_timestamp: Option<DateTime>,
    source_picoseconds: Option<u16>,
}

impl BinaryEncodable for FilteredDataValue<'_> {
    fn byte_len(&self) -> usize {
        byte_len_parts(
            self.value,
            self.status,
            self.source_timestamp,
            self.source_picoseconds,
            None,
            None,
        )
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S) -> EncodingResult<()> {
        encode_parts(
            stream,
            self.value,
            self.status,
            self.source_timestamp,
            self.source_picoseconds,
            None,
            None,
        )
    }
}

impl DataValue {
    /// The view of this value that participates in change detection
    /// under `trigger`.
    pub fn filtered(&self, trigger: DataChangeTrigger) -> FilteredDataValue<'_> {
        let masks_value = trigger == DataChangeTrigger::Status;
        let masks_source = trigger < DataChangeTrigger::StatusValueTimestamp;
        FilteredDataValue {
            value: if masks_value {
                None
            } else {
                self.value.as_ref()
            },
            status: self.status,
            source_timestamp: if masks_source {
                None
            } else {
                self.source_timestamp
            },
            source_picoseconds: if masks_source {
                None
            } else {
                self.source_picoseconds
            },
        }
    }
}
