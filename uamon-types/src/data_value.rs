// UAMon for Rust
// SPDX-License-Identifier: MPL-2.0

//! Contains the implementation of `DataValue`.

use std::io::Write;

use crate::{
    date_time::DateTime,
    encoding::{write_u16, write_u8, BinaryEncodable, EncodingResult},
    status_code::StatusCode,
    variant::Variant,
};

/// Bits in the `DataValue` encoding mask byte, one per optional field.
pub(crate) mod encoding_mask {
    pub const HAS_VALUE: u8 = 1;
    pub const HAS_STATUS: u8 = 1 << 1;
    pub const HAS_SOURCE_TIMESTAMP: u8 = 1 << 2;
    pub const HAS_SERVER_TIMESTAMP: u8 = 1 << 3;
    pub const HAS_SOURCE_PICOSECONDS: u8 = 1 << 4;
    pub const HAS_SERVER_PICOSECONDS: u8 = 1 << 5;
}

/// A value with an associated status code and timestamps describing
/// when the value was sourced and when the server obtained it. Every
/// field other than the value itself is optional; the binary form
/// carries a mask byte announcing which fields are present.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataValue {
    /// The value. Not present if the status indicates an error.
    pub value: Option<Variant>,
    /// The status associated with the value. Not present equals `Good`.
    pub status: Option<StatusCode>,
    /// The source timestamp associated with the value.
    pub source_timestamp: Option<DateTime>,
    /// The number of 10 picosecond intervals for the source timestamp.
    pub source_picoseconds: Option<u16>,
    /// The server timestamp associated with the value.
    pub server_timestamp: Option<DateTime>,
    /// The number of 10 picosecond intervals for the server timestamp.
    pub server_picoseconds: Option<u16>,
}

/// Shared by `DataValue` and the trigger-masked comparison view so the
/// two encode byte-identically.
pub(crate) fn byte_len_parts(
    value: Option<&Variant>,
    status: Option<StatusCode>,
    source_timestamp: Option<DateTime>,
    source_picoseconds: Option<u16>,
    server_timestamp: Option<DateTime>,
    server_picoseconds: Option<u16>,
) -> usize {
    let mut size = 1;
    if let Some(value) = value {
        size += value.byte_len();
    }
    if let Some(status) = status {
        size += status.byte_len();
    }
    if let Some(ts) = source_timestamp {
        size += ts.byte_len();
        if source_picoseconds.is_some() {
            size += 2;
        }
    }
    if let Some(ts) = server_timestamp {
        size += ts.byte_len();
        if server_picoseconds.is_some() {
            size += 2;
        }
    }
    size
}

pub(crate) fn encode_parts<S: Write + ?Sized>(
    stream: &mut S,
    value: Option<&Variant>,
    status: Option<StatusCode>,
    source_timestamp: Option<DateTime>,
    source_picoseconds: Option<u16>,
    server_timestamp: Option<DateTime>,
    server_picoseconds: Option<u16>,
) -> EncodingResult<()> {
    let mut mask = 0u8;
    if value.is_some() {
        mask |= encoding_mask::HAS_VALUE;
    }
    if status.is_some() {
        mask |= encoding_mask::HAS_STATUS;
    }
    if source_timestamp.is_some() {
        mask |= encoding_mask::HAS_SOURCE_TIMESTAMP;
        if source_picoseconds.is_some() {
            mask |= encoding_mask::HAS_SOURCE_PICOSECONDS;
        }
    }
    if server_timestamp.is_some() {
        mask |= encoding_mask::HAS_SERVER_TIMESTAMP;
        if server_picoseconds.is_some() {
            mask |= encoding_mask::HAS_SERVER_PICOSECONDS;
        }
    }
    write_u8(stream, mask)?;

    if let Some(value) = value {
        value.encode(stream)?;
    }
    if let Some(status) = status {
        status.encode(stream)?;
    }
    // Picoseconds are ignored if their timestamp is absent
    if let Some(ts) = source_timestamp {
        ts.encode(stream)?;
        if let Some(ps) = source_picoseconds {
            write_u16(stream, ps)?;
        }
    }
    if let Some(ts) = server_timestamp {
        ts.encode(stream)?;
        if let Some(ps) = server_picoseconds {
            write_u16(stream, ps)?;
        }
    }
    Ok(())
}

impl BinaryEncodable for DataValue {
    fn byte_len(&self) -> usize {
        byte_len_parts(
            self.value.as_ref(),
            self.status,
            self.source_timestamp,
            self.source_picoseconds,
            self.server_timestamp,
            self.server_picoseconds,
        )
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S) -> EncodingResult<()> {
        encode_parts(
            stream,
            self.value.as_ref(),
            self.status,
            self.source_timestamp,
            self.source_picoseconds,
            self.server_timestamp,
            self.server_picoseconds,
        )
    }
}

impl DataValue {
    /// A data value with no fields at all.
    pub fn null() -> DataValue {
        DataValue::default()
    }

    /// A good value stamped with the current time as both source and
    /// server timestamp.
    pub fn new_now(value: impl Into<Variant>) -> DataValue {
        let now = DateTime::now();
        DataValue {
            value: Some(value.into()),
            status: Some(StatusCode::Good),
            source_timestamp: Some(now),
            source_picoseconds: None,
            server_timestamp: Some(now),
            server_picoseconds: None,
        }
    }

    /// A value carrying only a (usually bad) status code.
    pub fn from_status(status: StatusCode) -> DataValue {
        DataValue {
            status: Some(status),
            ..Default::default()
        }
    }

    /// The effective status: absent means `Good`.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::Good)
    }
}

impl<T> From<T> for DataValue
where
    T: Into<Variant>,
{
    fn from(value: T) -> Self {
        DataValue {
            value: Some(value.into()),
            ..Default::default()
        }
    }
}
