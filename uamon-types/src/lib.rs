// UAMon for Rust
// SPDX-License-Identifier: MPL-2.0

//! Value model and OPC-UA binary encoding used by the uamon monitoring
//! engine.
//!
//! The engine compares sampled values by encoding them to the canonical
//! binary form and comparing the bytes, so this crate provides the
//! built-in types ([`DataValue`], [`Variant`], [`NodeId`], ...) together
//! with the encode half of the OPC-UA binary codec. There is no wire
//! decoding here: nothing in the engine ever parses a binary stream.

mod attribute;
mod byte_string;
mod data_change;
mod data_value;
mod date_time;
mod encoding;
mod node_id;
mod status_code;
mod string;
mod variant;

pub use attribute::{AttributeId, ReadValueId, TimestampsToReturn};
pub use byte_string::ByteString;
pub use data_change::{DataChangeTrigger, FilteredDataValue};
pub use data_value::DataValue;
pub use date_time::DateTime;
pub use encoding::{
    process_encode_io_result, write_f32, write_f64, write_i16, write_i32, write_i64, write_u16,
    write_u32, write_u64, write_u8, BinaryEncodable, EncodingResult, Error,
};
pub use node_id::{Identifier, NodeId};
pub use status_code::{StatusCode, INFO_BITS_OVERFLOW, INFO_TYPE_DATA_VALUE};
pub use string::UAString;
pub use variant::{Variant, VariantTypeId};
