// UAMon for Rust
// SPDX-License-Identifier: MPL-2.0

//! Contains the implementation of `Variant`.

use std::io::Write;

use crate::{
    byte_string::ByteString,
    date_time::DateTime,
    encoding::{
        write_f32, write_f64, write_i16, write_i32, write_i64, write_u16, write_u32, write_u64,
        write_u8, BinaryEncodable, EncodingResult, Error,
    },
    node_id::NodeId,
    status_code::StatusCode,
    string::UAString,
};

/// The numeric built-in type id of a variant value, as used in the
/// encoding mask byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VariantTypeId {
    /// Boolean
    Boolean = 1,
    /// Signed byte
    SByte = 2,
    /// Unsigned byte
    Byte = 3,
    /// Signed 16-bit int
    Int16 = 4,
    /// Unsigned 16-bit int
    UInt16 = 5,
    /// Signed 32-bit int
    Int32 = 6,
    /// Unsigned 32-bit int
    UInt32 = 7,
    /// Signed 64-bit int
    Int64 = 8,
    /// Unsigned 64-bit int
    UInt64 = 9,
    /// Float
    Float = 10,
    /// Double
    Double = 11,
    /// String
    String = 12,
    /// DateTime
    DateTime = 13,
    /// ByteString
    ByteString = 15,
    /// NodeId
    NodeId = 17,
    /// StatusCode
    StatusCode = 19,
}

/// Bit set in the encoding mask when the variant holds a single
/// dimension array of the masked type.
const ARRAY_VALUES_BIT: u8 = 1 << 7;

/// A `Variant` holds built-in OPC UA data types, including single
/// dimensional arrays of a scalar type.
///
/// As variants may be passed around a lot on the stack, Boxes are used
/// for more complex types to keep the size of this type down a bit,
/// especially when used in arrays.
///
/// This is the subset of built-in types the monitoring engine samples;
/// multi-dimensional arrays and the structured types are not
/// represented.
#[derive(PartialEq, Debug, Clone, Default)]
pub enum Variant {
    /// Empty type has no value. It is equivalent to a Null value (part 6 5.1.6)
    #[default]
    Empty,
    /// Boolean
    Boolean(bool),
    /// Signed byte
    SByte(i8),
    /// Unsigned byte
    Byte(u8),
    /// Signed 16-bit int
    Int16(i16),
    /// Unsigned 16-bit int
    UInt16(u16),
    /// Signed 32-bit int
    Int32(i32),
    /// Unsigned 32-bit int
    UInt32(u32),
    /// Signed 64-bit int
    Int64(i64),
    /// Unsigned 64-bit int
    UInt64(u64),
    /// Float
    Float(f32),
    /// Double
    Double(f64),
    /// String
    String(UAString),
    /// DateTime
    DateTime(Box<DateTime>),
    /// StatusCode
    StatusCode(StatusCode),
    /// ByteString
    ByteString(ByteString),
    /// NodeId
    NodeId(Box<NodeId>),
    /// Single dimension array which can contain any scalar type, all
    /// the same type. Nested arrays are rejected at encoding time.
    Array(Vec<Variant>),
}

macro_rules! impl_from_for_variant {
    ($tp: ty, $vt: ident) => {
        impl From<$tp> for Variant {
            fn from(value: $tp) -> Self {
                Variant::$vt(value)
            }
        }
    };
}

impl_from_for_variant!(bool, Boolean);
impl_from_for_variant!(i8, SByte);
impl_from_for_variant!(u8, Byte);
impl_from_for_variant!(i16, Int16);
impl_from_for_variant!(u16, UInt16);
impl_from_for_variant!(i32, Int32);
impl_from_for_variant!(u32, UInt32);
impl_from_for_variant!(i64, Int64);
impl_from_for_variant!(u64, UInt64);
impl_from_for_variant!(f32, Float);
impl_from_for_variant!(f64, Double);
impl_from_for_variant!(UAString, String);
impl_from_for_variant!(StatusCode, StatusCode);
impl_from_for_variant!(ByteString, ByteString);

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::String(value.into())
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Variant::String(value.into())
    }
}

impl From<DateTime> for Variant {
    fn from(value: DateTime) -> Self {
        Variant::DateTime(Box::new(value))
    }
}

impl From<NodeId> for Variant {
    fn from(value: NodeId) -> Self {
        Variant::NodeId(Box::new(value))
    }
}

impl From<Vec<Variant>> for Variant {
    fn from(value: Vec<Variant>) -> Self {
        Variant::Array(value)
    }
}

impl Variant {
    /// The scalar type id of this value, None for `Empty` and arrays.
    pub fn type_id(&self) -> Option<VariantTypeId> {
        Some(match self {
            Variant::Empty | Variant::Array(_) => return None,
            Variant::Boolean(_) => VariantTypeId::Boolean,
            Variant::SByte(_) => VariantTypeId::SByte,
            Variant::Byte(_) => VariantTypeId::Byte,
            Variant::Int16(_) => VariantTypeId::Int16,
            Variant::UInt16(_) => VariantTypeId::UInt16,
            Variant::Int32(_) => VariantTypeId::Int32,
            Variant::UInt32(_) => VariantTypeId::UInt32,
            Variant::Int64(_) => VariantTypeId::Int64,
            Variant::UInt64(_) => VariantTypeId::UInt64,
            Variant::Float(_) => VariantTypeId::Float,
            Variant::Double(_) => VariantTypeId::Double,
            Variant::String(_) => VariantTypeId::String,
            Variant::DateTime(_) => VariantTypeId::DateTime,
            Variant::StatusCode(_) => VariantTypeId::StatusCode,
            Variant::ByteString(_) => VariantTypeId::ByteString,
            Variant::NodeId(_) => VariantTypeId::NodeId,
        })
    }

    /// Test if the variant holds an array.
    pub fn is_array(&self) -> bool {
        matches!(self, Variant::Array(_))
    }

    /// The length in bytes of the value payload, excluding the encoding
    /// mask byte.
    fn value_byte_len(&self) -> usize {
        match self {
            Variant::Empty => 0,
            Variant::Boolean(_) | Variant::SByte(_) | Variant::Byte(_) => 1,
            Variant::Int16(_) | Variant::UInt16(_) => 2,
            Variant::Int32(_) | Variant::UInt32(_) | Variant::Float(_) => 4,
            Variant::Int64(_) | Variant::UInt64(_) | Variant::Double(_) => 8,
            Variant::String(value) => value.byte_len(),
            Variant::DateTime(value) => value.byte_len(),
            Variant::StatusCode(value) => value.byte_len(),
            Variant::ByteString(value) => value.byte_len(),
            Variant::NodeId(value) => value.byte_len(),
            Variant::Array(values) => {
                4 + values.iter().map(|v| v.value_byte_len()).sum::<usize>()
            }
        }
    }

    fn encode_value<S: Write + ?Sized>(&self, stream: &mut S) -> EncodingResult<()> {
        match self {
            Variant::Empty => Ok(()),
            Variant::Boolean(value) => write_u8(stream, u8::from(*value)),
            Variant::SByte(value) => write_u8(stream, *value as u8),
            Variant::Byte(value) => write_u8(stream, *value),
            Variant::Int16(value) => write_i16(stream, *value),
            Variant::UInt16(value) => write_u16(stream, *value),
            Variant::Int32(value) => write_i32(stream, *value),
            Variant::UInt32(value) => write_u32(stream, *value),
            Variant::Int64(value) => write_i64(stream, *value),
            Variant::UInt64(value) => write_u64(stream, *value),
            Variant::Float(value) => write_f32(stream, *value),
            Variant::Double(value) => write_f64(stream, *value),
            Variant::String(value) => value.encode(stream),
            Variant::DateTime(value) => value.encode(stream),
            Variant::StatusCode(value) => value.encode(stream),
            Variant::ByteString(value) => value.encode(stream),
            Variant::NodeId(value) => value.encode(stream),
            Variant::Array(_) => Err(Error::encoding("Nested arrays are not encodable")),
        }
    }

    /// The element type of an array, enforcing that every element is a
    /// scalar of the same type.
    fn array_element_type(values: &[Variant]) -> EncodingResult<VariantTypeId> {
        let mut elements = values.iter();
        let type_id = elements
            .next()
            .and_then(|v| v.type_id())
            .ok_or_else(|| Error::encoding("Array must hold at least one scalar element"))?;
        if elements.any(|v| v.type_id() != Some(type_id)) {
            Err(Error::encoding("Array elements must all share one type"))
        } else {
            Ok(type_id)
        }
    }
}

impl BinaryEncodable for Variant {
    fn byte_len(&self) -> usize {
        // Mask byte plus the payload. For arrays the payload includes
        // the i32 element count. This may disagree with what `encode`
        // will accept for malformed arrays; `encode` then fails.
        1 + self.value_byte_len()
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S) -> EncodingResult<()> {
        match self {
            Variant::Empty => write_u8(stream, 0u8),
            Variant::Array(values) => {
                let type_id = Variant::array_element_type(values)?;
                write_u8(stream, type_id as u8 | ARRAY_VALUES_BIT)?;
                write_i32(stream, values.len() as i32)?;
                for value in values {
                    value.encode_value(stream)?;
                }
                Ok(())
            }
            scalar => {
                // type_id is always Some for the scalar arms
                let type_id = scalar.type_id().ok_or_else(|| {
                    Error::new(StatusCode::BadInternalError, "Scalar without a type id")
                })?;
                write_u8(stream, type_id as u8)?;
                scalar.encode_value(stream)
            }
        }
    }
}
