// UAMon for Rust
// SPDX-License-Identifier: MPL-2.0

//! Contains the implementation of `ByteString`.

use std::io::Write;

use crate::encoding::{process_encode_io_result, write_i32, BinaryEncodable, EncodingResult};

/// A sequence of octets.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct ByteString {
    /// Raw inner byte string values as an array of bytes.
    pub value: Option<Vec<u8>>,
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        self.value.as_deref().unwrap_or(&[])
    }
}

impl BinaryEncodable for ByteString {
    fn byte_len(&self) -> usize {
        // Length plus the actual length of bytes (if not null)
        4 + match &self.value {
            Some(v) => v.len(),
            None => 0,
        }
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S) -> EncodingResult<()> {
        // Byte strings are encoded as bytes preceded by an Int32 length. A -1 indicates a null value
        match &self.value {
            None => write_i32(stream, -1),
            Some(value) => {
                write_i32(stream, value.len() as i32)?;
                process_encode_io_result(stream.write_all(value))
            }
        }
    }
}

impl<'a, T> From<&'a T> for ByteString
where
    T: AsRef<[u8]> + ?Sized,
{
    fn from(value: &'a T) -> Self {
        Self::from(value.as_ref().to_vec())
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(value: Vec<u8>) -> Self {
        // Empty bytes will be treated as Some([])
        ByteString { value: Some(value) }
    }
}

impl ByteString {
    /// Create a null string (not the same as an empty string).
    pub fn null() -> ByteString {
        ByteString { value: None }
    }

    /// Test if the string is null.
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Test if the bytestring has an empty value (not the same as null).
    pub fn is_empty(&self) -> bool {
        self.value.as_ref().is_some_and(|v| v.is_empty())
    }

    /// Test if the string is null or empty.
    pub fn is_null_or_empty(&self) -> bool {
        self.is_null() || self.is_empty()
    }
}

#[test]
fn bytestring_null() {
    let v = ByteString::null();
    assert!(v.is_null());
    assert!(!v.is_empty());
    assert!(v.is_null_or_empty());
}

#[test]
fn bytestring_bytes() {
    let a = [0x1u8, 0x2u8, 0x3u8, 0x4u8];
    let v = ByteString::from(&a);
    assert!(!v.is_null());
    assert!(!v.is_empty());
    assert_eq!(v.value.as_ref().unwrap(), &a);
    assert_eq!(v.encode_to_vec(), [4, 0, 0, 0, 1, 2, 3, 4]);
}
