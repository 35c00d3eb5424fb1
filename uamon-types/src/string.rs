// UAMon for Rust
// SPDX-License-Identifier: MPL-2.0

//! Contains the implementation of `UAString`.

use std::{fmt, io::Write};

use crate::encoding::{process_encode_io_result, write_i32, BinaryEncodable, EncodingResult};

/// To avoid naming conflict hell, the OPC UA String type is typed
/// `UAString` so it is easily distinguished from the Rust `String`. A
/// string contains UTF-8 encoded characters or a null value. A null
/// value is distinct from being an empty string.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct UAString {
    /// The string value, or None for the null string.
    value: Option<String>,
}

impl fmt::Display for UAString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}", value),
            None => write!(f, "[null]"),
        }
    }
}

impl BinaryEncodable for UAString {
    fn byte_len(&self) -> usize {
        // Length plus the actual length of bytes (if not null)
        4 + match &self.value {
            Some(v) => v.len(),
            None => 0,
        }
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S) -> EncodingResult<()> {
        // Strings are encoded as UTF8 chars preceded by an Int32 length. A -1 indicates a null string
        match &self.value {
            None => write_i32(stream, -1),
            Some(value) => {
                write_i32(stream, value.len() as i32)?;
                process_encode_io_result(stream.write_all(value.as_bytes()))
            }
        }
    }
}

impl From<&str> for UAString {
    fn from(value: &str) -> Self {
        UAString {
            value: Some(value.to_string()),
        }
    }
}

impl From<String> for UAString {
    fn from(value: String) -> Self {
        UAString { value: Some(value) }
    }
}

impl AsRef<str> for UAString {
    fn as_ref(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }
}

impl UAString {
    /// Create a null string (not the same as an empty string).
    pub fn null() -> UAString {
        UAString { value: None }
    }

    /// Test if the string is null.
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Test if the string is null or empty.
    pub fn is_empty(&self) -> bool {
        self.value.as_ref().map_or(true, |v| v.is_empty())
    }

    /// The inner value, if any.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

#[test]
fn string_null() {
    let s = UAString::null();
    assert!(s.is_null());
    assert!(s.is_empty());
    assert_eq!(s.encode_to_vec(), (-1i32).to_le_bytes());
}

#[test]
fn string_encode() {
    let s = UAString::from("ua");
    assert!(!s.is_null());
    assert_eq!(s.byte_len(), 6);
    assert_eq!(s.encode_to_vec(), [2, 0, 0, 0, b'u', b'a']);
}
