// UAMon for Rust
// SPDX-License-Identifier: MPL-2.0

//! Contains the implementation of `DateTime`.

use std::{fmt, io::Write};

use chrono::{SecondsFormat, TimeZone, Utc};

use crate::encoding::{write_i64, BinaryEncodable, EncodingResult};

/// Number of 100ns ticks between 1601-01-01 and the unix epoch.
const UNIX_EPOCH_TICKS: i64 = 11_644_473_600 * TICKS_PER_SECOND;
const TICKS_PER_SECOND: i64 = 10_000_000;
const NANOS_PER_TICK: i64 = 100;

/// An instant in time. OPC UA encodes timestamps as the number of 100
/// nanosecond ticks since 1601-01-01 00:00:00 UTC; times at or before
/// that epoch are represented as the null time, tick 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime(chrono::DateTime<Utc>);

impl DateTime {
    /// The current time, truncated to tick resolution.
    pub fn now() -> DateTime {
        DateTime::from(Utc::now())
    }

    /// The null time, tick 0.
    pub fn null() -> DateTime {
        DateTime::from_ticks(0)
    }

    /// Construct from 100ns ticks since 1601-01-01.
    pub fn from_ticks(ticks: i64) -> DateTime {
        let unix_ticks = ticks.max(0) - UNIX_EPOCH_TICKS;
        let secs = unix_ticks.div_euclid(TICKS_PER_SECOND);
        let nanos = unix_ticks.rem_euclid(TICKS_PER_SECOND) * NANOS_PER_TICK;
        DateTime(Utc.timestamp_opt(secs, nanos as u32).unwrap())
    }

    /// The number of 100ns ticks since 1601-01-01, the encoded form.
    pub fn ticks(&self) -> i64 {
        let nanos = self
            .0
            .timestamp_nanos_opt()
            .unwrap_or_else(|| self.0.timestamp() * 1_000_000_000);
        (nanos / NANOS_PER_TICK + UNIX_EPOCH_TICKS).max(0)
    }

    /// True if this is the null time.
    pub fn is_null(&self) -> bool {
        self.ticks() == 0
    }

    /// The wrapped chrono time.
    pub fn as_chrono(&self) -> &chrono::DateTime<Utc> {
        &self.0
    }
}

impl From<chrono::DateTime<Utc>> for DateTime {
    fn from(value: chrono::DateTime<Utc>) -> Self {
        // Truncate to tick resolution so a round trip through the
        // encoded form compares equal.
        let nanos = value.timestamp_subsec_nanos() as i64;
        DateTime(value - chrono::Duration::nanoseconds(nanos % NANOS_PER_TICK))
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339_opts(SecondsFormat::Micros, true))
    }
}

impl BinaryEncodable for DateTime {
    fn byte_len(&self) -> usize {
        8
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S) -> EncodingResult<()> {
        write_i64(stream, self.ticks())
    }
}
