//! Operation trace record decoding and status filtering
//!
//! Field layout (no header):
//!
//! | pos | meaning                                  |
//! |-----|------------------------------------------|
//! | 0   | unused                                   |
//! | 1   | item key (path)                          |
//! | 2   | operation kind: 1 = create, 2 = read     |
//! | 3   | status code                              |
//! | 4   | request start time (µs)                  |
//! | 5   | duration (µs), creates only              |
//! | 6   | measured read latency (µs), reads only   |
//!
//! A field that fails to parse skips the record. It never reads as zero.

use std::fmt;

pub const OP_KIND_CREATE: i64 = 1;
pub const OP_KIND_READ: i64 = 2;

const POS_ITEM_KEY: usize = 1;
const POS_OP_KIND: usize = 2;
const POS_STATUS: usize = 3;
const POS_START_TIME: usize = 4;
const POS_DURATION: usize = 5;
const POS_READ_LATENCY: usize = 6;

/// A successful, fully decoded operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpEvent {
    Create {
        item_key: String,
        start_time_micros: i64,
        duration_micros: i64,
    },
    Read {
        item_key: String,
        start_time_micros: i64,
        read_latency_micros: i64,
    },
}

impl OpEvent {
    pub fn item_key(&self) -> &str {
        match self {
            OpEvent::Create { item_key, .. } | OpEvent::Read { item_key, .. } => item_key,
        }
    }
}

/// Why a record did not produce an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Row ended before a field the operation needs
    TooFewFields,
    /// Integer field at `position` did not parse
    Malformed { position: usize },
    /// Status was not the success code
    NonSuccessStatus(i64),
    /// Operation kind was neither create nor read
    UnknownOperation(i64),
    /// Row could not be read as text (bad UTF-8 or broken quoting)
    Unreadable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooFewFields => write!(f, "too few fields"),
            SkipReason::Malformed { position } => write!(f, "malformed field {}", position),
            SkipReason::NonSuccessStatus(code) => write!(f, "status {}", code),
            SkipReason::UnknownOperation(code) => write!(f, "unknown operation {}", code),
            SkipReason::Unreadable => write!(f, "unreadable row"),
        }
    }
}

fn field<'a>(fields: &[&'a str], position: usize) -> Result<&'a str, SkipReason> {
    fields
        .get(position)
        .copied()
        .ok_or(SkipReason::TooFewFields)
}

fn int_field(fields: &[&str], position: usize) -> Result<i64, SkipReason> {
    field(fields, position)?
        .trim()
        .parse::<i64>()
        .map_err(|_| SkipReason::Malformed { position })
}

/// Decode one raw record into an event
///
/// Status is checked before the operation-specific fields, so a failed
/// request with placeholder timings is reported as a status skip.
///
/// # Example
/// ```
/// use latmap::record::{decode, OpEvent};
///
/// let event = decode(&["_", "A", "2", "4", "500", "_", "50"], 4).unwrap();
/// assert_eq!(
///     event,
///     OpEvent::Read {
///         item_key: "A".to_string(),
///         start_time_micros: 500,
///         read_latency_micros: 50,
///     }
/// );
/// ```
pub fn decode(fields: &[&str], success_status: i64) -> Result<OpEvent, SkipReason> {
    let item_key = field(fields, POS_ITEM_KEY)?;
    let op_kind = int_field(fields, POS_OP_KIND)?;
    let status = int_field(fields, POS_STATUS)?;

    if status != success_status {
        return Err(SkipReason::NonSuccessStatus(status));
    }

    match op_kind {
        OP_KIND_CREATE => Ok(OpEvent::Create {
            item_key: item_key.to_string(),
            start_time_micros: int_field(fields, POS_START_TIME)?,
            duration_micros: int_field(fields, POS_DURATION)?,
        }),
        OP_KIND_READ => Ok(OpEvent::Read {
            item_key: item_key.to_string(),
            start_time_micros: int_field(fields, POS_START_TIME)?,
            read_latency_micros: int_field(fields, POS_READ_LATENCY)?,
        }),
        other => Err(SkipReason::UnknownOperation(other)),
    }
}
