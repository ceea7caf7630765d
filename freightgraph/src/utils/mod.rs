//! Utility functions for durations, timestamps and content hashing.

mod duration;
mod hashing;

pub use duration::{format_duration, parse_duration, DurationError};
pub use hashing::content_hash;

use chrono::{DateTime, Utc};

/// Represents a timestamp that can be serialized/deserialized.
pub type Timestamp = DateTime<Utc>;

/// Returns the current UTC timestamp.
#[must_use]
pub fn now_utc() -> Timestamp {
    Utc::now()
}
