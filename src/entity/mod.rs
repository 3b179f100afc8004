mod note;

pub use note::{Note, UNTITLED};

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

const ID_PREFIX: &str = "note_";

/// Current time in the persisted timestamp format (`2025-03-01T10:00:00.000Z`).
///
/// Fixed millisecond precision keeps ordinal string order equal to chronological order.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a persisted timestamp. Returns `None` for anything that is not RFC 3339.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Generate a fresh note id.
pub fn generate_id() -> String {
    format!("{}{}", ID_PREFIX, Uuid::new_v4().simple())
}

/// Abbreviated id for human-readable output.
pub fn short_id(id: &str) -> &str {
    let bare = id.strip_prefix(ID_PREFIX).unwrap_or(id);
    match bare.char_indices().nth(8) {
        Some((end, _)) => &bare[..end],
        None => bare,
    }
}
