use std::time::{SystemTime, UNIX_EPOCH};

/// Current Unix time in seconds, as the wire format represents timestamps.
#[must_use]
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
