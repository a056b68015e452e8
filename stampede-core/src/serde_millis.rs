//! Serde helper for `Duration` fields stored as fractional milliseconds

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = f64::deserialize(deserializer)?;
    if !millis.is_finite() || millis < 0.0 {
        return Err(serde::de::Error::custom(format!(
            "duration must be a non-negative number of milliseconds, got {}",
            millis
        )));
    }
    Ok(Duration::from_secs_f64(millis / 1000.0))
}
