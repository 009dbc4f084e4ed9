use chrono::{DateTime, TimeZone, Utc};
use std::{fmt::Display, str::FromStr};

/// Timestamps are stored as millis since epoch
pub fn datetime_from_millis(millis: i64) -> anyhow::Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| anyhow::anyhow!("Timestamp out of range: {}", millis))
}

pub fn parse_column<T>(column: &str, value: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("Invalid value in column `{}`: {}", column, e))
}
