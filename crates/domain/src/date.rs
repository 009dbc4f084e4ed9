use chrono::prelude::*;
use chrono_tz::Tz;

fn calendar_day(date: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    date.with_timezone(tz).date_naive()
}

/// Whether both timestamps fall on the same calendar day in `tz`
pub fn is_same_day(a: &DateTime<Utc>, b: &DateTime<Utc>, tz: &Tz) -> bool {
    calendar_day(a, tz) == calendar_day(b, tz)
}

/// Whether the calendar day of `date` is strictly before the calendar day
/// of `other` in `tz`. Times within the same day never count as before.
pub fn is_before_day(date: &DateTime<Utc>, other: &DateTime<Utc>, tz: &Tz) -> bool {
    calendar_day(date, tz) < calendar_day(other, tz)
}

/// Formats a date like `Jan 5, 2026` in the given timezone
pub fn format_date(date: &DateTime<Utc>, tz: &Tz) -> String {
    date.with_timezone(tz).format("%b %-d, %Y").to_string()
}
