use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

/// Get the current UTC offset of the timezone named `canonical_timezone`, e.g. "Pacific/Auckland".
///
/// Returns `None` if the timezone name is not recognised.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// The current calendar year in the timezone named `canonical_timezone`.
///
/// Returns `None` if the timezone name is not recognised.
pub fn current_year(canonical_timezone: &str) -> Option<i32> {
    let offset = get_local_offset(canonical_timezone)?;

    Some(OffsetDateTime::now_utc().to_offset(offset).year())
}
