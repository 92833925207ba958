//! Minute-of-day arithmetic for "HH:MM" wall-clock strings.

use crate::domain::ScheduleError;

pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Parses a strict zero-padded 24-hour `"HH:MM"` string into minutes since
/// midnight, in `[0, 1439]`.
pub fn parse_hhmm(value: &str) -> Result<u32, ScheduleError> {
    let invalid = || ScheduleError::InvalidTimeFormat(value.to_string());
    let (hour_str, minute_str) = value.split_once(':').ok_or_else(invalid)?;
    if hour_str.len() != 2
        || minute_str.len() != 2
        || !hour_str.bytes().all(|byte| byte.is_ascii_digit())
        || !minute_str.bytes().all(|byte| byte.is_ascii_digit())
    {
        return Err(invalid());
    }

    let hour: u32 = hour_str.parse().map_err(|_| invalid())?;
    let minute: u32 = minute_str.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok(hour * 60 + minute)
}

/// Formats minutes since midnight as zero-padded 24-hour `"HH:MM"`.
///
/// Out-of-range input wraps into `[0, 1440)`, so scheduler arithmetic that
/// runs past midnight still produces a valid wall-clock time.
pub fn format_hhmm(minutes: i64) -> String {
    let wrapped = minutes.rem_euclid(MINUTES_PER_DAY);
    format!("{:02}:{:02}", wrapped / 60, wrapped % 60)
}

/// Formats minutes since midnight as a 12-hour `"H:MM AM/PM"` display string.
/// Expects input already normalized to `[0, 1439]`; does not wrap.
pub fn format_clock(minutes: u32) -> String {
    let hour = minutes / 60;
    let minute = minutes % 60;
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let display_hour = match hour % 12 {
        0 => 12,
        other => other,
    };
    format!("{display_hour}:{minute:02} {suffix}")
}
