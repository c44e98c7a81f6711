//! Day-number representation of datetime coordinates
//!
//! Datetime dimensions are stored as floating-point day numbers: days since
//! 0001-01-01 00:00 UTC plus one, so that instant maps to 1.0. This lets
//! datetime bounds travel through the numeric [`Bounds`](crate::interp::Bounds)
//! like any other coordinate.

use crate::interp::Bounds;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Day number of a datetime.
pub fn date_to_num(datetime: NaiveDateTime) -> f64 {
    let days = f64::from(datetime.date().num_days_from_ce());
    let seconds = f64::from(datetime.time().num_seconds_from_midnight())
        + f64::from(datetime.time().nanosecond()) * 1e-9;
    days + seconds / SECONDS_PER_DAY
}

/// Datetime of a day number, rounded to the microsecond.
///
/// Returns `None` for non-finite numbers and for numbers outside the range
/// chrono can represent.
pub fn num_to_date(num: f64) -> Option<NaiveDateTime> {
    if !num.is_finite() {
        return None;
    }
    let days = num.floor();
    if days < f64::from(i32::MIN) || days > f64::from(i32::MAX) {
        return None;
    }
    let date = NaiveDate::from_num_days_from_ce_opt(days as i32)?;
    let micros = ((num - days) * SECONDS_PER_DAY * 1e6).round() as i64;
    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::microseconds(micros))
}

/// Coordinate bounds from optional datetime limits.
pub fn bounds_from_dates(min: Option<NaiveDateTime>, max: Option<NaiveDateTime>) -> Bounds {
    (min.map(date_to_num), max.map(date_to_num))
}
