//! Time-window selection of fetched posts

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeDelta, TimeZone};
use moodscope_core::{Error, Post, Result};
use tracing::warn;

/// Platform timestamp layout, e.g. `Sun Jun 30 12:27:28 +0800 2013`
pub const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Length of one "month" step when computing the window start
const PERIOD_SECS: i64 = 2_592_000;

/// Parse a platform `created_at` string
pub fn parse_created_at(created_at: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_str(created_at, CREATED_AT_FORMAT)
        .map_err(|e| Error::input(format!("invalid created_at '{created_at}': {e}")))
}

/// First day of the window covering the last `months` months
///
/// Steps back `months - 1` thirty-day periods from `now` and rounds down to
/// the first day of that month. A window reaching past the representable
/// date range is an input error.
pub fn window_start<Tz: TimeZone>(months: u32, now: &DateTime<Tz>) -> Result<NaiveDate> {
    let steps = i64::from(months.saturating_sub(1));
    let shifted = PERIOD_SECS
        .checked_mul(steps)
        .and_then(TimeDelta::try_seconds)
        .and_then(|span| now.clone().checked_sub_signed(span))
        .ok_or_else(|| Error::input(format!("a {months}-month window is out of range")))?;

    let date = shifted.date_naive();
    Ok(NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date))
}

/// Posts created on or after `start` (in each post's own offset)
///
/// Posts with an unparseable timestamp are dropped and logged.
pub fn filter_since(posts: &[Post], start: NaiveDate) -> Vec<Post> {
    posts
        .iter()
        .filter(|post| match parse_created_at(&post.created_at) {
            Ok(created) => created.date_naive() >= start,
            Err(e) => {
                warn!("Dropping post {} from window: {}", post.id, e);
                false
            }
        })
        .cloned()
        .collect()
}
