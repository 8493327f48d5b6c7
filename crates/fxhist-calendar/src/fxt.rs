//! FXT ("Forex Time") conversion.
//!
//! FXT is New York local time shifted by seven hours, so the trading week
//! opens at Monday 00:00 FXT all year round. The offset to GMT follows the
//! US daylight-saving table: +2h in winter, +3h in summer.

use chrono::{DateTime, Offset};
use chrono_tz::America::New_York;
use fxhist_types::CalendarError;

/// Shift of FXT against New York local time.
const FXT_SHIFT: i64 = 7 * 3600;

/// First GMT timestamp with a known FXT offset.
pub const FXT_TABLE_START: i64 = 0;

/// First GMT timestamp past the known table (2038-01-19 03:14:08 GMT).
pub const FXT_TABLE_END: i64 = i32::MAX as i64 + 1;

/// Returns the offset such that `fxt_time = gmt_time + offset`.
///
/// Returns `None` outside `[FXT_TABLE_START, FXT_TABLE_END)`; callers must
/// treat that as an error and never substitute a default.
#[must_use]
pub fn fxt_offset(gmt_time: i64) -> Option<i64> {
    if !(FXT_TABLE_START..FXT_TABLE_END).contains(&gmt_time) {
        return None;
    }
    let utc = DateTime::from_timestamp(gmt_time, 0)?;
    let local = utc.with_timezone(&New_York);
    Some(i64::from(local.offset().fix().local_minus_utc()) + FXT_SHIFT)
}

/// Converts a GMT timestamp to FXT.
///
/// # Errors
///
/// Returns [`CalendarError::UnknownFxtOffset`] outside the known table.
pub fn gmt_to_fxt(gmt_time: i64) -> Result<i64, CalendarError> {
    fxt_offset(gmt_time)
        .map(|offset| gmt_time + offset)
        .ok_or(CalendarError::UnknownFxtOffset(gmt_time))
}

/// Converts an FXT timestamp back to GMT.
///
/// Local times that FXT skips at the spring transition have no GMT
/// counterpart; times repeated in autumn resolve to the earlier instant.
///
/// # Errors
///
/// Returns [`CalendarError::UnknownFxtOffset`] if no GMT instant maps to `fxt_time`.
pub fn fxt_to_gmt(fxt_time: i64) -> Result<i64, CalendarError> {
    let unknown = CalendarError::UnknownFxtOffset(fxt_time);
    let first = fxt_offset(fxt_time - FXT_SHIFT).ok_or_else(|| unknown.clone())?;

    let mut candidates = [fxt_time - first, 0];
    let second = fxt_offset(candidates[0]).ok_or_else(|| unknown.clone())?;
    candidates[1] = fxt_time - second;
    candidates.sort_unstable();

    candidates
        .into_iter()
        .find(|gmt| fxt_offset(*gmt).is_some_and(|offset| gmt + offset == fxt_time))
        .ok_or(unknown)
}
