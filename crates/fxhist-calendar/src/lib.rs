//! Period boundaries, FXT offsets and trading-day rules for fxhist.
//!
//! Trading-time layer of fxhist: period open/close boundaries for all
//! standard timeframes, the FXT ("Forex Time", `America/New_York + 7h`)
//! offset from GMT, and weekend/holiday classification of trading days.
//! All functions are pure.
//!
//! - [`period_open`] / [`close_time`] - Bucket boundaries for a [`Period`](fxhist_types::Period)
//! - [`fxt_offset`] - Signed FXT offset from GMT, tracking New York DST
//! - [`TradingCalendar`] - Weekend and holiday classification

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fxhist/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod boundary;
mod fxt;
mod trading;

pub use boundary::{PeriodBoundary, close_time, period_open};
pub use fxt::{FXT_TABLE_END, FXT_TABLE_START, fxt_offset, fxt_to_gmt, gmt_to_fxt};
pub use trading::{CalendarZone, FixedHoliday, HolidayRule, TradingCalendar};
