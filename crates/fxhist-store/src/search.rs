//! Binary search over time-ordered bar sequences.
//!
//! Sequences must be strictly ascending by open time; stores reject
//! duplicates on ingestion so no tie-break rule exists. The `try_`
//! variants take a fallible accessor so files can be searched on disk one
//! time field at a time.

use std::convert::Infallible;

use fxhist_calendar::PeriodBoundary;
use fxhist_types::{Bar, CalendarError, Period};

/// A sequence addressable by position with ascending open times.
pub trait OpenTimes {
    /// Number of entries.
    fn count(&self) -> usize;

    /// Open time of the entry at `index`.
    fn open_time_at(&self, index: usize) -> i64;
}

impl OpenTimes for [Bar] {
    fn count(&self) -> usize {
        self.len()
    }

    fn open_time_at(&self, index: usize) -> i64 {
        self[index].open_time
    }
}

impl OpenTimes for [i64] {
    fn count(&self) -> usize {
        self.len()
    }

    fn open_time_at(&self, index: usize) -> i64 {
        self[index]
    }
}

/// Indices found for one query time in a single pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchResult {
    /// Index with exactly the query time.
    pub exact: Option<usize>,
    /// Rightmost index with open time <= query.
    pub floor: Option<usize>,
    /// Leftmost index with open time >= query.
    pub ceiling: Option<usize>,
}

impl SearchResult {
    const fn hit(index: usize) -> Self {
        Self {
            exact: Some(index),
            floor: Some(index),
            ceiling: Some(index),
        }
    }
}

/// Locates `time` by halving a window until two entries remain.
#[must_use]
pub fn search<T: OpenTimes + ?Sized>(series: &T, time: i64) -> SearchResult {
    let Ok(result) =
        try_search::<Infallible, _>(series.count(), time, |index| Ok(series.open_time_at(index)));
    result
}

/// [`search`] over `count` entries whose open times come from `time_at`.
///
/// # Errors
///
/// Returns the first error of `time_at`.
pub fn try_search<E, F>(count: usize, time: i64, mut time_at: F) -> Result<SearchResult, E>
where
    F: FnMut(usize) -> Result<i64, E>,
{
    if count == 0 {
        return Ok(SearchResult::default());
    }

    let last = count - 1;
    if time < time_at(0)? {
        return Ok(SearchResult {
            ceiling: Some(0),
            ..SearchResult::default()
        });
    }
    if time > time_at(last)? {
        return Ok(SearchResult {
            floor: Some(last),
            ..SearchResult::default()
        });
    }

    // time_at(lo) <= time <= time_at(hi)
    let (mut lo, mut hi) = (0, last);
    while hi - lo + 1 > 2 {
        let mid = lo + (hi - lo) / 2;
        let t = time_at(mid)?;
        if t == time {
            return Ok(SearchResult::hit(mid));
        }
        if t < time {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    Ok(if time_at(lo)? == time {
        SearchResult::hit(lo)
    } else if time_at(hi)? == time {
        SearchResult::hit(hi)
    } else {
        SearchResult {
            exact: None,
            floor: Some(lo),
            ceiling: Some(hi),
        }
    })
}

/// Index of the entry with exactly `time`.
#[must_use]
pub fn find_exact<T: OpenTimes + ?Sized>(series: &T, time: i64) -> Option<usize> {
    search(series, time).exact
}

/// Rightmost index with open time <= `time`.
#[must_use]
pub fn find_floor<T: OpenTimes + ?Sized>(series: &T, time: i64) -> Option<usize> {
    search(series, time).floor
}

/// Leftmost index with open time >= `time`.
#[must_use]
pub fn find_ceiling<T: OpenTimes + ?Sized>(series: &T, time: i64) -> Option<usize> {
    search(series, time).ceiling
}

/// Index of the bar whose `[open_time, close_time)` contains `time`.
///
/// Returns `Ok(None)` when `time` falls into a gap before, between or
/// after the bars; callers that need to know which gap can use
/// [`search`] for the surrounding floor and ceiling.
///
/// # Errors
///
/// Returns an error if the bar's close time cannot be computed.
pub fn find_bar_covering(
    bars: &[Bar],
    period: Period,
    time: i64,
) -> Result<Option<usize>, CalendarError> {
    try_find_bar_covering(bars.len(), period, time, |index| Ok(bars[index].open_time))
}

/// [`find_bar_covering`] over `count` bars whose open times come from `time_at`.
///
/// # Errors
///
/// Returns the first error of `time_at`, or a calendar error if the bar's
/// close time cannot be computed.
pub fn try_find_bar_covering<E, F>(
    count: usize,
    period: Period,
    time: i64,
    mut time_at: F,
) -> Result<Option<usize>, E>
where
    E: From<CalendarError>,
    F: FnMut(usize) -> Result<i64, E>,
{
    let Some(index) = try_search(count, time, &mut time_at)?.floor else {
        return Ok(None);
    };
    let boundary = PeriodBoundary::containing(time_at(index)?, period)?;
    Ok(boundary.contains(time).then_some(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(times: &[i64]) -> Vec<Bar> {
        times
            .iter()
            .map(|t| Bar::new(*t, 1.0, 1.0, 1.0, 1.0, 1))
            .collect()
    }

    fn linear(times: &[i64], query: i64) -> SearchResult {
        SearchResult {
            exact: times.iter().position(|t| *t == query),
            floor: times.iter().rposition(|t| *t <= query),
            ceiling: times.iter().position(|t| *t >= query),
        }
    }

    #[test]
    fn test_empty_sequence() {
        let empty: Vec<Bar> = Vec::new();
        assert_eq!(search(empty.as_slice(), 10), SearchResult::default());
        assert_eq!(find_bar_covering(&empty, Period::M1, 10).unwrap(), None);
    }

    #[test]
    fn test_agrees_with_linear_scan() {
        let sequences: [&[i64]; 5] = [
            &[100],
            &[100, 160],
            &[0, 60, 120, 180, 240],
            &[60, 120, 600, 660, 7200, 7260, 86_400],
            &[-120, -60, 0, 60, 300, 360, 420, 900, 1200, 1260, 1320],
        ];
        for times in sequences {
            let lo = times[0] - 100;
            let hi = times[times.len() - 1] + 100;
            for query in (lo..=hi).step_by(10) {
                assert_eq!(search(times, query), linear(times, query), "{times:?} @ {query}");
            }
        }
    }

    #[test]
    fn test_fallible_accessor_stops_at_first_error() {
        let times: Vec<i64> = (0..1000).map(|i| i * 60).collect();
        let mut reads = 0;
        let found = try_search::<(), _>(times.len(), 600 * 60, |index| {
            reads += 1;
            Ok(times[index])
        });
        assert_eq!(found, Ok(SearchResult::hit(600)));
        assert!(reads <= 12, "{reads} reads");

        let failed = try_search(times.len(), 600 * 60, |index| {
            if index == 0 { Ok(0) } else { Err("unreadable") }
        });
        assert_eq!(failed, Err("unreadable"));
    }

    #[test]
    fn test_two_element_base_case() {
        let times: &[i64] = &[60, 120];
        assert_eq!(find_exact(times, 60), Some(0));
        assert_eq!(find_exact(times, 120), Some(1));
        assert_eq!(find_exact(times, 90), None);
        assert_eq!(find_floor(times, 90), Some(0));
        assert_eq!(find_ceiling(times, 90), Some(1));
    }

    #[test]
    fn test_out_of_bounds() {
        let times: &[i64] = &[60, 120, 180];
        assert_eq!(find_floor(times, 0), None);
        assert_eq!(find_ceiling(times, 0), Some(0));
        assert_eq!(find_floor(times, 500), Some(2));
        assert_eq!(find_ceiling(times, 500), None);
    }

    #[test]
    fn test_covering_with_gaps() {
        // H1 bars at 00:00, 01:00 and 05:00
        let series = bars(&[0, 3600, 18_000]);
        assert_eq!(find_bar_covering(&series, Period::H1, 1800).unwrap(), Some(0));
        assert_eq!(find_bar_covering(&series, Period::H1, 3600).unwrap(), Some(1));
        // gap between bars
        assert_eq!(find_bar_covering(&series, Period::H1, 9000).unwrap(), None);
        // gap before first bar
        assert_eq!(find_bar_covering(&series, Period::H1, -1).unwrap(), None);
        // inside the last bar, then past it
        assert_eq!(find_bar_covering(&series, Period::H1, 21_599).unwrap(), Some(2));
        assert_eq!(find_bar_covering(&series, Period::H1, 21_600).unwrap(), None);
    }
}
