//! Streaming M1-to-period aggregation.

use fxhist_calendar::period_open;
use fxhist_types::{Bar, CalendarError, Period};

/// Streaming bar aggregator.
///
/// Folds ascending M1 bars into bars of the configured period. An
/// aggregator may be resumed from the newest persisted bar so that the
/// first incoming bars extend it instead of starting a new bucket.
#[derive(Debug)]
pub struct BarAggregator {
    period: Period,
    current: Option<BarBuilder>,
}

impl BarAggregator {
    /// Creates a new aggregator for the given period.
    #[must_use]
    pub const fn new(period: Period) -> Self {
        Self {
            period,
            current: None,
        }
    }

    /// Creates an aggregator that continues the bucket of `last`.
    ///
    /// `last` is only emitted again if a processed bar changed it.
    #[must_use]
    pub const fn resume(period: Period, last: Bar) -> Self {
        Self {
            period,
            current: Some(BarBuilder {
                bar: last,
                changed: false,
            }),
        }
    }

    /// Returns the period being aggregated to.
    #[must_use]
    pub const fn period(&self) -> Period {
        self.period
    }

    /// Processes a bar, potentially emitting a completed one.
    ///
    /// Returns `Some(bar)` when a bucket is completed by this bar,
    /// `None` otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket of the bar cannot be computed.
    pub fn process(&mut self, bar: &Bar) -> Result<Option<Bar>, CalendarError> {
        let bucket = period_open(bar.open_time, self.period)?;

        let emitted = match self.current.take() {
            Some(mut builder) if builder.bar.open_time == bucket => {
                builder.update(bar);
                self.current = Some(builder);
                None
            }
            Some(builder) => {
                self.current = Some(BarBuilder::new(bucket, bar));
                builder.finish()
            }
            None => {
                self.current = Some(BarBuilder::new(bucket, bar));
                None
            }
        };
        Ok(emitted)
    }

    /// Finishes aggregation, returning any remaining partial bar.
    #[must_use]
    pub fn finish(self) -> Option<Bar> {
        self.current.and_then(BarBuilder::finish)
    }
}

#[derive(Debug)]
struct BarBuilder {
    bar: Bar,
    changed: bool,
}

impl BarBuilder {
    fn new(bucket: i64, first: &Bar) -> Self {
        let mut bar = *first;
        bar.open_time = bucket;
        Self { bar, changed: true }
    }

    fn update(&mut self, later: &Bar) {
        self.bar.merge(later);
        self.changed = true;
    }

    fn finish(self) -> Option<Bar> {
        self.changed.then_some(self.bar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn m1(time: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar::new(time, open, high, low, close, 10)
    }

    #[test]
    fn test_single_bucket() {
        let mut aggregator = BarAggregator::new(Period::M5);
        assert!(aggregator.process(&m1(0, 1.10, 1.12, 1.09, 1.11)).unwrap().is_none());
        assert!(aggregator.process(&m1(60, 1.11, 1.15, 1.10, 1.14)).unwrap().is_none());
        assert!(aggregator.process(&m1(120, 1.14, 1.14, 1.05, 1.06)).unwrap().is_none());

        let bar = aggregator.finish().unwrap();
        assert_eq!(bar.open_time, 0);
        assert_relative_eq!(bar.open, 1.10);
        assert_relative_eq!(bar.high, 1.15);
        assert_relative_eq!(bar.low, 1.05);
        assert_relative_eq!(bar.close, 1.06);
        assert_eq!(bar.ticks, 30);
    }

    #[test]
    fn test_bucket_change_emits() {
        let mut aggregator = BarAggregator::new(Period::M5);
        aggregator.process(&m1(240, 1.0, 1.0, 1.0, 1.0)).unwrap();
        let done = aggregator.process(&m1(300, 2.0, 2.0, 2.0, 2.0)).unwrap().unwrap();
        assert_eq!(done.open_time, 0);

        let partial = aggregator.finish().unwrap();
        assert_eq!(partial.open_time, 300);
        assert_eq!(partial.ticks, 10);
    }

    #[test]
    fn test_resume_extends_last_bar() {
        let last = Bar::new(3600, 1.20, 1.25, 1.18, 1.22, 40);
        let mut aggregator = BarAggregator::resume(Period::H1, last);
        aggregator.process(&m1(3600 + 1800, 1.22, 1.30, 1.21, 1.29)).unwrap();

        let bar = aggregator.finish().unwrap();
        assert_eq!(bar.open_time, 3600);
        assert_relative_eq!(bar.open, 1.20);
        assert_relative_eq!(bar.high, 1.30);
        assert_relative_eq!(bar.close, 1.29);
        assert_eq!(bar.ticks, 50);
    }

    #[test]
    fn test_untouched_resume_emits_nothing() {
        let last = Bar::new(0, 1.0, 1.0, 1.0, 1.0, 5);
        let mut aggregator = BarAggregator::resume(Period::M1, last);
        assert!(aggregator.process(&m1(60, 1.0, 1.0, 1.0, 1.0)).unwrap().is_none());
        assert_eq!(aggregator.finish().unwrap().open_time, 60);

        assert!(BarAggregator::resume(Period::M1, last).finish().is_none());
    }
}
