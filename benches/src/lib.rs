//! Benchmark fixtures for fxhist.

use fxhist_lib::Bar;

/// Monday 2024-01-01 00:00.
pub const START: i64 = 1_704_067_200;

/// `days` full days of synthetic M1 bars starting at [`START`].
pub fn m1_days(days: i64) -> Vec<Bar> {
    (0..days * 1440)
        .map(|i| {
            let price = 1.1 + (i % 500) as f64 * 0.00001;
            Bar::new(START + i * 60, price, price + 0.0003, price - 0.0002, price + 0.0001, 12)
        })
        .collect()
}
