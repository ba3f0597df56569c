//! Deterministic synthetic bars for development runs.
//!
//! Prices follow a bounded random walk seeded from a BLAKE3 hash of the
//! symbol. Same symbol and range, same bars.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::Bar;

/// Shape of the generated walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticWalk {
    pub start_price: f64,
    /// Largest absolute close-to-close move, as a fraction.
    pub max_daily_move: f64,
    /// Largest wick beyond the open/close body, as a fraction.
    pub max_wick: f64,
}

impl Default for SyntheticWalk {
    fn default() -> Self {
        Self {
            start_price: 100.0,
            max_daily_move: 0.03,
            max_wick: 0.01,
        }
    }
}

impl SyntheticWalk {
    pub fn generate(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
        let mut rng = StdRng::from_seed(*blake3::hash(symbol.as_bytes()).as_bytes());
        let mut prev_close = self.start_price;

        weekdays(start, end)
            .map(|date| {
                let open = prev_close;
                let step = rng.gen_range(-self.max_daily_move..=self.max_daily_move);
                let close = open * (1.0 + step);
                let high = open.max(close) * (1.0 + rng.gen_range(0.0..=self.max_wick));
                let low = open.min(close) * (1.0 - rng.gen_range(0.0..=self.max_wick));
                prev_close = close;
                Bar {
                    symbol: symbol.to_string(),
                    date,
                    open,
                    high,
                    low,
                    close,
                    adj_close: close,
                    volume: rng.gen_range(500_000..5_000_000u64),
                }
            })
            .collect()
    }
}

/// Monday..Friday dates in `[start, end]`.
fn weekdays(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start
        .iter_days()
        .take_while(move |d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
}

/// Default walk for `symbol` over `[start, end]`.
pub fn generate_synthetic_bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
    SyntheticWalk::default().generate(symbol, start, end)
}
