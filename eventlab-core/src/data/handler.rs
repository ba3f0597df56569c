//! Data handler trait and the in-memory bar store.
//!
//! The `DataHandler` trait abstracts over where bars come from so the engine,
//! strategies and execution handler can be tested against hand-built data.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{Bar, BarField};
use crate::error::EngineError;

/// Read-only access to historical bars keyed by `(symbol, date)`.
///
/// The engine never mutates a data handler; it only queries it.
pub trait DataHandler: Send + Sync {
    /// Most recent bar for `symbol` on or before `date`.
    fn get_latest_bar(&self, symbol: &str, date: NaiveDate) -> Result<Bar, EngineError>;

    /// Value of `field` on the bar dated exactly `date`.
    ///
    /// Fails with `PriceUnavailable` when there is no bar on that date or the
    /// field is missing (NaN).
    fn get_bar_value(
        &self,
        symbol: &str,
        date: NaiveDate,
        field: BarField,
    ) -> Result<f64, EngineError>;

    /// Every date with a bar for `symbol`, ascending, without duplicates.
    ///
    /// Unknown symbols yield an empty list.
    fn get_symbol_whole_bar_dates(&self, symbol: &str) -> Vec<NaiveDate>;
}

/// BTreeMap-backed bar store. Dates are kept sorted per symbol.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataHandler {
    bars: BTreeMap<String, BTreeMap<NaiveDate, Bar>>,
}

impl InMemoryDataHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bars(bars: impl IntoIterator<Item = Bar>) -> Self {
        let mut handler = Self::new();
        handler.insert_bars(bars);
        handler
    }

    /// Insert a bar, replacing any existing bar for the same `(symbol, date)`.
    pub fn insert_bar(&mut self, bar: Bar) {
        self.bars
            .entry(bar.symbol.clone())
            .or_default()
            .insert(bar.date, bar);
    }

    pub fn insert_bars(&mut self, bars: impl IntoIterator<Item = Bar>) {
        for bar in bars {
            self.insert_bar(bar);
        }
    }

    /// Drop every bar outside `[start, end]` (both inclusive).
    pub fn restrict_to(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        for series in self.bars.values_mut() {
            series.retain(|date, _| *date >= start && *date <= end);
        }
        self.bars.retain(|_, series| !series.is_empty());
        self
    }

    pub fn symbols(&self) -> Vec<String> {
        self.bars.keys().cloned().collect()
    }

    pub fn bar_count(&self, symbol: &str) -> usize {
        self.bars.get(symbol).map_or(0, BTreeMap::len)
    }

    /// All bars for a symbol in date order.
    pub fn bars(&self, symbol: &str) -> impl Iterator<Item = &Bar> {
        self.bars.get(symbol).into_iter().flat_map(|s| s.values())
    }
}

impl DataHandler for InMemoryDataHandler {
    fn get_latest_bar(&self, symbol: &str, date: NaiveDate) -> Result<Bar, EngineError> {
        self.bars
            .get(symbol)
            .and_then(|series| series.range(..=date).next_back())
            .map(|(_, bar)| bar.clone())
            .ok_or_else(|| EngineError::PriceUnavailable {
                symbol: symbol.to_string(),
                date,
                field: BarField::Close,
            })
    }

    fn get_bar_value(
        &self,
        symbol: &str,
        date: NaiveDate,
        field: BarField,
    ) -> Result<f64, EngineError> {
        self.bars
            .get(symbol)
            .and_then(|series| series.get(&date))
            .and_then(|bar| bar.value(field))
            .ok_or_else(|| EngineError::PriceUnavailable {
                symbol: symbol.to_string(),
                date,
                field,
            })
    }

    fn get_symbol_whole_bar_dates(&self, symbol: &str) -> Vec<NaiveDate> {
        self.bars
            .get(symbol)
            .map(|series| series.keys().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn bar(symbol: &str, day: u32, adj_close: f64) -> Bar {
        Bar {
            symbol: symbol.into(),
            date: d(day),
            open: adj_close,
            high: adj_close + 1.0,
            low: adj_close - 1.0,
            close: adj_close,
            adj_close,
            volume: 1_000,
        }
    }

    #[test]
    fn dates_are_sorted_and_unique() {
        let handler = InMemoryDataHandler::from_bars(vec![
            bar("SPY", 5, 101.0),
            bar("SPY", 2, 100.0),
            bar("SPY", 5, 102.0),
            bar("SPY", 3, 99.0),
        ]);
        assert_eq!(handler.get_symbol_whole_bar_dates("SPY"), vec![d(2), d(3), d(5)]);
        assert_eq!(handler.bar_count("SPY"), 3);
    }

    #[test]
    fn unknown_symbol_has_no_dates() {
        let handler = InMemoryDataHandler::new();
        assert!(handler.get_symbol_whole_bar_dates("QQQ").is_empty());
    }

    #[test]
    fn bar_value_requires_exact_date() {
        let handler = InMemoryDataHandler::from_bars(vec![bar("SPY", 2, 100.0)]);
        assert_eq!(
            handler.get_bar_value("SPY", d(2), BarField::AdjClose).unwrap(),
            100.0
        );
        let err = handler
            .get_bar_value("SPY", d(3), BarField::AdjClose)
            .unwrap_err();
        assert!(matches!(err, EngineError::PriceUnavailable { .. }));
    }

    #[test]
    fn nan_field_is_unavailable() {
        let mut b = bar("SPY", 2, 100.0);
        b.adj_close = f64::NAN;
        let handler = InMemoryDataHandler::from_bars(vec![b]);
        assert!(handler.get_bar_value("SPY", d(2), BarField::AdjClose).is_err());
        assert_eq!(handler.get_bar_value("SPY", d(2), BarField::Open).unwrap(), 100.0);
    }

    #[test]
    fn latest_bar_carries_forward() {
        let handler =
            InMemoryDataHandler::from_bars(vec![bar("SPY", 2, 100.0), bar("SPY", 4, 104.0)]);
        assert_eq!(handler.get_latest_bar("SPY", d(3)).unwrap().adj_close, 100.0);
        assert_eq!(handler.get_latest_bar("SPY", d(4)).unwrap().adj_close, 104.0);
        assert!(handler.get_latest_bar("SPY", d(1)).is_err());
    }

    #[test]
    fn restrict_to_keeps_inclusive_range() {
        let handler = InMemoryDataHandler::from_bars(vec![
            bar("SPY", 2, 100.0),
            bar("SPY", 3, 101.0),
            bar("SPY", 4, 102.0),
            bar("QQQ", 9, 300.0),
        ])
        .restrict_to(d(3), d(4));
        assert_eq!(handler.get_symbol_whole_bar_dates("SPY"), vec![d(3), d(4)]);
        assert_eq!(handler.symbols(), vec!["SPY".to_string()]);
    }
}
