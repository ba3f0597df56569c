//! Moving average crossover on adjusted close.
//!
//! Goes long when the short SMA rises above the long SMA and exits when it
//! falls back below. Keeps a rolling price window per symbol, fed from the
//! data handler on each market event.

use std::collections::{HashMap, VecDeque};

use crate::data::DataHandler;
use crate::domain::{BarField, MarketEvent, SignalDirection, SignalEvent};
use crate::error::EngineError;

use super::{Strategy, StrategyConfig, StrategyOutput};

#[derive(Debug, Default, Clone)]
struct SymbolState {
    window: VecDeque<f64>,
    invested: bool,
}

#[derive(Debug, Clone)]
pub struct MovingAverageCross {
    config: StrategyConfig,
    short_window: usize,
    long_window: usize,
    state: HashMap<String, SymbolState>,
}

impl MovingAverageCross {
    pub fn new(
        config: StrategyConfig,
        short_window: usize,
        long_window: usize,
    ) -> Result<Self, EngineError> {
        if short_window == 0 {
            return Err(EngineError::Configuration(
                "moving_average_cross: short window must be >= 1".into(),
            ));
        }
        if long_window <= short_window {
            return Err(EngineError::Configuration(format!(
                "moving_average_cross: long window ({long_window}) must exceed short window ({short_window})"
            )));
        }
        Ok(Self {
            config,
            short_window,
            long_window,
            state: HashMap::new(),
        })
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

impl Strategy for MovingAverageCross {
    fn name(&self) -> &str {
        "moving_average_cross"
    }

    fn on_market(
        &mut self,
        event: &MarketEvent,
        data: &dyn DataHandler,
    ) -> Result<Option<StrategyOutput>, EngineError> {
        if !self.config.symbols.iter().any(|s| s == &event.symbol) {
            return Ok(None);
        }
        let price = data.get_bar_value(&event.symbol, event.timestamp, BarField::AdjClose)?;

        let state = self.state.entry(event.symbol.clone()).or_default();
        state.window.push_back(price);
        if state.window.len() > self.long_window {
            state.window.pop_front();
        }
        if state.window.len() < self.long_window || !self.config.in_window(event.timestamp) {
            return Ok(None);
        }

        let long_sma = mean(state.window.iter().copied());
        let short_sma = mean(state.window.iter().rev().take(self.short_window).copied());

        let direction = if short_sma > long_sma && !state.invested {
            state.invested = true;
            SignalDirection::Long
        } else if short_sma < long_sma && state.invested {
            state.invested = false;
            SignalDirection::Exit
        } else {
            return Ok(None);
        };

        tracing::debug!(
            symbol = %event.symbol,
            date = %event.timestamp,
            short_sma,
            long_sma,
            ?direction,
            "crossover"
        );
        Ok(Some(StrategyOutput::Signal(SignalEvent::new(
            event.symbol.clone(),
            event.timestamp,
            direction,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemoryDataHandler;
    use crate::domain::Bar;
    use chrono::NaiveDate;

    fn series(prices: &[f64]) -> (InMemoryDataHandler, Vec<MarketEvent>) {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut bars = Vec::new();
        let mut events = Vec::new();
        for (i, &p) in prices.iter().enumerate() {
            let date = base + chrono::Duration::days(i as i64);
            bars.push(Bar {
                symbol: "SPY".into(),
                date,
                open: p,
                high: p,
                low: p,
                close: p,
                adj_close: p,
                volume: 1,
            });
            events.push(MarketEvent {
                symbol: "SPY".into(),
                timestamp: date,
            });
        }
        (InMemoryDataHandler::from_bars(bars), events)
    }

    fn directions(strategy: &mut MovingAverageCross, prices: &[f64]) -> Vec<SignalDirection> {
        let (data, events) = series(prices);
        events
            .iter()
            .filter_map(|e| strategy.on_market(e, &data).unwrap())
            .map(|out| match out {
                StrategyOutput::Signal(s) => s.direction,
                StrategyOutput::Order(_) => panic!("unexpected direct order"),
            })
            .collect()
    }

    fn strategy() -> MovingAverageCross {
        MovingAverageCross::new(StrategyConfig::backtest(vec!["SPY".into()], 10_000.0), 2, 4)
            .unwrap()
    }

    #[test]
    fn rejects_bad_windows() {
        let cfg = StrategyConfig::backtest(vec!["SPY".into()], 10_000.0);
        assert!(MovingAverageCross::new(cfg.clone(), 0, 4).is_err());
        assert!(MovingAverageCross::new(cfg, 4, 4).is_err());
    }

    #[test]
    fn silent_during_warmup() {
        let mut s = strategy();
        assert!(directions(&mut s, &[1.0, 2.0, 3.0]).is_empty());
    }

    #[test]
    fn long_then_exit_on_reversal() {
        let mut s = strategy();
        let dirs = directions(&mut s, &[10.0, 10.0, 11.0, 12.0, 13.0, 9.0, 7.0, 6.0]);
        assert_eq!(dirs, vec![SignalDirection::Long, SignalDirection::Exit]);
    }

    #[test]
    fn never_exits_without_position() {
        let mut s = strategy();
        let dirs = directions(&mut s, &[10.0, 9.0, 8.0, 7.0, 6.0, 5.0]);
        assert!(dirs.is_empty());
    }

    #[test]
    fn missing_price_propagates() {
        let mut s = strategy();
        let data = InMemoryDataHandler::new();
        let event = MarketEvent {
            symbol: "SPY".into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        assert!(matches!(
            s.on_market(&event, &data),
            Err(EngineError::PriceUnavailable { .. })
        ));
    }
}
