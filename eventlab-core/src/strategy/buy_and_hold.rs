//! Buy-and-hold: go long once per symbol on its first tradable bar.

use std::collections::HashSet;

use crate::data::DataHandler;
use crate::domain::{MarketEvent, SignalDirection, SignalEvent};
use crate::error::EngineError;

use super::{Strategy, StrategyConfig, StrategyOutput};

#[derive(Debug, Clone)]
pub struct BuyAndHold {
    config: StrategyConfig,
    bought: HashSet<String>,
}

impl BuyAndHold {
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            config,
            bought: HashSet::new(),
        }
    }
}

impl Strategy for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn on_market(
        &mut self,
        event: &MarketEvent,
        _data: &dyn DataHandler,
    ) -> Result<Option<StrategyOutput>, EngineError> {
        if !self.config.symbols.iter().any(|s| s == &event.symbol)
            || !self.config.in_window(event.timestamp)
            || self.bought.contains(&event.symbol)
        {
            return Ok(None);
        }
        self.bought.insert(event.symbol.clone());
        Ok(Some(StrategyOutput::Signal(SignalEvent::new(
            event.symbol.clone(),
            event.timestamp,
            SignalDirection::Long,
        ))))
    }
}
