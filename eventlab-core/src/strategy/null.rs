use crate::data::DataHandler;
use crate::domain::MarketEvent;
use crate::error::EngineError;

use super::{Strategy, StrategyOutput};

/// Never trades. Useful for checking replay and termination.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStrategy;

impl Strategy for NullStrategy {
    fn name(&self) -> &str {
        "null"
    }

    fn on_market(
        &mut self,
        _event: &MarketEvent,
        _data: &dyn DataHandler,
    ) -> Result<Option<StrategyOutput>, EngineError> {
        Ok(None)
    }
}
