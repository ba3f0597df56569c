//! Heartbeat dispatcher — owns the queue and routes every event.
//!
//! Each heartbeat drains the queue completely. Market events go to the
//! strategy, signals to the portfolio's order generator, orders to the
//! execution handler and fills back to the portfolio. Whatever a handler
//! returns is enqueued at the tail, so a causal chain started by a market
//! event finishes inside the same heartbeat.
//!
//! Market events are released one date at a time. After a drain, every
//! symbol whose next bar falls on the earliest pending date gets that bar
//! enqueued, so symbols on different calendars still replay in date order.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::data::DataHandler;
use crate::domain::{Event, EventId, MarketEvent};
use crate::error::EngineError;
use crate::execution::ExecutionHandler;
use crate::portfolio::{OrderSizer, Portfolio, SummaryStats};
use crate::strategy::Strategy;

use super::config::EngineConfig;
use super::journal::{Journal, JournalEntry, Outcome};
use super::queue::{EventQueue, QueuedEvent};
use super::report::{BacktestReport, RunSummary, StopReason};
use super::stop::StopHandle;

/// Per-symbol replay position. `next` is the first date not yet enqueued.
#[derive(Debug, Clone)]
struct SymbolCursor {
    symbol: String,
    dates: Vec<NaiveDate>,
    next: usize,
}

impl SymbolCursor {
    fn peek(&self) -> Option<NaiveDate> {
        self.dates.get(self.next).copied()
    }

    fn is_exhausted(&self) -> bool {
        self.next >= self.dates.len()
    }
}

/// Runs one backtest.
///
/// An engine is single-use: strategies keep state across bars (a buy-and-hold
/// strategy remembers it already bought), so a second `initialize` after a
/// completed run is refused. Build a fresh engine for every run.
pub struct BacktestEngine {
    config: EngineConfig,
    data: Box<dyn DataHandler>,
    strategy: Box<dyn Strategy>,
    execution: Box<dyn ExecutionHandler>,
    portfolio: Portfolio,
    queue: EventQueue,
    cursors: Vec<SymbolCursor>,
    journal: Journal,
    summary: RunSummary,
    stop: StopHandle,
    initialized: bool,
    has_run: bool,
}

impl BacktestEngine {
    pub fn new(
        config: EngineConfig,
        data: Box<dyn DataHandler>,
        strategy: Box<dyn Strategy>,
        execution: Box<dyn ExecutionHandler>,
    ) -> Self {
        let portfolio = Portfolio::new(config.initial_capital);
        Self {
            config,
            data,
            strategy,
            execution,
            portfolio,
            queue: EventQueue::new(),
            cursors: Vec::new(),
            journal: Journal::new(),
            summary: RunSummary::default(),
            stop: StopHandle::new(),
            initialized: false,
            has_run: false,
        }
    }

    /// Use `sizer` for signal → order conversion.
    pub fn with_sizer(mut self, sizer: OrderSizer) -> Self {
        self.portfolio = Portfolio::with_sizer(self.config.initial_capital, sizer);
        self
    }

    /// Share an externally created stop flag.
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Counters of the last run, or the run in progress.
    pub fn run_summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Read every symbol's date list once and enqueue the first market event
    /// of each symbol that starts on the earliest date. Symbols that start
    /// later are enqueued when the replay reaches their first bar.
    ///
    /// Fails before anything is enqueued if the symbol list is empty, has
    /// duplicates, or names a symbol with no bars, and when the engine has
    /// already run. Clears any earlier stop request.
    pub fn initialize(&mut self, symbols: &[String]) -> Result<(), EngineError> {
        if self.has_run {
            return Err(EngineError::Configuration(
                "engine has already run; build a new engine for another run".into(),
            ));
        }
        self.config.validate()?;
        if symbols.is_empty() {
            return Err(EngineError::Configuration(
                "at least one symbol is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        let mut cursors = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            if !seen.insert(symbol.as_str()) {
                return Err(EngineError::Configuration(format!(
                    "duplicate symbol: {symbol}"
                )));
            }
            let dates = self.data.get_symbol_whole_bar_dates(symbol);
            if dates.is_empty() {
                return Err(EngineError::Configuration(format!(
                    "no bars available for {symbol}"
                )));
            }
            cursors.push(SymbolCursor {
                symbol: symbol.clone(),
                dates,
                next: 0,
            });
        }

        self.queue.clear();
        self.journal.clear();
        self.portfolio = Portfolio::with_sizer(self.config.initial_capital, self.portfolio.sizer());
        self.summary = RunSummary {
            strategy: self.strategy.name().to_string(),
            venue: self.execution.venue().to_string(),
            ..RunSummary::default()
        };
        self.stop.reset();
        self.cursors = cursors;
        self.release_next_date();

        tracing::info!(
            symbols = self.cursors.len(),
            bars = self.cursors.iter().map(|c| c.dates.len()).sum::<usize>(),
            strategy = %self.summary.strategy,
            "engine initialized"
        );
        self.initialized = true;
        Ok(())
    }

    /// Run the heartbeat loop until the data is exhausted, a stop is
    /// requested, or the heartbeat limit is hit.
    pub fn run(&mut self) -> Result<RunSummary, EngineError> {
        if !self.initialized {
            return Err(EngineError::Configuration(
                "engine must be initialized before run".into(),
            ));
        }

        let reason = loop {
            if self.stop.is_stopped() {
                tracing::info!(heartbeats = self.summary.heartbeats, "stop requested");
                break StopReason::Stopped;
            }
            if self
                .config
                .max_heartbeats
                .is_some_and(|max| self.summary.heartbeats >= max)
            {
                tracing::warn!(heartbeats = self.summary.heartbeats, "heartbeat limit reached");
                break StopReason::HeartbeatLimit;
            }

            self.heartbeat();

            if self.queue.is_empty() && self.cursors.iter().all(SymbolCursor::is_exhausted) {
                break StopReason::Completed;
            }
            if !self.config.heartbeat.is_zero() {
                std::thread::sleep(self.config.heartbeat);
            }
        };

        self.summary.stop_reason = reason;
        self.initialized = false;
        self.has_run = true;
        tracing::info!(
            heartbeats = self.summary.heartbeats,
            market_events = self.summary.market_events,
            fills = self.summary.fills,
            dropped = self.summary.dropped,
            reason = ?reason,
            "run finished"
        );
        Ok(self.summary.clone())
    }

    /// Summary statistics over the portfolio's equity curve.
    pub fn output_summary_stats(&self) -> Result<SummaryStats, EngineError> {
        self.portfolio
            .output_summary_stats(self.config.periods_per_year)
    }

    /// Initialize, run and finalize.
    ///
    /// Fails with `EmptyCurve` when the run produced no fills; the counters
    /// are still available through [`run_summary`](Self::run_summary).
    pub fn simulate_trading(&mut self, symbols: &[String]) -> Result<BacktestReport, EngineError> {
        self.initialize(symbols)?;
        let run = self.run()?;
        let summary = self.output_summary_stats()?;
        Ok(BacktestReport {
            summary,
            run,
            equity_curve: self.portfolio.equity_curve().to_vec(),
            fills: self.portfolio.fills().to_vec(),
        })
    }

    /// Drain the queue, then release the next market date.
    fn heartbeat(&mut self) {
        self.summary.heartbeats += 1;

        while let Some(queued) = self.queue.pop() {
            self.process(queued);
        }
        self.release_next_date();

        tracing::debug!(
            heartbeat = self.summary.heartbeats,
            pending = self.queue.len(),
            "heartbeat drained"
        );
    }

    /// Enqueue the next bar of every symbol whose next date is the earliest
    /// one still pending.
    fn release_next_date(&mut self) {
        let Some(date) = self.cursors.iter().filter_map(SymbolCursor::peek).min() else {
            return;
        };
        for cursor in &mut self.cursors {
            if cursor.peek() == Some(date) {
                cursor.next += 1;
                let event = MarketEvent {
                    symbol: cursor.symbol.clone(),
                    timestamp: date,
                };
                self.queue.push(event.into(), None);
            }
        }
    }

    fn process(&mut self, queued: QueuedEvent) {
        let QueuedEvent { id, cause, event } = queued;
        let kind = event.kind();
        let symbol = event.symbol().to_string();
        let timestamp = event.timestamp();

        let outcome = match self.dispatch(&event) {
            Ok(produced) => {
                if let Some(next) = produced {
                    self.enqueue(next, id);
                }
                Outcome::Handled
            }
            Err(e) => {
                self.summary.dropped += 1;
                if e.is_recoverable() {
                    tracing::warn!(%kind, %symbol, %timestamp, error = %e, "event dropped");
                } else {
                    tracing::error!(%kind, %symbol, %timestamp, error = %e, "event dropped");
                }
                Outcome::Dropped
            }
        };

        tracing::trace!(%id, %kind, %symbol, %timestamp, "event dispatched");
        self.journal.record(JournalEntry {
            id,
            cause,
            kind,
            symbol,
            timestamp,
            outcome,
        });
    }

    fn enqueue(&mut self, event: Event, cause: EventId) -> EventId {
        self.queue.push(event, Some(cause))
    }

    /// Route one event to its consumer and return whatever it produced.
    fn dispatch(&mut self, event: &Event) -> Result<Option<Event>, EngineError> {
        let data = self.data.as_ref();
        match event {
            Event::Market(market) => {
                self.summary.market_events += 1;
                let output = self.strategy.on_market(market, data)?;
                Ok(output.map(Event::from))
            }
            Event::Signal(signal) => {
                self.summary.signals += 1;
                let execution = self.execution.as_ref();
                let order = self.portfolio.place_order(signal, data, &|order| {
                    execution.estimate_commission(order)
                });
                Ok(order.map(Event::from))
            }
            Event::Order(order) => {
                self.summary.orders += 1;
                match self.execution.execute_order(data, event) {
                    Ok(Some(fill)) => Ok(Some(fill.into())),
                    Ok(None) => {
                        self.portfolio.release_order(order);
                        Ok(None)
                    }
                    Err(e) => {
                        self.portfolio.release_order(order);
                        Err(e)
                    }
                }
            }
            Event::Fill(fill) => {
                self.summary.fills += 1;
                self.portfolio.on_fill(fill, data);
                Ok(None)
            }
        }
    }
}

impl std::fmt::Debug for BacktestEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BacktestEngine")
            .field("config", &self.config)
            .field("strategy", &self.strategy.name())
            .field("venue", &self.execution.venue())
            .field("pending", &self.queue.len())
            .field("symbols", &self.cursors.len())
            .finish()
    }
}
