//! Portfolio — cash, signed holdings and the equity curve.
//!
//! The portfolio plays two roles in the event loop: it turns signals into
//! orders and it consumes fills. Only fills move cash or holdings. Buy
//! orders the portfolio emits hold a reservation against cash until their
//! fill lands or the order is dropped, so several buys raised in the same
//! heartbeat cannot spend the same cash twice. The accounting identity
//! `equity == cash + sum(holding * mark)` holds after every fill.

pub mod sizing;
pub mod stats;

pub use sizing::{OrderSizer, DEFAULT_ORDER_QUANTITY};
pub use stats::SummaryStats;

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::DataHandler;
use crate::domain::{BarField, FillEvent, OrderEvent, OrderSide, SignalDirection, SignalEvent};
use crate::error::EngineError;
use crate::performance::{drawdown_series, returns_from_equity, sharpe_ratio, total_return};

/// Cash held back for a buy order that has not filled yet.
#[derive(Debug, Clone, PartialEq)]
struct PendingBuy {
    symbol: String,
    timestamp: NaiveDate,
    quantity: u64,
    amount: f64,
}

impl PendingBuy {
    fn matches(&self, symbol: &str, timestamp: NaiveDate, quantity: u64) -> bool {
        self.symbol == symbol && self.timestamp == timestamp && self.quantity == quantity
    }
}

/// One equity sample, appended per fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone)]
pub struct Portfolio {
    initial_capital: f64,
    cash: f64,
    /// Signed share counts. Flat symbols are removed.
    holdings: BTreeMap<String, i64>,
    /// Last known price per symbol, used for mark-to-market.
    marks: HashMap<String, f64>,
    equity_curve: Vec<EquityPoint>,
    fills: Vec<FillEvent>,
    total_commission: f64,
    pending_buys: Vec<PendingBuy>,
    sizer: OrderSizer,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Self::with_sizer(initial_capital, OrderSizer::default())
    }

    pub fn with_sizer(initial_capital: f64, sizer: OrderSizer) -> Self {
        Self {
            initial_capital,
            cash: initial_capital,
            holdings: BTreeMap::new(),
            marks: HashMap::new(),
            equity_curve: Vec::new(),
            fills: Vec::new(),
            total_commission: 0.0,
            pending_buys: Vec::new(),
            sizer,
        }
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Cash held back for emitted buy orders that have not filled.
    pub fn reserved_cash(&self) -> f64 {
        self.pending_buys.iter().map(|p| p.amount).sum()
    }

    /// Cash not yet promised to a pending buy.
    pub fn available_cash(&self) -> f64 {
        self.cash - self.reserved_cash()
    }

    /// Signed position in `symbol`; zero when flat.
    pub fn holding(&self, symbol: &str) -> i64 {
        self.holdings.get(symbol).copied().unwrap_or(0)
    }

    pub fn holdings(&self) -> &BTreeMap<String, i64> {
        &self.holdings
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    pub fn fills(&self) -> &[FillEvent] {
        &self.fills
    }

    pub fn total_commission(&self) -> f64 {
        self.total_commission
    }

    pub fn sizer(&self) -> OrderSizer {
        self.sizer
    }

    /// Cash plus holdings valued at their last known price.
    pub fn mark_to_market_equity(&self) -> f64 {
        let held: f64 = self
            .holdings
            .iter()
            .map(|(symbol, &qty)| qty as f64 * self.marks.get(symbol).copied().unwrap_or(0.0))
            .sum();
        self.cash + held
    }

    /// Convert a signal into an order, or `None` when there is nothing to do.
    ///
    /// LONG buys, SHORT sells, EXIT flattens the current holding. Buys that
    /// would exceed available cash at the latest known price are skipped.
    /// Nothing is reserved; the engine goes through [`place_order`](Self::place_order).
    pub fn on_signal(&self, signal: &SignalEvent, data: &dyn DataHandler) -> Option<OrderEvent> {
        self.size_order(signal, data, &|_| 0.0).map(|(order, _)| order)
    }

    /// Like [`on_signal`](Self::on_signal), but the affordability check also
    /// counts `estimate_commission` for the order, and an emitted LONG buy
    /// reserves its cost until [`on_fill`](Self::on_fill) or
    /// [`release_order`](Self::release_order) settles it.
    pub fn place_order(
        &mut self,
        signal: &SignalEvent,
        data: &dyn DataHandler,
        estimate_commission: &dyn Fn(&OrderEvent) -> f64,
    ) -> Option<OrderEvent> {
        let (order, reserve) = self.size_order(signal, data, estimate_commission)?;
        if let Some(amount) = reserve {
            self.pending_buys.push(PendingBuy {
                symbol: order.symbol.clone(),
                timestamp: order.timestamp,
                quantity: order.quantity,
                amount,
            });
        }
        Some(order)
    }

    /// Drop the reservation held for `order`, if any. Called when an order
    /// produced no fill.
    pub fn release_order(&mut self, order: &OrderEvent) {
        if order.direction == OrderSide::Buy {
            self.release(&order.symbol, order.timestamp, order.quantity);
        }
    }

    fn release(&mut self, symbol: &str, timestamp: NaiveDate, quantity: u64) {
        if let Some(pos) = self
            .pending_buys
            .iter()
            .position(|p| p.matches(symbol, timestamp, quantity))
        {
            self.pending_buys.swap_remove(pos);
        }
    }

    /// The order for `signal` plus the amount to reserve for it. The amount
    /// is only present for LONG buys with a known price.
    fn size_order(
        &self,
        signal: &SignalEvent,
        data: &dyn DataHandler,
        estimate_commission: &dyn Fn(&OrderEvent) -> f64,
    ) -> Option<(OrderEvent, Option<f64>)> {
        let (side, quantity) = match signal.direction {
            SignalDirection::Long => (OrderSide::Buy, self.sizer.quantity_for(signal)),
            SignalDirection::Short => (OrderSide::Sell, self.sizer.quantity_for(signal)),
            SignalDirection::Exit => {
                let held = self.holding(&signal.symbol);
                let side = if held > 0 {
                    OrderSide::Sell
                } else {
                    OrderSide::Buy
                };
                (side, held.unsigned_abs())
            }
        };

        if quantity == 0 {
            tracing::debug!(
                symbol = %signal.symbol,
                direction = ?signal.direction,
                "signal sized to zero"
            );
            return None;
        }

        let order = OrderEvent::new(signal.symbol.clone(), signal.timestamp, quantity, side);
        if signal.direction != SignalDirection::Long {
            return Some((order, None));
        }

        let price = data
            .get_latest_bar(&signal.symbol, signal.timestamp)
            .ok()
            .and_then(|bar| bar.value(BarField::AdjClose));
        let Some(price) = price else {
            return Some((order, None));
        };

        let cost = quantity as f64 * price + estimate_commission(&order);
        let available = self.available_cash();
        if cost > available {
            tracing::warn!(
                symbol = %signal.symbol,
                quantity,
                cost,
                available,
                "insufficient cash, skipping order"
            );
            return None;
        }
        Some((order, Some(cost)))
    }

    /// Apply a fill: update holdings and cash, refresh marks and append one
    /// equity point.
    ///
    /// The filled symbol is marked at the fill price. Other held symbols are
    /// marked at their latest bar on or before the fill date; if none is
    /// available their previous mark is kept.
    pub fn on_fill(&mut self, fill: &FillEvent, data: &dyn DataHandler) {
        if fill.direction == OrderSide::Buy {
            self.release(&fill.symbol, fill.timestamp, fill.quantity);
        }

        let held = self.holdings.entry(fill.symbol.clone()).or_insert(0);
        *held += fill.signed_quantity();
        if *held == 0 {
            self.holdings.remove(&fill.symbol);
        }

        self.cash += fill.cash_delta();
        self.total_commission += fill.commission;
        self.marks.insert(fill.symbol.clone(), fill.price());

        for symbol in self.holdings.keys() {
            if *symbol == fill.symbol {
                continue;
            }
            if let Some(price) = data
                .get_latest_bar(symbol, fill.timestamp)
                .ok()
                .and_then(|bar| bar.value(BarField::AdjClose))
            {
                self.marks.insert(symbol.clone(), price);
            }
        }

        let equity = self.mark_to_market_equity();
        self.equity_curve.push(EquityPoint {
            timestamp: fill.timestamp,
            equity,
        });
        self.fills.push(fill.clone());

        tracing::debug!(
            symbol = %fill.symbol,
            side = %fill.direction,
            quantity = fill.quantity,
            cash = self.cash,
            equity,
            "fill applied"
        );
    }

    /// Summary statistics over the equity curve.
    ///
    /// Returns are taken over the curve prefixed with the initial capital, so
    /// the first fill contributes a return too. Fails with `EmptyCurve` when
    /// no fill has been applied.
    pub fn output_summary_stats(&self, periods_per_year: f64) -> Result<SummaryStats, EngineError> {
        let last = self.equity_curve.last().ok_or(EngineError::EmptyCurve)?;

        let mut series = Vec::with_capacity(self.equity_curve.len() + 1);
        series.push(self.initial_capital);
        series.extend(self.equity_curve.iter().map(|p| p.equity));

        let returns = returns_from_equity(&series);
        let drawdown = drawdown_series(&series);

        Ok(SummaryStats {
            total_return: total_return(self.initial_capital, last.equity),
            sharpe_ratio: sharpe_ratio(&returns, periods_per_year),
            max_drawdown: drawdown.max_drawdown,
            max_drawdown_duration: drawdown.max_duration,
            initial_capital: self.initial_capital,
            final_equity: last.equity,
            fill_count: self.fills.len(),
            total_commission: self.total_commission,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemoryDataHandler;
    use crate::domain::Bar;
    use crate::performance::PERIODS_DAILY;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn bar(symbol: &str, day: u32, adj_close: f64) -> Bar {
        Bar {
            symbol: symbol.into(),
            date: d(day),
            open: adj_close,
            high: adj_close,
            low: adj_close,
            close: adj_close,
            adj_close,
            volume: 1_000,
        }
    }

    fn fill(
        symbol: &str,
        day: u32,
        side: OrderSide,
        qty: u64,
        price: f64,
        commission: f64,
    ) -> FillEvent {
        FillEvent {
            symbol: symbol.into(),
            timestamp: d(day),
            quantity: qty,
            direction: side,
            fill_cost: qty as f64 * price,
            commission,
            venue: "SIM".into(),
        }
    }

    fn signal(direction: SignalDirection) -> SignalEvent {
        SignalEvent::new("SPY", d(2), direction)
    }

    #[test]
    fn buy_fill_updates_cash_and_holding() {
        let data = InMemoryDataHandler::from_bars(vec![bar("SPY", 2, 10.0)]);
        let mut portfolio = Portfolio::new(100_000.0);
        portfolio.on_fill(&fill("SPY", 2, OrderSide::Buy, 100, 10.0, 0.0), &data);

        assert_eq!(portfolio.cash(), 99_000.0);
        assert_eq!(portfolio.holding("SPY"), 100);
        assert_eq!(portfolio.equity_curve().len(), 1);
        assert_eq!(portfolio.equity_curve()[0].equity, 100_000.0);
    }

    #[test]
    fn commission_reduces_equity() {
        let data = InMemoryDataHandler::new();
        let mut portfolio = Portfolio::new(10_000.0);
        portfolio.on_fill(&fill("SPY", 2, OrderSide::Buy, 10, 100.0, 5.0), &data);
        assert_eq!(portfolio.cash(), 8_995.0);
        assert_eq!(portfolio.mark_to_market_equity(), 9_995.0);
        assert_eq!(portfolio.total_commission(), 5.0);
    }

    #[test]
    fn round_trip_flattens_holding() {
        let data = InMemoryDataHandler::new();
        let mut portfolio = Portfolio::new(10_000.0);
        portfolio.on_fill(&fill("SPY", 2, OrderSide::Buy, 10, 100.0, 0.0), &data);
        portfolio.on_fill(&fill("SPY", 3, OrderSide::Sell, 10, 110.0, 0.0), &data);
        assert_eq!(portfolio.holding("SPY"), 0);
        assert!(portfolio.holdings().is_empty());
        assert_eq!(portfolio.cash(), 10_100.0);
        assert_eq!(portfolio.equity_curve()[1].equity, 10_100.0);
    }

    #[test]
    fn other_holdings_marked_from_data() {
        let data = InMemoryDataHandler::from_bars(vec![
            bar("SPY", 2, 100.0),
            bar("SPY", 3, 120.0),
            bar("QQQ", 3, 50.0),
        ]);
        let mut portfolio = Portfolio::new(100_000.0);
        portfolio.on_fill(&fill("SPY", 2, OrderSide::Buy, 10, 100.0, 0.0), &data);
        portfolio.on_fill(&fill("QQQ", 3, OrderSide::Buy, 10, 50.0, 0.0), &data);
        // cash 100_000 - 1_000 - 500; SPY 10 @ 120; QQQ 10 @ 50
        assert_eq!(portfolio.equity_curve()[1].equity, 98_500.0 + 1_200.0 + 500.0);
    }

    #[test]
    fn long_signal_buys_fixed_quantity() {
        let data = InMemoryDataHandler::from_bars(vec![bar("SPY", 2, 10.0)]);
        let portfolio = Portfolio::new(100_000.0);
        let order = portfolio.on_signal(&signal(SignalDirection::Long), &data).unwrap();
        assert_eq!(order.direction, OrderSide::Buy);
        assert_eq!(order.quantity, DEFAULT_ORDER_QUANTITY);
        assert_eq!(order.timestamp, d(2));
    }

    #[test]
    fn short_signal_sells() {
        let data = InMemoryDataHandler::new();
        let portfolio = Portfolio::with_sizer(1_000.0, OrderSizer::fixed(5));
        let order = portfolio.on_signal(&signal(SignalDirection::Short), &data).unwrap();
        assert_eq!(order.direction, OrderSide::Sell);
        assert_eq!(order.quantity, 5);
    }

    #[test]
    fn exit_flattens_long_and_short() {
        let data = InMemoryDataHandler::new();
        let mut portfolio = Portfolio::new(100_000.0);
        assert!(portfolio.on_signal(&signal(SignalDirection::Exit), &data).is_none());

        portfolio.on_fill(&fill("SPY", 2, OrderSide::Buy, 30, 10.0, 0.0), &data);
        let order = portfolio.on_signal(&signal(SignalDirection::Exit), &data).unwrap();
        assert_eq!((order.direction, order.quantity), (OrderSide::Sell, 30));

        portfolio.on_fill(&fill("SPY", 2, OrderSide::Sell, 50, 10.0, 0.0), &data);
        let order = portfolio.on_signal(&signal(SignalDirection::Exit), &data).unwrap();
        assert_eq!((order.direction, order.quantity), (OrderSide::Buy, 20));
    }

    #[test]
    fn unaffordable_buy_is_skipped() {
        let data = InMemoryDataHandler::from_bars(vec![bar("SPY", 2, 500.0)]);
        let portfolio = Portfolio::new(1_000.0);
        assert!(portfolio.on_signal(&signal(SignalDirection::Long), &data).is_none());
    }

    #[test]
    fn pending_buy_holds_back_cash() {
        let data = InMemoryDataHandler::from_bars(vec![bar("SPY", 2, 10.0), bar("QQQ", 2, 10.0)]);
        let mut portfolio = Portfolio::with_sizer(1_000.0, OrderSizer::fixed(80));
        let no_commission = |_: &OrderEvent| 0.0;

        let first = portfolio.place_order(&signal(SignalDirection::Long), &data, &no_commission);
        assert!(first.is_some());
        assert_eq!(portfolio.reserved_cash(), 800.0);
        assert_eq!(portfolio.available_cash(), 200.0);
        assert_eq!(portfolio.cash(), 1_000.0);

        let qqq = SignalEvent::new("QQQ", d(2), SignalDirection::Long);
        assert!(portfolio.place_order(&qqq, &data, &no_commission).is_none());
    }

    #[test]
    fn commission_counts_toward_affordability() {
        let data = InMemoryDataHandler::from_bars(vec![bar("SPY", 2, 10.0)]);
        let mut portfolio = Portfolio::with_sizer(1_000.0, OrderSizer::fixed(100));

        let with_fee = |_: &OrderEvent| 5.0;
        assert!(portfolio
            .place_order(&signal(SignalDirection::Long), &data, &with_fee)
            .is_none());
        assert_eq!(portfolio.reserved_cash(), 0.0);

        let free = |_: &OrderEvent| 0.0;
        assert!(portfolio
            .place_order(&signal(SignalDirection::Long), &data, &free)
            .is_some());
    }

    #[test]
    fn fill_settles_reservation() {
        let data = InMemoryDataHandler::from_bars(vec![bar("SPY", 2, 10.0)]);
        let mut portfolio = Portfolio::with_sizer(1_000.0, OrderSizer::fixed(10));
        let order = portfolio
            .place_order(&signal(SignalDirection::Long), &data, &|_| 1.0)
            .unwrap();
        assert_eq!(portfolio.reserved_cash(), 101.0);

        portfolio.on_fill(&fill("SPY", 2, OrderSide::Buy, order.quantity, 10.0, 1.0), &data);
        assert_eq!(portfolio.reserved_cash(), 0.0);
        assert_eq!(portfolio.available_cash(), 899.0);
    }

    #[test]
    fn dropped_order_releases_reservation() {
        let data = InMemoryDataHandler::from_bars(vec![bar("SPY", 2, 10.0)]);
        let mut portfolio = Portfolio::with_sizer(1_000.0, OrderSizer::fixed(60));
        let order = portfolio
            .place_order(&signal(SignalDirection::Long), &data, &|_| 0.0)
            .unwrap();
        assert!(portfolio.on_signal(&signal(SignalDirection::Long), &data).is_none());

        portfolio.release_order(&order);
        assert_eq!(portfolio.available_cash(), 1_000.0);
        assert!(portfolio.on_signal(&signal(SignalDirection::Long), &data).is_some());
    }

    #[test]
    fn sells_reserve_nothing() {
        let data = InMemoryDataHandler::from_bars(vec![bar("SPY", 2, 10.0)]);
        let mut portfolio = Portfolio::with_sizer(1_000.0, OrderSizer::fixed(60));
        let order = portfolio
            .place_order(&signal(SignalDirection::Short), &data, &|_| 0.0)
            .unwrap();
        assert_eq!(order.direction, OrderSide::Sell);
        assert_eq!(portfolio.reserved_cash(), 0.0);
    }

    #[test]
    fn empty_curve_has_no_stats() {
        let portfolio = Portfolio::new(1_000.0);
        assert!(matches!(
            portfolio.output_summary_stats(PERIODS_DAILY),
            Err(EngineError::EmptyCurve)
        ));
    }

    #[test]
    fn summary_stats_over_curve() {
        let data = InMemoryDataHandler::new();
        let mut portfolio = Portfolio::new(1_000.0);
        portfolio.on_fill(&fill("SPY", 2, OrderSide::Buy, 10, 10.0, 0.0), &data);
        portfolio.on_fill(&fill("SPY", 3, OrderSide::Sell, 10, 8.0, 0.0), &data);

        let stats = portfolio.output_summary_stats(PERIODS_DAILY).unwrap();
        assert_eq!(stats.final_equity, 980.0);
        assert!((stats.total_return + 0.02).abs() < 1e-12);
        assert_eq!(stats.max_drawdown, 20.0);
        assert_eq!(stats.fill_count, 2);
        // returns [0.0, -0.02]
        assert!(stats.sharpe_ratio.unwrap() < 0.0);
    }
}
