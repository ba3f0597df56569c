//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. High-water mark monotonicity and drawdown consistency
//! 2. Metric purity and Sharpe scale invariance
//! 3. Cash and holding accounting across arbitrary fill sequences
//! 4. Market-event counts per symbol over a full run

use chrono::NaiveDate;
use eventlab_core::data::InMemoryDataHandler;
use eventlab_core::domain::{Bar, EventKind, FillEvent, OrderSide};
use eventlab_core::engine::{BacktestEngine, EngineConfig};
use eventlab_core::execution::SimulatedExecutionHandler;
use eventlab_core::performance::{drawdown_series, sharpe_ratio, PERIODS_DAILY};
use eventlab_core::portfolio::Portfolio;
use eventlab_core::strategy::NullStrategy;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_equity_curve() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1_000.0..200_000.0_f64, 0..200)
}

fn arb_returns() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.1..0.1_f64, 2..100)
}

fn arb_buy() -> impl Strategy<Value = (u64, f64, f64)> {
    (1u64..100, 1.0..100.0_f64, 0.0..5.0_f64)
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn bars(symbol: &str, n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| Bar {
            symbol: symbol.into(),
            date: base_date() + chrono::Duration::days(i as i64),
            open: 10.0,
            high: 10.0,
            low: 10.0,
            close: 10.0,
            adj_close: 10.0,
            volume: 1_000,
        })
        .collect()
}

// ── 1. Drawdown ──────────────────────────────────────────────────────

proptest! {
    /// hwm never decreases and always bounds equity from above.
    #[test]
    fn hwm_is_monotonic(equity in arb_equity_curve()) {
        let dd = drawdown_series(&equity);
        prop_assert_eq!(dd.high_water_mark.len(), equity.len());
        for t in 0..equity.len() {
            prop_assert!(dd.high_water_mark[t] >= equity[t]);
            if t > 0 {
                prop_assert!(dd.high_water_mark[t] >= dd.high_water_mark[t - 1]);
            }
        }
    }

    /// Duration resets exactly when the drawdown is zero.
    #[test]
    fn duration_tracks_drawdown(equity in arb_equity_curve()) {
        let dd = drawdown_series(&equity);
        for t in 0..equity.len() {
            prop_assert!(dd.drawdown[t] >= 0.0);
            prop_assert_eq!(dd.duration[t] == 0, dd.drawdown[t] == 0.0);
        }
        let max = dd.drawdown.iter().cloned().fold(0.0, f64::max);
        prop_assert_eq!(dd.max_drawdown, max);
        prop_assert_eq!(dd.max_duration, dd.duration.iter().copied().max().unwrap_or(0));
    }
}

// ── 2. Metrics ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn metrics_are_pure(equity in arb_equity_curve(), returns in arb_returns()) {
        prop_assert_eq!(drawdown_series(&equity), drawdown_series(&equity));
        prop_assert_eq!(
            sharpe_ratio(&returns, PERIODS_DAILY),
            sharpe_ratio(&returns, PERIODS_DAILY)
        );
    }

    /// Scaling every return by a positive constant leaves Sharpe unchanged.
    #[test]
    fn sharpe_is_scale_invariant(returns in arb_returns(), k in 0.5..2.0_f64) {
        let spread = returns.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
            - returns.iter().cloned().fold(f64::INFINITY, f64::min);
        prop_assume!(spread > 1e-6);

        let scaled: Vec<f64> = returns.iter().map(|r| r * k).collect();
        let a = sharpe_ratio(&returns, PERIODS_DAILY).unwrap();
        let b = sharpe_ratio(&scaled, PERIODS_DAILY).unwrap();
        prop_assert!((a - b).abs() <= 1e-9 * a.abs().max(1.0));
    }
}

// ── 3. Accounting ────────────────────────────────────────────────────

proptest! {
    /// Cash, holdings and the equity identity after any sequence of buys.
    #[test]
    fn buy_sequence_accounting(buys in prop::collection::vec(arb_buy(), 1..30)) {
        let data = InMemoryDataHandler::new();
        let mut portfolio = Portfolio::new(1_000_000.0);
        let mut expected_cash = 1_000_000.0;
        let mut expected_holding = 0i64;

        for (i, &(qty, price, commission)) in buys.iter().enumerate() {
            let fill = FillEvent {
                symbol: "SPY".into(),
                timestamp: base_date() + chrono::Duration::days(i as i64),
                quantity: qty,
                direction: OrderSide::Buy,
                fill_cost: qty as f64 * price,
                commission,
                venue: "SIM".into(),
            };
            portfolio.on_fill(&fill, &data);
            expected_cash -= fill.fill_cost + commission;
            expected_holding += qty as i64;

            prop_assert!((portfolio.cash() - expected_cash).abs() < 1e-6);
            prop_assert_eq!(portfolio.holding("SPY"), expected_holding);

            let equity = portfolio.equity_curve().last().unwrap().equity;
            let identity = portfolio.cash() + expected_holding as f64 * fill.price();
            prop_assert!((equity - identity).abs() < 1e-6);
        }
        prop_assert_eq!(portfolio.equity_curve().len(), buys.len());
    }
}

// ── 4. Market-event counts ───────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// A symbol with N dates produces exactly N market events.
    #[test]
    fn market_events_match_bar_counts(n_spy in 1usize..30, n_qqq in 1usize..30) {
        let mut data = InMemoryDataHandler::from_bars(bars("SPY", n_spy));
        data.insert_bars(bars("QQQ", n_qqq));
        let mut engine = BacktestEngine::new(
            EngineConfig::new(100_000.0),
            Box::new(data),
            Box::new(NullStrategy),
            Box::new(SimulatedExecutionHandler::naive()),
        );
        engine.initialize(&["SPY".to_string(), "QQQ".to_string()]).unwrap();
        let summary = engine.run().unwrap();

        let count = |symbol: &str| {
            engine
                .journal()
                .of_kind(EventKind::Market)
                .filter(|e| e.symbol == symbol)
                .count()
        };
        prop_assert_eq!(count("SPY"), n_spy);
        prop_assert_eq!(count("QQQ"), n_qqq);
        prop_assert_eq!(summary.heartbeats as usize, n_spy.max(n_qqq));
    }
}
