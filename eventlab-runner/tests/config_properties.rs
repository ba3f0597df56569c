//! Property tests for run configuration: the run id is a pure function of
//! the config contents.

use eventlab_runner::config::BacktestConfig;
use proptest::prelude::*;

fn config(capital: u32, quantity: u64, short: u32, long: u32) -> BacktestConfig {
    BacktestConfig::from_toml(&format!(
        r#"
[backtest]
symbols = ["SPY", "QQQ"]
start_date = "2024-01-02"
end_date = "2024-06-28"
initial_capital = {capital}.0

[strategy]
type = "moving_average_cross"
[strategy.params]
short = {short}
long = {long}

[sizing]
quantity = {quantity}
"#
    ))
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn toml_round_trip_preserves_run_id(
        capital in 1u32..10_000_000,
        quantity in 1u64..10_000,
        short in 1u32..50,
        extra in 1u32..100,
    ) {
        let original = config(capital, quantity, short, short + extra);
        prop_assert!(original.validate().is_ok());

        let text = toml::to_string(&original).unwrap();
        let reparsed = BacktestConfig::from_toml(&text).unwrap();
        prop_assert_eq!(&reparsed, &original);
        prop_assert_eq!(reparsed.run_id().unwrap(), original.run_id().unwrap());
    }

    #[test]
    fn different_sizing_gives_different_run_id(
        capital in 1u32..10_000_000,
        a in 1u64..10_000,
        b in 1u64..10_000,
    ) {
        prop_assume!(a != b);
        let left = config(capital, a, 5, 20);
        let right = config(capital, b, 5, 20);
        prop_assert_ne!(left.run_id().unwrap(), right.run_id().unwrap());
    }
}
