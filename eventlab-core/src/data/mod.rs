//! Historical data sources

pub mod csv;
pub mod handler;
pub mod synthetic;

pub use self::csv::{load_csv_dir, read_bars_csv};
pub use handler::{DataHandler, InMemoryDataHandler};
pub use synthetic::{generate_synthetic_bars, SyntheticWalk};
