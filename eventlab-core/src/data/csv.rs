//! CSV bar import.
//!
//! One file per symbol, `<SYMBOL>.csv`, with header
//! `date,open,high,low,close,adj_close,volume`. Column order is free; names are not.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::data::handler::InMemoryDataHandler;
use crate::domain::Bar;
use crate::error::EngineError;

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    adj_close: f64,
    volume: u64,
}

/// Parse bars for `symbol` from any CSV reader.
pub fn read_bars_csv<R: Read>(reader: R, symbol: &str) -> Result<Vec<Bar>, EngineError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut bars = Vec::new();
    for (line, row) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = row.map_err(|e| {
            EngineError::Data(format!("{symbol}: bad CSV row {}: {e}", line + 1))
        })?;
        bars.push(Bar {
            symbol: symbol.to_string(),
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            adj_close: row.adj_close,
            volume: row.volume,
        });
    }
    Ok(bars)
}

/// Load `<dir>/<SYMBOL>.csv` for every symbol into one in-memory store.
pub fn load_csv_dir(dir: &Path, symbols: &[String]) -> Result<InMemoryDataHandler, EngineError> {
    let mut handler = InMemoryDataHandler::new();
    for symbol in symbols {
        let path = dir.join(format!("{symbol}.csv"));
        let file = std::fs::File::open(&path)
            .map_err(|e| EngineError::Data(format!("{}: {e}", path.display())))?;
        let bars = read_bars_csv(file, symbol)?;
        tracing::debug!(symbol = %symbol, bars = bars.len(), "loaded CSV bars");
        handler.insert_bars(bars);
    }
    Ok(handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::handler::DataHandler;
    use crate::domain::BarField;

    const SAMPLE: &str = "date,open,high,low,close,adj_close,volume
2024-01-02,100.0,102.0,99.0,101.0,100.5,1000
2024-01-03,101.0,103.0,100.0,102.0,101.5,1100
";

    #[test]
    fn parses_rows_in_order() {
        let bars = read_bars_csv(SAMPLE.as_bytes(), "SPY").unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].symbol, "SPY");
        assert_eq!(bars[1].adj_close, 101.5);
        assert_eq!(bars[1].volume, 1100);
    }

    #[test]
    fn bad_row_reports_symbol() {
        let bad = "date,open,high,low,close,adj_close,volume\nnot-a-date,1,1,1,1,1,1\n";
        let err = read_bars_csv(bad.as_bytes(), "SPY").unwrap_err();
        assert!(err.to_string().contains("SPY"));
    }

    #[test]
    fn loads_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("SPY.csv"), SAMPLE).unwrap();
        let handler = load_csv_dir(dir.path(), &["SPY".to_string()]).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(
            handler.get_bar_value("SPY", date, BarField::AdjClose).unwrap(),
            101.5
        );
    }

    #[test]
    fn missing_file_is_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_csv_dir(dir.path(), &["QQQ".to_string()]).unwrap_err();
        assert!(matches!(err, EngineError::Data(_)));
    }
}
