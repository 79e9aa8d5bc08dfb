//! CSV file bar source.
//!
//! Expects one header row and the columns
//! `date,open,high,low,close,volume,adj_close` (Yahoo-style daily export).
//! The adjusted close is validated as a number and discarded; the engine
//! trades raw prices. Any malformed or out-of-order row is fatal.

use crate::domain::bar::Bar;
use crate::domain::error::BarsimError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::path::PathBuf;

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn data_error(&self, row: usize, reason: impl std::fmt::Display) -> BarsimError {
        BarsimError::Data {
            reason: format!("{}, row {}: {}", self.path.display(), row, reason),
        }
    }

    fn field<'a>(
        &self,
        record: &'a csv::StringRecord,
        row: usize,
        column: usize,
        name: &str,
    ) -> Result<&'a str, BarsimError> {
        record
            .get(column)
            .ok_or_else(|| self.data_error(row, format!("missing {name} column")))
    }

    fn numeric_field(
        &self,
        record: &csv::StringRecord,
        row: usize,
        column: usize,
        name: &str,
    ) -> Result<f64, BarsimError> {
        self.field(record, row, column, name)?
            .trim()
            .parse()
            .map_err(|e| self.data_error(row, format!("invalid {name} value: {e}")))
    }
}

impl DataPort for CsvAdapter {
    fn load_bars(&self) -> Result<Vec<Bar>, BarsimError> {
        let mut rdr = csv::Reader::from_path(&self.path).map_err(|e| BarsimError::Data {
            reason: format!("failed to open {}: {}", self.path.display(), e),
        })?;

        let mut bars: Vec<Bar> = Vec::new();

        for (i, result) in rdr.records().enumerate() {
            // Header is row 1; data rows start at 2.
            let row = i + 2;
            let record = result.map_err(|e| self.data_error(row, e))?;

            let date_str = self.field(&record, row, 0, "date")?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
                .map_err(|e| self.data_error(row, format!("invalid date: {e}")))?;

            if let Some(prev) = bars.last() {
                if date <= prev.date {
                    return Err(self.data_error(
                        row,
                        format!("bar {} is not after its predecessor {}", date, prev.date),
                    ));
                }
            }

            let open = self.numeric_field(&record, row, 1, "open")?;
            let high = self.numeric_field(&record, row, 2, "high")?;
            let low = self.numeric_field(&record, row, 3, "low")?;
            let close = self.numeric_field(&record, row, 4, "close")?;

            let volume: i64 = self
                .field(&record, row, 5, "volume")?
                .trim()
                .parse()
                .map_err(|e| self.data_error(row, format!("invalid volume value: {e}")))?;

            // Present in the export but unused by the engine.
            self.numeric_field(&record, row, 6, "adj_close")?;

            let bar = Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            };
            if !bar.is_well_formed() {
                return Err(self.data_error(row, "prices are inconsistent"));
            }
            bars.push(bar);
        }

        if bars.is_empty() {
            return Err(BarsimError::NoData {
                path: self.path.display().to_string(),
            });
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "date,open,high,low,close,volume,adj_close\n";

    fn write_csv(content: &str) -> (TempDir, CsvAdapter) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bars.csv");
        fs::write(&path, content).unwrap();
        (dir, CsvAdapter::new(path))
    }

    #[test]
    fn loads_well_formed_rows() {
        let (_dir, adapter) = write_csv(&format!(
            "{HEADER}\
             2022-06-01,100.0,110.0,90.0,105.0,50000,104.0\n\
             2022-06-02,105.0,115.0,100.0,110.0,60000,109.0\n"
        ));

        let bars = adapter.load_bars().unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2022, 6, 1).unwrap());
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, 50000);
    }

    #[test]
    fn missing_file_is_a_data_error() {
        let adapter = CsvAdapter::new(PathBuf::from("/nonexistent/bars.csv"));
        assert!(matches!(
            adapter.load_bars(),
            Err(BarsimError::Data { .. })
        ));
    }

    #[test]
    fn header_only_file_is_no_data() {
        let (_dir, adapter) = write_csv(HEADER);
        assert!(matches!(adapter.load_bars(), Err(BarsimError::NoData { .. })));
    }

    #[test]
    fn malformed_price_is_fatal() {
        let (_dir, adapter) = write_csv(&format!(
            "{HEADER}2022-06-01,100.0,abc,90.0,105.0,50000,104.0\n"
        ));
        let err = adapter.load_bars().unwrap_err();
        assert!(err.to_string().contains("invalid high value"));
    }

    #[test]
    fn bad_date_is_fatal() {
        let (_dir, adapter) = write_csv(&format!(
            "{HEADER}06/01/2022,100.0,110.0,90.0,105.0,50000,104.0\n"
        ));
        let err = adapter.load_bars().unwrap_err();
        assert!(err.to_string().contains("invalid date"));
    }

    #[test]
    fn out_of_order_rows_are_fatal() {
        let (_dir, adapter) = write_csv(&format!(
            "{HEADER}\
             2022-06-02,100.0,110.0,90.0,105.0,50000,104.0\n\
             2022-06-01,105.0,115.0,100.0,110.0,60000,109.0\n"
        ));
        let err = adapter.load_bars().unwrap_err();
        assert!(err.to_string().contains("not after its predecessor"));
    }

    #[test]
    fn duplicate_date_is_fatal() {
        let (_dir, adapter) = write_csv(&format!(
            "{HEADER}\
             2022-06-01,100.0,110.0,90.0,105.0,50000,104.0\n\
             2022-06-01,105.0,115.0,100.0,110.0,60000,109.0\n"
        ));
        assert!(adapter.load_bars().is_err());
    }

    #[test]
    fn truncated_row_is_fatal() {
        let (_dir, adapter) = write_csv(&format!("{HEADER}2022-06-01,100.0,110.0\n"));
        assert!(adapter.load_bars().is_err());
    }

    #[test]
    fn inconsistent_prices_are_fatal() {
        // high below low
        let (_dir, adapter) = write_csv(&format!(
            "{HEADER}2022-06-01,100.0,90.0,110.0,105.0,50000,104.0\n"
        ));
        let err = adapter.load_bars().unwrap_err();
        assert!(err.to_string().contains("inconsistent"));
    }

    #[test]
    fn data_range_reports_span() {
        let (_dir, adapter) = write_csv(&format!(
            "{HEADER}\
             2022-06-01,100.0,110.0,90.0,105.0,50000,104.0\n\
             2022-06-02,105.0,115.0,100.0,110.0,60000,109.0\n\
             2022-06-03,110.0,120.0,105.0,115.0,55000,114.0\n"
        ));
        let (first, last, count) = adapter.data_range().unwrap().unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2022, 6, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2022, 6, 3).unwrap());
        assert_eq!(count, 3);
    }
}
