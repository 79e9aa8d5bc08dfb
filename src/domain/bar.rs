//! OHLCV bar representation.

use chrono::NaiveDate;

/// One observation of a fixed daily interval. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl Bar {
    /// Prices must be positive and consistent: low <= open/close <= high.
    pub fn is_well_formed(&self) -> bool {
        self.low > 0.0
            && self.low <= self.high
            && self.low <= self.open
            && self.open <= self.high
            && self.low <= self.close
            && self.close <= self.high
            && self.volume >= 0
    }
}
