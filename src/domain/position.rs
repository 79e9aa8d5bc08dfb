//! Position tracking and closed-trade records.

use chrono::NaiveDate;

/// The single open position of a run. Long-only: `size` is always positive
/// while the position exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub size: i64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub entry_index: usize,
    pub entry_commission: f64,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.size as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.size as f64 * (price - self.entry_price)
    }
}

/// Materialized when a position goes flat. Immutable once recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub size: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    /// Holding period in bars, not calendar days.
    pub bars_held: usize,
    pub gross_pnl: f64,
    pub net_pnl: f64,
}
