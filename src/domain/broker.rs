//! Broker: cash, commission, position sizing, and fill execution.
//!
//! The broker is the sole mutator of account state. Orders that cannot be
//! paid for are refused whole, never partially filled; the caller maps the
//! refusal onto a terminal order state.

use chrono::NaiveDate;

use super::order::Fill;
use super::position::{ClosedTrade, Position};

/// Why an execution was refused. Refusals terminate the order, not the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    #[error("insufficient cash for order")]
    InsufficientMargin,
    #[error("no open position to sell")]
    PositionFlat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct Broker {
    pub cash: f64,
    pub start_cash: f64,
    commission_rate: f64,
    sizer_percent: f64,
    pub position: Option<Position>,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Broker {
    pub fn new(start_cash: f64, commission_rate: f64, sizer_percent: f64) -> Self {
        Broker {
            cash: start_cash,
            start_cash,
            commission_rate,
            sizer_percent,
            position: None,
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    /// Flat proportional fee on notional value, kept as a real number.
    pub fn commission(&self, notional: f64) -> f64 {
        notional.abs() * self.commission_rate
    }

    /// cash + position marked at `price`.
    pub fn portfolio_value(&self, price: f64) -> f64 {
        let position_value = self
            .position
            .as_ref()
            .map(|pos| pos.market_value(price))
            .unwrap_or(0.0);
        self.cash + position_value
    }

    /// Percent-of-equity sizer: whole units affordable at the execution
    /// price with `sizer_percent` of current portfolio value.
    pub fn order_size(&self, price: f64) -> i64 {
        ((self.sizer_percent / 100.0 * self.portfolio_value(price)) / price).floor() as i64
    }

    /// Execute a buy at `price`, opening the position and deducting
    /// cost plus commission atomically. Refused whole if the sizer yields
    /// zero units or the total would drive cash negative.
    pub fn execute_buy(
        &mut self,
        price: f64,
        date: NaiveDate,
        index: usize,
    ) -> Result<Fill, ExecutionError> {
        debug_assert!(self.position.is_none(), "buy while holding");

        let size = self.order_size(price);
        if size <= 0 {
            return Err(ExecutionError::InsufficientMargin);
        }

        let value = size as f64 * price;
        let commission = self.commission(value);
        if value + commission > self.cash {
            return Err(ExecutionError::InsufficientMargin);
        }

        self.cash -= value + commission;
        self.position = Some(Position {
            size,
            entry_price: price,
            entry_date: date,
            entry_index: index,
            entry_commission: commission,
        });

        Ok(Fill {
            price,
            size,
            value,
            commission,
        })
    }

    /// Execute a sell at `price`, closing the whole position, crediting
    /// proceeds minus commission, and recording the closed trade.
    pub fn execute_sell(
        &mut self,
        price: f64,
        date: NaiveDate,
        index: usize,
    ) -> Result<(Fill, ClosedTrade), ExecutionError> {
        let position = self.position.take().ok_or(ExecutionError::PositionFlat)?;

        let size = position.size;
        let value = size as f64 * price;
        let commission = self.commission(value);
        self.cash += value - commission;

        let gross_pnl = size as f64 * (price - position.entry_price);
        let net_pnl = gross_pnl - position.entry_commission - commission;

        let trade = ClosedTrade {
            size,
            entry_price: position.entry_price,
            exit_price: price,
            entry_date: position.entry_date,
            exit_date: date,
            bars_held: index - position.entry_index,
            gross_pnl,
            net_pnl,
        };
        self.closed_trades.push(trade.clone());

        Ok((
            Fill {
                price,
                size,
                value,
                commission,
            },
            trade,
        ))
    }

    /// Mark to market at the bar close.
    pub fn record_equity(&mut self, date: NaiveDate, close: f64) {
        let value = self.portfolio_value(close);
        self.equity_curve.push(EquityPoint { date, value });
    }
}
