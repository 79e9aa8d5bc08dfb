//! Strategy contract and the EMA crossover reference implementation.

use chrono::NaiveDate;

use super::bar::Bar;
use super::indicator::IndicatorSnapshot;
use super::order::{Order, OrderSide};
use super::position::{ClosedTrade, Position};

/// A request to trade, at most one per bar. Sizing is the broker's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderIntent {
    pub side: OrderSide,
}

impl OrderIntent {
    pub fn buy() -> Self {
        OrderIntent {
            side: OrderSide::Buy,
        }
    }

    pub fn sell() -> Self {
        OrderIntent {
            side: OrderSide::Sell,
        }
    }
}

/// Read-only view of the simulation handed to the strategy once per bar.
#[derive(Debug, Clone, Copy)]
pub struct StrategyContext<'a> {
    pub bar: &'a Bar,
    pub indicators: &'a IndicatorSnapshot,
    pub position: Option<&'a Position>,
    pub order_pending: bool,
}

/// The decision seam. Implementations are pure over the context; the
/// notification hooks observe terminal order transitions and closed trades
/// synchronously and must not assume they can affect the run.
pub trait Strategy {
    fn on_bar(&mut self, ctx: &StrategyContext<'_>) -> Option<OrderIntent>;

    fn notify_order(&mut self, _order: &Order) {}

    fn notify_trade(&mut self, _trade: &ClosedTrade) {}
}

/// Trend-filtered EMA crossover, long-only.
///
/// Buy when the short EMA is above the long EMA and the close is above the
/// trend SMA while flat; sell when the short EMA drops below the long EMA
/// while holding. Silent until every indicator is warm.
#[derive(Debug)]
pub struct EmaCrossover {
    verbose: bool,
}

impl EmaCrossover {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn log(&self, date: NaiveDate, msg: &str) {
        if self.verbose {
            eprintln!("{date}: {msg}");
        }
    }
}

impl Strategy for EmaCrossover {
    fn on_bar(&mut self, ctx: &StrategyContext<'_>) -> Option<OrderIntent> {
        if ctx.order_pending {
            return None;
        }

        let diff = ctx.indicators.ema_diff()?;
        let trend_sma = ctx.indicators.trend_sma?;

        match ctx.position {
            None => {
                if diff > 0.0 && ctx.bar.close > trend_sma {
                    self.log(ctx.bar.date, "opening long position");
                    return Some(OrderIntent::buy());
                }
            }
            Some(_) => {
                if diff < 0.0 {
                    self.log(ctx.bar.date, "closing long position");
                    return Some(OrderIntent::sell());
                }
            }
        }
        None
    }

    fn notify_order(&mut self, order: &Order) {
        match order.fill {
            Some(fill) => {
                let side = if order.is_buy() { "BUY" } else { "SELL" };
                self.log(
                    order.submitted_date,
                    &format!(
                        "{side} executed, price: {:.2}, value: {:.2}, commission: {:.2}",
                        fill.price, fill.value, fill.commission
                    ),
                );
            }
            None => {
                self.log(
                    order.submitted_date,
                    &format!("order failed: {:?}", order.status),
                );
            }
        }
    }

    fn notify_trade(&mut self, trade: &ClosedTrade) {
        self.log(
            trade.exit_date,
            &format!(
                "trade closed after {} bars, gross: {:.2}, net: {:.2}",
                trade.bars_held, trade.gross_pnl, trade.net_pnl
            ),
        );
    }
}
