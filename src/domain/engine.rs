//! The per-bar simulation loop.
//!
//! A run is a sequential fold over the bar feed: settle the pending order,
//! update indicators, ask the strategy for an intent, submit it, mark to
//! market. Nothing here is concurrent; replaying the same feed and config
//! produces an identical summary.

use chrono::NaiveDate;

use super::bar::Bar;
use super::broker::{Broker, EquityPoint, ExecutionError};
use super::config::{FillPolicy, SimConfig};
use super::error::BarsimError;
use super::indicator::IndicatorEngine;
use super::order::{OrderManager, OrderSide, OrderStatus};
use super::position::ClosedTrade;
use super::strategy::{Strategy, StrategyContext};

/// End-of-run output: final account state plus everything a report needs.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub start_cash: f64,
    pub ending_cash: f64,
    pub ending_value: f64,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

/// Run one simulation to feed exhaustion.
///
/// Data problems (empty feed, malformed or out-of-order bars, a feed too
/// short to warm the indicators) abort the run; order-level failures do not.
pub fn run_simulation(
    bars: &[Bar],
    strategy: &mut dyn Strategy,
    config: &SimConfig,
) -> Result<RunSummary, BarsimError> {
    let mut indicators = IndicatorEngine::new(
        config.sma_period,
        config.short_ema_period,
        config.long_ema_period,
    );

    if bars.is_empty() {
        return Err(BarsimError::Data {
            reason: "empty bar feed".into(),
        });
    }
    let minimum = indicators.warmup_bars();
    if bars.len() < minimum {
        return Err(BarsimError::InsufficientData {
            bars: bars.len(),
            minimum,
        });
    }

    let mut broker = Broker::new(config.start_cash, config.commission_rate, config.sizer_percent);
    let mut orders = OrderManager::new();
    let mut prev_date: Option<NaiveDate> = None;

    for (index, bar) in bars.iter().enumerate() {
        if !bar.is_well_formed() {
            return Err(BarsimError::Data {
                reason: format!("malformed bar at {}", bar.date),
            });
        }
        if prev_date.is_some_and(|prev| prev >= bar.date) {
            return Err(BarsimError::Data {
                reason: format!("bar at {} is not after its predecessor", bar.date),
            });
        }
        prev_date = Some(bar.date);

        // An order accepted on an earlier bar fills at this bar's open.
        if orders.pending().is_some_and(|o| o.submitted_index < index) {
            settle(&mut orders, &mut broker, strategy, bar.open, bar.date, index);
        }

        let snapshot = indicators.update(bar);

        let intent = {
            let ctx = StrategyContext {
                bar,
                indicators: &snapshot,
                position: broker.position.as_ref(),
                order_pending: orders.is_pending(),
            };
            strategy.on_bar(&ctx)
        };

        if let Some(intent) = intent {
            if !orders.is_pending() {
                let paired = match intent.side {
                    OrderSide::Buy => broker.is_flat(),
                    OrderSide::Sell => !broker.is_flat(),
                };
                let size = match intent.side {
                    OrderSide::Buy => None,
                    OrderSide::Sell => broker.position.as_ref().map(|p| p.size),
                };
                orders.submit(intent.side, size, bar.date, index);
                if !paired {
                    // Buy while holding or sell while flat: terminal, no fill.
                    let order = orders.fail(OrderStatus::Rejected);
                    strategy.notify_order(&order);
                } else if config.fill_policy == FillPolicy::CurrentClose {
                    settle(&mut orders, &mut broker, strategy, bar.close, bar.date, index);
                }
            }
        }

        broker.record_equity(bar.date, bar.close);
    }

    // The feed is done; an unfilled order can never execute.
    if orders.is_pending() {
        let order = orders.fail(OrderStatus::Canceled);
        strategy.notify_order(&order);
    }

    let ending_value = broker
        .equity_curve
        .last()
        .map(|p| p.value)
        .unwrap_or(broker.cash);

    Ok(RunSummary {
        start_cash: broker.start_cash,
        ending_cash: broker.cash,
        ending_value,
        closed_trades: broker.closed_trades,
        equity_curve: broker.equity_curve,
    })
}

/// Drive the pending order to a terminal state at `price`: Accepted, then
/// Completed with a broker fill, or a terminal failure if the broker
/// refuses. Observers fire once per terminal transition.
fn settle(
    orders: &mut OrderManager,
    broker: &mut Broker,
    strategy: &mut dyn Strategy,
    price: f64,
    date: NaiveDate,
    index: usize,
) {
    orders.accept();
    let side = orders.pending().expect("settling without an order").side;

    let result = match side {
        OrderSide::Buy => broker
            .execute_buy(price, date, index)
            .map(|fill| (fill, None)),
        OrderSide::Sell => broker
            .execute_sell(price, date, index)
            .map(|(fill, trade)| (fill, Some(trade))),
    };

    match result {
        Ok((fill, trade)) => {
            let order = orders.complete(fill);
            strategy.notify_order(&order);
            if let Some(trade) = trade {
                strategy.notify_trade(&trade);
            }
        }
        Err(ExecutionError::InsufficientMargin) => {
            let order = orders.fail(OrderStatus::Margin);
            strategy.notify_order(&order);
        }
        Err(ExecutionError::PositionFlat) => {
            let order = orders.fail(OrderStatus::Rejected);
            strategy.notify_order(&order);
        }
    }
}
