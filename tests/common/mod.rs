#![allow(dead_code)]

use chrono::{Days, NaiveDate};
pub use barsim::domain::bar::Bar;
use barsim::domain::config::{FillPolicy, SimConfig};
use barsim::domain::order::Order;
use barsim::domain::position::ClosedTrade;
use barsim::domain::strategy::{OrderIntent, Strategy, StrategyContext};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Daily bars with open = close and a one-unit high/low band.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let start = date(2022, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            date: start.checked_add_days(Days::new(i as u64)).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        })
        .collect()
}

pub fn constant_bars(count: usize, price: f64) -> Vec<Bar> {
    bars_from_closes(&vec![price; count])
}

pub fn small_config() -> SimConfig {
    SimConfig {
        start_cash: 10_000.0,
        commission_rate: 0.001,
        sizer_percent: 99.0,
        sma_period: 5,
        short_ema_period: 2,
        long_ema_period: 4,
        fill_policy: FillPolicy::NextOpen,
        verbose: false,
    }
}

/// Flat warm-up stretch, a rally, then a slide to the end: on the crossover
/// strategy this produces exactly one entry and one exit.
pub fn rally_then_slide() -> Vec<Bar> {
    let mut closes = vec![100.0; 8];
    for i in 0..8 {
        closes.push(102.0 + 4.0 * i as f64);
    }
    for i in 0..12 {
        closes.push(128.0 - 6.0 * i as f64);
    }
    bars_from_closes(&closes)
}

/// Wraps a strategy and records notifications while asserting the
/// single-pending-order discipline from the strategy's side of the seam.
pub struct Harness<S: Strategy> {
    pub inner: S,
    pub orders: Vec<Order>,
    pub trades: Vec<ClosedTrade>,
    outstanding: bool,
}

impl<S: Strategy> Harness<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            orders: Vec::new(),
            trades: Vec::new(),
            outstanding: false,
        }
    }

    pub fn completed(&self) -> Vec<&Order> {
        self.orders
            .iter()
            .filter(|o| o.fill.is_some())
            .collect()
    }
}

impl<S: Strategy> Strategy for Harness<S> {
    fn on_bar(&mut self, ctx: &StrategyContext<'_>) -> Option<OrderIntent> {
        let intent = self.inner.on_bar(ctx);
        if intent.is_some() {
            assert!(
                !self.outstanding,
                "strategy emitted an intent while an order was unresolved"
            );
            self.outstanding = true;
        }
        intent
    }

    fn notify_order(&mut self, order: &Order) {
        assert!(order.status.is_terminal());
        self.outstanding = false;
        self.orders.push(order.clone());
    }

    fn notify_trade(&mut self, trade: &ClosedTrade) {
        self.trades.push(trade.clone());
    }
}

pub const CSV_HEADER: &str = "date,open,high,low,close,volume,adj_close\n";

/// Render bars in the CSV layout the adapter expects.
pub fn bars_to_csv(bars: &[Bar]) -> String {
    let mut out = String::from(CSV_HEADER);
    for bar in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume, bar.close
        ));
    }
    out
}
