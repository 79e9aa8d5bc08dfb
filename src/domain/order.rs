//! Order lifecycle: states, fills, and the single pending-order slot.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Order states. `Submitted` and `Accepted` are transient intra-bar states
/// whose only effect is blocking further submissions; the other four are
/// terminal and clear the pending slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Submitted,
    Accepted,
    Completed,
    Canceled,
    Margin,
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderStatus::Submitted | OrderStatus::Accepted)
    }
}

/// Execution record attached to a completed order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub price: f64,
    pub size: i64,
    /// Notional value of the fill, price * size.
    pub value: f64,
    pub commission: f64,
}

/// One order per submission, immutable after creation except for
/// status and fill.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub side: OrderSide,
    /// None until execution for sizer-determined buys; sells carry the
    /// position size being closed.
    pub size: Option<i64>,
    pub status: OrderStatus,
    pub submitted_date: NaiveDate,
    pub submitted_index: usize,
    pub fill: Option<Fill>,
}

impl Order {
    pub fn is_buy(&self) -> bool {
        self.side == OrderSide::Buy
    }
}

/// Tracks the at-most-one outstanding order per run.
#[derive(Debug, Default)]
pub struct OrderManager {
    pending: Option<Order>,
}

impl OrderManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&Order> {
        self.pending.as_ref()
    }

    /// Submit a new order. A submission while one is outstanding is a caller
    /// error and is ignored; returns whether the order was taken.
    pub fn submit(
        &mut self,
        side: OrderSide,
        size: Option<i64>,
        date: NaiveDate,
        index: usize,
    ) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(Order {
            side,
            size,
            status: OrderStatus::Submitted,
            submitted_date: date,
            submitted_index: index,
            fill: None,
        });
        true
    }

    /// Broker acknowledgment: Submitted -> Accepted.
    pub fn accept(&mut self) {
        if let Some(order) = self.pending.as_mut() {
            debug_assert_eq!(order.status, OrderStatus::Submitted);
            order.status = OrderStatus::Accepted;
        }
    }

    /// Terminal success: attach the fill and release the slot.
    pub fn complete(&mut self, fill: Fill) -> Order {
        let mut order = self.pending.take().expect("no order to complete");
        debug_assert_eq!(order.status, OrderStatus::Accepted);
        order.status = OrderStatus::Completed;
        order.size = Some(fill.size);
        order.fill = Some(fill);
        order
    }

    /// Terminal failure: release the slot without touching the account.
    pub fn fail(&mut self, status: OrderStatus) -> Order {
        debug_assert!(status.is_terminal() && status != OrderStatus::Completed);
        let mut order = self.pending.take().expect("no order to fail");
        order.status = status;
        order
    }
}
