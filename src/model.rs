//! Core order and side types shared by the matching engine and the
//! serving layer.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Which side of the book an order rests on or matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side an active order of this side matches against.
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// The fields of an order that change after it is constructed: remaining
/// quantity and execution count. Mutated only while the caller holds the
/// lock on the price-level node the order rests on (or, for an order not
/// yet resting, exclusively on the stack of the submitting worker) — a
/// plain interior `Mutex` is enough, no lock-free machinery needed.
#[derive(Debug, Default)]
pub struct OrderMutable {
    pub count: u64,
    pub execution_id: u32,
}

/// A live order. Shared between the order index and, while resting,
/// exactly one price-level node. Plain `Arc` is enough — the order
/// index and the price levels never form a cycle.
#[derive(Debug)]
pub struct Order {
    pub order_id: u32,
    pub side: Side,
    pub instrument: String,
    pub price: u64,
    pub mutable: Mutex<OrderMutable>,
}

impl Order {
    pub fn new(order_id: u32, side: Side, instrument: String, price: u64, count: u64) -> Self {
        Self {
            order_id,
            side,
            instrument,
            price,
            mutable: Mutex::new(OrderMutable {
                count,
                execution_id: 0,
            }),
        }
    }

    pub fn remaining(&self) -> u64 {
        self.mutable.lock().count
    }
}
