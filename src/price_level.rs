//! The per-side sorted list of price levels and its hand-over-hand
//! locking discipline.
//!
//! Mirrors `examples/original_source/engine.hpp`'s `PriceLevelNode`/
//! `BuyBook`/`SellBook`: a singly-linked list with a dummy head node
//! that never holds orders and exists only as a lock anchor. Each node
//! (dummy included) carries its own lock; traversal acquires the next
//! node's lock before releasing the previous one's, so at most two
//! adjacent locks are ever held at once.
//!
//! Guards are taken via `parking_lot`'s `arc_lock` feature
//! (`ArcMutexGuard`), not a borrowed `MutexGuard` — the guard owns its
//! `Arc` clone of the node it locks, so it can be moved from one
//! traversal step, or one function, to the next the same way the
//! original moves a `std::unique_lock` by value.

use std::sync::Arc;

use parking_lot::{Mutex, RawMutex};

use crate::model::{Order, Side};

pub type NodeRef = Arc<Mutex<LevelData>>;
pub type NodeGuard = parking_lot::ArcMutexGuard<RawMutex, LevelData>;

pub struct LevelData {
    pub price: u64,
    pub total_volume: u64,
    /// Live orders at this price, in arrival order. `rest` appends to
    /// the tail; matching consumes from the head — this is what gives
    /// price-time priority within a level.
    pub orders: Vec<Arc<Order>>,
    pub next: Option<NodeRef>,
}

impl LevelData {
    fn dummy() -> NodeRef {
        Arc::new(Mutex::new(LevelData {
            price: 0,
            total_volume: 0,
            orders: Vec::new(),
            next: None,
        }))
    }

    pub fn new_level(price: u64) -> NodeRef {
        Arc::new(Mutex::new(LevelData {
            price,
            total_volume: 0,
            orders: Vec::new(),
            next: None,
        }))
    }
}

/// One side (buy or sell) of one instrument's order book: a dummy head
/// followed by zero or more price levels, sorted toward less favorable
/// prices as you walk `next`.
pub struct SideBook {
    pub side: Side,
    pub head: NodeRef,
}

impl SideBook {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            head: LevelData::dummy(),
        }
    }

    /// Locks the dummy head, taking ownership of its own `Arc` clone.
    pub fn lock_head(&self) -> NodeGuard {
        Mutex::lock_arc(&self.head)
    }

    /// Whether a resting order at `level_price` crosses an active order
    /// of `active_side` priced at `active_price`: for an active buy the
    /// active price must be at or above the level; for an active sell
    /// it must be at or below it.
    #[inline]
    pub fn crosses(active_side: Side, active_price: u64, level_price: u64) -> bool {
        match active_side {
            Side::Buy => active_price >= level_price,
            Side::Sell => active_price <= level_price,
        }
    }

    /// Whether `level_price` is still more aggressive than `order_price`
    /// when resting on `side` — the condition `rest` keeps skipping
    /// past while looking for the insertion point.
    #[inline]
    pub fn should_skip(side: Side, level_price: u64, order_price: u64) -> bool {
        match side {
            Side::Buy => level_price > order_price,
            Side::Sell => level_price < order_price,
        }
    }
}
