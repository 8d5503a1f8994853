//! The two engine-wide concurrent maps: the instrument registry
//! (create-on-first-use, never destroyed) and the order index
//! (order-id → live order, used by cancellation).
//!
//! Grounded on `examples/original_source/engine.hpp`'s `orderBooks`/
//! `orders_hashmap` (`ConcurrentHashMap<K, V>`, bucketed internal
//! locking, per-key atomicity) — realized with `dashmap::DashMap`
//! (enriched from `joaquinbejar-OrderBook-rs/Cargo.toml`) instead of
//! hand-rolling `ConcurrentHashMap.hpp`/`HashBucket.hpp`.

use std::sync::Arc;

use dashmap::DashMap;

use crate::model::Order;
use crate::orderbook::OrderBook;

/// `instrument → OrderBook`. Entries are inserted exactly once on first
/// reference; lookups return a stable `Arc` for the engine's lifetime.
#[derive(Default)]
pub struct InstrumentRegistry {
    books: DashMap<String, Arc<OrderBook>>,
}

impl InstrumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the `OrderBook` for `instrument`, creating it on first
    /// reference. Never removes an entry — books live until engine
    /// teardown.
    pub fn get_or_create(&self, instrument: &str) -> Arc<OrderBook> {
        if let Some(book) = self.books.get(instrument) {
            return book.clone();
        }
        self.books
            .entry(instrument.to_string())
            .or_insert_with(|| Arc::new(OrderBook::new()))
            .clone()
    }

    pub fn get(&self, instrument: &str) -> Option<Arc<OrderBook>> {
        self.books.get(instrument).map(|b| b.clone())
    }
}

/// `order_id → live Order`. Contains exactly the orders that are either
/// resting on some `OrderBook` or currently being matched by some
/// worker.
#[derive(Default)]
pub struct OrderIndex {
    orders: DashMap<u32, Arc<Order>>,
}

impl OrderIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `order` under its id. Duplicate ids are a caller error —
    /// client command ids are assumed unique — so this just overwrites,
    /// matching `dashmap`'s natural semantics.
    pub fn insert(&self, order: Arc<Order>) {
        self.orders.insert(order.order_id, order);
    }

    pub fn get(&self, order_id: u32) -> Option<Arc<Order>> {
        self.orders.get(&order_id).map(|e| e.clone())
    }

    pub fn remove(&self, order_id: u32) {
        self.orders.remove(&order_id);
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
