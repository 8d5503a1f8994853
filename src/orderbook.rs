//! The per-instrument order book: two `SideBook`s and the bootstrap
//! lock that serializes how new orders acquire their two dummy-head
//! locks.
//!
//! `submit_new` and `cancel` are the Rust counterparts of
//! `examples/original_source/engine.cpp`'s `Engine::processNewOrder`
//! and `Engine::processCancelOrder`, inlined the same way: the
//! book-level bootstrap, the hand-over-hand match, and the
//! hand-over-hand rest (or cancel search) all happen in one call, with
//! lock guards moved from step to step rather than re-acquired.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::clock::Clock;
use crate::events::{OutputEvent, OutputSink};
use crate::model::{Order, Side};
use crate::price_level::{LevelData, NodeGuard, SideBook};
use crate::registry::OrderIndex;

/// One instrument's book: a buy side, a sell side, and the lock that
/// makes "acquire own dummy, then acquire opposite dummy" atomic across
/// concurrently submitted orders, so two orders on opposite sides can
/// never wait on each other's dummy in reverse order.
pub struct OrderBook {
    buy: SideBook,
    sell: SideBook,
    bootstrap_lock: Mutex<()>,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            buy: SideBook::new(Side::Buy),
            sell: SideBook::new(Side::Sell),
            bootstrap_lock: Mutex::new(()),
        }
    }

    fn side(&self, side: Side) -> &SideBook {
        match side {
            Side::Buy => &self.buy,
            Side::Sell => &self.sell,
        }
    }

    /// Accepts a new order: matches it against the opposite side, then
    /// rests whatever quantity remains. Registers the order in
    /// `order_index` up front (a cancel racing in before the order
    /// rests will simply find nothing to cancel) and removes it again
    /// if it fills completely.
    pub fn submit_new(
        &self,
        active: Arc<Order>,
        order_index: &OrderIndex,
        sink: &dyn OutputSink,
        clock: &dyn Clock,
    ) {
        order_index.insert(active.clone());

        let own_side = self.side(active.side);
        let opposite_side = self.side(active.side.opposite());

        let (own_guard, opp_guard) = {
            let _book_guard = self.bootstrap_lock.lock();
            let own_guard = own_side.lock_head();
            let opp_guard = opposite_side.lock_head();
            (own_guard, opp_guard)
        };

        self.match_against(&active, opp_guard, order_index, sink, clock);

        if active.remaining() > 0 {
            self.rest(own_side, active, own_guard, sink, clock);
        } else {
            order_index.remove(active.order_id);
        }
    }

    /// Walks the opposite side hand-over-hand from its dummy head,
    /// filling `active` against resting orders FIFO within each crossed
    /// level, unlinking any level that empties out, and stopping at the
    /// first level that no longer crosses or once `active` is filled.
    fn match_against(
        &self,
        active: &Arc<Order>,
        entry_guard: NodeGuard,
        order_index: &OrderIndex,
        sink: &dyn OutputSink,
        clock: &dyn Clock,
    ) {
        let mut prev_guard = entry_guard;
        loop {
            if active.remaining() == 0 {
                break;
            }
            let Some(next_node) = prev_guard.next.clone() else {
                break;
            };
            let mut curr_guard = Mutex::lock_arc(&next_node);
            if !SideBook::crosses(active.side, active.price, curr_guard.price) {
                break;
            }

            while active.remaining() > 0 && !curr_guard.orders.is_empty() {
                let resting = curr_guard.orders[0].clone();
                let (fill_qty, execution_id) = {
                    let mut active_mut = active.mutable.lock();
                    let mut resting_mut = resting.mutable.lock();
                    let qty = active_mut.count.min(resting_mut.count);
                    active_mut.count -= qty;
                    resting_mut.count -= qty;
                    resting_mut.execution_id += 1;
                    (qty, resting_mut.execution_id)
                };
                curr_guard.total_volume = curr_guard.total_volume.saturating_sub(fill_qty);

                let ts = clock.now_nanos();
                sink.order_executed(OutputEvent::OrderExecuted {
                    resting_id: resting.order_id,
                    active_id: active.order_id,
                    execution_id,
                    price: curr_guard.price,
                    qty: fill_qty,
                    ts,
                });

                if resting.remaining() == 0 {
                    curr_guard.orders.remove(0);
                    order_index.remove(resting.order_id);
                }
            }

            if curr_guard.orders.is_empty() {
                prev_guard.next = curr_guard.next.take();
                drop(curr_guard);
                continue;
            }

            prev_guard = curr_guard;
        }
    }

    /// Walks `side` hand-over-hand from its dummy head, looking for the
    /// level `order.price` belongs at: appends to an existing level at
    /// that price, splices in a new level between two existing ones, or
    /// appends a new level at the tail.
    fn rest(
        &self,
        side: &SideBook,
        order: Arc<Order>,
        entry_guard: NodeGuard,
        sink: &dyn OutputSink,
        clock: &dyn Clock,
    ) {
        let mut prev_guard = entry_guard;
        loop {
            let Some(next_node) = prev_guard.next.clone() else {
                let new_node = LevelData::new_level(order.price);
                {
                    let mut new_guard = Mutex::lock_arc(&new_node);
                    new_guard.total_volume = order.remaining();
                    new_guard.orders.push(order.clone());
                }
                prev_guard.next = Some(new_node);
                break;
            };

            let mut curr_guard = Mutex::lock_arc(&next_node);

            if curr_guard.price == order.price {
                curr_guard.total_volume += order.remaining();
                curr_guard.orders.push(order.clone());
                break;
            }

            if SideBook::should_skip(side.side, curr_guard.price, order.price) {
                prev_guard = curr_guard;
                continue;
            }

            let new_node = LevelData::new_level(order.price);
            {
                let mut new_guard = Mutex::lock_arc(&new_node);
                new_guard.total_volume = order.remaining();
                new_guard.orders.push(order.clone());
                new_guard.next = Some(next_node.clone());
            }
            prev_guard.next = Some(new_node);
            break;
        }

        let ts = clock.now_nanos();
        sink.order_added(OutputEvent::OrderAdded {
            order_id: order.order_id,
            instrument: order.instrument.clone(),
            price: order.price,
            count: order.remaining(),
            is_sell: order.side == Side::Sell,
            ts,
        });
    }

    /// Removes a resting order by id, if still resting. The list is
    /// sorted, so once a level less favorable than `order.price` is
    /// reached without finding it, it cannot be present.
    pub fn cancel(
        &self,
        order: &Arc<Order>,
        order_index: &OrderIndex,
        sink: &dyn OutputSink,
        clock: &dyn Clock,
    ) -> bool {
        let side = self.side(order.side);
        let mut prev_guard = side.lock_head();

        let accepted = loop {
            let Some(next_node) = prev_guard.next.clone() else {
                break false;
            };
            let mut curr_guard = Mutex::lock_arc(&next_node);

            if curr_guard.price != order.price {
                if SideBook::should_skip(side.side, curr_guard.price, order.price) {
                    prev_guard = curr_guard;
                    continue;
                }
                break false;
            }

            match curr_guard.orders.iter().position(|o| o.order_id == order.order_id) {
                Some(pos) => {
                    let removed = curr_guard.orders.remove(pos);
                    curr_guard.total_volume =
                        curr_guard.total_volume.saturating_sub(removed.remaining());
                    if curr_guard.orders.is_empty() {
                        prev_guard.next = curr_guard.next.take();
                    }
                    break true;
                }
                None => break false,
            }
        };

        if accepted {
            order_index.remove(order.order_id);
        }

        let ts = clock.now_nanos();
        sink.order_deleted(OutputEvent::OrderDeleted {
            order_id: order.order_id,
            accepted,
            ts,
        });
        accepted
    }

    /// Snapshot of resting volume per price level, best price first.
    /// Backs the read-only `/book/{instrument}` endpoint as well as
    /// test assertions. Takes the dummy lock and walks the whole list;
    /// not meant for use on the hot path, and not part of the
    /// concurrency contract (no lock is held across the caller's use of
    /// the result).
    pub fn levels_snapshot(&self, side: Side) -> Vec<(u64, u64)> {
        let book = self.side(side);
        let mut levels = Vec::new();
        let mut guard = book.lock_head();
        loop {
            let Some(next_node) = guard.next.clone() else {
                break;
            };
            let next_guard = Mutex::lock_arc(&next_node);
            levels.push((next_guard.price, next_guard.total_volume));
            guard = next_guard;
        }
        levels
    }
}
