//! The engine: the instrument registry, the order index, and the
//! entry points a connection worker calls for each command it reads.
//!
//! Grounded on `examples/original_source/engine.hpp`'s `Engine` class
//! (`orderBooks`, `orders_hashmap`, `processNewOrder`,
//! `processCancelOrder`) and on
//! `examples/aodr3w-order-book-engine-rs/src/state.rs` for how the
//! prior revision wired shared state behind an `Arc`-cloneable handle.

use std::sync::Arc;

use crate::clock::Clock;
use crate::connection::{ClientCommand, CommandKind};
use crate::error::EngineError;
use crate::events::{OutputEvent, OutputSink};
use crate::model::{Order, Side};
use crate::orderbook::OrderBook;
use crate::registry::{InstrumentRegistry, OrderIndex};

/// Shared engine state. Cheap to clone (every field is an `Arc`), so
/// each connection worker gets its own handle.
#[derive(Clone)]
pub struct Engine {
    books: Arc<InstrumentRegistry>,
    orders: Arc<OrderIndex>,
    sink: Arc<dyn OutputSink>,
    clock: Arc<dyn Clock>,
}

impl Engine {
    pub fn new(sink: Arc<dyn OutputSink>, clock: Arc<dyn Clock>) -> Self {
        Self {
            books: Arc::new(InstrumentRegistry::new()),
            orders: Arc::new(OrderIndex::new()),
            sink,
            clock,
        }
    }

    pub fn order_index(&self) -> &OrderIndex {
        &self.orders
    }

    /// Looks up an instrument's book without creating it. Used by the
    /// read-only snapshot endpoint; `submit_new` is the only path that
    /// creates a book on first reference.
    pub fn book(&self, instrument: &str) -> Option<Arc<OrderBook>> {
        self.books.get(instrument)
    }

    /// Dispatches one client command: a new buy/sell or a cancel.
    /// Rejects only malformed fields the transport should already have
    /// caught (zero quantity); everything else is handled as a protocol
    /// outcome through the output sink, never an `Err`.
    pub fn submit(&self, cmd: ClientCommand) -> Result<(), EngineError> {
        match cmd.kind {
            CommandKind::Cancel => {
                self.submit_cancel(cmd.order_id);
                Ok(())
            }
            CommandKind::Buy | CommandKind::Sell => self.submit_new(cmd),
        }
    }

    fn submit_new(&self, cmd: ClientCommand) -> Result<(), EngineError> {
        if cmd.count == 0 {
            return Err(EngineError::ZeroQuantity { order_id: cmd.order_id });
        }
        if cmd.price == 0 {
            return Err(EngineError::ZeroPrice { order_id: cmd.order_id });
        }

        let side = match cmd.kind {
            CommandKind::Buy => Side::Buy,
            CommandKind::Sell => Side::Sell,
            CommandKind::Cancel => unreachable!("dispatched in submit()"),
        };
        let order = Arc::new(Order::new(cmd.order_id, side, cmd.instrument.clone(), cmd.price, cmd.count));
        let book = self.books.get_or_create(&cmd.instrument);
        book.submit_new(order, &self.orders, self.sink.as_ref(), self.clock.as_ref());
        Ok(())
    }

    /// Cancels a resting order by id. Unknown ids, or ids whose order
    /// has already fully filled, report `accepted: false` through the
    /// output sink — this is never an error.
    fn submit_cancel(&self, order_id: u32) {
        let Some(order) = self.orders.get(order_id) else {
            self.sink.order_deleted(OutputEvent::OrderDeleted {
                order_id,
                accepted: false,
                ts: self.clock.now_nanos(),
            });
            return;
        };
        let Some(book) = self.books.get(&order.instrument) else {
            self.sink.order_deleted(OutputEvent::OrderDeleted {
                order_id,
                accepted: false,
                ts: self.clock.now_nanos(),
            });
            return;
        };
        book.cancel(&order, &self.orders, self.sink.as_ref(), self.clock.as_ref());
    }
}

#[cfg(feature = "test-util")]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::connection::{ClientCommand, CommandKind};
    use crate::events::{CollectingSink, OutputEvent};

    fn engine() -> (Engine, Arc<CollectingSink>) {
        let sink = Arc::new(CollectingSink::new());
        let clock = Arc::new(FixedClock::new());
        (Engine::new(sink.clone(), clock), sink)
    }

    fn cmd(kind: CommandKind, order_id: u32, price: u64, count: u64) -> ClientCommand {
        ClientCommand {
            kind,
            order_id,
            instrument: "TEST".to_string(),
            price,
            count,
        }
    }

    #[test]
    fn new_order_rests_when_nothing_crosses() {
        let (engine, sink) = engine();
        engine.submit(cmd(CommandKind::Buy, 1, 100, 10)).unwrap();

        let events = sink.events();
        assert!(matches!(events[0], OutputEvent::OrderAdded { order_id: 1, .. }));
    }

    #[test]
    fn cancel_of_unknown_order_reports_not_accepted() {
        let (engine, sink) = engine();
        engine.submit(cmd(CommandKind::Cancel, 404, 0, 0)).unwrap();

        let events = sink.events();
        assert!(matches!(
            events[0],
            OutputEvent::OrderDeleted { order_id: 404, accepted: false, .. }
        ));
    }

    #[test]
    fn zero_quantity_order_is_rejected() {
        let (engine, _sink) = engine();
        let err = engine.submit(cmd(CommandKind::Buy, 1, 100, 0)).unwrap_err();
        assert!(matches!(err, EngineError::ZeroQuantity { order_id: 1 }));
    }

    #[test]
    fn crossing_order_executes_then_cancel_of_filled_order_is_rejected() {
        let (engine, sink) = engine();
        engine.submit(cmd(CommandKind::Sell, 1, 100, 10)).unwrap();
        engine.submit(cmd(CommandKind::Buy, 2, 100, 10)).unwrap();
        engine.submit(cmd(CommandKind::Cancel, 1, 0, 0)).unwrap();

        let events = sink.events();
        assert!(events.iter().any(|e| matches!(e, OutputEvent::OrderExecuted { .. })));
        assert!(matches!(
            events.last().unwrap(),
            OutputEvent::OrderDeleted { order_id: 1, accepted: false, .. }
        ));
    }
}
