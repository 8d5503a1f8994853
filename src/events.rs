//! The three output events the engine reports, and the sink they're
//! pushed through. Grounded on
//! `examples/aodr3w-order-book-engine-rs/src/trade.rs` for event doc
//! style and on `src/api.rs`'s `trade_tx`/`book_tx` broadcast channels
//! for how a production sink fans events out.

use serde::{Deserialize, Serialize};
use tracing::info;

#[cfg(feature = "test-util")]
use parking_lot::Mutex;

/// One committed engine decision, timestamped at commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OutputEvent {
    /// Emitted once when an order becomes resting.
    OrderAdded {
        order_id: u32,
        instrument: String,
        price: u64,
        count: u64,
        is_sell: bool,
        ts: u64,
    },
    /// Emitted once per fill. `price` is always the resting order's
    /// price; `execution_id` counts executions against the resting
    /// order (first fill publishes 1).
    OrderExecuted {
        resting_id: u32,
        active_id: u32,
        execution_id: u32,
        price: u64,
        qty: u64,
        ts: u64,
    },
    /// Emitted exactly once per cancel command.
    OrderDeleted {
        order_id: u32,
        accepted: bool,
        ts: u64,
    },
}

/// Sink for committed events. Must be safe to call concurrently from
/// many connection-worker threads; implementations must not reorder
/// events sharing a resting order.
pub trait OutputSink: Send + Sync {
    fn order_added(&self, event: OutputEvent);
    fn order_executed(&self, event: OutputEvent);
    fn order_deleted(&self, event: OutputEvent);
}

/// Production sink: logs every event at `info!` and republishes it on a
/// broadcast channel for any connected WebSocket client to forward
/// downstream. A lagging receiver simply misses old events — this is a
/// best-effort fan-out channel, not a durable event log.
pub struct BroadcastSink {
    tx: tokio::sync::broadcast::Sender<OutputEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = tokio::sync::broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<OutputEvent> {
        self.tx.subscribe()
    }

    fn publish(&self, event: OutputEvent) {
        // No receivers is the common case between commands; not an error.
        let _ = self.tx.send(event);
    }
}

impl OutputSink for BroadcastSink {
    fn order_added(&self, event: OutputEvent) {
        info!(?event, "order added");
        self.publish(event);
    }

    fn order_executed(&self, event: OutputEvent) {
        info!(?event, "order executed");
        self.publish(event);
    }

    fn order_deleted(&self, event: OutputEvent) {
        info!(?event, "order deleted");
        self.publish(event);
    }
}

/// Test sink: collects every event it sees, in the order it was called,
/// for assertions on exact event sequences.
#[cfg(feature = "test-util")]
pub struct CollectingSink {
    events: Mutex<Vec<OutputEvent>>,
}

#[cfg(feature = "test-util")]
impl CollectingSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<OutputEvent> {
        self.events.lock().clone()
    }
}

#[cfg(feature = "test-util")]
impl Default for CollectingSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "test-util")]
impl OutputSink for CollectingSink {
    fn order_added(&self, event: OutputEvent) {
        self.events.lock().push(event);
    }

    fn order_executed(&self, event: OutputEvent) {
        self.events.lock().push(event);
    }

    fn order_deleted(&self, event: OutputEvent) {
        self.events.lock().push(event);
    }
}
