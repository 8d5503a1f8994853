//! The connection abstraction: a sequential stream of client commands
//! in, engine dispatch, repeat until end-of-file or error.
//!
//! Grounded on `examples/original_source/engine.cpp`'s per-connection
//! thread loop (accept a connection, read commands off it one at a
//! time, hand each to the engine) and, for the Rust async worker shape,
//! on `examples/aodr3w-order-book-engine-rs/src/api.rs`'s
//! `handle_socket` loop.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Buy,
    Sell,
    Cancel,
}

/// One command read off a connection. `price`/`count` are unused by
/// `Cancel` and simply ignored by the engine for that kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientCommand {
    pub kind: CommandKind,
    pub order_id: u32,
    #[serde(default)]
    pub instrument: String,
    #[serde(default)]
    pub price: u64,
    #[serde(default)]
    pub count: u64,
}

/// The result of reading the next command off a connection.
pub enum ReadOutcome {
    Success(ClientCommand),
    EndOfFile,
    Error,
}

/// A sequential source of client commands. The production
/// implementation is the WebSocket handler in `serve`; `VecConnection`
/// below is the in-memory test double.
pub trait Connection: Send {
    fn read_command(&mut self) -> impl std::future::Future<Output = ReadOutcome> + Send;
}

/// Reads commands off `conn` one at a time and dispatches each to
/// `engine`, until the connection reports end-of-file or an error.
/// Engine-level rejections (malformed fields) are logged and do not
/// end the connection — only a read failure does.
pub async fn run_worker<C: Connection>(engine: Engine, mut conn: C) {
    loop {
        match conn.read_command().await {
            ReadOutcome::Success(cmd) => {
                if let Err(e) = engine.submit(cmd) {
                    warn!(error = %e, "command rejected");
                }
            }
            ReadOutcome::EndOfFile => return,
            ReadOutcome::Error => {
                warn!("connection read failed; closing worker");
                return;
            }
        }
    }
}

/// Feeds a fixed sequence of commands, then reports end-of-file. Used
/// by engine-level tests that don't need a real socket.
#[cfg(feature = "test-util")]
pub struct VecConnection {
    commands: std::vec::IntoIter<ClientCommand>,
}

#[cfg(feature = "test-util")]
impl VecConnection {
    pub fn new(commands: Vec<ClientCommand>) -> Self {
        Self {
            commands: commands.into_iter(),
        }
    }
}

#[cfg(feature = "test-util")]
impl Connection for VecConnection {
    async fn read_command(&mut self) -> ReadOutcome {
        match self.commands.next() {
            Some(cmd) => ReadOutcome::Success(cmd),
            None => ReadOutcome::EndOfFile,
        }
    }
}

#[cfg(all(feature = "test-util", test))]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::events::{CollectingSink, OutputEvent};
    use std::sync::Arc;

    #[tokio::test]
    async fn worker_drains_commands_then_returns() {
        let sink = Arc::new(CollectingSink::new());
        let clock = Arc::new(FixedClock::new());
        let engine = Engine::new(sink.clone(), clock);

        let conn = VecConnection::new(vec![ClientCommand {
            kind: CommandKind::Buy,
            order_id: 1,
            instrument: "TEST".to_string(),
            price: 100,
            count: 10,
        }]);

        run_worker(engine, conn).await;

        assert!(matches!(sink.events()[0], OutputEvent::OrderAdded { order_id: 1, .. }));
    }
}
