//! The HTTP/WebSocket serving layer: the concrete realization of "many
//! independent connections" the core engine is agnostic to.
//!
//! Grounded on `examples/aodr3w-order-book-engine-rs/src/api.rs`'s
//! router/`handle_socket` shape, retargeted from request/response order
//! submission to a sequential command stream per socket, matching
//! `connection::run_worker`'s contract. Splitting the socket into a
//! send half and a receive half (via `futures_util::StreamExt::split`)
//! lets one task forward broadcast output events while another drives
//! `run_worker` off the receive half, mirroring how the prior
//! revision's `handle_socket` multiplexed trade/book broadcasts
//! against outbound sends with `tokio::select!`.

use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
    routing::get,
};
use futures_util::{SinkExt, StreamExt, stream::SplitStream};
use serde_json::json;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::warn;

use crate::connection::{ClientCommand, Connection, ReadOutcome};
use crate::engine::Engine;
use crate::events::BroadcastSink;
use crate::model::Side;
use crate::orderbook::OrderBook;

/// A WebSocket receive half, viewed as the sequential command source
/// `connection::run_worker` drives. Each text frame is one
/// JSON-encoded `ClientCommand`; anything else (binary, malformed
/// JSON, a client-initiated close) ends the connection.
struct WsConnection {
    receiver: SplitStream<WebSocket>,
}

impl Connection for WsConnection {
    async fn read_command(&mut self) -> ReadOutcome {
        loop {
            match self.receiver.next().await {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ClientCommand>(&text) {
                        Ok(cmd) => return ReadOutcome::Success(cmd),
                        Err(e) => {
                            warn!(error = %e, "malformed command frame, closing connection");
                            return ReadOutcome::Error;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => return ReadOutcome::EndOfFile,
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    warn!(error = %e, "websocket read failed");
                    return ReadOutcome::Error;
                }
            }
        }
    }
}

/// Shared state for the router: the engine handle commands dispatch
/// to, and the broadcast sink new WebSocket connections subscribe to
/// for output events.
#[derive(Clone)]
pub struct ServeState {
    pub engine: Engine,
    pub sink: Arc<BroadcastSink>,
}

/// `GET /ws` — upgrades to a WebSocket and runs it as a connection
/// worker: commands in, output events forwarded back out.
pub async fn ws_handler(State(state): State<ServeState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: ServeState) {
    let (mut sender, receiver) = socket.split();
    let mut events_rx = state.sink.subscribe();

    let forward = tokio::spawn(async move {
        while let Ok(event) = events_rx.recv().await {
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let conn = WsConnection { receiver };
    crate::connection::run_worker(state.engine, conn).await;
    forward.abort();
}

#[derive(serde::Serialize)]
struct LevelView {
    price: u64,
    total_volume: u64,
}

/// `GET /book/{instrument}` — a read-only snapshot, not part of the
/// concurrency contract (no lock is held across the response).
pub async fn get_book(Path(instrument): Path<String>, State(state): State<ServeState>) -> impl IntoResponse {
    match state.engine.book(&instrument) {
        Some(book) => axum::Json(book_levels(&book)).into_response(),
        None => axum::Json(json!({ "buy": [], "sell": [] })).into_response(),
    }
}

fn book_levels(book: &OrderBook) -> serde_json::Value {
    let to_views = |levels: Vec<(u64, u64)>| {
        levels
            .into_iter()
            .map(|(price, total_volume)| LevelView { price, total_volume })
            .collect::<Vec<_>>()
    };
    json!({
        "buy": to_views(book.levels_snapshot(Side::Buy)),
        "sell": to_views(book.levels_snapshot(Side::Sell)),
    })
}

pub fn router(state: ServeState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/book/{instrument}", get(get_book))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(false).level(tracing::Level::TRACE))
                .on_response(DefaultOnResponse::new().level(tracing::Level::TRACE)),
        )
        .with_state(state)
}
