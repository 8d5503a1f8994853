use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use futures_util::{SinkExt, StreamExt};
use order_book_engine::clock::MonotonicClock;
use order_book_engine::connection::{ClientCommand, CommandKind};
use order_book_engine::engine::Engine;
use order_book_engine::events::{BroadcastSink, OutputEvent};
use order_book_engine::serve::{ServeState, router};
use tokio::net::TcpListener;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

async fn spawn_server() -> (String, tokio::task::JoinHandle<()>) {
    let sink = Arc::new(BroadcastSink::new(64));
    let clock = Arc::new(MonotonicClock::new());
    let engine = Engine::new(sink.clone(), clock);
    let state = ServeState { engine, sink };
    let app: Router = router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base = format!("ws://{}", addr);

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (base, handle)
}

async fn connect_with_retry(url: &str) -> tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>> {
    for _ in 0..20 {
        if let Ok((ws, _)) = connect_async(url).await {
            return ws;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("could not connect to {url}");
}

#[tokio::test]
async fn websocket_round_trip_reports_resting_order() {
    let (base, _server) = spawn_server().await;
    let mut ws = connect_with_retry(&format!("{base}/ws")).await;

    let cmd = ClientCommand {
        kind: CommandKind::Buy,
        order_id: 1,
        instrument: "BTC-USD".to_string(),
        price: 100,
        count: 10,
    };
    ws.send(WsMessage::Text(serde_json::to_string(&cmd).unwrap().into()))
        .await
        .unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for event")
        .expect("socket closed")
        .expect("websocket error");
    let text = match frame {
        WsMessage::Text(t) => t,
        other => panic!("expected text frame, got {:?}", other),
    };
    let event: OutputEvent = serde_json::from_str(&text).expect("parse OutputEvent");
    assert!(matches!(event, OutputEvent::OrderAdded { order_id: 1, .. }));
}

#[tokio::test]
async fn websocket_reports_execution_across_two_connections() {
    let (base, _server) = spawn_server().await;
    let mut resting_conn = connect_with_retry(&format!("{base}/ws")).await;
    let mut active_conn = connect_with_retry(&format!("{base}/ws")).await;

    let resting = ClientCommand {
        kind: CommandKind::Sell,
        order_id: 1,
        instrument: "BTC-USD".to_string(),
        price: 100,
        count: 10,
    };
    resting_conn
        .send(WsMessage::Text(serde_json::to_string(&resting).unwrap().into()))
        .await
        .unwrap();
    let _added: OutputEvent = recv_event(&mut resting_conn).await;

    let active = ClientCommand {
        kind: CommandKind::Buy,
        order_id: 2,
        instrument: "BTC-USD".to_string(),
        price: 100,
        count: 10,
    };
    active_conn
        .send(WsMessage::Text(serde_json::to_string(&active).unwrap().into()))
        .await
        .unwrap();

    let event: OutputEvent = recv_event(&mut resting_conn).await;
    assert!(matches!(
        event,
        OutputEvent::OrderExecuted { resting_id: 1, active_id: 2, .. }
    ));
}

async fn recv_event(
    ws: &mut tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
) -> OutputEvent {
    let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for event")
        .expect("socket closed")
        .expect("websocket error");
    match frame {
        WsMessage::Text(t) => serde_json::from_str(&t).expect("parse OutputEvent"),
        other => panic!("expected text frame, got {:?}", other),
    }
}
