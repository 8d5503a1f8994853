mod cli;
mod utils;

use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Commands};
use order_book_engine::clock::MonotonicClock;
use order_book_engine::engine::Engine;
use order_book_engine::events::BroadcastSink;
use order_book_engine::serve::{self, ServeState};
use tokio::net::TcpListener;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use utils::shutdown_token;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::TRACE).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let token = shutdown_token();
    let cli = Cli::parse();

    match cli.command {
        Commands::Server { port } => {
            let sink = Arc::new(BroadcastSink::new(1024));
            let clock = Arc::new(MonotonicClock::new());
            let engine = Engine::new(sink.clone(), clock);
            let state = ServeState { engine, sink };

            let app = serve::router(state);
            let ep = format!("0.0.0.0:{port}");
            let listener = TcpListener::bind(&ep).await?;
            tracing::info!("HTTP/WS server listening on {}", ep);
            axum::serve(listener, app)
                .with_graceful_shutdown(token.cancelled_owned())
                .await?;
        }
    }

    Ok(())
}
