//! Command-line surface. Grounded on
//! `examples/aodr3w-order-book-engine-rs/src/main.rs`'s `clap`-derived
//! `Cli`/`Commands`, trimmed to the one subcommand this engine needs —
//! the market-maker/simulator subcommands belonged to a different
//! program (a price-quoting bot driving an HTTP order API) with no
//! counterpart here.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "engine-cli")]
#[command(version = "0.1", about = "A concurrent limit-order matching engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Runs the HTTP/WebSocket server.
    Server {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}
