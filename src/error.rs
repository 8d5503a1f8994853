//! Engine-level errors. Grounded on
//! `examples/aodr3w-order-book-engine-rs/src/errors.rs`'s `thiserror`
//! usage, generalized from the market-maker's single connect error to
//! the engine's own narrow set of malformed-command conditions.

use thiserror::Error;

/// Conditions the engine itself rejects. Everything else — unknown
/// order on cancel, price that no longer matches an instrument — is a
/// protocol outcome reported through the output sink, not an `Err`.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EngineError {
    #[error("order {order_id} has zero quantity")]
    ZeroQuantity { order_id: u32 },

    #[error("order {order_id} has zero price")]
    ZeroPrice { order_id: u32 },
}
