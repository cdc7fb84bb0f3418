//! Authentication module for the FreeKassa API.
//!
//! This module provides:
//! - Nonce persistence for replay attack prevention
//! - Order id generation for payment forms
//! - MD5 signature generation for form URLs and API requests

mod nonce;
mod order_id;
mod signature;

pub use nonce::{DEFAULT_NONCE_FILE_STEM, FileNonceStore, MemoryNonce, NonceMethod, NonceProvider};
pub use order_id::{MAX_RANDOM_ORDER_ID, OrderId, OrderIdGenerator, OrderIdPolicy};
pub use signature::{
    SIGNATURE_SEPARATOR, SignatureEngine, SignatureKind, SignatureParams, md5_hex, sign_values,
};
