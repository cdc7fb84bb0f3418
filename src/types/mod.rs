//! Common types used across the FreeKassa client library.

pub mod currency;
pub mod serde_helpers;

pub use currency::PaymentSystem;
