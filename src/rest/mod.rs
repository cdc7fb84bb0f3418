//! FreeKassa REST API client.
//!
//! Provides the payment form URL builder and the signed API endpoints.
//!
//! # Trait-based API
//!
//! The [`PaymentGateway`] trait abstracts the signed API operations so code
//! that talks to the gateway can be tested against a mock implementation.

mod api;
mod client;
mod endpoints;
mod traits;
pub mod types;

pub use client::{FreekassaClient, FreekassaClientBuilder};
pub use endpoints::*;
pub use traits::PaymentGateway;
pub use types::*;
