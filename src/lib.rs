//! # FreeKassa Client
//!
//! An async Rust client library for the FreeKassa payment gateway API.
//!
//! ## Features
//!
//! - Signed payment form URLs with pluggable order id policies
//! - All signed API endpoints (orders, withdrawals, balance, currencies, shops)
//! - Durable, lock-protected nonce counter (text or binary encoding)
//! - Retries for transient failures of read-only calls, re-signed with a fresh nonce
//! - Financial precision with `rust_decimal`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use freekassa_api_client::config::Configuration;
//! use freekassa_api_client::rest::{FormRequest, FreekassaClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FreekassaClient::new(Configuration::from_env()?);
//!
//!     let url = client.get_form_url(&FormRequest::new("100".parse()?, "RUB"))?;
//!     println!("Pay here: {url}");
//!
//!     let shops = client.get_shops().await?;
//!     println!("Shops: {:?}", shops);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod rest;
pub mod types;

// Re-export commonly used types at crate root
pub use auth::{OrderId, OrderIdPolicy};
pub use config::Configuration;
pub use error::FreekassaError;
pub use rest::FreekassaClient;
pub use types::PaymentSystem;

/// Result type alias using FreekassaError
pub type Result<T> = std::result::Result<T, FreekassaError>;
