//! Trait definition for the FreeKassa API client.
//!
//! # Example
//!
//! ```rust,ignore
//! use freekassa_api_client::rest::PaymentGateway;
//!
//! async fn total_rub<G: PaymentGateway>(gateway: &G) -> Result<String, freekassa_api_client::FreekassaError> {
//!     let balances = gateway.get_balance().await?;
//!     Ok(balances
//!         .iter()
//!         .find(|b| b.currency == "RUB")
//!         .map(|b| b.value.to_string())
//!         .unwrap_or_default())
//! }
//! ```

use std::future::Future;

use crate::error::FreekassaError;
use crate::rest::FreekassaClient;
use crate::rest::types::{
    Balance, CreateOrderRequest, CreateWithdrawalRequest, CreatedOrder, CreatedWithdrawal,
    Currency, Order, OrdersRequest, Shop, Withdrawal, WithdrawalCurrency, WithdrawalsRequest,
};

/// Trait defining the signed FreeKassa API operations.
///
/// All methods are async and return `Result<T, FreekassaError>`.
pub trait PaymentGateway: Send + Sync {
    /// List orders.
    fn get_orders(
        &self,
        request: &OrdersRequest,
    ) -> impl Future<Output = Result<Vec<Order>, FreekassaError>> + Send;

    /// Create an order.
    fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> impl Future<Output = Result<CreatedOrder, FreekassaError>> + Send;

    /// List withdrawals.
    fn get_withdrawals(
        &self,
        request: &WithdrawalsRequest,
    ) -> impl Future<Output = Result<Vec<Withdrawal>, FreekassaError>> + Send;

    /// Create a withdrawal.
    fn create_withdrawal(
        &self,
        request: &CreateWithdrawalRequest,
    ) -> impl Future<Output = Result<CreatedWithdrawal, FreekassaError>> + Send;

    /// Get the shop balance.
    fn get_balance(&self) -> impl Future<Output = Result<Vec<Balance>, FreekassaError>> + Send;

    /// List payment systems available for payments.
    fn get_currencies(&self)
    -> impl Future<Output = Result<Vec<Currency>, FreekassaError>> + Send;

    /// Check whether a payment system is available.
    fn check_currency_status(
        &self,
        payment_system: u32,
    ) -> impl Future<Output = Result<bool, FreekassaError>> + Send;

    /// List payment systems available for withdrawals.
    fn get_withdrawal_currencies(
        &self,
    ) -> impl Future<Output = Result<Vec<WithdrawalCurrency>, FreekassaError>> + Send;

    /// List the merchant's shops.
    fn get_shops(&self) -> impl Future<Output = Result<Vec<Shop>, FreekassaError>> + Send;
}

impl PaymentGateway for FreekassaClient {
    async fn get_orders(&self, request: &OrdersRequest) -> Result<Vec<Order>, FreekassaError> {
        FreekassaClient::get_orders(self, request).await
    }

    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<CreatedOrder, FreekassaError> {
        FreekassaClient::create_order(self, request).await
    }

    async fn get_withdrawals(
        &self,
        request: &WithdrawalsRequest,
    ) -> Result<Vec<Withdrawal>, FreekassaError> {
        FreekassaClient::get_withdrawals(self, request).await
    }

    async fn create_withdrawal(
        &self,
        request: &CreateWithdrawalRequest,
    ) -> Result<CreatedWithdrawal, FreekassaError> {
        FreekassaClient::create_withdrawal(self, request).await
    }

    async fn get_balance(&self) -> Result<Vec<Balance>, FreekassaError> {
        FreekassaClient::get_balance(self).await
    }

    async fn get_currencies(&self) -> Result<Vec<Currency>, FreekassaError> {
        FreekassaClient::get_currencies(self).await
    }

    async fn check_currency_status(&self, payment_system: u32) -> Result<bool, FreekassaError> {
        FreekassaClient::check_currency_status(self, payment_system).await
    }

    async fn get_withdrawal_currencies(&self) -> Result<Vec<WithdrawalCurrency>, FreekassaError> {
        FreekassaClient::get_withdrawal_currencies(self).await
    }

    async fn get_shops(&self) -> Result<Vec<Shop>, FreekassaError> {
        FreekassaClient::get_shops(self).await
    }
}
