//! Request and response types for the FreeKassa API.
//!
//! Request fields serialize in declaration order; that order is also the
//! order in which they are signed, so do not reorder fields.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::auth::OrderId;
use crate::types::PaymentSystem;
use crate::types::serde_helpers::{decimal, flag, lenient_u64, option_decimal, string_or_number};

/// Parameters of the hosted payment form.
///
/// # Example
///
/// ```rust
/// use freekassa_api_client::rest::FormRequest;
/// use freekassa_api_client::types::PaymentSystem;
///
/// let request = FormRequest::new("100".parse().unwrap(), "RUB")
///     .payment_system(PaymentSystem::Sbp)
///     .email("buyer@example.com")
///     .lang("en");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FormRequest {
    /// Payment amount.
    pub amount: Decimal,
    /// Payment currency (RUB, USD, EUR, UAH, KZT).
    pub currency: String,
    /// Explicit order id. Required under the custom order id policy.
    pub order_id: Option<OrderId>,
    /// Payment system suggested to the payer (`i`).
    pub payment_system: Option<u32>,
    /// Payer phone number.
    pub phone: Option<String>,
    /// Payer email.
    pub email: Option<String>,
    /// Form language (`ru` or `en`).
    pub lang: Option<String>,
}

impl FormRequest {
    /// Create a form request for `amount` in `currency`.
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
            order_id: None,
            payment_system: None,
            phone: None,
            email: None,
            lang: None,
        }
    }

    /// Use an explicit order id.
    pub fn order_id(mut self, order_id: impl Into<OrderId>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    /// Suggest a payment system.
    pub fn payment_system(mut self, system: impl Into<u32>) -> Self {
        self.payment_system = Some(system.into());
        self
    }

    /// Set the payer phone number.
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Set the payer email.
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the form language.
    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }
}

/// A signed payment form link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentLink {
    /// Order id embedded in the link (`o`).
    pub order_id: OrderId,
    /// Form signature (`s`).
    pub signature: String,
    /// The full URL to send the payer to.
    pub url: url::Url,
}

impl std::fmt::Display for PaymentLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Filter for order and withdrawal listings.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersRequest {
    /// Merchant order id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    /// Gateway payment id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    /// Order status code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_status: Option<i32>,
    /// Start date, `YYYY-MM-DD HH:MM:SS`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    /// End date, `YYYY-MM-DD HH:MM:SS`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
    /// Page number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// Withdrawal listings take the same filter as orders.
pub type WithdrawalsRequest = OrdersRequest;

/// Request to create an order.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    /// Merchant payment id.
    #[serde(rename = "paymentId", skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    /// Payment system id.
    #[serde(rename = "i")]
    pub payment_system: u32,
    /// Payer email.
    pub email: String,
    /// Payer IP address.
    pub ip: String,
    /// Payment amount.
    pub amount: Decimal,
    /// Payment currency.
    pub currency: String,
    /// Payer phone number.
    #[serde(rename = "tel", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Redirect after a successful payment (must be enabled by the gateway).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    /// Redirect after a failed payment (must be enabled by the gateway).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_url: Option<String>,
    /// Notification URL (must be enabled by the gateway).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_url: Option<String>,
}

impl CreateOrderRequest {
    /// Create a request with the required fields.
    pub fn new(
        payment_system: impl Into<u32>,
        email: impl Into<String>,
        ip: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            payment_id: None,
            payment_system: payment_system.into(),
            email: email.into(),
            ip: ip.into(),
            amount,
            currency: currency.into(),
            phone: None,
            success_url: None,
            failure_url: None,
            notification_url: None,
        }
    }
}

/// Response of order creation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedOrder {
    /// Gateway order id.
    #[serde(rename = "orderId", deserialize_with = "lenient_u64::deserialize")]
    pub order_id: u64,
    /// Gateway order hash.
    #[serde(
        rename = "orderHash",
        deserialize_with = "string_or_number::deserialize",
        default
    )]
    pub order_hash: Option<String>,
    /// Payment id, sent by some gateway versions instead of the hash.
    #[serde(
        rename = "paymentId",
        deserialize_with = "string_or_number::deserialize",
        default
    )]
    pub payment_id: Option<String>,
    /// Payment page to redirect the payer to.
    pub location: String,
}

impl CreatedOrder {
    /// The order hash, falling back to the payment id.
    pub fn reference(&self) -> Option<&str> {
        self.order_hash.as_deref().or(self.payment_id.as_deref())
    }
}

/// An order as listed by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    /// Merchant order id.
    #[serde(deserialize_with = "string_or_number::deserialize", default)]
    pub merchant_order_id: Option<String>,
    /// Gateway order id.
    #[serde(deserialize_with = "string_or_number::deserialize", default)]
    pub fk_order_id: Option<String>,
    /// Order amount.
    #[serde(deserialize_with = "decimal::deserialize")]
    pub amount: Decimal,
    /// Order currency.
    #[serde(default)]
    pub currency: Option<String>,
    /// Payer email.
    #[serde(default)]
    pub email: Option<String>,
    /// Payer account.
    #[serde(deserialize_with = "string_or_number::deserialize", default)]
    pub account: Option<String>,
    /// Creation date.
    #[serde(default)]
    pub date: Option<String>,
    /// Status code.
    #[serde(deserialize_with = "string_or_number::deserialize", default)]
    pub status: Option<String>,
}

/// Request to create a withdrawal.
#[derive(Debug, Clone, Serialize)]
pub struct CreateWithdrawalRequest {
    /// Merchant payment id.
    #[serde(rename = "paymentId", skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    /// Payment system id.
    #[serde(rename = "i")]
    pub payment_system: u32,
    /// Destination account (phone, card or wallet, depending on the system).
    pub account: String,
    /// Withdrawal amount.
    pub amount: Decimal,
    /// Withdrawal currency.
    pub currency: String,
}

impl CreateWithdrawalRequest {
    /// Create a withdrawal request.
    pub fn new(
        payment_system: impl Into<u32>,
        account: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            payment_id: None,
            payment_system: payment_system.into(),
            account: account.into(),
            amount,
            currency: currency.into(),
        }
    }
}

/// Response of withdrawal creation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedWithdrawal {
    /// Gateway withdrawal id.
    #[serde(deserialize_with = "lenient_u64::deserialize")]
    pub id: u64,
}

/// A withdrawal as listed by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct Withdrawal {
    /// Gateway withdrawal id.
    #[serde(deserialize_with = "lenient_u64::deserialize")]
    pub id: u64,
    /// Withdrawal amount.
    #[serde(deserialize_with = "decimal::deserialize")]
    pub amount: Decimal,
    /// Withdrawal currency.
    #[serde(default)]
    pub currency: Option<String>,
    /// Payment system id used for the payout.
    #[serde(deserialize_with = "string_or_number::deserialize", default)]
    pub ext_currency_id: Option<String>,
    /// Destination account.
    #[serde(deserialize_with = "string_or_number::deserialize", default)]
    pub account: Option<String>,
    /// Creation date.
    #[serde(default)]
    pub date: Option<String>,
    /// Status code.
    #[serde(deserialize_with = "string_or_number::deserialize", default)]
    pub status: Option<String>,
}

/// Balance in one currency.
#[derive(Debug, Clone, Deserialize)]
pub struct Balance {
    /// Currency code.
    pub currency: String,
    /// Available amount.
    #[serde(deserialize_with = "decimal::deserialize")]
    pub value: Decimal,
}

/// A payment system available for payments.
#[derive(Debug, Clone, Deserialize)]
pub struct Currency {
    /// Payment system id.
    #[serde(deserialize_with = "lenient_u64::deserialize")]
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Currency code.
    #[serde(default)]
    pub currency: Option<String>,
    /// Whether the system is enabled for this shop.
    #[serde(deserialize_with = "flag::deserialize", default)]
    pub is_enabled: bool,
    /// Whether the system is marked as favourite.
    #[serde(deserialize_with = "flag::deserialize", default)]
    pub is_favorite: bool,
}

impl Currency {
    /// The known payment system for this id, if any.
    pub fn payment_system(&self) -> Option<PaymentSystem> {
        u32::try_from(self.id).ok().and_then(PaymentSystem::from_id)
    }
}

/// A payment system available for withdrawals.
#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawalCurrency {
    /// Payment system id.
    #[serde(deserialize_with = "lenient_u64::deserialize")]
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Minimum amount.
    #[serde(deserialize_with = "option_decimal::deserialize", default)]
    pub min: Option<Decimal>,
    /// Maximum amount.
    #[serde(deserialize_with = "option_decimal::deserialize", default)]
    pub max: Option<Decimal>,
    /// Currency code.
    #[serde(default)]
    pub currency: Option<String>,
    /// Whether the payout can be converted from another currency.
    #[serde(deserialize_with = "flag::deserialize", default)]
    pub can_exchange: bool,
}

/// A merchant shop.
#[derive(Debug, Clone, Deserialize)]
pub struct Shop {
    /// Shop id.
    #[serde(deserialize_with = "lenient_u64::deserialize")]
    pub id: u64,
    /// Shop name.
    pub name: String,
    /// Shop URL.
    #[serde(default)]
    pub url: Option<String>,
}
