//! FreeKassa endpoint wrappers.
//!
//! The payment form URL is built locally. All other calls are signed POSTs.

use url::Url;

use crate::auth::{SignatureKind, SignatureParams};
use crate::error::FreekassaError;
use crate::rest::FreekassaClient;
use crate::rest::client::{Delivery, is_success};
use crate::rest::endpoints::paths;
use crate::rest::types::{
    Balance, CreateOrderRequest, CreateWithdrawalRequest, CreatedOrder, CreatedWithdrawal,
    Currency, FormRequest, Order, OrdersRequest, PaymentLink, Shop, Withdrawal,
    WithdrawalCurrency, WithdrawalsRequest,
};

#[derive(serde::Serialize)]
struct Empty {}

impl FreekassaClient {
    /// Build a signed payment form link.
    ///
    /// An explicit order id in the request always wins; otherwise one is
    /// produced by the client's order id policy. Under
    /// [`OrderIdPolicy::Custom`] the request must carry one.
    ///
    /// [`OrderIdPolicy::Custom`]: crate::auth::OrderIdPolicy::Custom
    pub fn payment_link(&self, request: &FormRequest) -> Result<PaymentLink, FreekassaError> {
        let order_id = self.signer().resolve_order_id(request.order_id.as_ref())?;
        let params = SignatureParams::new()
            .with("amount", request.amount)
            .with("currency", &request.currency);
        let signature = self
            .signer()
            .sign(SignatureKind::Form, &params, Some(&order_id))?;

        let mut query = vec![
            ("m", self.config().merchant_id.to_string()),
            ("oa", request.amount.to_string()),
            ("currency", request.currency.clone()),
            ("o", order_id.to_string()),
            ("s", signature.clone()),
        ];
        if let Some(system) = request.payment_system {
            query.push(("i", system.to_string()));
        }
        if let Some(phone) = &request.phone {
            query.push(("phone", phone.clone()));
        }
        if let Some(email) = &request.email {
            query.push(("email", email.clone()));
        }
        if let Some(lang) = &request.lang {
            query.push(("lang", lang.clone()));
        }

        let url = Url::parse_with_params(self.form_url(), &query)?;
        Ok(PaymentLink {
            order_id,
            signature,
            url,
        })
    }

    /// Build a signed payment form URL.
    ///
    /// # Example
    ///
    /// ```rust
    /// use freekassa_api_client::config::Configuration;
    /// use freekassa_api_client::rest::{FormRequest, FreekassaClient};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = Configuration::builder()
    ///     .merchant_id(42)
    ///     .first_secret("abc")
    ///     .build()?;
    /// let client = FreekassaClient::new(config);
    ///
    /// let url = client.get_form_url(&FormRequest::new("100".parse()?, "RUB").lang("ru"))?;
    /// assert!(url.as_str().starts_with("https://pay.freekassa.ru/?m=42&oa=100"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_form_url(&self, request: &FormRequest) -> Result<Url, FreekassaError> {
        self.payment_link(request).map(|link| link.url)
    }

    /// List orders.
    pub async fn get_orders(&self, request: &OrdersRequest) -> Result<Vec<Order>, FreekassaError> {
        self.private_post(paths::ORDERS, request, Some("orders"), Delivery::Retry)
            .await
    }

    /// Create an order and get the payment page location.
    pub async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<CreatedOrder, FreekassaError> {
        self.private_post(paths::ORDERS_CREATE, request, None, Delivery::AtMostOnce)
            .await
    }

    /// List withdrawals.
    pub async fn get_withdrawals(
        &self,
        request: &WithdrawalsRequest,
    ) -> Result<Vec<Withdrawal>, FreekassaError> {
        self.private_post(paths::WITHDRAWALS, request, Some("orders"), Delivery::Retry)
            .await
    }

    /// Create a withdrawal.
    pub async fn create_withdrawal(
        &self,
        request: &CreateWithdrawalRequest,
    ) -> Result<CreatedWithdrawal, FreekassaError> {
        self.private_post(
            paths::WITHDRAWALS_CREATE,
            request,
            Some("data"),
            Delivery::AtMostOnce,
        )
        .await
    }

    /// Get the shop balance in every currency.
    pub async fn get_balance(&self) -> Result<Vec<Balance>, FreekassaError> {
        self.private_post(paths::BALANCE, &Empty {}, Some("balance"), Delivery::Retry)
            .await
    }

    /// List payment systems available for payments.
    pub async fn get_currencies(&self) -> Result<Vec<Currency>, FreekassaError> {
        self.private_post(
            paths::CURRENCIES,
            &Empty {},
            Some("currencies"),
            Delivery::Retry,
        )
        .await
    }

    /// Check whether a payment system is currently available.
    ///
    /// A rejection from the gateway means "unavailable" and yields `false`;
    /// transport failures are still errors.
    pub async fn check_currency_status(
        &self,
        payment_system: impl Into<u32>,
    ) -> Result<bool, FreekassaError> {
        let endpoint = paths::currency_status(payment_system.into());
        let body = self.signed_post(&endpoint, &Empty {}, Delivery::Retry).await?;
        Ok(is_success(&body))
    }

    /// List payment systems available for withdrawals.
    pub async fn get_withdrawal_currencies(
        &self,
    ) -> Result<Vec<WithdrawalCurrency>, FreekassaError> {
        self.private_post(
            paths::WITHDRAWALS_CURRENCIES,
            &Empty {},
            Some("currencies"),
            Delivery::Retry,
        )
        .await
    }

    /// List the merchant's shops.
    pub async fn get_shops(&self) -> Result<Vec<Shop>, FreekassaError> {
        self.private_post(paths::SHOPS, &Empty {}, Some("shops"), Delivery::Retry)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{OrderId, OrderIdPolicy, md5_hex};
    use crate::config::Configuration;

    fn client(policy: OrderIdPolicy) -> FreekassaClient {
        let config = Configuration::builder()
            .merchant_id(42)
            .first_secret("abc")
            .build()
            .unwrap();
        FreekassaClient::builder(config)
            .order_id_policy(policy)
            .build()
    }

    #[test]
    fn test_payment_link_with_explicit_order_id() {
        let request = FormRequest::new("100".parse().unwrap(), "RUB").order_id("shop-1");
        let link = client(OrderIdPolicy::RandomInt)
            .payment_link(&request)
            .unwrap();

        assert_eq!(link.order_id, OrderId::from("shop-1"));
        assert_eq!(link.signature, md5_hex("42:100:abc:RUB:shop-1"));
        assert_eq!(
            link.url.as_str(),
            format!(
                "https://pay.freekassa.ru/?m=42&oa=100&currency=RUB&o=shop-1&s={}",
                link.signature
            )
        );
    }

    #[test]
    fn test_payment_link_matches_form_signature() {
        let client = client(OrderIdPolicy::TimeHash);
        let link = client
            .payment_link(&FormRequest::new("99.90".parse().unwrap(), "USD"))
            .unwrap();

        let params = SignatureParams::new()
            .with("amount", "99.90")
            .with("currency", "USD");
        let expected = client
            .signer()
            .sign(SignatureKind::Form, &params, Some(&link.order_id))
            .unwrap();
        assert_eq!(link.signature, expected);
    }

    #[test]
    fn test_payment_link_custom_policy_without_order_id() {
        let request = FormRequest::new("100".parse().unwrap(), "RUB");
        let result = client(OrderIdPolicy::Custom).payment_link(&request);
        assert!(matches!(result, Err(FreekassaError::InvalidRequest(_))));
    }

    #[test]
    fn test_payment_link_requires_first_secret() {
        let config = Configuration::builder().merchant_id(1).build().unwrap();
        let client = FreekassaClient::new(config);
        let request = FormRequest::new("1".parse().unwrap(), "RUB");
        assert!(matches!(
            client.payment_link(&request),
            Err(FreekassaError::Configuration(_))
        ));
    }
}
