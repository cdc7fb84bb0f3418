//! MD5 signature generation for FreeKassa requests.
//!
//! Signatures are computed positionally:
//! ```text
//! MD5(value_1 + ":" + value_2 + ":" + ... + value_n)
//! ```
//! rendered as 32 lowercase hex characters. The order of values matters;
//! there is no key sorting. MD5 is what the gateway checks, it only protects
//! the parameters against tampering by someone who lacks the secret.
//!
//! Two payload shapes exist:
//! - **form**: `merchant_id:amount:first_secret:currency:order_id`
//! - **api**: every request parameter value in insertion order, followed by
//!   the signing secret

use std::fmt::Display;
use std::sync::Arc;

use crate::auth::order_id::{OrderId, OrderIdGenerator, OrderIdPolicy};
use crate::config::Configuration;
use crate::error::FreekassaError;

/// Separator placed between signed values.
pub const SIGNATURE_SEPARATOR: &str = ":";

/// Lowercase hex MD5 digest of `input`.
pub fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// Sign an ordered sequence of values.
///
/// # Example
///
/// ```rust
/// use freekassa_api_client::auth::sign_values;
///
/// let signature = sign_values(["42", "100", "secret", "RUB", "order-1"]);
/// assert_eq!(signature.len(), 32);
/// ```
pub fn sign_values<I, T>(values: I) -> String
where
    I: IntoIterator<Item = T>,
    T: Display,
{
    let payload = values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(SIGNATURE_SEPARATOR);
    md5_hex(&payload)
}

/// Which payload shape to sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureKind {
    /// Payment form URL signature.
    Form,
    /// API request signature.
    Api,
}

impl SignatureKind {
    /// Map a kind name to a kind.
    ///
    /// Only `"form"` selects [`SignatureKind::Form`]; every other name falls
    /// through to [`SignatureKind::Api`].
    pub fn from_name(name: &str) -> Self {
        if name == "form" {
            SignatureKind::Form
        } else {
            if name != "api" {
                tracing::debug!(kind = name, "unrecognized signature kind, using api");
            }
            SignatureKind::Api
        }
    }
}

/// An ordered list of request parameters, already rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureParams {
    pairs: Vec<(String, String)>,
}

impl SignatureParams {
    /// Create an empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter, keeping insertion order.
    pub fn push(&mut self, key: impl Into<String>, value: impl Display) -> &mut Self {
        self.pairs.push((key.into(), value.to_string()));
        self
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.push(key, value);
        self
    }

    /// Append every pair of a URL-encoded string (`a=1&b=2`), in order.
    pub fn extend_from_query(&mut self, query: &str) -> &mut Self {
        self.pairs.extend(
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        );
        self
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(_, v)| v.as_str())
    }

    /// Key/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for SignatureParams
where
    K: Into<String>,
    V: Display,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.push(k, v);
        }
        params
    }
}

/// Computes form and API signatures from the shared configuration.
#[derive(Debug, Clone)]
pub struct SignatureEngine {
    config: Arc<Configuration>,
    order_ids: OrderIdGenerator,
}

impl SignatureEngine {
    /// Create an engine. `policy` supplies order ids for form signatures
    /// when the caller does not pass one.
    pub fn new(config: Arc<Configuration>, policy: OrderIdPolicy) -> Self {
        Self {
            config,
            order_ids: OrderIdGenerator::new(policy),
        }
    }

    /// The configuration this engine signs with.
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// The order id generator used for form signatures.
    pub fn order_ids(&self) -> &OrderIdGenerator {
        &self.order_ids
    }

    /// Sign `params` as `kind`.
    ///
    /// For [`SignatureKind::Form`], `params` must contain `amount` and
    /// `currency`. A missing `order_id` is produced by the configured policy;
    /// under the custom policy that is an error.
    ///
    /// For [`SignatureKind::Api`], the values of `params` are signed as given;
    /// the caller must already have appended the secret. `order_id` is unused.
    pub fn sign(
        &self,
        kind: SignatureKind,
        params: &SignatureParams,
        order_id: Option<&OrderId>,
    ) -> Result<String, FreekassaError> {
        match kind {
            SignatureKind::Form => {
                let amount = required(params, "amount")?;
                let currency = required(params, "currency")?;
                let order_id = self.resolve_order_id(order_id)?;
                self.sign_form(amount, currency, &order_id)
            }
            SignatureKind::Api => Ok(sign_values(params.values())),
        }
    }

    /// The order id a form is signed with: `explicit` when given, otherwise
    /// one from the configured policy.
    ///
    /// Fails with [`FreekassaError::InvalidRequest`] under the custom policy
    /// when no id is given.
    pub fn resolve_order_id(&self, explicit: Option<&OrderId>) -> Result<OrderId, FreekassaError> {
        match explicit {
            Some(id) => Ok(id.clone()),
            None => self.order_ids.generate(None).ok_or_else(|| {
                FreekassaError::InvalidRequest(
                    "custom order id policy requires an explicit order id".to_string(),
                )
            }),
        }
    }

    /// Sign a payment form: `merchant_id:amount:first_secret:currency:order_id`.
    pub fn sign_form(
        &self,
        amount: impl Display,
        currency: impl Display,
        order_id: &OrderId,
    ) -> Result<String, FreekassaError> {
        let merchant_id = self.config.merchant_id.to_string();
        let amount = amount.to_string();
        let currency = currency.to_string();
        let order_id = order_id.to_string();
        Ok(sign_values([
            merchant_id.as_str(),
            amount.as_str(),
            self.config.first_secret()?,
            currency.as_str(),
            order_id.as_str(),
        ]))
    }

    /// Sign an API request: the parameter values followed by the API key.
    pub fn sign_request(&self, params: &SignatureParams) -> Result<String, FreekassaError> {
        let api_key = self.config.api_key()?;
        Ok(sign_values(params.values().chain([api_key])))
    }
}

fn required<'a>(params: &'a SignatureParams, key: &str) -> Result<&'a str, FreekassaError> {
    params
        .get(key)
        .ok_or_else(|| FreekassaError::InvalidRequest(format!("missing `{key}` for signature")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(policy: OrderIdPolicy) -> SignatureEngine {
        let config = Configuration::builder()
            .merchant_id(1)
            .first_secret("s")
            .api_key("key")
            .build()
            .unwrap();
        SignatureEngine::new(Arc::new(config), policy)
    }

    fn form_params(amount: &str, currency: &str) -> SignatureParams {
        SignatureParams::new()
            .with("amount", amount)
            .with("currency", currency)
    }

    #[test]
    fn test_md5_hex_known_vector() {
        assert_eq!(md5_hex(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_hex("abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_sign_values_joins_with_colon() {
        assert_eq!(sign_values(["a", "b", "c"]), md5_hex("a:b:c"));
        assert_eq!(sign_values([1, 2]), md5_hex("1:2"));
    }

    #[test]
    fn test_form_signature_consistency() {
        let engine = engine(OrderIdPolicy::RandomInt);
        let params = form_params("10", "RUB");
        let order_id = OrderId::Number(5);

        let sig1 = engine
            .sign(SignatureKind::Form, &params, Some(&order_id))
            .unwrap();
        let sig2 = engine
            .sign(SignatureKind::Form, &params, Some(&order_id))
            .unwrap();

        assert_eq!(sig1, sig2);
        assert_eq!(sig1, md5_hex("1:10:s:RUB:5"));
    }

    #[test]
    fn test_form_signature_changes_with_each_input() {
        let base = engine(OrderIdPolicy::RandomInt);
        let order_id = OrderId::Number(5);
        let reference = base
            .sign(SignatureKind::Form, &form_params("10", "RUB"), Some(&order_id))
            .unwrap();

        let other_amount = base
            .sign(SignatureKind::Form, &form_params("11", "RUB"), Some(&order_id))
            .unwrap();
        let other_currency = base
            .sign(SignatureKind::Form, &form_params("10", "USD"), Some(&order_id))
            .unwrap();
        let other_order = base
            .sign(
                SignatureKind::Form,
                &form_params("10", "RUB"),
                Some(&OrderId::Number(6)),
            )
            .unwrap();

        let other_merchant = SignatureEngine::new(
            Arc::new(
                Configuration::builder()
                    .merchant_id(2)
                    .first_secret("s")
                    .build()
                    .unwrap(),
            ),
            OrderIdPolicy::RandomInt,
        )
        .sign(SignatureKind::Form, &form_params("10", "RUB"), Some(&order_id))
        .unwrap();
        let other_secret = SignatureEngine::new(
            Arc::new(
                Configuration::builder()
                    .merchant_id(1)
                    .first_secret("t")
                    .build()
                    .unwrap(),
            ),
            OrderIdPolicy::RandomInt,
        )
        .sign(SignatureKind::Form, &form_params("10", "RUB"), Some(&order_id))
        .unwrap();

        for other in [
            other_amount,
            other_currency,
            other_order,
            other_merchant,
            other_secret,
        ] {
            assert_ne!(reference, other);
        }
    }

    #[test]
    fn test_form_signature_generates_order_id() {
        let engine = engine(OrderIdPolicy::RandomIntHash);
        let signature = engine
            .sign(SignatureKind::Form, &form_params("10", "RUB"), None)
            .unwrap();
        assert_eq!(signature.len(), 32);
    }

    #[test]
    fn test_form_signature_custom_policy_requires_order_id() {
        let engine = engine(OrderIdPolicy::Custom);
        let result = engine.sign(SignatureKind::Form, &form_params("10", "RUB"), None);
        assert!(matches!(result, Err(FreekassaError::InvalidRequest(_))));
    }

    #[test]
    fn test_resolve_order_id() {
        let explicit = OrderId::from("shop-7");
        let random = engine(OrderIdPolicy::RandomInt);
        assert_eq!(random.resolve_order_id(Some(&explicit)).unwrap(), explicit);
        assert!(matches!(
            random.resolve_order_id(None).unwrap(),
            OrderId::Number(n) if n <= crate::auth::MAX_RANDOM_ORDER_ID
        ));

        let custom = engine(OrderIdPolicy::Custom);
        assert_eq!(custom.resolve_order_id(Some(&explicit)).unwrap(), explicit);
        assert!(matches!(
            custom.resolve_order_id(None),
            Err(FreekassaError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_form_signature_missing_amount() {
        let engine = engine(OrderIdPolicy::RandomInt);
        let params = SignatureParams::new().with("currency", "RUB");
        let result = engine.sign(SignatureKind::Form, &params, Some(&OrderId::Number(1)));
        assert!(matches!(result, Err(FreekassaError::InvalidRequest(_))));
    }

    #[test]
    fn test_api_signature_is_positional() {
        let engine = engine(OrderIdPolicy::RandomInt);
        let ab = SignatureParams::new().with("a", 1).with("b", 2);
        let ba = SignatureParams::new().with("b", 2).with("a", 1);

        let sig_ab = engine.sign(SignatureKind::Api, &ab, None).unwrap();
        let sig_ba = engine.sign(SignatureKind::Api, &ba, None).unwrap();

        assert_eq!(sig_ab, md5_hex("1:2"));
        assert_ne!(sig_ab, sig_ba);
    }

    #[test]
    fn test_sign_request_appends_api_key() {
        let engine = engine(OrderIdPolicy::RandomInt);
        let params = SignatureParams::new().with("shopId", 1).with("nonce", 7);
        assert_eq!(
            engine.sign_request(&params).unwrap(),
            md5_hex("1:7:key")
        );
    }

    #[test]
    fn test_signature_kind_fallthrough() {
        assert_eq!(SignatureKind::from_name("form"), SignatureKind::Form);
        assert_eq!(SignatureKind::from_name("api"), SignatureKind::Api);
        assert_eq!(SignatureKind::from_name("whatever"), SignatureKind::Api);
    }

    #[test]
    fn test_params_from_query_keeps_order() {
        let mut params = SignatureParams::new();
        params.extend_from_query("z=1&a=two%20words&m=3");
        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
        assert_eq!(params.get("a"), Some("two words"));
    }
}
