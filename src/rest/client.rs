//! FreeKassa REST API client implementation.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::{
    RetryDecision, RetryPolicy, Retryable, default_on_request_failure,
    default_on_request_success,
};
use reqwest_tracing::TracingMiddleware;
use serde_json::Value;
use url::Url;

use crate::auth::{
    FileNonceStore, NonceProvider, OrderIdPolicy, SignatureEngine, SignatureParams,
};
use crate::config::Configuration;
use crate::error::{ApiError, FreekassaError};
use crate::rest::endpoints::{FREEKASSA_API_URL, FREEKASSA_FORM_URL};

/// Value of the response `type` field on success.
const SUCCESS: &str = "success";

/// Whether a signed call may be sent again after a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// Read-only call; retried with a freshly signed request and a new nonce.
    Retry,
    /// Call that creates something at the gateway; sent exactly once.
    AtMostOnce,
}

/// The FreeKassa API client.
///
/// Every API call takes the next nonce, signs the parameters with the API key
/// and POSTs them as a query string. The payment form URL is built and signed
/// locally.
///
/// # Example
///
/// ```rust,no_run
/// use freekassa_api_client::config::Configuration;
/// use freekassa_api_client::rest::FreekassaClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Configuration::builder()
///         .merchant_id(42)
///         .first_secret("form_secret")
///         .api_key("api_key")
///         .nonce_path("/var/lib/shop/nonce")
///         .build()?;
///     let client = FreekassaClient::new(config);
///
///     for balance in client.get_balance().await? {
///         println!("{}: {}", balance.currency, balance.value);
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct FreekassaClient {
    http_client: ClientWithMiddleware,
    base_url: String,
    form_url: String,
    signer: SignatureEngine,
    nonce_provider: Arc<dyn NonceProvider>,
    retry_policy: ExponentialBackoff,
}

impl FreekassaClient {
    /// Create a client with default settings.
    pub fn new(config: impl Into<Arc<Configuration>>) -> Self {
        Self::builder(config).build()
    }

    /// Create a new client builder.
    pub fn builder(config: impl Into<Arc<Configuration>>) -> FreekassaClientBuilder {
        FreekassaClientBuilder::new(config.into())
    }

    /// The configuration this client signs with.
    pub fn config(&self) -> &Configuration {
        self.signer.config()
    }

    /// The signing engine (also owns the order id policy).
    pub fn signer(&self) -> &SignatureEngine {
        &self.signer
    }

    pub(crate) fn form_url(&self) -> &str {
        &self.form_url
    }

    /// Assemble the signed parameter list for an API call.
    ///
    /// Order: `shopId`, `nonce`, the request fields, then `signature`.
    pub(crate) async fn signed_params<P>(&self, params: &P) -> Result<SignatureParams, FreekassaError>
    where
        P: serde::Serialize + ?Sized,
    {
        // Fail before consuming a nonce.
        self.config().api_key()?;
        let fields = serde_urlencoded::to_string(params)
            .map_err(|e| FreekassaError::InvalidRequest(e.to_string()))?;

        let nonce = self.nonce_provider.next_nonce().await?;
        let mut signed = SignatureParams::new()
            .with("shopId", self.config().merchant_id)
            .with("nonce", nonce);
        signed.extend_from_query(&fields);

        let signature = self.signer.sign_request(&signed)?;
        signed.push("signature", signature);
        Ok(signed)
    }

    /// POST a signed request and return the raw JSON body.
    ///
    /// Every attempt is signed with its own nonce, so a retried request is
    /// never a replay of the previous one. Under [`Delivery::AtMostOnce`]
    /// transient failures are returned to the caller instead of retried.
    ///
    /// The body is returned whatever its `type`; see [`Self::private_post`].
    pub(crate) async fn signed_post<P>(
        &self,
        endpoint: &str,
        params: &P,
        delivery: Delivery,
    ) -> Result<Value, FreekassaError>
    where
        P: serde::Serialize + ?Sized,
    {
        let started = SystemTime::now();
        let mut past_retries = 0;
        loop {
            let signed = self.signed_params(params).await?;
            let url =
                Url::parse_with_params(&format!("{}{}", self.base_url, endpoint), signed.iter())?;

            tracing::debug!(endpoint, attempt = past_retries + 1, "sending signed request");
            let outcome = self.http_client.post(url).send().await;

            let retryable = match &outcome {
                Ok(response) => default_on_request_success(response),
                Err(error) => default_on_request_failure(error),
            };

            if retryable == Some(Retryable::Transient) && delivery == Delivery::Retry {
                if let RetryDecision::Retry { execute_after } =
                    self.retry_policy.should_retry(started, past_retries)
                {
                    let delay = execute_after
                        .duration_since(SystemTime::now())
                        .unwrap_or_default();
                    tracing::debug!(endpoint, ?delay, "retrying transient failure");
                    tokio::time::sleep(delay).await;
                    past_retries += 1;
                    continue;
                }
            }

            return self.parse_response(outcome?).await;
        }
    }

    /// POST a signed request, require `"type": "success"` and return `field`
    /// (or the whole body when `field` is `None`) deserialized as `T`.
    pub(crate) async fn private_post<T, P>(
        &self,
        endpoint: &str,
        params: &P,
        field: Option<&str>,
        delivery: Delivery,
    ) -> Result<T, FreekassaError>
    where
        T: serde::de::DeserializeOwned,
        P: serde::Serialize + ?Sized,
    {
        let mut body = self.signed_post(endpoint, params, delivery).await?;
        ensure_success(endpoint, &body)?;

        let payload = match field {
            Some(field) => body
                .get_mut(field)
                .map(Value::take)
                .ok_or_else(|| {
                    FreekassaError::InvalidResponse(format!("Response missing '{field}' field"))
                })?,
            None => body,
        };
        Ok(serde_json::from_value(payload)?)
    }

    /// Parse a response body as JSON.
    async fn parse_response(&self, response: reqwest::Response) -> Result<Value, FreekassaError> {
        let status = response.status();
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                FreekassaError::InvalidResponse(format!(
                    "Failed to parse response: {}. Body: {}",
                    e, body
                ))
            } else {
                FreekassaError::InvalidResponse(format!("HTTP {}: {}", status, body))
            }
        })
    }
}

/// Whether a response body reports success.
pub(crate) fn is_success(body: &Value) -> bool {
    body.get("type").and_then(Value::as_str) == Some(SUCCESS)
}

fn ensure_success(endpoint: &str, body: &Value) -> Result<(), FreekassaError> {
    if is_success(body) {
        return Ok(());
    }
    let error = ApiError::from_body(body);
    tracing::warn!(endpoint, kind = %error.kind, "gateway rejected request");
    Err(FreekassaError::Api(error))
}

impl std::fmt::Debug for FreekassaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreekassaClient")
            .field("base_url", &self.base_url)
            .field("form_url", &self.form_url)
            .field("merchant_id", &self.config().merchant_id)
            .field("order_id_policy", &self.signer.order_ids().policy())
            .finish()
    }
}

/// Builder for [`FreekassaClient`].
pub struct FreekassaClientBuilder {
    config: Arc<Configuration>,
    base_url: String,
    form_url: String,
    order_id_policy: OrderIdPolicy,
    nonce_provider: Option<Arc<dyn NonceProvider>>,
    user_agent: Option<String>,
    max_retries: u32,
    retry_bounds: (Duration, Duration),
    timeout: Option<Duration>,
}

impl FreekassaClientBuilder {
    /// Create a new builder with default settings.
    pub fn new(config: Arc<Configuration>) -> Self {
        Self {
            config,
            base_url: FREEKASSA_API_URL.to_string(),
            form_url: FREEKASSA_FORM_URL.to_string(),
            order_id_policy: OrderIdPolicy::default(),
            nonce_provider: None,
            user_agent: None,
            max_retries: 3,
            retry_bounds: (Duration::from_secs(1), Duration::from_secs(30)),
            timeout: None,
        }
    }

    /// Set the API base URL (useful for testing with a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = with_trailing_slash(url.into());
        self
    }

    /// Set the payment form base URL.
    pub fn form_url(mut self, url: impl Into<String>) -> Self {
        self.form_url = with_trailing_slash(url.into());
        self
    }

    /// Set how payment form order ids are generated.
    pub fn order_id_policy(mut self, policy: OrderIdPolicy) -> Self {
        self.order_id_policy = policy;
        self
    }

    /// Set a custom nonce provider.
    ///
    /// Defaults to a [`FileNonceStore`] built from the configuration.
    pub fn nonce_provider(mut self, provider: Arc<dyn NonceProvider>) -> Self {
        self.nonce_provider = Some(provider);
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the maximum number of retries for transient failures.
    ///
    /// Only read-only calls are retried. `create_order` and
    /// `create_withdrawal` are sent once; a transient failure there leaves the
    /// outcome unknown and must be resolved by listing orders or withdrawals.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the minimum and maximum backoff between retries.
    pub fn retry_bounds(mut self, min: Duration, max: Duration) -> Self {
        self.retry_bounds = (min, max.max(min));
        self
    }

    /// Set a per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> FreekassaClient {
        // Build default headers.
        let mut headers = HeaderMap::new();
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("freekassa-api-client/{}", env!("CARGO_PKG_VERSION")));
        let header_value = HeaderValue::from_str(&user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("freekassa-api-client"));
        headers.insert(USER_AGENT, header_value);

        // Build the HTTP client with middleware.
        let mut reqwest_builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = self.timeout {
            reqwest_builder = reqwest_builder.timeout(timeout);
        }
        let reqwest_client = reqwest_builder
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let (min_backoff, max_backoff) = self.retry_bounds;
        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(min_backoff, max_backoff)
            .build_with_max_retries(self.max_retries);

        let client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();

        let nonce_provider = self
            .nonce_provider
            .unwrap_or_else(|| Arc::new(FileNonceStore::from_config(&self.config)));

        FreekassaClient {
            http_client: client,
            base_url: self.base_url,
            form_url: self.form_url,
            signer: SignatureEngine::new(self.config, self.order_id_policy),
            nonce_provider,
            retry_policy,
        }
    }
}

fn with_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryNonce, md5_hex};

    fn client() -> FreekassaClient {
        let config = Configuration::builder()
            .merchant_id(7)
            .api_key("key")
            .build()
            .unwrap();
        FreekassaClient::builder(config)
            .nonce_provider(Arc::new(MemoryNonce::starting_after(99)))
            .build()
    }

    #[tokio::test]
    async fn test_signed_params_order_and_signature() {
        #[derive(serde::Serialize)]
        struct Params {
            page: u32,
        }

        let signed = client().signed_params(&Params { page: 3 }).await.unwrap();
        let keys: Vec<_> = signed.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["shopId", "nonce", "page", "signature"]);
        assert_eq!(signed.get("nonce"), Some("100"));
        assert_eq!(signed.get("signature"), Some(md5_hex("7:100:3:key").as_str()));
    }

    #[tokio::test]
    async fn test_missing_api_key_does_not_consume_nonce() {
        let nonces = Arc::new(MemoryNonce::new());
        let config = Configuration::builder().merchant_id(7).build().unwrap();
        let client = FreekassaClient::builder(config)
            .nonce_provider(nonces.clone())
            .build();

        #[derive(serde::Serialize)]
        struct Empty {}
        assert!(matches!(
            client.signed_params(&Empty {}).await,
            Err(FreekassaError::Configuration(_))
        ));
        assert_eq!(nonces.next_nonce().await.unwrap(), 1);
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = Configuration::builder().merchant_id(1).build().unwrap();
        let client = FreekassaClient::builder(config)
            .base_url("http://localhost:1234/v1")
            .build();
        assert_eq!(client.base_url, "http://localhost:1234/v1/");
    }

    #[test]
    fn test_is_success() {
        assert!(is_success(&serde_json::json!({"type": "success"})));
        assert!(!is_success(&serde_json::json!({"type": "error"})));
        assert!(!is_success(&serde_json::json!({})));
    }
}
