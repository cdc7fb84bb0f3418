//! Client-side order identifiers.
//!
//! Every payment needs a merchant order id (`o` on the payment form). The
//! gateway does not care how it is produced, so the client offers a few
//! policies and lets callers bring their own.

use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, de};
use time::OffsetDateTime;

use crate::auth::signature::md5_hex;
use crate::error::FreekassaError;

/// Upper bound (inclusive) of randomly generated order ids.
pub const MAX_RANDOM_ORDER_ID: u64 = 1 << 32;

/// A merchant order identifier.
///
/// The gateway accepts both numbers and strings; [`Display`](std::fmt::Display)
/// gives the canonical text used in signatures and URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum OrderId {
    /// Numeric order id.
    Number(u64),
    /// Free-form order id, e.g. a hex digest.
    Text(String),
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderId::Number(n) => write!(f, "{n}"),
            OrderId::Text(s) => f.write_str(s),
        }
    }
}

// Goes through `Value` because untagged numbers break under arbitrary_precision.
impl<'de> Deserialize<'de> for OrderId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Number(n) => match n.as_u64() {
                Some(n) => Ok(OrderId::Number(n)),
                None => Ok(OrderId::Text(n.to_string())),
            },
            serde_json::Value::String(s) => Ok(OrderId::Text(s)),
            other => Err(de::Error::custom(format!(
                "expected order id number or string, got {other}"
            ))),
        }
    }
}

impl From<u64> for OrderId {
    fn from(value: u64) -> Self {
        OrderId::Number(value)
    }
}

impl From<String> for OrderId {
    fn from(value: String) -> Self {
        OrderId::Text(value)
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        OrderId::Text(value.to_string())
    }
}

/// How order ids are produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OrderIdPolicy {
    /// Uniformly random integer in `[0, 2^32]`.
    #[default]
    RandomInt,
    /// MD5 hex digest of the current unix time.
    TimeHash,
    /// MD5 hex digest of a random integer in `[0, 2^32]`.
    RandomIntHash,
    /// Caller-supplied id.
    Custom,
}

impl OrderIdPolicy {
    /// Legacy numeric code of the policy.
    pub fn code(&self) -> u8 {
        match self {
            OrderIdPolicy::RandomInt => 1,
            OrderIdPolicy::TimeHash => 2,
            OrderIdPolicy::RandomIntHash => 3,
            OrderIdPolicy::Custom => 4,
        }
    }
}

impl TryFrom<u8> for OrderIdPolicy {
    type Error = FreekassaError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(OrderIdPolicy::RandomInt),
            2 => Ok(OrderIdPolicy::TimeHash),
            3 => Ok(OrderIdPolicy::RandomIntHash),
            4 => Ok(OrderIdPolicy::Custom),
            other => Err(FreekassaError::Configuration(format!(
                "unknown order id policy code: {other}"
            ))),
        }
    }
}

impl FromStr for OrderIdPolicy {
    type Err = FreekassaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "random_int" => Ok(OrderIdPolicy::RandomInt),
            "time_hash" => Ok(OrderIdPolicy::TimeHash),
            "random_int_hash" => Ok(OrderIdPolicy::RandomIntHash),
            "custom" => Ok(OrderIdPolicy::Custom),
            other => match other.parse::<u8>() {
                Ok(code) => Self::try_from(code),
                Err(_) => Err(FreekassaError::Configuration(format!(
                    "unknown order id policy: {other:?}"
                ))),
            },
        }
    }
}

/// Produces order ids under a fixed policy. Calls are independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderIdGenerator {
    policy: OrderIdPolicy,
}

impl OrderIdGenerator {
    /// Create a generator for `policy`.
    pub fn new(policy: OrderIdPolicy) -> Self {
        Self { policy }
    }

    /// The active policy.
    pub fn policy(&self) -> OrderIdPolicy {
        self.policy
    }

    /// Produce an order id.
    ///
    /// `custom` is only consulted under [`OrderIdPolicy::Custom`], where it is
    /// returned unchanged (including `None`). Every other policy always
    /// returns `Some`.
    pub fn generate(&self, custom: Option<OrderId>) -> Option<OrderId> {
        match self.policy {
            OrderIdPolicy::RandomInt => Some(OrderId::Number(random_int())),
            OrderIdPolicy::TimeHash => Some(OrderId::Text(md5_hex(&unix_time_text()))),
            OrderIdPolicy::RandomIntHash => {
                Some(OrderId::Text(md5_hex(&random_int().to_string())))
            }
            OrderIdPolicy::Custom => custom,
        }
    }
}

fn random_int() -> u64 {
    rand::thread_rng().gen_range(0..=MAX_RANDOM_ORDER_ID)
}

/// Current unix time as fractional seconds, e.g. `1700000000.123456`.
fn unix_time_text() -> String {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    let secs = nanos.div_euclid(1_000_000_000);
    let micros = nanos.rem_euclid(1_000_000_000) / 1_000;
    format!("{secs}.{micros:06}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_md5_hex(s: &str) -> bool {
        s.len() == 32 && s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    }

    #[test]
    fn test_random_int_in_range() {
        let generator = OrderIdGenerator::new(OrderIdPolicy::RandomInt);
        for _ in 0..1000 {
            match generator.generate(None) {
                Some(OrderId::Number(n)) => assert!(n <= MAX_RANDOM_ORDER_ID),
                other => panic!("unexpected order id: {other:?}"),
            }
        }
    }

    #[test]
    fn test_hash_policies_are_hex() {
        for policy in [OrderIdPolicy::TimeHash, OrderIdPolicy::RandomIntHash] {
            let generator = OrderIdGenerator::new(policy);
            match generator.generate(Some(OrderId::from("ignored"))) {
                Some(OrderId::Text(s)) => assert!(is_md5_hex(&s), "not md5 hex: {s}"),
                other => panic!("unexpected order id: {other:?}"),
            }
        }
    }

    #[test]
    fn test_custom_passthrough() {
        let generator = OrderIdGenerator::new(OrderIdPolicy::Custom);
        assert_eq!(
            generator.generate(Some(OrderId::from("order-7"))),
            Some(OrderId::Text("order-7".to_string()))
        );
        assert_eq!(
            generator.generate(Some(OrderId::from(7))),
            Some(OrderId::Number(7))
        );
        assert_eq!(generator.generate(None), None);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "random_int_hash".parse::<OrderIdPolicy>().unwrap(),
            OrderIdPolicy::RandomIntHash
        );
        assert_eq!("4".parse::<OrderIdPolicy>().unwrap(), OrderIdPolicy::Custom);
        assert_eq!(OrderIdPolicy::TimeHash.code(), 2);
        assert!(matches!(
            "uuid".parse::<OrderIdPolicy>(),
            Err(FreekassaError::Configuration(_))
        ));
        assert!(OrderIdPolicy::try_from(9).is_err());
    }

    #[test]
    fn test_unix_time_text_format() {
        let text = unix_time_text();
        let (secs, micros) = text.split_once('.').unwrap();
        assert!(secs.parse::<i64>().unwrap() > 1_600_000_000);
        assert_eq!(micros.len(), 6);
    }

    #[test]
    fn test_order_id_display_and_serde() {
        assert_eq!(OrderId::Number(5).to_string(), "5");
        assert_eq!(OrderId::from("abc").to_string(), "abc");
        let parsed: OrderId = serde_json::from_str("123").unwrap();
        assert_eq!(parsed, OrderId::Number(123));
        let parsed: OrderId = serde_json::from_str("\"x-1\"").unwrap();
        assert_eq!(parsed, OrderId::Text("x-1".to_string()));
    }
}
