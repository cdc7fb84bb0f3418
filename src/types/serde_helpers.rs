//! Lenient serde helpers for FreeKassa's JSON.
//!
//! The gateway is inconsistent about scalar types: amounts arrive as numbers
//! or strings, ids as numbers or strings, and flags as `0`/`1` or booleans.
//! These helpers accept every variant seen in the wild. They go through
//! [`serde_json::Value`] so they keep working with `arbitrary_precision`.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, de};
use serde_json::Value;

fn value_to_text<E: de::Error>(value: Value) -> Result<Option<String>, E> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(de::Error::custom(format!(
            "expected a number or string, got {other}"
        ))),
    }
}

/// Deserialize a [`Decimal`] from a JSON number or a numeric string.
///
/// # Example
///
/// ```rust
/// use serde::Deserialize;
/// use rust_decimal::Decimal;
/// use freekassa_api_client::types::serde_helpers::decimal;
///
/// #[derive(Deserialize, Debug)]
/// struct Balance {
///     #[serde(deserialize_with = "decimal::deserialize")]
///     value: Decimal,
/// }
///
/// let a: Balance = serde_json::from_str(r#"{"value":"10.50"}"#).unwrap();
/// let b: Balance = serde_json::from_str(r#"{"value":10.50}"#).unwrap();
/// assert_eq!(a.value, b.value);
/// ```
pub mod decimal {
    use super::*;

    /// Deserialize a number or numeric string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = value_to_text::<D::Error>(Value::deserialize(deserializer)?)?
            .ok_or_else(|| de::Error::custom("expected a decimal, got nothing"))?;
        parse_decimal(&text).map_err(de::Error::custom)
    }

    pub(super) fn parse_decimal(text: &str) -> Result<Decimal, rust_decimal::Error> {
        Decimal::from_str(text).or_else(|_| Decimal::from_scientific(text))
    }
}

/// Like [`decimal`], but `null`, `""` and missing fields become `None`.
///
/// Use with `#[serde(default)]`.
pub mod option_decimal {
    use super::*;

    /// Deserialize an optional number or numeric string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match value_to_text::<D::Error>(Value::deserialize(deserializer)?)? {
            Some(text) => decimal::parse_decimal(&text)
                .map(Some)
                .map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}

/// Deserialize a string field that the gateway sometimes sends as a number.
///
/// `null` and `""` become `None`. Use with `#[serde(default)]`.
///
/// # Example
///
/// ```rust
/// use serde::Deserialize;
/// use freekassa_api_client::types::serde_helpers::string_or_number;
///
/// #[derive(Deserialize, Debug)]
/// struct Order {
///     #[serde(deserialize_with = "string_or_number::deserialize", default)]
///     account: Option<String>,
/// }
///
/// let order: Order = serde_json::from_str(r#"{"account":79990001122}"#).unwrap();
/// assert_eq!(order.account.as_deref(), Some("79990001122"));
/// ```
pub mod string_or_number {
    use super::*;

    /// Deserialize a number or string as text.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        value_to_text(Value::deserialize(deserializer)?)
    }
}

/// Deserialize an integer that may be quoted, e.g. `7` or `"7"`.
pub mod lenient_u64 {
    use super::*;

    /// Deserialize a number or numeric string as `u64`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = value_to_text::<D::Error>(Value::deserialize(deserializer)?)?
            .ok_or_else(|| de::Error::custom("expected an integer, got nothing"))?;
        text.trim().parse().map_err(de::Error::custom)
    }
}

/// Deserialize a flag sent as a boolean, `0`/`1`, or `"0"`/`"1"`.
///
/// Missing or `null` is `false`. Use with `#[serde(default)]`.
pub mod flag {
    use super::*;

    /// Deserialize a loosely typed flag.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(b),
            Value::Number(n) => n
                .as_f64()
                .map(|v| v != 0.0)
                .ok_or_else(|| de::Error::custom(format!("invalid flag: {n}"))),
            Value::String(s) => match s.trim() {
                "" | "0" | "false" => Ok(false),
                "1" | "true" => Ok(true),
                other => Err(de::Error::custom(format!("invalid flag: {other:?}"))),
            },
            other => Err(de::Error::custom(format!("invalid flag: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize, Debug)]
    struct Amounts {
        #[serde(deserialize_with = "decimal::deserialize")]
        amount: Decimal,
        #[serde(deserialize_with = "option_decimal::deserialize", default)]
        fee: Option<Decimal>,
    }

    #[test]
    fn test_decimal_from_number_and_string() {
        let a: Amounts = serde_json::from_str(r#"{"amount":100.25,"fee":"1.5"}"#).unwrap();
        assert_eq!(a.amount, Decimal::from_str("100.25").unwrap());
        assert_eq!(a.fee, Some(Decimal::from_str("1.5").unwrap()));
    }

    #[test]
    fn test_option_decimal_missing_and_empty() {
        let a: Amounts = serde_json::from_str(r#"{"amount":"1"}"#).unwrap();
        assert_eq!(a.fee, None);
        let a: Amounts = serde_json::from_str(r#"{"amount":"1","fee":""}"#).unwrap();
        assert_eq!(a.fee, None);
        let a: Amounts = serde_json::from_str(r#"{"amount":"1","fee":null}"#).unwrap();
        assert_eq!(a.fee, None);
    }

    #[test]
    fn test_decimal_rejects_garbage() {
        let result: Result<Amounts, _> = serde_json::from_str(r#"{"amount":"abc"}"#);
        assert!(result.is_err());
        let result: Result<Amounts, _> = serde_json::from_str(r#"{"amount":true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_lenient_u64() {
        #[derive(Deserialize)]
        struct Test {
            #[serde(deserialize_with = "lenient_u64::deserialize")]
            id: u64,
        }
        let t: Test = serde_json::from_str(r#"{"id":"42"}"#).unwrap();
        assert_eq!(t.id, 42);
        let t: Test = serde_json::from_str(r#"{"id":43}"#).unwrap();
        assert_eq!(t.id, 43);
    }

    #[test]
    fn test_flag_variants() {
        #[derive(Deserialize)]
        struct Test {
            #[serde(deserialize_with = "flag::deserialize", default)]
            enabled: bool,
        }
        for (json, expected) in [
            (r#"{"enabled":1}"#, true),
            (r#"{"enabled":0}"#, false),
            (r#"{"enabled":0.0}"#, false),
            (r#"{"enabled":-0}"#, false),
            (r#"{"enabled":2}"#, true),
            (r#"{"enabled":"1"}"#, true),
            (r#"{"enabled":true}"#, true),
            (r#"{}"#, false),
        ] {
            let t: Test = serde_json::from_str(json).unwrap();
            assert_eq!(t.enabled, expected, "{json}");
        }
    }
}
