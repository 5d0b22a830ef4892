use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

/// Scalar value carried by a data source parameter or a generic row column.
///
/// Decimals are kept exact; JSON numbers are converted from their literal
/// text, never through `f64`, and decimals are written back as JSON numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    String(String),
}

impl Value {
    /// Convert one JSON element. Arrays and objects have no scalar form and
    /// are rendered as their JSON text.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    match decimal_from_literal(&n.to_string()) {
                        Some(d) => Self::Decimal(d),
                        None => Self::String(n.to_string()),
                    }
                }
            }
            serde_json::Value::String(s) => Self::String(s.clone()),
            other => Self::String(other.to_string()),
        }
    }

    /// Infer a scalar from free text: booleans, integers, decimals, then
    /// strings. Used for parameters typed on a command line.
    ///
    /// A number is inferred only when it renders back to exactly `text`, so
    /// `007123` or `1e3` stay strings.
    #[must_use]
    pub fn parse_literal(text: &str) -> Self {
        if text.eq_ignore_ascii_case("true") {
            return Self::Bool(true);
        }
        if text.eq_ignore_ascii_case("false") {
            return Self::Bool(false);
        }
        if let Ok(i) = text.parse::<i64>() {
            if i.to_string() == text {
                return Self::Int(i);
            }
        } else if let Ok(d) = Decimal::from_str_exact(text) {
            if d.to_string() == text {
                return Self::Decimal(d);
            }
        }
        Self::String(text.to_string())
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Int(i) => Some(Decimal::from(*i)),
            Self::Decimal(d) => Some(*d),
            Self::String(s) => decimal_from_literal(s.trim()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Decimal(d) => rust_decimal::serde::arbitrary_precision::serialize(d, serializer),
            Self::String(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    /// Strings stay strings even when they look numeric; numbers go through
    /// [`Value::from_json`] so their literal text is kept.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from_json(&json))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Self::Decimal(d)
    }
}

/// Parse a decimal literal exactly, accepting exponent notation.
pub(crate) fn decimal_from_literal(text: &str) -> Option<Decimal> {
    Decimal::from_str_exact(text)
        .or_else(|_| Decimal::from_str(text))
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn integers_stay_integers() {
        assert_eq!(Value::from_json(&json!(99999)), Value::Int(99_999));
    }

    #[test]
    fn decimals_keep_every_digit() {
        let parsed: serde_json::Value =
            serde_json::from_str("12.345678901234567890123").unwrap();
        let value = Value::from_json(&parsed);
        assert_eq!(value.to_string(), "12.345678901234567890123");
    }

    #[test]
    fn literal_inference() {
        assert_eq!(Value::parse_literal("TRUE"), Value::Bool(true));
        assert_eq!(Value::parse_literal("42"), Value::Int(42));
        assert_eq!(
            Value::parse_literal("1.50"),
            Value::Decimal(Decimal::from_str("1.50").unwrap())
        );
        assert_eq!(Value::parse_literal("S123456"), Value::from("S123456"));
        assert_eq!(Value::parse_literal("-17"), Value::Int(-17));
    }

    #[test]
    fn literals_that_do_not_render_back_stay_strings() {
        for text in ["007123", "+5", "-0", "1e3", "0.5e1", " 42", "1_000"] {
            assert_eq!(Value::parse_literal(text), Value::from(text), "{text}");
        }
    }

    #[test]
    fn display_is_wire_text() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::from("here").to_string(), "here");
    }

    #[test]
    fn serializes_as_plain_json() {
        let encoded = serde_json::to_string(&vec![
            Value::from("A"),
            Value::Int(7),
            Value::Bool(true),
            Value::Null,
        ])
        .unwrap();
        assert_eq!(encoded, r#"["A",7,true,null]"#);
    }

    #[test]
    fn decimals_serialize_as_numbers() {
        let value = Value::Decimal(Decimal::from_str("1.50").unwrap());
        assert_eq!(serde_json::to_string(&value).unwrap(), "1.50");
        let back: Value = serde_json::from_str("1.50").unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn numeric_strings_deserialize_as_strings() {
        let back: Value = serde_json::from_str(r#""42""#).unwrap();
        assert_eq!(back, Value::from("42"));
        let back: Value = serde_json::from_str(r#""1.50""#).unwrap();
        assert_eq!(back, Value::from("1.50"));
    }
}
