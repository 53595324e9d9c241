//! Typed leaf values and their wire representation.
//!
//! Every attribute and text value in the element graph is a [`Value`] whose
//! variant matches the [`ValueType`] declared by its key. Conversion to and
//! from the strings found in XML happens only through [`from_wire`] and
//! [`to_wire`], so the parser and serializer agree on every literal.
//!
//! | Type | Wire form |
//! |------|-----------|
//! | `F32`/`F64` | decimal, `INF`, `-INF`, `NaN` |
//! | `Bool` | `true`; any other text reads as false |
//! | `Char` | exactly one Unicode scalar |
//! | `DateTime` | RFC 3339, or a bare `YYYY-MM-DD` date |

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Timelike, Utc};
use rust_decimal::Decimal;

use crate::error::{ModelError, Result};

/// Declared type of an attribute or element text value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueType {
    Text,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    BigInteger,
    Decimal,
    F32,
    F64,
    Char,
    Bool,
    DateTime,
    /// The element carries no text value.
    Void,
    /// A caller-defined type with no built-in coercion.
    Other(&'static str),
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Text => "text",
            ValueType::I8 => "i8",
            ValueType::I16 => "i16",
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::U8 => "u8",
            ValueType::U16 => "u16",
            ValueType::U32 => "u32",
            ValueType::U64 => "u64",
            ValueType::BigInteger => "big integer",
            ValueType::Decimal => "decimal",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::Char => "char",
            ValueType::Bool => "bool",
            ValueType::DateTime => "date-time",
            ValueType::Void => "void",
            ValueType::Other(name) => name,
        };
        f.write_str(name)
    }
}

/// An RFC 3339 timestamp, remembering whether it was written as a bare date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    value: DateTime<FixedOffset>,
    date_only: bool,
}

impl Timestamp {
    pub fn new(value: DateTime<FixedOffset>) -> Self {
        Self {
            value,
            date_only: false,
        }
    }

    /// A calendar date, written without a time part.
    pub fn date(date: NaiveDate) -> Self {
        let value = date
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
            .and_utc()
            .fixed_offset();
        Self {
            value,
            date_only: true,
        }
    }

    pub fn value(&self) -> DateTime<FixedOffset> {
        self.value
    }

    pub fn is_date_only(&self) -> bool {
        self.date_only
    }

    /// Parses an RFC 3339 timestamp, a timestamp without offset (read as UTC)
    /// or a bare date.
    pub fn parse(text: &str) -> Result<Self> {
        if let Ok(value) = DateTime::parse_from_rfc3339(text) {
            return Ok(Self::new(value));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Self::new(naive.and_utc().fixed_offset()));
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Self::date)
            .map_err(|e| invalid(text, ValueType::DateTime, e))
    }

    /// Formats as RFC 3339 with millisecond precision, `Z` for UTC.
    pub fn to_rfc3339(&self) -> String {
        if self.date_only {
            return self.value.format("%Y-%m-%d").to_string();
        }
        let fraction = if self.value.nanosecond() % 1_000_000 == 0 {
            "%.3f"
        } else {
            "%.f"
        };
        let zone = if self.value.offset().fix().local_minus_utc() == 0 {
            "Z"
        } else {
            "%:z"
        };
        self.value
            .format(&format!("%Y-%m-%dT%H:%M:%S{fraction}{zone}"))
            .to_string()
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::new(value)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self::new(value.fixed_offset())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

/// A typed attribute or text value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    /// Integer held as a zero-scale decimal.
    BigInteger(Decimal),
    Decimal(Decimal),
    F32(f32),
    F64(f64),
    Char(char),
    Bool(bool),
    DateTime(Timestamp),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Text(_) => ValueType::Text,
            Value::I8(_) => ValueType::I8,
            Value::I16(_) => ValueType::I16,
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::U8(_) => ValueType::U8,
            Value::U16(_) => ValueType::U16,
            Value::U32(_) => ValueType::U32,
            Value::U64(_) => ValueType::U64,
            Value::BigInteger(_) => ValueType::BigInteger,
            Value::Decimal(_) => ValueType::Decimal,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
            Value::Char(_) => ValueType::Char,
            Value::Bool(_) => ValueType::Bool,
            Value::DateTime(_) => ValueType::DateTime,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Any integer variant that fits in an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I8(v) => Some(v.into()),
            Value::I16(v) => Some(v.into()),
            Value::I32(v) => Some(v.into()),
            Value::I64(v) => Some(v),
            Value::U8(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::U64(v) => i64::try_from(v).ok(),
            Value::BigInteger(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v.into()),
            Value::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match *self {
            Value::BigInteger(v) | Value::Decimal(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            Value::DateTime(t) => Some(t),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::Char(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self {
        Value::DateTime(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_wire(self))
    }
}

fn invalid(text: &str, value_type: ValueType, reason: impl fmt::Display) -> ModelError {
    ModelError::InvalidLiteral {
        value: text.to_string(),
        value_type,
        reason: reason.to_string(),
    }
}

fn parse_number<T>(text: &str, value_type: ValueType) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    text.trim()
        .parse::<T>()
        .map_err(|e| invalid(text, value_type, e))
}

fn parse_float<T>(text: &str, value_type: ValueType, inf: T, nan: T) -> Result<T>
where
    T: std::str::FromStr + std::ops::Neg<Output = T>,
    T::Err: fmt::Display,
{
    match text.trim() {
        "INF" => Ok(inf),
        "-INF" => Ok(-inf),
        "NaN" => Ok(nan),
        trimmed => {
            // str::parse accepts "inf", "infinity" and "nan" in any case
            if trimmed
                .chars()
                .any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
            {
                return Err(invalid(text, value_type, "not a number"));
            }
            parse_number(trimmed, value_type)
        }
    }
}

fn parse_decimal(text: &str, value_type: ValueType) -> Result<Decimal> {
    let trimmed = text.trim();
    trimmed
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|e| invalid(text, value_type, e))
}

/// Converts a wire string into a value of the declared type.
pub fn from_wire(text: &str, value_type: ValueType) -> Result<Value> {
    let value = match value_type {
        ValueType::Text => Value::Text(text.to_string()),
        ValueType::I8 => Value::I8(parse_number(text, value_type)?),
        ValueType::I16 => Value::I16(parse_number(text, value_type)?),
        ValueType::I32 => Value::I32(parse_number(text, value_type)?),
        ValueType::I64 => Value::I64(parse_number(text, value_type)?),
        ValueType::U8 => Value::U8(parse_number(text, value_type)?),
        ValueType::U16 => Value::U16(parse_number(text, value_type)?),
        ValueType::U32 => Value::U32(parse_number(text, value_type)?),
        ValueType::U64 => Value::U64(parse_number(text, value_type)?),
        ValueType::BigInteger => {
            if text.contains(['.', 'e', 'E']) {
                return Err(invalid(text, value_type, "not an integer"));
            }
            Value::BigInteger(parse_decimal(text, value_type)?)
        }
        ValueType::Decimal => Value::Decimal(parse_decimal(text, value_type)?),
        ValueType::F32 => Value::F32(parse_float(text, value_type, f32::INFINITY, f32::NAN)?),
        ValueType::F64 => Value::F64(parse_float(text, value_type, f64::INFINITY, f64::NAN)?),
        ValueType::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Value::Char(c),
                _ => return Err(invalid(text, value_type, "expected exactly one character")),
            }
        }
        ValueType::Bool => Value::Bool(text == "true"),
        ValueType::DateTime => Value::DateTime(Timestamp::parse(text.trim())?),
        ValueType::Void | ValueType::Other(_) => {
            return Err(ModelError::UnsupportedType(value_type));
        }
    };
    Ok(value)
}

fn float_to_wire(v: f64) -> String {
    if v == f64::INFINITY {
        "INF".to_string()
    } else if v == f64::NEG_INFINITY {
        "-INF".to_string()
    } else if v.is_nan() {
        "NaN".to_string()
    } else {
        v.to_string()
    }
}

/// Converts a value into its wire string. The output is accepted by [`from_wire`].
pub fn to_wire(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Text(s) => Cow::Borrowed(s),
        Value::I8(v) => Cow::Owned(v.to_string()),
        Value::I16(v) => Cow::Owned(v.to_string()),
        Value::I32(v) => Cow::Owned(v.to_string()),
        Value::I64(v) => Cow::Owned(v.to_string()),
        Value::U8(v) => Cow::Owned(v.to_string()),
        Value::U16(v) => Cow::Owned(v.to_string()),
        Value::U32(v) => Cow::Owned(v.to_string()),
        Value::U64(v) => Cow::Owned(v.to_string()),
        Value::BigInteger(v) | Value::Decimal(v) => Cow::Owned(v.to_string()),
        Value::F32(v) if v.is_finite() => Cow::Owned(v.to_string()),
        Value::F32(v) => Cow::Owned(float_to_wire(f64::from(*v))),
        Value::F64(v) => Cow::Owned(float_to_wire(*v)),
        Value::Char(c) => Cow::Owned(c.to_string()),
        Value::Bool(true) => Cow::Borrowed("true"),
        Value::Bool(false) => Cow::Borrowed("false"),
        Value::DateTime(t) => Cow::Owned(t.to_rfc3339()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_infinity_tokens() {
        assert_eq!(
            from_wire("INF", ValueType::F64).unwrap(),
            Value::F64(f64::INFINITY)
        );
        assert_eq!(
            from_wire("-INF", ValueType::F64).unwrap(),
            Value::F64(f64::NEG_INFINITY)
        );
        assert_eq!(
            from_wire("INF", ValueType::F32).unwrap(),
            Value::F32(f32::INFINITY)
        );
        assert_eq!(to_wire(&Value::F64(f64::INFINITY)), "INF");
        assert_eq!(to_wire(&Value::F64(f64::NEG_INFINITY)), "-INF");
        assert_eq!(to_wire(&Value::F32(f32::NEG_INFINITY)), "-INF");
    }

    #[test]
    fn test_infinity_tokens_are_case_sensitive() {
        for literal in ["inf", "Inf", "-inf", "Infinity", "nan"] {
            let err = from_wire(literal, ValueType::F64).unwrap_err();
            assert!(matches!(err, ModelError::InvalidLiteral { .. }), "{literal}");
        }
    }

    #[test]
    fn test_nan_round_trip() {
        let value = from_wire("NaN", ValueType::F64).unwrap();
        assert!(value.as_f64().unwrap().is_nan());
        assert_eq!(to_wire(&value), "NaN");
    }

    #[test]
    fn test_floats() {
        assert_eq!(from_wire("1.5e3", ValueType::F64).unwrap(), Value::F64(1500.0));
        assert_eq!(to_wire(&Value::F64(0.25)), "0.25");
        assert!(from_wire("abc", ValueType::F64).is_err());
    }

    #[test]
    fn test_integers() {
        assert_eq!(from_wire("-12", ValueType::I32).unwrap(), Value::I32(-12));
        assert_eq!(from_wire("255", ValueType::U8).unwrap(), Value::U8(255));
        assert!(from_wire("256", ValueType::U8).is_err());
        assert!(from_wire("-1", ValueType::U64).is_err());
        assert!(from_wire("1.0", ValueType::I64).is_err());
    }

    #[test]
    fn test_arbitrary_precision() {
        assert_eq!(
            from_wire("12345678901234567890123", ValueType::BigInteger).unwrap(),
            Value::BigInteger(dec!(12345678901234567890123))
        );
        assert!(from_wire("1.5", ValueType::BigInteger).is_err());
        let value = from_wire("3.14159", ValueType::Decimal).unwrap();
        assert_eq!(value, Value::Decimal(dec!(3.14159)));
        assert_eq!(to_wire(&value), "3.14159");
        assert_eq!(
            from_wire("1.5E2", ValueType::Decimal).unwrap(),
            Value::Decimal(dec!(150))
        );
    }

    #[test]
    fn test_character() {
        assert_eq!(from_wire("é", ValueType::Char).unwrap(), Value::Char('é'));
        assert!(matches!(
            from_wire("ab", ValueType::Char),
            Err(ModelError::InvalidLiteral { .. })
        ));
        assert!(from_wire("", ValueType::Char).is_err());
    }

    #[test]
    fn test_boolean_never_fails() {
        assert_eq!(from_wire("true", ValueType::Bool).unwrap(), Value::Bool(true));
        assert_eq!(from_wire("TRUE", ValueType::Bool).unwrap(), Value::Bool(false));
        assert_eq!(from_wire("yes", ValueType::Bool).unwrap(), Value::Bool(false));
        assert_eq!(to_wire(&Value::Bool(true)), "true");
    }

    #[test]
    fn test_timestamps() {
        let value = from_wire("2024-03-01T10:15:30Z", ValueType::DateTime).unwrap();
        assert_eq!(to_wire(&value), "2024-03-01T10:15:30.000Z");

        let value = from_wire("2024-03-01T10:15:30.250+02:00", ValueType::DateTime).unwrap();
        assert_eq!(to_wire(&value), "2024-03-01T10:15:30.250+02:00");

        let value = from_wire("2024-03-01", ValueType::DateTime).unwrap();
        assert!(value.as_timestamp().unwrap().is_date_only());
        assert_eq!(to_wire(&value), "2024-03-01");

        assert!(matches!(
            from_wire("yesterday", ValueType::DateTime),
            Err(ModelError::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn test_timestamp_round_trip() {
        let value = from_wire("2024-03-01T10:15:30.123456Z", ValueType::DateTime).unwrap();
        let again = from_wire(&to_wire(&value), ValueType::DateTime).unwrap();
        assert_eq!(value, again);
    }

    #[test]
    fn test_unsupported_types() {
        assert_eq!(
            from_wire("x", ValueType::Void),
            Err(ModelError::UnsupportedType(ValueType::Void))
        );
        assert_eq!(
            from_wire("x", ValueType::Other("geo")),
            Err(ModelError::UnsupportedType(ValueType::Other("geo")))
        );
    }
}
