use std::{fmt, str::FromStr};

use serde::{
    de::{self, DeserializeOwned},
    Deserialize, Deserializer,
};
use serde_json::{Number, Value};

/// Deserialize a comma-separated string into a vector of T, skipping blank entries.
pub fn deserialize_vec_from_string<'de, T, D>(d: D) -> Result<Vec<T>, D::Error>
where
    T: FromStr,
    T::Err: fmt::Display,
    D: Deserializer<'de>,
{
    String::deserialize(d)?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<T>().map_err(<D::Error as de::Error>::custom))
        .collect()
}

/// Deserialize a value, falling back to its default when it is `null` or malformed.
pub fn deserialize_lenient<'de, T, D>(d: D) -> Result<T, D::Error>
where
    T: DeserializeOwned + Default,
    D: Deserializer<'de>,
{
    Ok(serde_json::from_value(Value::deserialize(d)?).unwrap_or_default())
}

/// Deserialize an optional value, treating `null` and malformed values as absent.
pub fn deserialize_lenient_option<'de, T, D>(d: D) -> Result<Option<T>, D::Error>
where
    T: DeserializeOwned,
    D: Deserializer<'de>,
{
    match Value::deserialize(d)? {
        Value::Null => Ok(None),
        value => Ok(serde_json::from_value(value).ok()),
    }
}

/// Deserialize a list, replacing malformed entries with their default so the
/// position of the remaining entries is kept. Anything but an array is empty.
pub fn deserialize_lenient_vec<'de, T, D>(d: D) -> Result<Vec<T>, D::Error>
where
    T: DeserializeOwned + Default,
    D: Deserializer<'de>,
{
    match Value::deserialize(d)? {
        Value::Array(values) => Ok(values
            .into_iter()
            .map(|v| serde_json::from_value(v).unwrap_or_default())
            .collect()),
        _ => Ok(Vec::new()),
    }
}

/// Deserialize an optional string, treating empty strings and other types as absent.
pub fn deserialize_non_empty<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(d)? {
        Value::String(s) if !s.is_empty() => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// Deserialize an optional identifier given either as a string or as a number.
///
/// Numbers are normalized to their decimal representation. Empty strings, zero,
/// fractional numbers and other types are treated as absent.
pub fn deserialize_identifier<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = match Value::deserialize(d)? {
        Value::String(s) => Some(s).filter(|s| !s.is_empty()),
        Value::Number(n) => number_identifier(&n),
        _ => None,
    };

    Ok(id)
}

fn number_identifier(n: &Number) -> Option<String> {
    if let Some(v) = n.as_u64() {
        return Some(v).filter(|v| *v != 0).map(|v| v.to_string());
    }

    if let Some(v) = n.as_i64() {
        return Some(v).filter(|v| *v != 0).map(|v| v.to_string());
    }

    // Integral floats within the i64 range, e.g. `42.0`.
    n.as_f64()
        .filter(|v| v.is_finite() && v.fract() == 0.0 && *v != 0.0)
        .filter(|v| v.abs() < i64::MAX as f64)
        .map(|v| (v as i64).to_string())
}
