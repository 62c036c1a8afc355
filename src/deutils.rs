// src/deutils.rs
//
// Lenient field decoding for device frames. The firmware is hand-edited
// and sends numbers, numeric strings and "on"/"off" interchangeably, so
// none of these reject a frame: a field that cannot be read becomes None.
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Numbers and numeric strings, finite only.
pub fn lenient_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(num) => num.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|f| f.is_finite())
}

pub fn lenient_bool(v: &Value) -> Option<bool> {
    if let Value::Bool(b) = v {
        return Some(*b);
    }
    let s = v.to_string().trim_matches('"').trim().to_lowercase();
    match s.as_str() {
        "1" | "true" | "yes" | "y" | "t" | "on" | "high" => Some(true),
        "0" | "false" | "no" | "n" | "f" | "off" | "low" => Some(false),
        _ => None,
    }
}

pub fn deserialize_lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    Ok(lenient_bool(&v))
}

/// Switch position 1..=8, given as number or string. The outer Option is
/// key presence: a present key that is not a valid position (0, 300, -1,
/// 2.5, "x", null) decodes to `Some(None)`.
pub fn deserialize_lenient_position<'de, D>(deserializer: D) -> Result<Option<Option<u8>>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    Ok(Some(lenient_position(&v)))
}

pub fn lenient_position(v: &Value) -> Option<u8> {
    lenient_number(v)
        .filter(|n| n.fract() == 0.0 && (1.0..=8.0).contains(n))
        .map(|n| n as u8)
}

/// Strings as-is, scalars stringified, everything else dropped.
pub fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    Ok(match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Keeps the raw value whenever the key is present, `null` included, so
/// callers can tell "absent" from "present but unreadable".
pub fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lenient_number() {
        assert_eq!(lenient_number(&json!(12)), Some(12.0));
        assert_eq!(lenient_number(&json!(-3.5)), Some(-3.5));
        assert_eq!(lenient_number(&json!("4095")), Some(4095.0));
        assert_eq!(lenient_number(&json!("abc")), None);
        assert_eq!(lenient_number(&json!("NaN")), None);
        assert_eq!(lenient_number(&json!(true)), None);
        assert_eq!(lenient_number(&Value::Null), None);
    }

    #[test]
    fn test_lenient_bool() {
        assert_eq!(lenient_bool(&json!(true)), Some(true));
        assert_eq!(lenient_bool(&json!(0)), Some(false));
        assert_eq!(lenient_bool(&json!("ON")), Some(true));
        assert_eq!(lenient_bool(&json!(" off ")), Some(false));
        assert_eq!(lenient_bool(&json!("maybe")), None);
        assert_eq!(lenient_bool(&json!([1])), None);
    }

    #[test]
    fn test_lenient_position() {
        assert_eq!(lenient_position(&json!(1)), Some(1));
        assert_eq!(lenient_position(&json!("8")), Some(8));
        assert_eq!(lenient_position(&json!(0)), None);
        assert_eq!(lenient_position(&json!(9)), None);
        assert_eq!(lenient_position(&json!(300)), None);
        assert_eq!(lenient_position(&json!(-1)), None);
        assert_eq!(lenient_position(&json!(2.5)), None);
        assert_eq!(lenient_position(&Value::Null), None);
    }
}
