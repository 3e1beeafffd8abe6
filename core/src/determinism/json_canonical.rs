use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

// Canonical journal bytes:
// - keys sorted lexicographically at every depth
// - no insignificant whitespace
// - integer numbers only
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> CoreResult<Vec<u8>> {
    let v = serde_json::to_value(value)?;
    let normalized = normalize_value(v)?;
    Ok(serde_json::to_vec(&normalized)?)
}

fn normalize_value(v: Value) -> CoreResult<Value> {
    match v {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(k, vv)| normalize_value(vv).map(|n| (k, n)))
                .collect::<CoreResult<_>>()?;
            Ok(Value::Object(sorted.into_iter().collect()))
        }
        Value::Array(arr) => Ok(Value::Array(
            arr.into_iter()
                .map(normalize_value)
                .collect::<CoreResult<Vec<_>>>()?,
        )),
        Value::Number(n) if !(n.is_i64() || n.is_u64()) => Err(CoreError::InvalidInput(
            "canonical JSON forbids non-integer numbers".to_string(),
        )),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::to_canonical_bytes;

    #[test]
    fn key_order_does_not_matter() {
        let a = serde_json::json!({"b": 1, "a": {"y": 2, "x": 3}});
        let b = serde_json::json!({"a": {"x": 3, "y": 2}, "b": 1});
        assert_eq!(to_canonical_bytes(&a).unwrap(), to_canonical_bytes(&b).unwrap());
        assert_eq!(
            String::from_utf8(to_canonical_bytes(&a).unwrap()).unwrap(),
            r#"{"a":{"x":3,"y":2},"b":1}"#
        );
    }

    #[test]
    fn floats_are_refused() {
        assert!(to_canonical_bytes(&serde_json::json!({"q": 0.5})).is_err());
    }
}
