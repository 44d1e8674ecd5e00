//! Pack/unpack of stateful entities into self-describing JSON values

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{FEAError, FEAResult};

/// Invariants a deserialized state must satisfy before it replaces a live one
pub trait CheckPacked {
    /// Sizes, counts and layouts agree with each other
    fn check_packed(&self) -> FEAResult<()>;
}

/// Pack `value` with a type tag so that unpacking can detect mismatches
pub fn pack<T: Serialize>(kind: &str, value: &T) -> FEAResult<Value> {
    Ok(json!({
        "kind": kind,
        "state": serde_json::to_value(value)?,
    }))
}

/// Rebuild a value packed with [`pack`].
///
/// Fails without side effects when the tag does not match, the state is
/// malformed or the restored value breaks its own invariants.
pub fn unpack<T: DeserializeOwned + CheckPacked>(kind: &str, packed: &Value) -> FEAResult<T> {
    let found = packed
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| FEAError::IncompatiblePack {
            expected: kind.to_string(),
            found: "<untagged>".to_string(),
        })?;
    if found != kind {
        return Err(FEAError::IncompatiblePack {
            expected: kind.to_string(),
            found: found.to_string(),
        });
    }
    let state = packed.get("state").cloned().unwrap_or(Value::Null);
    let restored: T = serde_json::from_value(state)?;
    restored.check_packed().map_err(|e| {
        log::error!("packed {kind} rejected: {e}");
        FEAError::InvalidInput(format!("packed {kind} is inconsistent: {e}"))
    })?;
    Ok(restored)
}

/// `InvalidInput` unless `len == expected`
pub(crate) fn check_len(what: &str, len: usize, expected: usize) -> FEAResult<()> {
    if len != expected {
        return Err(FEAError::InvalidInput(format!(
            "{what} has {len} entries, expected {expected}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Pair {
        a: f64,
        b: Vec<f64>,
    }

    impl CheckPacked for Pair {
        fn check_packed(&self) -> FEAResult<()> {
            check_len("b", self.b.len(), 1)
        }
    }

    #[test]
    fn test_kind_mismatch() {
        let p = pack("Pair", &Pair { a: 1.0, b: vec![2.0] }).unwrap();
        let r: FEAResult<Pair> = unpack("Other", &p);
        assert!(matches!(r, Err(FEAError::IncompatiblePack { .. })));
    }

    #[test]
    fn test_malformed_state() {
        let bad = json!({ "kind": "Pair", "state": { "a": "x" } });
        let r: FEAResult<Pair> = unpack("Pair", &bad);
        assert!(matches!(r, Err(FEAError::SerializationError(_))));
    }

    #[test]
    fn test_broken_invariant() {
        let p = pack("Pair", &Pair { a: 1.0, b: vec![] }).unwrap();
        let r: FEAResult<Pair> = unpack("Pair", &p);
        assert!(matches!(r, Err(FEAError::InvalidInput(_))));

        let good = pack("Pair", &Pair { a: 1.0, b: vec![3.0] }).unwrap();
        assert_eq!(unpack::<Pair>("Pair", &good).unwrap().b, vec![3.0]);
    }
}
