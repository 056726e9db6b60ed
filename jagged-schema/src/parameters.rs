use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The parameter naming the logical array type of a node, e.g. `"string"` or `"bytestring"`.
pub const ARRAY_PARAMETER: &str = "__array__";
/// The parameter naming the record type of a record node.
pub const RECORD_PARAMETER: &str = "__record__";

/// Opaque key/value tags attached to a schema or layout node.
///
/// Parameters carry semantics that the structure alone does not, e.g. that a list of `uint8` is
/// a UTF-8 string. Values are arbitrary JSON and never interpreted by reconciliation; they are
/// only carried over and compared. A key mapped to `null` is the same as an absent key, so such
/// keys are never stored, also not when deserialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Parameters(Arc<BTreeMap<String, Value>>);

impl Parameters {
    /// An empty set of parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of these parameters with `key` set to `value`. Setting `null` removes it.
    pub fn with<K: Into<String>, V: Into<Value>>(&self, key: K, value: V) -> Self {
        let mut map = self.0.as_ref().clone();
        let key = key.into();
        let value = value.into();
        if value.is_null() {
            map.remove(&key);
        } else {
            map.insert(key, value);
        }
        Self(Arc::new(map))
    }

    /// Look up a parameter value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of parameters set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate the parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The logical array name, if tagged.
    pub fn array_name(&self) -> Option<&str> {
        self.get(ARRAY_PARAMETER).and_then(Value::as_str)
    }

    /// The record name, if tagged.
    pub fn record_name(&self) -> Option<&str> {
        self.get(RECORD_PARAMETER).and_then(Value::as_str)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Parameters::new(), |params, (k, v)| params.with(k, v))
    }
}

impl<'de> Deserialize<'de> for Parameters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::<String, Value>::deserialize(deserializer).map(Parameters::from_iter)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn null_removes() {
        let params = Parameters::new().with(ARRAY_PARAMETER, "string");
        assert_eq!(params.array_name(), Some("string"));
        assert_eq!(params.len(), 1);

        let cleared = params.with(ARRAY_PARAMETER, Value::Null);
        assert!(cleared.is_empty());
        assert_eq!(cleared, Parameters::new());
        // the original is untouched
        assert_eq!(params.array_name(), Some("string"));
    }

    #[test]
    fn json_is_a_plain_object() {
        let params = Parameters::from_iter([("units", json!("GeV")), ("__record__", json!("Muon"))]);
        assert_eq!(params.record_name(), Some("Muon"));
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"__record__": "Muon", "units": "GeV"})
        );
        let back: Parameters = serde_json::from_value(json!({"units": "GeV"})).unwrap();
        assert_eq!(back.get("units"), Some(&json!("GeV")));
    }

    #[test]
    fn json_null_is_absent() {
        let params: Parameters =
            serde_json::from_value(json!({"units": null, "__array__": "string"})).unwrap();
        assert_eq!(params, Parameters::new().with(ARRAY_PARAMETER, "string"));
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("units"), None);
        assert_eq!(serde_json::to_value(&params).unwrap(), json!({"__array__": "string"}));
    }
}
