//! # Claim Set
//!
//! The caller-supplied description of a service offering, keyed by
//! trust-framework vocabulary terms. Values are arbitrary JSON: scalars,
//! objects, or arrays of objects carrying an `id` reference.
//!
//! Key order is preserved (`serde_json/preserve_order`) so that the claim
//! set handed to the signer keeps the caller's layout, and replacing a claim
//! keeps its original position and spelling.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::vocab::{self, Term};

/// Ordered mapping from claim key to structured value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(Map<String, Value>);

impl ClaimSet {
    /// Create an empty claim set.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap an existing JSON object.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Build a claim set from a JSON value; non-objects yield an empty set.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }

    /// Whether the claim set carries no claims at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of claims.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Look up a vocabulary term (prefixed spelling first).
    pub fn get(&self, term: Term) -> Option<&Value> {
        term.get(&self.0)
    }

    /// Whether the term is present (a JSON `null` counts as present).
    pub fn contains(&self, term: Term) -> bool {
        term.key_in(&self.0).is_some()
    }

    /// Set a term, replacing an existing value under whichever spelling it
    /// was stored, or inserting it in prefixed form.
    pub fn insert(&mut self, term: Term, value: Value) {
        let key = term.key_in(&self.0).unwrap_or_else(|| term.prefixed());
        self.0.insert(key, value);
    }

    /// Remove a term under either spelling, returning its value.
    pub fn remove(&mut self, term: Term) -> Option<Value> {
        let key = term.key_in(&self.0)?;
        self.0.shift_remove(&key)
    }

    /// Borrow the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Convert into a JSON object value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    // -- Accessors for known terms -------------------------------------------

    /// The `policy` claim.
    pub fn policy(&self) -> Option<&Value> {
        self.get(vocab::POLICY)
    }

    /// The `aggregationOf` claim.
    pub fn aggregation_of(&self) -> Option<&Value> {
        self.get(vocab::AGGREGATION_OF)
    }

    /// The `dependsOn` claim.
    pub fn depends_on(&self) -> Option<&Value> {
        self.get(vocab::DEPENDS_ON)
    }

    /// The `dataAccountExport` claim.
    pub fn data_account_export(&self) -> Option<&Value> {
        self.get(vocab::DATA_ACCOUNT_EXPORT)
    }

    /// The `termsAndConditions` claim.
    pub fn terms_and_conditions(&self) -> Option<&Value> {
        self.get(vocab::TERMS_AND_CONDITIONS)
    }

    /// The `criteria` claim.
    pub fn criteria(&self) -> Option<&Value> {
        self.get(vocab::CRITERIA)
    }

    /// Mutable access to the `termsAndConditions` object, if it is one.
    pub fn terms_and_conditions_mut(&mut self) -> Option<&mut Map<String, Value>> {
        let key = vocab::TERMS_AND_CONDITIONS.key_in(&self.0)?;
        self.0.get_mut(&key).and_then(Value::as_object_mut)
    }
}

impl From<Map<String, Value>> for ClaimSet {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Whether a claim value is blank: `null`, a whitespace-only string, or an
/// empty array/object.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Collect the `id` references of an aggregation/dependsOn value.
///
/// Accepts an array of objects or a single object. Items without a string
/// `id` are skipped.
pub fn reference_ids(value: &Value) -> Vec<String> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![value],
        _ => Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|item| item.get(vocab::ID).and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(v: Value) -> ClaimSet {
        ClaimSet::from_value(v)
    }

    #[test]
    fn from_non_object_is_empty() {
        assert!(ClaimSet::from_value(json!("x")).is_empty());
        assert!(ClaimSet::from_value(json!(null)).is_empty());
    }

    #[test]
    fn insert_replaces_in_place_under_existing_spelling() {
        let mut c = claims(json!({"a": 1, "policy": {"location": []}, "z": 2}));
        c.insert(vocab::POLICY, json!(["https://host/p.json"]));
        let keys: Vec<&String> = c.as_map().keys().collect();
        assert_eq!(keys, vec!["a", "policy", "z"]);
        assert_eq!(c.policy(), Some(&json!(["https://host/p.json"])));
    }

    #[test]
    fn insert_new_term_uses_prefix() {
        let mut c = ClaimSet::new();
        c.insert(vocab::LABEL_LEVEL, json!("https://host/ll.json"));
        assert!(c.as_map().contains_key("gx:labelLevel"));
    }

    #[test]
    fn remove_handles_either_spelling() {
        let mut c = claims(json!({"gx:criteria": {"P1.1.1": "Yes"}}));
        assert!(c.remove(vocab::CRITERIA).is_some());
        assert!(!c.contains(vocab::CRITERIA));
        assert!(c.remove(vocab::CRITERIA).is_none());
    }

    #[test]
    fn blank_values() {
        assert!(is_blank(&json!(null)));
        assert!(is_blank(&json!("  ")));
        assert!(is_blank(&json!([])));
        assert!(is_blank(&json!({})));
        assert!(!is_blank(&json!("x")));
        assert!(!is_blank(&json!(0)));
        assert!(!is_blank(&json!([{"id": "https://a"}])));
    }

    #[test]
    fn reference_ids_from_array_and_single_object() {
        let arr = json!([{"id": "https://a"}, {"name": "no id"}, {"id": "https://b"}]);
        assert_eq!(reference_ids(&arr), vec!["https://a", "https://b"]);
        assert_eq!(reference_ids(&json!({"id": "https://c"})), vec!["https://c"]);
        assert!(reference_ids(&json!("https://d")).is_empty());
    }

    #[test]
    fn terms_and_conditions_mut_allows_in_place_edit() {
        let mut c = claims(json!({"gx:termsAndConditions": {"gx:URL": "https://tnc"}}));
        c.terms_and_conditions_mut()
            .unwrap()
            .insert("gx:hash".into(), json!("abc"));
        assert_eq!(
            c.terms_and_conditions().unwrap()["gx:hash"],
            json!("abc")
        );
    }
}
