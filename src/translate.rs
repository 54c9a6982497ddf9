// Code-to-label tables for trigger messages, scopes and connector operations
use lazy_static::lazy_static;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Dataverse trigger message codes.
const MESSAGE_LABELS: &[(i64, &str)] = &[
    (1, "Create"),
    (2, "Delete"),
    (3, "Update"),
    (4, "Create or Update"),
    (5, "Create or Delete"),
    (6, "Update or Delete"),
    (7, "Create, Update or Delete"),
];

/// Dataverse trigger privilege scopes.
const SCOPE_LABELS: &[(i64, &str)] = &[
    (1, "User"),
    (2, "Business Unit"),
    (3, "Parent: Child Business Units"),
    (4, "Organization"),
];

lazy_static! {
    /// Canonical verb -> connector operation ids it may correspond to.
    /// `create` includes `UpdateRecord` because that operation upserts.
    static ref OPERATION_VERBS: BTreeMap<&'static str, &'static [&'static str]> = {
        let mut map: BTreeMap<&'static str, &'static [&'static str]> = BTreeMap::new();
        map.insert("create", &["CreateRecord", "UpdateRecord"]);
        map.insert("update", &["UpdateOnlyRecord", "UpdateRecord"]);
        map.insert("delete", &["DeleteRecord"]);
        map.insert("list", &["ListRecords"]);
        map.insert("get", &["GetItem"]);
        map
    };
}

fn lookup(table: &[(i64, &str)], code: i64) -> String {
    table
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| format!("Unknown ({})", code))
}

pub fn translate_message(code: i64) -> String {
    lookup(MESSAGE_LABELS, code)
}

pub fn translate_scope(code: i64) -> String {
    lookup(SCOPE_LABELS, code)
}

/// Read a numeric code from a parameters object and translate it.
/// Yields "Unknown" when the key is absent or not an integer.
pub fn translated_metadata(
    parameters: &Map<String, Value>,
    key: &str,
    translator: fn(i64) -> String,
) -> String {
    parameters
        .get(key)
        .and_then(Value::as_i64)
        .map(translator)
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Message codes whose label contains `event` (case-insensitive).
/// "Update" therefore also selects the composite codes 4, 6 and 7.
pub fn matching_message_codes(event: &str) -> Vec<i64> {
    let needle = event.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    MESSAGE_LABELS
        .iter()
        .filter(|(_, label)| label.to_lowercase().contains(&needle))
        .map(|(code, _)| *code)
        .collect()
}

/// Operation ids for a canonical verb, or `None` when the verb is not known.
pub fn operation_ids(verb: &str) -> Option<&'static [&'static str]> {
    OPERATION_VERBS
        .get(verb.trim().to_lowercase().as_str())
        .copied()
}

/// The recognized verbs, for warnings and help text.
pub fn known_verbs() -> Vec<&'static str> {
    OPERATION_VERBS.keys().copied().collect()
}
