// ── Operations ──
//
// One module per workflow. Every operation takes a connected
// `Controller`, returns typed rows or a report, and never prints.

pub mod alerts;
pub mod analytics;
pub mod backup;
pub mod certificates;
pub mod ciphers;
pub mod failover;
pub mod inventory;
pub mod licenses;
pub mod logs;
pub mod metrics;
pub mod segroup;
pub mod terraform;
pub mod tokens;
pub mod unused;
pub mod upgrades;
pub mod vmac;
pub mod vrf;
pub mod waf;

use albctl_api::refs;
use serde_json::Value;

/// String field, or `""` when missing or not a string.
pub(crate) fn text<'a>(object: &'a Value, key: &str) -> &'a str {
    object.get(key).and_then(Value::as_str).unwrap_or("")
}

/// String at a JSON pointer (`/runtime/oper_status/state`), or `""`.
pub(crate) fn text_at<'a>(object: &'a Value, pointer: &str) -> &'a str {
    object.pointer(pointer).and_then(Value::as_str).unwrap_or("")
}

/// Display name of the reference stored in `key`.
pub(crate) fn ref_name_of(object: &Value, key: &str) -> String {
    refs::ref_name_or_empty(text(object, key)).to_owned()
}

/// Display names of every reference in the array under `key`, comma-joined.
pub(crate) fn ref_names_joined(object: &Value, key: &str) -> String {
    array(object, key)
        .iter()
        .filter_map(Value::as_str)
        .map(refs::ref_name_or_empty)
        .collect::<Vec<_>>()
        .join(",")
}

/// Array under `key`, or an empty slice.
pub(crate) fn array<'a>(object: &'a Value, key: &str) -> &'a [Value] {
    object
        .get(key)
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

/// Render a scalar for a report cell: strings bare, numbers as written,
/// null or missing as `""`.
pub(crate) fn scalar(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
