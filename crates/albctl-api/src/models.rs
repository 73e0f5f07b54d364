// Wire types shared by every endpoint.
//
// Object payloads stay as `serde_json::Value`: their schema belongs to the
// controller and varies between releases. Only the envelopes are typed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A page of a collection listing: `{ count, results, next }`.
///
/// `next` is an absolute URL to the following page and is absent on the
/// last page.
#[derive(Debug, Clone, Deserialize)]
pub struct ListPage<T> {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

/// Single JSON-patch operation as accepted by the controller's PATCH.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchOp {
    pub op: String,
    pub path: String,
    pub value: Value,
}

/// PATCH body: `{"json_patch": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonPatch {
    pub json_patch: Vec<PatchOp>,
}

impl JsonPatch {
    /// A patch with one `replace` operation.
    pub fn replace(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            json_patch: vec![PatchOp {
                op: "replace".into(),
                path: path.into(),
                value: value.into(),
            }],
        }
    }
}

/// Login response fragment carrying the controller version.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub version: Option<VersionInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct VersionInfo {
    #[serde(rename = "Version", default)]
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn replace_patch_serializes_to_controller_shape() {
        let patch = JsonPatch::replace("/analytics_policy/client_insights", "NO_INSIGHTS");
        assert_eq!(
            serde_json::to_value(&patch).unwrap_or_default(),
            json!({
                "json_patch": [{
                    "op": "replace",
                    "path": "/analytics_policy/client_insights",
                    "value": "NO_INSIGHTS"
                }]
            })
        );
    }

    #[test]
    fn last_page_has_no_next() {
        let page: ListPage<Value> =
            serde_json::from_value(json!({"count": 1, "results": [{"uuid": "a"}]}))
                .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(page.count, Some(1));
        assert!(page.next.is_none());
    }
}
