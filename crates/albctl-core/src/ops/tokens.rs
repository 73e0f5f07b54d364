//! API token (`authtoken`) management.

use albctl_api::RequestOptions;
use albctl_api::refs::ref_name_or_empty;
use futures_util::TryStreamExt;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::controller::Controller;
use crate::error::CoreError;

/// Longest lifetime the controller accepts for a token, in hours.
pub const MAX_TOKEN_HOURS: u32 = 87_600;

const SINGLE_USE: &str = "Single Use";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub uuid: String,
    #[serde(default)]
    pub user: String,
    /// Expiry timestamp, or "Single Use" for tokens without one.
    #[serde(default = "single_use", deserialize_with = "expiry_or_single_use")]
    pub expires_at: String,
    pub token: String,
}

fn single_use() -> String {
    SINGLE_USE.into()
}

/// `"expires_at": null` means the same as a missing field.
fn expiry_or_single_use<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(de)?.unwrap_or_else(single_use))
}

/// Tokens that do not decode are logged and left out of the listing.
fn token_from(value: &Value) -> Option<Token> {
    let mut token: Token = match serde_json::from_value(value.clone()) {
        Ok(token) => token,
        Err(e) => {
            let uuid = value.get("uuid").and_then(Value::as_str).unwrap_or("<no uuid>");
            warn!(uuid, error = %e, "skipping unreadable token");
            return None;
        }
    };
    token.user = ref_name_or_empty(
        value.get("user_ref").and_then(Value::as_str).unwrap_or(""),
    )
    .to_owned();
    Some(token)
}

/// List tokens, optionally only those owned by `username`.
pub async fn list(ctrl: &Controller, username: Option<&str>) -> Result<Vec<Token>, CoreError> {
    let opts = RequestOptions::new().param("include_name", true);
    let objects: Vec<Value> = ctrl
        .session()
        .objects("authtoken", opts)
        .try_collect()
        .await?;

    Ok(objects
        .iter()
        .filter_map(token_from)
        .filter(|t| username.is_none_or(|u| t.user == u))
        .collect())
}

/// Create a token for `username` valid for `hours` (0 = single use).
pub async fn create(ctrl: &Controller, username: &str, hours: u32) -> Result<Token, CoreError> {
    if hours > MAX_TOKEN_HOURS {
        return Err(CoreError::validation(format!(
            "token lifetime must be between 0 and {MAX_TOKEN_HOURS} hours"
        )));
    }
    info!(username, hours, "creating token");
    let body = json!({"username": username, "hours": hours});
    let created: Value = ctrl
        .session()
        .post_json("authtoken", &body, &RequestOptions::new())
        .await?;

    let mut token: Token = serde_json::from_value(created)
        .map_err(|e| CoreError::unexpected(format!("token response: {e}")))?;
    token.user = username.to_owned();
    Ok(token)
}

/// Delete a token by UUID. A 404 becomes `NotFound`.
pub async fn delete(ctrl: &Controller, uuid: &str) -> Result<(), CoreError> {
    info!(uuid, "deleting token");
    ctrl.session()
        .delete(&format!("authtoken/{uuid}"), &RequestOptions::new())
        .await
        .map_err(|e| match e {
            albctl_api::Error::NotFound { .. } => CoreError::not_found("Token", uuid),
            other => other.into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_without_expiry_is_single_use() {
        let t = token_from(&json!({
            "uuid": "authtoken-1",
            "token": "abc",
            "user_ref": "https://c/api/user/user-1#svc-bot"
        }))
        .unwrap_or_else(|| panic!("token should parse"));
        assert_eq!(t.user, "svc-bot");
        assert_eq!(t.expires_at, "Single Use");
    }

    #[test]
    fn null_expiry_is_single_use() {
        let t = token_from(&json!({
            "uuid": "authtoken-2",
            "token": "def",
            "expires_at": null,
            "user_ref": "https://c/api/user/user-2#admin"
        }))
        .unwrap_or_else(|| panic!("token should parse"));
        assert_eq!(t.expires_at, "Single Use");
    }

    #[test]
    fn malformed_token_is_skipped() {
        assert!(token_from(&json!({"uuid": "x"})).is_none());
    }
}
