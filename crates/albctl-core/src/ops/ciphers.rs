//! Strip weak CBC and static-RSA cipher suites from SSL profiles.

use std::collections::BTreeSet;

use albctl_api::RequestOptions;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::{array, text};
use crate::controller::Controller;
use crate::error::CoreError;

/// Cipher enums removed from every processed profile.
pub const UNSAFE_CIPHERS: &[&str] = &[
    "TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA",
    "TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA256",
    "TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA",
    "TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA384",
    "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA",
    "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256",
    "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA",
    "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA384",
    "TLS_RSA_WITH_AES_128_GCM_SHA256",
    "TLS_RSA_WITH_AES_256_GCM_SHA384",
    "TLS_RSA_WITH_AES_256_CBC_SHA256",
    "TLS_RSA_WITH_AES_128_CBC_SHA",
    "TLS_RSA_WITH_AES_128_CBC_SHA256",
    "TLS_RSA_WITH_AES_256_CBC_SHA",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProfileOutcome {
    Excluded,
    Clean,
    Updated { removed: Vec<String> },
    Failed { removed: Vec<String>, error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResult {
    pub profile: String,
    #[serde(flatten)]
    pub outcome: ProfileOutcome,
}

/// Split a profile's ciphers into (kept, removed), preserving order.
pub fn partition_ciphers(ciphers: &[Value]) -> (Vec<String>, Vec<String>) {
    let unsafe_set: BTreeSet<&str> = UNSAFE_CIPHERS.iter().copied().collect();
    ciphers
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_owned)
        .partition(|c| !unsafe_set.contains(c.as_str()))
}

/// Process every SSL profile whose name contains `filter`
/// (case-insensitive). Names in `exclude` are compared case-insensitively.
pub async fn remove_unsafe(
    ctrl: &Controller,
    filter: &str,
    exclude: &[String],
) -> Result<Vec<ProfileResult>, CoreError> {
    let session = ctrl.session();
    let exclude: Vec<String> = exclude.iter().map(|e| e.to_lowercase()).collect();
    let profiles = session
        .get_all(
            "sslprofile",
            RequestOptions::new().param("isearch", format!("(name,{filter})")),
        )
        .await?;

    let mut results = Vec::with_capacity(profiles.len());
    for mut profile in profiles {
        let name = text(&profile, "name").to_owned();
        if exclude.contains(&name.to_lowercase()) {
            results.push(ProfileResult {
                profile: name,
                outcome: ProfileOutcome::Excluded,
            });
            continue;
        }

        let (kept, removed) = partition_ciphers(array(&profile, "cipher_enums"));
        if removed.is_empty() {
            results.push(ProfileResult {
                profile: name,
                outcome: ProfileOutcome::Clean,
            });
            continue;
        }

        info!(profile = %name, removed = removed.len(), "removing unsafe ciphers");
        let uuid = text(&profile, "uuid").to_owned();
        profile["cipher_enums"] = Value::from(kept);
        let outcome = match session
            .put_json::<Value>(&format!("sslprofile/{uuid}"), &profile, &RequestOptions::new())
            .await
        {
            Ok(_) => ProfileOutcome::Updated { removed },
            Err(e) => {
                warn!(profile = %name, error = %e, "update failed");
                ProfileOutcome::Failed {
                    removed,
                    error: e.to_string(),
                }
            }
        };
        results.push(ProfileResult {
            profile: name,
            outcome,
        });
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unsafe_ciphers_are_removed_in_order() {
        let ciphers = json!([
            "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256",
            "TLS_RSA_WITH_AES_128_CBC_SHA",
            "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384",
            "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256"
        ]);
        let (kept, removed) = partition_ciphers(ciphers.as_array().map_or(&[], Vec::as_slice));
        assert_eq!(
            kept,
            vec![
                "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256",
                "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384"
            ]
        );
        assert_eq!(
            removed,
            vec!["TLS_RSA_WITH_AES_128_CBC_SHA", "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256"]
        );
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let result = ProfileResult {
            profile: "System-Standard".into(),
            outcome: ProfileOutcome::Clean,
        };
        let v = serde_json::to_value(&result).unwrap_or_default();
        assert_eq!(v, json!({"profile": "System-Standard", "status": "clean"}));
    }
}
