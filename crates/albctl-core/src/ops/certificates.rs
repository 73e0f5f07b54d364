//! Swap one SSL certificate for another on every virtual service using it.

use albctl_api::{ApiSession, JsonPatch, RequestOptions};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::{array, text};
use crate::controller::Controller;
use crate::error::CoreError;

const UUID_PREFIX: &str = "sslkeyandcertificate-";
const CERT_FIELDS: &str = "uuid,url,name";

/// A certificate resolved on the controller.
#[derive(Debug, Clone, Serialize)]
pub struct CertRef {
    pub uuid: String,
    pub url: String,
    pub name: String,
}

/// Per-VS outcome of a replacement.
#[derive(Debug, Clone, Serialize)]
pub struct VsUpdate {
    pub virtual_service: String,
    pub from: String,
    pub to: String,
    pub error: Option<String>,
}

/// Outcome of one search/replace pair.
#[derive(Debug, Clone, Serialize)]
pub struct PairOutcome {
    pub search: String,
    pub replace: String,
    /// Inputs that could not be resolved to a certificate.
    pub missing: Vec<String>,
    pub updates: Vec<VsUpdate>,
}

/// Resolve a certificate given as UUID (`sslkeyandcertificate-...`) or name.
async fn resolve(
    session: &ApiSession,
    key: &str,
    tenant: &str,
) -> Result<Option<CertRef>, CoreError> {
    let opts = RequestOptions::new()
        .tenant(tenant)
        .param("fields", CERT_FIELDS);
    let found = if key.starts_with(UUID_PREFIX) {
        match session
            .get_json::<Value>(&format!("sslkeyandcertificate/{key}"), &opts)
            .await
        {
            Ok(obj) => Some(obj),
            Err(albctl_api::Error::NotFound { .. }) => None,
            Err(e) => return Err(e.into()),
        }
    } else {
        session
            .get_object_by_name("sslkeyandcertificate", key, opts)
            .await?
    };
    Ok(found.map(|obj| CertRef {
        uuid: text(&obj, "uuid").to_owned(),
        url: text(&obj, "url").to_owned(),
        name: text(&obj, "name").to_owned(),
    }))
}

/// The VS's certificate refs with every occurrence of `from` swapped for `to`.
pub fn swap_refs(refs: &[Value], from: &str, to: &str) -> Vec<Value> {
    refs.iter()
        .map(|r| match r.as_str() {
            Some(url) if url == from => Value::String(to.to_owned()),
            _ => r.clone(),
        })
        .collect()
}

async fn replace_pair(
    session: &ApiSession,
    search: &str,
    replace: &str,
    tenant: &str,
) -> Result<PairOutcome, CoreError> {
    let mut outcome = PairOutcome {
        search: search.to_owned(),
        replace: replace.to_owned(),
        missing: Vec::new(),
        updates: Vec::new(),
    };

    let from = resolve(session, search, tenant).await?;
    let to = resolve(session, replace, tenant).await?;
    let (from, to) = match (from, to) {
        (Some(from), Some(to)) => (from, to),
        (from, to) => {
            if from.is_none() {
                outcome.missing.push(search.to_owned());
            }
            if to.is_none() {
                outcome.missing.push(replace.to_owned());
            }
            return Ok(outcome);
        }
    };

    let vss = session
        .get_all(
            "virtualservice",
            RequestOptions::new()
                .tenant(tenant)
                .param("refers_to", format!("sslkeyandcertificate:{}", from.uuid))
                .param("fields", "ssl_key_and_certificate_refs"),
        )
        .await?;

    for vs in &vss {
        let name = text(vs, "name");
        info!(vs = name, from = %from.name, to = %to.name, "updating certificate");
        let refs = swap_refs(array(vs, "ssl_key_and_certificate_refs"), &from.url, &to.url);
        let patch = JsonPatch::replace("/ssl_key_and_certificate_refs", refs);
        let result: Result<Value, _> = session
            .patch_json(
                &format!("virtualservice/{}", text(vs, "uuid")),
                &patch,
                &RequestOptions::new().tenant(tenant),
            )
            .await;
        let error = result.err().map(|e| {
            warn!(vs = name, error = %e, "failed to update virtual service");
            e.to_string()
        });
        outcome.updates.push(VsUpdate {
            virtual_service: name.to_owned(),
            from: from.name.clone(),
            to: to.name.clone(),
            error,
        });
    }
    Ok(outcome)
}

/// Replace `search[i]` with `replace[i]` on every referencing VS.
pub async fn replace(
    ctrl: &Controller,
    search: &[String],
    replace: &[String],
) -> Result<Vec<PairOutcome>, CoreError> {
    if search.len() != replace.len() {
        return Err(CoreError::validation(format!(
            "{} search certificates but {} replacements; the lists must be the same length",
            search.len(),
            replace.len()
        )));
    }
    let tenant = ctrl.tenant();
    let mut outcomes = Vec::with_capacity(search.len());
    for (s, r) in search.iter().zip(replace) {
        outcomes.push(replace_pair(ctrl.session(), s, r, tenant).await?);
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_matching_refs_are_swapped() {
        let refs = vec![
            json!("https://c/api/sslkeyandcertificate/cert-old"),
            json!("https://c/api/sslkeyandcertificate/cert-ec"),
        ];
        let swapped = swap_refs(
            &refs,
            "https://c/api/sslkeyandcertificate/cert-old",
            "https://c/api/sslkeyandcertificate/cert-new",
        );
        assert_eq!(
            swapped,
            vec![
                json!("https://c/api/sslkeyandcertificate/cert-new"),
                json!("https://c/api/sslkeyandcertificate/cert-ec"),
            ]
        );
    }
}
