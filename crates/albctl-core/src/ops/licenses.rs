//! Controller license inventory and cleanup.

use albctl_api::RequestOptions;
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::{array, text};
use crate::controller::Controller;
use crate::error::CoreError;

const EXPIRY_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// One installed license.
#[derive(Debug, Clone, Serialize)]
pub struct License {
    pub license_id: String,
    pub name: String,
    /// `None` when the controller reports no (or an unparseable) expiry.
    pub expires: Option<NaiveDateTime>,
    /// Service units (`cores`); absent on some license types.
    pub service_units: Option<f64>,
}

/// Outcome of deleting one license during `delete_expired`.
#[derive(Debug, Clone, Serialize)]
pub struct Deletion {
    pub license: License,
    /// Error message when the controller refused the delete.
    pub error: Option<String>,
}

/// Parse `valid_until` in either of the two formats the controller emits.
pub fn parse_expiry(value: &str) -> Option<NaiveDateTime> {
    EXPIRY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

fn license_from(value: &Value) -> License {
    let id = text(value, "license_id");
    let name = text(value, "license_name");
    License {
        license_id: if id.is_empty() { "???".into() } else { id.into() },
        name: if name.is_empty() { "???".into() } else { name.into() },
        expires: value
            .get("valid_until")
            .and_then(Value::as_str)
            .and_then(parse_expiry),
        service_units: value.get("cores").and_then(Value::as_f64),
    }
}

/// `GET licensing`
pub async fn list(ctrl: &Controller) -> Result<Vec<License>, CoreError> {
    let body: Value = ctrl
        .session()
        .get_json("licensing", &RequestOptions::new())
        .await?;
    Ok(array(&body, "licenses").iter().map(license_from).collect())
}

/// `DELETE licensing/<id>`
pub async fn delete(ctrl: &Controller, license_id: &str) -> Result<(), CoreError> {
    info!(license_id, "deleting license");
    ctrl.session()
        .delete(&format!("licensing/{license_id}"), &RequestOptions::new())
        .await
        .map_err(|e| match e {
            albctl_api::Error::NotFound { .. } => CoreError::not_found("License", license_id),
            other => other.into(),
        })
}

/// Licenses whose expiry lies before `now`. Licenses without an expiry
/// never count as expired.
pub fn expired(licenses: &[License], now: NaiveDateTime) -> Vec<License> {
    licenses
        .iter()
        .filter(|l| l.expires.is_some_and(|exp| exp < now))
        .cloned()
        .collect()
}

/// Delete every expired license. A failed delete is recorded and the
/// sweep continues.
pub async fn delete_expired(
    ctrl: &Controller,
    now: NaiveDateTime,
) -> Result<Vec<Deletion>, CoreError> {
    let licenses = list(ctrl).await?;
    let mut outcomes = Vec::new();
    for license in expired(&licenses, now) {
        let error = match delete(ctrl, &license.license_id).await {
            Ok(()) => None,
            Err(e) => {
                warn!(license_id = %license.license_id, error = %e, "could not delete license");
                Some(e.to_string())
            }
        };
        outcomes.push(Deletion { license, error });
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default()
    }

    #[test]
    fn parses_both_expiry_formats() {
        assert_eq!(parse_expiry("2030-01-02T00:00:00"), Some(at(2030, 1, 2)));
        assert_eq!(parse_expiry("2030-01-02 00:00:00"), Some(at(2030, 1, 2)));
        assert!(parse_expiry("2030-01-02T00:00:00.250").is_some());
        assert_eq!(parse_expiry("next tuesday"), None);
    }

    #[test]
    fn missing_fields_fall_back() {
        let lic = license_from(&json!({"cores": 2.5}));
        assert_eq!(lic.license_id, "???");
        assert_eq!(lic.name, "???");
        assert_eq!(lic.expires, None);
        assert_eq!(lic.service_units, Some(2.5));
    }

    #[test]
    fn only_past_expiries_are_expired() {
        let licenses: Vec<License> = [
            json!({"license_id": "old", "valid_until": "2020-01-01 00:00:00"}),
            json!({"license_id": "new", "valid_until": "2040-01-01T00:00:00"}),
            json!({"license_id": "eval"}),
        ]
        .iter()
        .map(license_from)
        .collect();

        let gone = expired(&licenses, at(2025, 6, 1));
        let ids: Vec<&str> = gone.iter().map(|l| l.license_id.as_str()).collect();
        assert_eq!(ids, vec!["old"]);
    }
}
