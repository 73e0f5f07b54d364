//! Per-virtual-service configuration backup and restore.
//!
//! Archives are JSON documents of the form
//! `{ "<tenant>": { "<vs name>": <exported configuration> } }`.

use std::path::Path;

use albctl_api::RequestOptions;
use albctl_api::refs::ref_name_or_empty;
use indexmap::IndexMap;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

use super::text;
use crate::controller::Controller;
use crate::error::CoreError;
use crate::glob::Glob;

/// tenant -> VS name -> exported configuration
pub type Archive = IndexMap<String, IndexMap<String, Value>>;

/// A virtual service selected for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VsSelection {
    pub tenant: String,
    pub name: String,
    pub uuid: String,
}

/// A backed-up configuration selected for import.
#[derive(Debug, Clone, Serialize)]
pub struct RestoreItem {
    pub tenant: String,
    pub name: String,
    #[serde(skip)]
    pub configuration: Value,
}

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub include_certs: bool,
    pub passphrase: Option<SecretString>,
}

/// Virtual services whose name matches `pattern`, in the session tenant.
pub async fn select_for_backup(
    ctrl: &Controller,
    pattern: &Glob,
) -> Result<Vec<VsSelection>, CoreError> {
    let vss = ctrl
        .session()
        .get_all(
            "virtualservice",
            RequestOptions::new()
                .param("fields", "name,uuid,tenant_ref")
                .param("include_name", true),
        )
        .await?;
    Ok(vss
        .iter()
        .filter(|vs| pattern.is_match(text(vs, "name")))
        .map(|vs| VsSelection {
            tenant: ref_name_or_empty(text(vs, "tenant_ref")).to_owned(),
            name: text(vs, "name").to_owned(),
            uuid: text(vs, "uuid").to_owned(),
        })
        .collect())
}

/// Export one VS with its dependent objects.
pub async fn export(
    ctrl: &Controller,
    vs: &VsSelection,
    options: &ExportOptions,
) -> Result<Value, CoreError> {
    info!(vs = %vs.name, tenant = %vs.tenant, "exporting virtual service");
    let opts = RequestOptions::new()
        .param("include_certs", options.include_certs)
        .param_opt(
            "passphrase",
            options.passphrase.as_ref().map(|p| p.expose_secret().to_owned()),
        );
    ctrl.session()
        .get_json(&format!("configuration/export/virtualservice/{}", vs.uuid), &opts)
        .await
        .map_err(|e| CoreError::OperationFailed {
            message: format!("Error backing up {}: {e}", vs.name),
        })
}

/// Add an exported configuration to the archive.
pub fn add_to_archive(archive: &mut Archive, vs: &VsSelection, configuration: Value) {
    archive
        .entry(vs.tenant.clone())
        .or_default()
        .insert(vs.name.clone(), configuration);
}

pub async fn write_archive(path: &Path, archive: &Archive) -> Result<(), CoreError> {
    let body = serde_json::to_vec(archive)
        .map_err(|e| CoreError::unexpected(format!("cannot encode archive: {e}")))?;
    tokio::fs::write(path, body)
        .await
        .map_err(|e| CoreError::io(path, e))
}

pub async fn read_archive(path: &Path) -> Result<Archive, CoreError> {
    let body = tokio::fs::read(path)
        .await
        .map_err(|e| CoreError::io(path, e))?;
    serde_json::from_slice(&body).map_err(|e| {
        CoreError::validation(format!("{} is not a backup archive: {e}", path.display()))
    })
}

/// Archive entries in `tenant` (`*` for all) whose name matches `pattern`.
pub fn select_for_restore(archive: &Archive, tenant: &str, pattern: &Glob) -> Vec<RestoreItem> {
    archive
        .iter()
        .filter(|(t, _)| tenant == "*" || tenant == t.as_str())
        .flat_map(|(t, vss)| {
            vss.iter()
                .filter(|(name, _)| pattern.is_match(name))
                .map(move |(name, cfg)| RestoreItem {
                    tenant: t.clone(),
                    name: name.clone(),
                    configuration: cfg.clone(),
                })
        })
        .collect()
}

/// Import one backed-up configuration into its original tenant.
pub async fn import(
    ctrl: &Controller,
    item: &RestoreItem,
    passphrase: Option<&SecretString>,
) -> Result<(), CoreError> {
    info!(vs = %item.name, tenant = %item.tenant, "restoring virtual service");
    let body = json!({
        "passphrase": passphrase.map(|p| p.expose_secret().to_owned()),
        "configuration": item.configuration,
    });
    ctrl.session()
        .post_json::<Value>(
            "configuration/import",
            &body,
            &RequestOptions::new().tenant(item.tenant.clone()),
        )
        .await
        .map_err(|e| CoreError::OperationFailed {
            message: format!("Error restoring {}: {e}", item.name),
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Archive {
        let mut archive = Archive::new();
        for (tenant, name) in [("admin", "web-1"), ("admin", "api-1"), ("team-a", "web-2")] {
            add_to_archive(
                &mut archive,
                &VsSelection {
                    tenant: tenant.into(),
                    name: name.into(),
                    uuid: format!("virtualservice-{name}"),
                },
                json!({"VirtualService": [{"name": name}]}),
            );
        }
        archive
    }

    #[test]
    fn archive_groups_by_tenant() {
        let archive = sample();
        assert_eq!(archive.len(), 2);
        assert_eq!(archive["admin"].len(), 2);
    }

    #[test]
    fn restore_selection_honours_tenant_and_glob() {
        let archive = sample();
        let web = Glob::new("web-*").unwrap_or_else(|e| panic!("{e}"));

        let all: Vec<String> = select_for_restore(&archive, "*", &web)
            .into_iter()
            .map(|i| format!("{}@{}", i.name, i.tenant))
            .collect();
        assert_eq!(all, vec!["web-1@admin", "web-2@team-a"]);

        let admin = select_for_restore(&archive, "admin", &Glob::any());
        assert_eq!(admin.len(), 2);

        assert!(select_for_restore(&archive, "nobody", &Glob::any()).is_empty());
    }

    #[tokio::test]
    async fn archive_survives_disk() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("backup.json");
        write_archive(&path, &sample())
            .await
            .unwrap_or_else(|e| panic!("{e}"));
        let back = read_archive(&path).await.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(back, sample());
    }
}
