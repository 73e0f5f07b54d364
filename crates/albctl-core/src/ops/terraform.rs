//! Export controller objects as Terraform configuration for the
//! `vmware/avi` provider.
//!
//! A scratch workspace gets a `main.tf` with the provider block and one
//! import per object. The default mode lets `terraform plan
//! -generate-config-out` write the resources; legacy mode (providers and
//! Terraform releases without config generation) imports each object and
//! captures `terraform state show`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Output;

use albctl_api::RequestOptions;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::text;
use crate::config::AuthCredentials;
use crate::controller::Controller;
use crate::error::CoreError;

/// Which objects to export.
#[derive(Debug, Clone, Default)]
pub enum Selection {
    #[default]
    All,
    /// Names containing this string.
    Search(String),
    /// Exact names.
    Names(Vec<String>),
}

impl Selection {
    fn apply(&self, opts: RequestOptions) -> RequestOptions {
        match self {
            Self::All => opts,
            Self::Search(s) => opts.param("search", format!("(name,{s})")),
            Self::Names(names) if names.len() == 1 => opts.param("name", &names[0]),
            Self::Names(names) => opts.param("name.in", names.join(",")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub object_type: String,
    pub selection: Selection,
    pub output: PathBuf,
    /// Provider version; defaults to the controller API version.
    pub provider_version: Option<String>,
    pub legacy_import: bool,
    /// Terraform executable.
    pub terraform: PathBuf,
}

/// Provider block settings.
#[derive(Debug, Clone)]
pub struct Provider {
    pub version: String,
    pub controller: String,
    pub username: String,
    pub tenant: String,
    pub api_version: String,
    pub credential: ProviderCredential,
}

#[derive(Debug, Clone)]
pub enum ProviderCredential {
    Password(SecretString),
    Token(SecretString),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedObject {
    pub uuid: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub output: PathBuf,
    pub objects: Vec<ExportedObject>,
    /// Objects that failed to import (legacy mode only).
    pub failures: Vec<(String, String)>,
}

fn hcl_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            // `${` and `%{` start template sequences.
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// The `terraform` and `provider` blocks.
pub fn render_provider(provider: &Provider) -> String {
    let credential = match &provider.credential {
        ProviderCredential::Password(p) => {
            format!("  avi_password    = {}\n", hcl_string(p.expose_secret()))
        }
        ProviderCredential::Token(t) => {
            format!("  avi_authtoken   = {}\n", hcl_string(t.expose_secret()))
        }
    };
    format!(
        "terraform {{\n  required_providers {{\n    avi = {{\n      source = \"vmware/avi\"\n      version = {version}\n    }}\n  }}\n}}\n\n\
         provider \"avi\" {{\n  avi_username    = {user}\n  avi_tenant      = {tenant}\n{credential}  avi_controller  = {controller}\n  avi_version     = {api}\n}}\n\n",
        version = hcl_string(&provider.version),
        user = hcl_string(&provider.username),
        tenant = hcl_string(&provider.tenant),
        controller = hcl_string(&provider.controller),
        api = hcl_string(&provider.api_version),
    )
}

/// Terraform resource address for an object.
pub fn address(object_type: &str, uuid: &str) -> String {
    format!("avi_{object_type}.{uuid}")
}

/// Full `main.tf`: provider, then `import` blocks or, in legacy mode,
/// empty resources for `terraform import` to fill.
pub fn render_main_tf(
    provider: &Provider,
    object_type: &str,
    objects: &[ExportedObject],
    legacy: bool,
) -> String {
    let mut tf = render_provider(provider);
    for obj in objects {
        if legacy {
            let _ = writeln!(tf, "resource \"avi_{object_type}\" \"{}\" {{ }}", obj.uuid);
        } else {
            let _ = write!(
                tf,
                "import {{\n  to = {}\n  id = {}\n}}\n",
                address(object_type, &obj.uuid),
                hcl_string(&obj.uuid)
            );
        }
    }
    tf
}

async fn terraform(bin: &Path, dir: &Path, args: &[&str], step: &str) -> Result<Output, CoreError> {
    debug!(?args, "running terraform");
    let output = Command::new(bin)
        .arg(format!("-chdir={}", dir.display()))
        .args(args)
        .output()
        .await
        .map_err(|e| CoreError::Terraform {
            step: step.into(),
            message: format!("cannot run {}: {e}", bin.display()),
        })?;
    if output.status.success() {
        Ok(output)
    } else {
        Err(CoreError::Terraform {
            step: step.into(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        })
    }
}

fn provider_for(ctrl: &Controller, version: Option<&str>) -> Provider {
    let config = ctrl.config();
    let api_version = ctrl.api_version().unwrap_or_default();
    let credential = match &config.auth {
        AuthCredentials::Password { password, .. } => ProviderCredential::Password(password.clone()),
        AuthCredentials::Token { token, .. } => ProviderCredential::Token(token.clone()),
    };
    Provider {
        version: version.map_or_else(|| api_version.clone(), str::to_owned),
        controller: config.url.host_str().unwrap_or_default().to_owned(),
        username: config.auth.username().to_owned(),
        tenant: ctrl.tenant().to_owned(),
        api_version,
        credential,
    }
}

/// Objects selected for export.
pub async fn find_objects(
    ctrl: &Controller,
    object_type: &str,
    selection: &Selection,
) -> Result<Vec<ExportedObject>, CoreError> {
    let opts = selection.apply(RequestOptions::new().param("fields", "uuid,name"));
    let objects = ctrl.session().get_all(object_type, opts).await?;
    Ok(objects
        .iter()
        .map(|o| {
            let uuid = text(o, "uuid").to_owned();
            let name = match text(o, "name") {
                "" => uuid.clone(),
                n => n.to_owned(),
            };
            ExportedObject { uuid, name }
        })
        .collect())
}

/// Run the export end to end.
pub async fn export(ctrl: &Controller, request: &ExportRequest) -> Result<ExportReport, CoreError> {
    let objects = find_objects(ctrl, &request.object_type, &request.selection).await?;
    if objects.is_empty() {
        return Err(CoreError::not_found(&request.object_type, "no matching objects"));
    }
    let output = std::path::absolute(&request.output).map_err(|e| CoreError::io(&request.output, e))?;

    let workdir = tempfile::tempdir().map_err(|e| CoreError::io("<tempdir>", e))?;
    let provider = provider_for(ctrl, request.provider_version.as_deref());
    let main_tf = workdir.path().join("main.tf");
    tokio::fs::write(
        &main_tf,
        render_main_tf(&provider, &request.object_type, &objects, request.legacy_import),
    )
    .await
    .map_err(|e| CoreError::io(&main_tf, e))?;

    info!(provider = %provider.version, "initializing terraform");
    terraform(&request.terraform, workdir.path(), &["init"], "init").await?;

    let mut failures = Vec::new();
    if request.legacy_import {
        let mut hcl = String::new();
        for obj in &objects {
            let addr = address(&request.object_type, &obj.uuid);
            info!(uuid = %obj.uuid, name = %obj.name, "importing");
            let imported = terraform(
                &request.terraform,
                workdir.path(),
                &["import", &addr, &obj.uuid],
                "import",
            )
            .await;
            let shown = match imported {
                Ok(_) => {
                    terraform(
                        &request.terraform,
                        workdir.path(),
                        &["state", "show", "-no-color", &addr],
                        "state show",
                    )
                    .await
                }
                Err(e) => Err(e),
            };
            match shown {
                Ok(out) => {
                    let _ = writeln!(hcl, "# {}", obj.name);
                    hcl.push_str(&String::from_utf8_lossy(&out.stdout));
                    hcl.push_str("\n\n");
                }
                Err(e) => {
                    warn!(uuid = %obj.uuid, error = %e, "import failed");
                    failures.push((obj.uuid.clone(), e.to_string()));
                }
            }
        }
        tokio::fs::write(&output, hcl)
            .await
            .map_err(|e| CoreError::io(&output, e))?;
    } else {
        let generate = format!("-generate-config-out={}", output.display());
        terraform(&request.terraform, workdir.path(), &["plan", &generate], "plan").await?;
    }

    Ok(ExportReport {
        output,
        objects,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> Provider {
        Provider {
            version: "22.1.5".into(),
            controller: "10.0.0.1".into(),
            username: "admin".into(),
            tenant: "admin".into(),
            api_version: "22.1.5".into(),
            credential: ProviderCredential::Password(SecretString::from("p\"w${x}".to_string())),
        }
    }

    #[test]
    fn strings_are_escaped_for_hcl() {
        assert_eq!(hcl_string("plain"), "\"plain\"");
        assert_eq!(hcl_string("a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(hcl_string("${var}"), "\"$${var}\"");
    }

    #[test]
    fn provider_block() {
        let tf = render_provider(&provider());
        assert!(tf.contains("source = \"vmware/avi\""));
        assert!(tf.contains("version = \"22.1.5\""));
        assert!(tf.contains("avi_password    = \"p\\\"w$${x}\""));
        assert!(tf.contains("avi_controller  = \"10.0.0.1\""));
    }

    #[test]
    fn import_blocks_and_legacy_resources() {
        let objects = vec![ExportedObject {
            uuid: "pool-1".into(),
            name: "web".into(),
        }];
        let tf = render_main_tf(&provider(), "pool", &objects, false);
        assert!(tf.ends_with("import {\n  to = avi_pool.pool-1\n  id = \"pool-1\"\n}\n"));

        let legacy = render_main_tf(&provider(), "pool", &objects, true);
        assert!(legacy.ends_with("resource \"avi_pool\" \"pool-1\" { }\n"));
    }

    #[test]
    fn selection_parameters() {
        let opts = Selection::Names(vec!["a".into(), "b".into()]).apply(RequestOptions::new());
        assert_eq!(opts.params, vec![("name.in".to_owned(), "a,b".to_owned())]);
        let opts = Selection::Names(vec!["a".into()]).apply(RequestOptions::new());
        assert_eq!(opts.params, vec![("name".to_owned(), "a".to_owned())]);
        let opts = Selection::Search("web".into()).apply(RequestOptions::new());
        assert_eq!(opts.params, vec![("search".to_owned(), "(name,web)".to_owned())]);
    }
}
