//! Find (and optionally delete) configuration objects nothing refers to.
//!
//! Discovery and deletion are separate calls so the caller can drive an
//! interactive confirmation loop through [`DeletionPolicy`].

use std::collections::BTreeSet;

use albctl_api::RequestOptions;
use albctl_api::refs::{ref_name_or_empty, ref_path};
use serde::Serialize;
use tracing::{debug, info};

use super::text;
use crate::controller::Controller;
use crate::error::CoreError;

/// Object types that can be checked for references.
pub const OBJECT_TYPES: &[&str] = &[
    "actiongroupconfig",
    "alert",
    "alertconfig",
    "alertemailconfig",
    "alertscriptconfig",
    "alertsyslogconfig",
    "analyticsprofile",
    "application",
    "applicationpersistenceprofile",
    "applicationprofile",
    "authmappingprofile",
    "authprofile",
    "autoscalelaunchconfig",
    "availabilityzone",
    "botconfigconsolidator",
    "botdetectionpolicy",
    "botipreputationtypemapping",
    "botmapping",
    "certificatemanagementprofile",
    "cloud",
    "cloudconnectoruser",
    "customipamdnsprofile",
    "dnspolicy",
    "errorpagebody",
    "errorpageprofile",
    "geodb",
    "gslbgeodbprofile",
    "gslbservice",
    "hardwaresecuritymodulegroup",
    "healthmonitor",
    "httppolicyset",
    "icapprofile",
    "ipaddrgroup",
    "ipamdnsproviderprofile",
    "ipreputationdb",
    "jwtserverprofile",
    "l4policyset",
    "labelgroup",
    "natpolicy",
    "network",
    "networkprofile",
    "networksecuritypolicy",
    "networkservice",
    "pingaccessagent",
    "pkiprofile",
    "pool",
    "poolgroup",
    "prioritylabels",
    "protocolparser",
    "role",
    "scheduler",
    "securitypolicy",
    "serverautoscalepolicy",
    "serviceengine",
    "serviceenginegroup",
    "snmptrapprofile",
    "sslkeyandcertificate",
    "sslprofile",
    "ssopolicy",
    "stringgroup",
    "tenant",
    "trafficcloneprofile",
    "vcenterserver",
    "virtualservice",
    "vrfcontext",
    "vsdatascriptset",
    "vsvip",
    "wafcrs",
    "wafpolicy",
    "wafpolicypsmgroup",
    "wafprofile",
    "webhook",
];

/// Types skipped unless asked for explicitly: top-level objects that are
/// legitimately unreferenced.
pub const EXCLUDED_BY_DEFAULT: &[&str] = &["gslbservice", "network", "virtualservice", "wafcrs"];

/// Built-in objects that are never referenced but must not be removed.
pub fn default_object_names(object_type: &str) -> &'static [&'static str] {
    match object_type {
        "vrfcontext" => &["management"],
        "certificatemanagementprofile" => &["LetsEncryptCertificateManagementProfile"],
        "ipaddrgroup" => &["Internal"],
        "autoscalelaunchconfig" => &["default-autoscalelaunchconfig"],
        "protocolparser" => &["Default-DHCP", "Default-Radius", "Default-FIX", "Default-TLS"],
        "role" => &[
            "Application-Admin",
            "Tenant-Admin",
            "Application-Operator",
            "Security-Admin",
            "WAF-Admin",
        ],
        "actiongroupconfig" => &["Syslog-Audit-Persistence"],
        "serviceenginegroup" => &["Default-Group"],
        "vsdatascriptset" => &["Default-PASV-FTP", "Default-ACTIVE-FTP", "Default-FULL-FTP"],
        "alertconfig" => &["Syslog-System-Events"],
        "errorpageprofile" => &["Custom-Error-Page-Profile"],
        _ => &[],
    }
}

/// True for `System-*` objects and the per-type defaults above.
pub fn is_system_object(object_type: &str, name: &str) -> bool {
    name.starts_with("System-") || default_object_names(object_type).contains(&name)
}

/// Types to check: the requested ones that are known (case-insensitive),
/// or every type except [`EXCLUDED_BY_DEFAULT`]. Sorted, deduplicated.
pub fn object_types(requested: &[String]) -> Vec<String> {
    let known: BTreeSet<&str> = OBJECT_TYPES.iter().copied().collect();
    if requested.is_empty() {
        return known
            .into_iter()
            .filter(|t| !EXCLUDED_BY_DEFAULT.contains(t))
            .map(str::to_owned)
            .collect();
    }
    requested
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| known.contains(t.as_str()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnusedObject {
    pub object_type: String,
    pub name: String,
    pub tenant: String,
    pub uuid: String,
    pub url: String,
}

/// Unreferenced objects of one type, system objects filtered out unless
/// `include_system`.
pub async fn find(
    ctrl: &Controller,
    object_type: &str,
    include_system: bool,
) -> Result<Vec<UnusedObject>, CoreError> {
    let objects = ctrl
        .session()
        .get_all(
            object_type,
            RequestOptions::new()
                .param("referred_by", "any:none")
                .param("fields", "tenant_ref")
                .param("include_name", true),
        )
        .await?;
    debug!(object_type, count = objects.len(), "unreferenced objects");

    Ok(objects
        .iter()
        .map(|obj| UnusedObject {
            object_type: object_type.to_owned(),
            name: text(obj, "name").to_owned(),
            tenant: ref_name_or_empty(text(obj, "tenant_ref")).to_owned(),
            uuid: text(obj, "uuid").to_owned(),
            url: text(obj, "url").to_owned(),
        })
        .filter(|o| include_system || !is_system_object(object_type, &o.name))
        .collect())
}

/// Delete one object in its own tenant.
pub async fn delete(ctrl: &Controller, object: &UnusedObject) -> Result<(), CoreError> {
    let path = ref_path(&object.url)
        .map(str::to_owned)
        .unwrap_or_else(|| format!("{}/{}", object.object_type, object.uuid));
    info!(%path, tenant = %object.tenant, "deleting unused object");
    ctrl.session()
        .delete(&path, &RequestOptions::new().tenant(object.tenant.clone()))
        .await?;
    Ok(())
}

// ── Deletion policy ──────────────────────────────────────────────────

/// How deletions are confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionMode {
    /// Report only.
    Never,
    /// Ask for every object.
    Prompt,
    /// Delete the rest of the current type, then go back to prompting.
    Type,
    /// Delete everything without asking.
    All,
}

/// Answer to the per-object confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAnswer {
    Yes,
    No,
    /// Leave the remaining objects of this type alone.
    Skip,
    /// Delete this and the remaining objects of this type.
    Type,
    /// Delete this and everything after it.
    All,
}

impl PromptAnswer {
    /// Accepts any prefix of yes / no / skip / type / all, any case.
    /// Anything else, including an empty answer, is `No`.
    pub fn parse(input: &str) -> Self {
        let input = input.trim().to_lowercase();
        if input.is_empty() {
            return Self::No;
        }
        [
            ("yes", Self::Yes),
            ("no", Self::No),
            ("skip", Self::Skip),
            ("type", Self::Type),
            ("all", Self::All),
        ]
        .into_iter()
        .find(|(word, _)| word.starts_with(&input))
        .map_or(Self::No, |(_, answer)| answer)
    }
}

/// What to do with the current object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Delete,
    Keep,
    /// Keep this object and stop processing its type.
    SkipType,
}

/// Tracks the deletion mode across objects and types.
#[derive(Debug, Clone, Copy)]
pub struct DeletionPolicy {
    mode: DeletionMode,
}

impl DeletionPolicy {
    pub fn new(mode: DeletionMode) -> Self {
        Self { mode }
    }

    pub fn mode(self) -> DeletionMode {
        self.mode
    }

    /// The caller must ask before deciding.
    pub fn needs_prompt(self) -> bool {
        self.mode == DeletionMode::Prompt
    }

    /// Decide for one object. `answer` is only consulted in prompt mode.
    pub fn decide(&mut self, answer: Option<PromptAnswer>) -> Decision {
        match self.mode {
            DeletionMode::Never => Decision::Keep,
            DeletionMode::Type | DeletionMode::All => Decision::Delete,
            DeletionMode::Prompt => match answer.unwrap_or(PromptAnswer::No) {
                PromptAnswer::Yes => Decision::Delete,
                PromptAnswer::No => Decision::Keep,
                PromptAnswer::Skip => Decision::SkipType,
                PromptAnswer::Type => {
                    self.mode = DeletionMode::Type;
                    Decision::Delete
                }
                PromptAnswer::All => {
                    self.mode = DeletionMode::All;
                    Decision::Delete
                }
            },
        }
    }

    /// Call when moving to the next object type.
    pub fn finish_type(&mut self) {
        if self.mode == DeletionMode::Type {
            self.mode = DeletionMode::Prompt;
        }
    }
}
