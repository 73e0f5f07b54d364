//! Move virtual services between SE groups.

use albctl_api::{JsonPatch, RequestOptions};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::text;
use crate::controller::Controller;
use crate::error::CoreError;

/// Name filters applied to the VSs of the source group.
#[derive(Debug, Clone, Default)]
pub struct VsFilter {
    /// When non-empty, only these VSs are moved.
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl VsFilter {
    /// `None` when the VS should move, otherwise why it is skipped.
    pub fn skip_reason(&self, name: &str) -> Option<&'static str> {
        if !self.include.is_empty() && !self.include.iter().any(|n| n == name) {
            Some("not in include list")
        } else if self.exclude.iter().any(|n| n == name) {
            Some("in exclude list")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Skipped {
    pub virtual_service: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Failed {
    pub virtual_service: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MoveSummary {
    pub updated: Vec<String>,
    pub skipped: Vec<Skipped>,
    pub failed: Vec<Failed>,
}

async fn lookup_group(ctrl: &Controller, name: &str) -> Result<Value, CoreError> {
    ctrl.session()
        .get_object_by_name(
            "serviceenginegroup",
            name,
            RequestOptions::new().param("fields", "uuid,url,name"),
        )
        .await?
        .ok_or_else(|| CoreError::not_found("SE Group", name))
}

/// Re-home every VS of `source` onto `dest`.
pub async fn move_virtual_services(
    ctrl: &Controller,
    source: &str,
    dest: &str,
    filter: &VsFilter,
) -> Result<MoveSummary, CoreError> {
    let source_group = lookup_group(ctrl, source).await?;
    let dest_group = lookup_group(ctrl, dest).await?;
    let patch = JsonPatch::replace("/se_group_ref", text(&dest_group, "url"));

    let vss = ctrl
        .session()
        .get_all(
            "virtualservice",
            RequestOptions::new().param(
                "refers_to",
                format!("serviceenginegroup:{}", text(&source_group, "uuid")),
            ),
        )
        .await?;

    let mut summary = MoveSummary::default();
    for vs in &vss {
        let name = text(vs, "name").to_owned();
        if let Some(reason) = filter.skip_reason(&name) {
            summary.skipped.push(Skipped {
                virtual_service: name,
                reason: reason.into(),
            });
            continue;
        }

        match ctrl
            .session()
            .patch_json::<Value>(
                &format!("virtualservice/{}", text(vs, "uuid")),
                &patch,
                &RequestOptions::new(),
            )
            .await
        {
            Ok(_) => {
                info!(vs = %name, dest, "moved virtual service");
                summary.updated.push(name);
            }
            Err(e) => {
                warn!(vs = %name, error = %e, "failed to move virtual service");
                summary.failed.push(Failed {
                    virtual_service: name,
                    error: e.to_string(),
                });
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_list_wins_then_exclude() {
        let filter = VsFilter {
            include: vec!["a".into(), "b".into()],
            exclude: vec!["b".into()],
        };
        assert_eq!(filter.skip_reason("a"), None);
        assert_eq!(filter.skip_reason("b"), Some("in exclude list"));
        assert_eq!(filter.skip_reason("c"), Some("not in include list"));
    }

    #[test]
    fn empty_filter_moves_everything() {
        assert_eq!(VsFilter::default().skip_reason("anything"), None);
    }
}
