//! Upgrade history per controller cluster, SE group and SE.

use albctl_api::RequestOptions;
use albctl_api::refs::ref_name_or_empty;
use serde::Serialize;
use serde_json::Value;
use strum::Display;

use super::{array, scalar, text, text_at};
use crate::controller::Controller;
use crate::error::CoreError;

/// Kind of node an upgrade status belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum NodeKind {
    #[strum(to_string = "Controller")]
    Controller,
    #[strum(to_string = "SE Group")]
    SeGroup,
    #[strum(to_string = "SE")]
    ServiceEngine,
    #[strum(to_string = "???")]
    Unknown,
}

impl NodeKind {
    fn from_node_type(node_type: &str) -> Self {
        match node_type {
            "NODE_CONTROLLER_CLUSTER" => Self::Controller,
            "NODE_SE_GROUP" => Self::SeGroup,
            "NODE_SE_TYPE" => Self::ServiceEngine,
            _ => Self::Unknown,
        }
    }
}

/// One completed (or attempted) upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeEvent {
    pub completed: String,
    pub version: String,
    pub patch: String,
    pub state: String,
}

/// History of one node.
#[derive(Debug, Clone, Serialize)]
pub struct NodeHistory {
    pub kind: NodeKind,
    pub name: String,
    /// Empty for nodes not tied to a cloud.
    pub cloud: String,
    pub events: Vec<UpgradeEvent>,
}

fn event_from(value: &Value) -> UpgradeEvent {
    UpgradeEvent {
        completed: text(value, "end_time").to_owned(),
        version: text(value, "version").to_owned(),
        patch: scalar(value.get("patch_version")),
        state: text_at(value, "/state/state").to_owned(),
    }
}

/// Flatten one `upgradestatusinfo` object. The current status is appended
/// to the history once it has finished (has an `end_time`).
pub fn node_history(status: &Value) -> NodeHistory {
    let mut events: Vec<UpgradeEvent> = array(status, "history").iter().map(event_from).collect();
    if status.get("end_time").is_some() {
        events.push(event_from(status));
    }
    NodeHistory {
        kind: NodeKind::from_node_type(text(status, "node_type")),
        name: text(status, "name").to_owned(),
        cloud: ref_name_or_empty(text(status, "obj_cloud_ref")).to_owned(),
        events,
    }
}

/// Upgrade history of the controller cluster, or of every node with `all`.
pub async fn history(ctrl: &Controller, all: bool) -> Result<Vec<NodeHistory>, CoreError> {
    let mut opts = RequestOptions::new()
        .param("include_history", true)
        .param("include_name", true);
    if !all {
        opts = opts.param("node_type", "NODE_CONTROLLER_CLUSTER");
    }
    let statuses = ctrl.session().get_all("upgradestatusinfo", opts).await?;
    Ok(statuses.iter().map(node_history).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn finished_current_status_is_appended() {
        let status = json!({
            "name": "cluster-0-1",
            "node_type": "NODE_CONTROLLER_CLUSTER",
            "history": [{
                "end_time": "2023-01-10 10:00:00",
                "version": "21.1.4",
                "state": {"state": "UPGRADE_FSM_COMPLETED"}
            }],
            "end_time": "2024-03-02 09:00:00",
            "version": "22.1.5",
            "patch_version": "2p3",
            "state": {"state": "UPGRADE_FSM_COMPLETED"}
        });
        let node = node_history(&status);
        assert_eq!(node.kind, NodeKind::Controller);
        assert_eq!(node.cloud, "");
        assert_eq!(node.events.len(), 2);
        assert_eq!(
            node.events[1],
            UpgradeEvent {
                completed: "2024-03-02 09:00:00".into(),
                version: "22.1.5".into(),
                patch: "2p3".into(),
                state: "UPGRADE_FSM_COMPLETED".into(),
            }
        );
        assert_eq!(node.events[0].patch, "");
    }

    #[test]
    fn in_progress_status_is_not_appended() {
        let node = node_history(&json!({
            "name": "Default-Group",
            "node_type": "NODE_SE_GROUP",
            "obj_cloud_ref": "https://c/api/cloud/cloud-1#Default-Cloud",
            "state": {"state": "UPGRADE_FSM_IN_PROGRESS"}
        }));
        assert_eq!(node.kind.to_string(), "SE Group");
        assert_eq!(node.cloud, "Default-Cloud");
        assert!(node.events.is_empty());
    }
}
