//! Sticky pool-group failover.
//!
//! When a pool goes down the pool group fails over to the next priority.
//! To stop it failing back once the original pool recovers, the
//! highest-priority available member swaps priority labels with the
//! highest-priority unavailable member whenever the latter outranks it.

use std::fmt;

use albctl_api::refs::ref_path;
use albctl_api::{MAX_RETRIES, RequestOptions};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{array, text, text_at};
use crate::controller::Controller;
use crate::error::CoreError;

/// Runtime view of one pool-group member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Position in the pool group's `members` array.
    pub index: usize,
    pub name: String,
    /// Raw `priority_label`, written back unchanged when swapped.
    pub label: String,
    pub priority: i64,
    pub up: bool,
}

/// What the failover should do with the current member states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan<'a> {
    AllDown,
    AllUp,
    /// The best available pool already outranks the best unavailable one.
    Keep { up: &'a Member, down: &'a Member },
    Swap { up: &'a Member, down: &'a Member },
}

/// Highest-priority up and down members; ties keep the first seen.
pub fn plan(members: &[Member]) -> Plan<'_> {
    let mut best_up: Option<&Member> = None;
    let mut best_down: Option<&Member> = None;
    for member in members {
        let slot = if member.up { &mut best_up } else { &mut best_down };
        if slot.is_none_or(|best| best.priority < member.priority) {
            *slot = Some(member);
        }
    }
    match (best_up, best_down) {
        (None, _) => Plan::AllDown,
        (Some(_), None) => Plan::AllUp,
        (Some(up), Some(down)) if down.priority <= up.priority => Plan::Keep { up, down },
        (Some(up), Some(down)) => Plan::Swap { up, down },
    }
}

/// Result of a failover run. `Display` gives the operator message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum FailoverOutcome {
    NoPoolGroup { pool: String },
    AllDown,
    AllUp,
    NoActionNeeded { up: String, down: String },
    Swapped {
        up: String,
        up_priority: String,
        down: String,
        down_priority: String,
    },
}

impl fmt::Display for FailoverOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPoolGroup { pool } => write!(f, "No pool group found referencing pool {pool}"),
            Self::AllDown => {
                f.write_str("No action required as all pools in the pool group are now down.")
            }
            Self::AllUp => {
                f.write_str("No action required as all pools in the pool group are now up.")
            }
            Self::NoActionNeeded { up, down } => write!(
                f,
                "No action required. The highest-priority available pool ({up}) has a higher \
                 priority than the highest-priority non-available pool ({down})"
            ),
            Self::Swapped {
                up,
                up_priority,
                down,
                down_priority,
            } => write!(
                f,
                "Pool {up} priority changed to {up_priority}, Pool {down} priority changed to {down_priority}"
            ),
        }
    }
}

async fn member_state(
    ctrl: &Controller,
    index: usize,
    member: &Value,
) -> Result<Member, CoreError> {
    let label = text(member, "priority_label");
    let priority = label.trim().parse::<i64>().map_err(|_| {
        CoreError::validation(format!("pool group member has non-numeric priority {label:?}"))
    })?;
    let pool_ref = text(member, "pool_ref");
    let path = ref_path(pool_ref)
        .ok_or_else(|| CoreError::unexpected(format!("bad pool reference {pool_ref:?}")))?;

    let detail: Value = ctrl
        .session()
        .get_json(&format!("{path}/runtime/detail"), &RequestOptions::new())
        .await?;
    let runtime = detail
        .get(0)
        .ok_or_else(|| CoreError::unexpected(format!("no runtime detail for {path}")))?;

    Ok(Member {
        index,
        name: text(runtime, "name").to_owned(),
        label: label.to_owned(),
        priority,
        up: text_at(runtime, "/oper_status/state") == "OPER_UP",
    })
}

/// Re-prioritise the pool group that references `pool_uuid`.
///
/// The group is re-read and re-planned on every attempt; a write rejected
/// with 412 (concurrent modification) is retried up to [`MAX_RETRIES`] times.
pub async fn failover(
    ctrl: &Controller,
    pool_uuid: &str,
    pool_name: &str,
) -> Result<FailoverOutcome, CoreError> {
    let session = ctrl.session();
    for attempt in 1..=MAX_RETRIES {
        let groups: Value = session
            .get_json(
                "poolgroup",
                &RequestOptions::new().param("refers_to", format!("pool:{pool_uuid}")),
            )
            .await?;
        let Some(group) = array(&groups, "results").first() else {
            return Ok(FailoverOutcome::NoPoolGroup {
                pool: pool_name.to_owned(),
            });
        };
        let group_uuid = text(group, "uuid").to_owned();
        debug!(%group_uuid, attempt, "evaluating pool group");

        let mut members = Vec::new();
        for (index, member) in array(group, "members").iter().enumerate() {
            members.push(member_state(ctrl, index, member).await?);
        }

        let (up, down) = match plan(&members) {
            Plan::AllDown => return Ok(FailoverOutcome::AllDown),
            Plan::AllUp => return Ok(FailoverOutcome::AllUp),
            Plan::Keep { up, down } => {
                return Ok(FailoverOutcome::NoActionNeeded {
                    up: up.name.clone(),
                    down: down.name.clone(),
                });
            }
            Plan::Swap { up, down } => (up, down),
        };

        let mut updated = group.clone();
        for (member, label) in [(up, &down.label), (down, &up.label)] {
            if let Some(slot) = updated.pointer_mut(&format!("/members/{}/priority_label", member.index)) {
                *slot = Value::String(label.clone());
            }
        }

        match session
            .put_json::<Value>(&format!("poolgroup/{group_uuid}"), &updated, &RequestOptions::new())
            .await
        {
            Ok(_) => {
                info!(up = %up.name, down = %down.name, "pool priorities swapped");
                return Ok(FailoverOutcome::Swapped {
                    up: up.name.clone(),
                    up_priority: down.label.clone(),
                    down: down.name.clone(),
                    down_priority: up.label.clone(),
                });
            }
            Err(albctl_api::Error::Conflict { .. }) => {
                warn!(attempt, "pool group changed underneath us, retrying");
            }
            Err(e) => {
                return Err(CoreError::OperationFailed {
                    message: format!("Error setting pool priority: {e}"),
                });
            }
        }
    }
    Err(CoreError::OperationFailed {
        message: "Too many retry attempts - aborting!".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn member(index: usize, name: &str, priority: i64, up: bool) -> Member {
        Member {
            index,
            name: name.into(),
            label: priority.to_string(),
            priority,
            up,
        }
    }

    #[test]
    fn down_primary_outranking_backup_is_swapped() {
        let members = [
            member(0, "primary", 10, false),
            member(1, "backup", 5, true),
        ];
        match plan(&members) {
            Plan::Swap { up, down } => {
                assert_eq!(up.name, "backup");
                assert_eq!(down.name, "primary");
            }
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn available_pool_already_highest() {
        let members = [
            member(0, "primary", 10, true),
            member(1, "backup", 5, false),
        ];
        assert!(matches!(plan(&members), Plan::Keep { .. }));

        let equal = [member(0, "a", 5, true), member(1, "b", 5, false)];
        assert!(matches!(plan(&equal), Plan::Keep { .. }));
    }

    #[test]
    fn uniform_state_needs_nothing() {
        assert_eq!(plan(&[member(0, "a", 1, false)]), Plan::AllDown);
        assert_eq!(plan(&[member(0, "a", 1, true), member(1, "b", 2, true)]), Plan::AllUp);
        assert_eq!(plan(&[]), Plan::AllDown);
    }

    #[test]
    fn ties_keep_first_member() {
        let members = [
            member(0, "first-down", 9, false),
            member(1, "second-down", 9, false),
            member(2, "up-low", 1, true),
            member(3, "up-high", 4, true),
        ];
        match plan(&members) {
            Plan::Swap { up, down } => {
                assert_eq!(down.name, "first-down");
                assert_eq!(up.name, "up-high");
            }
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn outcome_messages() {
        let swapped = FailoverOutcome::Swapped {
            up: "backup".into(),
            up_priority: "10".into(),
            down: "primary".into(),
            down_priority: "5".into(),
        };
        assert_eq!(
            swapped.to_string(),
            "Pool backup priority changed to 10, Pool primary priority changed to 5"
        );
        assert_eq!(
            FailoverOutcome::NoPoolGroup { pool: "web".into() }.to_string(),
            "No pool group found referencing pool web"
        );
    }
}
