//! Upgrade history handler.

use tabled::Tabled;

use albctl_core::Controller;
use albctl_core::ops::upgrades::{self, NodeHistory, UpgradeEvent};

use crate::cli::{GlobalOpts, UpgradesArgs, UpgradesCommand};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Completed")]
    completed: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Patch")]
    patch: String,
    #[tabled(rename = "State")]
    state: String,
}

impl From<&UpgradeEvent> for EventRow {
    fn from(e: &UpgradeEvent) -> Self {
        Self {
            completed: e.completed.clone(),
            version: e.version.clone(),
            patch: e.patch.clone(),
            state: e.state.clone(),
        }
    }
}

fn heading(node: &NodeHistory) -> String {
    if node.cloud.is_empty() {
        format!("{}: {}", node.kind, node.name)
    } else {
        format!("{}: {} ({})", node.kind, node.name, node.cloud)
    }
}

/// One section per node: heading line, then its events.
fn render_sections(nodes: &[NodeHistory]) -> String {
    nodes
        .iter()
        .map(|node| {
            let rows: Vec<EventRow> = node.events.iter().map(EventRow::from).collect();
            format!("{}\n{}", heading(node), output::render_table(&rows))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub async fn handle(
    controller: &Controller,
    args: UpgradesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        UpgradesCommand::History { all } => {
            let nodes = upgrades::history(controller, all).await?;
            let out = output::render_single(
                global.output,
                &nodes,
                |n| render_sections(n),
                |n| n.iter().map(heading).collect::<Vec<_>>().join("\n"),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
