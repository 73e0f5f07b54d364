//! Unused object report and interactive clean-up.

use dialoguer::Input;
use tabled::Tabled;

use albctl_core::Controller;
use albctl_core::ops::unused::{
    self, Decision, DeletionMode, DeletionPolicy, PromptAnswer, UnusedObject,
};

use crate::cli::{GlobalOpts, OutputFormat, UnusedArgs};
use crate::error::{CliError, prompt_err};
use crate::output::{self, Status};

use super::util;

#[derive(Tabled)]
struct UnusedRow {
    #[tabled(rename = "Type")]
    object_type: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Tenant")]
    tenant: String,
    #[tabled(rename = "UUID")]
    uuid: String,
}

impl From<&UnusedObject> for UnusedRow {
    fn from(o: &UnusedObject) -> Self {
        Self {
            object_type: o.object_type.clone(),
            name: o.name.clone(),
            tenant: o.tenant.clone(),
            uuid: o.uuid.clone(),
        }
    }
}

const CHOICES: &str = "Deletion action choices:\n\
    [Y]es = Delete the current object\n\
    [N]o = Do not delete the current object\n\
    [S]kip = Do not delete any more objects of this type\n\
    [T]ype = Delete all unused objects of this type\n\
    [A]ll = Delete all unused objects of all types\n";

/// `name`, `name / tenant` across tenants, plus the UUID with `--show-uuid`.
fn label(object: &UnusedObject, all_tenants: bool, show_uuid: bool) -> String {
    let mut parts = vec![object.name.as_str()];
    if all_tenants || show_uuid {
        parts.push(&object.tenant);
    }
    if show_uuid {
        parts.push(&object.uuid);
    }
    parts.join(" / ")
}

fn ask() -> Result<PromptAnswer, CliError> {
    let answer: String = Input::new()
        .with_prompt("Delete [Y]es, [N]o, [S]kip, [T]ype, [A]ll?")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;
    Ok(PromptAnswer::parse(&answer))
}

pub async fn handle(
    controller: &Controller,
    args: UnusedArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let types = unused::object_types(&args.object_types);
    let mode = if args.force {
        DeletionMode::All
    } else if args.delete {
        DeletionMode::Prompt
    } else {
        DeletionMode::Never
    };

    // Report only, structured: gather everything and render once.
    if mode == DeletionMode::Never && global.output != OutputFormat::Table {
        let mut found = Vec::new();
        for object_type in &types {
            found.extend(unused::find(controller, object_type, args.include_system).await?);
        }
        let out = output::render_list(
            global.output,
            &found,
            |o| UnusedRow::from(o),
            |o| o.uuid.clone(),
        );
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    if mode == DeletionMode::Prompt {
        println!("{CHOICES}");
    }

    let all_tenants = controller.tenant() == "*";
    let explicit_types = !args.object_types.is_empty();
    let mut policy = DeletionPolicy::new(mode);

    for object_type in &types {
        let objects = unused::find(controller, object_type, args.include_system).await?;
        if objects.is_empty() {
            if explicit_types {
                println!("\nUnused {object_type} objects: NONE");
            }
            continue;
        }
        println!("\nUnused {object_type} objects:");

        for object in &objects {
            println!("{}", label(object, all_tenants, args.show_uuid));
            let answer = if policy.needs_prompt() { Some(ask()?) } else { None };
            match policy.decide(answer) {
                Decision::Keep => {}
                Decision::SkipType => break,
                Decision::Delete => {
                    let what = format!("{} / {} / {}", object.name, object.tenant, object.uuid);
                    match unused::delete(controller, object).await {
                        Ok(()) => util::status(global, &format!("Deleting {what}...OK"), Status::Ok),
                        Err(e) => util::status(
                            global,
                            &format!("Deleting {what}...Failed: {e}"),
                            Status::Failed,
                        ),
                    }
                }
            }
        }
        policy.finish_type();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object() -> UnusedObject {
        UnusedObject {
            object_type: "pool".into(),
            name: "old-pool".into(),
            tenant: "team-a".into(),
            uuid: "pool-1".into(),
            url: "https://c/api/pool/pool-1".into(),
        }
    }

    #[test]
    fn label_widens_with_tenant_scope_and_uuid() {
        assert_eq!(label(&object(), false, false), "old-pool");
        assert_eq!(label(&object(), true, false), "old-pool / team-a");
        assert_eq!(label(&object(), false, true), "old-pool / team-a / pool-1");
    }
}
