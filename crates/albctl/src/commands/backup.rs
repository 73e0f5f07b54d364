//! Virtual service backup and restore handlers.
//!
//! Both list the matching virtual services, ask for confirmation (unless
//! `--yes`) and stop at the first failure. A backup file is only written
//! once every export has succeeded.

use secrecy::SecretString;

use albctl_core::Controller;
use albctl_core::ops::backup::{self, Archive, ExportOptions};

use crate::cli::{BackupArgs, GlobalOpts, RestoreArgs};
use crate::error::CliError;
use crate::output::Status;

use super::util;

/// `name`, or `name@tenant` when working across tenants.
fn display_name(name: &str, tenant: &str, all_tenants: bool) -> String {
    if all_tenants {
        format!("{name}@{tenant}")
    } else {
        name.to_owned()
    }
}

pub async fn handle_backup(
    controller: &Controller,
    args: BackupArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let pattern = util::glob("vs", &args.vs)?;
    let all_tenants = controller.tenant() == "*";

    util::note(global, "Looking for matching Virtual Services...");
    let selected = backup::select_for_backup(controller, &pattern).await?;
    if selected.is_empty() {
        util::note(global, "No matching Virtual Services found.");
        return Ok(());
    }
    let names: Vec<String> = selected
        .iter()
        .map(|vs| display_name(&vs.name, &vs.tenant, all_tenants))
        .collect();
    util::note(global, &names.join(" "));
    if !util::confirm("Confirm backing up these Virtual Services?", global.yes)? {
        return Ok(());
    }

    let options = ExportOptions {
        include_certs: args.include_certs,
        passphrase: args.passphrase.map(SecretString::from),
    };
    let bar = util::progress(selected.len(), global);
    let mut archive = Archive::new();
    for vs in &selected {
        bar.set_message(format!("Backing up {}", vs.name));
        let configuration = backup::export(controller, vs, &options).await?;
        backup::add_to_archive(&mut archive, vs, configuration);
        bar.inc(1);
    }
    bar.finish_and_clear();

    backup::write_archive(&args.file, &archive).await?;
    util::status(global, "Backup complete.", Status::Ok);
    Ok(())
}

pub async fn handle_restore(
    controller: &Controller,
    args: RestoreArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let pattern = util::glob("vs", &args.vs)?;
    let tenant = controller.tenant().to_owned();
    let all_tenants = tenant == "*";

    let archive = backup::read_archive(&args.file).await?;
    util::note(global, "Looking for matching Virtual Services...");
    let items = backup::select_for_restore(&archive, &tenant, &pattern);
    if items.is_empty() {
        util::note(global, "No matching Virtual Services found.");
        return Ok(());
    }
    let names: Vec<String> = items
        .iter()
        .map(|i| display_name(&i.name, &i.tenant, all_tenants))
        .collect();
    util::note(global, &names.join(" "));
    if !util::confirm("Confirm restoring these Virtual Services?", global.yes)? {
        return Ok(());
    }

    let passphrase = args.passphrase.map(SecretString::from);
    let bar = util::progress(items.len(), global);
    for item in &items {
        bar.set_message(format!("Restoring {}", item.name));
        backup::import(controller, item, passphrase.as_ref()).await?;
        bar.inc(1);
    }
    bar.finish_and_clear();
    util::status(
        global,
        &format!("Restored {} Virtual Service(s).", items.len()),
        Status::Ok,
    );
    Ok(())
}
