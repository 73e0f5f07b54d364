//! WAF report handler.

use tabled::Tabled;

use albctl_core::Controller;
use albctl_core::ops::waf::{self, WafPolicyUsage};

use crate::cli::{GlobalOpts, WafArgs, WafCommand};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct WafRow {
    #[tabled(rename = "WAF Policy")]
    policy: String,
    #[tabled(rename = "Virtual Services")]
    virtual_services: String,
    #[tabled(rename = "Policy Mode")]
    mode: String,
    #[tabled(rename = "Paranoia Level")]
    paranoia_level: String,
}

impl From<&WafPolicyUsage> for WafRow {
    fn from(w: &WafPolicyUsage) -> Self {
        Self {
            policy: w.policy.clone(),
            virtual_services: w.virtual_services.clone(),
            mode: w.mode.clone(),
            paranoia_level: w.paranoia_level.clone(),
        }
    }
}

pub async fn handle(
    controller: &Controller,
    args: WafArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        WafCommand::Report => {
            let policies = waf::report(controller).await?;
            let out = output::render_list(
                global.output,
                &policies,
                |w| WafRow::from(w),
                |w| w.policy.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
