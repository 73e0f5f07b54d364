//! API token command handlers.

use tabled::Tabled;

use albctl_core::Controller;
use albctl_core::ops::tokens::{self, Token};

use crate::cli::{GlobalOpts, TokensArgs, TokensCommand};
use crate::error::CliError;
use crate::output::{self, Status};

use super::util;

#[derive(Tabled)]
struct TokenRow {
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Expires")]
    expires: String,
    #[tabled(rename = "Token")]
    token: String,
}

impl From<&Token> for TokenRow {
    fn from(t: &Token) -> Self {
        Self {
            uuid: t.uuid.clone(),
            user: t.user.clone(),
            expires: t.expires_at.clone(),
            token: t.token.clone(),
        }
    }
}

pub async fn handle(
    controller: &Controller,
    args: TokensArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        TokensCommand::List { username } => {
            let tokens = tokens::list(controller, username.as_deref()).await?;
            let out = output::render_list(
                global.output,
                &tokens,
                |t| TokenRow::from(t),
                |t| t.uuid.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TokensCommand::Create { username, expires } => {
            let token = tokens::create(controller, &username, expires).await?;
            let out = output::render_list(
                global.output,
                std::slice::from_ref(&token),
                |t| TokenRow::from(t),
                |t| t.token.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TokensCommand::Delete { uuid } => {
            if !util::confirm(&format!("Delete token {uuid}?"), global.yes)? {
                return Ok(());
            }
            tokens::delete(controller, &uuid).await?;
            util::status(global, &format!("Deleted token {uuid}"), Status::Ok);
            Ok(())
        }
    }
}
