//! Airtable User Info CLI library exports.

pub mod cli;
pub mod error;
pub mod settings;
pub mod telemetry;

#[cfg(test)]
mod test_env;

use crate::cli::{Cli, Command, IdentityArgs, ResolveArgs, SettingsCommand};
use crate::error::CliError;
use crate::settings::{SettingsStore, SettingsUpdate};
use airtable_user_client::{AirtableStore, ShortcodeHandler};
use airtable_user_core::{
    render_value, EnvIdentity, IdentityProvider, LookupRequest, StaticIdentity,
};
use std::io::{Read, Write};
use std::sync::Arc;

pub const USAGE_HELP: &str = "\
Shortcode usage:
  [airtable_user_info field_id='' default_value='']
    field_id       identifier of the field to display
    default_value  value shown when no data was found for the user or the field does not exist
";

type Handler = ShortcodeHandler<AirtableStore, SettingsStore, Arc<dyn IdentityProvider>>;

/// Execute a parsed command, reading templates from `input` and writing
/// results to `out`.
pub async fn run<R, W>(cli: Cli, mut input: R, out: &mut W) -> Result<(), CliError>
where
    R: Read,
    W: Write,
{
    let store = SettingsStore::from_path_option(cli.config)?;

    match cli.command {
        Command::Resolve(args) => resolve(store, args, out).await,
        Command::Render { file, identity } => {
            let template = match file {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    input.read_to_string(&mut buf)?;
                    buf
                }
            };
            let handler = build_handler(store, &identity)?;
            let rendered = handler.render_template(&template).await;
            out.write_all(rendered.as_bytes())?;
            Ok(())
        }
        Command::Settings { command } => match command {
            SettingsCommand::Show => {
                let settings = store.load_effective()?;
                writeln!(out, "Settings file: {}", store.path().display())?;
                write!(out, "{}", settings.display_masked())?;
                writeln!(out)?;
                write!(out, "{}", USAGE_HELP)?;
                Ok(())
            }
            SettingsCommand::Set(args) => {
                let update = SettingsUpdate::from(args);
                if update.is_empty() {
                    writeln!(out, "No changes")?;
                    return Ok(());
                }
                let settings = store.update(&update)?;
                writeln!(out, "Saved {}", store.path().display())?;
                write!(out, "{}", settings.display_masked())?;
                Ok(())
            }
        },
    }
}

async fn resolve<W: Write>(
    store: SettingsStore,
    args: ResolveArgs,
    out: &mut W,
) -> Result<(), CliError> {
    let request = LookupRequest::new(args.field_id, args.default_value);
    let handler = build_handler(store.clone(), &args.identity)?;

    if args.strict {
        // Surface the cause instead of the default value.
        let config = store.load_effective()?.airtable;
        let email = identity_provider(&args.identity).current_email();
        let value = handler
            .resolver()
            .try_resolve(&email, &request, &config)
            .await?;
        writeln!(out, "{}", render_value(&value))?;
    } else {
        let resolution = handler.invoke(&request).await;
        writeln!(out, "{}", resolution.render())?;
    }
    Ok(())
}

fn build_handler(store: SettingsStore, identity: &IdentityArgs) -> Result<Handler, CliError> {
    let settings = store.load()?;
    let records = AirtableStore::new(&settings.client)?;
    Ok(ShortcodeHandler::new(records, store, identity_provider(identity)))
}

fn identity_provider(args: &IdentityArgs) -> Arc<dyn IdentityProvider> {
    match &args.email {
        Some(email) => Arc::new(StaticIdentity::authenticated(email.clone())),
        None => Arc::new(EnvIdentity),
    }
}
