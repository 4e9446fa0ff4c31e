//! Command-line definitions.

use crate::settings::{SettingsUpdate, CONFIG_PATH_ENV};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "airtable-user-info")]
#[command(about = "Look up the current user's Airtable record fields", version)]
pub struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true, env = CONFIG_PATH_ENV)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve one field for the current user
    Resolve(ResolveArgs),

    /// Expand every [airtable_user_info] shortcode in a template
    Render {
        /// Template file; stdin when omitted
        file: Option<PathBuf>,

        #[command(flatten)]
        identity: IdentityArgs,
    },

    /// Show or change the stored settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Identifier of the field to display
    #[arg(long, default_value = "")]
    pub field_id: String,

    /// Value shown when no record or field is found for the user
    #[arg(long, default_value = "")]
    pub default_value: String,

    /// Fail with the lookup error instead of printing the default value
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub identity: IdentityArgs,
}

#[derive(Debug, Args)]
pub struct IdentityArgs {
    /// Email of the current user; falls back to AIRTABLE_USER_INFO_EMAIL
    #[arg(long)]
    pub email: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print the settings with the token masked
    Show,

    /// Store one or more Airtable options
    Set(SetArgs),
}

#[derive(Debug, Args)]
pub struct SetArgs {
    #[arg(long)]
    pub base_id: Option<String>,

    #[arg(long)]
    pub table_id: Option<String>,

    #[arg(long)]
    pub email_field_id: Option<String>,

    #[arg(long)]
    pub bearer_token: Option<String>,
}

impl From<SetArgs> for SettingsUpdate {
    fn from(args: SetArgs) -> Self {
        Self {
            base_id: args.base_id,
            table_id: args.table_id,
            email_field_id: args.email_field_id,
            bearer_token: args.bearer_token,
        }
    }
}
