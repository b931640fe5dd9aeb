use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the rostergate binary.
#[derive(Debug, Parser)]
#[command(
    name = "rostergate",
    version,
    about = "Band-scoped permissions and object caching over a roster file"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "ROSTERGATE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Report whether a user may edit one content object.
    #[command(name = "can-edit")]
    CanEdit(CanEditArgs),
    /// List the ids of every content object a user may edit.
    Editable(EditableArgs),
    /// Resolve the booking address for an artist.
    #[command(name = "manager-email")]
    ManagerEmail(ManagerEmailArgs),
    /// Show which of the given actions a user's menu keeps.
    Actions(ActionsArgs),
}

impl Command {
    pub fn roster(&self) -> &RosterArgs {
        match self {
            Self::CanEdit(args) => &args.roster,
            Self::Editable(args) => &args.roster,
            Self::ManagerEmail(args) => &args.roster,
            Self::Actions(args) => &args.roster,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct RosterArgs {
    /// Roster file describing groups, users and content.
    #[arg(
        long = "roster",
        env = "ROSTERGATE_ROSTER",
        value_name = "FILE",
        value_hint = ValueHint::FilePath
    )]
    pub path: PathBuf,

    #[command(flatten)]
    pub overrides: SettingsOverrides,
}

impl RosterArgs {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Args, Default, Clone)]
pub struct SettingsOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Toggle the object cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the decision for objects outside any ownership scheme (deny|allow).
    #[arg(long = "unscoped-policy", value_name = "POLICY")]
    pub unscoped_policy: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct CanEditArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    /// Username of the acting user.
    #[arg(long, value_name = "USER")]
    pub actor: String,

    /// Id of the content object.
    #[arg(long, value_name = "ID")]
    pub object: i64,
}

#[derive(Debug, Args, Clone)]
pub struct EditableArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    /// Username of the acting user.
    #[arg(long, value_name = "USER")]
    pub actor: String,
}

#[derive(Debug, Args, Clone)]
pub struct ManagerEmailArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    /// Artist name as typed into the booking form.
    #[arg(long, value_name = "NAME", default_value = "")]
    pub artist: String,
}

#[derive(Debug, Args, Clone)]
pub struct ActionsArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    /// Username of the acting user.
    #[arg(long, value_name = "USER")]
    pub actor: String,

    /// Action names offered in the menu.
    #[arg(value_name = "ACTION", required = true)]
    pub actions: Vec<String>,
}
