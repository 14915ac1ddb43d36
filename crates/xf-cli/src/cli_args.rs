use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "xf-cli")]
#[command(about = "XML document <-> form sync CLI")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    /// Load a document through a template and write it straight back.
    Roundtrip(RoundtripArgs),
    Session(SessionArgs),
}

#[derive(Debug, Args)]
pub(crate) struct RoundtripArgs {
    #[arg(long = "template")]
    pub(crate) template: String,
    #[arg(long = "document")]
    pub(crate) document: Option<String>,
    #[arg(long = "indent")]
    pub(crate) indent: bool,
}

#[derive(Debug, Args)]
pub(crate) struct SessionArgs {
    #[command(subcommand)]
    pub(crate) command: SessionCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum SessionCommand {
    Start(StartArgs),
    Set(SetArgs),
    Add(GroupArgs),
    Remove(RemoveArgs),
    Select(SelectArgs),
    Show(ShowArgs),
    Save(SaveArgs),
}

#[derive(Debug, Args)]
pub(crate) struct StartArgs {
    #[arg(long = "template")]
    pub(crate) template: String,
    #[arg(long = "document")]
    pub(crate) document: Option<String>,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct SetArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "path")]
    pub(crate) path: String,
    #[arg(long = "value")]
    pub(crate) value: String,
    /// Create missing instances and reveal hidden alternatives first.
    #[arg(long = "fill")]
    pub(crate) fill: bool,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct GroupArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "group")]
    pub(crate) group: String,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct RemoveArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "group")]
    pub(crate) group: String,
    /// Confirm the removal; without it the command only reports the prompt.
    #[arg(long = "yes")]
    pub(crate) yes: bool,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct SelectArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "group")]
    pub(crate) group: String,
    #[arg(long = "instance", default_value_t = 1)]
    pub(crate) instance: usize,
    /// Alternative to select; omit to clear the selection.
    #[arg(long = "alternative")]
    pub(crate) alternative: Option<String>,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct ShowArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
}

#[derive(Debug, Args)]
pub(crate) struct SaveArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    /// Also write the document to this file.
    #[arg(long = "out")]
    pub(crate) out: Option<String>,
    #[arg(long = "indent")]
    pub(crate) indent: bool,
}
