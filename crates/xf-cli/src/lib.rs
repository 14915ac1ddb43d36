use std::ffi::OsString;

use clap::Parser;
use xf_api::{roundtrip_xml, WriteOptions};
use xf_core::XformError;

mod cli_args;
mod error_map;
mod models;
mod session;
mod source_loader;
mod state_store;

pub(crate) use cli_args::{
    Cli, GroupArgs, Mode, RemoveArgs, RoundtripArgs, SaveArgs, SelectArgs, SessionArgs,
    SessionCommand, SetArgs, ShowArgs, StartArgs,
};
pub(crate) use error_map::{
    emit_error, map_cli_output_write, map_cli_source_path, map_cli_source_read,
    map_cli_state_invalid, map_cli_state_read, map_cli_state_write,
};
pub(crate) use models::{FormStateV1, LoadedSource, FORM_STATE_SCHEMA};
pub(crate) use source_loader::load_source;
#[cfg(test)]
pub(crate) use source_loader::resolve_source_file;
pub(crate) use state_store::{load_form_state, save_form_state};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, XformError> {
    match cli.command {
        Mode::Roundtrip(args) => run_roundtrip(args),
        Mode::Session(args) => session::run_session(args),
    }
}

fn run_roundtrip(args: RoundtripArgs) -> Result<i32, XformError> {
    let source = load_source(&args.template, args.document.as_deref())?;
    let xml = roundtrip_xml(
        &source.template_xml,
        source.document_xml.as_deref(),
        &WriteOptions {
            indent: args.indent,
            declaration: false,
        },
    )?;
    session::emit_xml(&xml);
    Ok(0)
}


#[cfg(test)]
mod tests;
