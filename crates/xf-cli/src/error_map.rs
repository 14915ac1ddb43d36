use std::fmt::Display;
use xf_core::XformError;

fn map_error(code: &'static str, error: impl Display) -> XformError {
    XformError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: XformError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).expect("string json")
    );
    1
}

pub(crate) fn map_cli_source_path(error: std::io::Error) -> XformError {
    map_error("CLI_SOURCE_PATH", error)
}

pub(crate) fn map_cli_source_read(error: std::io::Error) -> XformError {
    map_error("CLI_SOURCE_READ", error)
}

pub(crate) fn map_cli_output_write(error: std::io::Error) -> XformError {
    map_error("CLI_OUTPUT_WRITE", error)
}

pub(crate) fn map_cli_state_write(error: std::io::Error) -> XformError {
    map_error("CLI_STATE_WRITE", error)
}

pub(crate) fn map_cli_state_read(error: std::io::Error) -> XformError {
    map_error("CLI_STATE_READ", error)
}

pub(crate) fn map_cli_state_invalid(error: serde_json::Error) -> XformError {
    map_error("CLI_STATE_INVALID", error)
}
