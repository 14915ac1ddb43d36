use std::fs;
use std::path::Path;

use xf_core::XformError;

use crate::{
    map_cli_state_invalid, map_cli_state_read, map_cli_state_write, FormStateV1,
    FORM_STATE_SCHEMA,
};

pub(crate) fn save_form_state(path: &Path, state: &FormStateV1) -> Result<(), XformError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(map_cli_state_write)?;

    let payload = serde_json::to_string(state).expect("form state should serialize");
    fs::write(path, payload).map_err(map_cli_state_write)
}

pub(crate) fn load_form_state(path: &Path) -> Result<FormStateV1, XformError> {
    if !path.exists() {
        return Err(XformError::new(
            "CLI_STATE_NOT_FOUND",
            format!("State file does not exist: {}", path.display()),
        ));
    }

    let raw = fs::read_to_string(path).map_err(map_cli_state_read)?;

    let state: FormStateV1 = serde_json::from_str(&raw).map_err(map_cli_state_invalid)?;

    if state.schema_version != FORM_STATE_SCHEMA {
        return Err(XformError::new(
            "CLI_STATE_SCHEMA",
            format!("Unsupported form state schema: {}", state.schema_version),
        ));
    }

    Ok(state)
}
