use std::fs;
use std::path::PathBuf;

use xf_core::XformError;

use crate::{map_cli_source_path, map_cli_source_read, LoadedSource};

pub(crate) fn load_source(template: &str, document: Option<&str>) -> Result<LoadedSource, XformError> {
    let template_path = resolve_source_file(template)?;
    let template_xml = fs::read_to_string(&template_path).map_err(map_cli_source_read)?;
    let document_xml = match document {
        Some(document) => {
            let document_path = resolve_source_file(document)?;
            Some(fs::read_to_string(document_path).map_err(map_cli_source_read)?)
        }
        None => None,
    };

    Ok(LoadedSource {
        template_path: template_path.to_string_lossy().to_string(),
        template_xml,
        document_xml,
    })
}

pub(crate) fn resolve_source_file(raw: &str) -> Result<PathBuf, XformError> {
    let path = PathBuf::from(raw);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(map_cli_source_path)?
            .join(path)
    };

    if !absolute.exists() {
        return Err(XformError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("File does not exist: {}", absolute.display()),
        ));
    }

    if !absolute.is_file() {
        return Err(XformError::new(
            "CLI_SOURCE_NOT_FILE",
            format!("Path is not a file: {}", absolute.display()),
        ));
    }

    Ok(absolute)
}
