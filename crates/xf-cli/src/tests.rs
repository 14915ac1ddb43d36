use super::*;
use crate::cli_test_support::*;
use xf_api::{initialize_form_from_xml, InitializeFormFromXmlOptions, InitializeOptions};

use std::fs;
use std::path::Path;

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent should be created");
    }
    fs::write(path, content).expect("file should be written");
}

fn sample_state() -> FormStateV1 {
    let form = initialize_form_from_xml(InitializeFormFromXmlOptions {
        template_xml: r#"<form root="/form"><field path="/form/@lang" role="attribute"/></form>"#
            .to_string(),
        document_xml: Some(r#"<form lang="en"/>"#.to_string()),
        initialize: InitializeOptions::default(),
    })
    .expect("form should initialize");
    FormStateV1 {
        schema_version: FORM_STATE_SCHEMA.to_string(),
        template_path: "/tmp/template.xml".to_string(),
        form,
    }
}

#[test]
fn resolve_source_file_validates_existence_and_kind() {
    let missing = temp_path("missing-template.xml");
    let missing_err = resolve_source_file(missing.to_string_lossy().as_ref())
        .expect_err("missing path should fail");
    assert_eq!(missing_err.code, "CLI_SOURCE_NOT_FOUND");

    let directory = temp_path("template-dir");
    fs::create_dir_all(&directory).expect("dir should be created");
    let dir_err = resolve_source_file(directory.to_string_lossy().as_ref())
        .expect_err("directory should fail");
    assert_eq!(dir_err.code, "CLI_SOURCE_NOT_FILE");
}

#[test]
fn load_source_reads_template_and_optional_document() {
    let root = temp_path("source-files");
    let template = root.join("template.xml");
    let document = root.join("document.xml");
    write_file(&template, "<form root=\"/form\"/>");
    write_file(&document, "<form/>");

    let with_document = load_source(
        template.to_string_lossy().as_ref(),
        Some(document.to_string_lossy().as_ref()),
    )
    .expect("load should pass");
    assert_eq!(with_document.template_xml, "<form root=\"/form\"/>");
    assert_eq!(with_document.document_xml.as_deref(), Some("<form/>"));

    let without_document =
        load_source(template.to_string_lossy().as_ref(), None).expect("load should pass");
    assert!(without_document.document_xml.is_none());
    assert!(without_document.template_path.ends_with("template.xml"));
}

#[test]
fn save_and_load_form_state_roundtrip_and_schema_validation() {
    let state_path = temp_path("form-state.json");
    let state = sample_state();
    save_form_state(&state_path, &state).expect("save should pass");
    let loaded = load_form_state(&state_path).expect("load should pass");
    assert_eq!(loaded.form, state.form);
    assert_eq!(loaded.template_path, "/tmp/template.xml");

    let raw = fs::read_to_string(&state_path).expect("state should be readable");
    assert!(raw.contains("\"schemaVersion\":\"form-state.v1\""));
    assert!(raw.contains("\"templatePath\""));

    let mut stale = sample_state();
    stale.schema_version = "form-state.v0".to_string();
    let stale_path = temp_path("form-state-stale.json");
    save_form_state(&stale_path, &stale).expect("save should pass");
    let error = load_form_state(&stale_path).expect_err("schema should be rejected");
    assert_eq!(error.code, "CLI_STATE_SCHEMA");
}

#[test]
fn load_form_state_reports_missing_and_invalid_files() {
    let missing = load_form_state(&temp_path("absent-state.json")).expect_err("missing");
    assert_eq!(missing.code, "CLI_STATE_NOT_FOUND");

    let invalid_path = temp_path("invalid-state.json");
    write_file(&invalid_path, "{");
    let invalid = load_form_state(&invalid_path).expect_err("invalid");
    assert_eq!(invalid.code, "CLI_STATE_INVALID");
}

#[test]
fn run_cli_from_args_handles_roundtrip_and_parse_errors() {
    let scenario = scenario_dir("01-items");
    let code = run_cli_from_args([
        "xf-cli",
        "roundtrip",
        "--template",
        scenario.join("template.xml").to_string_lossy().as_ref(),
        "--document",
        scenario.join("document.xml").to_string_lossy().as_ref(),
    ]);
    assert_eq!(code, 0);

    let missing = run_cli_from_args([
        "xf-cli",
        "roundtrip",
        "--template",
        temp_path("nope.xml").to_string_lossy().as_ref(),
    ]);
    assert_eq!(missing, 1);

    let bad_args = run_cli_from_args(["xf-cli", "session", "frobnicate"]);
    assert_eq!(bad_args, 2);
}
