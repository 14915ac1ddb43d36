use std::fs;
use std::path::Path;

use xf_api::{
    initialize_form_from_xml, serialize_form_to_xml, InitializeFormFromXmlOptions,
    InitializeOptions, LiveForm, WriteOptions,
};
use xf_core::XformError;
use xf_parser::parse_document;

use crate::source::{read_scenario, read_test_case};
use crate::{TestAction, TestCase, XfToolError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub xml: String,
    pub consumed_actions: usize,
}

fn apply_action(form: &mut LiveForm, action: &TestAction) -> Result<(), XformError> {
    match action {
        TestAction::Set { path, value } => form.set_value(path, value),
        TestAction::Fill { path, value } => form.fill(path, value),
        TestAction::Add { group } => form.add_instance(group).map(|_| ()),
        TestAction::Remove { group, confirm } => {
            form.remove_instance(group, |_| *confirm).map(|_| ())
        }
        TestAction::Select {
            group,
            instance,
            alternative,
        } => form.select_alternative(group, *instance, alternative),
        TestAction::Clear { group, instance } => form.clear_selection(group, *instance),
    }
}

pub fn run_case(scenario_dir: &Path, case: &TestCase) -> Result<RunReport, XfToolError> {
    let source = read_scenario(scenario_dir, case)?;
    let mut form = initialize_form_from_xml(InitializeFormFromXmlOptions {
        template_xml: source.template_xml,
        document_xml: source.document_xml,
        initialize: InitializeOptions::default(),
    })?;

    for (index, action) in case.actions.iter().enumerate() {
        apply_action(&mut form, action).map_err(|source| XfToolError::ActionFailed {
            index,
            kind: action.kind_name().to_string(),
            source,
        })?;
    }

    let xml = serialize_form_to_xml(&form, &WriteOptions::default())?;
    Ok(RunReport {
        xml,
        consumed_actions: case.actions.len(),
    })
}

pub fn assert_case(scenario_dir: &Path, case_path: &Path) -> Result<(), XfToolError> {
    let case = read_test_case(case_path)?;
    let result = run_case(scenario_dir, &case);

    if let Some(expected) = case.expect_error.as_deref() {
        return match result {
            Ok(_) => Err(XfToolError::ExpectedErrorMissing {
                expected: expected.to_string(),
            }),
            Err(error) => match error.form_error_code() {
                Some(actual) if actual == expected => Ok(()),
                Some(actual) => Err(XfToolError::ErrorCodeMismatch {
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                }),
                None => Err(error),
            },
        };
    }

    let report = result?;
    let Some(expected_file) = case.expected.as_deref() else {
        return Err(XfToolError::CaseIncomplete {
            path: case_path.to_path_buf(),
        });
    };
    let expected_path = scenario_dir.join(expected_file);
    let expected_xml = fs::read_to_string(&expected_path).map_err(|source| XfToolError::ReadFile {
        path: expected_path.clone(),
        source,
    })?;

    let expected = parse_document(&expected_xml)?;
    let actual = parse_document(&report.xml)?;
    if !expected.structurally_eq(&actual) {
        return Err(XfToolError::OutputMismatch {
            expected: expected_xml.trim().to_string(),
            actual: report.xml,
        });
    }
    Ok(())
}
