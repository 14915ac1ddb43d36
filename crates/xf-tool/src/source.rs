use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{TestCase, XfToolError, TESTCASE_SCHEMA_V1};

/// Template and document text of one scenario directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioSource {
    pub template_xml: String,
    pub document_xml: Option<String>,
}

fn read_file(path: &Path) -> Result<String, XfToolError> {
    fs::read_to_string(path).map_err(|source| XfToolError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_scenario(scenario_dir: &Path, case: &TestCase) -> Result<ScenarioSource, XfToolError> {
    let template_xml = read_file(&scenario_dir.join(&case.template))?;
    let document_xml = match case.document.as_deref() {
        Some(document) => Some(read_file(&scenario_dir.join(document))?),
        None => {
            let fallback = scenario_dir.join("document.xml");
            if fallback.is_file() {
                Some(read_file(&fallback)?)
            } else {
                None
            }
        }
    };
    Ok(ScenarioSource {
        template_xml,
        document_xml,
    })
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, XfToolError> {
    let raw = read_file(case_path)?;
    let parsed: TestCase = serde_json::from_str(&raw).map_err(|source| XfToolError::ParseCase {
        path: case_path.to_path_buf(),
        source,
    })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(XfToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    if parsed.expected.is_none() && parsed.expect_error.is_none() {
        return Err(XfToolError::CaseIncomplete {
            path: case_path.to_path_buf(),
        });
    }

    Ok(parsed)
}

/// Every `testcase.json` below `root`, sorted by path.
pub fn discover_cases(root: &Path) -> Vec<PathBuf> {
    let mut cases = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == "testcase.json")
        .map(|entry| entry.into_path())
        .collect::<Vec<_>>();
    cases.sort();
    cases
}
