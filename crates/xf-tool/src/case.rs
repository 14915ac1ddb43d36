use serde::{Deserialize, Serialize};

pub const TESTCASE_SCHEMA_V1: &str = "xf-tool-case.v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    #[serde(default = "default_template")]
    pub template: String,
    /// Document file to load; `document.xml` is used when present and this is unset.
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub actions: Vec<TestAction>,
    /// File holding the expected output document.
    #[serde(default)]
    pub expected: Option<String>,
    /// Error code the case must fail with instead.
    #[serde(default)]
    pub expect_error: Option<String>,
}

fn default_template() -> String {
    "template.xml".to_string()
}

fn default_instance() -> usize {
    1
}

fn default_confirm() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TestAction {
    Set {
        path: String,
        value: String,
    },
    Fill {
        path: String,
        value: String,
    },
    Add {
        group: String,
    },
    Remove {
        group: String,
        #[serde(default = "default_confirm")]
        confirm: bool,
    },
    Select {
        group: String,
        #[serde(default = "default_instance")]
        instance: usize,
        alternative: String,
    },
    Clear {
        group: String,
        #[serde(default = "default_instance")]
        instance: usize,
    },
}

impl TestAction {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Set { .. } => "set",
            Self::Fill { .. } => "fill",
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Select { .. } => "select",
            Self::Clear { .. } => "clear",
        }
    }
}
