use serde::{Deserialize, Serialize};

use crate::namespace::NamespaceTable;
use crate::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn synthetic() -> Self {
        Self {
            start: SourceLocation { line: 1, column: 1 },
            end: SourceLocation { line: 1, column: 1 },
        }
    }
}

/// Compiled form template: the root element, the namespace side-table and
/// the bindable regions in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormTemplate {
    pub root: Path,
    pub namespaces: NamespaceTable,
    pub nodes: Vec<TemplateNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TemplateNode {
    Field(FieldDecl),
    Repeat(RepeatDecl),
    Choice(ChoiceDecl),
    When(WhenDecl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldRole {
    Value,
    MultipleValue,
    Text,
    Attribute,
}

impl FieldRole {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "value" => Some(Self::Value),
            "multiple-value" => Some(Self::MultipleValue),
            "text" => Some(Self::Text),
            "attribute" => Some(Self::Attribute),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::MultipleValue => "multiple-value",
            Self::Text => "text",
            Self::Attribute => "attribute",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "control", rename_all = "camelCase")]
pub enum ControlDecl {
    Text,
    Textarea,
    File,
    Select { options: Vec<String>, multiple: bool },
    Checkbox { value: String },
    Radio { value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDecl {
    pub path: Path,
    pub role: FieldRole,
    pub control: ControlDecl,
    pub disabled: bool,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatDecl {
    pub id: String,
    pub path: Path,
    pub min: usize,
    pub nodes: Vec<TemplateNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceDecl {
    pub id: String,
    /// Parent position shared by every alternative.
    pub path: Path,
    pub repeatable: bool,
    pub alternatives: Vec<AlternativeDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeDecl {
    /// Qualified element name this alternative stands for.
    pub name: String,
    pub nodes: Vec<TemplateNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhenDecl {
    /// Path of the controlling field.
    pub path: Path,
    pub equals: String,
    pub nodes: Vec<TemplateNode>,
}
