use serde::{Deserialize, Serialize};

use crate::error::XformError;

pub const XML_NAMESPACE_URI: &str = "http://www.w3.org/XML/1998/namespace";

/// Splits `prefix:local` into its parts; unprefixed names have no prefix.
pub fn qualify(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceBinding {
    pub prefix: String,
    pub uri: String,
}

/// Prefix → URI declarations taken from the template. Built once and never
/// modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceTable {
    bindings: Vec<NamespaceBinding>,
}

impl NamespaceTable {
    /// Builds a table, rejecting a prefix declared twice with different URIs.
    pub fn from_declarations<I, P, U>(declarations: I) -> Result<Self, XformError>
    where
        I: IntoIterator<Item = (P, U)>,
        P: Into<String>,
        U: Into<String>,
    {
        let mut bindings: Vec<NamespaceBinding> = Vec::new();
        for (prefix, uri) in declarations {
            let prefix = prefix.into();
            let uri = uri.into();
            match bindings.iter().find(|binding| binding.prefix == prefix) {
                Some(existing) if existing.uri == uri => {}
                Some(existing) => {
                    return Err(XformError::new(
                        "TEMPLATE_NAMESPACE_CONFLICT",
                        format!(
                            "Prefix \"{}\" is declared for both \"{}\" and \"{}\".",
                            prefix, existing.uri, uri
                        ),
                    ))
                }
                None => bindings.push(NamespaceBinding { prefix, uri }),
            }
        }
        Ok(Self { bindings })
    }

    pub fn bindings(&self) -> &[NamespaceBinding] {
        &self.bindings
    }

    pub fn resolve(&self, prefix: &str) -> Result<&str, XformError> {
        if let Some(binding) = self.bindings.iter().find(|binding| binding.prefix == prefix) {
            return Ok(binding.uri.as_str());
        }
        if prefix == "xml" {
            return Ok(XML_NAMESPACE_URI);
        }
        Err(XformError::unknown_prefix(prefix))
    }

    /// Namespace of a qualified name; unprefixed names have none.
    pub fn namespace_for(&self, qualified_name: &str) -> Result<Option<String>, XformError> {
        match qualify(qualified_name) {
            (Some(prefix), _) => self.resolve(prefix).map(|uri| Some(uri.to_string())),
            (None, _) => Ok(None),
        }
    }

    /// Prefix the template uses for `uri`, if any.
    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        if let Some(binding) = self.bindings.iter().find(|binding| binding.uri == uri) {
            return Some(binding.prefix.as_str());
        }
        (uri == XML_NAMESPACE_URI).then_some("xml")
    }

    /// Spelling of `(uri, local)` in the template's vocabulary.
    pub fn template_name(&self, namespace: Option<&str>, local: &str) -> Option<String> {
        match namespace {
            None => Some(local.to_string()),
            Some(uri) => self
                .prefix_for(uri)
                .map(|prefix| format!("{}:{}", prefix, local)),
        }
    }
}
