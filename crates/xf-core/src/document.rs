use serde::{Deserialize, Serialize};

use crate::namespace::qualify;

/// Ordered, namespace-aware XML tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub root: Element,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Qualified name as written (`prefix:local` or `local`).
    pub name: String,
    pub namespace: Option<String>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub namespace: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Node {
    Element(Element),
    Text { value: String },
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Structural equality: same names and namespaces, attributes compared as
    /// sets, whitespace-only text ignored and text compared trimmed.
    pub fn structurally_eq(&self, other: &Document) -> bool {
        self.root.structurally_eq(&other.root)
    }
}

impl Element {
    pub fn new(name: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn local_name(&self) -> &str {
        qualify(&self.name).1
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            Node::Text { .. } => None,
        })
    }

    /// Concatenated direct text content.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                Node::Text { value } => Some(value.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
            && self.children.iter().all(|child| match child {
                Node::Text { value } => value.is_empty(),
                Node::Element(_) => false,
            })
    }

    /// Removes empty descendants bottom-up; `self` is kept even if it ends up empty.
    pub fn prune_empty_children(&mut self) {
        self.children.retain_mut(|child| match child {
            Node::Element(element) => {
                element.prune_empty_children();
                !element.is_empty()
            }
            Node::Text { value } => !value.is_empty(),
        });
    }

    fn same_name(&self, other: &Element) -> bool {
        self.namespace == other.namespace && self.local_name() == other.local_name()
    }

    fn structurally_eq(&self, other: &Element) -> bool {
        if !self.same_name(other) || self.attributes.len() != other.attributes.len() {
            return false;
        }
        let attributes_match = self.attributes.iter().all(|attribute| {
            other.attributes.iter().any(|candidate| {
                candidate.namespace == attribute.namespace
                    && qualify(&candidate.name).1 == qualify(&attribute.name).1
                    && candidate.value == attribute.value
            })
        });
        if !attributes_match {
            return false;
        }

        let left = significant_children(self);
        let right = significant_children(other);
        left.len() == right.len()
            && left
                .iter()
                .zip(right.iter())
                .all(|(left, right)| match (left, right) {
                    (Node::Element(left), Node::Element(right)) => left.structurally_eq(right),
                    (Node::Text { value: left }, Node::Text { value: right }) => {
                        left.trim() == right.trim()
                    }
                    _ => false,
                })
    }
}

fn significant_children(element: &Element) -> Vec<&Node> {
    element
        .children
        .iter()
        .filter(|child| match child {
            Node::Text { value } => !value.trim().is_empty(),
            Node::Element(_) => true,
        })
        .collect()
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }
}
