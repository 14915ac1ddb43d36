use std::collections::BTreeMap;

use roxmltree::{Node, NodeType};
use xf_core::{
    Attribute, Document, Element, Node as DataNode, SourceLocation, SourceSpan, XformError,
    XML_NAMESPACE_URI,
};

/// Template markup: plain element tree with source locations, no namespace
/// processing beyond what the XML parser requires.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupDocument {
    pub root: MarkupElement,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode {
    Element(MarkupElement),
    Text(MarkupText),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkupElement {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<MarkupNode>,
    pub location: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkupText {
    pub value: String,
    pub location: SourceSpan,
}

impl MarkupElement {
    pub fn element_children(&self) -> impl Iterator<Item = &MarkupElement> {
        self.children.iter().filter_map(|entry| match entry {
            MarkupNode::Element(element) => Some(element),
            MarkupNode::Text(_) => None,
        })
    }
}

fn parse_error(error: impl std::fmt::Display) -> XformError {
    XformError::new("XML_PARSE_ERROR", error.to_string())
}

pub fn parse_markup(source: &str) -> Result<MarkupDocument, XformError> {
    let document = roxmltree::Document::parse(source).map_err(parse_error)?;
    let root = document.root_element();
    Ok(MarkupDocument {
        root: markup_element(&document, root),
    })
}

fn markup_element(document: &roxmltree::Document<'_>, node: Node<'_, '_>) -> MarkupElement {
    let attributes = node
        .attributes()
        .map(|attribute| (attribute.name().to_string(), attribute.value().to_string()))
        .collect();

    let mut children = Vec::new();
    for child in node.children() {
        match child.node_type() {
            NodeType::Element => children.push(MarkupNode::Element(markup_element(document, child))),
            NodeType::Text => {
                let value = child.text().unwrap_or_default();
                if value.trim().is_empty() {
                    continue;
                }
                children.push(MarkupNode::Text(MarkupText {
                    value: value.to_string(),
                    location: node_span(document, child.range().start, child.range().end),
                }));
            }
            _ => {}
        }
    }

    MarkupElement {
        name: node.tag_name().name().to_string(),
        attributes,
        children,
        location: node_span(document, node.range().start, node.range().end),
    }
}

fn node_span(document: &roxmltree::Document<'_>, start: usize, end: usize) -> SourceSpan {
    let start_pos = document.text_pos_at(start);
    let end_pos = document.text_pos_at(end);
    SourceSpan {
        start: SourceLocation {
            line: start_pos.row as usize,
            column: start_pos.col as usize,
        },
        end: SourceLocation {
            line: end_pos.row as usize,
            column: end_pos.col as usize,
        },
    }
}

/// Parses a data document, keeping namespace URIs and the prefixes the
/// source used for them.
pub fn parse_document(source: &str) -> Result<Document, XformError> {
    let document = roxmltree::Document::parse(source).map_err(parse_error)?;
    Ok(Document::new(data_element(document.root_element())))
}

fn data_element(node: Node<'_, '_>) -> Element {
    let namespace = node.tag_name().namespace();
    let mut element = Element::new(
        spelled_name(node, namespace, node.tag_name().name()),
        namespace.map(str::to_string),
    );

    element.attributes = node
        .attributes()
        .map(|attribute| Attribute {
            name: spelled_name(node, attribute.namespace(), attribute.name()),
            namespace: attribute.namespace().map(str::to_string),
            value: attribute.value().to_string(),
        })
        .collect();

    for child in node.children() {
        match child.node_type() {
            NodeType::Element => element.children.push(DataNode::Element(data_element(child))),
            NodeType::Text => {
                let value = child.text().unwrap_or_default();
                if !value.is_empty() {
                    element.children.push(DataNode::text(value));
                }
            }
            _ => {}
        }
    }

    element
}

fn spelled_name(node: Node<'_, '_>, namespace: Option<&str>, local: &str) -> String {
    let prefix = namespace.and_then(|uri| {
        if uri == XML_NAMESPACE_URI {
            return Some("xml");
        }
        node.lookup_prefix(uri).filter(|prefix| !prefix.is_empty())
    });
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, local),
        None => local.to_string(),
    }
}
