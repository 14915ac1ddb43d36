use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use xf_core::{qualify, Document, Element, Node, XformError, XML_NAMESPACE_URI};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Two-space indentation, one element per line.
    pub indent: bool,
    /// Emit `<?xml version="1.0" encoding="UTF-8"?>` first.
    pub declaration: bool,
}

fn write_error(error: impl std::fmt::Display) -> XformError {
    XformError::new("XML_WRITE_ERROR", error.to_string())
}

/// Serializes `document`; every namespace in use is declared once on the root.
pub fn write_document(document: &Document, options: &WriteOptions) -> Result<String, XformError> {
    let mut writer = if options.indent {
        Writer::new_with_indent(Vec::new(), b' ', 2)
    } else {
        Writer::new(Vec::new())
    };

    if options.declaration {
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;
    }

    let mut declarations = Vec::new();
    collect_declarations(&document.root, &mut declarations);
    write_element(&mut writer, &document.root, &declarations)?;

    String::from_utf8(writer.into_inner()).map_err(write_error)
}

fn collect_declarations(element: &Element, out: &mut Vec<(Option<String>, String)>) {
    let names = std::iter::once((element.name.as_str(), element.namespace.as_deref())).chain(
        element
            .attributes
            .iter()
            .map(|attribute| (attribute.name.as_str(), attribute.namespace.as_deref())),
    );
    for (name, namespace) in names {
        let Some(uri) = namespace else {
            continue;
        };
        if uri == XML_NAMESPACE_URI {
            continue;
        }
        let prefix = qualify(name).0.map(str::to_string);
        if !out.iter().any(|(declared, _)| *declared == prefix) {
            out.push((prefix, uri.to_string()));
        }
    }

    for child in element.child_elements() {
        collect_declarations(child, out);
    }
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    element: &Element,
    declarations: &[(Option<String>, String)],
) -> Result<(), XformError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (prefix, uri) in declarations {
        let key = match prefix {
            Some(prefix) => format!("xmlns:{}", prefix),
            None => "xmlns".to_string(),
        };
        start.push_attribute((key.as_str(), uri.as_str()));
    }
    for attribute in &element.attributes {
        start.push_attribute((attribute.name.as_str(), attribute.value.as_str()));
    }

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_error);
    }

    writer.write_event(Event::Start(start)).map_err(write_error)?;
    for child in &element.children {
        match child {
            Node::Element(child) => write_element(writer, child, &[])?,
            Node::Text { value } => writer
                .write_event(Event::Text(BytesText::new(value)))
                .map_err(write_error)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(write_error)
}
