use log::trace;
use xf_core::{
    Attribute, Document, Element, NamespaceTable, Node, Path, Step, XformError,
};

use super::reader::ValuePair;

/// Element under construction. `index` is the logical occurrence the
/// element was created for, so only addressed indices ever exist.
struct BuildElement {
    name: String,
    namespace: Option<String>,
    index: usize,
    attributes: Vec<Attribute>,
    children: Vec<BuildChild>,
}

enum BuildChild {
    Element(usize),
    Text(String),
}

struct Arena {
    elements: Vec<BuildElement>,
}

impl Arena {
    fn push(&mut self, element: BuildElement) -> usize {
        self.elements.push(element);
        self.elements.len() - 1
    }

    fn find_or_create(
        &mut self,
        parent: usize,
        name: &str,
        index: usize,
        namespaces: &NamespaceTable,
    ) -> Result<usize, XformError> {
        let existing = self.elements[parent].children.iter().find_map(|child| match child {
            BuildChild::Element(id)
                if self.elements[*id].name == name && self.elements[*id].index == index =>
            {
                Some(*id)
            }
            _ => None,
        });
        if let Some(id) = existing {
            return Ok(id);
        }

        let id = self.push(BuildElement {
            name: name.to_string(),
            namespace: namespaces.namespace_for(name)?,
            index,
            attributes: Vec::new(),
            children: Vec::new(),
        });
        self.elements[parent].children.push(BuildChild::Element(id));
        Ok(id)
    }

    fn set_attribute(
        &mut self,
        id: usize,
        name: &str,
        value: &str,
        namespaces: &NamespaceTable,
    ) -> Result<(), XformError> {
        let namespace = namespaces.namespace_for(name)?;
        let attributes = &mut self.elements[id].attributes;
        match attributes.iter_mut().find(|attribute| attribute.name == name) {
            Some(attribute) => attribute.value = value.to_string(),
            None => attributes.push(Attribute {
                name: name.to_string(),
                namespace,
                value: value.to_string(),
            }),
        }
        Ok(())
    }

    /// Replaces the text of `id`, keeping the position of the first text child.
    fn set_text(&mut self, id: usize, value: &str) {
        let children = &mut self.elements[id].children;
        let mut replaced = false;
        children.retain_mut(|child| match child {
            BuildChild::Text(text) if !replaced => {
                *text = value.to_string();
                replaced = true;
                true
            }
            BuildChild::Text(_) => false,
            BuildChild::Element(_) => true,
        });
        if !replaced {
            children.push(BuildChild::Text(value.to_string()));
        }
    }

    fn into_element(mut self, id: usize) -> Element {
        let mut element = Element::new(
            std::mem::take(&mut self.elements[id].name),
            self.elements[id].namespace.take(),
        );
        self.fill(id, &mut element);
        element
    }

    fn fill(&mut self, id: usize, element: &mut Element) {
        element.attributes = std::mem::take(&mut self.elements[id].attributes);
        let children = std::mem::take(&mut self.elements[id].children);
        for child in children {
            match child {
                BuildChild::Text(value) => element.children.push(Node::text(value)),
                BuildChild::Element(child_id) => {
                    let mut child = Element::new(
                        std::mem::take(&mut self.elements[child_id].name),
                        self.elements[child_id].namespace.take(),
                    );
                    self.fill(child_id, &mut child);
                    element.children.push(Node::Element(child));
                }
            }
        }
    }
}

/// Replays every pair from the root, then prunes empty elements. The root
/// element is always kept.
pub(crate) fn build_document(
    root: &Path,
    namespaces: &NamespaceTable,
    pairs: &[ValuePair],
) -> Result<Document, XformError> {
    let Some(Step::Element { name: root_name, .. }) = root.steps().first() else {
        return Err(XformError::new(
            "TEMPLATE_ROOT_INVALID",
            format!("Root path \"{}\" does not start with an element.", root),
        ));
    };

    let mut arena = Arena {
        elements: Vec::new(),
    };
    let root_id = arena.push(BuildElement {
        name: root_name.clone(),
        namespace: namespaces.namespace_for(root_name)?,
        index: 1,
        attributes: Vec::new(),
        children: Vec::new(),
    });

    for pair in pairs {
        if pair.value.is_empty() {
            continue;
        }
        let starts_at_root = matches!(
            pair.path.steps().first(),
            Some(Step::Element { name, index }) if name == root_name && index.unwrap_or(1) == 1
        );
        if !starts_at_root {
            return Err(XformError::new(
                "PATH_OUTSIDE_ROOT",
                format!("Path \"{}\" does not start at the root \"{}\".", pair.path, root),
            ));
        }
        trace!("building {} = {:?}", pair.path, pair.value);

        let mut current = root_id;
        let steps = &pair.path.steps()[1..];
        for (position, step) in steps.iter().enumerate() {
            let last = position + 1 == steps.len();
            match step {
                Step::Element { name, index } => {
                    current = arena.find_or_create(current, name, index.unwrap_or(1), namespaces)?;
                    if last {
                        arena.set_text(current, &pair.value);
                    }
                }
                Step::Attribute { name } => {
                    arena.set_attribute(current, name, &pair.value, namespaces)?
                }
                Step::Text => arena.set_text(current, &pair.value),
            }
        }
        if steps.is_empty() {
            arena.set_text(current, &pair.value);
        }
    }

    let mut root_element = arena.into_element(root_id);
    root_element.prune_empty_children();
    Ok(Document::new(root_element))
}
