use xf_core::{Path, XformError};
use xf_parser::{MarkupElement, MarkupNode};

use crate::xml_utils::get_required_non_empty_attr;

/// Expansion limit of a recursive `<ref>` when it names no `max-depth`.
pub(crate) const DEFAULT_MAX_DEPTH: usize = 3;

/// A `<define name="...">` block declared directly under `<form>`.
pub(crate) struct BlockDef<'a> {
    pub(crate) name: String,
    pub(crate) body: &'a MarkupElement,
}

pub(crate) fn collect_blocks(form: &MarkupElement) -> Result<Vec<BlockDef<'_>>, XformError> {
    let mut blocks: Vec<BlockDef<'_>> = Vec::new();
    for child in form.element_children().filter(|child| child.name == "define") {
        let name = get_required_non_empty_attr(child, "name")?.trim().to_string();
        if blocks.iter().any(|block| block.name == name) {
            return Err(XformError::with_span(
                "TEMPLATE_DUPLICATE_BLOCK",
                format!("Block \"{}\" is defined twice.", name),
                child.location.clone(),
            ));
        }
        blocks.push(BlockDef { name, body: child });
    }
    Ok(blocks)
}

/// Copy of `body` with every absolute `path` attribute below it moved under `base`.
pub(crate) fn rebased(body: &MarkupElement, base: &Path) -> MarkupElement {
    let mut copy = body.clone();
    rebase_children(&mut copy, &base.to_string());
    copy
}

fn rebase_children(element: &mut MarkupElement, base: &str) {
    for child in &mut element.children {
        let MarkupNode::Element(child) = child else {
            continue;
        };
        if let Some(path) = child.attributes.get_mut("path") {
            let trimmed = path.trim();
            if trimmed.starts_with('/') {
                *path = format!("{}{}", base, trimmed);
            }
        }
        rebase_children(child, base);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xf_parser::parse_markup;

    #[test]
    fn rebased_moves_every_absolute_path_under_the_base() {
        let markup = parse_markup(
            r#"<define name="part">
  <field path="/part/@title" role="attribute"/>
  <section><ref block="part" path="/part"/></section>
  <field path="relative"/>
</define>"#,
        )
        .expect("markup should parse");
        let base = Path::parse("/form/sec[2]").expect("base");
        let copy = rebased(&markup.root, &base);

        let paths = copy
            .element_children()
            .map(|child| child.attributes.get("path").cloned())
            .collect::<Vec<_>>();
        assert_eq!(
            paths,
            vec![
                Some("/form/sec[2]/part/@title".to_string()),
                None,
                Some("relative".to_string()),
            ]
        );
        let nested = copy
            .element_children()
            .nth(1)
            .and_then(|section| section.element_children().next())
            .expect("nested ref");
        assert_eq!(
            nested.attributes.get("path").map(String::as_str),
            Some("/form/sec[2]/part")
        );
    }

    #[test]
    fn collect_blocks_rejects_duplicate_names() {
        let markup = parse_markup(
            r#"<form root="/form"><define name="a"/><define name="b"/><define name="a"/></form>"#,
        )
        .expect("markup should parse");
        let error = collect_blocks(&markup.root).err().expect("duplicate");
        assert_eq!(error.code, "TEMPLATE_DUPLICATE_BLOCK");
    }
}
