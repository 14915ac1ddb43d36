use xf_core::{Path, XformError};
use xf_parser::MarkupElement;

pub(crate) fn get_optional_attr(node: &MarkupElement, name: &str) -> Option<String> {
    node.attributes.get(name).cloned()
}

pub(crate) fn get_required_non_empty_attr(
    node: &MarkupElement,
    name: &str,
) -> Result<String, XformError> {
    let Some(raw) = node.attributes.get(name) else {
        return Err(XformError::with_span(
            "XML_MISSING_ATTR",
            format!(
                "Missing required attribute \"{}\" on <{}>.",
                name, node.name
            ),
            node.location.clone(),
        ));
    };

    if raw.trim().is_empty() {
        return Err(XformError::with_span(
            "XML_EMPTY_ATTR",
            format!("Attribute \"{}\" on <{}> cannot be empty.", name, node.name),
            node.location.clone(),
        ));
    }

    Ok(raw.to_string())
}

/// Like [`get_required_non_empty_attr`] but the value may be empty.
pub(crate) fn get_required_attr(node: &MarkupElement, name: &str) -> Result<String, XformError> {
    get_optional_attr(node, name).ok_or_else(|| {
        XformError::with_span(
            "XML_MISSING_ATTR",
            format!(
                "Missing required attribute \"{}\" on <{}>.",
                name, node.name
            ),
            node.location.clone(),
        )
    })
}

pub(crate) fn parse_bool_attr(
    node: &MarkupElement,
    name: &str,
    default: bool,
) -> Result<bool, XformError> {
    let Some(value) = get_optional_attr(node, name) else {
        return Ok(default);
    };

    match value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(XformError::with_span(
            "XML_ATTR_BOOL_INVALID",
            format!(
                "Attribute \"{}\" on <{}> must be \"true\" or \"false\".",
                name, node.name
            ),
            node.location.clone(),
        )),
    }
}

/// Positive integer attribute; `default` when absent.
pub(crate) fn parse_count_attr(
    node: &MarkupElement,
    name: &str,
    default: usize,
) -> Result<usize, XformError> {
    let Some(value) = get_optional_attr(node, name) else {
        return Ok(default);
    };

    match value.trim().parse::<usize>() {
        Ok(count) if count >= 1 => Ok(count),
        _ => Err(XformError::with_span(
            "XML_ATTR_COUNT_INVALID",
            format!(
                "Attribute \"{}\" on <{}> must be a positive integer.",
                name, node.name
            ),
            node.location.clone(),
        )),
    }
}

pub(crate) fn parse_path_attr(node: &MarkupElement, name: &str) -> Result<Path, XformError> {
    let raw = get_required_non_empty_attr(node, name)?;
    Path::parse(raw.trim()).map_err(|error| error.at(&node.location))
}

pub(crate) fn has_attr(node: &MarkupElement, name: &str) -> bool {
    node.attributes.contains_key(name)
}
