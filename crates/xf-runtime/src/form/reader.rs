use log::debug;
use xf_core::{Document, Path, XformError};

use super::binder::{check_exclusivity, Visibility};
use super::builder::build_document;
use super::model::{ControlFamily, LiveForm};

/// One collected `(path, value)` pair, after the merge rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuePair {
    pub path: Path,
    pub value: String,
}

struct Slot {
    path: Path,
    family: ControlFamily,
    values: Vec<String>,
}

/// Visible, enabled fields in field order; values sharing a path are
/// joined with a single space.
pub fn collect_values(form: &LiveForm) -> Result<Vec<ValuePair>, XformError> {
    check_exclusivity(&form.nodes)?;

    let mut slots: Vec<Slot> = Vec::new();
    let mut conflict: Option<XformError> = None;
    Visibility::new(&form.nodes).for_each_field(&form.nodes, &mut |field| {
        if field.disabled || conflict.is_some() {
            return;
        }
        let pattern = field.path.to_match_pattern();
        let family = field.family();
        match slots.iter_mut().find(|slot| pattern.matches(&slot.path)) {
            Some(slot) if slot.family != family => {
                conflict = Some(XformError::new(
                    "FIELD_PATH_CONFLICT",
                    format!(
                        "Path \"{}\" is bound to both a {} control and a {} control.",
                        field.path,
                        slot.family.label(),
                        family.label()
                    ),
                ));
            }
            Some(slot) => slot.values.extend(field.contributions()),
            None => slots.push(Slot {
                path: field.path.clone(),
                family,
                values: field.contributions(),
            }),
        }
    });
    if let Some(error) = conflict {
        return Err(error);
    }

    Ok(slots
        .into_iter()
        .filter(|slot| !slot.values.is_empty())
        .map(|slot| ValuePair {
            path: slot.path,
            value: slot.values.join(" "),
        })
        .collect())
}

pub fn serialize_form(form: &LiveForm) -> Result<Document, XformError> {
    let pairs = collect_values(form)?;
    debug!("serializing {} value pair(s) under {}", pairs.len(), form.template.root);
    build_document(&form.template.root, &form.template.namespaces, &pairs)
}
