use log::{debug, info};
use serde::{Deserialize, Serialize};
use xf_core::{FieldRole, Path, Step, XformError};

use super::binder::Visibility;
use super::expand::InitializeOptions;
use super::model::{
    control_name, field_not_found, find_choice_mut, find_repeat_mut, renumber, ChoiceGroup,
    Field, FormNode, LiveForm,
};

/// Result of [`LiveForm::remove_instance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RemovalOutcome {
    Cancelled,
    Removed,
    /// The group was at its minimum, so the last instance was emptied instead.
    Cleared,
}

/// What `remove_instance` asks the caller to confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalPrompt {
    pub group_id: String,
    pub group_path: Path,
    /// 1-based position of the instance about to go.
    pub instance: usize,
    pub clears_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupKind {
    Repeat,
    Choice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    pub kind: GroupKind,
    pub id: String,
    /// `id@path`, accepted by every group action.
    pub key: String,
    pub path: Path,
    pub instances: usize,
    pub min: usize,
    /// Selected alternative per instance; empty for repeat groups.
    pub selections: Vec<Option<String>>,
    pub alternatives: Vec<String>,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub path: Path,
    pub role: FieldRole,
    pub control: String,
    pub label: Option<String>,
    pub value: String,
    pub visible: bool,
    pub disabled: bool,
}

struct GroupKey {
    id: Option<String>,
    path: Path,
}

fn parse_group_key(raw: &str) -> Result<GroupKey, XformError> {
    match raw.split_once('@') {
        Some((id, path)) if !id.is_empty() && path.starts_with('/') => Ok(GroupKey {
            id: Some(id.to_string()),
            path: Path::parse(path)?,
        }),
        _ => Ok(GroupKey {
            id: None,
            path: Path::parse(raw)?,
        }),
    }
}

impl GroupKey {
    fn accepts(&self, id: &str, path: &Path) -> bool {
        self.id.as_deref().map_or(true, |wanted| wanted == id)
            && path.to_match_pattern().matches(&self.path)
    }
}

enum GroupTarget {
    Repeat,
    Choice,
}

impl LiveForm {
    fn resolve_group(&self, raw: &str) -> Result<(GroupKey, GroupTarget), XformError> {
        let key = parse_group_key(raw)?;
        let matches = self
            .groups()
            .into_iter()
            .filter(|group| key.accepts(&group.id, &group.path))
            .collect::<Vec<_>>();
        match matches.as_slice() {
            [] => Err(XformError::new(
                "GROUP_NOT_FOUND",
                format!("No repeat or choice group matches \"{}\".", raw),
            )),
            [group] => {
                let target = match group.kind {
                    GroupKind::Repeat => GroupTarget::Repeat,
                    GroupKind::Choice => GroupTarget::Choice,
                };
                Ok((key, target))
            }
            several => Err(XformError::new(
                "GROUP_AMBIGUOUS",
                format!(
                    "\"{}\" matches several groups ({}); prefix it with a group id.",
                    raw,
                    several
                        .iter()
                        .map(|group| group.key.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )),
        }
    }

    /// Appends an instance to a repeat group or a repeatable choice group and
    /// returns its 1-based index.
    pub fn add_instance(&mut self, key: &str) -> Result<usize, XformError> {
        let (key, target) = self.resolve_group(key)?;
        let added = match target {
            GroupTarget::Repeat => {
                let repeat = find_repeat_mut(&mut self.nodes, &|repeat| {
                    key.accepts(&repeat.id, &repeat.path)
                })
                .ok_or_else(|| group_vanished(&key.path))?;
                let instance = repeat.new_instance();
                repeat.instances.push(instance);
                repeat.instances.len()
            }
            GroupTarget::Choice => {
                let choice = find_choice_mut(&mut self.nodes, &|choice| {
                    key.accepts(&choice.id, &choice.path)
                })
                .ok_or_else(|| group_vanished(&key.path))?;
                if !choice.repeatable {
                    return Err(XformError::new(
                        "GROUP_NOT_REPEATABLE",
                        format!("Choice group \"{}\" is not repeatable.", choice.id),
                    ));
                }
                let count = choice.instances.len() + 1;
                choice.ensure_instances(count);
                count
            }
        };
        renumber(&mut self.nodes, &[]);
        info!("added instance {} to {}", added, key.path);
        Ok(added)
    }

    /// Removes the last instance of a group after `confirm` agrees. At the
    /// minimum count the last instance is cleared instead.
    pub fn remove_instance<F>(&mut self, key: &str, confirm: F) -> Result<RemovalOutcome, XformError>
    where
        F: FnOnce(&RemovalPrompt) -> bool,
    {
        let (key, target) = self.resolve_group(key)?;
        let outcome = match target {
            GroupTarget::Repeat => {
                let repeat = find_repeat_mut(&mut self.nodes, &|repeat| {
                    key.accepts(&repeat.id, &repeat.path)
                })
                .ok_or_else(|| group_vanished(&key.path))?;
                let prompt = RemovalPrompt {
                    group_id: repeat.id.clone(),
                    group_path: repeat.path.clone(),
                    instance: repeat.instances.len(),
                    clears_only: repeat.instances.len() <= repeat.min,
                };
                if !confirm(&prompt) {
                    return Ok(RemovalOutcome::Cancelled);
                }
                if prompt.clears_only {
                    let fresh = repeat.new_instance();
                    if let Some(last) = repeat.instances.last_mut() {
                        *last = fresh;
                    }
                    RemovalOutcome::Cleared
                } else {
                    repeat.instances.pop();
                    RemovalOutcome::Removed
                }
            }
            GroupTarget::Choice => {
                let choice = find_choice_mut(&mut self.nodes, &|choice| {
                    key.accepts(&choice.id, &choice.path)
                })
                .ok_or_else(|| group_vanished(&key.path))?;
                let prompt = RemovalPrompt {
                    group_id: choice.id.clone(),
                    group_path: choice.path.clone(),
                    instance: choice.instances.len(),
                    clears_only: choice.instances.len() <= 1,
                };
                if !confirm(&prompt) {
                    return Ok(RemovalOutcome::Cancelled);
                }
                if prompt.clears_only {
                    choice.clear_selection(prompt.instance - 1)?;
                    RemovalOutcome::Cleared
                } else {
                    choice.instances.pop();
                    RemovalOutcome::Removed
                }
            }
        };
        renumber(&mut self.nodes, &[]);
        info!("remove_instance on {}: {:?}", key.path, outcome);
        Ok(outcome)
    }

    /// Selects alternative `name` in a choice instance (1-based).
    pub fn select_alternative(&mut self, key: &str, instance: usize, name: &str) -> Result<(), XformError> {
        let choice = self.choice_for_action(key)?;
        choice.select(checked_position(instance)?, name)?;
        renumber(&mut self.nodes, &[]);
        debug!("selected {} in {} instance {}", name, key, instance);
        Ok(())
    }

    pub fn clear_selection(&mut self, key: &str, instance: usize) -> Result<(), XformError> {
        let choice = self.choice_for_action(key)?;
        choice.clear_selection(checked_position(instance)?)?;
        renumber(&mut self.nodes, &[]);
        Ok(())
    }

    fn choice_for_action(&mut self, raw: &str) -> Result<&mut ChoiceGroup, XformError> {
        let (key, target) = self.resolve_group(raw)?;
        if matches!(target, GroupTarget::Repeat) {
            return Err(XformError::new(
                "GROUP_NOT_FOUND",
                format!("\"{}\" is a repeat group, not a choice group.", raw),
            ));
        }
        find_choice_mut(&mut self.nodes, &|choice| key.accepts(&choice.id, &choice.path))
            .ok_or_else(|| group_vanished(&key.path))
    }

    /// Sets the fields currently bound to `path`.
    pub fn set_value(&mut self, path: &str, value: &str) -> Result<(), XformError> {
        let target = Path::parse(path)?;
        let options = InitializeOptions {
            decode_line_breaks: false,
        };
        if self.apply_value(&target, value, &options) == 0 {
            return Err(field_not_found(&target));
        }
        Ok(())
    }

    /// Like [`LiveForm::set_value`], but first creates the repeat instances
    /// the indexed steps of `path` need and reveals the alternatives holding
    /// the field.
    pub fn fill(&mut self, path: &str, value: &str) -> Result<(), XformError> {
        let target = Path::parse(path)?;
        self.ensure_instances_along(&target)?;
        reveal(&mut self.nodes, &target)?;
        renumber(&mut self.nodes, &[]);
        let options = InitializeOptions {
            decode_line_breaks: false,
        };
        if self.apply_value(&target, value, &options) == 0 {
            return Err(field_not_found(&target));
        }
        Ok(())
    }

    fn ensure_instances_along(&mut self, target: &Path) -> Result<(), XformError> {
        let mut from = 0;
        while let Some((prefix, index, _)) = target.split_around_first_multiplicity(from) {
            from = prefix.len();
            let depth = prefix.len() - 1;
            let pattern = prefix.to_match_pattern();
            if let Some(repeat) = find_repeat_mut(&mut self.nodes, &|repeat| pattern.matches(&repeat.path)) {
                while repeat.instances.len() < index {
                    let instance = repeat.new_instance();
                    repeat.instances.push(instance);
                }
                renumber(&mut self.nodes, &[]);
                continue;
            }

            let (Some(parent), Some(Step::Element { name, .. })) = (prefix.parent(), prefix.last()) else {
                continue;
            };
            let parent_pattern = parent.to_match_pattern();
            let Some(choice) = find_choice_mut(&mut self.nodes, &|choice| {
                choice.repeatable
                    && parent_pattern.matches(&choice.path)
                    && choice.alternative_decl(name).is_some()
            }) else {
                continue;
            };
            let mut selected = choice
                .instances
                .iter()
                .filter(|instance| instance.selected().is_some_and(|alternative| alternative.name == *name))
                .count();
            while selected < index {
                let position = match choice
                    .instances
                    .iter()
                    .position(|instance| instance.selected().is_none())
                {
                    Some(position) => position,
                    None => {
                        choice.ensure_instances(choice.instances.len() + 1);
                        choice.instances.len() - 1
                    }
                };
                choice.select(position, name)?;
                selected += 1;
            }
            renumber(&mut self.nodes, &[]);
            debug!("ensured {} occurrence(s) of {} at depth {}", index, name, depth);
        }
        Ok(())
    }

    /// Fields in form order with their current paths and values. Content of
    /// unselected alternatives is left out; fields of inactive option-dependent
    /// regions are listed as not visible.
    pub fn fields(&self) -> Vec<FieldView> {
        let mut views = Vec::new();
        collect_field_views(&mut Visibility::new(&self.nodes), &self.nodes, true, &mut views);
        views
    }

    /// Repeat and choice groups in form order.
    pub fn groups(&self) -> Vec<GroupView> {
        let mut views = Vec::new();
        collect_group_views(&mut Visibility::new(&self.nodes), &self.nodes, true, &mut views);
        views
    }

    /// Current value at `path`, merged like serialization; hidden and
    /// disabled fields do not count.
    pub fn value(&self, path: &str) -> Result<String, XformError> {
        let target = Path::parse(path)?;
        Ok(Visibility::new(&self.nodes).value_at(&target))
    }
}

fn checked_position(instance: usize) -> Result<usize, XformError> {
    instance.checked_sub(1).ok_or_else(|| {
        XformError::new(
            "CHOICE_INSTANCE_OUT_OF_RANGE",
            "Choice instances are numbered from 1.",
        )
    })
}

fn group_vanished(path: &Path) -> XformError {
    XformError::new(
        "GROUP_NOT_FOUND",
        format!("No repeat or choice group matches \"{}\".", path),
    )
}

/// Selects, in every choice instance, the alternative that holds a field
/// bound to `target`. Returns whether `nodes` holds such a field.
fn reveal(nodes: &mut [FormNode], target: &Path) -> Result<bool, XformError> {
    let pattern = target.to_match_pattern();
    let mut found = false;
    for node in nodes {
        match node {
            FormNode::Field(field) => found |= pattern.matches(&field.path),
            FormNode::Repeat(repeat) => {
                for instance in &mut repeat.instances {
                    found |= reveal(&mut instance.nodes, target)?;
                }
            }
            FormNode::When(when) => found |= reveal(&mut when.nodes, target)?,
            FormNode::Choice(choice) => {
                let mut satisfied = false;
                let mut candidates = Vec::new();
                for (position, instance) in choice.instances.iter_mut().enumerate() {
                    let free = instance.selected().is_none();
                    for alternative in &mut instance.alternatives {
                        if !reveal(&mut alternative.nodes, target)? {
                            continue;
                        }
                        found = true;
                        if alternative.selected {
                            satisfied = true;
                        } else {
                            candidates.push((position, alternative.name.clone(), free));
                        }
                    }
                }
                if satisfied {
                    continue;
                }
                let pick = candidates
                    .iter()
                    .find(|(_, _, free)| *free)
                    .or_else(|| candidates.first())
                    .map(|(position, name, free)| (*position, name.clone(), *free));
                let Some((mut position, name, free)) = pick else {
                    continue;
                };
                if !free && choice.repeatable {
                    choice.ensure_instances(choice.instances.len() + 1);
                    position = choice.instances.len() - 1;
                }
                debug!("revealing alternative {} of {}", name, choice.path);
                choice.select(position, &name)?;
            }
        }
    }
    Ok(found)
}

fn collect_field_views<'a>(
    visibility: &mut Visibility<'a>,
    nodes: &'a [FormNode],
    visible: bool,
    out: &mut Vec<FieldView>,
) {
    for node in nodes {
        match node {
            FormNode::Field(field) => out.push(FieldView {
                path: field.path.clone(),
                role: field.role,
                control: control_name(&field.control).to_string(),
                label: field.label.clone(),
                value: field.display_value(),
                visible,
                disabled: field.disabled,
            }),
            FormNode::Repeat(repeat) => {
                for instance in &repeat.instances {
                    collect_field_views(visibility, &instance.nodes, visible, out);
                }
            }
            FormNode::Choice(choice) => {
                for instance in &choice.instances {
                    if let Some(alternative) = instance.selected() {
                        collect_field_views(visibility, &alternative.nodes, visible, out);
                    }
                }
            }
            FormNode::When(when) => {
                let live = visible && visibility.is_live(when);
                collect_field_views(visibility, &when.nodes, live, out);
            }
        }
    }
}

fn collect_group_views<'a>(
    visibility: &mut Visibility<'a>,
    nodes: &'a [FormNode],
    visible: bool,
    out: &mut Vec<GroupView>,
) {
    for node in nodes {
        match node {
            FormNode::Field(_) => {}
            FormNode::Repeat(repeat) => {
                out.push(GroupView {
                    kind: GroupKind::Repeat,
                    id: repeat.id.clone(),
                    key: format!("{}@{}", repeat.id, repeat.path),
                    path: repeat.path.clone(),
                    instances: repeat.instances.len(),
                    min: repeat.min,
                    selections: Vec::new(),
                    alternatives: Vec::new(),
                    visible,
                });
                for instance in &repeat.instances {
                    collect_group_views(visibility, &instance.nodes, visible, out);
                }
            }
            FormNode::Choice(choice) => {
                out.push(GroupView {
                    kind: GroupKind::Choice,
                    id: choice.id.clone(),
                    key: format!("{}@{}", choice.id, choice.path),
                    path: choice.path.clone(),
                    instances: choice.instances.len(),
                    min: 1,
                    selections: choice
                        .instances
                        .iter()
                        .map(|instance| instance.selected().map(|alternative| alternative.name.clone()))
                        .collect(),
                    alternatives: choice
                        .alternatives
                        .iter()
                        .map(|alternative| alternative.name.clone())
                        .collect(),
                    visible,
                });
                for instance in &choice.instances {
                    if let Some(alternative) = instance.selected() {
                        collect_group_views(visibility, &alternative.nodes, visible, out);
                    }
                }
            }
            FormNode::When(when) => {
                let live = visible && visibility.is_live(when);
                collect_group_views(visibility, &when.nodes, live, out);
            }
        }
    }
}
