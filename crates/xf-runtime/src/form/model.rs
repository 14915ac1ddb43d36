use serde::{Deserialize, Serialize};
use xf_core::{
    AlternativeDecl, ControlDecl, FieldDecl, FieldRole, FormTemplate, Path, TemplateNode,
    XformError,
};

/// Expanded, stateful form: the only state serialization reads from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveForm {
    pub(crate) template: FormTemplate,
    pub(crate) nodes: Vec<FormNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub(crate) enum FormNode {
    Field(Field),
    Repeat(RepeatGroup),
    Choice(ChoiceGroup),
    When(WhenRegion),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Field {
    pub(crate) template_path: Path,
    /// Template path with the indices of the enclosing instances applied.
    pub(crate) path: Path,
    pub(crate) role: FieldRole,
    pub(crate) control: ControlDecl,
    pub(crate) value: FieldValue,
    pub(crate) disabled: bool,
    pub(crate) label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "camelCase")]
pub(crate) enum FieldValue {
    Text(String),
    Selected(Vec<String>),
    Checked(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RepeatGroup {
    pub(crate) id: String,
    pub(crate) template_path: Path,
    pub(crate) path: Path,
    pub(crate) min: usize,
    pub(crate) fragment: Vec<TemplateNode>,
    pub(crate) instances: Vec<RepeatInstance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct RepeatInstance {
    pub(crate) nodes: Vec<FormNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChoiceGroup {
    pub(crate) id: String,
    pub(crate) template_path: Path,
    /// Parent position shared by the alternatives.
    pub(crate) path: Path,
    pub(crate) repeatable: bool,
    pub(crate) alternatives: Vec<AlternativeDecl>,
    pub(crate) instances: Vec<ChoiceInstance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ChoiceInstance {
    pub(crate) alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Alternative {
    pub(crate) name: String,
    pub(crate) selected: bool,
    pub(crate) nodes: Vec<FormNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WhenRegion {
    pub(crate) template_path: Path,
    /// Concrete path of the controlling field.
    pub(crate) path: Path,
    pub(crate) equals: String,
    pub(crate) nodes: Vec<FormNode>,
}

/// Control families that may not share a resolved path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlFamily {
    TextLike,
    Select,
    Toggle,
}

impl ControlFamily {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::TextLike => "text",
            Self::Select => "select",
            Self::Toggle => "toggle",
        }
    }
}

pub(crate) fn control_name(control: &ControlDecl) -> &'static str {
    match control {
        ControlDecl::Text => "text",
        ControlDecl::Textarea => "textarea",
        ControlDecl::File => "file",
        ControlDecl::Select { .. } => "select",
        ControlDecl::Checkbox { .. } => "checkbox",
        ControlDecl::Radio { .. } => "radio",
    }
}

impl Field {
    fn from_decl(decl: &FieldDecl) -> Self {
        let mut field = Self {
            template_path: decl.path.clone(),
            path: decl.path.clone(),
            role: decl.role,
            control: decl.control.clone(),
            value: FieldValue::Checked(false),
            disabled: decl.disabled,
            label: decl.label.clone(),
        };
        field.clear();
        field
    }

    pub(crate) fn clear(&mut self) {
        self.value = match self.control {
            ControlDecl::Text | ControlDecl::Textarea | ControlDecl::File => {
                FieldValue::Text(String::new())
            }
            ControlDecl::Select { .. } => FieldValue::Selected(Vec::new()),
            ControlDecl::Checkbox { .. } | ControlDecl::Radio { .. } => FieldValue::Checked(false),
        };
    }

    pub(crate) fn family(&self) -> ControlFamily {
        match self.control {
            ControlDecl::Text | ControlDecl::Textarea | ControlDecl::File => ControlFamily::TextLike,
            ControlDecl::Select { .. } => ControlFamily::Select,
            ControlDecl::Checkbox { .. } | ControlDecl::Radio { .. } => ControlFamily::Toggle,
        }
    }

    pub(crate) fn is_checkbox(&self) -> bool {
        matches!(self.control, ControlDecl::Checkbox { .. })
    }

    pub(crate) fn is_multiline(&self) -> bool {
        matches!(self.control, ControlDecl::Textarea)
    }

    /// Values this field contributes to serialization; empty values are dropped.
    /// A `multiple-value` text field contributes one value per token.
    pub(crate) fn contributions(&self) -> Vec<String> {
        match (&self.value, &self.control) {
            (FieldValue::Text(value), _) if self.role == FieldRole::MultipleValue => {
                value.split_whitespace().map(str::to_string).collect()
            }
            (FieldValue::Text(value), _) if !value.is_empty() => vec![value.clone()],
            (FieldValue::Selected(selected), _) => selected
                .iter()
                .filter(|value| !value.is_empty())
                .cloned()
                .collect(),
            (
                FieldValue::Checked(true),
                ControlDecl::Checkbox { value } | ControlDecl::Radio { value },
            ) if !value.is_empty() => vec![value.clone()],
            _ => Vec::new(),
        }
    }

    /// Current value as a single string, as shown to the user.
    pub(crate) fn display_value(&self) -> String {
        self.contributions().join(" ")
    }

    /// Applies `value` to this field alone.
    pub(crate) fn set(&mut self, value: &str) {
        match &self.control {
            ControlDecl::Text | ControlDecl::Textarea | ControlDecl::File => {
                self.value = FieldValue::Text(value.to_string());
            }
            ControlDecl::Select { options, multiple } => {
                let wanted = if *multiple {
                    value.split_whitespace().collect::<Vec<_>>()
                } else {
                    vec![value]
                };
                let selected = options
                    .iter()
                    .filter(|option| wanted.contains(&option.as_str()))
                    .cloned()
                    .collect::<Vec<_>>();
                self.value = FieldValue::Selected(selected);
            }
            ControlDecl::Checkbox { value: option } | ControlDecl::Radio { value: option } => {
                self.value = FieldValue::Checked(option == value);
            }
        }
    }

    pub(crate) fn set_checked_from_tokens(&mut self, tokens: &[&str]) {
        if let ControlDecl::Checkbox { value } | ControlDecl::Radio { value } = &self.control {
            self.value = FieldValue::Checked(tokens.contains(&value.as_str()));
        }
    }
}

/// Live nodes for a template fragment in their reset state.
pub(crate) fn instantiate(decls: &[TemplateNode]) -> Vec<FormNode> {
    decls.iter().map(instantiate_node).collect()
}

fn instantiate_node(decl: &TemplateNode) -> FormNode {
    match decl {
        TemplateNode::Field(field) => FormNode::Field(Field::from_decl(field)),
        TemplateNode::Repeat(repeat) => FormNode::Repeat(RepeatGroup {
            id: repeat.id.clone(),
            template_path: repeat.path.clone(),
            path: repeat.path.clone(),
            min: repeat.min.max(1),
            fragment: repeat.nodes.clone(),
            instances: (0..repeat.min.max(1))
                .map(|_| RepeatInstance {
                    nodes: instantiate(&repeat.nodes),
                })
                .collect(),
        }),
        TemplateNode::Choice(choice) => FormNode::Choice(ChoiceGroup {
            id: choice.id.clone(),
            template_path: choice.path.clone(),
            path: choice.path.clone(),
            repeatable: choice.repeatable,
            alternatives: choice.alternatives.clone(),
            instances: vec![ChoiceInstance::unselected(&choice.alternatives)],
        }),
        TemplateNode::When(when) => FormNode::When(WhenRegion {
            template_path: when.path.clone(),
            path: when.path.clone(),
            equals: when.equals.clone(),
            nodes: instantiate(&when.nodes),
        }),
    }
}

impl RepeatGroup {
    pub(crate) fn new_instance(&self) -> RepeatInstance {
        RepeatInstance {
            nodes: instantiate(&self.fragment),
        }
    }

    /// Depth of the repeated element step.
    pub(crate) fn depth(&self) -> usize {
        self.template_path.len() - 1
    }
}

impl ChoiceInstance {
    pub(crate) fn unselected(alternatives: &[AlternativeDecl]) -> Self {
        Self {
            alternatives: alternatives
                .iter()
                .map(|alternative| Alternative {
                    name: alternative.name.clone(),
                    selected: false,
                    nodes: instantiate(&alternative.nodes),
                })
                .collect(),
        }
    }

    pub(crate) fn selected(&self) -> Option<&Alternative> {
        self.alternatives.iter().find(|alternative| alternative.selected)
    }
}

impl ChoiceGroup {
    /// Depth of the alternative element step.
    pub(crate) fn depth(&self) -> usize {
        self.template_path.len()
    }

    pub(crate) fn alternative_decl(&self, name: &str) -> Option<&AlternativeDecl> {
        self.alternatives
            .iter()
            .find(|alternative| alternative.name == name)
    }
}

pub(crate) fn field_not_found(path: &Path) -> XformError {
    XformError::new(
        "FIELD_NOT_FOUND",
        format!("No field is bound to \"{}\".", path),
    )
}

/// Calls `visit` for every field that can take a value: fields inside
/// unselected alternatives are skipped, option-dependent regions are not.
pub(crate) fn for_each_bound_field_mut<'a>(
    nodes: &'a mut [FormNode],
    visit: &mut dyn FnMut(&'a mut Field),
) {
    for node in nodes {
        match node {
            FormNode::Field(field) => visit(field),
            FormNode::Repeat(repeat) => {
                for instance in &mut repeat.instances {
                    for_each_bound_field_mut(&mut instance.nodes, visit);
                }
            }
            FormNode::Choice(choice) => {
                for instance in &mut choice.instances {
                    for alternative in &mut instance.alternatives {
                        if alternative.selected {
                            for_each_bound_field_mut(&mut alternative.nodes, visit);
                        }
                    }
                }
            }
            FormNode::When(when) => for_each_bound_field_mut(&mut when.nodes, visit),
        }
    }
}

/// First repeat group accepted by `predicate`; unselected alternatives are not searched.
pub(crate) fn find_repeat_mut<'a>(
    nodes: &'a mut [FormNode],
    predicate: &dyn Fn(&RepeatGroup) -> bool,
) -> Option<&'a mut RepeatGroup> {
    for node in nodes {
        match node {
            FormNode::Field(_) => {}
            FormNode::Repeat(repeat) => {
                if predicate(repeat) {
                    return Some(repeat);
                }
                for instance in &mut repeat.instances {
                    if let Some(found) = find_repeat_mut(&mut instance.nodes, predicate) {
                        return Some(found);
                    }
                }
            }
            FormNode::Choice(choice) => {
                for instance in &mut choice.instances {
                    for alternative in instance.alternatives.iter_mut().filter(|alternative| alternative.selected) {
                        if let Some(found) = find_repeat_mut(&mut alternative.nodes, predicate) {
                            return Some(found);
                        }
                    }
                }
            }
            FormNode::When(when) => {
                if let Some(found) = find_repeat_mut(&mut when.nodes, predicate) {
                    return Some(found);
                }
            }
        }
    }
    None
}

pub(crate) fn find_choice_mut<'a>(
    nodes: &'a mut [FormNode],
    predicate: &dyn Fn(&ChoiceGroup) -> bool,
) -> Option<&'a mut ChoiceGroup> {
    for node in nodes {
        match node {
            FormNode::Field(_) => {}
            FormNode::Repeat(repeat) => {
                for instance in &mut repeat.instances {
                    if let Some(found) = find_choice_mut(&mut instance.nodes, predicate) {
                        return Some(found);
                    }
                }
            }
            FormNode::Choice(choice) => {
                if predicate(choice) {
                    return Some(choice);
                }
                for instance in &mut choice.instances {
                    for alternative in instance.alternatives.iter_mut().filter(|alternative| alternative.selected) {
                        if let Some(found) = find_choice_mut(&mut alternative.nodes, predicate) {
                            return Some(found);
                        }
                    }
                }
            }
            FormNode::When(when) => {
                if let Some(found) = find_choice_mut(&mut when.nodes, predicate) {
                    return Some(found);
                }
            }
        }
    }
    None
}

/// Recomputes every concrete path from the template paths and the current
/// instance positions.
pub(crate) fn renumber(nodes: &mut [FormNode], assignments: &[(usize, usize)]) {
    for node in nodes {
        match node {
            FormNode::Field(field) => field.path = assign(&field.template_path, assignments),
            FormNode::Repeat(repeat) => {
                repeat.path = assign(&repeat.template_path, assignments);
                renumber_repeat(repeat, assignments);
            }
            FormNode::Choice(choice) => {
                choice.path = assign(&choice.template_path, assignments);
                renumber_choice(choice, assignments);
            }
            FormNode::When(when) => {
                when.path = assign(&when.template_path, assignments);
                renumber(&mut when.nodes, assignments);
            }
        }
    }
}

fn renumber_repeat(repeat: &mut RepeatGroup, assignments: &[(usize, usize)]) {
    let depth = repeat.depth();
    for (position, instance) in repeat.instances.iter_mut().enumerate() {
        let mut nested = assignments.to_vec();
        nested.push((depth, position + 1));
        renumber(&mut instance.nodes, &nested);
    }
}

fn renumber_choice(choice: &mut ChoiceGroup, assignments: &[(usize, usize)]) {
    let depth = choice.depth();
    let repeatable = choice.repeatable;
    let mut seen: Vec<(String, usize)> = Vec::new();
    for instance in &mut choice.instances {
        for alternative in &mut instance.alternatives {
            if !repeatable {
                renumber(&mut alternative.nodes, assignments);
                continue;
            }
            let earlier = seen
                .iter()
                .find(|(name, _)| *name == alternative.name)
                .map_or(0, |(_, count)| *count);
            let mut nested = assignments.to_vec();
            nested.push((depth, earlier + 1));
            renumber(&mut alternative.nodes, &nested);
        }
        if let Some(selected) = instance.selected() {
            match seen.iter_mut().find(|(name, _)| *name == selected.name) {
                Some((_, count)) => *count += 1,
                None => seen.push((selected.name.clone(), 1)),
            }
        }
    }
}

/// Indices a concrete path already carries, as renumbering assignments.
fn assignments_of(path: &Path) -> Vec<(usize, usize)> {
    path.steps()
        .iter()
        .enumerate()
        .filter_map(|(depth, step)| step.index().map(|index| (depth, index)))
        .collect()
}

impl RepeatGroup {
    /// Renumbers this group's instances from its current path.
    pub(crate) fn renumber_instances(&mut self) {
        let outer = assignments_of(&self.path);
        renumber_repeat(self, &outer);
    }
}

impl ChoiceGroup {
    /// Renumbers this group's alternatives from its current path.
    pub(crate) fn renumber_alternatives(&mut self) {
        let outer = assignments_of(&self.path);
        renumber_choice(self, &outer);
    }
}

fn assign(template_path: &Path, assignments: &[(usize, usize)]) -> Path {
    assignments
        .iter()
        .fold(template_path.clone(), |path, (depth, index)| {
            path.reindex(*depth, *index)
        })
}
