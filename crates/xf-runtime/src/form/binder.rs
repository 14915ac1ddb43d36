use log::trace;
use xf_core::{AlternativeDecl, Path, XformError, AMBIGUOUS_CHOICE};

use super::model::{
    instantiate, Alternative, ChoiceGroup, ChoiceInstance, Field, FormNode, WhenRegion,
};

impl ChoiceGroup {
    /// Selects `name` in instance `instance` (0-based). The previously
    /// selected alternative is hidden and its content reset.
    pub(crate) fn select(&mut self, instance: usize, name: &str) -> Result<(), XformError> {
        if self.alternative_decl(name).is_none() {
            return Err(XformError::new(
                "CHOICE_UNKNOWN_ALTERNATIVE",
                format!(
                    "Choice group \"{}\" at \"{}\" has no alternative \"{}\".",
                    self.id, self.path, name
                ),
            ));
        }
        let target = self.instance_mut_checked(instance)?;
        let (decls, instance) = target;
        for alternative in &mut instance.alternatives {
            if alternative.name == name {
                alternative.selected = true;
                continue;
            }
            if alternative.selected {
                trace!("hiding alternative {}", alternative.name);
                reset_alternative(alternative, decls);
            }
            alternative.selected = false;
        }
        Ok(())
    }

    pub(crate) fn clear_selection(&mut self, instance: usize) -> Result<(), XformError> {
        let (decls, instance) = self.instance_mut_checked(instance)?;
        for alternative in &mut instance.alternatives {
            if alternative.selected {
                reset_alternative(alternative, decls);
            }
            alternative.selected = false;
        }
        Ok(())
    }

    /// Appends unselected instances until there are at least `count`.
    pub(crate) fn ensure_instances(&mut self, count: usize) {
        while self.instances.len() < count {
            self.instances
                .push(ChoiceInstance::unselected(&self.alternatives));
        }
    }

    fn instance_mut_checked(
        &mut self,
        instance: usize,
    ) -> Result<(&[AlternativeDecl], &mut ChoiceInstance), XformError> {
        let available = self.instances.len();
        match self.instances.get_mut(instance) {
            Some(found) => Ok((&self.alternatives, found)),
            None => Err(XformError::new(
                "CHOICE_INSTANCE_OUT_OF_RANGE",
                format!(
                    "Choice group \"{}\" at \"{}\" has {} instance(s); instance {} does not exist.",
                    self.id,
                    self.path,
                    available,
                    instance + 1
                ),
            )),
        }
    }
}

fn reset_alternative(alternative: &mut Alternative, decls: &[AlternativeDecl]) {
    if let Some(decl) = decls.iter().find(|decl| decl.name == alternative.name) {
        alternative.nodes = instantiate(&decl.nodes);
    }
}

/// Fails when any choice instance has more than one selected alternative.
pub(crate) fn check_exclusivity(nodes: &[FormNode]) -> Result<(), XformError> {
    for node in nodes {
        match node {
            FormNode::Field(_) => {}
            FormNode::Repeat(repeat) => {
                for instance in &repeat.instances {
                    check_exclusivity(&instance.nodes)?;
                }
            }
            FormNode::Choice(choice) => {
                for (position, instance) in choice.instances.iter().enumerate() {
                    let selected = instance
                        .alternatives
                        .iter()
                        .filter(|alternative| alternative.selected)
                        .map(|alternative| alternative.name.as_str())
                        .collect::<Vec<_>>();
                    if selected.len() > 1 {
                        return Err(XformError::new(
                            AMBIGUOUS_CHOICE,
                            format!(
                                "Choice group \"{}\" at \"{}\" (instance {}) has several selected alternatives: {}.",
                                choice.id,
                                choice.path,
                                position + 1,
                                selected.join(", ")
                            ),
                        ));
                    }
                    for alternative in &instance.alternatives {
                        check_exclusivity(&alternative.nodes)?;
                    }
                }
            }
            FormNode::When(when) => check_exclusivity(&when.nodes)?,
        }
    }
    Ok(())
}

/// Resolves option-dependent regions. A region is live while the merged
/// value of the visible, enabled fields at its controlling path equals its
/// `equals`; a controller that is itself hidden reads as empty.
pub(crate) struct Visibility<'a> {
    form_nodes: &'a [FormNode],
    resolving: Vec<Path>,
    resolved: Vec<(Path, String)>,
    /// Bumped whenever a lookup hits a path still being resolved.
    cycles: usize,
}

impl<'a> Visibility<'a> {
    pub(crate) fn new(form_nodes: &'a [FormNode]) -> Self {
        Self {
            form_nodes,
            resolving: Vec::new(),
            resolved: Vec::new(),
            cycles: 0,
        }
    }

    pub(crate) fn is_live(&mut self, when: &WhenRegion) -> bool {
        self.value_at(&when.path) == when.equals
    }

    /// Merged value of the visible, enabled fields bound to `path`.
    pub(crate) fn value_at(&mut self, path: &Path) -> String {
        if let Some((_, value)) = self.resolved.iter().find(|(seen, _)| seen == path) {
            return value.clone();
        }
        if self.resolving.contains(path) {
            trace!("option-dependent cycle through {}", path);
            self.cycles += 1;
            return String::new();
        }

        let cycles_before = self.cycles;
        self.resolving.push(path.clone());
        let mut values = Vec::new();
        let form_nodes = self.form_nodes;
        self.for_each_field(form_nodes, &mut |field| {
            if !field.disabled && field.path.addresses(path) {
                values.extend(field.contributions());
            }
        });
        self.resolving.pop();

        let value = values.join(" ");
        // Values cut short by a cycle depend on where resolution started.
        if self.cycles == cycles_before {
            self.resolved.push((path.clone(), value.clone()));
        }
        value
    }

    /// Calls `visit` for every visible field below `nodes`, disabled ones included.
    pub(crate) fn for_each_field(&mut self, nodes: &'a [FormNode], visit: &mut dyn FnMut(&Field)) {
        for node in nodes {
            match node {
                FormNode::Field(field) => visit(field),
                FormNode::Repeat(repeat) => {
                    for instance in &repeat.instances {
                        self.for_each_field(&instance.nodes, visit);
                    }
                }
                FormNode::Choice(choice) => {
                    for instance in &choice.instances {
                        if let Some(alternative) = instance.selected() {
                            self.for_each_field(&alternative.nodes, visit);
                        }
                    }
                }
                FormNode::When(when) => {
                    if self.is_live(when) {
                        self.for_each_field(&when.nodes, visit);
                    }
                }
            }
        }
    }
}
