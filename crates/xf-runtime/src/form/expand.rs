use std::sync::OnceLock;

use log::{debug, trace, warn};
use regex::Regex;
use xf_core::{Document, Element, FieldRole, FormTemplate, Path, XformError};

use super::model::{
    find_choice_mut, find_repeat_mut, for_each_bound_field_mut, instantiate, renumber, Field, LiveForm,
};

/// Switches applied while loading a document into a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializeOptions {
    /// Decode `<br/>`, `<br />` and `<br>` to newlines for multi-line controls.
    pub decode_line_breaks: bool,
}

impl Default for InitializeOptions {
    fn default() -> Self {
        Self {
            decode_line_breaks: true,
        }
    }
}

pub fn initialize_form(document: &Document, template: &FormTemplate) -> Result<LiveForm, XformError> {
    initialize_form_with_options(document, template, &InitializeOptions::default())
}

pub fn initialize_form_with_options(
    document: &Document,
    template: &FormTemplate,
    options: &InitializeOptions,
) -> Result<LiveForm, XformError> {
    let mut form = LiveForm::new(template.clone());
    form.load_with_options(document, options)?;
    Ok(form)
}

impl LiveForm {
    /// Fresh form in its reset state.
    pub fn new(template: FormTemplate) -> Self {
        let mut form = Self {
            nodes: Vec::new(),
            template,
        };
        form.reset();
        form
    }

    pub fn template(&self) -> &FormTemplate {
        &self.template
    }

    /// Clears every field and collapses every group to its minimum.
    pub fn reset(&mut self) {
        self.nodes = instantiate(&self.template.nodes);
        renumber(&mut self.nodes, &[]);
    }

    pub fn load(&mut self, document: &Document) -> Result<(), XformError> {
        self.load_with_options(document, &InitializeOptions::default())
    }

    pub fn load_with_options(
        &mut self,
        document: &Document,
        options: &InitializeOptions,
    ) -> Result<(), XformError> {
        self.reset();

        let root_name = self.template_name(&document.root);
        let expected = self.template.root.last().and_then(|step| step.name());
        if root_name.is_none() || root_name.as_deref() != expected {
            warn!(
                "document root <{}> does not match template root {}; nothing loaded",
                document.root.name, self.template.root
            );
            return Ok(());
        }

        let mut walk = Walk {
            options,
            choice_counts: Vec::new(),
        };
        let root = self.template.root.clone();
        walk.element(self, &document.root, &root)?;
        Ok(())
    }

    fn template_name(&self, element: &Element) -> Option<String> {
        self.template
            .namespaces
            .template_name(element.namespace.as_deref(), element.local_name())
    }

    /// Applies a document value to the fields bound to `target` using the
    /// multi-field rule. Returns the number of fields touched.
    pub(crate) fn apply_value(&mut self, target: &Path, value: &str, options: &InitializeOptions) -> usize {
        let mut matching: Vec<&mut Field> = Vec::new();
        for_each_bound_field_mut(&mut self.nodes, &mut |field| {
            if field.path.addresses(target) {
                matching.push(field);
            }
        });
        let touched = matching.len();

        if touched < 2 || !value.contains(' ') {
            for field in matching {
                set_decoded(field, value, options);
            }
            return touched;
        }

        let tokens = value.split(' ').filter(|token| !token.is_empty()).collect::<Vec<_>>();
        let consumers = matching.iter().filter(|field| !field.is_checkbox()).count();
        let mut next_token = 0;
        let mut consumer = 0;
        for field in matching {
            if field.is_checkbox() {
                field.set_checked_from_tokens(&tokens);
                continue;
            }
            consumer += 1;
            // Later consumers keep one token each; a list field takes what is left.
            let end = if consumer == consumers {
                tokens.len()
            } else if field.role == FieldRole::MultipleValue {
                tokens.len().saturating_sub(consumers - consumer).max(next_token + 1)
            } else {
                next_token + 1
            };
            let share = tokens.get(next_token..end.min(tokens.len())).unwrap_or_default().join(" ");
            next_token = end;
            set_decoded(field, &share, options);
        }
        touched
    }
}

fn set_decoded(field: &mut Field, value: &str, options: &InitializeOptions) {
    if field.is_multiline() && options.decode_line_breaks {
        field.set(&decode_line_breaks(value));
    } else {
        field.set(value);
    }
}

fn line_break_regex() -> &'static Regex {
    static LINE_BREAK: OnceLock<Regex> = OnceLock::new();
    LINE_BREAK.get_or_init(|| Regex::new(r"(?i)<br\s*/?>").expect("line break regex must compile"))
}

pub(crate) fn decode_line_breaks(value: &str) -> String {
    line_break_regex().replace_all(value, "\n").into_owned()
}

struct Walk<'a> {
    options: &'a InitializeOptions,
    /// Occurrences seen so far per repeatable choice, keyed by concrete path and id.
    choice_counts: Vec<(String, usize)>,
}

impl Walk<'_> {
    fn element(&mut self, form: &mut LiveForm, element: &Element, path: &Path) -> Result<(), XformError> {
        for attribute in &element.attributes {
            let Some(name) = form.template.namespaces.template_name(
                attribute.namespace.as_deref(),
                xf_core::qualify(&attribute.name).1,
            ) else {
                debug!("skipping attribute {} of {}: namespace not in template", attribute.name, path);
                continue;
            };
            let target = path.child_attribute(&name);
            if form.apply_value(&target, &attribute.value, self.options) == 0 {
                debug!("no field bound to {}", target);
            }
        }

        let text = element.text();
        if !text.trim().is_empty() {
            let touched = form.apply_value(path, &text, self.options)
                + form.apply_value(&path.child_text(), &text, self.options);
            if touched == 0 {
                debug!("no field bound to text of {}", path);
            }
        }

        let mut occurrences: Vec<(String, usize)> = Vec::new();
        for child in element.child_elements() {
            let Some(name) = form.template_name(child) else {
                debug!("skipping <{}> under {}: namespace not in template", child.name, path);
                continue;
            };
            let index = match occurrences.iter_mut().find(|(seen, _)| *seen == name) {
                Some((_, count)) => {
                    *count += 1;
                    *count
                }
                None => {
                    occurrences.push((name.clone(), 1));
                    1
                }
            };
            let child_path = path.child_element(&name, Some(index));

            self.place_in_choice(form, path, &name)?;
            place_in_repeat(form, &child_path, index);
            self.element(form, child, &child_path)?;
        }
        Ok(())
    }

    /// Selects the alternative `name` of a choice anchored at `parent`.
    fn place_in_choice(&mut self, form: &mut LiveForm, parent: &Path, name: &str) -> Result<(), XformError> {
        let parent_pattern = parent.to_match_pattern();
        let Some(choice) = find_choice_mut(&mut form.nodes, &|choice| {
            parent_pattern.matches(&choice.path) && choice.alternative_decl(name).is_some()
        }) else {
            return Ok(());
        };

        let instance = if choice.repeatable {
            let key = format!("{}@{}", choice.id, choice.path);
            let count = match self.choice_counts.iter_mut().find(|(seen, _)| *seen == key) {
                Some((_, count)) => {
                    *count += 1;
                    *count
                }
                None => {
                    self.choice_counts.push((key, 1));
                    1
                }
            };
            choice.ensure_instances(count);
            count - 1
        } else {
            0
        };
        trace!("selecting {} in choice {} instance {}", name, choice.id, instance + 1);
        choice.select(instance, name)?;
        choice.renumber_alternatives();
        Ok(())
    }
}

/// Grows the repeat group owning `child_path` to at least `index` instances.
fn place_in_repeat(form: &mut LiveForm, child_path: &Path, index: usize) {
    let depth = child_path.len() - 1;
    let pattern = child_path.to_match_pattern().any_index_at(depth);
    let Some(repeat) = find_repeat_mut(&mut form.nodes, &|repeat| pattern.matches(&repeat.path)) else {
        return;
    };
    if repeat.instances.len() >= index {
        return;
    }
    while repeat.instances.len() < index {
        let instance = repeat.new_instance();
        repeat.instances.push(instance);
    }
    repeat.renumber_instances();
    debug!("expanded repeat group {} to {} instances", repeat.id, index);
}
