use log::debug;
use xf_core::{
    is_valid_qualified_name, AlternativeDecl, ChoiceDecl, ControlDecl, FieldDecl, FieldRole,
    FormTemplate, NamespaceTable, Path, RepeatDecl, SourceSpan, Step, TemplateNode, WhenDecl,
    XformError,
};
use xf_parser::{parse_markup, MarkupDocument, MarkupElement};

mod blocks;
mod xml_utils;

use blocks::{collect_blocks, rebased, BlockDef, DEFAULT_MAX_DEPTH};
use xml_utils::{
    get_optional_attr, get_required_attr, get_required_non_empty_attr, has_attr,
    parse_bool_attr, parse_count_attr, parse_path_attr,
};

pub fn compile_form_template(source: &str) -> Result<FormTemplate, XformError> {
    compile_form_markup(&parse_markup(source)?)
}

pub fn compile_form_markup(document: &MarkupDocument) -> Result<FormTemplate, XformError> {
    let form = &document.root;
    if form.name != "form" {
        return Err(XformError::with_span(
            "TEMPLATE_ROOT_INVALID",
            format!("Expected <form> template root, got <{}>.", form.name),
            form.location.clone(),
        ));
    }

    let root = parse_path_attr(form, "root")?;
    let root_is_single_element = root.len() == 1
        && matches!(root.last(), Some(Step::Element { index, .. }) if index.unwrap_or(1) == 1);
    if !root_is_single_element {
        return Err(XformError::with_span(
            "TEMPLATE_ROOT_INVALID",
            format!(
                "Template root \"{}\" must be a single unindexed element step.",
                root
            ),
            form.location.clone(),
        ));
    }

    let mut declarations = Vec::new();
    for child in form.element_children() {
        if child.name == "namespace" {
            let prefix = get_required_non_empty_attr(child, "prefix")?;
            let uri = get_required_non_empty_attr(child, "uri")?;
            declarations.push((prefix, uri));
        }
    }
    let namespaces = NamespaceTable::from_declarations(declarations)
        .map_err(|error| error.at(&form.location))?;

    let blocks = collect_blocks(form)?;
    let mut compiler = TemplateCompiler {
        namespaces: &namespaces,
        blocks: &blocks,
        expanding: Vec::new(),
    };
    compiler.check_names(&root, &form.location)?;
    let nodes = compiler.compile_children(form, &root, true)?;

    let template = FormTemplate {
        root,
        namespaces,
        nodes,
    };
    let stats = TemplateStats::of(&template.nodes);
    debug!(
        "compiled form template {}: {} fields, {} repeat groups, {} choice groups, {} option-dependent regions",
        template.root, stats.fields, stats.repeats, stats.choices, stats.whens
    );
    Ok(template)
}

struct TemplateCompiler<'a> {
    namespaces: &'a NamespaceTable,
    blocks: &'a [BlockDef<'a>],
    /// Blocks being expanded, outermost first, with their depth limit.
    expanding: Vec<(String, usize)>,
}

impl TemplateCompiler<'_> {
    fn compile_children(
        &mut self,
        node: &MarkupElement,
        scope: &Path,
        at_form_root: bool,
    ) -> Result<Vec<TemplateNode>, XformError> {
        let mut nodes = Vec::new();
        for child in node.element_children() {
            self.compile_element(child, scope, at_form_root, &mut nodes)?;
        }
        Ok(nodes)
    }

    fn compile_element(
        &mut self,
        node: &MarkupElement,
        scope: &Path,
        at_form_root: bool,
        out: &mut Vec<TemplateNode>,
    ) -> Result<(), XformError> {
        match node.name.as_str() {
            "namespace" | "define" if at_form_root => Ok(()),
            "namespace" => Err(XformError::with_span(
                "TEMPLATE_NAMESPACE_MISPLACED",
                "<namespace> is only allowed directly under <form>.",
                node.location.clone(),
            )),
            "field" => {
                out.push(TemplateNode::Field(self.compile_field(node, scope)?));
                Ok(())
            }
            "repeat" => {
                out.push(TemplateNode::Repeat(self.compile_repeat(node, scope)?));
                Ok(())
            }
            "choice" => {
                out.push(TemplateNode::Choice(self.compile_choice(node, scope)?));
                Ok(())
            }
            "when" => {
                out.push(TemplateNode::When(self.compile_when(node, scope)?));
                Ok(())
            }
            "ref" => self.expand_ref(node, scope, out),
            "alternative" | "option" | "form" | "define" => Err(XformError::with_span(
                "TEMPLATE_NODE_MISPLACED",
                format!("<{}> is not allowed here.", node.name),
                node.location.clone(),
            )),
            _ => {
                for child in node.element_children() {
                    self.compile_element(child, scope, false, out)?;
                }
                Ok(())
            }
        }
    }

    fn compile_field(&self, node: &MarkupElement, scope: &Path) -> Result<FieldDecl, XformError> {
        let path = self.scoped_path(node, scope)?;
        let role_raw = get_optional_attr(node, "role").unwrap_or_else(|| "value".to_string());
        let Some(role) = FieldRole::parse(role_raw.trim()) else {
            return Err(XformError::with_span(
                "TEMPLATE_ROLE_INVALID",
                format!("Unknown field role \"{}\".", role_raw),
                node.location.clone(),
            ));
        };
        check_role(role, &path, &node.location)?;

        let control = self.compile_control(node)?;
        Ok(FieldDecl {
            path,
            role,
            control,
            disabled: parse_bool_attr(node, "disabled", false)?,
            label: get_optional_attr(node, "label"),
        })
    }

    fn compile_control(&self, node: &MarkupElement) -> Result<ControlDecl, XformError> {
        let control = get_optional_attr(node, "control").unwrap_or_else(|| "text".to_string());
        let toggle = matches!(control.trim(), "checkbox" | "radio");
        if has_attr(node, "value") && !toggle {
            return Err(XformError::with_span(
                "XML_ATTR_NOT_ALLOWED",
                format!(
                    "Attribute \"value\" is only allowed on checkbox and radio fields, not \"{}\".",
                    control
                ),
                node.location.clone(),
            ));
        }

        let options = node
            .element_children()
            .filter(|child| child.name == "option")
            .map(|child| get_required_attr(child, "value"))
            .collect::<Result<Vec<_>, _>>()?;
        if !options.is_empty() && control.trim() != "select" {
            return Err(XformError::with_span(
                "TEMPLATE_NODE_MISPLACED",
                "<option> is only allowed inside select fields.",
                node.location.clone(),
            ));
        }

        match control.trim() {
            "text" => Ok(ControlDecl::Text),
            "textarea" => Ok(ControlDecl::Textarea),
            "file" => Ok(ControlDecl::File),
            "select" => Ok(ControlDecl::Select {
                options,
                multiple: parse_bool_attr(node, "multiple", false)?,
            }),
            "checkbox" => Ok(ControlDecl::Checkbox {
                value: get_required_attr(node, "value")?,
            }),
            "radio" => Ok(ControlDecl::Radio {
                value: get_required_attr(node, "value")?,
            }),
            other => Err(XformError::with_span(
                "TEMPLATE_CONTROL_INVALID",
                format!("Unknown field control \"{}\".", other),
                node.location.clone(),
            )),
        }
    }

    fn compile_repeat(&mut self, node: &MarkupElement, scope: &Path) -> Result<RepeatDecl, XformError> {
        let id = get_required_non_empty_attr(node, "group")?;
        let path = self.scoped_path(node, scope)?;
        let repeats_an_element = path.len() > scope.len()
            && matches!(path.last(), Some(Step::Element { index: None, .. }));
        if !repeats_an_element {
            return Err(XformError::with_span(
                "TEMPLATE_REPEAT_PATH_INVALID",
                format!(
                    "Repeat group \"{}\" must end with an unindexed element step below \"{}\", got \"{}\".",
                    id, scope, path
                ),
                node.location.clone(),
            ));
        }

        let min = parse_count_attr(node, "min", 1)?;
        let nodes = self.compile_children(node, &path, false)?;
        Ok(RepeatDecl {
            id,
            path,
            min,
            nodes,
        })
    }

    fn compile_choice(&mut self, node: &MarkupElement, scope: &Path) -> Result<ChoiceDecl, XformError> {
        let id = get_required_non_empty_attr(node, "group")?;
        let path = self.scoped_path(node, scope)?;
        if !matches!(path.last(), Some(Step::Element { .. })) {
            return Err(XformError::with_span(
                "TEMPLATE_ROLE_MISMATCH",
                format!(
                    "Choice group \"{}\" must be anchored at an element, got \"{}\".",
                    id, path
                ),
                node.location.clone(),
            ));
        }
        let repeatable = parse_bool_attr(node, "repeatable", false)?;

        let mut alternatives: Vec<AlternativeDecl> = Vec::new();
        for child in node.element_children() {
            if child.name != "alternative" {
                return Err(XformError::with_span(
                    "TEMPLATE_NODE_MISPLACED",
                    format!("<choice> may only contain <alternative>, got <{}>.", child.name),
                    child.location.clone(),
                ));
            }

            let name = get_required_non_empty_attr(child, "name")?;
            let name = name.trim().to_string();
            if !is_valid_qualified_name(&name) {
                return Err(XformError::with_span(
                    "TEMPLATE_ALTERNATIVE_INVALID",
                    format!("Alternative name \"{}\" is not a qualified element name.", name),
                    child.location.clone(),
                ));
            }
            if alternatives.iter().any(|existing| existing.name == name) {
                return Err(XformError::with_span(
                    "TEMPLATE_DUPLICATE_ALTERNATIVE",
                    format!(
                        "Alternative \"{}\" is declared twice in choice group \"{}\".",
                        name, id
                    ),
                    child.location.clone(),
                ));
            }

            let alternative_path = path.child_element(&name, None);
            self.check_names(&alternative_path, &child.location)?;
            let nodes = self.compile_children(child, &alternative_path, false)?;
            alternatives.push(AlternativeDecl { name, nodes });
        }

        if alternatives.is_empty() {
            return Err(XformError::with_span(
                "TEMPLATE_CHOICE_EMPTY",
                format!("Choice group \"{}\" declares no alternatives.", id),
                node.location.clone(),
            ));
        }

        Ok(ChoiceDecl {
            id,
            path,
            repeatable,
            alternatives,
        })
    }

    fn compile_when(&mut self, node: &MarkupElement, scope: &Path) -> Result<WhenDecl, XformError> {
        let path = self.scoped_path(node, scope)?;
        let equals = get_required_attr(node, "equals")?;
        let nodes = self.compile_children(node, scope, false)?;
        Ok(WhenDecl {
            path,
            equals,
            nodes,
        })
    }

    /// Compiles block `block` in place with its paths moved under `path`.
    /// A block met again inside its own expansion stops once the limit of the
    /// outermost reference to it is reached.
    fn expand_ref(
        &mut self,
        node: &MarkupElement,
        scope: &Path,
        out: &mut Vec<TemplateNode>,
    ) -> Result<(), XformError> {
        let name = get_required_non_empty_attr(node, "block")?.trim().to_string();
        let base = self.scoped_path(node, scope)?;
        let blocks = self.blocks;
        let Some(block) = blocks.iter().find(|block| block.name == name) else {
            return Err(XformError::with_span(
                "TEMPLATE_BLOCK_UNKNOWN",
                format!("<ref> names undefined block \"{}\".", name),
                node.location.clone(),
            ));
        };

        let limit = match self.expanding.iter().find(|(active, _)| *active == name) {
            Some((_, limit)) => *limit,
            None => parse_count_attr(node, "max-depth", DEFAULT_MAX_DEPTH)?,
        };
        let depth = self
            .expanding
            .iter()
            .filter(|(active, _)| *active == name)
            .count();
        if depth >= limit {
            debug!("block {} not expanded at {}: depth limit {} reached", name, base, limit);
            return Ok(());
        }

        let body = rebased(block.body, &base);
        self.expanding.push((name, limit));
        let result = body
            .element_children()
            .try_for_each(|child| self.compile_element(child, scope, false, out));
        self.expanding.pop();
        result
    }

    /// Parses the `path` attribute and checks its prefixes and its scope.
    fn scoped_path(&self, node: &MarkupElement, scope: &Path) -> Result<Path, XformError> {
        let path = parse_path_attr(node, "path")?;
        self.check_names(&path, &node.location)?;
        if !path.is_within(scope) {
            return Err(XformError::with_span(
                "TEMPLATE_PATH_OUTSIDE_SCOPE",
                format!(
                    "Path \"{}\" on <{}> is not inside its enclosing scope \"{}\".",
                    path, node.name, scope
                ),
                node.location.clone(),
            ));
        }
        Ok(path)
    }

    fn check_names(&self, path: &Path, span: &SourceSpan) -> Result<(), XformError> {
        for step in path.steps() {
            if let Some(name) = step.name() {
                self.namespaces
                    .namespace_for(name)
                    .map_err(|error| error.at(span))?;
            }
        }
        Ok(())
    }
}

fn check_role(role: FieldRole, path: &Path, span: &SourceSpan) -> Result<(), XformError> {
    let agrees = match (role, path.last()) {
        (FieldRole::Attribute, Some(Step::Attribute { .. })) => true,
        (FieldRole::Text, Some(Step::Text)) => true,
        (FieldRole::Value | FieldRole::MultipleValue, Some(Step::Element { .. } | Step::Text)) => {
            true
        }
        _ => false,
    };
    if agrees {
        return Ok(());
    }
    Err(XformError::with_span(
        "TEMPLATE_ROLE_MISMATCH",
        format!(
            "Role \"{}\" does not fit the last step of path \"{}\".",
            role.as_str(),
            path
        ),
        span.clone(),
    ))
}

#[derive(Default)]
struct TemplateStats {
    fields: usize,
    repeats: usize,
    choices: usize,
    whens: usize,
}

impl TemplateStats {
    fn of(nodes: &[TemplateNode]) -> Self {
        let mut stats = Self::default();
        stats.add(nodes);
        stats
    }

    fn add(&mut self, nodes: &[TemplateNode]) {
        for node in nodes {
            match node {
                TemplateNode::Field(_) => self.fields += 1,
                TemplateNode::Repeat(repeat) => {
                    self.repeats += 1;
                    self.add(&repeat.nodes);
                }
                TemplateNode::Choice(choice) => {
                    self.choices += 1;
                    for alternative in &choice.alternatives {
                        self.add(&alternative.nodes);
                    }
                }
                TemplateNode::When(when) => {
                    self.whens += 1;
                    self.add(&when.nodes);
                }
            }
        }
    }
}
