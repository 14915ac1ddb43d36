use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::XformError;

/// One addressing step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    Element { name: String, index: Option<usize> },
    Attribute { name: String },
    Text,
}

impl Step {
    pub fn element(name: impl Into<String>, index: Option<usize>) -> Self {
        Self::Element {
            name: name.into(),
            index,
        }
    }

    pub fn attribute(name: impl Into<String>) -> Self {
        Self::Attribute { name: name.into() }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Element { name, .. } | Self::Attribute { name } => Some(name.as_str()),
            Self::Text => None,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Element { index, .. } => *index,
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element { .. })
    }

    fn same_position(&self, other: &Step) -> bool {
        match (self, other) {
            (Self::Element { name: left, .. }, Self::Element { name: right, .. }) => left == right,
            (Self::Attribute { name: left }, Self::Attribute { name: right }) => left == right,
            (Self::Text, Self::Text) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element {
                name,
                index: Some(index),
            } => write!(f, "{}[{}]", name, index),
            Self::Element { name, index: None } => f.write_str(name),
            Self::Attribute { name } => write!(f, "@{}", name),
            Self::Text => f.write_str("text()"),
        }
    }
}

/// Address of a position inside a document: `/a/b[2]/@attr`, `/a/b/text()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    steps: Vec<Step>,
}

fn name_regex() -> &'static Regex {
    static NAME: OnceLock<Regex> = OnceLock::new();
    NAME.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*(?::[A-Za-z_][A-Za-z0-9_.\-]*)?$")
            .expect("name regex must compile")
    })
}

/// Returns true for `local` and `prefix:local` names.
pub fn is_valid_qualified_name(name: &str) -> bool {
    name_regex().is_match(name)
}

impl Path {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn parse(raw: &str) -> Result<Self, XformError> {
        let Some(body) = raw.strip_prefix('/') else {
            return Err(XformError::malformed_path(raw, "paths must start with \"/\""));
        };
        if body.is_empty() {
            return Err(XformError::malformed_path(raw, "path has no steps"));
        }

        let segments = body.split('/').collect::<Vec<_>>();
        let last = segments.len() - 1;
        let mut steps = Vec::with_capacity(segments.len());
        for (position, segment) in segments.iter().enumerate() {
            let step = parse_step(raw, segment)?;
            if !step.is_element() && position != last {
                return Err(XformError::malformed_path(
                    raw,
                    format!("step \"{}\" must be the last step", segment),
                ));
            }
            steps.push(step);
        }

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    pub fn parent(&self) -> Option<Path> {
        if self.steps.is_empty() {
            return None;
        }
        Some(Self {
            steps: self.steps[..self.steps.len() - 1].to_vec(),
        })
    }

    pub fn child(&self, step: Step) -> Path {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }

    pub fn child_element(&self, name: &str, index: Option<usize>) -> Path {
        self.child(Step::element(name, index))
    }

    pub fn child_attribute(&self, name: &str) -> Path {
        self.child(Step::attribute(name))
    }

    pub fn child_text(&self) -> Path {
        self.child(Step::Text)
    }

    /// Copy of `self` whose element step at `depth` carries `new_index`.
    /// Paths that do not reach `depth` with an element step come back unchanged.
    pub fn reindex(&self, depth: usize, new_index: usize) -> Path {
        let mut copy = self.clone();
        if let Some(Step::Element { index, .. }) = copy.steps.get_mut(depth) {
            *index = Some(new_index);
        }
        copy
    }

    /// True when every step of `scope` names the same position as the
    /// corresponding leading step of `self`, ignoring indices.
    pub fn is_within(&self, scope: &Path) -> bool {
        scope.len() <= self.len()
            && scope
                .steps
                .iter()
                .zip(self.steps.iter())
                .all(|(outer, inner)| outer.same_position(inner))
    }

    /// Locates the first indexed element step at or after `from_depth`.
    ///
    /// Returns the prefix ending with that step (index removed, earlier indices
    /// kept), the index itself, and the remaining suffix steps.
    pub fn split_around_first_multiplicity(
        &self,
        from_depth: usize,
    ) -> Option<(Path, usize, Path)> {
        let position = self
            .steps
            .iter()
            .enumerate()
            .skip(from_depth)
            .find_map(|(position, step)| step.index().map(|_| position))?;

        let mut prefix = self.steps[..=position].to_vec();
        let index = match prefix.last_mut() {
            Some(Step::Element { index, .. }) => index.take()?,
            _ => return None,
        };
        let suffix = self.steps[position + 1..].to_vec();
        Some((Self { steps: prefix }, index, Self { steps: suffix }))
    }

    /// Same test as `self.to_match_pattern().matches(other)`, without
    /// building the pattern.
    pub fn addresses(&self, other: &Path) -> bool {
        self.len() == other.len()
            && self
                .steps
                .iter()
                .zip(other.steps.iter())
                .all(|(left, right)| {
                    left.same_position(right) && left.index().unwrap_or(1) == right.index().unwrap_or(1)
                })
    }

    pub fn to_match_pattern(&self) -> MatchPattern {
        MatchPattern {
            steps: self
                .steps
                .iter()
                .map(|step| match step {
                    Step::Element { name, index } => PatternStep::Element {
                        name: name.clone(),
                        index: IndexMatch::Exact(index.unwrap_or(1)),
                    },
                    Step::Attribute { name } => PatternStep::Attribute { name: name.clone() },
                    Step::Text => PatternStep::Text,
                })
                .collect(),
        }
    }
}

fn parse_step(raw: &str, segment: &str) -> Result<Step, XformError> {
    if segment.is_empty() {
        return Err(XformError::malformed_path(raw, "empty step"));
    }
    if segment == "text()" {
        return Ok(Step::Text);
    }

    if let Some(name) = segment.strip_prefix('@') {
        if name.contains('[') || name.contains(']') {
            return Err(XformError::malformed_path(
                raw,
                "attribute steps cannot carry an index",
            ));
        }
        return validated_name(raw, name).map(Step::attribute);
    }

    match (segment.find('['), segment.find(']')) {
        (None, None) => validated_name(raw, segment).map(|name| Step::element(name, None)),
        (Some(open), Some(close)) if open < close && close == segment.len() - 1 => {
            let digits = &segment[open + 1..close];
            if digits.contains('[') {
                return Err(XformError::malformed_path(raw, "unbalanced bracket"));
            }
            let index = digits.parse::<usize>().map_err(|_| {
                XformError::malformed_path(
                    raw,
                    format!("index \"{}\" must be a positive integer", digits),
                )
            })?;
            if index == 0 {
                return Err(XformError::malformed_path(raw, "indices are 1-based"));
            }
            validated_name(raw, &segment[..open]).map(|name| Step::element(name, Some(index)))
        }
        _ => Err(XformError::malformed_path(raw, "unbalanced bracket")),
    }
}

fn validated_name<'a>(raw: &str, name: &'a str) -> Result<&'a str, XformError> {
    if is_valid_qualified_name(name) {
        Ok(name)
    } else {
        Err(XformError::malformed_path(
            raw,
            format!("\"{}\" is not a valid name", name),
        ))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "/{}", step)?;
        }
        Ok(())
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Path::parse(&raw).map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexMatch {
    Exact(usize),
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternStep {
    Element { name: String, index: IndexMatch },
    Attribute { name: String },
    Text,
}

/// Matcher built from a [`Path`] in which a missing index means `1`, so
/// `/a/b` and `/a[1]/b[1]` address the same node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPattern {
    steps: Vec<PatternStep>,
}

impl MatchPattern {
    /// Lets the element step at `depth` match any occurrence.
    pub fn any_index_at(mut self, depth: usize) -> Self {
        if let Some(PatternStep::Element { index, .. }) = self.steps.get_mut(depth) {
            *index = IndexMatch::Any;
        }
        self
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.steps.len() == path.len() && self.matches_leading(path)
    }

    /// True when the pattern matches the first `self.len()` steps of `path`.
    pub fn matches_prefix_of(&self, path: &Path) -> bool {
        self.steps.len() <= path.len() && self.matches_leading(path)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn matches_leading(&self, path: &Path) -> bool {
        self.steps
            .iter()
            .zip(path.steps())
            .all(|(pattern, step)| match (pattern, step) {
                (
                    PatternStep::Element { name, index },
                    Step::Element {
                        name: candidate,
                        index: candidate_index,
                    },
                ) => {
                    name == candidate
                        && match index {
                            IndexMatch::Any => true,
                            IndexMatch::Exact(expected) => candidate_index.unwrap_or(1) == *expected,
                        }
                }
                (PatternStep::Attribute { name }, Step::Attribute { name: candidate }) => {
                    name == candidate
                }
                (PatternStep::Text, Step::Text) => true,
                _ => false,
            })
    }
}
