//! Parsed template representation.

use std::fmt;

/// Dotted variable path such as `column.name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// Parses a dotted path. Every segment must be a non-empty run of
    /// ASCII letters, digits and underscores.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let segments: Vec<String> = text.split('.').map(str::to_string).collect();
        let valid = segments.iter().all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
        valid.then_some(Self { segments })
    }

    /// Path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First segment.
    #[must_use]
    pub fn head(&self) -> &str {
        &self.segments[0]
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Position of a tag in the template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Comparison operator in an `if` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
}

/// Condition of an `if` or `else if` branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// `not` prefix.
    pub negated: bool,
    /// Tested value.
    pub path: Path,
    /// Optional comparison against a string literal.
    pub comparison: Option<(Comparison, String)>,
    /// Tag position.
    pub span: Span,
}

/// One `if` / `else if` arm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// Arm condition.
    pub condition: Condition,
    /// Arm body.
    pub body: Vec<Node>,
}

/// Template node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal text.
    Text(String),
    /// Value substitution.
    Variable {
        /// Value path.
        path: Path,
        /// Tag position.
        span: Span,
    },
    /// Repetition over a list.
    Each {
        /// List path.
        path: Path,
        /// Name bound to each element.
        binding: String,
        /// Text inserted between iterations.
        separator: Option<String>,
        /// Repeated body.
        body: Vec<Node>,
        /// Tag position.
        span: Span,
    },
    /// Conditional.
    If {
        /// `if` and `else if` arms in order.
        branches: Vec<Branch>,
        /// `else` body.
        otherwise: Option<Vec<Node>>,
    },
    /// Inline expansion of another fragment.
    Include {
        /// Fragment name.
        name: String,
        /// Tag position.
        span: Span,
    },
}

/// A named top-level template section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Fragment name.
    pub name: String,
    /// Fragment body.
    pub body: Vec<Node>,
    /// Position of the opening tag.
    pub span: Span,
}

/// A parsed template: named fragments in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    fragments: Vec<Fragment>,
}

impl Template {
    pub(crate) fn new(fragments: Vec<Fragment>) -> Self {
        Self { fragments }
    }

    /// Looks up a fragment by name.
    #[must_use]
    pub fn fragment(&self, name: &str) -> Option<&Fragment> {
        self.fragments.iter().find(|f| f.name == name)
    }

    /// Returns true if the template defines the fragment.
    #[must_use]
    pub fn has_fragment(&self, name: &str) -> bool {
        self.fragment(name).is_some()
    }

    /// Fragments in source order.
    #[must_use]
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Names of the fragments starting with `prefix`, in source order.
    pub fn fragments_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.fragments
            .iter()
            .map(|f| f.name.as_str())
            .filter(move |name| name.starts_with(prefix))
    }
}
