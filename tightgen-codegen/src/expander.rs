//! Template expansion.
//!
//! Renders parsed fragments against a [`Value`] tree. The schema-facing
//! entry points bind the values every fragment sees:
//!
//! | Name | Content |
//! |------|---------|
//! | `table` | `name`, `cursor`, `query`, `view`, `width` |
//! | `columns` | every column record, in column order |
//! | `column` | the current column, in per-column expansion |
//! | `op` | the current predicate, in per-capability expansion |
//! | `types` | every registered type with its capabilities |
//!
//! Column predicate and aggregate lists are taken from the registry, so a
//! template iterating `column.predicates` can only emit supported
//! operations.

use crate::error::{CodegenError, TemplateError};
use crate::template::ast::{Comparison, Condition, Node, Path, Span};
use crate::template::Template;
use std::collections::BTreeMap;
use tightgen_schema::naming;
use tightgen_schema::{
    Aggregate, CapabilitySet, ColumnSpec, Predicate, RegistryEntry, SchemaError, TableSchema,
    TypeRegistry, TypeTag,
};

/// Prefix of fragments expanded once per supported predicate and bound by
/// name during per-column expansion.
pub const OPERATION_PREFIX: &str = "op_";

/// Template value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Text.
    Str(String),
    /// Integer.
    Int(i64),
    /// Boolean.
    Bool(bool),
    /// Ordered list.
    List(Vec<Value>),
    /// Named fields.
    Record(BTreeMap<String, Value>),
}

impl Value {
    /// Builds a record from `(name, value)` pairs.
    pub fn record<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Returns a record field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Record(fields) => fields.get(key),
            _ => None,
        }
    }

    /// Returns the list items, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the text of a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the printed form of a scalar, or `None` for lists and records.
    #[must_use]
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Self::Str(s) => Some(s.clone()),
            Self::Int(n) => Some(n.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::List(_) | Self::Record(_) => None,
        }
    }

    /// Truth value used by `if`: false, zero, empty text and empty lists
    /// are false.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Str(s) => !s.is_empty(),
            Self::Int(n) => *n != 0,
            Self::Bool(b) => *b,
            Self::List(items) => !items.is_empty(),
            Self::Record(_) => true,
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Int(_) => "integer",
            Self::Bool(_) => "boolean",
            Self::List(_) => "list",
            Self::Record(_) => "record",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Self::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

/// One block of per-capability expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityBlock {
    /// Column index.
    pub column: usize,
    /// Predicate the block was rendered for.
    pub predicate: Predicate,
    /// Rendered text.
    pub text: String,
}

/// Bindings for one table, built once and shared by every fragment
/// rendered for it.
#[derive(Debug, Clone)]
pub struct ExpansionContext<'a> {
    schema: &'a TableSchema,
    root: Value,
    columns: Vec<Value>,
}

impl<'a> ExpansionContext<'a> {
    /// Resolves every column of `schema` through `registry`.
    ///
    /// # Errors
    /// Returns `SchemaError::EmptySchema` for a table without columns and
    /// `SchemaError::UnknownType` for a column whose type the registry
    /// does not hold.
    pub fn new(schema: &'a TableSchema, registry: &TypeRegistry) -> Result<Self, SchemaError> {
        if schema.width() == 0 {
            return Err(SchemaError::EmptySchema {
                table: schema.name().to_string(),
            });
        }
        registry.check_schema(schema)?;

        let columns = schema
            .columns()
            .iter()
            .map(|column| column_value(schema, column, registry))
            .collect::<Result<Vec<_>, _>>()?;

        let root = Value::record([
            ("table", table_value(schema)),
            ("columns", Value::List(columns.clone())),
            ("types", types_value(registry)),
        ]);

        Ok(Self {
            schema,
            root,
            columns,
        })
    }

    /// The table being expanded.
    #[must_use]
    pub fn schema(&self) -> &'a TableSchema {
        self.schema
    }

    /// Root bindings: `table`, `columns` and `types`.
    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Record of the column at `index`.
    #[must_use]
    pub fn column(&self, index: usize) -> Option<&Value> {
        self.columns.get(index)
    }
}

/// Renders template fragments.
#[derive(Debug, Clone, Copy)]
pub struct Expander<'a> {
    template: &'a Template,
    registry: &'a TypeRegistry,
}

impl<'a> Expander<'a> {
    /// Creates an expander over a parsed template.
    #[must_use]
    pub fn new(template: &'a Template, registry: &'a TypeRegistry) -> Self {
        Self { template, registry }
    }

    /// The template.
    #[must_use]
    pub fn template(&self) -> &'a Template {
        self.template
    }

    /// The type registry.
    #[must_use]
    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    /// Builds the expansion context of a table.
    ///
    /// # Errors
    /// See [`ExpansionContext::new`].
    pub fn context<'s>(
        &self,
        schema: &'s TableSchema,
    ) -> Result<ExpansionContext<'s>, SchemaError> {
        ExpansionContext::new(schema, self.registry)
    }

    /// Renders a fragment with `root` as the only scope.
    ///
    /// # Errors
    /// Returns `TemplateError::MissingFragment` for an unknown fragment and
    /// `TemplateError::Render` for unbound variables or values used in the
    /// wrong position.
    pub fn render(&self, fragment: &str, root: &Value) -> Result<String, TemplateError> {
        self.render_with(fragment, root, &[])
    }

    /// Renders a fragment with extra named bindings over `root`. Later
    /// bindings shadow earlier ones and all of them shadow root fields.
    ///
    /// # Errors
    /// Same as [`Expander::render`].
    pub fn render_with(
        &self,
        fragment: &str,
        root: &Value,
        bindings: &[(&str, &Value)],
    ) -> Result<String, TemplateError> {
        let body = &self
            .template
            .fragment(fragment)
            .ok_or_else(|| TemplateError::MissingFragment {
                name: fragment.to_string(),
            })?
            .body;

        let base = Scope {
            name: None,
            value: root,
            parent: None,
        };
        let frames: Vec<Scope<'_>> = bindings
            .iter()
            .map(|&(name, value)| Scope {
                name: Some(name),
                value,
                parent: None,
            })
            .collect();

        let renderer = Renderer {
            template: self.template,
            fragment,
        };
        let mut out = String::new();
        renderer.render_chain(body, &base, &frames, &mut out)?;
        Ok(out)
    }

    /// Expands a fragment once per column of `schema`, in column order.
    ///
    /// # Errors
    /// Returns `CodegenError::Schema` if the table fails to resolve against
    /// the registry and `CodegenError::Template` if rendering fails.
    pub fn expand_per_column(
        &self,
        fragment: &str,
        schema: &TableSchema,
    ) -> Result<Vec<String>, CodegenError> {
        let context = self.context(schema)?;
        self.expand_columns(fragment, &context)
    }

    /// Expands a fragment once per column of an existing context.
    ///
    /// Each column is bound as `column`, and every `op_*` fragment of the
    /// template is expanded for that column with
    /// [`Expander::expand_capabilities`] and bound under its own name, with
    /// the final newline of the joined blocks removed.
    ///
    /// # Errors
    /// Same as [`Expander::expand_per_column`].
    pub fn expand_columns(
        &self,
        fragment: &str,
        context: &ExpansionContext<'_>,
    ) -> Result<Vec<String>, CodegenError> {
        let operations: Vec<&str> = self.template.fragments_with_prefix(OPERATION_PREFIX).collect();
        let mut blocks = Vec::with_capacity(context.schema().width());

        for index in 0..context.schema().width() {
            let column = context
                .column(index)
                .ok_or_else(|| CodegenError::generation(format!("column {index} has no record")))?;

            let mut expanded = Vec::with_capacity(operations.len());
            for name in &operations {
                let mut text: String = self
                    .expand_capabilities(name, context, index)?
                    .into_iter()
                    .map(|block| block.text)
                    .collect();
                if text.ends_with('\n') {
                    text.pop();
                }
                expanded.push((*name, Value::Str(text)));
            }

            let mut bindings: Vec<(&str, &Value)> = vec![("column", column)];
            bindings.extend(expanded.iter().map(|(name, value)| (*name, value)));
            blocks.push(self.render_with(fragment, context.root(), &bindings)?);
        }

        Ok(blocks)
    }

    /// Expands a fragment once per (column, supported predicate) pair,
    /// grouped by column in column order. Predicates a column's type does
    /// not support produce no block at all.
    ///
    /// # Errors
    /// Same as [`Expander::expand_per_column`].
    pub fn expand_per_capability(
        &self,
        fragment: &str,
        schema: &TableSchema,
    ) -> Result<Vec<CapabilityBlock>, CodegenError> {
        let context = self.context(schema)?;
        let mut blocks = Vec::new();
        for index in 0..schema.width() {
            blocks.extend(self.expand_capabilities(fragment, &context, index)?);
        }
        Ok(blocks)
    }

    /// Expands a fragment for every predicate the column at `index`
    /// supports, binding `column` and `op`.
    ///
    /// # Errors
    /// Same as [`Expander::expand_per_column`].
    pub fn expand_capabilities(
        &self,
        fragment: &str,
        context: &ExpansionContext<'_>,
        index: usize,
    ) -> Result<Vec<CapabilityBlock>, CodegenError> {
        let spec = context
            .schema()
            .columns()
            .get(index)
            .ok_or_else(|| CodegenError::generation(format!("column index {index} out of range")))?;
        let column = context
            .column(index)
            .ok_or_else(|| CodegenError::generation(format!("column {index} has no record")))?;
        let capabilities = self.registry.capabilities_of(spec.type_tag())?;

        let mut blocks = Vec::with_capacity(capabilities.predicates.len());
        for &predicate in capabilities.predicates {
            let op = predicate_value(predicate, &capabilities);
            let text = self.render_with(
                fragment,
                context.root(),
                &[("column", column), ("op", &op)],
            )?;
            blocks.push(CapabilityBlock {
                column: index,
                predicate,
                text,
            });
        }
        Ok(blocks)
    }
}

/// Bindings for the macro family of one width: `width`, positional
/// `columns` (`CName{k}` / `CType{k}`) and `types`.
///
/// # Errors
/// Returns `SchemaError::EmptySchema` for width 0.
pub fn macro_family_value(width: usize, registry: &TypeRegistry) -> Result<Value, SchemaError> {
    if width == 0 {
        return Err(SchemaError::EmptySchema {
            table: "TableName".to_string(),
        });
    }
    let columns = (0..width)
        .map(|index| {
            Value::record([
                ("index", Value::from(index)),
                ("ordinal", Value::from(index + 1)),
                ("name", Value::from(format!("CName{}", index + 1))),
                ("type", Value::from(format!("CType{}", index + 1))),
            ])
        })
        .collect();
    Ok(Value::record([
        ("width", Value::from(width)),
        ("columns", Value::List(columns)),
        ("types", types_value(registry)),
    ]))
}

/// Record of a table: `name`, `cursor`, `query`, `view`, `width`.
#[must_use]
pub fn table_value(schema: &TableSchema) -> Value {
    let name = schema.name();
    Value::record([
        ("name", Value::from(naming::table_type(name))),
        ("cursor", Value::from(naming::cursor_type(name))),
        ("query", Value::from(naming::query_type(name))),
        ("view", Value::from(naming::view_type(name))),
        ("width", Value::from(schema.width())),
    ])
}

/// List of every registered type, in registry order.
#[must_use]
pub fn types_value(registry: &TypeRegistry) -> Value {
    Value::List(registry.iter().map(type_value).collect())
}

fn type_value(entry: &RegistryEntry) -> Value {
    let caps = &entry.capabilities;
    let vt = &entry.value_type;
    Value::record([
        ("name", Value::from(entry.tag.name())),
        ("method", Value::from(vt.method)),
        ("native", Value::from(vt.native)),
        ("nullable", Value::from(vt.nullable)),
        ("type_id", Value::from(vt.type_id)),
        ("case_sensitive", Value::from(caps.case_sensitive_match)),
        ("optional_capable", Value::from(caps.is_optional_capable())),
        ("is_subtable", Value::from(entry.tag == TypeTag::Table)),
        ("has_predicates", Value::from(!caps.predicates.is_empty())),
        ("has_aggregates", Value::from(!caps.aggregates.is_empty())),
        ("predicates", predicates_value(caps)),
        ("aggregates", aggregates_value(entry.tag, caps)),
    ])
}

fn column_value(
    schema: &TableSchema,
    column: &ColumnSpec,
    registry: &TypeRegistry,
) -> Result<Value, SchemaError> {
    let entry = registry.entry(column.type_tag())?;
    let caps = &entry.capabilities;
    let (native, nullable) = match column.subtable() {
        Some(table) => {
            let pointer = format!("{} *", naming::table_type(table));
            (pointer.clone(), pointer)
        }
        None => (
            entry.value_type.native.to_string(),
            entry.value_type.nullable.to_string(),
        ),
    };
    let arg_type = if column.is_optional() {
        nullable.clone()
    } else {
        native.clone()
    };

    Ok(Value::record([
        ("name", Value::from(column.name())),
        ("capitalized", Value::from(naming::capitalize(column.name()))),
        ("index", Value::from(column.index())),
        ("ordinal", Value::from(column.index() + 1)),
        ("type", Value::from(column.type_tag().name())),
        ("method", Value::from(entry.value_type.method)),
        ("type_id", Value::from(entry.value_type.type_id)),
        ("native", Value::from(native)),
        ("nullable", Value::from(nullable)),
        ("arg_type", Value::from(arg_type)),
        ("optional", Value::from(column.is_optional())),
        ("setter", Value::from(naming::setter_name(column.name()))),
        (
            "accessor",
            Value::from(naming::query_accessor_type(schema.name(), column.name())),
        ),
        ("is_subtable", Value::from(column.subtable().is_some())),
        ("subtable", Value::from(column.subtable().unwrap_or_default())),
        ("case_sensitive", Value::from(caps.case_sensitive_match)),
        ("has_predicates", Value::from(!caps.predicates.is_empty())),
        ("has_aggregates", Value::from(!caps.aggregates.is_empty())),
        ("predicates", predicates_value(caps)),
        ("aggregates", aggregates_value(column.type_tag(), caps)),
    ]))
}

fn predicates_value(caps: &CapabilitySet) -> Value {
    Value::List(
        caps.predicates
            .iter()
            .map(|&predicate| predicate_value(predicate, caps))
            .collect(),
    )
}

fn predicate_value(predicate: Predicate, caps: &CapabilitySet) -> Value {
    Value::record([
        ("name", Value::from(predicate.method_name())),
        ("shape", Value::from(predicate.shape())),
        ("arity", Value::from(predicate.arity())),
        ("case_sensitive", Value::from(caps.case_sensitive_match)),
    ])
}

fn aggregates_value(tag: TypeTag, caps: &CapabilitySet) -> Value {
    Value::List(
        caps.aggregates
            .iter()
            .filter_map(|&aggregate| aggregate_value(tag, aggregate))
            .collect(),
    )
}

fn aggregate_value(tag: TypeTag, aggregate: Aggregate) -> Option<Value> {
    let result = tag.aggregate_result_type(aggregate)?;
    Some(Value::record([
        ("name", Value::from(aggregate.method_name())),
        ("engine", Value::from(aggregate.engine_name())),
        ("result", Value::from(result)),
    ]))
}

/// Lexical scope: a chain of named frames ending at the root record.
struct Scope<'a> {
    name: Option<&'a str>,
    value: &'a Value,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    fn lookup(&self, path: &Path) -> Option<&'a Value> {
        let head = path.head();
        let mut frame = Some(self);
        let mut value = None;
        while let Some(current) = frame {
            match current.name {
                Some(name) if name == head => {
                    value = Some(current.value);
                    break;
                }
                Some(_) => frame = current.parent,
                None => {
                    value = current.value.get(head);
                    break;
                }
            }
        }

        let mut value = value?;
        for segment in &path.segments()[1..] {
            value = value.get(segment)?;
        }
        Some(value)
    }
}

struct Renderer<'t> {
    template: &'t Template,
    fragment: &'t str,
}

impl Renderer<'_> {
    /// Links the binding frames on top of `base` and renders `nodes`.
    fn render_chain(
        &self,
        nodes: &[Node],
        base: &Scope<'_>,
        frames: &[Scope<'_>],
        out: &mut String,
    ) -> Result<(), TemplateError> {
        match frames.split_first() {
            None => self.render_nodes(nodes, base, out),
            Some((frame, rest)) => {
                let linked = Scope {
                    name: frame.name,
                    value: frame.value,
                    parent: Some(base),
                };
                self.render_chain(nodes, &linked, rest, out)
            }
        }
    }

    fn render_nodes(
        &self,
        nodes: &[Node],
        scope: &Scope<'_>,
        out: &mut String,
    ) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Variable { path, span } => {
                    let value = self.resolve(scope, path, *span)?;
                    let text = value.scalar_text().ok_or_else(|| {
                        self.error(*span, format!("cannot print {} '{path}'", value.kind()))
                    })?;
                    out.push_str(&text);
                }
                Node::Each {
                    path,
                    binding,
                    separator,
                    body,
                    span,
                } => {
                    let value = self.resolve(scope, path, *span)?;
                    let items = value.as_list().ok_or_else(|| {
                        self.error(*span, format!("cannot iterate {} '{path}'", value.kind()))
                    })?;
                    for (index, item) in items.iter().enumerate() {
                        if index > 0 {
                            if let Some(separator) = separator {
                                out.push_str(separator);
                            }
                        }
                        let state = Value::record([
                            ("index", Value::from(index)),
                            ("ordinal", Value::from(index + 1)),
                            ("first", Value::from(index == 0)),
                            ("last", Value::from(index + 1 == items.len())),
                        ]);
                        let item_scope = Scope {
                            name: Some(binding.as_str()),
                            value: item,
                            parent: Some(scope),
                        };
                        let loop_scope = Scope {
                            name: Some("loop"),
                            value: &state,
                            parent: Some(&item_scope),
                        };
                        self.render_nodes(body, &loop_scope, out)?;
                    }
                }
                Node::If {
                    branches,
                    otherwise,
                } => {
                    let mut taken = None;
                    for branch in branches {
                        if self.evaluate(scope, &branch.condition)? {
                            taken = Some(&branch.body);
                            break;
                        }
                    }
                    if let Some(body) = taken.or(otherwise.as_ref()) {
                        self.render_nodes(body, scope, out)?;
                    }
                }
                Node::Include { name, span } => {
                    let fragment = self
                        .template
                        .fragment(name)
                        .ok_or_else(|| self.error(*span, format!("unknown fragment '{name}'")))?;
                    self.render_nodes(&fragment.body, scope, out)?;
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, scope: &Scope<'_>, condition: &Condition) -> Result<bool, TemplateError> {
        let value = self.resolve(scope, &condition.path, condition.span)?;
        let result = match &condition.comparison {
            None => value.is_truthy(),
            Some((op, literal)) => {
                let text = value.scalar_text().ok_or_else(|| {
                    self.error(
                        condition.span,
                        format!("cannot compare {} '{}'", value.kind(), condition.path),
                    )
                })?;
                match op {
                    Comparison::Equal => text == *literal,
                    Comparison::NotEqual => text != *literal,
                }
            }
        };
        Ok(result != condition.negated)
    }

    fn resolve<'v>(
        &self,
        scope: &Scope<'v>,
        path: &Path,
        span: Span,
    ) -> Result<&'v Value, TemplateError> {
        scope
            .lookup(path)
            .ok_or_else(|| self.error(span, format!("unbound variable '{path}'")))
    }

    fn error(&self, span: Span, message: String) -> TemplateError {
        TemplateError::render(self.fragment, format!("{span}: {message}"))
    }
}
