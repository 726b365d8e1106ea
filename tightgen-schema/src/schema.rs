//! Table schema model.
//!
//! A [`TableSchema`] is an ordered list of typed, named columns. It is
//! created once through [`TableSchemaBuilder`], which assigns dense column
//! indices and validates the result, and never changes afterwards.

use crate::error::SchemaError;
use crate::types::TypeTag;
use crate::validation;

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnSpec {
    name: String,
    type_tag: TypeTag,
    index: usize,
    optional: bool,
    subtable: Option<String>,
}

impl ColumnSpec {
    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage type.
    #[must_use]
    pub const fn type_tag(&self) -> TypeTag {
        self.type_tag
    }

    /// Storage column index, dense from 0.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Whether the column accepts null.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Name of the nested table for [`TypeTag::Table`] columns.
    #[must_use]
    pub fn subtable(&self) -> Option<&str> {
        self.subtable.as_deref()
    }
}

/// A column as declared by a schema source, before index assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDecl {
    /// Column name.
    pub name: String,
    /// Storage type.
    pub type_tag: TypeTag,
    /// Whether the column accepts null.
    pub optional: bool,
    /// Nested table name for subtable columns.
    pub subtable: Option<String>,
}

impl ColumnDecl {
    /// Creates a required column declaration.
    pub fn new(name: impl Into<String>, type_tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            type_tag,
            optional: false,
            subtable: None,
        }
    }
}

/// An immutable table definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableSchema {
    name: String,
    columns: Vec<ColumnSpec>,
}

impl TableSchema {
    /// Starts building a table with the given name.
    pub fn builder(name: impl Into<String>) -> TableSchemaBuilder {
        TableSchemaBuilder::new(name)
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in storage order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Distinct type tags of the columns, in order of first appearance.
    #[must_use]
    pub fn type_tags(&self) -> Vec<TypeTag> {
        let mut tags = Vec::new();
        for column in &self.columns {
            if !tags.contains(&column.type_tag) {
                tags.push(column.type_tag);
            }
        }
        tags
    }
}

/// Builder for [`TableSchema`].
#[derive(Debug, Clone)]
pub struct TableSchemaBuilder {
    name: String,
    columns: Vec<ColumnDecl>,
}

impl TableSchemaBuilder {
    /// Creates a builder for a table with no columns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Appends a required column.
    #[must_use]
    pub fn column(self, name: impl Into<String>, type_tag: TypeTag) -> Self {
        self.declare(ColumnDecl::new(name, type_tag))
    }

    /// Appends an optional column.
    #[must_use]
    pub fn optional_column(self, name: impl Into<String>, type_tag: TypeTag) -> Self {
        self.declare(ColumnDecl {
            optional: true,
            ..ColumnDecl::new(name, type_tag)
        })
    }

    /// Appends a subtable column holding rows of `table`.
    #[must_use]
    pub fn subtable_column(self, name: impl Into<String>, table: impl Into<String>) -> Self {
        self.declare(ColumnDecl {
            subtable: Some(table.into()),
            ..ColumnDecl::new(name, TypeTag::Table)
        })
    }

    /// Appends a column declaration.
    #[must_use]
    pub fn declare(mut self, decl: ColumnDecl) -> Self {
        self.columns.push(decl);
        self
    }

    /// Appends a column declaration in place.
    pub fn push(&mut self, decl: ColumnDecl) {
        self.columns.push(decl);
    }

    /// Assigns column indices and validates the table.
    ///
    /// # Errors
    /// Returns `SchemaError::EmptySchema` for a table without columns, and
    /// the other validation errors of [`validation::validate_table`].
    pub fn build(self) -> Result<TableSchema, SchemaError> {
        let columns = self
            .columns
            .into_iter()
            .enumerate()
            .map(|(index, decl)| ColumnSpec {
                name: decl.name,
                type_tag: decl.type_tag,
                index,
                optional: decl.optional,
                subtable: decl.subtable,
            })
            .collect();

        let schema = TableSchema {
            name: self.name,
            columns,
        };
        validation::validate_table(&schema)?;
        tracing::debug!("Built table schema {} with {} columns", schema.name, schema.width());
        Ok(schema)
    }
}

/// The ordered tables loaded by one generator invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSet {
    tables: Vec<TableSchema>,
}

impl SchemaSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a table.
    ///
    /// # Errors
    /// Returns `SchemaError::DuplicateTable` if a table of that name is
    /// already present, or `SchemaError::UnknownType` if a subtable column
    /// names a table not yet in the set.
    pub fn push(&mut self, schema: TableSchema) -> Result<(), SchemaError> {
        if self.get(schema.name()).is_some() {
            return Err(SchemaError::DuplicateTable {
                table: schema.name().to_string(),
            });
        }
        validation::validate_subtable_references(self, &schema)?;
        self.tables.push(schema);
        Ok(())
    }

    /// Appends every table of another set, in order.
    ///
    /// # Errors
    /// Same as [`SchemaSet::push`].
    pub fn extend(&mut self, other: SchemaSet) -> Result<(), SchemaError> {
        for schema in other.tables {
            self.push(schema)?;
        }
        Ok(())
    }

    /// Looks up a table by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name() == name)
    }

    /// Iterates the tables in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, TableSchema> {
        self.tables.iter()
    }

    /// Number of tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if the set holds no table.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl<'a> IntoIterator for &'a SchemaSet {
    type Item = &'a TableSchema;
    type IntoIter = std::slice::Iter<'a, TableSchema>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
