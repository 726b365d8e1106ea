//! Error types for schema loading and validation.

use thiserror::Error;

/// Error type for schema source parsing (XML files and table declarations).
#[derive(Debug, Error)]
pub enum ParseError {
    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Missing required attribute.
    #[error("missing required attribute '{attribute}' on element '{element}'")]
    MissingAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
    },

    /// Invalid attribute value.
    #[error("invalid value '{value}' for attribute '{attribute}' on element '{element}'")]
    InvalidAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
        /// Invalid value.
        value: String,
    },

    /// Unknown element encountered.
    #[error("unknown element '{element}' in context '{context}'")]
    UnknownElement {
        /// Element name.
        element: String,
        /// Parent context.
        context: String,
    },

    /// Invalid document structure.
    #[error("invalid schema structure: {message}")]
    InvalidStructure {
        /// Error message.
        message: String,
    },

    /// Malformed `DEFINE_TABLE` declaration.
    #[error("malformed table declaration at {line}:{column}: {message}")]
    Declaration {
        /// 1-based line of the offending token.
        line: usize,
        /// 1-based column of the offending token.
        column: usize,
        /// Error message.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Error type for schema construction and type resolution.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Parsing error.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A table was declared without columns.
    #[error("table '{table}' has no columns; a table needs at least one")]
    EmptySchema {
        /// Table name.
        table: String,
    },

    /// A column references a type that is not registered.
    #[error("unknown type '{type_name}' for column '{column}' of table '{table}'")]
    UnknownType {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Offending type name.
        type_name: String,
    },

    /// A registry lookup for a tag outside the registered set.
    #[error("type '{type_name}' is not registered")]
    UnregisteredType {
        /// Type name.
        type_name: String,
    },

    /// Two columns of one table share a name.
    #[error("duplicate column '{column}' in table '{table}'")]
    DuplicateColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// Two tables of one schema set share a name.
    #[error("duplicate table '{table}'")]
    DuplicateTable {
        /// Table name.
        table: String,
    },

    /// A table or column name is not a valid identifier.
    #[error("invalid {kind} name '{name}': {reason}")]
    InvalidIdentifier {
        /// What was being named ("table" or "column").
        kind: &'static str,
        /// Offending name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A column was marked optional but its type cannot hold null.
    #[error("column '{column}' of table '{table}' is optional but type '{type_name}' is not optional-capable")]
    NotOptionalCapable {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Type name.
        type_name: String,
    },

    /// Validation error.
    #[error("validation error: {message}")]
    Validation {
        /// Error message.
        message: String,
    },
}

impl ParseError {
    /// Creates a missing attribute error.
    pub fn missing_attr(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates an invalid attribute error.
    pub fn invalid_attr(
        element: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            element: element.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Creates an unknown element error.
    pub fn unknown_element(element: impl Into<String>, context: impl Into<String>) -> Self {
        Self::UnknownElement {
            element: element.into(),
            context: context.into(),
        }
    }

    /// Creates a declaration error at the given position.
    pub fn declaration(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Declaration {
            line,
            column,
            message: message.into(),
        }
    }
}

impl SchemaError {
    /// Creates an unknown type error for a column.
    pub fn unknown_type(
        table: impl Into<String>,
        column: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self::UnknownType {
            table: table.into(),
            column: column.into(),
            type_name: type_name.into(),
        }
    }

    /// Creates a validation error with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
