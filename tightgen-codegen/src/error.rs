//! Error types for template processing and code generation.

use thiserror::Error;

/// Error type for template loading and rendering.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Malformed template source.
    #[error("template syntax error at {line}:{column}: {message}")]
    Syntax {
        /// 1-based line.
        line: usize,
        /// 1-based column.
        column: usize,
        /// Error message.
        message: String,
    },

    /// A fragment failed to render.
    #[error("template render error in fragment '{fragment}': {message}")]
    Render {
        /// Fragment being rendered.
        fragment: String,
        /// Error message.
        message: String,
    },

    /// A fragment the generator needs is absent from the template.
    #[error("template has no fragment named '{name}'")]
    MissingFragment {
        /// Fragment name.
        name: String,
    },
}

impl TemplateError {
    /// Creates a syntax error at the given position.
    pub fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    /// Creates a render error for a fragment.
    pub fn render(fragment: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            fragment: fragment.into(),
            message: message.into(),
        }
    }
}

/// Error type for code generation operations.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Schema source parsing error.
    #[error("schema parse error: {0}")]
    Parse(#[from] tightgen_schema::ParseError),

    /// Schema validation or type resolution error.
    #[error("schema error: {0}")]
    Schema(#[from] tightgen_schema::SchemaError),

    /// Template error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Code generation error.
    #[error("generation error: {message}")]
    Generation {
        /// Error message.
        message: String,
    },

    /// Two generated types received the same name.
    #[error("generated type name '{name}' is produced twice")]
    NameCollision {
        /// Colliding name.
        name: String,
    },
}

impl CodegenError {
    /// Creates a generation error with the given message.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Returns true if the error comes from a schema that failed to
    /// resolve or validate, as opposed to the template or the output sink.
    #[must_use]
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::Schema(_))
    }
}
