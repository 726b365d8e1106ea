//! # tightgen
//!
//! Typed table API generator for the TightDB Objective-C binding.
//!
//! Given a table schema (an ordered list of named, typed columns), tightgen
//! emits the strongly typed classes a consumer uses instead of the generic,
//! index-addressed table API: a Cursor, the Table itself, one QueryAccessor
//! per column, a Query and a View. Alternatively it emits the
//! `TIGHTDB_TABLE_n` macro families for every width up to a bound.
//!
//! ## Features
//!
//! - **Capability-driven emission** - Query accessors expose exactly the
//!   predicates and aggregates their column type supports
//! - **Template-driven output** - Fragments are parsed into an IR before any
//!   schema is expanded, so template errors surface up front
//! - **Schema sources** - XML schema files or `DEFINE_TABLE` declarations
//! - **All-or-nothing output** - Nothing is written when any table fails
//!
//! ## Quick Start
//!
//! ```ignore
//! use tightgen::prelude::*;
//!
//! let text = generate_from_declarations(
//!     "DEFINE_TABLE(Person, (String, Name), (Int, Age), (Bool, Hired))",
//! )?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`schema`] - Table schema model, type registry and schema sources
//! - [`codegen`] - Template language, expander, emitter and assembler

pub mod prelude;

/// Table schema model, type registry and schema sources.
pub mod schema {
    pub use tightgen_schema::*;
}

/// Template-driven generation of typed table APIs.
pub mod codegen {
    pub use tightgen_codegen::*;
}

// Re-export commonly used items at the crate root
pub use tightgen_codegen::{
    BUILTIN_TEMPLATE, CodegenError, Generator, GeneratorBuilder, OutputTarget, TemplateSource,
    generate_from_declarations, generate_from_file, generate_from_xml, generate_widths,
};
pub use tightgen_schema::{SchemaError, SchemaSet, TableSchema, TypeRegistry, TypeTag};
