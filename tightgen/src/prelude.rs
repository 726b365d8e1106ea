//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and functions.
//!
//! ```ignore
//! use tightgen::prelude::*;
//! ```

// Schema types
pub use tightgen_schema::{
    Aggregate, ArtifactKind, CapabilitySet, ColumnDecl, ColumnSpec, ParseError, Predicate,
    SchemaError, SchemaSet, TableSchema, TableSchemaBuilder, TypeRegistry, TypeTag,
    ValueTypeDescriptor,
};
pub use tightgen_schema::{parse_declarations, parse_schema_set};

// Generation types
pub use tightgen_codegen::{
    AssembledOutput, CodegenError, GeneratedArtifact, Generator, GeneratorBuilder,
    GeneratorConfig, MacroFamily, OutputAssembler, OutputTarget, SchemaOutput, TableApiEmitter,
    Template, TemplateError, TemplateSource,
};
pub use tightgen_codegen::{
    generate_from_declarations, generate_from_file, generate_from_xml, generate_widths,
};
