//! # tightgen Codegen
//!
//! Template-driven generation of typed table APIs.
//!
//! This crate provides:
//! - A small fragment template language parsed into an IR
//! - Per-column and per-capability expansion against a table schema
//! - Emission of the Cursor, Table, QueryAccessor, Query and View artifacts
//! - Output assembly for one or many tables, or for every width up to a bound
//! - A built-in template for the TightDB Objective-C binding

pub mod assembler;
pub mod emitter;
pub mod error;
pub mod expander;
pub mod generator;
pub mod template;

pub use assembler::{AssembledOutput, OutputAssembler};
pub use emitter::{GeneratedArtifact, MacroFamily, SchemaOutput, TableApiEmitter};
pub use error::{CodegenError, TemplateError};
pub use expander::{CapabilityBlock, ExpansionContext, Expander, Value};
pub use generator::{Generator, GeneratorBuilder, GeneratorConfig, OutputTarget, TemplateSource};
pub use template::Template;

/// Built-in Objective-C template.
pub const BUILTIN_TEMPLATE: &str = include_str!("../templates/objc.tpl");

/// Generates the concrete classes of every table in an XML schema using the
/// built-in template.
///
/// # Arguments
/// * `xml` - XML schema content
///
/// # Returns
/// Generated Objective-C source as a string.
///
/// # Errors
/// Returns `CodegenError` if parsing or generation fails.
pub fn generate_from_xml(xml: &str) -> Result<String, CodegenError> {
    let generator = Generator::builder().build()?;
    let set = tightgen_schema::parse_schema_set(xml, generator.registry())?;
    Ok(generator.generate_schemas(&set)?.into_text())
}

/// Generates the concrete classes of every `DEFINE_TABLE` declaration in
/// `source` using the built-in template.
///
/// # Errors
/// Returns `CodegenError` if scanning or generation fails.
pub fn generate_from_declarations(source: &str) -> Result<String, CodegenError> {
    let generator = Generator::builder().build()?;
    let set = tightgen_schema::parse_declarations(source, generator.registry())?;
    Ok(generator.generate_schemas(&set)?.into_text())
}

/// Generates the macro families of widths 1 to `max_cols` using the
/// built-in template.
///
/// # Errors
/// Returns `CodegenError` if `max_cols` is 0 or generation fails.
pub fn generate_widths(max_cols: usize) -> Result<String, CodegenError> {
    let generator = Generator::builder().build()?;
    Ok(generator.generate_widths(max_cols)?.into_text())
}

/// Generates from an XML schema file.
///
/// # Errors
/// Returns `CodegenError` if reading, parsing, or generation fails.
pub fn generate_from_file(path: &std::path::Path) -> Result<String, CodegenError> {
    let xml = std::fs::read_to_string(path)?;
    generate_from_xml(&xml)
}
