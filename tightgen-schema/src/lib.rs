//! # tightgen Schema
//!
//! Table schema model and type registry for the tightgen code generator.
//!
//! This crate provides:
//! - The immutable table schema model (ordered, typed, named columns)
//! - The closed set of storage type tags and their query capabilities
//! - A read-only type registry consulted before any method is emitted
//! - Total, injective naming of every generated type
//! - Schema sources: XML schema files and `DEFINE_TABLE` declarations

pub mod declaration;
pub mod error;
pub mod naming;
pub mod parser;
pub mod registry;
pub mod schema;
pub mod types;
pub mod validation;

pub use declaration::parse_declarations;
pub use error::{ParseError, SchemaError};
pub use naming::ArtifactKind;
pub use parser::parse_schema_set;
pub use registry::{RegistryEntry, TypeRegistry};
pub use schema::{ColumnDecl, ColumnSpec, SchemaSet, TableSchema, TableSchemaBuilder};
pub use types::{Aggregate, CapabilitySet, Predicate, TypeTag, ValueTypeDescriptor};
