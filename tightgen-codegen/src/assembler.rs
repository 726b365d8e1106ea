//! Output assembly.
//!
//! Concatenates the prelude and every generated unit into one text. A run
//! either produces the whole text or fails; callers write the result only
//! after assembly succeeded.

use crate::emitter::TableApiEmitter;
use crate::error::CodegenError;
use crate::expander::{table_value, types_value, Value};
use crate::template::Template;
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::Path;
use tightgen_schema::{SchemaError, SchemaSet, TypeRegistry};

/// Fragment opening the output of all-widths mode.
pub const PRELUDE_MACROS_FRAGMENT: &str = "prelude_macros";

/// Fragment opening the output of per-table mode.
pub const PRELUDE_FRAGMENT: &str = "prelude";

/// Finished output of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledOutput {
    text: String,
    units: usize,
}

impl AssembledOutput {
    /// Generated text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of macro families or tables the text holds.
    #[must_use]
    pub fn units(&self) -> usize {
        self.units
    }

    /// Consumes the output, returning the text.
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }

    /// Writes the text to a stream in one call.
    ///
    /// # Errors
    /// Returns the underlying IO error.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.text.as_bytes())?;
        writer.flush()
    }

    /// Writes the text to a file, replacing its contents.
    ///
    /// # Errors
    /// Returns the underlying IO error.
    pub fn write_file(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, &self.text)
    }
}

/// Assembles generated units into one output.
#[derive(Debug, Clone, Copy)]
pub struct OutputAssembler<'a> {
    template: &'a Template,
    registry: &'a TypeRegistry,
}

impl<'a> OutputAssembler<'a> {
    /// Creates an assembler.
    #[must_use]
    pub fn new(template: &'a Template, registry: &'a TypeRegistry) -> Self {
        Self { template, registry }
    }

    /// Assembles the macro families of every width from 1 to `max_cols`.
    ///
    /// # Arguments
    /// * `max_cols` - Largest width to generate
    ///
    /// # Returns
    /// The `prelude_macros` fragment followed by one family per width, in
    /// ascending order.
    ///
    /// # Errors
    /// Returns `CodegenError::Schema` with `EmptySchema` if `max_cols` is 0
    /// and `CodegenError::Template` if the template lacks the macro
    /// fragments or a family fails to render.
    pub fn assemble_widths(&self, max_cols: usize) -> Result<AssembledOutput, CodegenError> {
        if max_cols == 0 {
            return Err(SchemaError::EmptySchema {
                table: "TableName".to_string(),
            }
            .into());
        }
        TableApiEmitter::check_width_template(self.template)?;

        let emitter = TableApiEmitter::new(self.template, self.registry);
        let root = Value::record([
            ("max_cols", Value::from(max_cols)),
            ("types", types_value(self.registry)),
        ]);
        let mut text = emitter.expander().render(PRELUDE_MACROS_FRAGMENT, &root)?;

        for width in 1..=max_cols {
            let family = emitter.emit_width(width)?;
            text.push_str(&family.text);
        }

        tracing::info!("Assembled {} macro families ({} bytes)", max_cols, text.len());
        Ok(AssembledOutput {
            text,
            units: max_cols,
        })
    }

    /// Assembles the concrete classes of every table in a set.
    ///
    /// Tables are emitted in set order, each into its own buffer that is
    /// appended only once the whole table generated.
    ///
    /// # Errors
    /// Returns `CodegenError::Generation` for an empty set,
    /// `CodegenError::NameCollision` if two artifacts share a type name, and
    /// the first emission error otherwise.
    pub fn assemble_schemas(&self, set: &SchemaSet) -> Result<AssembledOutput, CodegenError> {
        if set.is_empty() {
            return Err(CodegenError::generation("no tables to generate"));
        }
        TableApiEmitter::check_schema_template(self.template)?;

        let emitter = TableApiEmitter::new(self.template, self.registry);
        let root = Value::record([
            ("tables", Value::List(set.iter().map(table_value).collect())),
            ("types", types_value(self.registry)),
        ]);
        let mut text = emitter.expander().render(PRELUDE_FRAGMENT, &root)?;
        let mut emitted = BTreeSet::new();

        for schema in set {
            let output = emitter.emit(schema)?;
            claim_names(&mut emitted, output.type_names())?;
            let unit = output.text();
            tracing::info!(
                "Assembled table {} ({} artifacts, {} bytes)",
                schema.name(),
                output.artifacts().len(),
                unit.len()
            );
            text.push_str(&unit);
        }

        Ok(AssembledOutput {
            text,
            units: set.len(),
        })
    }
}

fn claim_names<'n>(
    emitted: &mut BTreeSet<String>,
    names: impl IntoIterator<Item = &'n str>,
) -> Result<(), CodegenError> {
    for name in names {
        if !emitted.insert(name.to_string()) {
            return Err(CodegenError::NameCollision {
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::parse;
    use tightgen_schema::{TableSchema, TypeTag};

    fn builtin() -> Template {
        parse(crate::BUILTIN_TEMPLATE).expect("Failed to parse built-in template")
    }

    fn family_set() -> SchemaSet {
        let mut set = SchemaSet::new();
        set.push(
            TableSchema::builder("Child")
                .column("Nick", TypeTag::String)
                .build()
                .expect("Failed to build Child"),
        )
        .expect("Failed to add Child");
        set.push(
            TableSchema::builder("Parent")
                .column("Name", TypeTag::String)
                .subtable_column("Kids", "Child")
                .build()
                .expect("Failed to build Parent"),
        )
        .expect("Failed to add Parent");
        set
    }

    #[test]
    fn test_assemble_widths_emits_one_family_per_width() {
        let template = builtin();
        let registry = TypeRegistry::new();
        let output = OutputAssembler::new(&template, &registry)
            .assemble_widths(3)
            .expect("Failed to assemble");

        assert_eq!(output.units(), 3);
        assert_eq!(output.text().matches("#define TIGHTDB_TABLE_DEF_").count(), 3);
        assert_eq!(output.text().matches("#define TIGHTDB_TABLE_IMPL_").count(), 3);
        assert!(output.text().starts_with("#import <tightdb/objc/table.h>\n"));

        let first = output.text().find("TIGHTDB_TABLE_DEF_1(").expect("missing width 1");
        let last = output.text().find("TIGHTDB_TABLE_DEF_3(").expect("missing width 3");
        assert!(first < last);
    }

    #[test]
    fn test_assemble_widths_renders_type_helpers_from_registry() {
        let template = builtin();
        let registry = TypeRegistry::with_tags([TypeTag::Int, TypeTag::Bool]);
        let output = OutputAssembler::new(&template, &registry)
            .assemble_widths(1)
            .expect("Failed to assemble");

        assert!(output.text().contains("#define TIGHTDB_TYPE_Int int64_t\n"));
        assert!(output.text().contains("#define TIGHTDB_IS_SUBTABLE_Bool x,x\n"));
        assert!(!output.text().contains("TIGHTDB_TYPE_String"));
        let between = concat!(
            "-(table##_Query *)between:(TIGHTDB_TYPE_Int)from ",
            "to:(TIGHTDB_TYPE_Int)to; \\\n"
        );
        assert!(output.text().contains(between));
    }

    #[test]
    fn test_assemble_widths_rejects_zero() {
        let template = builtin();
        let registry = TypeRegistry::new();
        let err = OutputAssembler::new(&template, &registry)
            .assemble_widths(0)
            .expect_err("width 0 should fail");
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_assemble_schemas_in_set_order() {
        let template = builtin();
        let registry = TypeRegistry::new();
        let output = OutputAssembler::new(&template, &registry)
            .assemble_schemas(&family_set())
            .expect("Failed to assemble");
        let text = output.text();

        assert_eq!(output.units(), 2);
        assert!(text.contains("@class Child_Cursor;\n"));
        assert!(text.contains("@class Parent_View;\n"));
        let child = text.find("@interface Child_Cursor").expect("missing Child");
        let parent = text.find("@interface Parent_Cursor").expect("missing Parent");
        assert!(child < parent);
        assert!(text.contains("-(Child *)Kids;\n"));
        assert!(text.contains("[_Kids getSubtable:[Child class]]"));
        assert!(text.contains("if (![Child _addColumns:subspec]) return NO;"));
    }

    #[test]
    fn test_failed_table_produces_no_output() {
        let template = builtin();
        let registry = TypeRegistry::with_tags([TypeTag::Int, TypeTag::Table]);
        let result = OutputAssembler::new(&template, &registry).assemble_schemas(&family_set());
        assert!(matches!(result, Err(CodegenError::Schema(_))));
    }

    #[test]
    fn test_empty_set_is_rejected() {
        let template = builtin();
        let registry = TypeRegistry::new();
        let err = OutputAssembler::new(&template, &registry)
            .assemble_schemas(&SchemaSet::new())
            .expect_err("empty set should fail");
        assert!(matches!(err, CodegenError::Generation { .. }));
    }

    #[test]
    fn test_claim_names_detects_collisions() {
        let mut emitted = BTreeSet::new();
        claim_names(&mut emitted, ["Person", "Person_Cursor"]).expect("Failed to claim");
        let err = claim_names(&mut emitted, ["Pet", "Person_Cursor"])
            .expect_err("collision expected");
        assert!(matches!(err, CodegenError::NameCollision { ref name } if name == "Person_Cursor"));
    }

    #[test]
    fn test_write_file() {
        let template = builtin();
        let registry = TypeRegistry::new();
        let output = OutputAssembler::new(&template, &registry)
            .assemble_widths(1)
            .expect("Failed to assemble");

        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("tightdb.h");
        output.write_file(&path).expect("Failed to write file");
        let written = std::fs::read_to_string(&path).expect("Failed to read file");
        assert_eq!(written, output.text());

        let mut buffer = Vec::new();
        output.write_to(&mut buffer).expect("Failed to write buffer");
        assert_eq!(buffer, output.text().as_bytes());
    }
}
