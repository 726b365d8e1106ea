//! Table-API emission.
//!
//! Turns one [`TableSchema`] into its five coupled artifacts: Cursor,
//! Table, one QueryAccessor per column, Query and View. Each artifact has
//! a declaration rendered from the fragment named after its kind and an
//! optional definition rendered from `{kind}_impl`, so the assembler can
//! place every declaration of a table before any of its definitions.

use crate::error::{CodegenError, TemplateError};
use crate::expander::{macro_family_value, ExpansionContext, Expander};
use crate::template::Template;
use tightgen_schema::naming::{self, ArtifactKind};
use tightgen_schema::{ColumnSpec, TableSchema, TypeRegistry, TypeTag};

/// Fragments a template must define to generate concrete table classes.
pub const REQUIRED_SCHEMA_FRAGMENTS: [&str; 6] =
    ["prelude", "cursor", "table", "query_accessor", "query", "view"];

/// Fragments a template must define to generate macro families.
pub const REQUIRED_WIDTH_FRAGMENTS: [&str; 2] = ["prelude_macros", "macro_family"];

/// Fragment rendering the macro family of one width.
pub const MACRO_FAMILY_FRAGMENT: &str = "macro_family";

/// Suffix of the fragment rendering an artifact's definition.
pub const DEFINITION_SUFFIX: &str = "_impl";

/// One generated artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    /// Artifact kind.
    pub kind: ArtifactKind,
    /// Generated type name.
    pub type_name: String,
    /// Column, for query accessors.
    pub column: Option<String>,
    /// Column type, for query accessors.
    pub type_tag: Option<TypeTag>,
    /// Interface text.
    pub declaration: String,
    /// Implementation text; empty if the template has no definition
    /// fragment for the kind.
    pub definition: String,
}

impl GeneratedArtifact {
    /// Declaration followed by definition.
    #[must_use]
    pub fn text(&self) -> String {
        format!("{}{}", self.declaration, self.definition)
    }
}

/// Every artifact generated for one table, in pipeline order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaOutput {
    table: String,
    artifacts: Vec<GeneratedArtifact>,
}

impl SchemaOutput {
    /// Table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Artifacts in pipeline order.
    #[must_use]
    pub fn artifacts(&self) -> &[GeneratedArtifact] {
        &self.artifacts
    }

    /// Artifacts of one kind, in pipeline order.
    pub fn artifacts_of(&self, kind: ArtifactKind) -> impl Iterator<Item = &GeneratedArtifact> {
        self.artifacts.iter().filter(move |a| a.kind == kind)
    }

    /// Generated type names, in pipeline order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.artifacts.iter().map(|a| a.type_name.as_str())
    }

    /// All declarations followed by all definitions.
    #[must_use]
    pub fn text(&self) -> String {
        let mut output = String::new();
        for artifact in &self.artifacts {
            output.push_str(&artifact.declaration);
        }
        for artifact in &self.artifacts {
            output.push_str(&artifact.definition);
        }
        output
    }
}

/// Macro family generated for one width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroFamily {
    /// Number of columns the family accepts.
    pub width: usize,
    /// Rendered text.
    pub text: String,
}

/// Emits the typed table API of a schema through a template.
#[derive(Debug, Clone, Copy)]
pub struct TableApiEmitter<'a> {
    expander: Expander<'a>,
}

impl<'a> TableApiEmitter<'a> {
    /// Creates an emitter.
    ///
    /// # Arguments
    /// * `template` - Parsed template providing the artifact fragments
    /// * `registry` - Registry every column type is resolved against
    #[must_use]
    pub fn new(template: &'a Template, registry: &'a TypeRegistry) -> Self {
        Self {
            expander: Expander::new(template, registry),
        }
    }

    /// The underlying expander.
    #[must_use]
    pub fn expander(&self) -> &Expander<'a> {
        &self.expander
    }

    /// Checks that `template` can generate concrete table classes.
    ///
    /// # Errors
    /// Returns `TemplateError::MissingFragment` naming the first absent
    /// fragment.
    pub fn check_schema_template(template: &Template) -> Result<(), TemplateError> {
        check_fragments(template, &REQUIRED_SCHEMA_FRAGMENTS)
    }

    /// Checks that `template` can generate macro families.
    ///
    /// # Errors
    /// Returns `TemplateError::MissingFragment` naming the first absent
    /// fragment.
    pub fn check_width_template(template: &Template) -> Result<(), TemplateError> {
        check_fragments(template, &REQUIRED_WIDTH_FRAGMENTS)
    }

    /// Emits every artifact of a table.
    ///
    /// # Arguments
    /// * `schema` - Table to generate
    ///
    /// # Returns
    /// Cursor, Table, one QueryAccessor per column in column order, Query
    /// and View.
    ///
    /// # Errors
    /// Returns `CodegenError::Schema` if a column type is not registered
    /// and `CodegenError::Template` if a fragment is missing or fails to
    /// render. Nothing is returned for the table in either case.
    pub fn emit(&self, schema: &TableSchema) -> Result<SchemaOutput, CodegenError> {
        let context = self.expander.context(schema)?;
        let mut artifacts = Vec::with_capacity(schema.width() + ArtifactKind::ALL.len() - 1);

        for kind in ArtifactKind::ALL {
            if kind.is_per_column() {
                self.emit_per_column(kind, &context, &mut artifacts)?;
                continue;
            }
            let declaration = self.expander.render(kind.fragment(), context.root())?;
            let definition = match self.definition_fragment(kind) {
                Some(name) => self.expander.render(&name, context.root())?,
                None => String::new(),
            };
            artifacts.push(artifact(schema, kind, None, declaration, definition)?);
        }

        for artifact in &artifacts {
            tracing::debug!(
                "Emitted {} {} ({} bytes)",
                artifact.kind,
                artifact.type_name,
                artifact.declaration.len() + artifact.definition.len()
            );
        }

        Ok(SchemaOutput {
            table: schema.name().to_string(),
            artifacts,
        })
    }

    fn emit_per_column(
        &self,
        kind: ArtifactKind,
        context: &ExpansionContext<'_>,
        artifacts: &mut Vec<GeneratedArtifact>,
    ) -> Result<(), CodegenError> {
        let schema = context.schema();
        let declarations = self.expander.expand_columns(kind.fragment(), context)?;
        let definitions = match self.definition_fragment(kind) {
            Some(name) => self.expander.expand_columns(&name, context)?,
            None => vec![String::new(); schema.width()],
        };

        let rows = schema.columns().iter().zip(declarations).zip(definitions);
        for ((column, declaration), definition) in rows {
            artifacts.push(artifact(schema, kind, Some(column), declaration, definition)?);
        }
        Ok(())
    }

    /// Emits the macro family of one width.
    ///
    /// # Errors
    /// Returns `CodegenError::Schema` with `EmptySchema` for width 0 and
    /// `CodegenError::Template` if the family fails to render.
    pub fn emit_width(&self, width: usize) -> Result<MacroFamily, CodegenError> {
        let root = macro_family_value(width, self.expander.registry())?;
        let text = self.expander.render(MACRO_FAMILY_FRAGMENT, &root)?;
        tracing::debug!("Emitted macro family for width {} ({} bytes)", width, text.len());
        Ok(MacroFamily { width, text })
    }

    fn definition_fragment(&self, kind: ArtifactKind) -> Option<String> {
        let name = format!("{}{DEFINITION_SUFFIX}", kind.fragment());
        self.expander.template().has_fragment(&name).then_some(name)
    }
}

fn artifact(
    schema: &TableSchema,
    kind: ArtifactKind,
    column: Option<&ColumnSpec>,
    declaration: String,
    definition: String,
) -> Result<GeneratedArtifact, CodegenError> {
    let type_name = naming::type_name(schema.name(), kind, column.map(ColumnSpec::name))
        .ok_or_else(|| {
            CodegenError::generation(format!("{kind} of table '{}' has no name", schema.name()))
        })?;
    Ok(GeneratedArtifact {
        kind,
        type_name,
        column: column.map(|c| c.name().to_string()),
        type_tag: column.map(ColumnSpec::type_tag),
        declaration,
        definition,
    })
}

fn check_fragments(template: &Template, required: &[&str]) -> Result<(), TemplateError> {
    match required.iter().find(|name| !template.has_fragment(name)) {
        Some(name) => Err(TemplateError::MissingFragment {
            name: (*name).to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::parse;
    use tightgen_schema::SchemaError;

    fn builtin() -> Template {
        parse(crate::BUILTIN_TEMPLATE).expect("Failed to parse built-in template")
    }

    fn person() -> TableSchema {
        TableSchema::builder("Person")
            .column("Name", TypeTag::String)
            .column("Age", TypeTag::Int)
            .column("Hired", TypeTag::Bool)
            .build()
            .expect("Failed to build Person")
    }

    fn accessor<'o>(output: &'o SchemaOutput, column: &str) -> &'o GeneratedArtifact {
        output
            .artifacts_of(ArtifactKind::QueryAccessor)
            .find(|a| a.column.as_deref() == Some(column))
            .expect("Failed to find accessor")
    }

    fn predicate_lines(artifact: &GeneratedArtifact) -> Vec<&str> {
        artifact
            .declaration
            .lines()
            .filter(|line| line.starts_with("-("))
            .collect()
    }

    #[test]
    fn test_artifacts_follow_pipeline_order() {
        let template = builtin();
        let registry = TypeRegistry::new();
        let output = TableApiEmitter::new(&template, &registry)
            .emit(&person())
            .expect("Failed to emit");

        let names: Vec<_> = output.type_names().collect();
        assert_eq!(
            names,
            vec![
                "Person_Cursor",
                "Person",
                "Person_QueryAccessor_Name",
                "Person_QueryAccessor_Age",
                "Person_QueryAccessor_Hired",
                "Person_Query",
                "Person_View",
            ]
        );
        assert_eq!(output.table(), "Person");
        assert_eq!(accessor(&output, "Age").type_tag, Some(TypeTag::Int));
    }

    #[test]
    fn test_accessors_expose_exactly_the_column_capabilities() {
        let template = builtin();
        let registry = TypeRegistry::new();
        let output = TableApiEmitter::new(&template, &registry)
            .emit(&person())
            .expect("Failed to emit");

        assert_eq!(
            accessor(&output, "Hired").declaration,
            "\n@interface Person_QueryAccessor_Hired : OCXQueryAccessorBool\n\
             -(Person_Query *)equal:(BOOL)value;\n\
             @end\n"
        );
        assert_eq!(
            predicate_lines(accessor(&output, "Age")),
            vec![
                "-(Person_Query *)equal:(int64_t)value;",
                "-(Person_Query *)notEqual:(int64_t)value;",
                "-(Person_Query *)greater:(int64_t)value;",
                "-(Person_Query *)less:(int64_t)value;",
                "-(Person_Query *)between:(int64_t)from to:(int64_t)to;",
            ]
        );
        let name_lines = predicate_lines(accessor(&output, "Name"));
        assert_eq!(name_lines.len(), 5);
        assert!(name_lines
            .iter()
            .all(|line| line.ends_with(" caseSensitive:(BOOL)caseSensitive;")));
        assert!(name_lines[2].starts_with("-(Person_Query *)beginsWith:(NSString *)value"));
    }

    #[test]
    fn test_accessor_definitions_forward_to_engine() {
        let template = builtin();
        let registry = TypeRegistry::new();
        let output = TableApiEmitter::new(&template, &registry)
            .emit(&person())
            .expect("Failed to emit");

        let age = &accessor(&output, "Age").definition;
        assert!(age.starts_with("\n@implementation Person_QueryAccessor_Age\n"));
        assert!(age.contains("    return (Person_Query *)[super between:from to:to];\n"));
        let name = &accessor(&output, "Name").definition;
        assert!(name.contains("[super contains:value caseSensitive:caseSensitive]"));
    }

    #[test]
    fn test_column_indices_match_schema() {
        let template = builtin();
        let registry = TypeRegistry::new();
        let output = TableApiEmitter::new(&template, &registry)
            .emit(&person())
            .expect("Failed to emit");
        let table = output
            .artifacts_of(ArtifactKind::Table)
            .next()
            .expect("Failed to find table");

        assert!(table.declaration.contains(
            "-(void)addName:(NSString *)Name Age:(int64_t)Age Hired:(BOOL)Hired;\n"
        ));
        assert!(table.definition.contains("[self insertString:0 ndx:ndx value:Name];"));
        assert!(table.definition.contains("[self insertInt:1 ndx:ndx value:Age];"));
        assert!(table.definition.contains("[self insertBool:2 ndx:ndx value:Hired];"));
        assert!(table
            .definition
            .contains("if (![spec addColumn:COLUMN_TYPE_INT name:@\"Age\"]) return NO;"));
    }

    #[test]
    fn test_aggregates_only_for_capable_columns() {
        let template = builtin();
        let registry = TypeRegistry::new();
        let output = TableApiEmitter::new(&template, &registry)
            .emit(&person())
            .expect("Failed to emit");
        let query = output
            .artifacts_of(ArtifactKind::Query)
            .next()
            .expect("Failed to find query");

        assert!(query.declaration.contains("-(int64_t)sumOfAge;\n"));
        assert!(query.declaration.contains("-(double)averageOfAge;\n"));
        assert!(query.definition.contains("[self avgIntColumnWithIndex:1]"));
        assert!(!query.declaration.contains("OfName"));
        assert!(!query.declaration.contains("OfHired"));
    }

    #[test]
    fn test_optional_column_uses_nullable_accessors() {
        let schema = TableSchema::builder("Reading")
            .optional_column("Value", TypeTag::Double)
            .build()
            .expect("Failed to build");
        let template = builtin();
        let registry = TypeRegistry::new();
        let output = TableApiEmitter::new(&template, &registry)
            .emit(&schema)
            .expect("Failed to emit");
        let cursor = output
            .artifacts_of(ArtifactKind::Cursor)
            .next()
            .expect("Failed to find cursor");

        assert!(cursor.declaration.contains("-(void)setValue:(NSNumber *)value;\n"));
        assert!(cursor.definition.contains("[_Value setNull];"));
        assert!(cursor.definition.contains("[_Value getOptionalDouble]"));
    }

    #[test]
    fn test_declarations_precede_definitions() {
        let template = builtin();
        let registry = TypeRegistry::new();
        let output = TableApiEmitter::new(&template, &registry)
            .emit(&person())
            .expect("Failed to emit");
        let text = output.text();

        let last_interface = text.rfind("@interface").expect("no interface");
        let first_implementation = text.find("@implementation").expect("no implementation");
        assert!(last_interface < first_implementation);
    }

    #[test]
    fn test_unregistered_type_emits_nothing() {
        let template = builtin();
        let registry = TypeRegistry::with_tags([TypeTag::String, TypeTag::Bool]);
        let err = TableApiEmitter::new(&template, &registry)
            .emit(&person())
            .expect_err("Int should be unknown");
        assert!(matches!(err, CodegenError::Schema(SchemaError::UnknownType { .. })));
    }

    #[test]
    fn test_missing_fragments() {
        let template = parse("{{#fragment cursor}}x{{/fragment}}").expect("Failed to parse");
        let err = TableApiEmitter::check_schema_template(&template)
            .expect_err("prelude is missing");
        assert!(matches!(err, TemplateError::MissingFragment { ref name } if name == "prelude"));
        assert!(TableApiEmitter::check_schema_template(&builtin()).is_ok());
        assert!(TableApiEmitter::check_width_template(&builtin()).is_ok());
    }

    #[test]
    fn test_definition_fragment_is_optional() {
        let source = "{{#fragment cursor}}C{{/fragment}}{{#fragment table}}T{{/fragment}}\
                      {{#fragment query_accessor}}A{{column.index}}{{/fragment}}\
                      {{#fragment query}}Q{{/fragment}}{{#fragment view}}V{{/fragment}}";
        let template = parse(source).expect("Failed to parse");
        let registry = TypeRegistry::new();
        let output = TableApiEmitter::new(&template, &registry)
            .emit(&person())
            .expect("Failed to emit");
        assert_eq!(output.text(), "CTA0A1A2QV");
        assert!(output.artifacts().iter().all(|a| a.definition.is_empty()));
    }

    #[test]
    fn test_emit_width() {
        let template = builtin();
        let registry = TypeRegistry::new();
        let emitter = TableApiEmitter::new(&template, &registry);

        let family = emitter.emit_width(2).expect("Failed to emit width 2");
        assert_eq!(family.width, 2);
        let def_header = concat!(
            "#define TIGHTDB_TABLE_DEF_2",
            "(TableName, CName1, CType1, CName2, CType2) \\\n"
        );
        assert!(family.text.contains(def_header));
        assert!(family
            .text
            .contains("#define TIGHTDB_TABLE_2(TableName, CType1, CName1, CType2, CName2) \\\n"));
        assert!(family.text.contains("TIGHTDB_CURSOR_PROPERTY_DEF(CName2, CType2) \\\n"));

        let err = emitter.emit_width(0).expect_err("width 0 should fail");
        assert!(matches!(err, CodegenError::Schema(SchemaError::EmptySchema { .. })));
    }
}
