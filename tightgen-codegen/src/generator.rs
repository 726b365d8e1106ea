//! Generator configuration and top-level runs.

use crate::assembler::{AssembledOutput, OutputAssembler};
use crate::error::CodegenError;
use crate::template::{self, Template};
use crate::BUILTIN_TEMPLATE;
use std::io;
use std::path::{Path, PathBuf};
use tightgen_schema::{parse_declarations, parse_schema_set, SchemaSet, TypeRegistry};

/// Where the template comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TemplateSource {
    /// The embedded Objective-C template.
    #[default]
    BuiltIn,
    /// A template file, read once at build time.
    File(PathBuf),
    /// Template text.
    Inline(String),
}

/// Where the generated text goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputTarget {
    /// Standard output.
    #[default]
    Stdout,
    /// A file, replaced on success.
    File(PathBuf),
}

/// Generator settings.
#[derive(Debug, Clone, Default)]
pub struct GeneratorConfig {
    /// Template source.
    pub template: TemplateSource,
    /// Types the target engine supports.
    pub registry: TypeRegistry,
    /// Output destination.
    pub output: OutputTarget,
}

/// Builder for [`Generator`].
#[derive(Debug, Clone, Default)]
pub struct GeneratorBuilder {
    config: GeneratorConfig,
}

impl GeneratorBuilder {
    /// Creates a builder with the built-in template, the full registry and
    /// stdout output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the template source.
    #[must_use]
    pub fn template(mut self, source: TemplateSource) -> Self {
        self.config.template = source;
        self
    }

    /// Sets the type registry.
    #[must_use]
    pub fn registry(mut self, registry: TypeRegistry) -> Self {
        self.config.registry = registry;
        self
    }

    /// Sets the output target.
    #[must_use]
    pub fn output(mut self, output: OutputTarget) -> Self {
        self.config.output = output;
        self
    }

    /// Loads and parses the template.
    ///
    /// # Errors
    /// Returns `CodegenError::Io` if the template file cannot be read and
    /// `CodegenError::Template` if it does not parse.
    pub fn build(self) -> Result<Generator, CodegenError> {
        let template = match &self.config.template {
            TemplateSource::BuiltIn => template::parse(BUILTIN_TEMPLATE)?,
            TemplateSource::Inline(text) => template::parse(text)?,
            TemplateSource::File(path) => {
                let text = std::fs::read_to_string(path)?;
                tracing::debug!("Loaded template {} ({} bytes)", path.display(), text.len());
                template::parse(&text)?
            }
        };
        Ok(Generator {
            template,
            registry: self.config.registry,
            output: self.config.output,
        })
    }
}

/// A configured generator.
#[derive(Debug, Clone)]
pub struct Generator {
    template: Template,
    registry: TypeRegistry,
    output: OutputTarget,
}

impl Generator {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> GeneratorBuilder {
        GeneratorBuilder::new()
    }

    /// The parsed template.
    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// The type registry.
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The output target.
    #[must_use]
    pub fn output(&self) -> &OutputTarget {
        &self.output
    }

    fn assembler(&self) -> OutputAssembler<'_> {
        OutputAssembler::new(&self.template, &self.registry)
    }

    /// Generates the macro families of widths 1 to `max_cols`.
    ///
    /// # Errors
    /// See [`OutputAssembler::assemble_widths`].
    pub fn generate_widths(&self, max_cols: usize) -> Result<AssembledOutput, CodegenError> {
        self.assembler().assemble_widths(max_cols)
    }

    /// Generates the concrete classes of every table in a set.
    ///
    /// # Errors
    /// See [`OutputAssembler::assemble_schemas`].
    pub fn generate_schemas(&self, set: &SchemaSet) -> Result<AssembledOutput, CodegenError> {
        self.assembler().assemble_schemas(set)
    }

    /// Loads XML schema files into one set, in argument order.
    ///
    /// # Errors
    /// Returns `CodegenError::Io` for unreadable files and
    /// `CodegenError::Schema` for invalid schemas, duplicate tables across
    /// files, or unresolved subtable references.
    pub fn load_schema_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
    ) -> Result<SchemaSet, CodegenError> {
        self.load(paths, parse_schema_set)
    }

    /// Scans files for `DEFINE_TABLE` declarations into one set, in
    /// argument order.
    ///
    /// # Errors
    /// Same as [`Generator::load_schema_files`].
    pub fn load_declaration_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
    ) -> Result<SchemaSet, CodegenError> {
        self.load(paths, parse_declarations)
    }

    fn load<P, F>(&self, paths: &[P], parse: F) -> Result<SchemaSet, CodegenError>
    where
        P: AsRef<Path>,
        F: Fn(&str, &TypeRegistry) -> Result<SchemaSet, tightgen_schema::SchemaError>,
    {
        let mut set = SchemaSet::new();
        for path in paths {
            let path = path.as_ref();
            let text = std::fs::read_to_string(path)?;
            let loaded = parse(&text, &self.registry)?;
            tracing::debug!("Loaded {} tables from {}", loaded.len(), path.display());
            set.extend(loaded)?;
        }
        Ok(set)
    }

    /// Writes an assembled output to the configured target.
    ///
    /// # Errors
    /// Returns the underlying IO error.
    pub fn write(&self, output: &AssembledOutput) -> io::Result<()> {
        match &self.output {
            OutputTarget::Stdout => output.write_to(&mut io::stdout().lock()),
            OutputTarget::File(path) => output.write_file(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tightgen_schema::TypeTag;

    const PERSON_XML: &str = r#"<tables>
  <table name="Person">
    <column name="Name" type="String"/>
    <column name="Age" type="Int"/>
  </table>
</tables>"#;

    #[test]
    fn test_builder_defaults() {
        let generator = Generator::builder().build().expect("Failed to build generator");
        assert_eq!(generator.output(), &OutputTarget::Stdout);
        assert_eq!(generator.registry().len(), TypeTag::ALL.len());
        assert!(generator.template().has_fragment("macro_family"));
    }

    #[test]
    fn test_inline_template() {
        let generator = Generator::builder()
            .template(TemplateSource::Inline(
                "{{#fragment prelude_macros}}P{{max_cols}}\n{{/fragment}}\
                 {{#fragment macro_family}}W{{width}}\n{{/fragment}}"
                    .to_string(),
            ))
            .build()
            .expect("Failed to build generator");
        let output = generator.generate_widths(2).expect("Failed to generate");
        assert_eq!(output.text(), "P2\nW1\nW2\n");
    }

    #[test]
    fn test_template_file_errors() {
        let err = Generator::builder()
            .template(TemplateSource::File(PathBuf::from("/nonexistent/objc.tpl")))
            .build()
            .expect_err("missing file should fail");
        assert!(matches!(err, CodegenError::Io(_)));

        let err = Generator::builder()
            .template(TemplateSource::Inline("{{#fragment x}}".to_string()))
            .build()
            .expect_err("unterminated fragment should fail");
        assert!(matches!(err, CodegenError::Template(_)));
    }

    #[test]
    fn test_load_files_and_write_output() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let schema_path = dir.path().join("person.xml");
        fs::write(&schema_path, PERSON_XML).expect("Failed to write schema");
        let header_path = dir.path().join("pet.h");
        fs::write(&header_path, "DEFINE_TABLE(Pet, (String, Name), (Bool, Tame))\n")
            .expect("Failed to write header");
        let output_path = dir.path().join("out.h");

        let generator = Generator::builder()
            .output(OutputTarget::File(output_path.clone()))
            .build()
            .expect("Failed to build generator");

        let mut set = generator
            .load_schema_files(&[&schema_path])
            .expect("Failed to load schema");
        set.extend(
            generator
                .load_declaration_files(&[&header_path])
                .expect("Failed to load declarations"),
        )
        .expect("Failed to merge sets");
        assert_eq!(set.len(), 2);

        let output = generator.generate_schemas(&set).expect("Failed to generate");
        generator.write(&output).expect("Failed to write output");
        let written = fs::read_to_string(&output_path).expect("Failed to read output");
        assert!(written.contains("@interface Person_QueryAccessor_Age : OCXQueryAccessorInt\n"));
        assert!(written.contains("@interface Pet_QueryAccessor_Tame : OCXQueryAccessorBool\n"));
    }

    #[test]
    fn test_duplicate_table_across_files() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let first = dir.path().join("a.xml");
        let second = dir.path().join("b.xml");
        fs::write(&first, PERSON_XML).expect("Failed to write schema");
        fs::write(&second, PERSON_XML).expect("Failed to write schema");

        let generator = Generator::builder().build().expect("Failed to build generator");
        let err = generator
            .load_schema_files(&[first, second])
            .expect_err("duplicate table should fail");
        assert!(err.is_schema_error());
    }
}
