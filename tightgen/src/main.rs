//! tightgen - typed table API generator for TightDB
//!
//! # Usage
//!
//! ```bash
//! # Macro families for every width from 1 to 15
//! tightgen 15 > tightdb_tables.h
//!
//! # Concrete classes for the tables of an XML schema
//! tightgen --schema tables.xml -o Tables.h
//!
//! # Concrete classes for DEFINE_TABLE declarations in a header
//! tightgen --declarations Model.h -o Model_gen.h
//! ```
//!
//! Logs go to stderr and are controlled by `RUST_LOG`.

use anyhow::{Context, Result};
use clap::Parser;
use tightgen::{Generator, OutputTarget, TemplateSource};

mod args;

use args::{Cli, Mode};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let template = match &cli.template {
        Some(path) => TemplateSource::File(path.clone()),
        None => TemplateSource::BuiltIn,
    };
    let output = match &cli.output {
        Some(path) => OutputTarget::File(path.clone()),
        None => OutputTarget::Stdout,
    };

    let generator = Generator::builder()
        .template(template)
        .output(output)
        .build()
        .context("Failed to load template")?;

    let assembled = match cli.mode() {
        Mode::Widths(max_cols) => {
            let max_cols = usize::try_from(max_cols).context("MAX_COLS is too large")?;
            generator.generate_widths(max_cols).with_context(|| {
                format!("Failed to generate macro families up to width {max_cols}")
            })?
        }
        Mode::Schemas(paths) => {
            let set = generator
                .load_schema_files(&paths)
                .context("Failed to load schema files")?;
            generator.generate_schemas(&set).context("Failed to generate tables")?
        }
        Mode::Declarations(paths) => {
            let set = generator
                .load_declaration_files(&paths)
                .context("Failed to load declarations")?;
            generator.generate_schemas(&set).context("Failed to generate tables")?
        }
    };

    generator.write(&assembled).context("Failed to write output")?;
    tracing::info!(
        "Generated {} units ({} bytes)",
        assembled.units(),
        assembled.text().len()
    );
    Ok(())
}
