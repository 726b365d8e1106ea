use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// tightgen - typed table API generator for TightDB
#[derive(Parser, Debug)]
#[command(name = "tightgen")]
#[command(version)]
#[command(
    about = "Generates typed table classes for the TightDB Objective-C binding",
    long_about = None
)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["max_cols", "schema", "declarations"]),
))]
pub struct Cli {
    /// Generate the TIGHTDB_TABLE_n macro families for widths 1 to MAX_COLS
    #[arg(value_name = "MAX_COLS", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_cols: Option<u64>,

    /// Generate concrete classes for the tables of XML schema files
    #[arg(short = 's', long = "schema", value_name = "FILE", num_args = 1..)]
    pub schema: Vec<PathBuf>,

    /// Generate concrete classes for the DEFINE_TABLE declarations found in files
    #[arg(short = 'd', long = "declarations", value_name = "FILE", num_args = 1..)]
    pub declarations: Vec<PathBuf>,

    /// Template file to use instead of the built-in Objective-C template
    #[arg(short = 't', long = "template", value_name = "FILE")]
    pub template: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// What one invocation generates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Widths(u64),
    Schemas(Vec<PathBuf>),
    Declarations(Vec<PathBuf>),
}

impl Cli {
    /// The selected mode. The `mode` group guarantees exactly one is set.
    pub fn mode(&self) -> Mode {
        match self.max_cols {
            Some(max_cols) => Mode::Widths(max_cols),
            None if !self.schema.is_empty() => Mode::Schemas(self.schema.clone()),
            None => Mode::Declarations(self.declarations.clone()),
        }
    }
}
