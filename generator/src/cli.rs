use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Lang {
    Java,
    Cxx,
}

/// Builds the resolved OME object model from XSD schema files and prints a
/// report of the generated types.
#[derive(Parser)]
#[command(version)]
pub struct Cli {
    /// Schema files to process, in dependency order
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Code generation target language
    #[arg(long, value_enum, default_value_t = Lang::Java)]
    pub lang: Lang,

    /// Namespace prefix the schema uses for XML Schema builtins
    #[arg(long, default_value = "xsd:")]
    pub namespace: String,
}
