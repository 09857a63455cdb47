mod cli;
mod report;
mod schema_reader;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use ome_xsd_model::{Cxx, GenerationSession, Java, LanguagePolicy, OmeModel};

use crate::cli::{Cli, Lang};
use crate::report::{ModelEmitter, ReportEmitter};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let lang: Box<dyn LanguagePolicy> = match cli.lang {
        Lang::Java => Box::new(Java::new(&cli.namespace)),
        Lang::Cxx => Box::new(Cxx::new(&cli.namespace)),
    };
    let session = GenerationSession::new(cli.namespace.clone(), lang);

    let tree = schema_reader::read_schema_files(&cli.inputs)?;
    let model = OmeModel::process(tree, session)?;

    let stdout = io::stdout();
    ReportEmitter.emit(&model, &mut stdout.lock())?;
    Ok(())
}
