use std::convert::TryFrom;
use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use jsonld_context::loader::DefaultLoader;
use jsonld_context::{ContextParser, ParseOptions, ProcessingMode};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "jsonld-context-parse", author, version, about, long_about = None)]
struct Args {
    /// Sets the level of verbosity.
    #[arg(short, long = "verbose", action = clap::ArgAction::Count)]
    verbosity: u8,

    /// Base IRI to resolve relative references against.
    #[arg(short, long, global = true)]
    base: Option<String>,

    /// JSON-LD processing mode, 1.0 or 1.1.
    #[arg(short = 'm', long, default_value_t = 1.1, global = true)]
    processing_mode: f64,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Parse the context behind the given IRI.
    Url { iri: String },

    /// Parse the context stored in a local file.
    File { path: PathBuf },

    /// Parse a context given inline as JSON.
    Arg { json: String },
}

async fn run(args: Args) -> Result<String, Box<dyn Error>> {
    let processing_mode = ProcessingMode::try_from(args.processing_mode)?;

    let context = match args.command {
        Command::Url { iri } => Value::String(iri),
        Command::File { path } => {
            let text = async_std::fs::read_to_string(&path).await?;
            serde_json::from_str(&text)?
        }
        Command::Arg { json } => serde_json::from_str(&json)?,
    };

    let options = ParseOptions {
        base_iri: args.base,
        processing_mode,
        ..ParseOptions::default()
    };

    let parser = ContextParser::new(DefaultLoader::new());
    let normalized = parser.parse(&context, &options).await?;
    log::info!("resolved {} term definitions", normalized.terms().count());

    Ok(serde_json::to_string_pretty(&*normalized)?)
}

fn main() {
    // Parse options.
    let args = Args::parse();

    // Init logger.
    if let Err(e) = stderrlog::new().verbosity(args.verbosity as usize).init() {
        eprintln!("warning: could not set up logging: {}", e);
    }

    match async_std::task::block_on(run(args)) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
