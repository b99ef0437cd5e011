//! Contrail CLI: flight-data ETL pipeline and query translation.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::info;

use contrail::store::{NdjsonSource, NdjsonWarehouse};
use contrail::{Config, Pipeline, Translator, init_tracing};

#[derive(Parser, Debug)]
#[command(name = "contrail")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the transform-and-load pipeline.
    Run {
        /// Path to the configuration file.
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Rewrite a star-schema query against the normalized tables.
    Translate {
        /// Period table name (can be specified multiple times; defaults to
        /// the quarterly Q1..Q4 layout).
        #[arg(short, long = "period")]
        periods: Vec<String>,

        /// The query text; read from stdin when omitted.
        query: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = Args::parse();
    match args.command {
        Command::Run { config } => run(&config).await,
        Command::Translate { periods, query } => translate(periods, query),
    }
}

async fn run(config_path: &PathBuf) -> ExitCode {
    let config = match Config::from_file(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        source = %config.source.path,
        warehouse = %config.warehouse.path,
        periods = ?config.source.periods,
        "Starting contrail pipeline"
    );

    let reader = NdjsonSource::new(&config.source.path);
    let writer = NdjsonWarehouse::new(&config.warehouse.path);
    let pipeline = Pipeline::new(&config, &reader, &writer);

    match pipeline.run().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Pipeline failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn translate(periods: Vec<String>, query: Option<String>) -> ExitCode {
    let query = match query {
        Some(q) => q,
        None => {
            let mut buffer = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut buffer) {
                eprintln!("Failed to read query from stdin: {e}");
                return ExitCode::FAILURE;
            }
            buffer
        }
    };

    let translator = if periods.is_empty() {
        Translator::with_default_periods()
    } else {
        Translator::new(periods)
    };
    println!("{}", translator.translate(&query));
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_args_accept_repeated_periods() {
        let args = Args::try_parse_from([
            "contrail",
            "translate",
            "--period",
            "H1",
            "--period",
            "H2",
            "SELECT 1",
        ])
        .unwrap();

        match args.command {
            Command::Translate { periods, query } => {
                assert_eq!(periods, vec!["H1", "H2"]);
                assert_eq!(query.as_deref(), Some("SELECT 1"));
            }
            other => panic!("expected translate subcommand, got {other:?}"),
        }
    }

    #[test]
    fn test_translate_args_default_to_no_periods() {
        let args = Args::try_parse_from(["contrail", "translate"]).unwrap();
        match args.command {
            Command::Translate { periods, query } => {
                assert!(periods.is_empty());
                assert!(query.is_none());
            }
            other => panic!("expected translate subcommand, got {other:?}"),
        }
    }
}
