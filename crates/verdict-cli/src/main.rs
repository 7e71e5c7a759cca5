//! Verdict CLI - Command-line interface for the Verdict constraint engine

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{criteria, inspect, validate};

#[derive(Parser)]
#[command(name = "verdict")]
#[command(about = "Composable, declarative constraint validation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate model instances from a data file
    Validate {
        /// Path to data file (model names mapped to arrays of instances)
        data: String,

        /// Path to schemas directory
        #[arg(long, default_value = "schemas")]
        schemas: String,

        /// Validation groups to run (comma-separated, default group when omitted)
        #[arg(long, value_delimiter = ',')]
        groups: Vec<String>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show the resolved path of a constraint definition
    Inspect {
        /// Definition name
        definition: String,

        /// Path to schemas directory
        #[arg(long, default_value = "schemas")]
        schemas: String,
    },

    /// Show the compiled criteria of a model
    Criteria {
        /// Model name
        model: String,

        /// Path to schemas directory
        #[arg(long, default_value = "schemas")]
        schemas: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate {
            data,
            schemas,
            groups,
            format,
        } => validate::run(validate::ValidateArgs {
            data,
            schemas,
            groups,
            format,
        }),
        Commands::Inspect { definition, schemas } => inspect::run(&definition, &schemas),
        Commands::Criteria { model, schemas } => criteria::run(&model, &schemas),
    }
}
