//! docmap CLI
//!
//! Developer tool for trying mapping files against sample documents.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use docmap_core::ScalarArrayMode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// docmap - map nested documents to flat, column-like records
#[derive(Parser)]
#[command(name = "docmap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Mapping file path (JSON or YAML)
    #[arg(short, long, default_value = "mappings.json", env = "DOCMAP_MAPPINGS")]
    mappings: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map JSON-lines documents to flat records
    Map {
        /// Namespace of the documents (database.collection)
        #[arg(short, long)]
        namespace: String,

        /// Input file (defaults to stdin)
        #[arg(short, long)]
        input: Option<String>,

        /// How array-of-scalars fields are written
        #[arg(long, value_enum, default_value_t = ScalarArrays::Joined)]
        scalar_arrays: ScalarArrays,
    },

    /// Show the mapping of a namespace
    Inspect {
        /// Namespace to inspect (database.collection)
        #[arg(short, long)]
        namespace: String,
    },

    /// Validate the mapping file
    Validate,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScalarArrays {
    /// Join elements into one text value
    Joined,
    /// One key per element
    Indexed,
}

impl From<ScalarArrays> for ScalarArrayMode {
    fn from(value: ScalarArrays) -> Self {
        match value {
            ScalarArrays::Joined => ScalarArrayMode::Joined,
            ScalarArrays::Indexed => ScalarArrayMode::Indexed,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout carries records
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Map {
            namespace,
            input,
            scalar_arrays,
        } => {
            commands::map::run(
                &cli.mappings,
                &namespace,
                input.as_deref(),
                scalar_arrays.into(),
            )?;
        }
        Commands::Inspect { namespace } => {
            commands::inspect::run(&cli.mappings, &namespace)?;
        }
        Commands::Validate => {
            commands::validate::run(&cli.mappings)?;
        }
    }

    Ok(())
}
