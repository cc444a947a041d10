//! typeshape CLI - Main entry point

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::check::{CheckArgs, ReportFormat};
use commands::resolve::ResolveArgs;

#[derive(Parser, Debug)]
#[command(name = "typeshape")]
#[command(version)]
#[command(about = "Resolve type graphs into schemas and validate JSON values", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a type graph (JSON) into a schema repository
    Resolve {
        /// Type graph file
        #[arg(value_name = "GRAPH")]
        graph: PathBuf,

        /// Annotation overlay file (descriptions, defaults, bounds)
        #[arg(long, value_name = "FILE")]
        annotations: Option<PathBuf>,

        /// Write the repository to FILE instead of stdout
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Validate JSON values against a schema repository
    Check {
        /// Schema repository file
        #[arg(long, value_name = "FILE")]
        schema: PathBuf,

        /// Value files to check
        #[arg(value_name = "VALUE", required = true)]
        values: Vec<PathBuf>,

        /// Report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "typeshape=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            graph,
            annotations,
            output,
        } => commands::resolve::execute(ResolveArgs {
            graph,
            annotations,
            output,
        }),
        Commands::Check {
            schema,
            values,
            format,
        } => {
            let all_valid = commands::check::execute(CheckArgs {
                schema,
                values,
                format,
            })?;
            if !all_valid {
                process::exit(1);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolve() {
        let cli = Cli::try_parse_from([
            "typeshape",
            "resolve",
            "graph.json",
            "--annotations",
            "docs.json",
            "-o",
            "schema.json",
        ])
        .unwrap();
        match cli.command {
            Commands::Resolve {
                graph,
                annotations,
                output,
            } => {
                assert_eq!(graph, PathBuf::from("graph.json"));
                assert_eq!(annotations, Some(PathBuf::from("docs.json")));
                assert_eq!(output, Some(PathBuf::from("schema.json")));
            }
            other => panic!("Expected resolve, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from([
            "typeshape",
            "check",
            "--schema",
            "schema.json",
            "a.json",
            "b.json",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Check {
                schema,
                values,
                format,
            } => {
                assert_eq!(schema, PathBuf::from("schema.json"));
                assert_eq!(values.len(), 2);
                assert_eq!(format, ReportFormat::Json);
            }
            other => panic!("Expected check, got {:?}", other),
        }
    }

    #[test]
    fn test_check_requires_values() {
        assert!(Cli::try_parse_from(["typeshape", "check", "--schema", "s.json"]).is_err());
    }
}
