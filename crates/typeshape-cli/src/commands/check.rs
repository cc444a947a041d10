//! Check command implementation.
//!
//! Validates one or more JSON value files against a persisted schema
//! repository and reports every error per file.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use tracing::{debug, warn};

use typeshape::{SchemaRepository, ValidationError, Validator};

use super::read_json;

/// How check results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// One line per error
    Text,
    /// A JSON array of per-file reports
    Json,
}

/// Arguments for the check command
#[derive(Debug)]
pub struct CheckArgs {
    /// Schema repository file
    pub schema: PathBuf,
    /// Value files
    pub values: Vec<PathBuf>,
    /// Report format
    pub format: ReportFormat,
}

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    valid: bool,
    errors: Vec<ValidationError>,
}

/// Execute the check command. Returns whether every value was valid.
pub fn execute(args: CheckArgs) -> Result<bool> {
    let mut stdout = std::io::stdout().lock();
    run(&args, &mut stdout)
}

fn run(args: &CheckArgs, out: &mut impl Write) -> Result<bool> {
    let content = fs::read_to_string(&args.schema)
        .with_context(|| format!("Failed to read schema file: {}", args.schema.display()))?;
    let repository = SchemaRepository::from_json_str(&content)
        .with_context(|| format!("Failed to load schema file: {}", args.schema.display()))?;

    for name in repository.dangling_refs() {
        warn!(reference = %name, "Schema references a missing definition");
    }

    let validator = Validator::new(&repository);
    let mut reports = Vec::with_capacity(args.values.len());
    for path in &args.values {
        let value: serde_json::Value = read_json(path, "value")?;
        let errors = validator.check(&value);
        debug!(file = %path.display(), errors = errors.len(), "Checked value");
        reports.push(FileReport {
            file: path.display().to_string(),
            valid: errors.is_empty(),
            errors,
        });
    }

    match args.format {
        ReportFormat::Text => {
            for report in &reports {
                if report.valid {
                    writeln!(out, "{}: ok", report.file)?;
                    continue;
                }
                writeln!(out, "{}: {} error(s)", report.file, report.errors.len())?;
                for error in &report.errors {
                    writeln!(out, "  [{}] {}", error.error_code(), error)?;
                }
            }
        }
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &reports)?;
            writeln!(out)?;
        }
    }

    Ok(reports.iter().all(|report| report.valid))
}
