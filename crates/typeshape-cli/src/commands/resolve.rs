//! Resolve command implementation.
//!
//! Reads a type graph, optionally an annotation overlay, and writes the
//! resolved schema repository in its persisted JSON form.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use typeshape::{AnnotationOverlay, Resolver, TypeNode};

use super::read_json;

/// Arguments for the resolve command
#[derive(Debug)]
pub struct ResolveArgs {
    /// Type graph file
    pub graph: PathBuf,
    /// Annotation overlay file
    pub annotations: Option<PathBuf>,
    /// Output file; stdout when absent
    pub output: Option<PathBuf>,
}

/// Execute the resolve command
pub fn execute(args: ResolveArgs) -> Result<()> {
    let text = resolve_to_string(&args)?;

    match &args.output {
        Some(path) => {
            fs::write(path, text)
                .with_context(|| format!("Failed to write schema file: {}", path.display()))?;
            info!(output = %path.display(), "Wrote schema repository");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", text).context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn resolve_to_string(args: &ResolveArgs) -> Result<String> {
    let graph: TypeNode = read_json(&args.graph, "type graph")?;
    let overlay: AnnotationOverlay = match &args.annotations {
        Some(path) => read_json(path, "annotation")?,
        None => AnnotationOverlay::new(),
    };

    let repository = Resolver::with_annotations(overlay)
        .resolve(&graph)
        .with_context(|| format!("Failed to resolve type graph: {}", args.graph.display()))?;
    info!(
        definitions = repository.definitions().len(),
        "Resolved type graph"
    );

    Ok(repository.to_json_string_pretty()?)
}
