//! Command-line interface for compose-graph.
//!
//! The binary takes one compose file, resolves its include tree, and writes
//! a Graphviz DOT graph (or a YAML dump of the merged services) to a file
//! or stdout:
//!
//! ```bash
//! # DOT to stdout
//! compose-graph docker-compose.yaml
//!
//! # DOT to a file, with variables from a dotenv file
//! compose-graph docker-compose.yaml -o graph.dot --env-file .env
//!
//! # Inspect the merged service set instead of drawing it
//! compose-graph docker-compose.yaml --format yaml
//! ```
//!
//! `${VAR}` expansion is on by default and can be disabled with
//! `--no-expand-vars`, which leaves references visible in the output.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::compose::{ComposeModel, ResolveOptions};
use crate::expand::load_env_file;
use crate::graph::{ServiceGraph, dot};

/// Output format of a render run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Graphviz DOT text.
    Dot,
    /// YAML dump of the merged, normalized services.
    Yaml,
}

/// Render a docker-compose configuration tree as a dependency graph.
#[derive(Debug, Parser)]
#[command(name = "compose-graph", version, about, long_about = None)]
pub struct Cli {
    /// Top-level compose file to resolve.
    pub compose_file: PathBuf,

    /// Write output to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value = "dot")]
    pub format: OutputFormat,

    /// Load environment variables from a dotenv file before expansion.
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Leave `${VAR}` references unexpanded in the output.
    #[arg(long)]
    pub no_expand_vars: bool,

    /// Resolve relative volume host paths to absolute paths.
    #[arg(long)]
    pub resolve_relative_volumes: bool,

    /// Enable debug output.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress all log output.
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Set up the tracing subscriber according to the verbosity flags.
    ///
    /// `RUST_LOG` still wins when set, so targeted filters keep working.
    pub fn init_logging(&self) {
        let default_level = if self.quiet {
            "off"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        };

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    /// Execute the render run.
    pub fn execute(self) -> Result<()> {
        if let Some(env_file) = &self.env_file {
            load_env_file(env_file)?;
        }

        let options = ResolveOptions {
            expand_vars: !self.no_expand_vars,
            resolve_relative_volumes: self.resolve_relative_volumes,
        };

        let model = ComposeModel::resolve(&self.compose_file, options)
            .with_context(|| {
                format!("failed to resolve '{}'", self.compose_file.display())
            })?;

        // Cycles between services are drawable, so they only warn.
        ServiceGraph::build(&model.services, &model.dependency_edges()).warn_on_cycles();

        let rendered = match self.format {
            OutputFormat::Dot => dot::render(&model),
            OutputFormat::Yaml => model
                .services_as_yaml()
                .context("failed to serialize merged services")?,
        };

        match &self.output {
            Some(path) => std::fs::write(path, rendered)
                .with_context(|| format!("failed to write '{}'", path.display()))?,
            None => print!("{rendered}"),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["compose-graph", "docker-compose.yaml"]);
        assert_eq!(cli.format, OutputFormat::Dot);
        assert!(!cli.no_expand_vars);
        assert!(cli.output.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_flags_parse() {
        let cli = Cli::parse_from([
            "compose-graph",
            "compose.yaml",
            "-o",
            "out.dot",
            "--format",
            "yaml",
            "--no-expand-vars",
            "--resolve-relative-volumes",
            "-v",
        ]);
        assert_eq!(cli.output, Some(PathBuf::from("out.dot")));
        assert_eq!(cli.format, OutputFormat::Yaml);
        assert!(cli.no_expand_vars);
        assert!(cli.resolve_relative_volumes);
        assert!(cli.verbose);
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        let result = Cli::try_parse_from(["compose-graph", "compose.yaml", "-v", "-q"]);
        assert!(result.is_err());
    }
}
