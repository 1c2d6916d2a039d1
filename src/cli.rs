use crate::types::{RequiredLevel, Severity};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "baseline-scan")]
#[command(about = "Checks CSS and JavaScript sources against web platform Baseline availability")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Write output to file
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Verbose logging (also lists info-level issues in text output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check files or directories for feature availability issues
    Check {
        /// Paths to check (files or directories)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Required availability level (overrides the config file)
        #[arg(short, long, value_enum)]
        level: Option<RequiredLevel>,

        /// Configuration file (JSON or YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Compat-data snapshot to resolve features against before the built-in table
        #[arg(long)]
        data: Option<PathBuf>,

        /// Also check at-rules such as @container and @layer
        #[arg(long)]
        at_rules: bool,

        /// Files handed to the worker pool per batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Per-file timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Skip files larger than this many bytes
        #[arg(long)]
        max_file_size: Option<u64>,

        /// Print cache statistics to stderr when done
        #[arg(long)]
        stats: bool,

        /// Exit with an error if any issue has one of these severities
        #[arg(long, value_enum, value_delimiter = ',')]
        error_if: Vec<Severity>,
    },

    /// Resolve a single feature key, e.g. `css.properties.display.grid`
    Feature {
        /// Feature key to resolve
        key: String,

        /// Compat-data snapshot to resolve against before the built-in table
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable terminal output
    Text,
    /// JSON output for machine consumption
    Json,
    /// Markdown table for pull-request comments
    Markdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check() {
        let args = Args::try_parse_from([
            "baseline-scan",
            "check",
            "src",
            "styles",
            "--level",
            "high",
            "--at-rules",
            "--error-if",
            "error,warning",
            "--format",
            "markdown",
        ])
        .unwrap();

        assert_eq!(args.format, OutputFormat::Markdown);
        match args.command {
            Command::Check {
                paths,
                level,
                at_rules,
                error_if,
                ..
            } => {
                assert_eq!(paths.len(), 2);
                assert_eq!(level, Some(RequiredLevel::High));
                assert!(at_rules);
                assert_eq!(error_if, vec![Severity::Error, Severity::Warning]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_check_requires_paths() {
        assert!(Args::try_parse_from(["baseline-scan", "check"]).is_err());
    }

    #[test]
    fn test_parse_feature() {
        let args = Args::try_parse_from([
            "baseline-scan",
            "--format",
            "json",
            "feature",
            "css.properties.display",
        ])
        .unwrap();
        assert_eq!(args.format, OutputFormat::Json);
        match args.command {
            Command::Feature { key, .. } => assert_eq!(key, "css.properties.display"),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
