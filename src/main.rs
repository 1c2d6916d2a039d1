use anyhow::{Context, Result};
use baseline_scan::cache::AvailabilityCache;
use baseline_scan::cli::{Args, Command, OutputFormat};
use baseline_scan::config::ScanConfig;
use baseline_scan::output;
use baseline_scan::resolver::{DatasetProvider, StatusResolver};
use baseline_scan::types::{AggregateReport, FeatureKey, RequiredLevel, Severity};
use baseline_scan::Scanner;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Options of the `check` subcommand that override the configuration file
struct CheckOverrides {
    level: Option<RequiredLevel>,
    at_rules: bool,
    batch_size: Option<usize>,
    timeout: Option<u64>,
    max_file_size: Option<u64>,
}

impl CheckOverrides {
    fn apply(self, mut config: ScanConfig) -> ScanConfig {
        if let Some(level) = self.level {
            config.required_level = level;
        }
        if self.at_rules {
            config.check_at_rules = true;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(timeout) = self.timeout {
            config.file_timeout_secs = timeout;
        }
        if let Some(max_file_size) = self.max_file_size {
            config.max_file_size = max_file_size;
        }
        config
    }
}

/// Fail when any issue matches one of the --error-if severities
fn check_severity_error(report: &AggregateReport, error_if: &[Severity]) -> Result<()> {
    let worst = report
        .results
        .iter()
        .flat_map(|r| &r.issues)
        .map(|i| i.severity)
        .filter(|s| error_if.contains(s))
        .max();

    if let Some(severity) = worst {
        anyhow::bail!("Found {} issues which match --error-if criteria", severity);
    }
    Ok(())
}

fn write_output(output: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, output)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            eprintln!("Results written to {}", path.display());
        }
        None => print!("{output}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins, otherwise the verbose flag picks the level
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if args.verbose {
        EnvFilter::new("baseline_scan=debug")
    } else {
        EnvFilter::new("baseline_scan=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    debug!("Logging initialized (verbose={})", args.verbose);

    // Deeply nested minified bundles need more than the default worker stack
    rayon::ThreadPoolBuilder::new()
        .stack_size(8 * 1024 * 1024) // 8MB per thread
        .build_global()
        .ok(); // Ignore error if pool already initialized

    match args.command {
        Command::Check {
            paths,
            level,
            config,
            data,
            at_rules,
            batch_size,
            timeout,
            max_file_size,
            stats,
            error_if,
        } => {
            let base = match &config {
                Some(path) => ScanConfig::from_file(path).with_context(|| {
                    format!("Failed to load configuration from {}", path.display())
                })?,
                None => ScanConfig::default(),
            };
            let overrides = CheckOverrides {
                level,
                at_rules,
                batch_size,
                timeout,
                max_file_size,
            };
            let config = overrides.apply(base);

            let report = run_check(&paths, config, data.as_deref(), args.format, stats)?;

            let rendered = match args.format {
                OutputFormat::Text => output::format_terminal(&report, args.verbose)?,
                OutputFormat::Json => output::format_json(&report)?,
                OutputFormat::Markdown => output::format_markdown(&report)?,
            };
            write_output(&rendered, args.output.as_deref())?;

            check_severity_error(&report, &error_if)?;
        }
        Command::Feature { key, data } => {
            let defaults = ScanConfig::default();
            let resolver =
                StatusResolver::new(AvailabilityCache::new(defaults.feature_cache_capacity)?);
            let resolver = match &data {
                Some(path) => {
                    let cache = AvailabilityCache::new(defaults.data_cache_capacity)?;
                    resolver.with_provider(Arc::new(DatasetProvider::from_path(path, cache)?))
                }
                None => resolver,
            };

            let key = FeatureKey::new(key);
            let status = resolver.resolve_status(&key);
            let rendered = match args.format {
                OutputFormat::Json => output::format_feature_json(&key, status.as_deref())? + "\n",
                OutputFormat::Text | OutputFormat::Markdown => {
                    output::format_feature_terminal(&key, status.as_deref())
                }
            };
            write_output(&rendered, args.output.as_deref())?;
        }
    }

    Ok(())
}

fn run_check(
    paths: &[PathBuf],
    config: ScanConfig,
    data: Option<&Path>,
    format: OutputFormat,
    stats: bool,
) -> Result<AggregateReport> {
    let mut builder = Scanner::builder().config(config)?;
    if let Some(path) = data {
        builder = builder.dataset(path)?;
    }
    let scanner = builder.build()?;

    let files = scanner.collect_files(paths)?;
    eprintln!("Checking {} files...", files.len());

    // Progress bar only for text output on a terminal
    let pb = if format == OutputFormat::Text && std::io::stdout().is_terminal() {
        let bar = ProgressBar::new(files.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
                .progress_chars("█▓▒░ "),
        );
        Some(bar)
    } else {
        None
    };

    let report = scanner.scan_paths_with_progress(&files, |result| {
        if let Some(bar) = &pb {
            let name = Path::new(&result.file)
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .into_owned();
            bar.set_message(name);
            bar.inc(1);
        }
    })?;

    if let Some(bar) = pb {
        bar.finish_and_clear();
    }

    if stats {
        let resolver = scanner.checker().resolver();
        let feature_stats = resolver.cache_stats();
        eprintln!("{}", output::format_cache_stats("feature cache", &feature_stats));
        if let Some(provider_stats) = resolver.provider_cache_stats() {
            eprintln!("{}", output::format_cache_stats("data cache", &provider_stats));
        }
    }

    Ok(report)
}
