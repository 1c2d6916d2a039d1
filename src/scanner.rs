use crate::cache::AvailabilityCache;
use crate::checker::{Checker, SourceKind};
use crate::config::{validation, ScanConfig};
use crate::error::{CompatError, Result};
use crate::resolver::{DatasetProvider, PlatformDataProvider};
use crate::types::{AggregateReport, FileAnalysis, FileResult, RequiredLevel};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Parallel CSS/JavaScript compatibility scanner
#[derive(Debug)]
pub struct Scanner {
    checker: Checker,
    config: ScanConfig,
}

/// Builder for configuring and creating Scanner instances
pub struct ScannerBuilder {
    config: ScanConfig,
    provider: Option<Arc<dyn PlatformDataProvider>>,
}

impl ScannerBuilder {
    /// Create a new scanner builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ScanConfig::default(),
            provider: None,
        }
    }

    #[must_use]
    pub fn required_level(mut self, level: RequiredLevel) -> Self {
        self.config.required_level = level;
        self
    }

    /// Set maximum file size to scan
    #[must_use]
    pub fn max_file_size(mut self, max_file_size: u64) -> Self {
        self.config.max_file_size = max_file_size;
        self
    }

    #[must_use]
    pub fn file_timeout_secs(mut self, secs: u64) -> Self {
        self.config.file_timeout_secs = secs;
        self
    }

    /// Set how many files are handed to the worker pool at once
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn check_at_rules(mut self, enabled: bool) -> Self {
        self.config.check_at_rules = enabled;
        self
    }

    #[must_use]
    pub fn feature_cache_capacity(mut self, capacity: usize) -> Self {
        self.config.feature_cache_capacity = capacity;
        self
    }

    #[must_use]
    pub fn data_cache_capacity(mut self, capacity: usize) -> Self {
        self.config.data_cache_capacity = capacity;
        self
    }

    /// Add a directory name to skip while walking
    #[must_use]
    pub fn exclude_dir(mut self, name: &str) -> Self {
        if !self.config.is_excluded_dir(name) {
            self.config.exclude_dirs.push(name.to_string());
        }
        self
    }

    /// Use a live platform-data provider ahead of the fallback table
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn PlatformDataProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Load a compat-data snapshot as the provider, sized by the data cache capacity
    pub fn dataset<P: AsRef<Path>>(mut self, path: P) -> anyhow::Result<Self> {
        let cache = AvailabilityCache::new(self.config.data_cache_capacity)?;
        self.provider = Some(Arc::new(DatasetProvider::from_path(path.as_ref(), cache)?));
        Ok(self)
    }

    /// Set a custom configuration (validates the config)
    pub fn config(mut self, config: ScanConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn build(self) -> Result<Scanner> {
        self.config.validate()?;
        let checker = Checker::from_config(&self.config, self.provider)?;
        Ok(Scanner {
            checker,
            config: self.config,
        })
    }
}

impl Default for ScannerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    /// Create a scanner builder for fluent configuration
    #[must_use]
    pub fn builder() -> ScannerBuilder {
        ScannerBuilder::new()
    }

    /// Create a new scanner with default configuration
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a scanner with a custom configuration
    pub fn with_config(config: ScanConfig) -> Result<Self> {
        Self::builder().config(config)?.build()
    }

    /// Get the scanner's configuration
    #[must_use]
    pub const fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn checker(&self) -> &Checker {
        &self.checker
    }

    /// Expand `paths` into the list of checkable files. Directories are
    /// walked recursively, skipping excluded directory names; explicitly
    /// named files are kept whatever their extension.
    pub fn collect_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for path in paths {
            let path = path.as_ref();
            if path.is_file() {
                files.push(path.to_path_buf());
            } else if path.is_dir() {
                let walker = WalkDir::new(path)
                    .follow_links(false)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_entry(|e| {
                        e.depth() == 0
                            || !e.file_type().is_dir()
                            || !self.config.is_excluded_dir(&e.file_name().to_string_lossy())
                    });

                for entry in walker {
                    match entry {
                        Ok(entry) => {
                            let checkable = entry.file_type().is_file()
                                && SourceKind::from_path(entry.path()).is_some();
                            if checkable {
                                files.push(entry.into_path());
                            }
                        }
                        Err(e) => warn!("Failed to access directory entry: {}", e),
                    }
                }
            } else {
                return Err(CompatError::path_not_found(path));
            }
        }

        debug!("Collected {} files to check", files.len());
        Ok(files)
    }

    /// Check one file. Failures become a failed result instead of an error.
    pub fn scan_file<P: AsRef<Path>>(&self, path: P) -> FileResult {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        match self.analyze_file(path) {
            Ok(analysis) => {
                debug!("Checked {}: {} issues", path_str, analysis.issues.len());
                FileResult::analyzed(path_str, analysis)
            }
            Err(e) => {
                if e.is_recoverable() {
                    debug!("Recoverable error checking {}: {}", path_str, e);
                } else {
                    warn!("Non-recoverable error checking {}: {}", path_str, e);
                }
                FileResult::failed(path_str, e.to_string())
            }
        }
    }

    /// Read and check one file under the size limit and per-file timeout
    pub fn analyze_file(&self, path: &Path) -> Result<FileAnalysis> {
        let Some(kind) = SourceKind::from_path(path) else {
            let reason = format!("unsupported file type: {}", path.display());
            return Err(CompatError::validation("path", reason));
        };

        let metadata = fs::metadata(path)?;
        if let Err(e) = validation::validate_file_size(metadata.len(), self.config.max_file_size) {
            info!(
                "Skipping oversized file {}: {} bytes (limit: {})",
                path.display(),
                metadata.len(),
                self.config.max_file_size
            );
            return Err(e);
        }

        let source = fs::read_to_string(path)?;
        self.check_with_timeout(source, kind)
    }

    fn check_with_timeout(&self, source: String, kind: SourceKind) -> Result<FileAnalysis> {
        let timeout = self.config.file_timeout();
        let checker = self.checker.clone();
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            let result = checker.check_source(&source, kind);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(CompatError::Timeout {
                secs: self.config.file_timeout_secs,
            }),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(CompatError::Io(
                std::io::Error::other("analysis worker exited without a result"),
            )),
        }
    }

    /// Check every file under `paths` and aggregate the results
    pub fn scan_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Result<AggregateReport> {
        self.scan_paths_with_progress(paths, |_| {})
    }

    /// Like [`Scanner::scan_paths`], calling `on_result` as each file finishes
    pub fn scan_paths_with_progress<P, F>(
        &self,
        paths: &[P],
        on_result: F,
    ) -> Result<AggregateReport>
    where
        P: AsRef<Path>,
        F: Fn(&FileResult) + Sync,
    {
        let files = self.collect_files(paths)?;
        let start = Instant::now();
        info!(
            "Checking {} files in batches of {}",
            files.len(),
            self.config.batch_size
        );

        let mut results = Vec::with_capacity(files.len());
        for batch in files.chunks(self.config.batch_size) {
            let batch_results: Vec<FileResult> = batch
                .par_iter()
                .map(|path| {
                    let result = self.scan_file(path);
                    on_result(&result);
                    result
                })
                .collect();
            results.extend(batch_results);
        }

        let report = AggregateReport::new(results);
        info!(
            "Checked {} files in {:?}: {} failed, score {:?}",
            report.results.len(),
            start.elapsed(),
            report.failed_files(),
            report.score
        );
        Ok(report)
    }
}
