//! File processing: turns a resolved path list into a token accounting and a verdict.

use crate::config::Config;
use crate::counter::TokenCounter;
use crate::error::{Error, Result};
use crate::limit::{LimitMode, limit_exceeded};
use crate::token::Encoding;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Token count for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileResult {
    /// Path as supplied by the resolver
    pub path: PathBuf,

    /// Number of tokens (0 for binary files)
    pub tokens: usize,

    /// True only in per-file mode when `tokens` exceeds the limit
    pub over_limit: bool,
}

/// Outcome of a processing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessResult {
    /// One entry per regular file, in input order
    pub files: Vec<FileResult>,

    /// Sum of `tokens` over `files`
    pub total_tokens: usize,

    /// Paths flagged as over the per-file limit, in input order
    pub files_over_limit: Vec<PathBuf>,

    /// Final verdict
    pub limit_exceeded: bool,
}

impl ProcessResult {
    /// Number of files counted.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Returns true if the run stayed within its limit.
    #[must_use]
    pub const fn passed(&self) -> bool {
        !self.limit_exceeded
    }
}

/// Drives a [`TokenCounter`] over a list of paths.
#[derive(Debug, Clone, Copy)]
pub struct FileProcessor {
    max_tokens: usize,
    mode: LimitMode,
    encoding: Encoding,
}

impl FileProcessor {
    /// Creates a processor from configuration.
    #[must_use]
    pub const fn new(config: &Config) -> Self {
        Self {
            max_tokens: config.max_tokens,
            mode: config.mode,
            encoding: config.encoding,
        }
    }

    /// Creates a processor from its individual settings.
    #[must_use]
    pub const fn with_limit(max_tokens: usize, mode: LimitMode, encoding: Encoding) -> Self {
        Self {
            max_tokens,
            mode,
            encoding,
        }
    }

    /// Counts tokens for every file in `paths` using the configured encoding.
    ///
    /// # Errors
    ///
    /// See [`FileProcessor::process_with`]; additionally fails if the encoding
    /// cannot be loaded.
    pub fn process<P: AsRef<Path>>(&self, paths: &[P]) -> Result<ProcessResult> {
        let counter = TokenCounter::for_encoding(self.encoding)?;
        self.process_with(paths, counter)
    }

    /// Counts tokens for every file in `paths` with the given counter.
    ///
    /// Paths are handled one at a time in the given order. Directories are skipped.
    /// The counter is released before this returns, whether or not processing succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error, and no partial result, if:
    /// - A path cannot be statted (e.g. it no longer exists)
    /// - A file cannot be read or decoded as UTF-8
    /// - The tokenizer fails
    pub fn process_with<P: AsRef<Path>>(
        &self,
        paths: &[P],
        counter: TokenCounter,
    ) -> Result<ProcessResult> {
        let outcome = self.tally(paths, &counter);
        counter.release();

        let tally = outcome?;
        Ok(tally.finish(self.mode, self.max_tokens))
    }

    fn tally<P: AsRef<Path>>(&self, paths: &[P], counter: &TokenCounter) -> Result<Tally> {
        let mut tally = Tally::default();

        for path in paths {
            let path = path.as_ref();
            let metadata = fs::metadata(path).map_err(|e| Error::io(path, e))?;

            if metadata.is_dir() {
                debug!("Skipping directory: {}", path.display());
                continue;
            }

            let tokens = counter.count_file(path)?;
            let over_limit = self.mode.file_over_limit(tokens, self.max_tokens);
            debug!(
                "{}: {} tokens{}",
                path.display(),
                tokens,
                if over_limit { " (over limit)" } else { "" }
            );

            tally.push(FileResult {
                path: path.to_path_buf(),
                tokens,
                over_limit,
            });
        }

        Ok(tally)
    }
}

/// Running aggregate for one processing run.
#[derive(Debug, Default)]
struct Tally {
    files: Vec<FileResult>,
    total_tokens: usize,
    files_over_limit: Vec<PathBuf>,
}

impl Tally {
    fn push(&mut self, file: FileResult) {
        if file.over_limit {
            self.files_over_limit.push(file.path.clone());
        }
        self.total_tokens += file.tokens;
        self.files.push(file);
    }

    fn finish(self, mode: LimitMode, max_tokens: usize) -> ProcessResult {
        let limit_exceeded =
            limit_exceeded(mode, max_tokens, self.total_tokens, &self.files_over_limit);

        ProcessResult {
            files: self.files,
            total_tokens: self.total_tokens,
            files_over_limit: self.files_over_limit,
            limit_exceeded,
        }
    }
}

/// Counts tokens for `paths` under `config`.
///
/// # Errors
///
/// See [`FileProcessor::process`].
pub fn process_files<P: AsRef<Path>>(paths: &[P], config: &Config) -> Result<ProcessResult> {
    FileProcessor::new(config).process(paths)
}
