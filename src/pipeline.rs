use crate::{
    config::Config,
    error::Result,
    processor::{FileProcessor, ProcessResult},
    resolver::PathResolver,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Resolves the configured patterns and checks the matched files.
pub struct Pipeline {
    config: Config,
    resolver: PathResolver,
    processor: FileProcessor,
}

impl Pipeline {
    /// Creates a new pipeline with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - The root directory cannot be made absolute
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let resolver = PathResolver::new(&config.root_dir)?;
        let processor = FileProcessor::new(&config);

        Ok(Self {
            config,
            resolver,
            processor,
        })
    }

    /// Returns the configuration this pipeline runs with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the absolute directory relative patterns were resolved against.
    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        self.resolver.root()
    }

    /// Executes the pipeline.
    ///
    /// # Process
    ///
    /// 1. **Resolve**: Expands glob patterns into an ordered path list
    /// 2. **Count**: Tokenizes each file and applies the limit
    ///
    /// Exceeding the limit is not an error; check [`ProcessResult::limit_exceeded`].
    ///
    /// # Errors
    ///
    /// Returns an error if pattern resolution or any file fails.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use token_gate::{Config, Pipeline};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::builder()
    ///     .pattern("**/*.md")
    ///     .build()?;
    ///
    /// let result = Pipeline::new(config)?.run()?;
    /// println!("{} tokens", result.total_tokens);
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self), fields(mode = %self.config.mode, encoding = %self.config.encoding))]
    pub fn run(&self) -> Result<ProcessResult> {
        let start_time = Instant::now();

        let paths = self.resolve()?;
        if paths.is_empty() {
            warn!(
                "No files matched the provided patterns: {}",
                self.config.patterns.join(", ")
            );
        }

        let count_start = Instant::now();
        let result = self.processor.process(&paths)?;

        info!(
            "✓ Counted {} tokens across {} file(s) in {:.2}s",
            result.total_tokens,
            result.file_count(),
            count_start.elapsed().as_secs_f64()
        );

        info!(
            "✓ Pipeline completed in {:.2}s",
            start_time.elapsed().as_secs_f64()
        );

        Ok(result)
    }

    fn resolve(&self) -> Result<Vec<PathBuf>> {
        let start = Instant::now();
        let paths = self.resolver.resolve(&self.config.patterns)?;

        info!(
            "✓ Resolved {} path(s) in {:.2}s",
            paths.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limit::LimitMode;
    use assert_fs::prelude::*;

    #[test]
    fn test_pipeline_total_mode() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.md").write_str("Hello world").unwrap();
        temp.child("b.md").write_str("Goodbye world").unwrap();
        temp.child("skip.txt").write_str("not matched").unwrap();

        let config = Config::builder()
            .root_dir(temp.path())
            .pattern("*.md")
            .max_tokens(50_000)
            .build()
            .unwrap();

        let result = Pipeline::new(config).unwrap().run().unwrap();

        assert_eq!(result.file_count(), 2);
        assert!(result.total_tokens > 0);
        assert!(!result.limit_exceeded);
    }

    #[test]
    fn test_pipeline_per_file_mode() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("small.md").write_str("Hi").unwrap();
        temp.child("large.md").write_str(&"word ".repeat(500)).unwrap();

        let config = Config::builder()
            .root_dir(temp.path())
            .pattern("**/*.md")
            .max_tokens(10)
            .mode(LimitMode::PerFile)
            .build()
            .unwrap();

        let pipeline = Pipeline::new(config).unwrap();
        let result = pipeline.run().unwrap();

        assert!(result.limit_exceeded);
        assert_eq!(result.files_over_limit, vec![pipeline.root().join("large.md")]);
    }

    #[test]
    fn test_pipeline_no_matches() {
        let temp = assert_fs::TempDir::new().unwrap();

        let config = Config::builder()
            .root_dir(temp.path())
            .pattern("*.md")
            .max_tokens(0)
            .build()
            .unwrap();

        let result = Pipeline::new(config).unwrap().run().unwrap();

        assert_eq!(result, ProcessResult::default());
    }
}
