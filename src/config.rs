use crate::error::{Error, Result};
use crate::limit::LimitMode;
use crate::token::Encoding;
use std::path::PathBuf;

/// Default token limit when none is configured.
pub const DEFAULT_MAX_TOKENS: usize = 2_500;

/// Configuration for a token check run.
///
/// Immutable once built. Use [`Config::builder()`] to construct one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Config {
    /// Glob patterns selecting the files to check, in priority order
    pub patterns: Vec<String>,

    /// Directory relative patterns are anchored at
    pub root_dir: PathBuf,

    /// Token limit, applied to the total or to each file depending on `mode`
    pub max_tokens: usize,

    /// Aggregation policy
    pub mode: LimitMode,

    /// Tokenization scheme
    pub encoding: Encoding,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use token_gate::{Config, LimitMode};
    ///
    /// let config = Config::builder()
    ///     .pattern("**/*.md")
    ///     .max_tokens(10_000)
    ///     .mode(LimitMode::PerFile)
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No patterns are configured
    /// - Root directory doesn't exist or is not a directory
    pub fn validate(&self) -> Result<()> {
        if self.patterns.is_empty() {
            return Err(Error::config("At least one glob pattern is required"));
        }

        if !self.root_dir.exists() {
            return Err(Error::config(format!(
                "Root directory does not exist: {}",
                self.root_dir.display()
            )));
        }

        if !self.root_dir.is_dir() {
            return Err(Error::config(format!(
                "Root path is not a directory: {}",
                self.root_dir.display()
            )));
        }

        Ok(())
    }
}

/// Splits a multi-line pattern input into individual patterns.
///
/// Lines are trimmed and blank lines dropped.
#[must_use]
pub fn split_patterns(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parses a token limit given as text.
///
/// # Errors
///
/// Returns a configuration error for anything that is not a non-negative integer.
pub fn parse_max_tokens(input: &str) -> Result<usize> {
    input
        .trim()
        .parse::<usize>()
        .map_err(|_| Error::config("Invalid max_tokens value: must be a non-negative integer"))
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    patterns: Vec<String>,
    root_dir: Option<PathBuf>,
    max_tokens: Option<usize>,
    mode: Option<LimitMode>,
    encoding: Option<Encoding>,
}

impl ConfigBuilder {
    /// Adds one glob pattern.
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    /// Adds several glob patterns, keeping their order.
    #[must_use]
    pub fn patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Sets the directory relative patterns are resolved against.
    #[must_use]
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(path.into());
        self
    }

    /// Sets the token limit.
    #[must_use]
    pub fn max_tokens(mut self, tokens: usize) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Sets the aggregation policy.
    #[must_use]
    pub fn mode(mut self, mode: LimitMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Sets the tokenization scheme.
    #[must_use]
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let config = Config {
            patterns: self.patterns,
            root_dir: self.root_dir.unwrap_or_else(|| PathBuf::from(".")),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            mode: self.mode.unwrap_or_default(),
            encoding: self.encoding.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = Config::builder()
            .root_dir(temp.path())
            .pattern("*.md")
            .build()
            .unwrap();

        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.mode, LimitMode::Total);
        assert_eq!(config.encoding, Encoding::Cl100kBase);
        assert_eq!(config.patterns, vec!["*.md".to_string()]);
    }

    #[test]
    fn test_patterns_keep_order() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = Config::builder()
            .root_dir(temp.path())
            .pattern("b/*.md")
            .patterns(["a/*.md", "!a/skip.md"])
            .build()
            .unwrap();

        assert_eq!(config.patterns, vec!["b/*.md", "a/*.md", "!a/skip.md"]);
    }

    #[test]
    fn test_requires_patterns() {
        let temp = assert_fs::TempDir::new().unwrap();
        let result = Config::builder().root_dir(temp.path()).build();

        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_invalid_root_dir() {
        let result = Config::builder()
            .pattern("*.md")
            .root_dir("/nonexistent/path/that/should/not/exist")
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_parse_max_tokens() {
        assert_eq!(parse_max_tokens("2500").unwrap(), 2_500);
        assert_eq!(parse_max_tokens(" 0 ").unwrap(), 0);

        for bad in ["abc", "-5", "", "1.5"] {
            let err = parse_max_tokens(bad).unwrap_err();
            assert!(
                err.to_string().contains("Invalid max_tokens"),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_split_patterns() {
        let patterns = split_patterns("  docs/**/*.md\n\nCLAUDE.md  \n   \n");
        assert_eq!(patterns, vec!["docs/**/*.md", "CLAUDE.md"]);
        assert!(split_patterns("").is_empty());
    }
}
