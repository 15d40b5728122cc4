//! # token-gate
//!
//! Enforces a token budget over files selected by glob patterns. Intended as a gate
//! in CI pipelines, e.g. to keep agent context files from growing past a limit.
//!
//! ## Quick Start
//!
//! ```no_run
//! use token_gate::{Config, LimitMode, Pipeline};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .pattern("**/*.md")
//!     .max_tokens(2_500)
//!     .mode(LimitMode::PerFile)
//!     .build()?;
//!
//! let result = Pipeline::new(config)?.run()?;
//! if result.limit_exceeded {
//!     eprintln!("{} file(s) over budget", result.files_over_limit.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Resolver**: Expands glob patterns into an ordered, deduplicated path list
//! 2. **Processor**: Counts tokens per file, skipping directories and binary content
//! 3. **Limit**: Applies the `total` or `per_file` policy to produce a verdict
//! 4. **Report**: Renders the result as a table, a Markdown summary, or CI outputs

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod binary;
mod config;
mod counter;
mod error;
mod limit;
mod pipeline;
mod processor;
mod resolver;
mod token;

pub mod report;

pub use binary::{BINARY_CHECK_SIZE, is_binary};
pub use config::{Config, ConfigBuilder, DEFAULT_MAX_TOKENS, parse_max_tokens, split_patterns};
pub use counter::TokenCounter;
pub use error::{Error, Result};
pub use limit::{LimitMode, limit_exceeded};
pub use pipeline::Pipeline;
pub use processor::{FileProcessor, FileResult, ProcessResult, process_files};
pub use report::Report;
pub use resolver::{PathResolver, resolve_patterns};
pub use token::{BpeTokenizer, Encoding, Tokenizer};

/// Resolves the configured patterns and checks every matched file.
///
/// This is the main entry point for the library.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - A pattern cannot be compiled
/// - A matched path cannot be statted or read
/// - File content is not valid UTF-8 or cannot be tokenized
///
/// # Examples
///
/// ```no_run
/// use token_gate::{Config, run};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = Config::builder()
///     .pattern("CLAUDE.md")
///     .build()?;
///
/// let result = run(config)?;
/// assert!(result.passed());
/// # Ok(())
/// # }
/// ```
pub fn run(config: Config) -> Result<ProcessResult> {
    Pipeline::new(config)?.run()
}
