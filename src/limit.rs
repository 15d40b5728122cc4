//! Limit evaluation: turns per-file accounting into a pass/fail verdict.

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// How token counts are compared against the configured limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitMode {
    /// The sum over all files is compared against the limit.
    #[default]
    Total,
    /// Every file is compared against the limit on its own.
    PerFile,
}

impl LimitMode {
    /// Returns the configuration name of this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Total => "total",
            Self::PerFile => "per_file",
        }
    }

    /// Returns true when a single file with `count` tokens breaches `max_tokens`.
    ///
    /// Always false in [`LimitMode::Total`].
    #[must_use]
    pub const fn file_over_limit(self, count: usize, max_tokens: usize) -> bool {
        matches!(self, Self::PerFile) && count > max_tokens
    }
}

impl fmt::Display for LimitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LimitMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "total" => Ok(Self::Total),
            "per_file" => Ok(Self::PerFile),
            other => Err(Error::config(format!(
                "Invalid token_limit_mode: \"{other}\". Must be \"total\" or \"per_file\""
            ))),
        }
    }
}

/// Computes the final verdict for a run.
///
/// In total mode the run fails when the summed count strictly exceeds the limit;
/// in per-file mode it fails when at least one file was flagged.
#[must_use]
pub fn limit_exceeded<T>(
    mode: LimitMode,
    max_tokens: usize,
    total_tokens: usize,
    files_over_limit: &[T],
) -> bool {
    match mode {
        LimitMode::Total => total_tokens > max_tokens,
        LimitMode::PerFile => !files_over_limit.is_empty(),
    }
}
