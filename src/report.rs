//! Rendering of a [`ProcessResult`] for people and CI systems.
//!
//! The core only returns structured data; every user-facing string is built here.

use crate::{
    config::Config,
    error::{Error, Result},
    limit::LimitMode,
    processor::ProcessResult,
};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tera::{Context, Tera, Value};
use tracing::debug;

const SUMMARY_TEMPLATE: &str = "summary.md";
const RULE_WIDTH: usize = 60;

#[derive(Serialize)]
struct SummaryContext<'a> {
    files: Vec<FileRow>,
    file_count: usize,
    total_tokens: String,
    limit_exceeded: bool,
    mode: &'a str,
    limit: String,
    encoding: &'a str,
}

#[derive(Serialize)]
struct FileRow {
    path: String,
    tokens: String,
    over_limit: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    mode: LimitMode,
    max_tokens: usize,
    encoding: &'a str,
    #[serde(flatten)]
    result: &'a ProcessResult,
}

/// Formats `n` with `,` as the thousands separator.
#[must_use]
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// View of one run's result, with paths shown relative to `base_dir`.
pub struct Report<'a> {
    result: &'a ProcessResult,
    config: &'a Config,
    base_dir: PathBuf,
}

impl<'a> Report<'a> {
    /// Creates a report for `result`.
    #[must_use]
    pub fn new(result: &'a ProcessResult, config: &'a Config, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            result,
            config,
            base_dir: base_dir.into(),
        }
    }

    fn relative(&self, path: &Path) -> String {
        pathdiff::diff_paths(path, &self.base_dir)
            .unwrap_or_else(|| path.to_path_buf())
            .to_string_lossy()
            .into_owned()
    }

    /// Renders the plain-text per-file table.
    #[must_use]
    pub fn table(&self) -> String {
        let rule = "─".repeat(RULE_WIDTH);
        let mut lines = vec![String::new(), "File Token Counts".to_string(), rule.clone()];

        for file in &self.result.files {
            lines.push(format!(
                "  {}: {} tokens{}",
                self.relative(&file.path),
                format_count(file.tokens),
                if file.over_limit { " [OVER LIMIT]" } else { "" }
            ));
        }

        lines.push(rule);
        lines.push(format!(
            "  Total: {} tokens across {} file(s)",
            format_count(self.result.total_tokens),
            self.result.file_count()
        ));
        lines.push(self.settings_line());
        lines.push(String::new());

        lines.join("\n")
    }

    fn settings_line(&self) -> String {
        format!(
            "  Mode: {} | Limit: {} | Encoding: {}",
            self.config.mode,
            format_count(self.config.max_tokens),
            self.config.encoding
        )
    }

    /// Renders the Markdown job summary.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn summary_markdown(&self) -> Result<String> {
        let mut tera = Tera::default();
        tera.add_raw_template(SUMMARY_TEMPLATE, include_str!("../templates/summary.md.tera"))
            .map_err(|e| Error::template(SUMMARY_TEMPLATE, &e))?;
        tera.register_filter("md_cell", md_cell_filter);

        let context = SummaryContext {
            files: self
                .result
                .files
                .iter()
                .map(|f| FileRow {
                    path: self.relative(&f.path),
                    tokens: format_count(f.tokens),
                    over_limit: f.over_limit,
                })
                .collect(),
            file_count: self.result.file_count(),
            total_tokens: format_count(self.result.total_tokens),
            limit_exceeded: self.result.limit_exceeded,
            mode: self.config.mode.as_str(),
            limit: format_count(self.config.max_tokens),
            encoding: self.config.encoding.as_str(),
        };

        let context = Context::from_serialize(&context)
            .map_err(|e| Error::template(SUMMARY_TEMPLATE, &e))?;

        tera.render(SUMMARY_TEMPLATE, &context)
            .map_err(|e| Error::template(SUMMARY_TEMPLATE, &e))
    }

    /// Serializes the result together with the settings it was produced under.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let report = JsonReport {
            mode: self.config.mode,
            max_tokens: self.config.max_tokens,
            encoding: self.config.encoding.as_str(),
            result: self.result,
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }

    /// Returns the process outputs as `(name, value)` pairs.
    #[must_use]
    pub fn outputs(&self) -> Vec<(&'static str, String)> {
        let over_limit = self
            .result
            .files_over_limit
            .iter()
            .map(|p| self.relative(p))
            .collect::<Vec<_>>()
            .join(",");

        vec![
            ("total_tokens", self.result.total_tokens.to_string()),
            ("file_count", self.result.file_count().to_string()),
            ("files_over_limit", over_limit),
        ]
    }

    /// Returns the failure message when the limit was exceeded.
    #[must_use]
    pub fn failure_message(&self) -> Option<String> {
        if !self.result.limit_exceeded {
            return None;
        }

        let limit = format_count(self.config.max_tokens);
        Some(match self.config.mode {
            LimitMode::Total => format!(
                "Total token count ({}) exceeds limit of {}",
                format_count(self.result.total_tokens),
                limit
            ),
            LimitMode::PerFile => format!(
                "{} file(s) exceed the per-file limit of {} tokens",
                self.result.files_over_limit.len(),
                limit
            ),
        })
    }

    /// Appends the process outputs to `path` as `name=value` lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written.
    pub fn write_outputs(&self, path: &Path) -> Result<()> {
        let mut text = String::new();
        for (name, value) in self.outputs() {
            text.push_str(name);
            text.push('=');
            text.push_str(&value);
            text.push('\n');
        }

        append(path, &text)?;
        debug!("Wrote outputs to {}", path.display());
        Ok(())
    }

    /// Appends the Markdown job summary to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails or the file cannot be written.
    pub fn append_summary(&self, path: &Path) -> Result<()> {
        let summary = self.summary_markdown()?;
        append(path, &summary)?;
        debug!("Wrote job summary to {}", path.display());
        Ok(())
    }
}

fn append(path: &Path, content: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io(path, e))?;

    file.write_all(content.as_bytes())
        .map_err(|e| Error::io(path, e))
}

/// Escapes characters that would break a Markdown table cell.
fn md_cell_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    match value.as_str() {
        Some(s) => Ok(Value::String(s.replace('|', "\\|"))),
        None => Ok(value.clone()),
    }
}
