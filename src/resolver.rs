//! Glob pattern resolution.
//!
//! Expands the configured patterns into a concrete, deduplicated list of paths.
//! Patterns follow the GitHub Actions glob conventions:
//!
//! - one pattern per entry, surrounding whitespace ignored
//! - `#` starts a comment line, blank entries are skipped
//! - a leading `!` excludes whatever the rest of the pattern matches
//! - a pattern matching a directory also matches everything below it
//! - when several patterns match a path, the last one decides
//! - relative patterns are anchored at the root directory
//!
//! Both files and directories can match; deciding what to count is left to the processor.

use crate::config::Config;
use crate::error::{Error, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Resolves glob patterns relative to a root directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

/// Where to start walking for one include pattern.
struct Include {
    base: PathBuf,
    /// Depth below `base` the pattern itself can reach; `None` when it contains `**`.
    max_depth: Option<usize>,
}

/// One compiled pattern: matches the pattern itself and everything below a match.
struct Rule {
    negate: bool,
    matcher: GlobSet,
}

/// Compiled patterns in input order.
struct Rules(Vec<Rule>);

impl Rules {
    /// Returns true if the last pattern matching `path` is an include.
    fn accepts(&self, path: &Path) -> bool {
        self.0.iter().fold(false, |accepted, rule| {
            if rule.matcher.is_match(path) {
                !rule.negate
            } else {
                accepted
            }
        })
    }

    fn expand(&self, include: &Include) -> Result<Vec<PathBuf>> {
        let base = &include.base;
        if !base.exists() {
            trace!("Pattern base does not exist: {}", base.display());
            return Ok(Vec::new());
        }

        // Entries past the pattern's own depth are only reachable below an accepted directory.
        let walker = WalkDir::new(base)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                include.max_depth.is_none_or(|max| entry.depth() <= max)
                    || self.accepts(entry.path())
            });

        let mut matched = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(base).to_path_buf();
                    let broken_link = err
                        .io_error()
                        .is_some_and(|e| e.kind() == io::ErrorKind::NotFound);

                    if broken_link || !self.accepts(&path) {
                        debug!("Skipping unreadable entry {}: {}", path.display(), err);
                        continue;
                    }
                    return Err(Error::io(path, err.into()));
                }
            };

            if self.accepts(entry.path()) {
                matched.push(entry.into_path());
            } else {
                trace!("Not selected: {}", entry.path().display());
            }
        }
        Ok(matched)
    }
}

/// Pattern split into its literal directory prefix and the glob remainder.
struct Anchored {
    base: PathBuf,
    tail: Vec<String>,
}

impl Anchored {
    /// Full glob text with the literal prefix escaped.
    fn glob_text(&self) -> String {
        let mut text = globset::escape(&path_text(&self.base));
        for segment in &self.tail {
            if !text.ends_with('/') {
                text.push('/');
            }
            text.push_str(segment);
        }
        text
    }

    fn max_depth(&self) -> Option<usize> {
        if self.tail.iter().any(|s| s.contains("**")) {
            None
        } else {
            Some(self.tail.len())
        }
    }
}

impl PathResolver {
    /// Creates a resolver anchored at `root`.
    ///
    /// A relative root is taken relative to the current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let absolute = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| Error::io(root, e))?
                .join(root)
        };

        Ok(Self {
            root: normalize(&absolute),
        })
    }

    /// Returns the absolute root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Expands `patterns` into paths.
    ///
    /// Results are ordered by pattern, then lexicographically within a pattern.
    /// A path matched by several patterns keeps its first position. Broken symlinks
    /// and unreadable entries that no pattern selects are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A pattern has invalid glob syntax
    /// - A selected entry cannot be read while walking
    pub fn resolve<S: AsRef<str>>(&self, patterns: &[S]) -> Result<Vec<PathBuf>> {
        let mut rules = Vec::new();
        let mut includes = Vec::new();

        for raw in patterns {
            let line = raw.as_ref().trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (negate, pattern) = match line.strip_prefix('!') {
                Some(rest) => (true, rest.trim()),
                None => (false, line),
            };

            let anchored = self.anchor(pattern);
            rules.push(Rule {
                negate,
                matcher: build_matcher(line, &anchored.glob_text())?,
            });

            if !negate {
                includes.push(Include {
                    max_depth: anchored.max_depth(),
                    base: anchored.base,
                });
            }
        }

        let rules = Rules(rules);
        let mut seen = HashSet::new();
        let mut paths = Vec::new();
        for include in &includes {
            for path in rules.expand(include)? {
                if seen.insert(path.clone()) {
                    paths.push(path);
                }
            }
        }

        debug!("Resolved {} path(s) from {} pattern(s)", paths.len(), rules.0.len());
        Ok(paths)
    }

    fn anchor(&self, pattern: &str) -> Anchored {
        let mut base = if pattern.starts_with('/') {
            PathBuf::from("/")
        } else {
            self.root.clone()
        };

        let mut segments = pattern
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .peekable();

        while let Some(segment) = segments.next_if(|s| !has_glob_syntax(s)) {
            base.push(segment);
        }

        Anchored {
            base: normalize(&base),
            tail: segments.map(ToString::to_string).collect(),
        }
    }
}

/// Resolves the patterns of `config` against its root directory.
///
/// # Errors
///
/// See [`PathResolver::resolve`].
pub fn resolve_patterns(config: &Config) -> Result<Vec<PathBuf>> {
    PathResolver::new(&config.root_dir)?.resolve(&config.patterns)
}

/// Compiles `text` together with its `text/**` descendant form.
fn build_matcher(pattern: &str, text: &str) -> Result<GlobSet> {
    let descendants = if text.ends_with('/') {
        format!("{text}**")
    } else {
        format!("{text}/**")
    };

    let mut set = GlobSetBuilder::new();
    for glob_text in [text, descendants.as_str()] {
        let glob = GlobBuilder::new(glob_text)
            .literal_separator(true)
            .build()
            .map_err(|e| Error::invalid_pattern(pattern, e.kind().to_string()))?;
        set.add(glob);
    }

    set.build()
        .map_err(|e| Error::invalid_pattern(pattern, e.to_string()))
}

fn has_glob_syntax(segment: &str) -> bool {
    segment.contains(['*', '?', '[', ']', '{', '}'])
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Lexically removes `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
