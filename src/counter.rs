//! Per-file token counting.

use crate::binary::is_binary;
use crate::error::{Error, Result};
use crate::token::{Encoding, Tokenizer};
use std::fs;
use std::path::Path;
use tracing::{trace, warn};

/// Counts tokens in files with a single tokenizer held for the whole run.
///
/// The tokenizer is acquired once and released exactly once: either explicitly through
/// [`TokenCounter::release`] or, failing that, when the counter is dropped.
pub struct TokenCounter {
    tokenizer: Box<dyn Tokenizer>,
    released: bool,
}

impl TokenCounter {
    /// Wraps an already-acquired tokenizer.
    #[must_use]
    pub fn new(tokenizer: Box<dyn Tokenizer>) -> Self {
        Self {
            tokenizer,
            released: false,
        }
    }

    /// Loads the vocabulary for `encoding` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tokenizer`] if the encoding cannot be loaded.
    pub fn for_encoding(encoding: Encoding) -> Result<Self> {
        Ok(Self::new(encoding.create()?))
    }

    /// Returns the name of the underlying tokenizer.
    #[must_use]
    pub fn encoding_name(&self) -> &str {
        self.tokenizer.name()
    }

    /// Counts the tokens in the file at `path`.
    ///
    /// Files whose first 8 KiB contain a NUL byte are reported as 0 tokens with a
    /// warning instead of failing the run.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The content is not valid UTF-8
    /// - The tokenizer fails
    pub fn count_file(&self, path: &Path) -> Result<usize> {
        let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;

        if is_binary(&bytes) {
            warn!("Skipping binary file: {}", path.display());
            return Ok(0);
        }

        let text = std::str::from_utf8(&bytes).map_err(|e| Error::invalid_utf8(path, &e))?;
        let count = self
            .tokenizer
            .count(text)
            .map_err(|e| Error::tokenization(path, &e))?;

        trace!("{}: {} tokens ({})", path.display(), count, self.tokenizer.name());
        Ok(count)
    }

    /// Releases the tokenizer's resources and consumes the counter.
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.tokenizer.release();
        }
    }
}

impl Drop for TokenCounter {
    fn drop(&mut self) {
        self.release_once();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct WordTokenizer {
        releases: Arc<AtomicUsize>,
    }

    impl Tokenizer for WordTokenizer {
        fn count(&self, text: &str) -> Result<usize> {
            Ok(text.split_whitespace().count())
        }

        fn name(&self) -> &str {
            "words"
        }

        fn release(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn word_counter() -> (TokenCounter, Arc<AtomicUsize>) {
        let releases = Arc::new(AtomicUsize::new(0));
        let counter = TokenCounter::new(Box::new(WordTokenizer {
            releases: Arc::clone(&releases),
        }));
        (counter, releases)
    }

    #[test]
    fn test_counts_text_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("plain.txt");
        file.write_str("one two three").unwrap();

        let (counter, _) = word_counter();
        assert_eq!(counter.count_file(file.path()).unwrap(), 3);
    }

    #[test]
    fn test_empty_file_is_zero() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("empty.txt");
        file.touch().unwrap();

        let (counter, _) = word_counter();
        assert_eq!(counter.count_file(file.path()).unwrap(), 0);
    }

    #[test]
    fn test_binary_file_is_zero() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("image.png");
        file.write_binary(&[0x89, b'P', b'N', b'G', 0x00, b'a', b' ', b'b'])
            .unwrap();

        let (counter, _) = word_counter();
        assert_eq!(counter.count_file(file.path()).unwrap(), 0);
    }

    #[test]
    fn test_invalid_utf8_is_fatal() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("latin1.txt");
        file.write_binary(&[b'c', b'a', b'f', 0xe9]).unwrap();

        let (counter, _) = word_counter();
        let err = counter.count_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidUtf8 { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp = assert_fs::TempDir::new().unwrap();
        let (counter, _) = word_counter();
        let err = counter
            .count_file(&temp.path().join("missing.txt"))
            .unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_repeated_counts_do_not_release() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("a.txt");
        file.write_str("a b").unwrap();

        let (counter, releases) = word_counter();
        for _ in 0..3 {
            assert_eq!(counter.count_file(file.path()).unwrap(), 2);
        }
        assert_eq!(releases.load(Ordering::SeqCst), 0);

        counter.release();
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases_once() {
        let (counter, releases) = word_counter();
        drop(counter);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_real_encoding() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("enc.md");
        file.write_str("Testing with o200k_base encoding").unwrap();

        let counter = TokenCounter::for_encoding(Encoding::O200kBase).unwrap();
        assert_eq!(counter.encoding_name(), "o200k_base");
        assert!(counter.count_file(file.path()).unwrap() > 0);
        counter.release();
    }
}
