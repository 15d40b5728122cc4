use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tiktoken_rs::CoreBPE;

/// Byte-pair encoding schemes supported for counting.
///
/// The set is closed: anything else is rejected while the configuration is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Encoding {
    /// `cl100k_base` (GPT-4, GPT-3.5-turbo)
    #[default]
    #[serde(rename = "cl100k_base")]
    Cl100kBase,
    /// `o200k_base` (GPT-4o)
    #[serde(rename = "o200k_base")]
    O200kBase,
    /// `p50k_base` (Codex, text-davinci-002/003)
    #[serde(rename = "p50k_base")]
    P50kBase,
    /// `p50k_edit` (edit models)
    #[serde(rename = "p50k_edit")]
    P50kEdit,
    /// `r50k_base` (GPT-3)
    #[serde(rename = "r50k_base")]
    R50kBase,
}

impl Encoding {
    /// All supported encodings, in the order they are listed to users.
    pub const ALL: [Self; 5] = [
        Self::Cl100kBase,
        Self::O200kBase,
        Self::P50kBase,
        Self::P50kEdit,
        Self::R50kBase,
    ];

    /// Returns the identifier of this encoding.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cl100kBase => "cl100k_base",
            Self::O200kBase => "o200k_base",
            Self::P50kBase => "p50k_base",
            Self::P50kEdit => "p50k_edit",
            Self::R50kBase => "r50k_base",
        }
    }

    /// Loads the vocabulary for this encoding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tokenizer`] if the vocabulary cannot be built.
    pub fn load(self) -> Result<BpeTokenizer> {
        let loaded = match self {
            Self::Cl100kBase => tiktoken_rs::cl100k_base(),
            Self::O200kBase => tiktoken_rs::o200k_base(),
            Self::P50kBase => tiktoken_rs::p50k_base(),
            Self::P50kEdit => tiktoken_rs::p50k_edit(),
            Self::R50kBase => tiktoken_rs::r50k_base(),
        };

        let bpe = loaded.map_err(|e| Error::tokenizer(self.as_str(), e.to_string()))?;
        Ok(BpeTokenizer {
            encoding: self,
            bpe: Some(bpe),
        })
    }

    /// Loads this encoding behind the [`Tokenizer`] trait.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tokenizer`] if the vocabulary cannot be built.
    pub fn create(self) -> Result<Box<dyn Tokenizer>> {
        Ok(Box::new(self.load()?))
    }

    fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|e| e.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| {
                Error::config(format!(
                    "Invalid encoding: \"{s}\". Must be one of: {}",
                    Self::supported_list()
                ))
            })
    }
}

/// Counts tokens in decoded text.
///
/// This is the seam to the tokenization capability: the processing core only ever
/// asks for a count and never inspects token values.
pub trait Tokenizer: Send + Sync {
    /// Returns the number of tokens in `text`.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheme cannot tokenize the text.
    fn count(&self, text: &str) -> Result<usize>;

    /// Identifier of the scheme, used in log lines and errors.
    fn name(&self) -> &str;

    /// Frees scheme-specific resources such as vocabulary tables.
    ///
    /// Called exactly once by [`TokenCounter`](crate::TokenCounter) when a run ends.
    fn release(&mut self) {}
}

/// tiktoken-backed tokenizer for one [`Encoding`].
pub struct BpeTokenizer {
    encoding: Encoding,
    bpe: Option<CoreBPE>,
}

impl fmt::Debug for BpeTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BpeTokenizer")
            .field("encoding", &self.encoding)
            .field("loaded", &self.bpe.is_some())
            .finish()
    }
}

impl Tokenizer for BpeTokenizer {
    fn count(&self, text: &str) -> Result<usize> {
        let bpe = self
            .bpe
            .as_ref()
            .ok_or_else(|| Error::tokenizer(self.encoding.as_str(), "tokenizer has been released"))?;

        if text.is_empty() {
            return Ok(0);
        }

        Ok(bpe.encode_ordinary(text).len())
    }

    fn name(&self) -> &str {
        self.encoding.as_str()
    }

    fn release(&mut self) {
        self.bpe = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("cl100k_base".parse::<Encoding>().unwrap(), Encoding::Cl100kBase);
        assert_eq!("o200k_base".parse::<Encoding>().unwrap(), Encoding::O200kBase);
        assert_eq!("p50k_edit".parse::<Encoding>().unwrap(), Encoding::P50kEdit);
        assert_eq!("r50k_base".parse::<Encoding>().unwrap(), Encoding::R50kBase);
    }

    #[test]
    fn test_encoding_rejects_unknown() {
        let err = "fake_encoding".parse::<Encoding>().unwrap_err();
        assert!(err.is_config());
        let text = err.to_string();
        assert!(text.contains("Invalid encoding"));
        assert!(text.contains("cl100k_base, o200k_base, p50k_base, p50k_edit, r50k_base"));
    }

    #[test]
    fn test_encoding_display_round_trips() {
        for encoding in Encoding::ALL {
            assert_eq!(encoding.to_string().parse::<Encoding>().unwrap(), encoding);
        }
    }

    #[test]
    fn test_count_plain_text() {
        let tokenizer = Encoding::Cl100kBase.load().unwrap();
        let count = tokenizer
            .count("Hello world, this is a test of token counting.")
            .unwrap();
        assert!(count > 0 && count < 20);
    }

    #[test]
    fn test_count_empty() {
        let tokenizer = Encoding::Cl100kBase.load().unwrap();
        assert_eq!(tokenizer.count("").unwrap(), 0);
    }

    #[test]
    fn test_count_unicode() {
        let tokenizer = Encoding::O200kBase.load().unwrap();
        assert!(tokenizer.count("你好世界 🌍 こんにちは emoji: 🚀🎉").unwrap() > 0);
    }

    #[test]
    fn test_different_encodings_produce_results() {
        let text = "The quick brown fox jumps over the lazy dog.";
        for encoding in Encoding::ALL {
            let tokenizer = encoding.load().unwrap();
            assert!(tokenizer.count(text).unwrap() > 0, "{encoding}");
            assert_eq!(tokenizer.name(), encoding.as_str());
        }
    }

    #[test]
    fn test_special_token_text_counts_as_ordinary_text() {
        let tokenizer = Encoding::Cl100kBase.load().unwrap();
        let count = tokenizer.count("<|endoftext|>").unwrap();
        assert!(count > 1);
        assert!(tokenizer.count("before <|endoftext|> after").unwrap() > count);
    }

    #[test]
    fn test_count_after_release_fails() {
        let mut tokenizer = Encoding::Cl100kBase.load().unwrap();
        tokenizer.release();
        let err = tokenizer.count("hello").unwrap_err();
        assert!(err.to_string().contains("released"));
    }
}
