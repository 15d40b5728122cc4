//! Binary content detection.

/// Number of leading bytes inspected when classifying a file.
pub const BINARY_CHECK_SIZE: usize = 8192;

/// Returns true if `bytes` should be treated as non-text.
///
/// Only the first [`BINARY_CHECK_SIZE`] bytes are inspected; a single NUL byte in that
/// prefix marks the content as binary. Extensions and content types are never consulted,
/// so the result depends on the bytes alone.
#[must_use]
pub fn is_binary(bytes: &[u8]) -> bool {
    let prefix = &bytes[..bytes.len().min(BINARY_CHECK_SIZE)];
    memchr::memchr(0, prefix).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_binary() {
        assert!(!is_binary(b"Hello, world!"));
        assert!(!is_binary("你好世界 🌍".as_bytes()));
    }

    #[test]
    fn test_empty_is_not_binary() {
        assert!(!is_binary(&[]));
    }

    #[test]
    fn test_nul_byte_marks_binary() {
        assert!(is_binary(&[0x89, b'P', b'N', b'G', 0x00, 0x01]));
        assert!(is_binary(&[0u8; 100]));
    }

    #[test]
    fn test_nul_at_prefix_boundary() {
        let mut bytes = vec![b'a'; BINARY_CHECK_SIZE];
        bytes[BINARY_CHECK_SIZE - 1] = 0;
        assert!(is_binary(&bytes));
    }

    #[test]
    fn test_nul_after_prefix_is_ignored() {
        let mut bytes = vec![b'a'; BINARY_CHECK_SIZE + 10];
        bytes[BINARY_CHECK_SIZE] = 0;
        assert!(!is_binary(&bytes));
    }

    #[test]
    fn test_invalid_utf8_without_nul_is_text() {
        // not binary by this heuristic; decoding decides later
        assert!(!is_binary(&[0xff, 0xfe, b'a']));
    }
}
