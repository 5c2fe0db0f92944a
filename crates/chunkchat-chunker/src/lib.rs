//! Word-bounded overlapping text chunking for Chunkchat.
//!
//! Splits long plaintext into pieces of at most `max_words` words, with
//! `overlap` words carried over between consecutive pieces, so each piece fits
//! a context-limited model.

use chunkchat_types::ChunkError;

/// Default maximum number of words per chunk.
pub const DEFAULT_MAX_WORDS: usize = 300;

/// Default number of words shared by consecutive chunks.
pub const DEFAULT_OVERLAP: usize = 0;

/// Validated chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    max_words: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker, rejecting `overlap >= max_words`.
    pub fn new(max_words: usize, overlap: usize) -> Result<Self, ChunkError> {
        if overlap >= max_words {
            return Err(ChunkError::InvalidArgument { max_words, overlap });
        }
        Ok(Self { max_words, overlap })
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let step = self.max_words - self.overlap;
        let mut chunks = Vec::new();

        let mut start = 0;
        while start < words.len() {
            let end = (start + self.max_words).min(words.len());
            chunks.push(words[start..end].join(" "));
            // The chunk that reaches the tail is the last one.
            if end >= words.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            max_words: DEFAULT_MAX_WORDS,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

/// Split `text` into chunks of at most `max_words` words, each sharing
/// `overlap` words with its predecessor.
///
/// Words are runs of non-whitespace characters; chunks rejoin them with a
/// single space. Empty input yields no chunks.
pub fn split(text: &str, max_words: usize, overlap: usize) -> Result<Vec<String>, ChunkError> {
    Ok(Chunker::new(max_words, overlap)?.split(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_example() {
        let chunks = split("a b c d e", 3, 1).unwrap();
        assert_eq!(chunks, vec!["a b c", "c d e"]);
    }

    #[test]
    fn split_empty_input() {
        assert!(split("", 3, 1).unwrap().is_empty());
        assert!(split("  \n\t ", 3, 1).unwrap().is_empty());
    }

    #[test]
    fn split_single_chunk_when_short() {
        let chunks = split("one  two\nthree", 10, 2).unwrap();
        assert_eq!(chunks, vec!["one two three"]);
    }

    #[test]
    fn split_exact_fit_is_single_chunk() {
        let chunks = split("a b c", 3, 1).unwrap();
        assert_eq!(chunks, vec!["a b c"]);
    }

    #[test]
    fn split_no_overlap_is_disjoint() {
        let chunks = split("a b c d e f g", 3, 0).unwrap();
        assert_eq!(chunks, vec!["a b c", "d e f", "g"]);
    }

    #[test]
    fn split_no_redundant_tail_chunk() {
        // Without the early stop a trailing "e" chunk would follow.
        let chunks = split("a b c d e", 4, 3).unwrap();
        assert_eq!(chunks, vec!["a b c d", "b c d e"]);
    }

    #[test]
    fn split_max_words_one() {
        let chunks = split("x y z", 1, 0).unwrap();
        assert_eq!(chunks, vec!["x", "y", "z"]);
    }

    #[test]
    fn split_keeps_punctuation() {
        let chunks = split("Hello, world! How are you?", 2, 0).unwrap();
        assert_eq!(chunks, vec!["Hello, world!", "How are", "you?"]);
    }

    #[test]
    fn split_unicode_whitespace() {
        let chunks = split("alpha\u{3000}beta\u{00a0}gamma", 5, 0).unwrap();
        assert_eq!(chunks, vec!["alpha beta gamma"]);
    }

    #[test]
    fn overlap_equal_to_max_words_rejected() {
        assert_eq!(
            split("a b c", 3, 3),
            Err(ChunkError::InvalidArgument {
                max_words: 3,
                overlap: 3
            })
        );
    }

    #[test]
    fn overlap_greater_than_max_words_rejected() {
        assert!(matches!(
            split("a b c", 2, 5),
            Err(ChunkError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn zero_max_words_rejected() {
        assert!(matches!(
            split("a b c", 0, 0),
            Err(ChunkError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn default_chunker_uses_defaults() {
        let chunker = Chunker::default();
        assert_eq!(chunker.max_words(), DEFAULT_MAX_WORDS);
        assert_eq!(chunker.overlap(), DEFAULT_OVERLAP);
    }
}
