//! Sliding-window chunking.

use super::{ChunkingConfig, TranscriptChunk};
use crate::error::Result;
use tracing::debug;

/// Fixed-size, overlapping window chunker.
#[derive(Debug, Clone)]
pub struct TextChunker {
    config: ChunkingConfig,
}

impl TextChunker {
    /// Create a chunker, failing fast on parameters that would not terminate.
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Split `text` into windows of at most `max_chars` characters, each
    /// starting `max_chars - overlap` characters after the previous one.
    pub fn chunk(&self, text: &str) -> Vec<TranscriptChunk> {
        // Character index -> byte index, plus the end sentinel.
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let len = boundaries.len() - 1;

        let stride = self.config.stride();
        let mut chunks = Vec::with_capacity(len.div_ceil(stride));
        let mut cursor = 0;

        while cursor < len {
            let end = cursor.saturating_add(self.config.max_chars).min(len);
            chunks.push(TranscriptChunk {
                text: text[boundaries[cursor]..boundaries[end]].to_string(),
                start_offset: cursor,
                end_offset: end,
                order: chunks.len(),
            });
            cursor = cursor.saturating_add(stride);
        }

        debug!(
            "Chunked {} chars into {} chunks (max_chars={}, overlap={})",
            len,
            chunks.len(),
            self.config.max_chars,
            self.config.overlap
        );
        chunks
    }
}

/// Chunk `text` into plain strings.
pub fn chunk_text(text: &str, max_chars: usize, overlap: usize) -> Result<Vec<String>> {
    let chunker = TextChunker::new(ChunkingConfig::new(max_chars, overlap)?)?;
    Ok(chunker.chunk(text).into_iter().map(|c| c.text).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(chunk_text("", 500, 50).unwrap().is_empty());
    }

    #[test]
    fn test_window_trace() {
        let chunks = chunk_text("abcdefghij", 4, 1).unwrap();
        assert_eq!(chunks, vec!["abcd", "defg", "ghij", "j"]);
    }

    #[test]
    fn test_offsets_advance_by_stride() {
        let chunker = TextChunker::new(ChunkingConfig::new(4, 1).unwrap()).unwrap();
        let chunks = chunker.chunk("abcdefghij");
        let starts: Vec<usize> = chunks.iter().map(|c| c.start_offset).collect();
        assert_eq!(starts, vec![0, 3, 6, 9]);
        assert_eq!(chunks.last().unwrap().len(), 1);
        assert!(chunks.iter().all(|c| c.len() <= 4));
        assert_eq!(
            chunks.iter().map(|c| c.order).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn test_overlap_equal_to_max_chars_fails_fast() {
        let err = chunk_text("some text that would loop", 10, 10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_text_shorter_than_window() {
        assert_eq!(chunk_text("hello", 500, 50).unwrap(), vec!["hello"]);
    }

    #[test]
    fn test_huge_window_does_not_overflow() {
        let chunks = chunk_text("abcdef", usize::MAX, usize::MAX - 1).unwrap();
        assert_eq!(chunks, vec!["abcdef", "bcdef", "cdef", "def", "ef", "f"]);
    }

    #[test]
    fn test_every_offset_is_covered() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(7);
        let len = text.chars().count();

        for (max_chars, overlap) in [(1, 0), (7, 0), (7, 3), (16, 15), (50, 10), (400, 50)] {
            let chunker =
                TextChunker::new(ChunkingConfig::new(max_chars, overlap).unwrap()).unwrap();
            let chunks = chunker.chunk(&text);

            let mut covered = vec![false; len];
            for chunk in &chunks {
                assert!(chunk.len() <= max_chars);
                assert_eq!(chunk.text.chars().count(), chunk.len());
                covered[chunk.start_offset..chunk.end_offset]
                    .iter_mut()
                    .for_each(|c| *c = true);
            }
            assert!(
                covered.iter().all(|c| *c),
                "gap with max_chars={} overlap={}",
                max_chars,
                overlap
            );
        }
    }

    #[test]
    fn test_multibyte_text_is_split_on_char_boundaries() {
        let chunks = chunk_text("héllo wörld ñ", 4, 1).unwrap();
        assert_eq!(chunks[0], "héll");
        assert_eq!(chunks[1], "lo w");
        assert_eq!(chunks[2], "wörl");
    }
}
