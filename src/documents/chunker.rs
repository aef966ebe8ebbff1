//! Sentence-based text chunking with overlap.

/// Configuration for chunking.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Characters of trailing sentences repeated at the start of the next chunk.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 100,
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split whitespace-normalised text after `.`, `!` or `?` followed by a space.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek() == Some(&' ') {
            chars.next();
            sentences.push(std::mem::take(&mut current));
        }
    }

    if !current.trim().is_empty() {
        sentences.push(current);
    }

    sentences
}

/// Split text into chunks of whole sentences.
///
/// A sentence longer than `chunk_size` becomes a chunk on its own.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let sentences = split_sentences(&normalized);

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < sentences.len() {
        let mut end = start;
        let mut size = 0;

        while end < sentences.len() {
            let len = char_len(&sentences[end]) + usize::from(end > start);
            if end > start && size + len > config.chunk_size {
                break;
            }
            size += len;
            end += 1;
        }

        chunks.push(sentences[start..end].join(" "));

        if end == sentences.len() {
            break;
        }

        let mut overlap = 0;
        let mut overlap_size = 0;
        for sentence in sentences[start..end].iter().rev() {
            let len = char_len(sentence) + usize::from(overlap > 0);
            if overlap_size + len > config.chunk_overlap {
                break;
            }
            overlap_size += len;
            overlap += 1;
        }

        start = (end - overlap).max(start + 1);
    }

    chunks
}
