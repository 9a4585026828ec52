use super::error::DocumentError;
use super::types::{Chunk, Document};

/// Separators tried in order when looking for a natural place to end a chunk.
const BOUNDARIES: [&str; 4] = ["\n\n", "\n", ". ", " "];

#[derive(Debug, Clone)]
pub struct SplitterConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks of one document.
    pub chunk_overlap: usize,
    pub boundary_aware: bool,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            boundary_aware: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidSplitter`] if `chunk_size` is zero or the
    /// overlap is not strictly smaller than the chunk size.
    pub fn new(config: SplitterConfig) -> Result<Self, DocumentError> {
        if config.chunk_size == 0 {
            return Err(DocumentError::InvalidSplitter(
                "chunk_size must be greater than zero".into(),
            ));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(DocumentError::InvalidSplitter(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Split one document into chunks.
    ///
    /// Every chunk is at most `chunk_size` characters, and each chunk ends with
    /// exactly the `chunk_overlap` characters its successor starts with.
    #[must_use]
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        let text = &document.content;
        if text.is_empty() {
            return Vec::new();
        }

        let pieces = if self.config.boundary_aware {
            split_on_boundaries(text, self.config.chunk_size, self.config.chunk_overlap)
        } else {
            split_chars(text, self.config.chunk_size, self.config.chunk_overlap)
        };

        pieces
            .into_iter()
            .enumerate()
            .map(|(i, content)| Chunk {
                id: format!("{}#{i}", document.id),
                document_id: document.id.clone(),
                content,
                metadata: document.metadata.clone(),
                chunk_index: i,
            })
            .collect()
    }

    /// Split every document, keeping corpus order.
    #[must_use]
    pub fn split_all(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().flat_map(|d| self.split(d)).collect()
    }
}

fn split_on_boundaries(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        if start + chunk_size >= chars.len() {
            chunks.push(chars[start..].iter().collect());
            break;
        }
        let hard_end = start + chunk_size;
        // Never end so early that the next chunk would not move forward, and
        // avoid degenerate slivers by only accepting the back half of the window.
        let min_end = (start + overlap + 1).max(start + chunk_size / 2);
        let end = find_boundary(&chars, min_end, hard_end).unwrap_or(hard_end);
        chunks.push(chars[start..end].iter().collect());
        start = end - overlap;
    }

    chunks
}

/// Last position in `min_end..=max_end` right after a separator, trying
/// separators in priority order.
fn find_boundary(chars: &[char], min_end: usize, max_end: usize) -> Option<usize> {
    BOUNDARIES.iter().find_map(|sep| {
        let sep: Vec<char> = sep.chars().collect();
        (min_end.max(sep.len())..=max_end)
            .rev()
            .find(|&end| chars[end - sep.len()..end] == sep[..])
    })
}

fn split_chars(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}
