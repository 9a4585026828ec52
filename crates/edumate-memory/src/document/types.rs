use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Text shown to the model when the corpus yields no documents at all.
pub const PLACEHOLDER_TEXT: &str = "EduMate is ready.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source: String,
    pub content_type: String,
    /// 1-based page number for paginated sources.
    pub page: Option<u32>,
    pub extra: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Build a document whose id is derived from its source and page.
    #[must_use]
    pub fn new(content: String, metadata: DocumentMetadata) -> Self {
        let id = match metadata.page {
            Some(page) => format!("{}:p{page}", metadata.source),
            None => metadata.source.clone(),
        };
        Self {
            id,
            content,
            metadata,
        }
    }

    /// Synthetic document used so the index is never empty.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            id: "placeholder".to_owned(),
            content: PLACEHOLDER_TEXT.to_owned(),
            metadata: DocumentMetadata {
                source: "<placeholder>".to_owned(),
                content_type: "text/plain".to_owned(),
                page: None,
                extra: HashMap::new(),
            },
        }
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.id == "placeholder"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
    pub chunk_index: usize,
}
