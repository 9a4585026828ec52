use std::collections::HashMap;
use std::path::Path;
use std::pin::Pin;

use super::super::{
    DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentLoader, DocumentMetadata,
};

/// Loads plain-text and markdown notes as a single [`Document`].
///
/// Content is normalised to `\n` line endings without a byte-order mark.
/// Files with no visible text yield no document at all, so an empty corpus
/// still falls back to the placeholder.
pub struct TextLoader {
    pub max_file_size: u64,
}

impl Default for TextLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for TextLoader {
    fn load(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Vec<Document>, DocumentError>> + Send + '_>>
    {
        let path = path.to_path_buf();
        let max_size = self.max_file_size;
        Box::pin(async move {
            let path = tokio::fs::canonicalize(&path).await?;
            let size = tokio::fs::metadata(&path).await?.len();
            if size > max_size {
                return Err(DocumentError::FileTooLarge(size));
            }

            let raw = tokio::fs::read_to_string(&path).await?;
            let content = normalize(&raw);
            if content.trim().is_empty() {
                tracing::debug!(path = %path.display(), "skipping blank text file");
                return Ok(Vec::new());
            }

            let markdown = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "md" | "markdown"));
            let mut extra = HashMap::new();
            if markdown && let Some(title) = markdown_title(&content) {
                extra.insert("title".to_owned(), title.to_owned());
            }

            Ok(vec![Document::new(
                content,
                DocumentMetadata {
                    source: path.display().to_string(),
                    content_type: if markdown { "text/markdown" } else { "text/plain" }.to_owned(),
                    page: None,
                    extra,
                },
            )])
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt", "md", "markdown"]
    }
}

fn normalize(raw: &str) -> String {
    raw.strip_prefix('\u{feff}')
        .unwrap_or(raw)
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

/// First ATX heading of a markdown note, e.g. a chapter name.
fn markdown_title(content: &str) -> Option<&str> {
    content
        .lines()
        .map(str::trim)
        .find_map(|l| l.strip_prefix('#'))
        .map(|l| l.trim_start_matches('#').trim())
        .filter(|t| !t.is_empty())
}
