use std::path::{Path, PathBuf};

#[cfg(feature = "pdf")]
use super::PdfLoader;
use super::{DEFAULT_MAX_FILE_SIZE, Document, DocumentLoader, TextLoader};

/// Outcome counters for one corpus walk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub files_scanned: usize,
    pub files_loaded: usize,
    pub files_failed: usize,
    pub files_unrecognized: usize,
    pub documents: usize,
    pub placeholder: bool,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

/// A directory tree of course material.
pub struct Corpus {
    root: PathBuf,
    loaders: Vec<Box<dyn DocumentLoader>>,
}

impl Corpus {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, max_file_size: u64) -> Self {
        let loaders: Vec<Box<dyn DocumentLoader>> = vec![
            Box::new(TextLoader { max_file_size }),
            #[cfg(feature = "pdf")]
            Box::new(PdfLoader { max_file_size }),
        ];
        Self {
            root: root.into(),
            loaders,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extensions (lower-case, without the dot) a loader exists for.
    #[must_use]
    pub fn recognized_extensions(&self) -> Vec<&str> {
        self.loaders
            .iter()
            .flat_map(|l| l.supported_extensions().iter().copied())
            .collect()
    }

    /// Walk the corpus and load every recognized file.
    ///
    /// Never fails: a missing root is created, unreadable files are logged and
    /// skipped, and an empty result is replaced by a single placeholder
    /// document so downstream retrieval always has something to match.
    pub async fn load(&self) -> (Vec<Document>, IngestReport) {
        let start = std::time::Instant::now();
        let mut report = IngestReport::default();

        if !tokio::fs::try_exists(&self.root).await.unwrap_or(false) {
            match tokio::fs::create_dir_all(&self.root).await {
                Ok(()) => {
                    tracing::info!(path = %self.root.display(), "created empty corpus directory");
                }
                Err(e) => tracing::warn!(
                    path = %self.root.display(),
                    error = %e,
                    "cannot create corpus directory"
                ),
            }
        }

        let files = self.enumerate().await;
        let mut documents = Vec::new();

        for path in &files {
            report.files_scanned += 1;
            let Some(loader) = self.loader_for(path) else {
                report.files_unrecognized += 1;
                tracing::debug!(path = %path.display(), "skipping unrecognized file");
                continue;
            };
            match loader.load(path).await {
                Ok(docs) => {
                    report.files_loaded += 1;
                    tracing::debug!(path = %path.display(), documents = docs.len(), "loaded");
                    documents.extend(docs);
                }
                Err(e) => {
                    report.files_failed += 1;
                    report.errors.push(format!("{}: {e}", path.display()));
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file");
                }
            }
        }

        if documents.is_empty() {
            tracing::warn!(
                path = %self.root.display(),
                "corpus is empty, using placeholder document"
            );
            documents.push(Document::placeholder());
            report.placeholder = true;
        }

        report.documents = documents.len();
        report.duration_ms = start.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
        tracing::info!(
            path = %self.root.display(),
            files = report.files_scanned,
            loaded = report.files_loaded,
            failed = report.files_failed,
            documents = report.documents,
            "corpus ingested"
        );
        (documents, report)
    }

    async fn enumerate(&self) -> Vec<PathBuf> {
        let root = self.root.clone();
        let walk = tokio::task::spawn_blocking(move || {
            ignore::WalkBuilder::new(root)
                .hidden(true)
                .ignore(false)
                .parents(false)
                .git_ignore(false)
                .git_global(false)
                .git_exclude(false)
                .sort_by_file_path(|a, b| a.cmp(b))
                .build()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping unreadable corpus entry");
                        None
                    }
                })
                .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
                .map(ignore::DirEntry::into_path)
                .collect::<Vec<_>>()
        })
        .await;

        walk.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "corpus walk aborted");
            Vec::new()
        })
    }

    fn loader_for(&self, path: &Path) -> Option<&dyn DocumentLoader> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.loaders
            .iter()
            .find(|l| l.supported_extensions().contains(&ext.as_str()))
            .map(|l| l.as_ref())
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::new("data", DEFAULT_MAX_FILE_SIZE)
    }
}
