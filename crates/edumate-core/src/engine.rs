//! The study assistant: one index build at startup, then per-request
//! retrieval, prompt synthesis and generation.

use std::time::Instant;

use edumate_llm::{GenerationClient, LlmProvider};
use edumate_memory::{
    AnyEmbedder, Chunk, Corpus, Document, IngestReport, SessionStore, TextSplitter, Turn,
    VectorIndex,
};
use serde::{Deserialize, Serialize};

use crate::bootstrap::create_embedder;
use crate::config::Config;
use crate::error::{CoreError, Result};
use crate::prompt::{self, REFUSAL_MESSAGE};
use crate::retriever::Retriever;

/// One unit of work for the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum TaskRequest {
    Ask { question: String, session_id: String },
    Quiz { topic: String },
    Summary { topic: String },
    Mindmap { topic: String },
    StudyPlan { subject: String, days: u32 },
}

impl TaskRequest {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ask { .. } => "ask",
            Self::Quiz { .. } => "quiz",
            Self::Summary { .. } => "summary",
            Self::Mindmap { .. } => "mindmap",
            Self::StudyPlan { .. } => "study_plan",
        }
    }
}

pub struct StudyAssistant<P> {
    client: GenerationClient<P>,
    embedder: AnyEmbedder<P>,
    index: VectorIndex,
    sessions: SessionStore,
    top_k: usize,
    report: IngestReport,
}

impl<P: LlmProvider> StudyAssistant<P> {
    /// Ingest the corpus, chunk it, embed every chunk and build the index.
    ///
    /// Unreadable files are skipped and an empty corpus yields a placeholder
    /// document, so only configuration and embedding failures are fatal.
    ///
    /// # Errors
    ///
    /// Returns an error if the splitter settings are invalid or embedding fails.
    pub async fn build(config: &Config, provider: P) -> Result<Self> {
        let start = Instant::now();
        let corpus = Corpus::new(&config.corpus.path, config.corpus.max_file_size);
        let (documents, report) = corpus.load().await;

        let splitter = TextSplitter::new(config.chunking.splitter())?;
        let chunks = chunk_corpus(&splitter, &documents);
        tracing::info!(
            documents = documents.len(),
            chunks = chunks.len(),
            "corpus chunked"
        );

        let client = GenerationClient::new(provider, config.llm.retry.policy());
        let embedder =
            create_embedder(&config.embedding, client.shared_provider(), *client.policy());
        let index = VectorIndex::from_chunks(chunks, &embedder).await?;

        tracing::info!(
            provider = client.provider().name(),
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "study assistant ready"
        );

        Ok(Self {
            client,
            embedder,
            index,
            sessions: SessionStore::new(config.session.history_limit),
            top_k: config.retrieval.top_k,
            report,
        })
    }

    /// Assemble an assistant from prebuilt components.
    #[must_use]
    pub fn from_parts(
        client: GenerationClient<P>,
        embedder: AnyEmbedder<P>,
        index: VectorIndex,
        sessions: SessionStore,
        top_k: usize,
    ) -> Self {
        Self {
            client,
            embedder,
            index,
            sessions,
            top_k,
            report: IngestReport::default(),
        }
    }

    #[must_use]
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    #[must_use]
    pub fn ingest_report(&self) -> &IngestReport {
        &self.report
    }

    #[must_use]
    pub fn retriever(&self) -> Retriever<'_, AnyEmbedder<P>> {
        Retriever::new(&self.index, &self.embedder, self.top_k)
    }

    /// Answer a question using retrieved context and the session's history.
    ///
    /// The session stays locked from reading its history until the new turn
    /// is stored, so concurrent calls with one id are applied in order.
    /// When retrieval yields no context the refusal sentence is returned
    /// without calling the provider.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRequest`] for a blank question, or the
    /// retrieval or generation failure.
    pub async fn ask(&self, question: &str, session_id: &str) -> Result<String> {
        let question = require("question", question)?;
        let mut session = self.sessions.lock(session_id).await;

        let context = self.retriever().context(question).await?;
        let answer = if context.trim().is_empty() {
            tracing::debug!(session_id, "no context retrieved, returning refusal");
            REFUSAL_MESSAGE.to_owned()
        } else {
            let history = session.history();
            let prompt = prompt::ask_prompt(&context, &history, question);
            self.client.generate(&prompt).await?.text
        };

        session.push(question.to_owned(), answer.clone());
        tracing::debug!(session_id, chars = answer.len(), "answered question");
        Ok(answer)
    }

    /// Three multiple-choice questions on `topic`.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank topic or when retrieval or generation fails.
    pub async fn quiz(&self, topic: &str) -> Result<String> {
        let topic = require("topic", topic)?;
        let context = self.retriever().context(topic).await?;
        let text = self
            .client
            .generate(&prompt::quiz_prompt(topic, &context))
            .await?
            .text;

        let check = prompt::check_quiz(&text);
        if !check.is_well_formed() {
            tracing::warn!(
                topic,
                questions = check.questions,
                answers = check.answers,
                expected = prompt::QUIZ_QUESTIONS,
                "quiz reply deviates from the requested format"
            );
        }
        Ok(text)
    }

    /// Bullet-point revision summary of `topic`.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank topic or when retrieval or generation fails.
    pub async fn summary(&self, topic: &str) -> Result<String> {
        let topic = require("topic", topic)?;
        let context = self.retriever().context(topic).await?;
        Ok(self
            .client
            .generate(&prompt::summary_prompt(topic, &context))
            .await?
            .text)
    }

    /// Mermaid flowchart for `topic`, cleaned of fences and oversized graphs.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank topic or when retrieval or generation fails.
    pub async fn mindmap(&self, topic: &str) -> Result<String> {
        let topic = require("topic", topic)?;
        let context = self.retriever().context(topic).await?;
        let raw = self
            .client
            .generate(&prompt::mindmap_prompt(topic, &context))
            .await?
            .text;
        Ok(prompt::clean_mindmap(&raw))
    }

    /// Day-by-day plan covering `subject` over `days` days.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRequest`] for a blank subject or zero days,
    /// or the retrieval or generation failure.
    pub async fn study_plan(&self, subject: &str, days: u32) -> Result<String> {
        let subject = require("subject", subject)?;
        if days == 0 {
            return Err(CoreError::InvalidRequest("days must be at least 1".into()));
        }
        let context = self
            .retriever()
            .context(&prompt::study_plan_query(subject))
            .await?;
        Ok(self
            .client
            .generate(&prompt::study_plan_prompt(subject, days, &context))
            .await?
            .text)
    }

    /// Dispatch a [`TaskRequest`] to its operation.
    ///
    /// # Errors
    ///
    /// Propagates the error of the selected operation.
    pub async fn handle(&self, request: &TaskRequest) -> Result<String> {
        tracing::debug!(task = request.kind(), "handling request");
        match request {
            TaskRequest::Ask {
                question,
                session_id,
            } => self.ask(question, session_id).await,
            TaskRequest::Quiz { topic } => self.quiz(topic).await,
            TaskRequest::Summary { topic } => self.summary(topic).await,
            TaskRequest::Mindmap { topic } => self.mindmap(topic).await,
            TaskRequest::StudyPlan { subject, days } => self.study_plan(subject, *days).await,
        }
    }

    /// Stored turns for `session_id`, oldest first.
    pub async fn history(&self, session_id: &str) -> Vec<Turn> {
        self.sessions.get(session_id).await
    }
}

/// Split every document, falling back to the placeholder when nothing
/// produced a chunk so the index is never empty.
fn chunk_corpus(splitter: &TextSplitter, documents: &[Document]) -> Vec<Chunk> {
    let chunks = splitter.split_all(documents);
    if !chunks.is_empty() {
        return chunks;
    }
    tracing::warn!(
        documents = documents.len(),
        "corpus produced no chunks, indexing placeholder"
    );
    splitter.split(&Document::placeholder())
}

fn require<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidRequest(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use edumate_llm::RetryPolicy;
    use edumate_llm::mock::MockProvider;
    use edumate_memory::document::DocumentMetadata;
    use edumate_memory::{HashedEmbedder, SplitterConfig};

    use super::*;

    fn chunk(id: &str, content: &str) -> Chunk {
        Chunk {
            id: format!("{id}#0"),
            document_id: id.into(),
            content: content.into(),
            metadata: DocumentMetadata {
                source: id.into(),
                content_type: "text/plain".into(),
                page: None,
                extra: HashMap::new(),
            },
            chunk_index: 0,
        }
    }

    async fn assistant_with(
        provider: MockProvider,
        chunks: Vec<Chunk>,
    ) -> StudyAssistant<MockProvider> {
        let embedder = AnyEmbedder::Hashed(HashedEmbedder::default());
        let index = VectorIndex::from_chunks(chunks, &embedder).await.unwrap();
        let policy = RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(40),
        };
        StudyAssistant::from_parts(
            GenerationClient::new(provider, policy),
            embedder,
            index,
            SessionStore::default(),
            4,
        )
    }

    async fn assistant(provider: MockProvider) -> StudyAssistant<MockProvider> {
        assistant_with(
            provider,
            vec![
                chunk(
                    "water.txt",
                    "Water cycle involves evaporation, condensation, precipitation.",
                ),
                chunk(
                    "plants.txt",
                    "Photosynthesis converts light into chemical energy in leaves.",
                ),
            ],
        )
        .await
    }

    #[tokio::test]
    async fn ask_sends_context_and_question() {
        let provider = MockProvider::with_responses(vec!["Water turns into vapour.".into()]);
        let assistant = assistant(provider.clone()).await;

        let answer = assistant.ask("What is evaporation?", "s1").await.unwrap();
        assert_eq!(answer, "Water turns into vapour.");

        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Water cycle involves evaporation"));
        assert!(prompts[0].contains("Current Question: What is evaporation?"));
        assert!(prompts[0].contains(REFUSAL_MESSAGE));
    }

    #[tokio::test]
    async fn ask_without_context_refuses_without_calling_provider() {
        let provider = MockProvider::default();
        let assistant = assistant_with(provider.clone(), Vec::new()).await;

        let answer = assistant.ask("What is evaporation?", "s1").await.unwrap();
        assert_eq!(answer, REFUSAL_MESSAGE);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn ask_feeds_previous_turns_into_prompt() {
        let provider = MockProvider::with_responses(vec![
            "It is water turning into vapour.".into(),
            "It happens faster when warm.".into(),
        ]);
        let assistant = assistant(provider.clone()).await;

        assistant.ask("What is evaporation?", "s1").await.unwrap();
        assistant.ask("When does it speed up?", "s1").await.unwrap();

        let prompts = provider.prompts();
        assert!(prompts[0].contains("Conversation History:\n(none)"));
        assert!(prompts[1].contains(
            "Student: What is evaporation?\nEduMate: It is water turning into vapour."
        ));
    }

    #[tokio::test]
    async fn sessions_are_isolated_by_id() {
        let assistant = assistant(MockProvider::default()).await;
        assistant.ask("What is evaporation?", "alice").await.unwrap();

        assert_eq!(assistant.history("alice").await.len(), 1);
        assert!(assistant.history("bob").await.is_empty());
    }

    #[tokio::test]
    async fn history_keeps_five_most_recent_turns() {
        let assistant = assistant(MockProvider::default()).await;
        for i in 0..6 {
            assistant
                .ask(&format!("question {i} about evaporation"), "s1")
                .await
                .unwrap();
        }

        let history = assistant.history("s1").await;
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].question, "question 1 about evaporation");
        assert_eq!(history[4].question, "question 5 about evaporation");
    }

    #[tokio::test]
    async fn concurrent_asks_on_one_session_keep_every_turn() {
        let provider = MockProvider::default().with_delay(5);
        let assistant = Arc::new(assistant(provider).await);

        let mut handles = Vec::new();
        for i in 0..4 {
            let assistant = Arc::clone(&assistant);
            handles.push(tokio::spawn(async move {
                assistant
                    .ask(&format!("evaporation question {i}"), "shared")
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(assistant.history("shared").await.len(), 4);
    }

    #[tokio::test]
    async fn blank_question_is_rejected() {
        let provider = MockProvider::default();
        let assistant = assistant(provider.clone()).await;

        let err = assistant.ask("   ", "s1").await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidRequest(_)));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn generation_failure_propagates() {
        let assistant = assistant(MockProvider::failing()).await;

        let err = assistant.summary("evaporation").await.unwrap_err();
        assert!(matches!(err, CoreError::Generation(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried() {
        let provider = MockProvider::default().with_transient_failures(2);
        let assistant = assistant(provider.clone()).await;

        let answer = assistant.summary("evaporation").await.unwrap();
        assert_eq!(answer, "mock response");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn failed_ask_does_not_record_a_turn() {
        let assistant = assistant(MockProvider::failing()).await;

        assert!(assistant.ask("What is evaporation?", "s1").await.is_err());
        assert!(assistant.history("s1").await.is_empty());
    }

    #[tokio::test]
    async fn quiz_prompt_names_topic() {
        let provider = MockProvider::default();
        let assistant = assistant(provider.clone()).await;

        assistant.quiz("Photosynthesis").await.unwrap();
        let prompts = provider.prompts();
        assert!(prompts[0].contains("about: \"Photosynthesis\""));
        assert!(prompts[0].contains("Photosynthesis converts light"));
    }

    #[tokio::test]
    async fn mindmap_reply_is_cleaned() {
        let provider = MockProvider::with_responses(vec![
            "Here you go:\n```mermaid\ngraph TD\nA[Water (liquid)] --> B[Vapour]\n```".into(),
        ]);
        let assistant = assistant(provider).await;

        let diagram = assistant.mindmap("Water Cycle").await.unwrap();
        assert_eq!(diagram, "graph TD\nA[Water liquid] --> B[Vapour]");
    }

    #[tokio::test]
    async fn study_plan_rejects_zero_days() {
        let provider = MockProvider::default();
        let assistant = assistant(provider.clone()).await;

        let err = assistant.study_plan("Science", 0).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidRequest(_)));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn study_plan_prompt_carries_day_count() {
        let provider = MockProvider::default();
        let assistant = assistant(provider.clone()).await;

        assistant.study_plan("Science", 5).await.unwrap();
        let prompts = provider.prompts();
        assert!(prompts[0].contains("5-day study plan"));
        assert!(prompts[0].contains("\"Science\""));
    }

    #[tokio::test]
    async fn handle_dispatches_each_variant() {
        let provider = MockProvider::default();
        let assistant = assistant(provider.clone()).await;

        let requests = [
            TaskRequest::Ask {
                question: "What is evaporation?".into(),
                session_id: "s1".into(),
            },
            TaskRequest::Quiz {
                topic: "Photosynthesis".into(),
            },
            TaskRequest::Summary {
                topic: "Water".into(),
            },
            TaskRequest::Mindmap {
                topic: "Water".into(),
            },
            TaskRequest::StudyPlan {
                subject: "Science".into(),
                days: 3,
            },
        ];
        for request in &requests {
            assistant.handle(request).await.unwrap();
        }
        assert_eq!(provider.call_count(), requests.len());
    }

    #[test]
    fn task_request_uses_tagged_json() {
        let request: TaskRequest =
            serde_json::from_str(r#"{"task":"study_plan","subject":"Maths","days":7}"#).unwrap();
        assert_eq!(
            request,
            TaskRequest::StudyPlan {
                subject: "Maths".into(),
                days: 7
            }
        );
        assert_eq!(request.kind(), "study_plan");
    }

    #[tokio::test]
    async fn build_indexes_corpus_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("water.txt"),
            "Water cycle involves evaporation, condensation, precipitation.",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.bin"), [0u8, 1, 2]).unwrap();

        let mut config = Config::default();
        config.corpus.path = dir.path().to_string_lossy().into_owned();
        let assistant = StudyAssistant::build(&config, MockProvider::default())
            .await
            .unwrap();

        assert_eq!(assistant.index().len(), 1);
        assert_eq!(assistant.ingest_report().files_loaded, 1);
        assert!(!assistant.ingest_report().placeholder);
    }

    #[tokio::test]
    async fn build_with_empty_corpus_uses_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.corpus.path = dir.path().join("missing").to_string_lossy().into_owned();

        let provider = MockProvider::default();
        let assistant = StudyAssistant::build(&config, provider.clone())
            .await
            .unwrap();

        assert!(assistant.ingest_report().placeholder);
        assert_eq!(assistant.index().len(), 1);
        let answer = assistant.ask("hello", "s1").await.unwrap();
        assert_eq!(answer, "mock response");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn build_with_only_blank_notes_answers_from_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::write(dir.path().join("revision.md"), "\n   \n").unwrap();
        let mut config = Config::default();
        config.corpus.path = dir.path().to_string_lossy().into_owned();

        let provider = MockProvider::default();
        let assistant = StudyAssistant::build(&config, provider.clone())
            .await
            .unwrap();

        assert!(assistant.ingest_report().placeholder);
        assert!(!assistant.index().is_empty());
        assert_eq!(assistant.ask("hello", "s1").await.unwrap(), "mock response");
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn documents_without_chunks_fall_back_to_placeholder() {
        let splitter = TextSplitter::new(SplitterConfig::default()).unwrap();
        let mut blank = Document::placeholder();
        blank.id = "notes.txt".into();
        blank.content = String::new();

        let chunks = chunk_corpus(&splitter, &[blank]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].document_id, Document::placeholder().id);
    }
}
