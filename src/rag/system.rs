//! The RAG system: one entry point for queries and ingestion.

use super::{CourseAnalytics, CourseLibrary, RagAnswer};
use crate::config::{Prompts, Settings};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::generation::{AnswerGenerator, AnthropicClient, GenerationClient};
use crate::models::Course;
use crate::retrieval::CourseRetriever;
use crate::session::SessionManager;
use crate::tools::{CourseOutlineTool, CourseSearchTool, ToolRegistry};
use crate::vector_store::VectorStore;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Course question answering with tool-assisted retrieval.
pub struct RagSystem {
    prompts: Prompts,
    generator: AnswerGenerator,
    library: CourseLibrary,
    sessions: SessionManager,
}

impl RagSystem {
    /// Build the system with the hosted generation and embedding services.
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Arc::new(AnthropicClient::from_settings(&settings.generation)?);
        let library = CourseLibrary::from_settings(settings)?;
        Self::assemble(settings, client, library)
    }

    /// Build the system from explicit components.
    pub fn with_components(
        settings: &Settings,
        client: Arc<dyn GenerationClient>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let library = CourseLibrary::with_components(settings, embedder, store)?;
        Self::assemble(settings, client, library)
    }

    fn assemble(
        settings: &Settings,
        client: Arc<dyn GenerationClient>,
        library: CourseLibrary,
    ) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        Ok(Self {
            generator: AnswerGenerator::new(client, &settings.generation, prompts.system_prompt()),
            prompts,
            library,
            sessions: SessionManager::new(settings.session.max_history)
                .with_max_sessions(settings.session.max_sessions),
        })
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn library(&self) -> &CourseLibrary {
        &self.library
    }

    /// A registry owned by a single query, so sources never cross requests.
    fn tool_registry(&self) -> Result<ToolRegistry> {
        let retriever: Arc<dyn CourseRetriever> = self.library.index();
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(CourseSearchTool::new(retriever.clone())))?;
        registry.register(Box::new(CourseOutlineTool::new(retriever)))?;
        Ok(registry)
    }

    /// Answer a question, continuing `session_id`'s conversation if given.
    ///
    /// The exchange is recorded only when generation succeeds.
    #[instrument(skip(self))]
    pub async fn query(&self, query: &str, session_id: Option<&str>) -> Result<RagAnswer> {
        info!("Processing query");

        let prompt = self.prompts.query_prompt(query);
        let history = session_id.and_then(|id| self.sessions.conversation_history(id));

        let registry = self.tool_registry()?;
        let definitions = registry.definitions();

        let answer = self
            .generator
            .generate(&prompt, history.as_deref(), Some(&definitions), Some(&registry))
            .await?;

        let sources = registry.last_sources();
        registry.reset_sources();

        if let Some(id) = session_id {
            self.sessions.add_exchange(id, query, &answer);
        }

        debug!("Answered with {} sources", sources.len());
        Ok(RagAnswer { answer, sources })
    }

    pub async fn course_analytics(&self) -> Result<CourseAnalytics> {
        self.library.course_analytics().await
    }

    pub async fn add_course_document(&self, path: &Path) -> Result<(Course, usize)> {
        self.library.add_course_document(path).await
    }

    pub async fn add_course_folder(&self, dir: &Path, clear_existing: bool) -> Result<(usize, usize)> {
        self.library.add_course_folder(dir, clear_existing).await
    }
}
