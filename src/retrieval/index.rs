//! Course index: embeddings plus vector store behind the retriever interface.

use super::{CourseRetriever, SearchHit, SearchResults};
use crate::config::RetrievalSettings;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::models::{Course, CourseChunk};
use crate::vector_store::{ChunkFilter, ChunkRecord, CourseRecord, VectorStore};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Searchable course catalog and content.
pub struct CourseIndex {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    max_results: usize,
    min_course_score: f32,
}

impl CourseIndex {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        settings: &RetrievalSettings,
    ) -> Self {
        Self {
            embedder,
            store,
            max_results: settings.max_results,
            min_course_score: settings.min_course_score,
        }
    }

    /// Add a course to the catalog and index its chunks.
    ///
    /// Re-adding a course replaces its catalog entry and its chunks.
    #[instrument(skip(self, course, chunks), fields(title = %course.title, chunks = chunks.len()))]
    pub async fn add_course(&self, course: &Course, chunks: &[CourseChunk]) -> Result<usize> {
        let title_embedding = self.embedder.embed(&course.title).await?;
        self.store
            .upsert_course(&CourseRecord::new(course.clone(), title_embedding))
            .await?;

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let records: Vec<ChunkRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                ChunkRecord::new(
                    chunk.course_title.clone(),
                    chunk.lesson_number,
                    chunk.chunk_index,
                    chunk.content.clone(),
                    embedding,
                )
            })
            .collect();

        let replaced = self.store.delete_course_chunks(&course.title).await?;
        if replaced > 0 {
            debug!("Replacing {} existing chunks of '{}'", replaced, course.title);
        }
        let count = self.store.upsert_chunks(&records).await?;
        info!("Indexed course '{}' ({} chunks)", course.title, count);
        Ok(count)
    }

    /// Map a possibly partial or misspelled course name to a catalog title.
    ///
    /// A case-insensitive exact match wins, then a unique substring match,
    /// then the semantically nearest title if it scores high enough.
    #[instrument(skip(self))]
    pub async fn resolve_course_name(&self, name: &str) -> Result<Option<String>> {
        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            return Ok(None);
        }

        let titles = self.store.course_titles().await?;

        if let Some(title) = titles.iter().find(|t| t.to_lowercase() == wanted) {
            return Ok(Some(title.clone()));
        }

        let partial: Vec<&String> = titles
            .iter()
            .filter(|t| t.to_lowercase().contains(&wanted))
            .collect();
        if let [title] = partial.as_slice() {
            return Ok(Some((*title).clone()));
        }

        let embedding = self.embedder.embed(name).await?;
        let nearest = self.store.nearest_course(&embedding).await?;

        Ok(nearest.and_then(|scored| {
            debug!(
                "Nearest course for '{}': '{}' ({:.3})",
                name, scored.course.title, scored.score
            );
            (scored.score >= self.min_course_score).then_some(scored.course.title)
        }))
    }

    async fn search_inner(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> Result<SearchResults> {
        let course_title = match course_name {
            Some(name) => match self.resolve_course_name(name).await? {
                Some(title) => Some(title),
                None => {
                    return Ok(SearchResults::empty(format!(
                        "No course found matching '{}'",
                        name
                    )))
                }
            },
            None => None,
        };

        let embedding = self.embedder.embed(query).await?;
        let filter = ChunkFilter {
            course_title,
            lesson_number,
        };

        let hits = self
            .store
            .search_chunks(&embedding, &filter, self.max_results)
            .await?
            .into_iter()
            .map(|scored| SearchHit {
                content: scored.chunk.content,
                course_title: scored.chunk.course_title,
                lesson_number: scored.chunk.lesson_number,
                score: scored.score,
            })
            .collect();

        Ok(SearchResults::new(hits))
    }

    /// All course titles in the catalog, sorted.
    pub async fn course_titles(&self) -> Result<Vec<String>> {
        self.store.course_titles().await
    }

    pub async fn course_count(&self) -> Result<usize> {
        self.store.course_count().await
    }

    pub async fn chunk_count(&self) -> Result<usize> {
        self.store.chunk_count().await
    }

    /// Drop every course and chunk.
    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await
    }
}

#[async_trait]
impl CourseRetriever for CourseIndex {
    #[instrument(skip(self))]
    async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> SearchResults {
        match self.search_inner(query, course_name, lesson_number).await {
            Ok(results) => results,
            Err(e) => SearchResults::empty(format!("Search error: {}", e)),
        }
    }

    async fn course_outline(&self, course_name: &str) -> Result<Option<Course>> {
        match self.resolve_course_name(course_name).await? {
            Some(title) => self.store.get_course(&title).await,
            None => Ok(None),
        }
    }

    async fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>> {
        let course = self.store.get_course(course_title).await?;
        Ok(course
            .and_then(|c| c.lesson(lesson_number).and_then(|l| l.lesson_link.clone())))
    }

    async fn course_link(&self, course_title: &str) -> Result<Option<String>> {
        let course = self.store.get_course(course_title).await?;
        Ok(course.and_then(|c| c.course_link))
    }
}
