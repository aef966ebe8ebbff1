//! In-memory vector store implementation.
//!
//! Useful for testing and small course sets.

use super::{
    cosine_similarity, rank, ChunkFilter, ChunkRecord, CourseRecord, ScoredChunk, ScoredCourse,
    VectorStore,
};
use crate::error::Result;
use crate::models::Course;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

/// In-memory vector store.
pub struct MemoryVectorStore {
    courses: RwLock<BTreeMap<String, CourseRecord>>,
    chunks: RwLock<HashMap<uuid::Uuid, ChunkRecord>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            courses: RwLock::new(BTreeMap::new()),
            chunks: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_course(&self, record: &CourseRecord) -> Result<()> {
        let mut courses = self.courses.write().unwrap_or_else(PoisonError::into_inner);
        courses.insert(record.course.title.clone(), record.clone());
        Ok(())
    }

    async fn upsert_chunks(&self, chunks: &[ChunkRecord]) -> Result<usize> {
        let mut store = self.chunks.write().unwrap_or_else(PoisonError::into_inner);
        for chunk in chunks {
            store.insert(chunk.id, chunk.clone());
        }
        Ok(chunks.len())
    }

    async fn search_chunks(
        &self,
        query_embedding: &[f32],
        filter: &ChunkFilter,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let chunks = self.chunks.read().unwrap_or_else(PoisonError::into_inner);

        let results: Vec<ScoredChunk> = chunks
            .values()
            .filter(|chunk| filter.matches(chunk))
            .map(|chunk| ScoredChunk {
                score: cosine_similarity(query_embedding, &chunk.embedding),
                chunk: chunk.clone(),
            })
            .collect();

        Ok(rank(results, |r| r.score, limit))
    }

    async fn nearest_course(&self, query_embedding: &[f32]) -> Result<Option<ScoredCourse>> {
        let courses = self.courses.read().unwrap_or_else(PoisonError::into_inner);

        let scored: Vec<ScoredCourse> = courses
            .values()
            .map(|record| ScoredCourse {
                score: cosine_similarity(query_embedding, &record.embedding),
                course: record.course.clone(),
            })
            .collect();

        Ok(rank(scored, |c| c.score, 1).into_iter().next())
    }

    async fn get_course(&self, title: &str) -> Result<Option<Course>> {
        let courses = self.courses.read().unwrap_or_else(PoisonError::into_inner);
        Ok(courses.get(title).map(|record| record.course.clone()))
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        let courses = self.courses.read().unwrap_or_else(PoisonError::into_inner);
        Ok(courses.keys().cloned().collect())
    }

    async fn course_count(&self) -> Result<usize> {
        let courses = self.courses.read().unwrap_or_else(PoisonError::into_inner);
        Ok(courses.len())
    }

    async fn chunk_count(&self) -> Result<usize> {
        let chunks = self.chunks.read().unwrap_or_else(PoisonError::into_inner);
        Ok(chunks.len())
    }

    async fn delete_course_chunks(&self, course_title: &str) -> Result<usize> {
        let mut chunks = self.chunks.write().unwrap_or_else(PoisonError::into_inner);
        let before = chunks.len();
        chunks.retain(|_, chunk| chunk.course_title != course_title);
        Ok(before - chunks.len())
    }

    async fn clear(&self) -> Result<()> {
        self.courses
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.chunks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}
