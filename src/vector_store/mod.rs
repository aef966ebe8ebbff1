//! Vector store abstraction for Pensum.
//!
//! Holds two collections: the course catalog (one entry per course, keyed by
//! title, embedded by title for fuzzy name resolution) and the content chunks
//! searched by the content tool.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::config::{Settings, VectorStoreProvider};
use crate::error::Result;
use crate::models::Course;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// A content chunk stored with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique chunk ID.
    pub id: Uuid,
    /// Title of the owning course.
    pub course_title: String,
    /// Lesson the chunk belongs to.
    pub lesson_number: Option<u32>,
    /// Position of the chunk within the course.
    pub chunk_index: u32,
    /// Text content.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// When this chunk was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl ChunkRecord {
    pub fn new(
        course_title: String,
        lesson_number: Option<u32>,
        chunk_index: u32,
        content: String,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_title,
            lesson_number,
            chunk_index,
            content,
            embedding,
            indexed_at: Utc::now(),
        }
    }
}

/// A catalog entry: course metadata plus the embedding of its title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseRecord {
    pub course: Course,
    pub embedding: Vec<f32>,
    pub indexed_at: DateTime<Utc>,
}

impl CourseRecord {
    pub fn new(course: Course, embedding: Vec<f32>) -> Self {
        Self {
            course,
            embedding,
            indexed_at: Utc::now(),
        }
    }
}

/// Restricts a chunk search to one course and/or one lesson.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkFilter {
    /// Exact course title.
    pub course_title: Option<String>,
    pub lesson_number: Option<u32>,
}

impl ChunkFilter {
    pub fn matches(&self, chunk: &ChunkRecord) -> bool {
        self.course_title
            .as_ref()
            .map_or(true, |title| &chunk.course_title == title)
            && self
                .lesson_number
                .map_or(true, |n| chunk.lesson_number == Some(n))
    }
}

/// A chunk search result with score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: ChunkRecord,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// A catalog search result with score.
#[derive(Debug, Clone)]
pub struct ScoredCourse {
    pub course: Course,
    pub score: f32,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace a catalog entry (keyed by course title).
    async fn upsert_course(&self, record: &CourseRecord) -> Result<()>;

    /// Bulk insert chunks.
    async fn upsert_chunks(&self, chunks: &[ChunkRecord]) -> Result<usize>;

    /// Chunks most similar to the query embedding that pass the filter.
    async fn search_chunks(
        &self,
        query_embedding: &[f32],
        filter: &ChunkFilter,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>>;

    /// The catalog entry whose title embedding is closest to the query.
    async fn nearest_course(&self, query_embedding: &[f32]) -> Result<Option<ScoredCourse>>;

    /// Fetch a course by exact title.
    async fn get_course(&self, title: &str) -> Result<Option<Course>>;

    /// All course titles, sorted.
    async fn course_titles(&self) -> Result<Vec<String>>;

    /// Number of courses in the catalog.
    async fn course_count(&self) -> Result<usize>;

    /// Total chunk count.
    async fn chunk_count(&self) -> Result<usize>;

    /// Remove every chunk of one course. Returns how many were removed.
    async fn delete_course_chunks(&self, course_title: &str) -> Result<usize>;

    /// Remove every course and chunk.
    async fn clear(&self) -> Result<()>;
}

/// Open the store selected by `[vector_store]`.
pub fn create_vector_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    Ok(match settings.vector_store.provider {
        VectorStoreProvider::Sqlite => Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?),
        VectorStoreProvider::Memory => Arc::new(MemoryVectorStore::new()),
    })
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Sort scored items descending and keep the top `limit`.
pub(crate) fn rank<T>(mut items: Vec<T>, score: impl Fn(&T) -> f32, limit: usize) -> Vec<T> {
    items.sort_by(|a, b| {
        score(b)
            .partial_cmp(&score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    items.truncate(limit);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);

        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_create_vector_store_memory() {
        let mut settings = Settings::default();
        settings.vector_store.provider = VectorStoreProvider::Memory;
        let store = create_vector_store(&settings).unwrap();
        assert_eq!(store.course_count().await.unwrap(), 0);
    }

    #[test]
    fn test_chunk_filter() {
        let chunk = ChunkRecord::new("Rust".to_string(), Some(2), 0, "text".to_string(), vec![]);

        assert!(ChunkFilter::default().matches(&chunk));
        assert!(ChunkFilter {
            course_title: Some("Rust".to_string()),
            lesson_number: Some(2),
        }
        .matches(&chunk));
        assert!(!ChunkFilter {
            course_title: Some("Go".to_string()),
            lesson_number: None,
        }
        .matches(&chunk));
        assert!(!ChunkFilter {
            course_title: None,
            lesson_number: Some(3),
        }
        .matches(&chunk));
    }
}
