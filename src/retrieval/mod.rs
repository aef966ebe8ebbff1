//! Retrieval backend consumed by the course tools.
//!
//! The tools only see [`CourseRetriever`]; [`CourseIndex`] is the
//! production implementation over an embedder and a vector store.

mod index;

pub use index::CourseIndex;

use crate::error::Result;
use crate::models::Course;
use async_trait::async_trait;

/// One matched snippet.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub content: String,
    pub course_title: String,
    pub lesson_number: Option<u32>,
    pub score: f32,
}

/// Outcome of a content search.
///
/// `error` carries "no such course" and backend faults as text so the
/// search tool can hand them to the model unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    pub error: Option<String>,
}

impl SearchResults {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self { hits, error: None }
    }

    /// A result with no hits and an error message.
    pub fn empty(error: impl Into<String>) -> Self {
        Self {
            hits: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Search and catalog access used by the tools.
#[async_trait]
pub trait CourseRetriever: Send + Sync {
    /// Semantic search, optionally restricted to a (fuzzy) course name and a lesson.
    async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> SearchResults;

    /// Resolve a (fuzzy) course name and return its catalog entry.
    async fn course_outline(&self, course_name: &str) -> Result<Option<Course>>;

    /// Link of a lesson, by exact course title.
    async fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>>;

    /// Link of a course, by exact course title.
    async fn course_link(&self, course_title: &str) -> Result<Option<String>>;
}
