//! RAG (Retrieval-Augmented Generation) over course materials.
//!
//! Wires the course index, the tools and the answer generator together for
//! one query at a time, and exposes course ingestion.

mod library;
mod system;

pub use library::CourseLibrary;
pub use system::RagSystem;

use crate::tools::Source;
use serde::{Deserialize, Serialize};

/// An answer with the sources the tools cited while producing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<Source>,
}

/// Catalog statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}
