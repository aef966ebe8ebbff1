//! Course library: ingestion into, and statistics over, the course index.

use super::CourseAnalytics;
use crate::config::Settings;
use crate::documents::{is_supported, DocumentProcessor};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{PensumError, Result};
use crate::models::Course;
use crate::retrieval::CourseIndex;
use crate::vector_store::{create_vector_store, VectorStore};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// The indexed course corpus and the means to add to it.
pub struct CourseLibrary {
    index: Arc<CourseIndex>,
    processor: DocumentProcessor,
}

impl CourseLibrary {
    /// Open the configured store with the OpenAI embedder.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let embedder = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);
        Self::with_components(settings, embedder, create_vector_store(settings)?)
    }

    pub fn with_components(
        settings: &Settings,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        Ok(Self {
            index: Arc::new(CourseIndex::new(embedder, store, &settings.retrieval)),
            processor: DocumentProcessor::from_settings(&settings.documents)?,
        })
    }

    pub fn index(&self) -> Arc<CourseIndex> {
        self.index.clone()
    }

    /// Number of courses and their titles.
    pub async fn course_analytics(&self) -> Result<CourseAnalytics> {
        let course_titles = self.index.course_titles().await?;
        Ok(CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        })
    }

    /// Ingest one course file. Returns the course and the number of chunks indexed.
    #[instrument(skip(self))]
    pub async fn add_course_document(&self, path: &Path) -> Result<(Course, usize)> {
        let (course, chunks) = self.processor.process_file(path)?;
        let count = self.index.add_course(&course, &chunks).await?;
        Ok((course, count))
    }

    /// Ingest every supported file in `dir`, skipping courses already indexed.
    ///
    /// Files that fail to parse are logged and skipped. Returns
    /// `(courses_added, chunks_added)`.
    #[instrument(skip(self))]
    pub async fn add_course_folder(&self, dir: &Path, clear_existing: bool) -> Result<(usize, usize)> {
        if !dir.is_dir() {
            return Err(PensumError::Document(format!(
                "Folder not found: {}",
                dir.display()
            )));
        }

        if clear_existing {
            info!("Clearing existing course data");
            self.index.clear().await?;
        }

        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_supported(p))
            .collect();
        paths.sort();

        let mut existing: HashSet<String> = self.index.course_titles().await?.into_iter().collect();
        let mut courses = 0;
        let mut chunks_added = 0;

        for path in paths {
            let (course, chunks) = match self.processor.process_file(&path) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            if existing.contains(&course.title) {
                debug!("Course already indexed: {}", course.title);
                continue;
            }

            chunks_added += self.index.add_course(&course, &chunks).await?;
            existing.insert(course.title);
            courses += 1;
        }

        info!("Added {} courses ({} chunks) from {}", courses, chunks_added, dir.display());
        Ok((courses, chunks_added))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::CourseRetriever;
    use crate::testing::VocabEmbedder;
    use crate::vector_store::MemoryVectorStore;

    const COURSE: &str = "Course Title: Intro to ML
Course Link: https://example.com/ml
Course Instructor: Dr. Jane Smith

Lesson 0: Introduction
Machine learning learns patterns from data.

Lesson 1: Supervised Learning
Labels guide the model during training.
";

    fn library() -> CourseLibrary {
        CourseLibrary::with_components(
            &Settings::default(),
            Arc::new(VocabEmbedder::new()),
            Arc::new(MemoryVectorStore::new()),
        )
        .unwrap()
    }

    fn docs() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ml.txt"), COURSE).unwrap();
        std::fs::write(dir.path().join("empty.md"), "   ").unwrap();
        std::fs::write(dir.path().join("slides.pdf"), "binary").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_folder_ingestion_skips_existing_courses() {
        let library = library();
        let dir = docs();

        assert_eq!(library.add_course_folder(dir.path(), false).await.unwrap(), (1, 2));
        assert_eq!(library.add_course_folder(dir.path(), false).await.unwrap(), (0, 0));
        assert_eq!(library.add_course_folder(dir.path(), true).await.unwrap(), (1, 2));

        let analytics = library.course_analytics().await.unwrap();
        assert_eq!(analytics.total_courses, 1);
        assert_eq!(analytics.course_titles, vec!["Intro to ML"]);
        assert_eq!(library.index().chunk_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_missing_folder_is_an_error() {
        let library = library();
        let dir = docs();
        assert!(library
            .add_course_folder(&dir.path().join("missing"), false)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_add_course_document() {
        let library = library();
        let dir = docs();

        let (course, chunks) = library
            .add_course_document(&dir.path().join("ml.txt"))
            .await
            .unwrap();
        assert_eq!(course.title, "Intro to ML");
        assert_eq!(course.lessons.len(), 2);
        assert_eq!(chunks, 2);
    }

    #[tokio::test]
    async fn test_reindexing_a_file_does_not_duplicate_hits() {
        let library = library();
        let dir = docs();
        let path = dir.path().join("ml.txt");

        library.add_course_document(&path).await.unwrap();
        library.add_course_document(&path).await.unwrap();

        let index = library.index();
        assert_eq!(index.course_count().await.unwrap(), 1);
        assert_eq!(index.chunk_count().await.unwrap(), 2);

        let results = index.search("machine learning patterns", None, None).await;
        let lessons: Vec<Option<u32>> = results.hits.iter().map(|h| h.lesson_number).collect();
        assert_eq!(lessons.len(), 2);
        assert!(lessons.contains(&Some(0)));
        assert!(lessons.contains(&Some(1)));
    }
}
