//! Course document ingestion: parse course files and split them into chunks.

mod chunker;
mod parser;

pub use chunker::{chunk_text, ChunkingConfig};
pub use parser::{CourseParser, ParsedCourse};

use crate::config::DocumentSettings;
use crate::error::Result;
use crate::models::{Course, CourseChunk};
use std::path::Path;
use tracing::debug;

/// File extensions treated as course documents.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md"];

/// Check if a path looks like a course document.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Turns course files into a [`Course`] and its searchable chunks.
pub struct DocumentProcessor {
    parser: CourseParser,
    config: ChunkingConfig,
}

impl DocumentProcessor {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        Ok(Self {
            parser: CourseParser::new()?,
            config,
        })
    }

    pub fn from_settings(settings: &DocumentSettings) -> Result<Self> {
        Self::new(ChunkingConfig {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        })
    }

    /// Read and process a course file. The file stem is the fallback title.
    pub fn process_file(&self, path: &Path) -> Result<(Course, Vec<CourseChunk>)> {
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string());

        self.process_text(&text, &stem)
    }

    /// Process course text already in memory.
    pub fn process_text(&self, text: &str, fallback_title: &str) -> Result<(Course, Vec<CourseChunk>)> {
        let ParsedCourse { course, sections } = self.parser.parse(text, fallback_title)?;
        let mut chunks = Vec::new();
        let mut chunk_index = 0u32;

        for (lesson_number, section) in sections {
            for (i, piece) in chunk_text(&section, &self.config).into_iter().enumerate() {
                let content = match lesson_number {
                    Some(n) if i == 0 => {
                        format!("Course {} Lesson {} content: {}", course.title, n, piece)
                    }
                    _ => piece,
                };

                chunks.push(CourseChunk {
                    content,
                    course_title: course.title.clone(),
                    lesson_number,
                    chunk_index,
                });
                chunk_index += 1;
            }
        }

        debug!(
            "Processed course '{}': {} lessons, {} chunks",
            course.title,
            course.lessons.len(),
            chunks.len()
        );

        Ok((course, chunks))
    }
}
