//! Course domain types shared by ingestion, storage and the tools.

use serde::{Deserialize, Serialize};

/// A lesson within a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    /// Lesson number as written in the course file (usually starting at 0).
    pub lesson_number: u32,
    /// Lesson title.
    pub title: String,
    /// Link to the lesson page, if known.
    pub lesson_link: Option<String>,
}

impl Lesson {
    pub fn new(lesson_number: u32, title: impl Into<String>, lesson_link: Option<String>) -> Self {
        Self {
            lesson_number,
            title: title.into(),
            lesson_link,
        }
    }
}

/// A course and its lesson catalog. The title is the course's identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Course title (unique within the catalog).
    pub title: String,
    /// Link to the course page, if known.
    pub course_link: Option<String>,
    /// Instructor name, if known.
    pub instructor: Option<String>,
    /// Lessons in the order they appear in the source file.
    pub lessons: Vec<Lesson>,
}

impl Course {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            course_link: None,
            instructor: None,
            lessons: Vec::new(),
        }
    }

    /// Look up a lesson by number.
    pub fn lesson(&self, lesson_number: u32) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.lesson_number == lesson_number)
    }

    /// Lessons sorted by lesson number.
    pub fn sorted_lessons(&self) -> Vec<&Lesson> {
        let mut lessons: Vec<&Lesson> = self.lessons.iter().collect();
        lessons.sort_by_key(|l| l.lesson_number);
        lessons
    }
}

/// A searchable piece of course text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseChunk {
    /// Chunk text.
    pub content: String,
    /// Title of the course this chunk belongs to.
    pub course_title: String,
    /// Lesson the chunk was taken from, if the course has lessons.
    pub lesson_number: Option<u32>,
    /// Position of the chunk within the course.
    pub chunk_index: u32,
}
