//! Course file parsing.
//!
//! ```text
//! Course Title: Building Towards Computer Use
//! Course Link: https://example.com/course
//! Course Instructor: Colt Steele
//!
//! Lesson 0: Introduction
//! Lesson Link: https://example.com/course/0
//! Welcome to the course...
//! ```

use crate::error::{PensumError, Result};
use crate::models::{Course, Lesson};
use regex::Regex;

/// A parsed course file: metadata plus the raw text of each lesson.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCourse {
    pub course: Course,
    /// Text sections in file order. `None` is text outside any lesson.
    pub sections: Vec<(Option<u32>, String)>,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Line-oriented parser for course files.
pub struct CourseParser {
    header_regex: Regex,
    lesson_regex: Regex,
    lesson_link_regex: Regex,
}

impl CourseParser {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| PensumError::Config(format!("Invalid pattern {}: {}", pattern, e)))
        };

        Ok(Self {
            header_regex: compile(r"(?i)^course\s+(title|link|instructor):\s*(.*)$")?,
            lesson_regex: compile(r"(?i)^lesson\s+(\d+):\s*(.*)$")?,
            lesson_link_regex: compile(r"(?i)^lesson\s+link:\s*(.*)$")?,
        })
    }

    /// Parse a course file. `fallback_title` is used when the file has no title line.
    pub fn parse(&self, text: &str, fallback_title: &str) -> Result<ParsedCourse> {
        if text.trim().is_empty() {
            return Err(PensumError::Document(format!(
                "Course file '{}' is empty",
                fallback_title
            )));
        }

        let mut course = Course::new(fallback_title);
        let mut sections: Vec<(Option<u32>, String)> = Vec::new();
        let mut current: Option<u32> = None;
        let mut buffer: Vec<&str> = Vec::new();
        let mut in_header = true;
        let mut expect_lesson_link = false;

        let mut flush = |lesson: Option<u32>, buffer: &mut Vec<&str>| {
            let text = buffer.join("\n");
            if !text.trim().is_empty() {
                sections.push((lesson, text));
            }
            buffer.clear();
        };

        for line in text.lines() {
            let trimmed = line.trim();

            if in_header {
                if let Some(caps) = self.header_regex.captures(trimmed) {
                    let value = non_empty(&caps[2]);
                    match caps[1].to_lowercase().as_str() {
                        "title" => {
                            if let Some(title) = value {
                                course.title = title;
                            }
                        }
                        "link" => course.course_link = value,
                        _ => course.instructor = value,
                    }
                    continue;
                }
            }

            if let Some(caps) = self.lesson_regex.captures(trimmed) {
                in_header = false;
                flush(current, &mut buffer);

                let number: u32 = caps[1].parse().map_err(|_| {
                    PensumError::Document(format!("Invalid lesson number in '{}'", trimmed))
                })?;
                course
                    .lessons
                    .push(Lesson::new(number, caps[2].trim(), None));
                current = Some(number);
                expect_lesson_link = true;
                continue;
            }

            if expect_lesson_link {
                if trimmed.is_empty() {
                    continue;
                }
                expect_lesson_link = false;
                if let Some(caps) = self.lesson_link_regex.captures(trimmed) {
                    if let Some(lesson) = course.lessons.last_mut() {
                        lesson.lesson_link = non_empty(&caps[1]);
                    }
                    continue;
                }
            }

            if !trimmed.is_empty() {
                in_header = false;
            }
            buffer.push(line);
        }
        flush(current, &mut buffer);

        Ok(ParsedCourse { course, sections })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Course Title: Intro to ML
Course Link: https://example.com/ml
Course Instructor: Dr. Jane Smith

Lesson 0: Introduction
Lesson Link: https://example.com/ml/0
Machine learning learns from data.

Lesson 1: Supervised Learning
Labels guide the model.
";

    #[test]
    fn test_parse_full_course() {
        let parsed = CourseParser::new().unwrap().parse(SAMPLE, "fallback").unwrap();
        let course = &parsed.course;

        assert_eq!(course.title, "Intro to ML");
        assert_eq!(course.course_link.as_deref(), Some("https://example.com/ml"));
        assert_eq!(course.instructor.as_deref(), Some("Dr. Jane Smith"));
        assert_eq!(course.lessons.len(), 2);
        assert_eq!(
            course.lessons[0].lesson_link.as_deref(),
            Some("https://example.com/ml/0")
        );
        assert_eq!(course.lessons[1].title, "Supervised Learning");
        assert!(course.lessons[1].lesson_link.is_none());

        assert_eq!(parsed.sections.len(), 2);
        assert_eq!(parsed.sections[0].0, Some(0));
        assert_eq!(parsed.sections[0].1.trim(), "Machine learning learns from data.");
        assert_eq!(parsed.sections[1].0, Some(1));
    }

    #[test]
    fn test_missing_title_and_lessons() {
        let parsed = CourseParser::new()
            .unwrap()
            .parse("Just some notes.\nMore notes.", "notes").unwrap();
        assert_eq!(parsed.course.title, "notes");
        assert!(parsed.course.lessons.is_empty());
        assert_eq!(parsed.sections, vec![(None, "Just some notes.\nMore notes.".to_string())]);
    }

    #[test]
    fn test_empty_file_is_an_error() {
        assert!(CourseParser::new().unwrap().parse("  \n ", "empty").is_err());
    }
}
