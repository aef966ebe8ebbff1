//! Course outline tool.

use super::{parse_args, Tool, ToolDefinition};
use crate::error::Result;
use crate::models::Course;
use crate::retrieval::CourseRetriever;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub const OUTLINE_TOOL_NAME: &str = "get_course_outline";

#[derive(Debug, Deserialize)]
struct OutlineArgs {
    course_name: String,
}

/// Structural overview of one course: title, link, instructor and lessons.
pub struct CourseOutlineTool {
    retriever: Arc<dyn CourseRetriever>,
}

impl CourseOutlineTool {
    pub fn new(retriever: Arc<dyn CourseRetriever>) -> Self {
        Self { retriever }
    }
}

fn format_outline(course: &Course) -> String {
    let mut lines = vec![format!("Course: {}", course.title)];

    if let Some(link) = &course.course_link {
        lines.push(format!("Link: {}", link));
    }
    if let Some(instructor) = &course.instructor {
        lines.push(format!("Instructor: {}", instructor));
    }

    lines.push(format!("Lessons ({}):", course.lessons.len()));
    for lesson in course.sorted_lessons() {
        lines.push(format!("Lesson {}: {}", lesson.lesson_number, lesson.title));
    }

    lines.join("\n")
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: OUTLINE_TOOL_NAME.to_string(),
            description: "Get the complete outline of a course: title, link, instructor and every lesson with its number and title"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Computer Use')"
                    }
                },
                "required": ["course_name"]
            }),
        }
    }

    async fn execute(&self, input: &Map<String, Value>) -> Result<String> {
        let args: OutlineArgs = parse_args(OUTLINE_TOOL_NAME, input)?;

        match self.retriever.course_outline(&args.course_name).await? {
            Some(course) => Ok(format_outline(&course)),
            None => Ok(format!("No course found matching '{}'", args.course_name)),
        }
    }
}
