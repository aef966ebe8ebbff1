//! Content search tool.

use super::{parse_args, Source, Tool, ToolDefinition};
use crate::error::{PensumError, Result};
use crate::retrieval::{CourseRetriever, SearchHit};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

pub const SEARCH_TOOL_NAME: &str = "search_course_content";

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    course_name: Option<String>,
    lesson_number: Option<u32>,
}

/// Semantic search over course content with optional course and lesson filters.
pub struct CourseSearchTool {
    retriever: Arc<dyn CourseRetriever>,
    last_sources: Mutex<Vec<Source>>,
}

impl CourseSearchTool {
    pub fn new(retriever: Arc<dyn CourseRetriever>) -> Self {
        Self {
            retriever,
            last_sources: Mutex::new(Vec::new()),
        }
    }

    async fn source_for(&self, hit: &SearchHit) -> Source {
        let mut text = hit.course_title.clone();
        if let Some(n) = hit.lesson_number {
            text.push_str(&format!(" - Lesson {}", n));
        }

        let link = match hit.lesson_number {
            Some(n) => self.retriever.lesson_link(&hit.course_title, n).await,
            None => self.retriever.course_link(&hit.course_title).await,
        };
        let link = link.unwrap_or_else(|e| {
            warn!("Link lookup failed for '{}': {}", hit.course_title, e);
            None
        });

        Source { text, link }
    }
}

fn format_hit(hit: &SearchHit) -> String {
    let header = match hit.lesson_number {
        Some(n) => format!("[{} - Lesson {}]", hit.course_title, n),
        None => format!("[{}]", hit.course_title),
    };
    format!("{}\n{}", header, hit.content)
}

fn no_results_message(course_name: Option<&str>, lesson_number: Option<u32>) -> String {
    let mut message = "No relevant content found".to_string();
    if let Some(name) = course_name {
        message.push_str(&format!(" in course '{}'", name));
    }
    if let Some(n) = lesson_number {
        message.push_str(&format!(" in lesson {}", n));
    }
    message.push('.');
    message
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: SEARCH_TOOL_NAME.to_string(),
            description: "Search course materials with smart course name matching and lesson filtering"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, input: &Map<String, Value>) -> Result<String> {
        let args: SearchArgs = parse_args(SEARCH_TOOL_NAME, input)?;
        if args.query.trim().is_empty() {
            return Err(PensumError::InvalidInput("query must not be empty".to_string()));
        }

        let results = self
            .retriever
            .search(&args.query, args.course_name.as_deref(), args.lesson_number)
            .await;

        if let Some(error) = results.error {
            return Ok(error);
        }

        if results.is_empty() {
            return Ok(no_results_message(args.course_name.as_deref(), args.lesson_number));
        }

        debug!("Search returned {} hits", results.hits.len());

        let mut sources = Vec::with_capacity(results.hits.len());
        for hit in &results.hits {
            sources.push(self.source_for(hit).await);
        }
        *self.last_sources.lock().unwrap_or_else(PoisonError::into_inner) = sources;

        Ok(results
            .hits
            .iter()
            .map(format_hit)
            .collect::<Vec<_>>()
            .join("\n\n"))
    }

    fn last_sources(&self) -> Vec<Source> {
        self.last_sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn reset_sources(&self) {
        self.last_sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::SearchResults;
    use crate::testing::{hit, StubRetriever};

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_formats_hits_and_records_sources() {
        let retriever = Arc::new(StubRetriever::with_results(SearchResults::new(vec![
            hit("Intro to ML", Some(1), "Supervised learning uses labels."),
            hit("Intro to ML", None, "Course overview."),
        ])));
        let tool = CourseSearchTool::new(retriever.clone());

        let output = tool
            .execute(&args(json!({"query": "supervised", "course_name": "ML"})))
            .await
            .unwrap();

        assert_eq!(
            output,
            "[Intro to ML - Lesson 1]\nSupervised learning uses labels.\n\n[Intro to ML]\nCourse overview."
        );
        assert_eq!(
            retriever.calls(),
            vec![("supervised".to_string(), Some("ML".to_string()), None)]
        );

        let sources = tool.last_sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].text, "Intro to ML - Lesson 1");
        assert_eq!(sources[0].link.as_deref(), Some("https://example.com/lesson/1"));
        assert_eq!(sources[1].text, "Intro to ML");
        assert_eq!(sources[1].link.as_deref(), Some("https://example.com/course"));

        tool.reset_sources();
        assert!(tool.last_sources().is_empty());
    }

    #[tokio::test]
    async fn test_no_results_names_filters() {
        let tool = CourseSearchTool::new(Arc::new(StubRetriever::with_results(
            SearchResults::default(),
        )));

        let output = tool
            .execute(&args(json!({
                "query": "anything",
                "course_name": "Nonexistent Course",
                "lesson_number": 3
            })))
            .await
            .unwrap();
        assert_eq!(
            output,
            "No relevant content found in course 'Nonexistent Course' in lesson 3."
        );

        let output = tool.execute(&args(json!({"query": "anything"}))).await.unwrap();
        assert_eq!(output, "No relevant content found.");
        assert!(tool.last_sources().is_empty());
    }

    #[tokio::test]
    async fn test_backend_error_is_returned_verbatim() {
        let tool = CourseSearchTool::new(Arc::new(StubRetriever::with_results(
            SearchResults::empty("No course found matching 'Nonexistent Course'"),
        )));

        let output = tool
            .execute(&args(json!({"query": "x", "course_name": "Nonexistent Course"})))
            .await
            .unwrap();
        assert_eq!(output, "No course found matching 'Nonexistent Course'");
    }

    #[tokio::test]
    async fn test_invalid_input_is_an_error() {
        let tool = CourseSearchTool::new(Arc::new(StubRetriever::default()));

        assert!(tool.execute(&args(json!({}))).await.is_err());
        assert!(tool.execute(&args(json!({"query": "  "}))).await.is_err());
        assert!(tool
            .execute(&args(json!({"query": "x", "lesson_number": "two"})))
            .await
            .is_err());
    }

    #[test]
    fn test_definition_schema() {
        let tool = CourseSearchTool::new(Arc::new(StubRetriever::default()));
        let definition = tool.definition();
        assert_eq!(definition.name, "search_course_content");
        assert_eq!(definition.input_schema["required"], json!(["query"]));
        assert_eq!(
            definition.input_schema["properties"]["lesson_number"]["type"],
            "integer"
        );
    }
}
