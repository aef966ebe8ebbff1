//! Retrieval tools offered to the generation model.
//!
//! A tool publishes a [`ToolDefinition`] (name, description, JSON schema of its
//! input) and turns a named-argument call into text the model can read.
//! Tools that cite course material remember the [`Source`]s of their most
//! recent execution.

mod outline;
mod registry;
mod search;

pub use outline::CourseOutlineTool;
pub use registry::ToolRegistry;
pub use search::CourseSearchTool;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Machine-readable description of a tool, in the shape the Messages API expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the input object.
    pub input_schema: Value,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    /// Opaque call id chosen by the generation service.
    pub id: String,
    pub name: String,
    pub input: Map<String, Value>,
}

/// The answer to one [`ToolInvocation`].
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// Echoes [`ToolInvocation::id`].
    pub tool_use_id: String,
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: true,
        }
    }
}

/// A citation shown next to an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub text: String,
    pub link: Option<String>,
}

/// A capability the model can call.
#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    /// Run the tool. Expected "no data" outcomes are `Ok` text; `Err` is
    /// reserved for faults and malformed input.
    async fn execute(&self, input: &Map<String, Value>) -> Result<String>;

    /// Sources recorded by the most recent execution.
    fn last_sources(&self) -> Vec<Source> {
        Vec::new()
    }

    fn reset_sources(&self) {}
}

/// Decode a tool's named arguments into its typed argument struct.
pub(crate) fn parse_args<T: serde::de::DeserializeOwned>(
    tool: &str,
    input: &Map<String, Value>,
) -> Result<T> {
    serde_json::from_value(Value::Object(input.clone())).map_err(|e| {
        crate::error::PensumError::InvalidInput(format!("Invalid arguments for {}: {}", tool, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Args {
        query: String,
        lesson_number: Option<u32>,
    }

    #[test]
    fn test_parse_args() {
        let input = json!({"query": "ownership", "lesson_number": 2})
            .as_object()
            .cloned()
            .unwrap();
        let args: Args = parse_args("search", &input).unwrap();
        assert_eq!(args.query, "ownership");
        assert_eq!(args.lesson_number, Some(2));

        let input = json!({"lesson_number": -1}).as_object().cloned().unwrap();
        let err = parse_args::<Args>("search", &input).unwrap_err();
        assert!(err.to_string().contains("Invalid arguments for search"));
    }

    #[test]
    fn test_tool_result_constructors() {
        let ok = ToolResult::success("toolu_1", "fine");
        assert!(!ok.is_error);
        let err = ToolResult::error("toolu_2", "broken");
        assert!(err.is_error);
        assert_eq!(err.tool_use_id, "toolu_2");
    }
}
