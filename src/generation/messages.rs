//! Messages API request and response types.

use crate::error::{PensumError, Result};
use crate::tools::{ToolDefinition, ToolInvocation, ToolResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One block of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Map<String, Value>,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "is_false")]
        is_error: bool,
    },
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl From<ToolResult> for ContentBlock {
    fn from(result: ToolResult) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: result.tool_use_id,
            content: result.content,
            is_error: result.is_error,
        }
    }
}

/// Plain text or a list of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Echo of an assistant response, tool-use blocks included.
    pub fn assistant(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Blocks(blocks),
        }
    }

    /// All results of one tool round, as a single user message.
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Blocks(results.into_iter().map(ContentBlock::from).collect()),
        }
    }
}

/// Tool choice mode. Only automatic choice is ever requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolChoice {
    Auto,
}

/// Body of a `POST /v1/messages` call.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

/// Why the model stopped producing output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    Other(String),
}

impl From<&str> for StopReason {
    fn from(value: &str) -> Self {
        match value {
            "end_turn" => StopReason::EndTurn,
            "tool_use" => StopReason::ToolUse,
            "max_tokens" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            other => StopReason::Other(other.to_string()),
        }
    }
}

/// A decoded model response.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageResponse {
    pub content: Vec<ContentBlock>,
    pub stop_reason: StopReason,
}

impl MessageResponse {
    /// Reject tool-use blocks without a call id; their results could not be matched.
    pub fn validate(&self) -> Result<()> {
        for block in &self.content {
            if let ContentBlock::ToolUse { id, name, .. } = block {
                if id.trim().is_empty() {
                    return Err(PensumError::Protocol(format!(
                        "tool_use block for '{}' has no id",
                        name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Tool calls in the order the model listed them.
    pub fn tool_invocations(&self) -> Vec<ToolInvocation> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some(ToolInvocation {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// True when the model stopped to call tools and named at least one.
    pub fn requests_tools(&self) -> bool {
        self.stop_reason == StopReason::ToolUse
            && self
                .content
                .iter()
                .any(|b| matches!(b, ContentBlock::ToolUse { .. }))
    }

    /// Concatenated text blocks, or `None` if there are none.
    pub fn text(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();

        if texts.is_empty() {
            None
        } else {
            Some(texts.join(""))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let request = MessageRequest {
            model: "claude-test".to_string(),
            max_tokens: 800,
            temperature: 0.0,
            system: "policy".to_string(),
            messages: vec![
                Message::user("question"),
                Message::assistant(vec![ContentBlock::ToolUse {
                    id: "toolu_1".to_string(),
                    name: "search_course_content".to_string(),
                    input: json!({"query": "q"}).as_object().cloned().unwrap(),
                }]),
                Message::tool_results(vec![
                    ToolResult::success("toolu_1", "found"),
                    ToolResult::error("toolu_2", "broken"),
                ]),
            ],
            tools: None,
            tool_choice: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("tools").is_none());
        assert!(value.get("tool_choice").is_none());
        assert_eq!(value["messages"][0], json!({"role": "user", "content": "question"}));
        assert_eq!(value["messages"][1]["content"][0]["type"], "tool_use");
        assert_eq!(
            value["messages"][2]["content"],
            json!([
                {"type": "tool_result", "tool_use_id": "toolu_1", "content": "found"},
                {"type": "tool_result", "tool_use_id": "toolu_2", "content": "broken", "is_error": true}
            ])
        );
    }

    #[test]
    fn test_tool_choice_is_auto_object() {
        assert_eq!(serde_json::to_value(ToolChoice::Auto).unwrap(), json!({"type": "auto"}));
    }

    #[test]
    fn test_response_helpers() {
        let response = MessageResponse {
            content: vec![
                ContentBlock::Text {
                    text: "Let me look.".to_string(),
                },
                ContentBlock::ToolUse {
                    id: "toolu_1".to_string(),
                    name: "get_course_outline".to_string(),
                    input: Map::new(),
                },
            ],
            stop_reason: StopReason::ToolUse,
        };

        assert!(response.requests_tools());
        assert_eq!(response.tool_invocations().len(), 1);
        assert_eq!(response.text().as_deref(), Some("Let me look."));
        assert!(response.validate().is_ok());

        let finished = MessageResponse {
            stop_reason: StopReason::EndTurn,
            ..response.clone()
        };
        assert!(!finished.requests_tools());
    }

    #[test]
    fn test_missing_tool_id_is_rejected() {
        let response = MessageResponse {
            content: vec![ContentBlock::ToolUse {
                id: String::new(),
                name: "search_course_content".to_string(),
                input: Map::new(),
            }],
            stop_reason: StopReason::ToolUse,
        };
        assert!(matches!(response.validate(), Err(PensumError::Protocol(_))));
    }

    #[test]
    fn test_stop_reason_from_wire() {
        assert_eq!(StopReason::from("tool_use"), StopReason::ToolUse);
        assert_eq!(StopReason::from("end_turn"), StopReason::EndTurn);
        assert_eq!(
            StopReason::from("pause_turn"),
            StopReason::Other("pause_turn".to_string())
        );
    }
}
