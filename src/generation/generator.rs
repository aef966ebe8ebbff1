//! Tool-calling answer generation loop.

use super::client::GenerationClient;
use super::messages::{Message, MessageRequest, MessageResponse, ToolChoice};
use crate::config::GenerationSettings;
use crate::error::{PensumError, Result};
use crate::tools::{ToolDefinition, ToolRegistry};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Maximum number of sequential tool rounds in one answer.
pub const MAX_TOOL_ROUNDS: usize = 2;

/// Answer used when the final response only asks for more tool calls.
pub const TOOL_LIMIT_ANSWER: &str =
    "I couldn't finish looking this up in the course materials. Please try a more specific question.";

/// Drives one question through the generation service, running the tools it asks for.
///
/// A call makes at most `MAX_TOOL_ROUNDS + 1` requests. Tools are offered on
/// every request until the round limit is reached; the request after the last
/// round offers none, so its response is final.
pub struct AnswerGenerator {
    client: Arc<dyn GenerationClient>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    system_prompt: String,
}

impl AnswerGenerator {
    pub fn new(
        client: Arc<dyn GenerationClient>,
        settings: &GenerationSettings,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            client,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            system_prompt: system_prompt.into(),
        }
    }

    fn system_instruction(&self, history: Option<&str>) -> String {
        match history {
            Some(history) if !history.is_empty() => {
                format!("{}\n\nPrevious conversation:\n{}", self.system_prompt, history)
            }
            _ => self.system_prompt.clone(),
        }
    }

    fn request(
        &self,
        system: &str,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> MessageRequest {
        MessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: system.to_string(),
            messages: messages.to_vec(),
            tools: tools.map(|t| t.to_vec()),
            tool_choice: tools.map(|_| ToolChoice::Auto),
        }
    }

    async fn send(&self, request: &MessageRequest) -> Result<MessageResponse> {
        let response = self.client.create_message(request).await?;
        response.validate()?;
        Ok(response)
    }

    /// Generate an answer, letting the model call tools from `registry`.
    ///
    /// Tool failures are reported back to the model as error results.
    /// Generation service failures are returned to the caller.
    ///
    /// A response that is not followed up is final. If it carries no text but
    /// still asks for tools (the service ignored the tool-free request after
    /// the last round), the answer is [`TOOL_LIMIT_ANSWER`]. A final response
    /// with no text and no tool calls is a [`PensumError::Generation`].
    #[instrument(skip_all, fields(tools = tools.map_or(0, |t| t.len())))]
    pub async fn generate(
        &self,
        query: &str,
        history: Option<&str>,
        tools: Option<&[ToolDefinition]>,
        registry: Option<&ToolRegistry>,
    ) -> Result<String> {
        let system = self.system_instruction(history);
        let tools = tools.filter(|t| !t.is_empty());
        let mut messages = vec![Message::user(query)];
        let mut rounds = 0;

        loop {
            let offered = if rounds < MAX_TOOL_ROUNDS { tools } else { None };
            let response = self
                .send(&self.request(&system, &messages, offered))
                .await?;

            let registry = match registry {
                Some(registry) if offered.is_some() && response.requests_tools() => registry,
                _ => return final_text(&response),
            };

            rounds += 1;
            let invocations = response.tool_invocations();
            debug!("Tool round {} with {} invocations", rounds, invocations.len());

            let mut results = Vec::with_capacity(invocations.len());
            for invocation in &invocations {
                results.push(registry.dispatch(invocation).await);
            }

            messages.push(Message::assistant(response.content));
            messages.push(Message::tool_results(results));
        }
    }
}

fn final_text(response: &MessageResponse) -> Result<String> {
    if let Some(text) = response.text() {
        return Ok(text);
    }
    if !response.tool_invocations().is_empty() {
        warn!("Final response asked for tools after the round limit");
        return Ok(TOOL_LIMIT_ANSWER.to_string());
    }
    Err(PensumError::Generation("Response contained no text".to_string()))
}
