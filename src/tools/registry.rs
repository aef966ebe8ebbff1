//! Tool directory and dispatcher.

use super::{Source, Tool, ToolDefinition, ToolInvocation, ToolResult};
use crate::error::{PensumError, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{info, warn};

/// Registered tools, kept in registration order.
///
/// Tools hold per-execution state (their last sources), so a registry
/// belongs to a single query. Build a new one for each request.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under the name in its definition.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<()> {
        let name = tool.definition().name;
        if self.by_name.contains_key(&name) {
            return Err(PensumError::Config(format!(
                "Tool '{}' is already registered",
                name
            )));
        }

        self.by_name.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Definitions of every registered tool, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name. An unknown name yields a textual result, not an error.
    pub async fn execute_tool(&self, name: &str, input: &Map<String, Value>) -> Result<String> {
        match self.by_name.get(name) {
            Some(&index) => self.tools[index].execute(input).await,
            None => Ok(format!("Tool '{}' not found", name)),
        }
    }

    /// Execute an invocation, folding any failure into an error-flagged result.
    pub async fn dispatch(&self, invocation: &ToolInvocation) -> ToolResult {
        info!("Calling tool {} ({})", invocation.name, invocation.id);

        match self.execute_tool(&invocation.name, &invocation.input).await {
            Ok(content) => ToolResult::success(&invocation.id, content),
            Err(e) => {
                warn!("Tool {} failed: {}", invocation.name, e);
                ToolResult::error(&invocation.id, format!("Error executing tool: {}", e))
            }
        }
    }

    /// Current sources of every tool, in registration order.
    pub fn last_sources(&self) -> Vec<Source> {
        self.tools.iter().flat_map(|t| t.last_sources()).collect()
    }

    pub fn reset_sources(&self) {
        for tool in &self.tools {
            tool.reset_sources();
        }
    }
}
