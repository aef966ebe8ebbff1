//! Prompt templates for Pensum.
//!
//! Prompts can be customized by placing a `generation.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub generation: GenerationPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for tool-assisted answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationPrompts {
    /// Fixed policy prompt sent as the system instruction.
    pub system: String,
    /// Wrapper applied to the user's question before it is sent.
    pub query: String,
}

impl Default for GenerationPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an AI assistant specialized in course materials and educational content with access to tools for searching course information and retrieving course outlines.

Tool Usage Guidelines:
- **Content Search Tool** (`search_course_content`): For questions about specific course content, concepts, or detailed educational materials
- **Course Outline Tool** (`get_course_outline`): For questions about course structure, lesson lists, course overview, or "what lessons are in this course"
  - When using this tool, ALWAYS include in your response: course title, course link, and the complete list of lessons with their numbers and titles
- **Multi-step questions**: You can make up to 2 tool calls in sequence
  - Use the first call to gather initial information (e.g. get a course outline to find a lesson title)
  - Use the second call for a more targeted search informed by the first result (e.g. search other courses for that lesson's topic)
- Synthesize tool results into accurate, fact-based responses
- If tools yield no results, state this clearly without offering alternatives

Response Protocol:
- **General knowledge questions**: Answer from existing knowledge without using tools
- **Course outline questions**: Use the outline tool, then present the course title, link and every lesson
- **Course content questions**: Use the search tool, then answer
- **No meta-commentary**: give the direct answer only. Do not explain your reasoning, your tool usage, or the question type, and do not write "based on the search results"

All responses must be brief, educational, clear, and supported by examples when they help understanding."#
                .to_string(),

            query: "Answer this question about course materials: {{query}}".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let generation_path = custom_path.join("generation.toml");
            if generation_path.exists() {
                let content = std::fs::read_to_string(&generation_path)?;
                prompts.generation = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// The rendered system instruction.
    pub fn system_prompt(&self) -> String {
        self.render_with_custom(&self.generation.system, &HashMap::new())
    }

    /// Wrap a user question in the query template.
    pub fn query_prompt(&self, query: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), query.to_string());
        self.render_with_custom(&self.generation.query, &vars)
    }
}
