//! Test doubles shared by the unit tests.

use crate::embedding::Embedder;
use crate::error::{PensumError, Result};
use crate::generation::{ContentBlock, GenerationClient, MessageRequest, MessageResponse, StopReason};
use crate::models::Course;
use crate::retrieval::{CourseRetriever, SearchHit, SearchResults};
use crate::tools::{Tool, ToolDefinition};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

/// Generation client that replays queued responses and records every request.
pub(crate) struct ScriptedClient {
    responses: Mutex<VecDeque<MessageResponse>>,
    requests: Mutex<Vec<MessageRequest>>,
}

impl ScriptedClient {
    pub(crate) fn new(responses: Vec<MessageResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<MessageRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn create_message(&self, request: &MessageRequest) -> Result<MessageResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| PensumError::GenerationApi {
                status: 503,
                message: "no scripted response left".to_string(),
            })
    }
}

pub(crate) fn text_response(text: &str) -> MessageResponse {
    MessageResponse {
        content: vec![ContentBlock::Text {
            text: text.to_string(),
        }],
        stop_reason: StopReason::EndTurn,
    }
}

/// A response asking for the given `(id, tool name, input)` calls.
pub(crate) fn tool_use_response(calls: &[(&str, &str, Value)]) -> MessageResponse {
    MessageResponse {
        content: calls
            .iter()
            .map(|(id, name, input)| ContentBlock::ToolUse {
                id: id.to_string(),
                name: name.to_string(),
                input: input.as_object().cloned().unwrap_or_default(),
            })
            .collect(),
        stop_reason: StopReason::ToolUse,
    }
}

const VOCAB_DIMENSIONS: usize = 512;

/// Bag-of-words embedder: every new word gets its own dimension.
pub(crate) struct VocabEmbedder {
    vocab: Mutex<HashMap<String, usize>>,
}

impl VocabEmbedder {
    pub(crate) fn new() -> Self {
        Self {
            vocab: Mutex::new(HashMap::new()),
        }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut vocab = self.vocab.lock().unwrap_or_else(PoisonError::into_inner);
        let mut vector = vec![0.0; VOCAB_DIMENSIONS];

        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let next = vocab.len();
            let index = *vocab.entry(word.to_string()).or_insert(next);
            vector[index % VOCAB_DIMENSIONS] += 1.0;
        }

        vector
    }
}

#[async_trait]
impl Embedder for VocabEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        VOCAB_DIMENSIONS
    }
}

pub(crate) struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(PensumError::Embedding("embedding service unavailable".to_string()))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(PensumError::Embedding("embedding service unavailable".to_string()))
    }

    fn dimensions(&self) -> usize {
        0
    }
}

pub(crate) fn hit(course: &str, lesson: Option<u32>, content: &str) -> SearchHit {
    SearchHit {
        content: content.to_string(),
        course_title: course.to_string(),
        lesson_number: lesson,
        score: 0.9,
    }
}

type SearchCall = (String, Option<String>, Option<u32>);

/// Retriever with canned results and fixed links.
#[derive(Default)]
pub(crate) struct StubRetriever {
    results: SearchResults,
    courses: Vec<Course>,
    failing: bool,
    calls: Mutex<Vec<SearchCall>>,
}

impl StubRetriever {
    pub(crate) fn with_results(results: SearchResults) -> Self {
        Self {
            results,
            ..Self::default()
        }
    }

    pub(crate) fn with_course(course: Course) -> Self {
        Self {
            courses: vec![course],
            ..Self::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<SearchCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CourseRetriever for StubRetriever {
    async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> SearchResults {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((query.to_string(), course_name.map(str::to_string), lesson_number));

        if self.failing {
            return SearchResults::empty("Search error: storage unavailable");
        }
        self.results.clone()
    }

    async fn course_outline(&self, course_name: &str) -> Result<Option<Course>> {
        if self.failing {
            return Err(PensumError::VectorStore("storage unavailable".to_string()));
        }

        let wanted = course_name.to_lowercase();
        Ok(self
            .courses
            .iter()
            .find(|c| c.title.to_lowercase().contains(&wanted))
            .cloned())
    }

    async fn lesson_link(&self, _course_title: &str, lesson_number: u32) -> Result<Option<String>> {
        Ok(Some(format!("https://example.com/lesson/{}", lesson_number)))
    }

    async fn course_link(&self, _course_title: &str) -> Result<Option<String>> {
        Ok(Some("https://example.com/course".to_string()))
    }
}

/// Tool whose every execution fails.
pub(crate) struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "always_fails".to_string(),
            description: "Fails on every call".to_string(),
            input_schema: json!({"type": "object", "properties": {}}),
        }
    }

    async fn execute(&self, _input: &Map<String, Value>) -> Result<String> {
        Err(PensumError::VectorStore("storage unavailable".to_string()))
    }
}
