//! Answer generation against the Messages API.

mod anthropic;
mod client;
mod generator;
pub mod messages;

pub use anthropic::AnthropicClient;
pub use client::GenerationClient;
pub use generator::{AnswerGenerator, MAX_TOOL_ROUNDS, TOOL_LIMIT_ANSWER};
pub use messages::{ContentBlock, Message, MessageRequest, MessageResponse, StopReason};
