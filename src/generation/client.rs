//! Generation service seam.

use super::messages::{MessageRequest, MessageResponse};
use crate::error::Result;
use async_trait::async_trait;

/// A service that answers a [`MessageRequest`].
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn create_message(&self, request: &MessageRequest) -> Result<MessageResponse>;
}
