//! Pensum - a course materials assistant
//!
//! Indexes course transcripts and answers questions about them with a
//! tool-calling language model that searches the indexed lessons.
//!
//! # Overview
//!
//! Pensum allows you to:
//! - Index course files (title, link, instructor, lessons) into a vector store
//! - Ask questions and get answers that cite the lessons they came from
//! - Keep a conversation going across questions with short session history
//! - Serve all of the above over a small HTTP API
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `documents` - Course file parsing and chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `retrieval` - Course catalog and semantic search
//! - `tools` - Tools the model can call, and their registry
//! - `generation` - Messages API client and the tool-calling loop
//! - `session` - Conversation history
//! - `rag` - Query handling and course ingestion
//!
//! # Example
//!
//! ```rust,no_run
//! use pensum::config::Settings;
//! use pensum::rag::RagSystem;
//!
//! # tokio_test::block_on(async {
//! let settings = Settings::load()?;
//! let rag = RagSystem::new(&settings)?;
//!
//! rag.add_course_folder(&settings.docs_dir(), false).await?;
//! let answer = rag.query("What does lesson 1 cover?", None).await?;
//! println!("{}", answer.answer);
//! # Ok::<(), pensum::PensumError>(())
//! # });
//! ```

pub mod cli;
pub mod config;
pub mod documents;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod models;
pub mod openai;
pub mod rag;
pub mod retrieval;
pub mod session;
pub mod tools;
pub mod vector_store;

#[cfg(test)]
mod testing;

pub use error::{PensumError, Result};
