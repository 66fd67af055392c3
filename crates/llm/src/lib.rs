//! Completion backend and prompt construction
//!
//! Talks to an OpenAI-compatible chat completions endpoint, builds the
//! conversational and legal research prompts, and repairs model output
//! that was supposed to be structured JSON.

pub mod backend;
pub mod prompt;
pub mod repair;
pub mod schema;

pub use backend::{ChatCompletionBackend, CompletionConfig};
pub use prompt::{build_chat_prompt, build_legal_prompt, build_transcript_prompt};
pub use repair::parse_structured;
