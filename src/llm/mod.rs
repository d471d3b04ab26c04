//! LLM client module - chat-completions wire types and the model client.

mod client;
mod types;

pub use client::{LlmClient, OpenAiClient};
pub use types::{ChatMessage, FunctionCall, FunctionSchema, Role, ToolCall, ToolSchema};
