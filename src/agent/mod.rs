//! Agent module - the reasoning loop and its retry wrapper.
//!
//! The executor follows a "tools in a loop" pattern:
//! 1. Build context with system prompt, conversation memory and user message
//! 2. Call the LLM with the diagnostic tool schemas
//! 3. If the LLM requests tool calls, execute them and feed results back
//! 4. Repeat until the LLM produces a final answer or max iterations
//!
//! The chat wrapper feeds classified failures back to the executor as
//! synthesized input, bounded by a retry counter.

mod chat;
mod executor;
mod prompt;

pub use chat::ChatAgent;
pub use executor::{AgentExecutor, AgentInvoker};
pub use prompt::system_prompt;
