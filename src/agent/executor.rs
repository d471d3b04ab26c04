//! Agent executor: one reasoning pass over the tools-in-a-loop pattern.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::llm::{ChatMessage, LlmClient, ToolCall};
use crate::tools::ToolRegistry;

use super::prompt::system_prompt;

/// Boundary the chat wrapper retries against.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    /// Run one reasoning pass for a message and return the final answer.
    async fn invoke(&self, message: &str) -> Result<String, AgentError>;
}

/// Binds prompt, tool registry and model client into one invocable pipeline.
///
/// Owns the process-wide conversation memory: a single append-only buffer in
/// chronological turn order, never truncated. There is deliberately no session
/// model; concurrent requests share (and interleave in) the one conversation.
pub struct AgentExecutor {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    model: String,
    max_iterations: usize,
    memory: Mutex<Vec<ChatMessage>>,
}

impl AgentExecutor {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: ToolRegistry,
        model: String,
        max_iterations: usize,
    ) -> Self {
        Self {
            llm,
            tools,
            model,
            max_iterations,
            memory: Mutex::new(Vec::new()),
        }
    }

    /// Execute a single requested tool call.
    async fn execute_tool_call(&self, tool_call: &ToolCall) -> Result<String, AgentError> {
        let args: Value = serde_json::from_str(&tool_call.function.arguments).map_err(|e| {
            AgentError::Validation(format!(
                "arguments for '{}' are not a JSON object: {e}",
                tool_call.function.name
            ))
        })?;

        debug!(
            "executing tool {} with args {}",
            tool_call.function.name, tool_call.function.arguments
        );
        self.tools.execute(&tool_call.function.name, args).await
    }

    #[cfg(test)]
    pub(crate) async fn memory_snapshot(&self) -> Vec<ChatMessage> {
        self.memory.lock().await.clone()
    }
}

#[async_trait]
impl AgentInvoker for AgentExecutor {
    async fn invoke(&self, message: &str) -> Result<String, AgentError> {
        // System prompt, then the shared history, then this turn. Everything
        // appended below this point is the per-pass scratchpad; only the
        // (user, assistant) pair graduates into memory on success.
        let mut messages = vec![ChatMessage::system(system_prompt())];
        messages.extend(self.memory.lock().await.iter().cloned());
        messages.push(ChatMessage::user(message));

        let tool_schemas = self.tools.get_tool_schemas();

        for iteration in 0..self.max_iterations {
            debug!("reasoning iteration {}", iteration + 1);

            let response = self
                .llm
                .chat_completion(&self.model, &messages, Some(&tool_schemas))
                .await?;

            if let Some(tool_calls) = response.tool_calls.clone().filter(|c| !c.is_empty()) {
                messages.push(response);
                for tool_call in &tool_calls {
                    let result = self.execute_tool_call(tool_call).await?;
                    messages.push(ChatMessage::tool_result(tool_call.id.clone(), result));
                }
                continue;
            }

            if let Some(content) = response.content {
                let mut memory = self.memory.lock().await;
                memory.push(ChatMessage::user(message));
                memory.push(ChatMessage::assistant(content.clone()));
                return Ok(content);
            }

            warn!("model returned neither content nor tool calls");
            return Err(AgentError::Other(anyhow::anyhow!(
                "the model returned an empty message"
            )));
        }

        Err(AgentError::Other(anyhow::anyhow!(
            "no final answer after {} reasoning iterations",
            self.max_iterations
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use serde_json::json;

    use crate::llm::{FunctionCall, Role, ToolSchema};
    use crate::tools::test_support::FakeBackend;

    use super::*;

    /// LLM that replays a fixed script of assistant messages.
    struct ScriptedLlm {
        script: StdMutex<Vec<ChatMessage>>,
    }

    impl ScriptedLlm {
        fn new(mut script: Vec<ChatMessage>) -> Self {
            script.reverse();
            Self {
                script: StdMutex::new(script),
            }
        }

        fn tool_call_message(name: &str, args: Value) -> ChatMessage {
            ChatMessage {
                role: Role::Assistant,
                content: None,
                tool_calls: Some(vec![ToolCall {
                    id: "call_1".to_string(),
                    call_type: "function".to_string(),
                    function: FunctionCall {
                        name: name.to_string(),
                        arguments: args.to_string(),
                    },
                }]),
                tool_call_id: None,
            }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn chat_completion(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
            _tools: Option<&[ToolSchema]>,
        ) -> Result<ChatMessage, AgentError> {
            self.script
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| AgentError::Other(anyhow::anyhow!("script exhausted")))
        }
    }

    fn executor(llm: ScriptedLlm) -> AgentExecutor {
        AgentExecutor::new(
            Arc::new(llm),
            ToolRegistry::new(Arc::new(FakeBackend::new())),
            "gpt-4o-mini".to_string(),
            5,
        )
    }

    #[tokio::test]
    async fn direct_answer_appends_turn_to_memory() {
        let llm = ScriptedLlm::new(vec![ChatMessage::assistant("hello 👋")]);
        let executor = executor(llm);

        let answer = executor.invoke("hi").await.unwrap();
        assert_eq!(answer, "hello 👋");

        let memory = executor.memory_snapshot().await;
        assert_eq!(memory.len(), 2);
        assert_eq!(memory[0].role, Role::User);
        assert_eq!(memory[0].content.as_deref(), Some("hi"));
        assert_eq!(memory[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn tool_results_are_fed_back_before_the_final_answer() {
        let llm = ScriptedLlm::new(vec![
            ScriptedLlm::tool_call_message("get_site_list", json!({})),
            ChatMessage::assistant("Sites: 100, 200, 300 ✅"),
        ]);
        let executor = executor(llm);

        let answer = executor.invoke("which sites can I trace?").await.unwrap();
        assert!(answer.contains("100"));
    }

    #[tokio::test]
    async fn scratchpad_grows_within_a_pass_but_stays_out_of_memory() {
        let llm = ScriptedLlm::new(vec![
            ScriptedLlm::tool_call_message("get_site_list", json!({})),
            ChatMessage::assistant("done"),
        ]);
        let executor = executor(llm);
        executor.invoke("list sites").await.unwrap();

        // The tool exchange stayed in the scratchpad; only the user/assistant
        // pair graduated into memory.
        let memory = executor.memory_snapshot().await;
        assert_eq!(memory.len(), 2);
        assert!(memory.iter().all(|m| m.tool_calls.is_none()));
        assert!(memory.iter().all(|m| m.role != Role::Tool));
    }

    #[tokio::test]
    async fn tool_failure_aborts_the_pass_and_keeps_memory_untouched() {
        let llm = ScriptedLlm::new(vec![ScriptedLlm::tool_call_message(
            "get_device_details_from_site",
            json!({"site_id": 999}),
        )]);
        let executor = executor(llm);

        let err = executor.invoke("devices at 999?").await.unwrap_err();
        assert!(matches!(err, AgentError::Lookup(_)));
        assert!(executor.memory_snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn missing_tool_argument_surfaces_as_validation() {
        let llm = ScriptedLlm::new(vec![ScriptedLlm::tool_call_message(
            "start_trace",
            json!({"vpn_id": 10}),
        )]);
        let executor = executor(llm);

        let err = executor.invoke("start a trace").await.unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
    }

    #[tokio::test]
    async fn retry_chain_shares_memory_without_dropping_turns() {
        use super::super::chat::ChatAgent;

        // First pass fails validation (missing site_id); the wrapper feeds the
        // synthesized error back and the second pass answers.
        let llm = ScriptedLlm::new(vec![
            ScriptedLlm::tool_call_message("start_trace", json!({"vpn_id": 10})),
            ChatMessage::assistant("recovered"),
        ]);
        let executor = Arc::new(executor(llm));
        let agent = ChatAgent::new(executor.clone());

        let reply = agent.chat("start a trace").await.unwrap();
        assert_eq!(reply, "recovered");

        // Only the successful pass graduated into the shared memory, and its
        // user turn is the synthesized error message.
        let memory = executor.memory_snapshot().await;
        assert_eq!(memory.len(), 2);
        assert!(memory[0]
            .content
            .as_deref()
            .unwrap()
            .starts_with("ERROR: You missed a parameter"));
        assert_eq!(memory[1].content.as_deref(), Some("recovered"));
    }

    #[tokio::test]
    async fn memory_accumulates_in_turn_order_across_passes() {
        let llm = ScriptedLlm::new(vec![
            ChatMessage::assistant("first answer"),
            ChatMessage::assistant("second answer"),
        ]);
        let executor = executor(llm);

        executor.invoke("first").await.unwrap();
        executor.invoke("second").await.unwrap();

        let memory = executor.memory_snapshot().await;
        let texts: Vec<_> = memory.iter().filter_map(|m| m.content.as_deref()).collect();
        assert_eq!(texts, ["first", "first answer", "second", "second answer"]);
    }
}
